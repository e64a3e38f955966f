//! GridView 文本逐行解析.

use std::str::FromStr;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::{ElectrodeRecord, GridFile};
use crate::consts::gridview::*;

/// 触点行模式, 如 `A12:`.
static CONTACT_RE: Lazy<Regex> =
    // 模式是编译期常量, 不会生成 `Err`, 可直接 unwrap.
    Lazy::new(|| Regex::new(CONTACT_PATTERN).unwrap());

/// 解析过程中被局部恢复的问题. 均不会中断解析.
///
/// 行号从 1 开始.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseWarning {
    /// 头部行的数值个数不是 3, 或无法解析为数字. 对应元信息保持未设置.
    #[error("line {line}: malformed `{prefix}` header ignored")]
    MalformedHeader {
        /// 行号.
        line: usize,
        /// 头部前缀.
        prefix: &'static str,
    },

    /// 触点行少于 3 个可用坐标字段 (例如空白占位), 已丢弃.
    #[error("line {line}: contact `{contact}` has no usable coordinates, dropped")]
    DroppedContact {
        /// 行号.
        line: usize,
        /// 触点名.
        contact: String,
    },

    /// 同名组被再次开启. 之前的触点被清空, 组保留原位置.
    #[error("line {line}: group `{group}` opened again, earlier contacts discarded")]
    DuplicateGroup {
        /// 行号.
        line: usize,
        /// 组名.
        group: String,
    },

    /// 触点行不属于任何具名组, 已忽略.
    #[error("line {line}: contact `{contact}` is outside of a named group, ignored")]
    OrphanContact {
        /// 行号.
        line: usize,
        /// 触点名.
        contact: String,
    },
}

/// 解析结果: 可能不完整的 [`GridFile`] 与所有被局部恢复的问题.
#[derive(Clone, Debug)]
pub struct GridParse {
    /// 解析出的文件. 头部元信息缺失时对应字段为 `None`.
    pub grid: GridFile,

    /// 按出现顺序记录的警告.
    pub warnings: Vec<ParseWarning>,
}

/// 取第一个与第二个 `:` 之间的内容.
#[inline]
fn after_colon(line: &str) -> &str {
    line.split(':').nth(1).unwrap_or("")
}

/// 将以制表符分隔的恰好三个字段解析为三元组.
fn parse_triple<T: FromStr>(payload: &str) -> Option<(T, T, T)> {
    payload
        .trim()
        .split('\t')
        .map(|s| s.trim().parse::<T>().ok())
        .collect::<Option<Vec<T>>>()?
        .into_iter()
        .collect_tuple()
}

/// 解析 GridView 导出文本.
///
/// 格式错误的行会被丢弃并记录在 [`GridParse::warnings`] 中; 该函数本身不会失败.
/// 头部缺失不是解析错误, 而是后续坐标变换阶段的致命前置条件.
pub fn parse(text: &str) -> GridParse {
    let mut grid = GridFile::default();
    let mut warnings = vec![];

    // 当前开启的组的下标. 空组名视同未开启.
    let mut current: Option<usize> = None;

    for (no, line) in text.lines().enumerate() {
        let line_no = no + 1;
        let line = line.trim();

        if line.starts_with(CUBE_SIZE) {
            match parse_triple::<usize>(after_colon(line)) {
                Some(shape) => grid.set_shape(shape),
                None => warnings.push(ParseWarning::MalformedHeader {
                    line: line_no,
                    prefix: CUBE_SIZE,
                }),
            }
        } else if line.starts_with(CUBE_RESOLUTION) {
            match parse_triple::<f64>(after_colon(line)) {
                Some(voxel_size) => grid.set_voxel_size(voxel_size),
                None => warnings.push(ParseWarning::MalformedHeader {
                    line: line_no,
                    prefix: CUBE_RESOLUTION,
                }),
            }
        } else if line.starts_with(GROUP) {
            let name = after_colon(line).trim();
            let (idx, duplicated) = grid.open_group(name);
            if duplicated {
                warnings.push(ParseWarning::DuplicateGroup {
                    line: line_no,
                    group: name.to_owned(),
                });
            }
            current = (!name.is_empty()).then_some(idx);
        } else if CONTACT_RE.is_match(line) {
            // 正则保证了 `:` 存在. 第二个 `:` 之后的内容被丢弃, 与头部行一致.
            let name = line.split(':').next().unwrap_or(line).trim();
            let payload = after_colon(line);

            let Some(group) = current else {
                warnings.push(ParseWarning::OrphanContact {
                    line: line_no,
                    contact: name.to_owned(),
                });
                continue;
            };

            match contact_fields(payload) {
                Some((coords, annotation)) => {
                    let group_name = grid.groups()[group].name().to_owned();
                    grid.push_contact(
                        group,
                        ElectrodeRecord::new(group_name, name, coords, annotation),
                    );
                }
                None => warnings.push(ParseWarning::DroppedContact {
                    line: line_no,
                    contact: name.to_owned(),
                }),
            }
        }
    }

    GridParse { grid, warnings }
}

/// 从触点行 `:` 之后的内容中解析坐标与注释. 可用字段少于 3 个时返回 `None`.
fn contact_fields(payload: &str) -> Option<(crate::Coord3d, &str)> {
    let fields: Vec<&str> = payload.trim().split('\t').map(str::trim).collect();
    if fields.len() < 3 {
        return None;
    }
    let coords = fields[..3]
        .iter()
        .map(|s| s.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .collect_tuple()?;
    let annotation = fields.get(3).copied().unwrap_or("");
    Some((coords, annotation))
}
