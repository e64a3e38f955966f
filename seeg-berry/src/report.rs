//! 文本输出: 查找表, 坐标日志与 ROI 标签分布表.
//!
//! 所有函数只生成行 (不含换行符), 由 [`crate::sink::OutputSink::save_text`] 负责落盘.

use crate::label::{LookupTable, TransformEntry};
use crate::matcher::{MaskMatch, RoiLabelSummary};
use crate::Coord3d;

/// 渲染为 `[x, y, z]`.
fn bracketed((x, y, z): Coord3d) -> String {
    format!("[{x}, {y}, {z}]")
}

/// 标题, 等长的 `=` 下划线与一个空行.
fn title(text: &str) -> [String; 3] {
    [text.to_owned(), "=".repeat(text.len()), String::new()]
}

/// 表头与分隔线. 分隔线固定 70 个 `-`.
fn table_head(columns: [&str; 4]) -> [String; 2] {
    let [a, b, c, d] = columns;
    [row(a, b, c, d), "-".repeat(70)]
}

#[inline]
fn row(a: &str, b: &str, c: &str, d: &str) -> String {
    format!("{a:<10} {b:<20} {c:<20} {d:<20}")
}

/// 查找表: 每行 `"<触点名> <ID>"`, ID 升序.
pub fn lut_lines(lut: &LookupTable) -> Vec<String> {
    lut.iter().map(|(id, name)| format!("{name} {id}")).collect()
}

/// 生成模式的坐标变换日志.
///
/// ```text
/// Electrode Coordinate Transformations
/// ====================================
///
/// Contact    Original             Transformed          ID
/// ----------------------------------------------------------------------
/// A1         [10, 20, 30]         [79, 59, 61]         651
/// ```
///
/// 各列左对齐填充到 10 / 20 / 20 / 20 个字符 (行尾空格保留).
pub fn transform_log_lines(entries: &[TransformEntry]) -> Vec<String> {
    let mut ans = Vec::with_capacity(entries.len() + 5);
    ans.extend(title("Electrode Coordinate Transformations"));
    ans.extend(table_head(["Contact", "Original", "Transformed", "ID"]));
    ans.extend(entries.iter().map(|e| {
        row(
            &e.contact,
            &bracketed(e.original),
            &bracketed(e.transformed),
            &e.id.to_string(),
        )
    }));
    ans
}

/// 匹配模式的匹配日志. 格式同 [`transform_log_lines`], 列为
/// `Contact`, `Mask Name`, `Coordinate`, `ID`.
pub fn match_log_lines(matches: &[MaskMatch]) -> Vec<String> {
    let mut ans = Vec::with_capacity(matches.len() + 5);
    ans.extend(title("Electrode Match Transformations"));
    ans.extend(table_head(["Contact", "Mask Name", "Coordinate", "ID"]));
    ans.extend(matches.iter().map(|m| {
        row(
            &m.contact,
            &m.mask,
            &bracketed(m.coordinate),
            &m.id.to_string(),
        )
    }));
    ans
}

/// 缺失值的占位符.
const NULL: &str = "null";

/// 含 `,` `"` 或换行的字段用双引号包裹, 内部的 `"` 写两次.
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}

/// ROI 标签分布表 (CSV), 第一行为表头:
///
/// ```text
/// ROI,Dominant_Label,All_Labels,Percentage_Breakdown
/// hippo,651,"651, 6612",0.200*0+0.600*651+0.200*6612
/// white,null,null,1.000*0
/// ```
pub fn roi_csv_lines(summaries: &[RoiLabelSummary]) -> Vec<String> {
    let mut ans = Vec::with_capacity(summaries.len() + 1);
    ans.push("ROI,Dominant_Label,All_Labels,Percentage_Breakdown".to_owned());
    ans.extend(summaries.iter().map(|s| {
        let dominant = s.dominant().map_or_else(|| NULL.to_owned(), |l| l.to_string());
        let labels = s.labels();
        let all = if labels.is_empty() {
            NULL.to_owned()
        } else {
            labels.iter().map(i32::to_string).collect::<Vec<_>>().join(", ")
        };
        let breakdown = s.breakdown();
        [s.roi.as_str(), dominant.as_str(), all.as_str(), breakdown.as_str()]
            .map(csv_field)
            .join(",")
    }));
    ans
}
