//! GridView 电极规划导出文件的结构化表示.
//!
//! 文件是逐行的文本格式: 头部给出 GridView 体数据尺寸与分辨率,
//! `Group:` 行开启一个电极组, 其后的触点行 (`A12: x\ty\tz\t注释`) 属于该组.

use crate::{Coord3d, Idx3d, Spacing3d};

mod reader;

pub use reader::{parse, GridParse, ParseWarning};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个电极触点. 由解析器创建, 之后不可变.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElectrodeRecord {
    group: String,
    contact_name: String,
    raw_coordinates: Coord3d,
    annotation: String,
}

impl ElectrodeRecord {
    /// 初始化.
    pub fn new(
        group: impl Into<String>,
        contact_name: impl Into<String>,
        raw_coordinates: Coord3d,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            contact_name: contact_name.into(),
            raw_coordinates,
            annotation: annotation.into(),
        }
    }

    /// 所属电极组名.
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// 触点名, 如 `A12`.
    #[inline]
    pub fn contact_name(&self) -> &str {
        &self.contact_name
    }

    /// GridView 空间中的原始坐标.
    #[inline]
    pub fn raw_coordinates(&self) -> Coord3d {
        self.raw_coordinates
    }

    /// 注释. 缺省为空串.
    #[inline]
    pub fn annotation(&self) -> &str {
        &self.annotation
    }
}

/// 一个电极组: 组名 + 按插入顺序排列的触点.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElectrodeGroup {
    name: String,
    contacts: Vec<ElectrodeRecord>,
}

impl ElectrodeGroup {
    /// 组名.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 组内触点, 保持插入顺序.
    #[inline]
    pub fn contacts(&self) -> &[ElectrodeRecord] {
        &self.contacts
    }
}

/// 解析完成的 GridView 文件.
///
/// 组的顺序以及组内触点的顺序都是插入顺序. 该顺序决定了标签覆盖和掩膜匹配的胜出者,
/// 因此这里只使用 `Vec` 而不是哈希表.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridFile {
    shape: Option<Idx3d>,
    voxel_size: Option<Spacing3d>,
    groups: Vec<ElectrodeGroup>,
}

impl GridFile {
    /// 直接由元信息和分组数据构建. 分组按给定顺序保存.
    pub fn new<I, S>(shape: Option<Idx3d>, voxel_size: Option<Spacing3d>, groups: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<ElectrodeRecord>)>,
        S: Into<String>,
    {
        let mut ans = Self {
            shape,
            voxel_size,
            groups: vec![],
        };
        for (name, contacts) in groups {
            let name: String = name.into();
            let (idx, _) = ans.open_group(&name);
            contacts
                .into_iter()
                .for_each(|c| ans.push_contact(idx, c));
        }
        ans
    }

    /// GridView 体数据尺寸. 文件中缺少 `Image cube size` 行时为 `None`.
    #[inline]
    pub fn shape(&self) -> Option<Idx3d> {
        self.shape
    }

    /// GridView 体素分辨率. 文件中缺少 `Image cube resolution` 行时为 `None`.
    #[inline]
    pub fn voxel_size(&self) -> Option<Spacing3d> {
        self.voxel_size
    }

    /// 所有电极组, 保持插入顺序.
    #[inline]
    pub fn groups(&self) -> &[ElectrodeGroup] {
        &self.groups
    }

    /// 按组名查找电极组.
    pub fn group(&self, name: &str) -> Option<&ElectrodeGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// 以 "先组, 后组内触点" 的插入顺序迭代所有触点.
    pub fn contacts(&self) -> impl Iterator<Item = &ElectrodeRecord> {
        self.groups.iter().flat_map(|g| g.contacts.iter())
    }

    /// 触点总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.contacts.len()).sum()
    }

    /// 是否不含任何触点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_shape(&mut self, shape: Idx3d) {
        self.shape = Some(shape);
    }

    pub(crate) fn set_voxel_size(&mut self, voxel_size: Spacing3d) {
        self.voxel_size = Some(voxel_size);
    }

    /// 开启一个组, 返回 `(组下标, 是否为重复组名)`.
    ///
    /// 同名组已存在时清空其触点并保留其原有位置 (有序映射语义).
    pub(crate) fn open_group(&mut self, name: &str) -> (usize, bool) {
        if let Some(pos) = self.groups.iter().position(|g| g.name == name) {
            self.groups[pos].contacts.clear();
            return (pos, true);
        }
        self.groups.push(ElectrodeGroup {
            name: name.to_owned(),
            contacts: vec![],
        });
        (self.groups.len() - 1, false)
    }

    /// 向第 `group` 个组末尾追加触点. 下标越界时 panic.
    #[inline]
    pub(crate) fn push_contact(&mut self, group: usize, record: ElectrodeRecord) {
        self.groups[group].contacts.push(record);
    }
}
