//! 电极标签体数据与查找表.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array3, ArrayView3, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::BACKGROUND;
use crate::data::{NiftiWrite, VolumeGeometry};
use crate::gridview::{ElectrodeRecord, GridFile};
use crate::ident::ElectrodeId;
use crate::morph_3d::SphereMask;
use crate::transform::GridMapping;
use crate::{Coord3d, Idx3d, SeegError, SeegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 与参考体数据同形状的整数标签体数据. 背景为 [`BACKGROUND`], 其余体素为电极 ID.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelVolume(Array3<i32>);

impl LabelVolume {
    /// 创建全背景的标签体数据.
    pub fn new(shape: Idx3d) -> Self {
        Self(Array3::from_elem(shape, BACKGROUND))
    }

    /// 形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.0.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i32> {
        self.0.view()
    }

    /// 打开 nii 文件格式的标签体数据. 浮点体素值按 `as` 语义截断为整数.
    ///
    /// 维度数不为 3 时返回 `Err(SeegError::NotThreeDimensional)`.
    pub fn open<P: AsRef<Path>>(path: P) -> SeegResult<Self> {
        let path = path.as_ref();
        let obj = ReaderOptions::new().read_file(path)?;
        let data = obj.into_volume().into_ndarray::<i32>()?;
        let shape = data.shape().to_vec();
        data.into_dimensionality::<Ix3>()
            .map(Self)
            .map_err(|_| SeegError::NotThreeDimensional {
                name: path.display().to_string(),
                shape,
            })
    }

    /// 体素 `pos` 处的值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<i32> {
        self.0.get(pos).copied()
    }

    /// 将球内所有体素写为 `id`. 覆盖已有值.
    #[inline]
    pub fn paint_sphere(&mut self, sphere: &SphereMask, id: ElectrodeId) {
        sphere.fill(&mut self.0, id.get());
    }

    /// 将 `voxels` 中所有体素写为 `id`. 覆盖已有值.
    pub fn paint_voxels(&mut self, voxels: &[Idx3d], id: ElectrodeId) {
        for pos in voxels {
            self.0[*pos] = id.get();
        }
    }

    /// 非背景体素个数.
    pub fn count_labelled(&self) -> usize {
        self.0.iter().filter(|v| **v != BACKGROUND).count()
    }
}

impl NiftiWrite for LabelVolume {
    #[inline]
    fn write_nifti(&self, path: &Path, reference: &NiftiHeader) -> SeegResult<()> {
        self.0.write_nifti(path, reference)
    }
}

/// 电极 ID 到触点名的查找表. 按 ID 升序迭代.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LookupTable(BTreeMap<ElectrodeId, String>);

impl LookupTable {
    /// 空表.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入 `(id, name)`. `id` 已存在时覆盖, 并返回旧名字.
    pub fn insert(&mut self, id: ElectrodeId, name: impl Into<String>) -> Option<String> {
        self.0.insert(id, name.into())
    }

    /// 查找 `id` 对应的触点名.
    #[inline]
    pub fn get(&self, id: ElectrodeId) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }

    /// 条目数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按 ID 升序迭代.
    pub fn iter(&self) -> impl Iterator<Item = (ElectrodeId, &str)> {
        self.0.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// 插入并在 ID 冲突时记录警告.
    pub(crate) fn insert_logged(&mut self, id: ElectrodeId, name: &str) {
        if let Some(prev) = self.insert(id, name) {
            if prev != name {
                log::warn!("Electrode id {id} shared by {prev} and {name}; keeping {name}");
            }
        }
    }
}

/// 一个触点的坐标变换记录.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformEntry {
    /// 触点名.
    pub contact: String,
    /// GridView 原始坐标.
    pub original: Coord3d,
    /// 参考体数据体素坐标 (钳制前).
    pub transformed: Coord3d,
    /// 电极 ID.
    pub id: ElectrodeId,
}

/// 生成模式的完整结果.
#[derive(Clone, Debug)]
pub struct LabelBuild {
    /// 合并后的标签体数据.
    pub labels: LabelVolume,
    /// 查找表.
    pub lut: LookupTable,
    /// 每个触点的球掩膜, 按处理顺序排列. 由 [`build_with`] 得到时为空.
    pub masks: Vec<(String, SphereMask)>,
    /// 每个触点的坐标变换记录, 按处理顺序排列.
    pub transforms: Vec<TransformEntry>,
}

/// 为每个触点生成球掩膜并合并为标签体数据. 见 [`build_with`].
pub fn build<V: VolumeGeometry + ?Sized>(
    grid: &GridFile,
    reference: &V,
    radius: usize,
) -> SeegResult<LabelBuild> {
    let mut masks = Vec::with_capacity(grid.len());
    let mut ans = build_with(grid, reference, radius, |record, _, sphere| {
        masks.push((record.contact_name().to_owned(), sphere));
        Ok(())
    })?;
    ans.masks = masks;
    Ok(ans)
}

/// 为每个触点生成球掩膜并合并为标签体数据, 每个球掩膜交给 `on_contact` 处理后丢弃.
///
/// 按 "先组, 后组内触点" 的插入顺序处理. 每个触点:
///
/// 1. 坐标变换到参考体数据体素空间;
/// 2. 以变换结果为中心生成半径 `radius` 的球掩膜;
/// 3. 编码电极 ID, 写入球内所有体素 (覆盖之前的触点);
/// 4. 写入查找表 (同 ID 以后写入者为准) 并记录变换.
///
/// # 返回值
///
/// 缺少头部元信息时在任何坐标计算之前返回错误. 其余错误见
/// [`GridMapping::new`], [`SphereMask::new`], [`ElectrodeId::encode`];
/// `on_contact` 返回的错误会原样传播.
pub fn build_with<V, F>(
    grid: &GridFile,
    reference: &V,
    radius: usize,
    mut on_contact: F,
) -> SeegResult<LabelBuild>
where
    V: VolumeGeometry + ?Sized,
    F: FnMut(&ElectrodeRecord, ElectrodeId, SphereMask) -> SeegResult<()>,
{
    let mapping = GridMapping::new(grid, reference)?;
    let shape = reference.dims();

    let mut labels = LabelVolume::new(shape);
    let mut lut = LookupTable::new();
    let mut transforms = Vec::with_capacity(grid.len());

    for record in grid.contacts() {
        let transformed = mapping.apply(record.raw_coordinates())?;
        let sphere = SphereMask::at_voxel(shape, transformed, radius)?;
        let id = ElectrodeId::encode(record.group(), record.contact_name())?;
        log::debug!(
            "{}: {:?} -> {:?} (center {:?}), id {id}",
            record.contact_name(),
            record.raw_coordinates(),
            transformed,
            sphere.center()
        );

        labels.paint_sphere(&sphere, id);
        lut.insert_logged(id, record.contact_name());
        transforms.push(TransformEntry {
            contact: record.contact_name().to_owned(),
            original: record.raw_coordinates(),
            transformed,
            id,
        });
        on_contact(record, id, sphere)?;
    }

    Ok(LabelBuild {
        labels,
        lut,
        masks: vec![],
        transforms,
    })
}
