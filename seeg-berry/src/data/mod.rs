use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView3, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Idx3d, SeegError, SeegResult, Spacing3d};

mod save;

pub use save::NiftiWrite;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 从 header 读取 `(x, y, z)` 形状. 维度数少于 3 时返回 `None`.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Option<Idx3d> {
    let [ndim, x, y, z, ..] = h.dim;
    (ndim >= 3).then_some((x as usize, y as usize, z as usize))
}

/// 体数据的形状与体素分辨率. 核心流程只通过该 trait 观察参考体数据.
pub trait VolumeGeometry {
    /// 体数据形状, 按 `(x, y, z)` 组织.
    fn dims(&self) -> Idx3d;

    /// 体素分辨率 (毫米), 按 `(x, y, z)` 组织.
    fn voxel_size(&self) -> Spacing3d;
}

/// 参考体数据. 只保留 nifti header: 形状, 体素分辨率和空间变换 (affine).
///
/// 空间变换对核心流程是不透明的, 仅在输出时作为参考 header 原样写回.
#[derive(Debug, Clone)]
pub struct ReferenceVolume {
    header: BoxedHeader,
    dims: Idx3d,
}

impl VolumeGeometry for ReferenceVolume {
    #[inline]
    fn dims(&self) -> Idx3d {
        self.dims
    }

    #[inline]
    fn voxel_size(&self) -> Spacing3d {
        let [_, x, y, z, ..] = self.header.pixdim;
        (x as f64, y as f64, z as f64)
    }
}

impl ReferenceVolume {
    /// 读取 nii / nii.gz 文件的 header 作为参考体数据.
    ///
    /// 维度数少于 3 时返回 `Err(SeegError::NotThreeDimensional)`.
    pub fn open<P: AsRef<Path>>(path: P) -> SeegResult<Self> {
        let path = path.as_ref();
        let header = NiftiHeader::from_file(path)?;
        Self::from_header(header, &path.display().to_string())
    }

    /// 由已有 header 构建.
    pub fn from_header(header: NiftiHeader, name: &str) -> SeegResult<Self> {
        let dims = get_shape_from_header(&header).ok_or_else(|| SeegError::NotThreeDimensional {
            name: name.to_owned(),
            shape: header.dim[1..=header.dim[0].min(7) as usize]
                .iter()
                .map(|d| *d as usize)
                .collect(),
        })?;
        Ok(Self {
            header: Box::new(header),
            dims,
        })
    }

    /// 根据形状和体素分辨率直接创建参考体数据. 空间变换为默认值.
    ///
    /// # 注意
    ///
    /// 1. 该方法创建的 header 不对应任何真实扫描, 因此你应仅将其用于实验目的.
    /// 2. nifti-1 的每个维度最多为 `u16::MAX`, 超出时 panic.
    pub fn fake(dims: Idx3d, voxel_size: Spacing3d) -> Self {
        let mut header = Box::<NiftiHeader>::default();
        let dim = |d: usize| match u16::try_from(d) {
            Ok(v) => v,
            Err(_) => panic!("dimension {d} of {dims:?} does not fit in a nifti-1 header"),
        };
        let (x, y, z) = dims;
        header.dim = [3, dim(x), dim(y), dim(z), 1, 1, 1, 1];
        let (px, py, pz) = voxel_size;
        let [_, hx, hy, hz, ..] = &mut header.pixdim;
        (*hx, *hy, *hz) = (px as f32, py as f32, pz as f32);
        header.intent_name[..4].copy_from_slice(b"fake");
        Self { header, dims }
    }

    /// 判断该结构是否是由 `fake` 方法手动拼接的.
    pub fn is_faked(&self) -> bool {
        self.header.intent_name.starts_with(b"fake")
    }

    /// 为输出文件准备的参考 header: 保留空间变换, 重置强度缩放.
    pub fn output_header(&self) -> NiftiHeader {
        let mut h = self.header.as_ref().clone();
        h.scl_slope = 1.0;
        h.scl_inter = 0.0;
        h
    }
}

/// 外部提供的解剖学掩膜 (ROI). 体素值以 `f32` 保存, 与参考体数据同形状.
#[derive(Debug, Clone)]
pub struct ExternalMask {
    name: String,
    data: Array3<f32>,
}

impl Index<Idx3d> for ExternalMask {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

/// 掩膜名: 文件名中第一个 `.` 之前的部分. `/x/hippo.L.nii.gz` -> `hippo`.
pub fn mask_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|f| f.to_string_lossy())
        .and_then(|f| f.split('.').next().map(str::to_owned))
        .unwrap_or_default()
}

impl ExternalMask {
    /// 用给定名字和数据创建掩膜.
    #[inline]
    pub fn new(name: impl Into<String>, data: Array3<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// 打开 nii 文件格式的掩膜. 名字由 [`mask_name`] 从路径得出.
    pub fn open<P: AsRef<Path>>(path: P) -> SeegResult<Self> {
        let path = path.as_ref();
        let name = mask_name(path);
        let obj = ReaderOptions::new().read_file(path)?;
        let data = obj.into_volume().into_ndarray::<f32>()?;
        let shape = data.shape().to_vec();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| SeegError::NotThreeDimensional {
                name: name.clone(),
                shape,
            })?;
        Ok(Self { name, data })
    }

    /// 掩膜名.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 掩膜形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 体素 `pos` 是否非零. 越界时 panic.
    #[inline]
    pub fn is_set(&self, pos: Idx3d) -> bool {
        self[pos] != 0.0
    }

    /// 掩膜足迹: 所有值恰为 1 的体素索引. 结果按行优先存储.
    pub fn footprint(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, v)| (*v == 1.0).then_some(pos))
            .collect()
    }

    /// 形状不同于 `expected` 时返回 `Err(SeegError::ShapeMismatch)`.
    pub fn check_shape(&self, expected: Idx3d) -> SeegResult<()> {
        if self.shape() == expected {
            Ok(())
        } else {
            Err(SeegError::ShapeMismatch {
                name: self.name.clone(),
                expected,
                found: self.shape(),
            })
        }
    }
}
