//! 运行时错误.

use thiserror::Error;

use crate::Idx3d;

/// 电极标签流程中所有致命错误.
///
/// 非致命情况 (被丢弃的行, 未匹配的掩膜, 重复 ID) 不走这里,
/// 而是通过 `log::warn!` 和各自结果结构中的字段报告.
#[derive(Debug, Error)]
pub enum SeegError {
    /// GridView 文件缺少某项头部元信息. 参数为该行的前缀.
    #[error("GridView file has no `{0}` line; cannot map coordinates")]
    MissingMetadata(&'static str),

    /// GridView 体数据尺寸存在零维度, 无法计算缩放因子.
    #[error("GridView image cube size {0:?} has a zero dimension")]
    DegenerateGridShape(Idx3d),

    /// 球半径相对于体数据形状过大: 某一维度上 `2 * radius + 1 > dim`.
    #[error("sphere radius {radius} does not fit in volume of shape {shape:?}")]
    RadiusTooLarge {
        /// 请求的半径.
        radius: usize,
        /// 体数据形状.
        shape: Idx3d,
    },

    /// 坐标为 NaN / inf, 或无法用 `i64` 表示.
    #[error("coordinate {0:?} is not a finite voxel position")]
    NonFiniteCoordinate((f64, f64, f64)),

    /// 无法从组名与触点名编码电极 ID.
    #[error("cannot derive an electrode id from group `{group}` and contact `{contact}`")]
    InvalidElectrodeName {
        /// 组名.
        group: String,
        /// 触点名.
        contact: String,
    },

    /// 外部掩膜形状与参考体数据不一致.
    #[error("mask `{name}` has shape {found:?}, reference volume has {expected:?}")]
    ShapeMismatch {
        /// 掩膜名.
        name: String,
        /// 参考体数据形状.
        expected: Idx3d,
        /// 掩膜形状.
        found: Idx3d,
    },

    /// 体数据不是三维的.
    #[error("volume `{name}` is not three-dimensional (shape {shape:?})")]
    NotThreeDimensional {
        /// 文件或掩膜名.
        name: String,
        /// 实际形状.
        shape: Vec<usize>,
    },

    /// ROI 统计时没有任何掩膜覆盖体素. 参数为掩膜个数.
    #[error("none of the {0} masks covers any voxel; nothing to report")]
    NoRoiOverlap(usize),

    /// nifti 读写错误.
    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 其他底层 I/O 错误.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 电极标签流程的运行结果.
pub type SeegResult<T> = Result<T, SeegError>;
