//! GridView 坐标到参考体数据体素坐标的变换.
//!
//! 变换是按轴的相似变换 (缩放 + 平移), 然后固定镜像 x, y 两轴, z 轴保持不变.
//! 它不是一般的仿射变换: GridView 导出与参考体数据除被翻转的两轴外方向约定一致.
//!
//! 取整统一采用 "四舍五入, 半数远离零" ([`f64::round`]).

use itertools::izip;
use num::ToPrimitive;

use crate::data::VolumeGeometry;
use crate::gridview::GridFile;
use crate::{consts, Coord3d, Idx3d, SeegError, SeegResult};

/// 按三元组逐轴计算.
#[inline]
fn to_array<T: Copy>((a, b, c): (T, T, T)) -> [T; 3] {
    [a, b, c]
}

/// 将 GridView 原始坐标变换到参考体数据体素空间.
///
/// 对每个轴 `i`, 先计算 `round(raw[i] * scaling_factors[i] + voxel_offset[i])`;
/// 再将 x, y 两轴镜像为 `ref_dims[i] - scaled[i]`, z 轴原样保留.
///
/// 如果中间结果或镜像结果不是有限值, 或无法用 `i64` 表示, 返回 `Err(SeegError::NonFiniteCoordinate)`.
pub fn transform(
    raw: Coord3d,
    scaling_factors: (f64, f64, f64),
    voxel_offset: (f64, f64, f64),
    ref_dims: Idx3d,
) -> SeegResult<Coord3d> {
    let mut exact = [0f64; 3];
    for (e, c, s, v) in izip!(
        exact.iter_mut(),
        to_array(raw),
        to_array(scaling_factors),
        to_array(voxel_offset)
    ) {
        *e = c as f64 * s + v;
    }

    let [ex, ey, ez] = exact;
    let unrepresentable = || SeegError::NonFiniteCoordinate((ex, ey, ez));
    let to_voxel = |v: f64| v.round().to_i64().ok_or_else(unrepresentable);
    let (sx, sy, sz) = (to_voxel(ex)?, to_voxel(ey)?, to_voxel(ez)?);

    // 镜像 x, y; z 不变.
    let mirror = |dim: usize, v: i64| {
        dim.to_i64()
            .and_then(|d| d.checked_sub(v))
            .ok_or_else(unrepresentable)
    };
    Ok((mirror(ref_dims.0, sx)?, mirror(ref_dims.1, sy)?, sz))
}

/// 一次运行中所有触点共用的坐标映射参数.
///
/// 由 GridView 头部元信息和参考体数据的形状 / 分辨率计算得到.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridMapping {
    scaling_factors: (f64, f64, f64),
    voxel_offset: (f64, f64, f64),
    ref_dims: Idx3d,
}

impl GridMapping {
    /// 由解析后的 GridView 文件和参考体数据计算映射参数.
    ///
    /// - `scaling_factors[i] = ref_dims[i] / grid_shape[i]`;
    /// - `voxel_offset[i] = ref_voxel_size[i] - grid_voxel_size[i]`.
    ///
    /// # 返回值
    ///
    /// - 缺少 `Image cube size` 或 `Image cube resolution` 时返回
    ///   `Err(SeegError::MissingMetadata)`;
    /// - GridView 尺寸存在零维度时返回 `Err(SeegError::DegenerateGridShape)`.
    pub fn new<V: VolumeGeometry + ?Sized>(grid: &GridFile, reference: &V) -> SeegResult<Self> {
        let shape = grid
            .shape()
            .ok_or(SeegError::MissingMetadata(consts::gridview::CUBE_SIZE))?;
        let voxel_size = grid
            .voxel_size()
            .ok_or(SeegError::MissingMetadata(consts::gridview::CUBE_RESOLUTION))?;
        if to_array(shape).contains(&0) {
            return Err(SeegError::DegenerateGridShape(shape));
        }

        let ref_dims = reference.dims();
        let (rx, ry, rz) = reference.voxel_size();
        let (gx, gy, gz) = voxel_size;
        let (sx, sy, sz) = shape;
        Ok(Self {
            scaling_factors: (
                ref_dims.0 as f64 / sx as f64,
                ref_dims.1 as f64 / sy as f64,
                ref_dims.2 as f64 / sz as f64,
            ),
            voxel_offset: (rx - gx, ry - gy, rz - gz),
            ref_dims,
        })
    }

    /// 缩放因子.
    #[inline]
    pub fn scaling_factors(&self) -> (f64, f64, f64) {
        self.scaling_factors
    }

    /// 体素平移量.
    #[inline]
    pub fn voxel_offset(&self) -> (f64, f64, f64) {
        self.voxel_offset
    }

    /// 参考体数据形状.
    #[inline]
    pub fn ref_dims(&self) -> Idx3d {
        self.ref_dims
    }

    /// 变换单个原始坐标. 见 [`transform`].
    #[inline]
    pub fn apply(&self, raw: Coord3d) -> SeegResult<Coord3d> {
        transform(raw, self.scaling_factors, self.voxel_offset, self.ref_dims)
    }
}
