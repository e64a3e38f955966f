//! 3D 形态学操作: 电极触点周围的离散球掩膜.
//!
//! "球" 由单个种子体素经 6-邻域 (钻石型) 二值膨胀 `radius` 次得到,
//! 因此实际是曼哈顿距离意义下的球 (八面体), 而不是欧氏球.
//! 输出体数据依赖这一形状, 不要把它 "修正" 为欧氏球.

use ndarray::Array3;
use num::ToPrimitive;

use self::dilate::dilate_seed;
use crate::data::ExternalMask;
use crate::{Coord3d, Idx3d, SeegError, SeegResult};

mod dilate;

/// 半径为 `radius` 的离散球的体素个数 (中心八面体数):
/// `(2r + 1)(2r^2 + 2r + 3) / 3`.
///
/// `r = 0, 1, 2` 时分别为 1, 7, 25.
#[inline]
pub const fn sphere_volume(radius: usize) -> usize {
    (2 * radius + 1) * (2 * radius * radius + 2 * radius + 3) / 3
}

/// 将 `center` 取整后逐轴钳制到 `[radius, dim - radius - 1]`.
///
/// 任一维度上 `2 * radius + 1 > dim` 时钳制区间为空, 返回 `Err(SeegError::RadiusTooLarge)`.
fn clamp_center(shape: Idx3d, center: (f64, f64, f64), radius: usize) -> SeegResult<Idx3d> {
    let (sx, sy, sz) = shape;
    let fits = |dim: usize| {
        radius
            .checked_mul(2)
            .and_then(|d| d.checked_add(1))
            .is_some_and(|side| side <= dim)
    };
    if !(fits(sx) && fits(sy) && fits(sz)) {
        return Err(SeegError::RadiusTooLarge { radius, shape });
    }

    let (cx, cy, cz) = center;
    let round = |v: f64| {
        v.round()
            .to_i64()
            .ok_or(SeegError::NonFiniteCoordinate(center))
    };
    let clamp = |v: i64, dim: usize| v.clamp(radius as i64, (dim - radius - 1) as i64) as usize;
    Ok((
        clamp(round(cx)?, sx),
        clamp(round(cy)?, sy),
        clamp(round(cz)?, sz),
    ))
}

/// 一个触点的离散球掩膜.
///
/// 逻辑上是与参考体数据同形状的 0/1 体数据; 内部只保存被置 1 的体素,
/// 需要完整体数据时调用 [`SphereMask::to_array`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SphereMask {
    shape: Idx3d,
    center: Idx3d,
    radius: usize,
    /// 按行优先序排列.
    voxels: Vec<Idx3d>,
}

impl SphereMask {
    /// 在形状为 `shape` 的体数据中, 以 `center` 为中心创建半径为 `radius` 的离散球.
    ///
    /// 1. `center` 四舍五入 (半数远离零) 为体素坐标;
    /// 2. 逐轴钳制到 `[radius, dim - radius - 1]`, 保证球完整落在体数据内,
    ///   越界的中心会被拉回而不是产生空掩膜;
    /// 3. 在中心放置种子, 做 `radius` 次 6-邻域二值膨胀.
    ///
    /// 膨胀只在以中心为原点、边长 `2 * radius + 1` 的局部立方体内进行.
    /// 钳制保证该立方体完全落在体数据内部, 因此与全尺寸体数据上的膨胀结果一致.
    ///
    /// # 返回值
    ///
    /// - 任一维度上 `2 * radius + 1 > dim` 时返回 `Err(SeegError::RadiusTooLarge)`;
    /// - `center` 含有非有限值时返回 `Err(SeegError::NonFiniteCoordinate)`.
    pub fn new(shape: Idx3d, center: (f64, f64, f64), radius: usize) -> SeegResult<Self> {
        let center = clamp_center(shape, center, radius)?;
        let (ox, oy, oz) = (center.0 - radius, center.1 - radius, center.2 - radius);

        // 标准布局下 `indexed_iter` 即行优先序, 平移不改变顺序.
        let voxels: Vec<Idx3d> = dilate_seed(radius)
            .indexed_iter()
            .filter_map(|((x, y, z), set)| set.then_some((x + ox, y + oy, z + oz)))
            .collect();
        debug_assert_eq!(voxels.len(), sphere_volume(radius));

        Ok(Self {
            shape,
            center,
            radius,
            voxels,
        })
    }

    /// 以整数体素坐标为中心创建离散球. 见 [`SphereMask::new`].
    #[inline]
    pub fn at_voxel(shape: Idx3d, (x, y, z): Coord3d, radius: usize) -> SeegResult<Self> {
        Self::new(shape, (x as f64, y as f64, z as f64), radius)
    }

    /// 所在体数据的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 钳制后的中心.
    #[inline]
    pub fn center(&self) -> Idx3d {
        self.center
    }

    /// 半径.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// 置 1 的体素个数. 恒等于 [`sphere_volume`]`(self.radius())`.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// 恒为 `false`: 钳制保证了球至少包含中心体素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// 所有置 1 的体素, 按行优先序排列.
    #[inline]
    pub fn voxels(&self) -> &[Idx3d] {
        &self.voxels
    }

    /// 体素 `pos` 是否属于该球.
    pub fn contains(&self, pos: Idx3d) -> bool {
        self.voxels.binary_search(&pos).is_ok()
    }

    /// 球与外部掩膜是否存在公共非零体素.
    ///
    /// 调用方负责保证两者形状一致, 否则可能 panic.
    #[inline]
    pub fn overlaps(&self, mask: &ExternalMask) -> bool {
        self.voxels.iter().any(|p| mask.is_set(*p))
    }

    /// 将球内所有体素写为 `value`, 覆盖原有值.
    pub fn fill<T: Clone>(&self, dst: &mut Array3<T>, value: T) {
        for pos in self.voxels.iter() {
            dst[*pos] = value.clone();
        }
    }

    /// 生成与 `self.shape()` 同形状的 0/1 体数据.
    pub fn to_array(&self) -> Array3<u8> {
        let mut ans = Array3::zeros(self.shape);
        self.fill(&mut ans, 1u8);
        ans
    }
}
