#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 将 GridView 电极规划导出文件 (立体定向脑电 SEEG 电极触点坐标)
//! 转换为配准到参考 nifti 体数据体素空间的电极标签.
//!
//! 该 crate 本身不做任何进程级副作用 (退出, 参数检查). 体数据读写通过
//! [`data`] 与 [`sink`] 中的窄接口完成, 以便测试时替换.
//!
//! # 注意
//!
//! 1. 所有体数据均按照 nifti 文件原生的 `(x, y, z)` 索引顺序访问,
//!   **不** 做轴重排, 因为电极坐标本身就是 `(x, y, z)`.
//! 2. 电极的遍历顺序 (组的插入顺序, 然后组内触点的插入顺序) 决定了标签覆盖和掩膜匹配的结果,
//!   因此所有容器都是保序的.
//!
//! # 开发计划
//!
//! ### GridView 文本解析 ✅
//!
//! 头部元信息 (`Image cube size`, `Image cube resolution`), 电极组与触点行.
//! 格式错误的行被丢弃并记为警告, 不会中断解析.
//!
//! 实现位于 `seeg-berry/src/gridview`.
//!
//! ### 坐标变换 ✅
//!
//! 按轴缩放 + 平移, 然后镜像 x, y 两轴.
//!
//! 实现位于 `seeg-berry/src/transform.rs`.
//!
//! ### 离散球掩膜 ✅
//!
//! 单体素种子 + 6-邻域二值膨胀 `radius` 次. 结果是曼哈顿球 (八面体),
//! 体素个数恰为 `(2r + 1)(2r^2 + 2r + 3) / 3`.
//!
//! 实现位于 `seeg-berry/src/morph_3d`.
//!
//! ### 电极 ID 编码, 标签体数据与查找表 ✅
//!
//! 实现位于 `seeg-berry/src/{ident, label}.rs`.
//!
//! ### 外部 ROI 掩膜匹配 ✅
//!
//! "首个重叠者胜出" 策略. 以及反方向的统计: 每个 ROI 覆盖的标签值分布.
//!
//! 实现位于 `seeg-berry/src/matcher.rs`.
//!
//! ### 完整运行流程与输出 ✅
//!
//! 实现位于 `seeg-berry/src/{pipeline, report, sink}.rs`.

/// 三维非负索引 / 体数据形状, 按 `(x, y, z)` 组织.
pub type Idx3d = (usize, usize, usize);

/// 三维有符号体素坐标. 变换后的电极坐标可能落在体数据外, 因此需要符号.
pub type Coord3d = (i64, i64, i64);

/// 三维体素分辨率 (毫米), 按 `(x, y, z)` 组织.
pub type Spacing3d = (f64, f64, f64);

pub mod consts;

mod error;

pub use error::{SeegError, SeegResult};

/// GridView 电极导出文件.
pub mod gridview;

pub mod transform;

pub mod morph_3d;

pub mod ident;

pub mod label;

pub mod matcher;

/// 参考体数据与外部掩膜.
pub mod data;

pub mod report;

pub mod sink;

pub mod pipeline;

pub mod prelude;

pub use data::{ExternalMask, NiftiWrite, ReferenceVolume, VolumeGeometry};
pub use gridview::{ElectrodeRecord, GridFile, GridParse, ParseWarning};
pub use ident::ElectrodeId;
pub use label::{LabelBuild, LabelVolume, LookupTable, TransformEntry};
pub use matcher::{MaskMatch, MatchOutcome, RoiLabelSummary};
pub use morph_3d::SphereMask;
pub use transform::GridMapping;
