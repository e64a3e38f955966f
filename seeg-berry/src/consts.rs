//! 通用常量.

/// 标签体数据中背景体素的值.
pub const BACKGROUND: i32 = 0;

/// 默认的球掩膜半径 (体素).
pub const DEFAULT_RADIUS: usize = 2;

/// 输出文件名.
pub mod files {
    /// 合并后的标签体数据 (不含扩展名).
    pub const LABELS: &str = "labels";

    /// 电极查找表.
    pub const LUT: &str = "electrode_lut.txt";

    /// 生成模式下的坐标变换日志.
    pub const CONVERSION_LOG: &str = "coordinate_conversions.txt";

    /// 匹配模式下的匹配日志.
    pub const MATCH_LOG: &str = "coordinate_match.txt";

    /// 统计模式下每个 ROI 的标签分布表.
    pub const ROI_ANALYSIS: &str = "roi_analysis.csv";

    /// nifti 输出统一使用的扩展名.
    pub const NIFTI_EXT: &str = "nii.gz";
}

/// GridView 文本格式中的固定前缀.
pub mod gridview {
    /// 体数据尺寸行前缀.
    pub const CUBE_SIZE: &str = "Image cube size";

    /// 体素分辨率行前缀.
    pub const CUBE_RESOLUTION: &str = "Image cube resolution";

    /// 电极组行前缀.
    pub const GROUP: &str = "Group:";

    /// 触点行的匹配模式.
    pub const CONTACT_PATTERN: &str = r"^[A-Z]+[0-9]+:";
}
