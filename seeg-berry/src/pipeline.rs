//! 三种完整运行: 由触点生成球掩膜 (`create`), 将外部掩膜匹配到触点 (`match`),
//! 以及统计已有标签体数据在每个外部掩膜内的分布 (`labels`).
//!
//! 输出文件集合:
//!
//! | 文件 | `create` | `match` | `labels` |
//! |------|----------|---------|----------|
//! | `<触点名>.nii.gz` | 每个触点的球掩膜 (UINT8) | 每个匹配成功的外部掩膜 (FLOAT32) | |
//! | `labels.nii.gz` | 所有球合并 (INT32) | 所有匹配足迹合并 (INT32) | |
//! | `electrode_lut.txt` | 所有触点 | 匹配到的触点 | |
//! | `coordinate_conversions.txt` | ✅ | | |
//! | `coordinate_match.txt` | | ✅ | |
//! | `roi_analysis.csv` | | | ✅ |

use std::path::Path;

use crate::consts::files::{CONVERSION_LOG, LABELS, LUT, MATCH_LOG, ROI_ANALYSIS};
use crate::data::{ExternalMask, VolumeGeometry};
use crate::gridview::{GridParse, ParseWarning};
use crate::label::{self, LabelBuild, LabelVolume};
use crate::matcher::{self, MatchOutcome, RoiLabelSummary};
use crate::report;
use crate::sink::OutputSink;
use crate::{SeegError, SeegResult};

/// 将解析警告逐条写入日志.
pub fn log_parse_warnings(warnings: &[ParseWarning]) {
    for w in warnings {
        log::warn!("{w}");
    }
}

fn log_summary(sink: &dyn OutputSink, log_name: &str) {
    let location = sink.location();
    log::info!("Complete! Masks saved in {location}");
    log::info!(
        "Coordinate transformations logged in {}",
        Path::new(&location).join(log_name).display()
    );
}

/// 生成模式: 为每个触点生成球掩膜并写出所有结果.
///
/// 球掩膜在生成后立即写出, 不会同时驻留内存; 因此返回值中 [`LabelBuild::masks`] 为空.
pub fn create_rois<V: VolumeGeometry + ?Sized>(
    parsed: &GridParse,
    reference: &V,
    radius: usize,
    sink: &mut dyn OutputSink,
) -> SeegResult<LabelBuild> {
    log_parse_warnings(&parsed.warnings);
    log::info!(
        "Creating spheres of radius {radius} for {} contacts",
        parsed.grid.len()
    );

    let build = label::build_with(&parsed.grid, reference, radius, |record, _, sphere| {
        sink.save_volume(record.contact_name(), &sphere.to_array())
    })?;

    sink.save_volume(LABELS, &build.labels)?;
    sink.save_text(LUT, &report::lut_lines(&build.lut))?;
    sink.save_text(CONVERSION_LOG, &report::transform_log_lines(&build.transforms))?;

    log_summary(sink, CONVERSION_LOG);
    Ok(build)
}

/// 匹配模式: 将每个外部掩膜匹配到至多一个触点并写出所有结果.
///
/// 匹配成功的掩膜以胜出触点名原样写出. 同一触点匹配多个掩膜时, 后写出者覆盖先写出者.
pub fn match_rois<V: VolumeGeometry + ?Sized>(
    parsed: &GridParse,
    reference: &V,
    masks: &[ExternalMask],
    radius: usize,
    sink: &mut dyn OutputSink,
) -> SeegResult<MatchOutcome> {
    log_parse_warnings(&parsed.warnings);
    log::info!(
        "Matching {} masks against {} contacts",
        masks.len(),
        parsed.grid.len()
    );

    let outcome = matcher::match_masks(&parsed.grid, reference, masks, radius)?;

    for m in outcome.matches.iter() {
        sink.save_volume(&m.contact, &masks[m.mask_index])?;
    }
    sink.save_volume(LABELS, &outcome.labels)?;
    sink.save_text(LUT, &report::lut_lines(&outcome.lut))?;
    sink.save_text(MATCH_LOG, &report::match_log_lines(&outcome.matches))?;

    if !outcome.unmatched.is_empty() {
        log::info!(
            "{} of {} masks matched no electrode",
            outcome.unmatched.len(),
            masks.len()
        );
    }
    log_summary(sink, MATCH_LOG);
    Ok(outcome)
}

/// 统计模式: 计算每个外部掩膜内的标签分布并写出 CSV 表.
///
/// # 返回值
///
/// - 掩膜形状不一致时同 [`matcher::labels_by_roi`];
/// - 没有任何掩膜覆盖体素时返回 `Err(SeegError::NoRoiOverlap)`, 不写出文件.
pub fn summarize_rois(
    labels: &LabelVolume,
    masks: &[ExternalMask],
    sink: &mut dyn OutputSink,
) -> SeegResult<Vec<RoiLabelSummary>> {
    log::info!("Analyzing label distribution in {} masks", masks.len());
    let summaries = matcher::labels_by_roi(labels, masks)?;
    if summaries.is_empty() {
        return Err(SeegError::NoRoiOverlap(masks.len()));
    }
    sink.save_text(ROI_ANALYSIS, &report::roi_csv_lines(&summaries))?;
    log::info!(
        "Results saved to {}",
        Path::new(&sink.location()).join(ROI_ANALYSIS).display()
    );
    Ok(summaries)
}
