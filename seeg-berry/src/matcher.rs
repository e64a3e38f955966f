//! 外部解剖学掩膜与电极触点的匹配.
//!
//! 每个掩膜按给定顺序独立匹配: 在所有触点 (插入顺序) 中, 第一个球掩膜与之存在公共
//! 非零体素的触点胜出. 不同掩膜之间没有排他性, 同一触点可以匹配多个掩膜.
//!
//! 反方向的统计 ([`labels_by_roi`]) 不需要电极文件: 直接统计每个掩膜覆盖的标签值分布.

use std::collections::BTreeMap;

use crate::consts::BACKGROUND;
use crate::data::{ExternalMask, VolumeGeometry};
use crate::gridview::{ElectrodeRecord, GridFile};
use crate::ident::ElectrodeId;
use crate::label::{LabelVolume, LookupTable};
use crate::morph_3d::SphereMask;
use crate::transform::GridMapping;
use crate::{Coord3d, SeegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一个触点在参考体数据中的放置结果.
#[derive(Clone, Debug)]
pub struct Placement<'a> {
    /// 触点.
    pub record: &'a ElectrodeRecord,
    /// 电极 ID.
    pub id: ElectrodeId,
    /// 变换后的体素坐标 (钳制前).
    pub coordinate: Coord3d,
    /// 球掩膜.
    pub sphere: SphereMask,
}

/// 一次成功的匹配.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaskMatch {
    /// 掩膜名.
    pub mask: String,
    /// 掩膜在输入序列中的下标.
    pub mask_index: usize,
    /// 胜出的触点名.
    pub contact: String,
    /// 胜出触点变换后的体素坐标.
    pub coordinate: Coord3d,
    /// 胜出触点的电极 ID.
    pub id: ElectrodeId,
}

/// 匹配模式的完整结果.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    /// 匹配成功的掩膜足迹写入对应电极 ID 后的标签体数据.
    pub labels: LabelVolume,
    /// 匹配到的电极的查找表.
    pub lut: LookupTable,
    /// 所有成功的匹配, 按掩膜顺序排列.
    pub matches: Vec<MaskMatch>,
    /// 没有任何触点与之重叠的掩膜名, 按掩膜顺序排列.
    pub unmatched: Vec<String>,
}

/// 计算所有触点的放置结果, 保持插入顺序.
pub fn place_contacts<'a, V: VolumeGeometry + ?Sized>(
    grid: &'a GridFile,
    reference: &V,
    radius: usize,
) -> SeegResult<Vec<Placement<'a>>> {
    let mapping = GridMapping::new(grid, reference)?;
    let shape = reference.dims();
    grid.contacts()
        .map(|record| {
            let coordinate = mapping.apply(record.raw_coordinates())?;
            Ok(Placement {
                record,
                id: ElectrodeId::encode(record.group(), record.contact_name())?,
                coordinate,
                sphere: SphereMask::at_voxel(shape, coordinate, radius)?,
            })
        })
        .collect()
}

/// "首个重叠者胜出": 返回 `placements` 中第一个球掩膜与 `mask` 重叠的放置结果.
pub fn first_overlap<'p, 'a>(
    placements: &'p [Placement<'a>],
    mask: &ExternalMask,
) -> Option<&'p Placement<'a>> {
    placements.iter().find(|p| p.sphere.overlaps(mask))
}

/// 将每个外部掩膜匹配到至多一个触点.
///
/// 匹配成功时, 掩膜中值恰为 1 的体素 (足迹) 被写为胜出触点的 ID, 并写入查找表.
/// 没有触点与之重叠的掩膜被记入 [`MatchOutcome::unmatched`] 并记录警告, 不写入任何体素.
///
/// # 返回值
///
/// - 任一掩膜形状与参考体数据不一致时, 在匹配开始前返回 `Err(SeegError::ShapeMismatch)`;
/// - 其余错误同 [`crate::label::build`].
pub fn match_masks<V: VolumeGeometry + ?Sized>(
    grid: &GridFile,
    reference: &V,
    masks: &[ExternalMask],
    radius: usize,
) -> SeegResult<MatchOutcome> {
    let shape = reference.dims();
    masks.iter().try_for_each(|m| m.check_shape(shape))?;
    let placements = place_contacts(grid, reference, radius)?;

    let mut labels = LabelVolume::new(shape);
    let mut lut = LookupTable::new();
    let mut matches = vec![];
    let mut unmatched = vec![];

    for (mask_index, mask) in masks.iter().enumerate() {
        let Some(winner) = first_overlap(&placements, mask) else {
            log::warn!("Mask {} does not match any electrode", mask.name());
            unmatched.push(mask.name().to_owned());
            continue;
        };
        let contact = winner.record.contact_name();
        log::debug!("Mask {} matched {contact} (id {})", mask.name(), winner.id);

        labels.paint_voxels(&mask.footprint(), winner.id);
        lut.insert_logged(winner.id, contact);
        matches.push(MaskMatch {
            mask: mask.name().to_owned(),
            mask_index,
            contact: contact.to_owned(),
            coordinate: winner.coordinate,
            id: winner.id,
        });
    }

    Ok(MatchOutcome {
        labels,
        lut,
        matches,
        unmatched,
    })
}

/// 一个掩膜 (ROI) 覆盖范围内的标签值分布.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiLabelSummary {
    /// 掩膜名.
    pub roi: String,
    /// 掩膜覆盖的体素总数.
    pub voxels: usize,
    /// `(标签值, 体素个数)`, 按标签值升序排列, 包含背景.
    pub counts: Vec<(i32, usize)>,
}

impl RoiLabelSummary {
    /// 体素最多的非背景标签. 并列时取标签值较小者; 只有背景时返回 `None`.
    pub fn dominant(&self) -> Option<i32> {
        self.counts
            .iter()
            .filter(|(label, _)| *label != BACKGROUND)
            .fold(None, |best: Option<(i32, usize)>, &(label, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((label, n)),
            })
            .map(|(label, _)| label)
    }

    /// 所有非背景标签, 升序.
    pub fn labels(&self) -> Vec<i32> {
        self.counts
            .iter()
            .map(|(label, _)| *label)
            .filter(|label| *label != BACKGROUND)
            .collect()
    }

    /// 标签 `label` 占掩膜体素的比例. 不存在时为 0.
    pub fn fraction(&self, label: i32) -> f64 {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0.0, |(_, n)| *n as f64 / self.voxels as f64)
    }

    /// 比例明细, 形如 `0.250*0+0.750*651`, 包含背景.
    pub fn breakdown(&self) -> String {
        self.counts
            .iter()
            .map(|(label, n)| format!("{:.3}*{label}", *n as f64 / self.voxels as f64))
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// 统计每个掩膜覆盖范围 (值大于 0 的体素) 内的标签值分布, 保持掩膜顺序.
///
/// 不覆盖任何体素的掩膜记录警告后跳过, 不出现在结果中.
///
/// # 返回值
///
/// 任一掩膜形状与 `labels` 不一致时, 在统计开始前返回 `Err(SeegError::ShapeMismatch)`.
pub fn labels_by_roi(
    labels: &LabelVolume,
    masks: &[ExternalMask],
) -> SeegResult<Vec<RoiLabelSummary>> {
    let shape = labels.shape();
    masks.iter().try_for_each(|m| m.check_shape(shape))?;
    let data = labels.data();

    let mut ans = Vec::with_capacity(masks.len());
    for mask in masks {
        let mut counts = BTreeMap::<i32, usize>::new();
        for (pos, _) in mask.data().indexed_iter().filter(|(_, v)| **v > 0.0) {
            *counts.entry(data[pos]).or_default() += 1;
        }
        let voxels: usize = counts.values().sum();
        if voxels == 0 {
            log::warn!("No overlap found for mask {}", mask.name());
            continue;
        }
        log::debug!("Mask {}: {voxels} voxels, {} labels", mask.name(), counts.len());
        ans.push(RoiLabelSummary {
            roi: mask.name().to_owned(),
            voxels,
            counts: counts.into_iter().collect(),
        });
    }
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::{first_overlap, labels_by_roi, match_masks, place_contacts};
    use crate::data::ReferenceVolume;
    use crate::label::LabelVolume;
    use crate::{ElectrodeId, ElectrodeRecord, ExternalMask, GridFile, SeegError};
    use ndarray::Array3;

    /// 变换结果为 `(20 - x, 20 - y, z)`.
    fn setup() -> (GridFile, ReferenceVolume) {
        let grid = GridFile::new(
            Some((20, 20, 20)),
            Some((1.0, 1.0, 1.0)),
            vec![
                (
                    "A",
                    vec![
                        ElectrodeRecord::new("A", "A1", (10, 10, 10), ""),
                        ElectrodeRecord::new("A", "A2", (10, 10, 13), ""),
                    ],
                ),
                ("B", vec![ElectrodeRecord::new("B", "B1", (4, 4, 4), "")]),
            ],
        );
        (grid, ReferenceVolume::fake((20, 20, 20), (1.0, 1.0, 1.0)))
    }

    fn mask_at(name: &str, voxels: &[(usize, usize, usize)]) -> ExternalMask {
        let mut data = Array3::<f32>::zeros((20, 20, 20));
        for v in voxels {
            data[*v] = 1.0;
        }
        ExternalMask::new(name, data)
    }

    #[test]
    fn test_first_match_wins() {
        let (grid, reference) = setup();
        // (10, 10, 11) 与 (10, 10, 12) 同时落在 A1, A2 的球内 (半径 2).
        let roi = mask_at("hippo", &[(10, 10, 11), (10, 10, 12), (0, 0, 0)]);
        let out = match_masks(&grid, &reference, &[roi], 2).unwrap();

        assert_eq!(out.matches.len(), 1);
        let m = &out.matches[0];
        assert_eq!((m.mask.as_str(), m.contact.as_str()), ("hippo", "A1"));
        assert_eq!(m.coordinate, (10, 10, 10));
        assert_eq!(m.id.get(), 651);
        assert_eq!(m.mask_index, 0);

        // 写入的是掩膜足迹, 而不是球.
        assert_eq!(out.labels.count_labelled(), 3);
        assert_eq!(out.labels.get((0, 0, 0)), Some(651));
        assert_eq!(out.labels.get((10, 10, 10)), Some(0));
        assert_eq!(out.lut.len(), 1);
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn test_unmatched_mask_writes_nothing() {
        let (grid, reference) = setup();
        let far = mask_at("far", &[(0, 19, 0)]);
        let out = match_masks(&grid, &reference, &[far], 2).unwrap();
        assert!(out.matches.is_empty());
        assert_eq!(out.unmatched, vec!["far".to_owned()]);
        assert_eq!(out.labels.count_labelled(), 0);
        assert!(out.lut.is_empty());
    }

    #[test]
    fn test_same_contact_matches_several_masks() {
        let (grid, reference) = setup();
        let masks = [
            mask_at("left", &[(16, 16, 4)]),
            mask_at("nowhere", &[(0, 0, 19)]),
            mask_at("right", &[(16, 17, 5)]),
        ];
        let out = match_masks(&grid, &reference, &masks, 2).unwrap();
        let pairs: Vec<_> = out
            .matches
            .iter()
            .map(|m| (m.mask.as_str(), m.contact.as_str(), m.mask_index))
            .collect();
        assert_eq!(pairs, vec![("left", "B1", 0), ("right", "B1", 2)]);
        assert_eq!(out.unmatched, vec!["nowhere".to_owned()]);
        assert_eq!(out.lut.iter().map(|(id, _)| id.get()).collect::<Vec<_>>(), [661]);
    }

    #[test]
    fn test_non_binary_mask_overlaps_but_paints_only_ones() {
        let (grid, reference) = setup();
        let mut data = Array3::<f32>::zeros((20, 20, 20));
        data[(16, 16, 4)] = 2.0;
        data[(1, 1, 1)] = 1.0;
        let out = match_masks(&grid, &reference, &[ExternalMask::new("atlas", data)], 2).unwrap();
        assert_eq!(out.matches[0].contact, "B1");
        assert_eq!(out.labels.count_labelled(), 1);
        assert_eq!(out.labels.get((1, 1, 1)), Some(661));
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let (grid, reference) = setup();
        let bad = ExternalMask::new("bad", Array3::<f32>::zeros((20, 20, 19)));
        let err = match_masks(&grid, &reference, &[bad], 2).unwrap_err();
        assert!(matches!(err, SeegError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_first_overlap_follows_insertion_order() {
        let (grid, reference) = setup();
        let placements = place_contacts(&grid, &reference, 2).unwrap();
        let names: Vec<_> = placements.iter().map(|p| p.record.contact_name()).collect();
        assert_eq!(names, ["A1", "A2", "B1"]);

        let only_a2 = mask_at("deep", &[(10, 10, 15)]);
        let hit = first_overlap(&placements, &only_a2).unwrap();
        assert_eq!(hit.record.contact_name(), "A2");
    }

    /// `(0..4, 0, 0)` 为 A1, `(0..2, 1, 0)` 为 B12, 其余为背景.
    fn labelled() -> LabelVolume {
        let mut v = LabelVolume::new((20, 20, 20));
        let a1 = ElectrodeId::encode("A", "A1").unwrap();
        let b12 = ElectrodeId::encode("B", "B12").unwrap();
        v.paint_voxels(&[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)], a1);
        v.paint_voxels(&[(0, 1, 0), (1, 1, 0)], b12);
        v
    }

    #[test]
    fn test_labels_by_roi_dominant_label() {
        let roi = mask_at(
            "hippo",
            &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0), (5, 5, 5)],
        );
        let out = labels_by_roi(&labelled(), &[roi]).unwrap();
        assert_eq!(out.len(), 1);
        let s = &out[0];
        assert_eq!(s.roi, "hippo");
        assert_eq!(s.voxels, 5);
        assert_eq!(s.counts, vec![(0, 1), (651, 3), (6612, 1)]);
        assert_eq!(s.dominant(), Some(651));
        assert_eq!(s.labels(), vec![651, 6612]);
        assert_eq!(s.fraction(651), 0.6);
        assert_eq!(s.fraction(7), 0.0);
        assert_eq!(s.breakdown(), "0.200*0+0.600*651+0.200*6612");
    }

    #[test]
    fn test_labels_by_roi_tie_prefers_smaller_label() {
        let roi = mask_at("tie", &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)]);
        let out = labels_by_roi(&labelled(), &[roi]).unwrap();
        assert_eq!(out[0].dominant(), Some(651));
    }

    #[test]
    fn test_labels_by_roi_skips_empty_mask() {
        let empty = mask_at("empty", &[]);
        let mut negative = Array3::<f32>::zeros((20, 20, 20));
        negative[(0, 0, 0)] = -1.0;
        let masks = [
            empty,
            ExternalMask::new("negative", negative),
            mask_at("kept", &[(3, 0, 0)]),
        ];
        let out = labels_by_roi(&labelled(), &masks).unwrap();
        let names: Vec<_> = out.iter().map(|s| s.roi.as_str()).collect();
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn test_labels_by_roi_background_only() {
        let roi = mask_at("white", &[(9, 9, 9), (10, 10, 10)]);
        let out = labels_by_roi(&labelled(), &[roi]).unwrap();
        let s = &out[0];
        assert_eq!(s.dominant(), None);
        assert!(s.labels().is_empty());
        assert_eq!(s.breakdown(), "1.000*0");
    }

    #[test]
    fn test_labels_by_roi_shape_mismatch() {
        let bad = ExternalMask::new("bad", Array3::<f32>::ones((20, 19, 20)));
        let err = labels_by_roi(&labelled(), &[bad]).unwrap_err();
        assert!(matches!(err, SeegError::ShapeMismatch { .. }));
    }
}
