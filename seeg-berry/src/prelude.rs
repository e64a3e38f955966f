//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Coord3d, Idx3d, Spacing3d};

pub use crate::data::{ExternalMask, NiftiWrite, ReferenceVolume, VolumeGeometry};
pub use crate::gridview::{self, ElectrodeRecord, GridFile, GridParse, ParseWarning};
pub use crate::ident::ElectrodeId;
pub use crate::label::{LabelBuild, LabelVolume, LookupTable};
pub use crate::matcher::{MaskMatch, MatchOutcome, RoiLabelSummary};
pub use crate::morph_3d::SphereMask;
pub use crate::pipeline::{create_rois, match_rois};
pub use crate::sink::{MemorySink, NiftiDirSink, OutputSink};
pub use crate::transform::GridMapping;

pub use crate::consts::{BACKGROUND, DEFAULT_RADIUS};
pub use crate::{SeegError, SeegResult};
