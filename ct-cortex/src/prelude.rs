//! 🦴欢迎光临🦴
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::bounds::{crop_pair, MaskBounds};
pub use crate::data::slice::AxialSlice;
pub use crate::data::window::CtWindow;
pub use crate::data::{CtMask, CtVolume, NiftiHeaderAttr, VolumePair};

pub use crate::error::{CropError, FriedmanError, StudyError};

pub use crate::consts::mask::{MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::{DEFAULT_CROP_BUFFER, SCREW_HU_CUTOFF};

pub use crate::stats::{friedman_test, nemenyi_posthoc, FriedmanResult, RegionSummary};

pub use crate::study::{self, Region, ScanKey, Side, Visit};
pub use crate::study::{study_dir_from_env_or_home, participant_dir};
