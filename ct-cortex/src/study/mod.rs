//! 随访研究的受试者/时点/解剖区枚举, 文件命名约定与目录定位.
//!
//! 研究目录下每个受试者一个子目录, 文件名形如
//! `{受试者}_{时点}_{解剖区}_{侧}_common.nii.gz`.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod loader;

pub use loader::{pair_loader, volume_loader, PairLoader, VolumeLoader};

/// 研究目录环境变量. 非空时覆盖主目录默认值.
pub const STUDY_DIR_ENV: &str = "CT_STUDY_DIR";

/// 随访时点, 按时间顺序排列. `VS` 为手术后即刻的附加扫描.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visit {
    /// 基线 (术前).
    V1,

    /// 术后即刻.
    Vs,

    /// 第一次随访.
    V2,

    /// 第二次随访.
    V3,

    /// 第三次随访.
    V4,
}

impl Visit {
    /// 全部时点, 按时间顺序.
    pub const ALL: [Visit; 5] = [Visit::V1, Visit::Vs, Visit::V2, Visit::V3, Visit::V4];

    /// 文件名中使用的时点标识.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Visit::V1 => "V1",
            Visit::Vs => "VS",
            Visit::V2 => "V2",
            Visit::V3 => "V3",
            Visit::V4 => "V4",
        }
    }
}

impl FromStr for Visit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Visit::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown visit `{s}` (expected one of V1, VS, V2, V3, V4)"))
    }
}

/// 膝关节周围的解剖区.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// 股骨远端.
    Femur,

    /// 胫骨近端.
    Tibia,

    /// 髌骨.
    Patella,
}

impl Region {
    /// 全部解剖区.
    pub const ALL: [Region; 3] = [Region::Femur, Region::Tibia, Region::Patella];

    /// 文件名中使用的解剖区标识.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Femur => "Femur",
            Region::Tibia => "Tibia",
            Region::Patella => "Patella",
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown region `{s}` (expected one of Femur, Tibia, Patella)")
            })
    }
}

/// 手术侧别.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// 左膝.
    Left,

    /// 右膝.
    Right,
}

impl Side {
    /// 全部侧别.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    /// 文件名中使用的侧别标识.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown side `{s}` (expected Left or Right)"))
    }
}

/// 随访扫描的唯一键: 受试者 + 时点 + 解剖区 + 侧别.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScanKey {
    /// 受试者编号, 如 "SA01".
    pub participant: String,

    /// 随访时点.
    pub visit: Visit,

    /// 解剖区.
    pub region: Region,

    /// 侧别.
    pub side: Side,
}

impl ScanKey {
    /// 创建扫描键.
    pub fn new(participant: impl Into<String>, visit: Visit, region: Region, side: Side) -> Self {
        Self {
            participant: participant.into(),
            visit,
            region,
            side,
        }
    }

    /// 键的文件名前缀: `{受试者}_{时点}_{解剖区}_{侧}`.
    pub fn stem(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.participant,
            self.visit.as_str(),
            self.region.as_str(),
            self.side.as_str()
        )
    }

    /// 共同区扫描文件名: `{stem}_common.nii.gz`.
    #[inline]
    pub fn common_file(&self) -> String {
        format!("{}_common.nii.gz", self.stem())
    }

    /// 共同区掩膜文件名: `{stem}_common_mask.nii.gz`.
    #[inline]
    pub fn common_mask_file(&self) -> String {
        format!("{}_common_mask.nii.gz", self.stem())
    }

    /// 相对基线的差值扫描文件名: `{stem}_minus_{基线时点}_diff.nii.gz`.
    #[inline]
    pub fn difference_file(&self, baseline: Visit) -> String {
        format!("{}_minus_{}_diff.nii.gz", self.stem(), baseline.as_str())
    }
}

/// 获取 `{用户主目录}/study` 目录.
pub fn home_study_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("study");
    Some(ans)
}

/// 获取研究根目录.
///
/// 1. 若环境变量 `$CT_STUDY_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `{用户主目录}/study`.
pub fn study_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(STUDY_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_study_dir(),
    }
}

/// 获取研究根目录下某受试者的子目录: `{root}/{受试者}`.
pub fn participant_dir<P: AsRef<Path>>(root: P, participant: &str) -> PathBuf {
    let mut ans = root.as_ref().to_owned();
    ans.push(participant);
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_round_trip() {
        for v in Visit::ALL {
            assert_eq!(v.as_str().parse::<Visit>().unwrap(), v);
        }
        assert_eq!("vs".parse::<Visit>().unwrap(), Visit::Vs);
        assert!("V5".parse::<Visit>().is_err());
    }

    #[test]
    fn test_visit_ordering_is_chronological() {
        assert!(Visit::V1 < Visit::Vs);
        assert!(Visit::Vs < Visit::V2);
        assert!(Visit::V3 < Visit::V4);
    }

    #[test]
    fn test_region_and_side_parse() {
        assert_eq!("femur".parse::<Region>().unwrap(), Region::Femur);
        assert_eq!("Patella".parse::<Region>().unwrap(), Region::Patella);
        assert!("Skull".parse::<Region>().is_err());

        assert_eq!("LEFT".parse::<Side>().unwrap(), Side::Left);
        assert!("Both".parse::<Side>().is_err());
    }

    #[test]
    fn test_scan_key_file_names() {
        let key = ScanKey::new("SA03", Visit::V2, Region::Tibia, Side::Left);
        assert_eq!(key.stem(), "SA03_V2_Tibia_Left");
        assert_eq!(key.common_file(), "SA03_V2_Tibia_Left_common.nii.gz");
        assert_eq!(
            key.common_mask_file(),
            "SA03_V2_Tibia_Left_common_mask.nii.gz"
        );
        assert_eq!(
            key.difference_file(Visit::V1),
            "SA03_V2_Tibia_Left_minus_V1_diff.nii.gz"
        );
    }

    #[test]
    fn test_participant_dir() {
        let dir = participant_dir("/data/study", "SA01");
        assert_eq!(dir, PathBuf::from("/data/study/SA01"));
    }
}
