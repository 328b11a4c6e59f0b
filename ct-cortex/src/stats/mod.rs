//! 区域描述统计与重复测量非参数检验.

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::CtVolume;

mod dist;
pub mod friedman;

pub use friedman::{friedman_test, nemenyi_posthoc, FriedmanResult};

/// 一个感兴趣区 (前景体素集合) 的描述统计.
///
/// 与随访研究的 CSV 汇总表逐列对应.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionSummary {
    /// 均值.
    pub mean: f64,

    /// 总体标准差 (ddof = 0).
    pub std_dev: f64,

    /// 最大值.
    pub max: f64,

    /// 最小值.
    pub min: f64,

    /// 中位数.
    pub median: f64,

    /// 25 分位数.
    pub p25: f64,

    /// 75 分位数.
    pub p75: f64,

    /// 参与统计的体素个数.
    pub voxel_count: usize,
}

impl RegionSummary {
    /// 对 `values` 计算描述统计. `values` 为空时返回 `None`.
    pub fn from_values(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sorted: Vec<f64> = values
            .iter()
            .map(|&v| OrderedFloat(v as f64))
            .sorted()
            .map(|v| v.0)
            .collect();
        let n = sorted.len();

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

        Some(Self {
            mean,
            std_dev: var.sqrt(),
            max: sorted[n - 1],
            min: sorted[0],
            median: percentile_of_sorted(&sorted, 50.0),
            p25: percentile_of_sorted(&sorted, 25.0),
            p75: percentile_of_sorted(&sorted, 75.0),
            voxel_count: n,
        })
    }

    /// 四分位距.
    #[inline]
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }

    /// 按单体素体积 `voxel_cm3` (立方厘米) 换算区域实际体积.
    #[inline]
    pub fn physical_volume_cm3(&self, voxel_cm3: f64) -> f64 {
        self.voxel_count as f64 * voxel_cm3
    }
}

/// 升序序列的线性插值分位数. `p` 取 \[0, 100\].
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

impl CtVolume {
    /// 计算扫描所有非零体素的描述统计.
    /// 不存在非零体素时返回 `None`.
    ///
    /// 掩膜应用后的扫描以零表示感兴趣区外,
    /// 因此该函数即为感兴趣区统计.
    #[inline]
    pub fn foreground_summary(&self) -> Option<RegionSummary> {
        RegionSummary::from_values(&self.foreground_values())
    }
}
