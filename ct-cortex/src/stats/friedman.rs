//! Friedman 秩检验与 Nemenyi 事后检验.
//!
//! 输入为 `(区组数 n) x (处理数 k)` 的测量表. 随访研究中一行是一名
//! 受试者的某个解剖区, 一列是一次随访.

use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;

use super::dist::{chi2_sf, studentized_range_sf};
use crate::FriedmanError;

/// Friedman 检验结果.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FriedmanResult {
    /// 含结值校正的卡方统计量.
    pub statistic: f64,

    /// 自由度为 `k - 1` 的卡方近似 p 值.
    pub p_value: f64,
}

/// 对一个区组的测量值求秩 (从 1 开始), 结值取平均秩.
///
/// 返回秩向量与该区组的结值校正项 `sum(t^3 - t)`.
fn rank_with_ties(row: &[f64]) -> (Vec<f64>, f64) {
    let n = row.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| OrderedFloat(row[i]));

    let mut ranks = vec![0.0; n];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && row[order[end]] == row[order[start]] {
            end += 1;
        }
        // [start, end) 为一个结组, 秩取算术平均.
        let avg = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    (ranks, tie_term)
}

/// 校验测量表的规模并返回 `(n, k)`.
fn check_table(table: &ArrayView2<'_, f64>) -> Result<(usize, usize), FriedmanError> {
    let (n, k) = table.dim();
    if k < 3 {
        return Err(FriedmanError::TooFewTreatments(k));
    }
    if n < 2 {
        return Err(FriedmanError::TooFewBlocks(n));
    }
    Ok((n, k))
}

/// 逐区组求秩, 返回逐处理的秩和与总结值校正项.
fn column_rank_sums(table: &ArrayView2<'_, f64>, k: usize) -> (Vec<f64>, f64) {
    let mut rank_sums = vec![0.0; k];
    let mut tie_total = 0.0;
    for row in table.rows() {
        let values: Vec<f64> = row.iter().copied().collect();
        let (ranks, tie_term) = rank_with_ties(&values);
        for (sum, r) in rank_sums.iter_mut().zip(&ranks) {
            *sum += r;
        }
        tie_total += tie_term;
    }
    (rank_sums, tie_total)
}

/// Friedman 秩检验.
///
/// `table` 为 `n x k` 测量表, 要求 `k >= 3` 且 `n >= 2`.
/// 统计量带结值校正; 所有区组内测量值全部相同时
/// (校正因子为 0) 统计量取 0, p 值取 1.
pub fn friedman_test(table: ArrayView2<'_, f64>) -> Result<FriedmanResult, FriedmanError> {
    let (n, k) = check_table(&table)?;
    let (rank_sums, tie_total) = column_rank_sums(&table, k);

    let (nf, kf) = (n as f64, k as f64);
    let correction = 1.0 - tie_total / (nf * (kf * kf * kf - kf));
    if correction == 0.0 {
        return Ok(FriedmanResult {
            statistic: 0.0,
            p_value: 1.0,
        });
    }

    let ssbn: f64 = rank_sums.iter().map(|&s| s * s).sum();
    let statistic =
        (12.0 / (nf * kf * (kf + 1.0)) * ssbn - 3.0 * nf * (kf + 1.0)) / correction;
    Ok(FriedmanResult {
        statistic,
        p_value: chi2_sf(statistic, k - 1),
    })
}

/// Nemenyi 事后检验, 返回 `k x k` 的成对 p 值对称矩阵 (对角线为 1).
///
/// 对每对处理 `(i, j)` 计算学生化极差统计量
/// `q = |Rbar_i - Rbar_j| / sqrt(k (k + 1) / (12 n))`,
/// p 值取自由度无穷的学生化极差分布.
pub fn nemenyi_posthoc(table: ArrayView2<'_, f64>) -> Result<Array2<f64>, FriedmanError> {
    let (n, k) = check_table(&table)?;
    let (rank_sums, _) = column_rank_sums(&table, k);

    let (nf, kf) = (n as f64, k as f64);
    let mean_ranks: Vec<f64> = rank_sums.iter().map(|&s| s / nf).collect();
    let scale = (kf * (kf + 1.0) / (12.0 * nf)).sqrt();

    let mut p = Array2::from_elem((k, k), 1.0);
    for i in 0..k {
        for j in (i + 1)..k {
            let q = (mean_ranks[i] - mean_ranks[j]).abs() / scale;
            let pv = studentized_range_sf(q, k);
            p[(i, j)] = pv;
            p[(j, i)] = pv;
        }
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// 三名受试者, 三次随访, 每行严格递增.
    fn strictly_ordered_table() -> Array2<f64> {
        array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 6.0, 9.0]]
    }

    #[test]
    fn test_rank_with_ties_plain() {
        let (ranks, tie) = rank_with_ties(&[30.0, 10.0, 20.0]);
        assert_eq!(ranks, vec![3.0, 1.0, 2.0]);
        assert_eq!(tie, 0.0);
    }

    #[test]
    fn test_rank_with_ties_averaged() {
        // 两个结组: {10, 10} 与 {20, 20, 20}.
        let (ranks, tie) = rank_with_ties(&[10.0, 20.0, 10.0, 20.0, 20.0]);
        assert_eq!(ranks, vec![1.5, 4.0, 1.5, 4.0, 4.0]);
        // (2^3 - 2) + (3^3 - 3) = 30.
        assert_eq!(tie, 30.0);
    }

    #[test]
    fn test_friedman_rejects_small_tables() {
        let two_treatments = array![[1.0, 2.0], [2.0, 1.0]];
        assert_eq!(
            friedman_test(two_treatments.view()).unwrap_err(),
            FriedmanError::TooFewTreatments(2)
        );

        let one_block = array![[1.0, 2.0, 3.0]];
        assert_eq!(
            friedman_test(one_block.view()).unwrap_err(),
            FriedmanError::TooFewBlocks(1)
        );
    }

    #[test]
    fn test_friedman_fully_ordered() {
        // 每行秩恒为 [1, 2, 3]: 统计量 = 2 n (k - 1) = 6,
        // p = exp(-statistic / 2) = exp(-3).
        let r = friedman_test(strictly_ordered_table().view()).unwrap();
        assert!((r.statistic - 6.0).abs() < 1e-12);
        assert!((r.p_value - (-3.0_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_friedman_all_tied_rows() {
        let table = array![[5.0, 5.0, 5.0], [7.0, 7.0, 7.0]];
        let r = friedman_test(table.view()).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_friedman_no_effect_has_large_p() {
        // 列间无系统性差异.
        let table = array![
            [1.0, 3.0, 2.0],
            [3.0, 1.0, 2.0],
            [2.0, 3.0, 1.0],
            [1.0, 2.0, 3.0]
        ];
        let r = friedman_test(table.view()).unwrap();
        assert!(r.p_value > 0.5);
    }

    #[test]
    fn test_nemenyi_structure() {
        let p = nemenyi_posthoc(strictly_ordered_table().view()).unwrap();
        assert_eq!(p.dim(), (3, 3));
        for i in 0..3 {
            assert_eq!(p[(i, i)], 1.0);
            for j in 0..3 {
                assert_eq!(p[(i, j)], p[(j, i)]);
                assert!(p[(i, j)] > 0.0 && p[(i, j)] <= 1.0);
            }
        }
        // 平均秩 [1, 2, 3]: 首末列差异最大.
        assert!(p[(0, 2)] < p[(0, 1)]);
        assert!(p[(0, 2)] < 0.05);
        assert!(p[(0, 1)] > 0.1);
    }

    #[test]
    fn test_nemenyi_rejects_small_tables() {
        let one_block = array![[1.0, 2.0, 3.0]];
        assert!(nemenyi_posthoc(one_block.view()).is_err());
    }
}
