//! 检验所需的分布函数.
//!
//! 包含误差函数, 正则化不完全 Gamma 函数 (卡方检验),
//! 以及学生化极差分布 (Nemenyi 事后检验). 均为标量实现.

/// 误差函数的有理逼近 (Abramowitz & Stegun 7.1.26), 绝对误差 < 1.5e-7.
pub(crate) fn erf(x: f64) -> f64 {
    const A: [f64; 5] = [
        0.254829592,
        -0.284496736,
        1.421413741,
        -1.453152027,
        1.061405429,
    ];
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = t * (A[0] + t * (A[1] + t * (A[2] + t * (A[3] + t * A[4]))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// 标准正态分布函数.
#[inline]
pub(crate) fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// 标准正态密度函数.
#[inline]
fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// ln Gamma(x), Lanczos 逼近. 要求 `x > 0`.
fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut y = x;
    let mut ser = 1.000000000190015;
    for &c in COF.iter() {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.5066282746310005 * ser / x).ln()
}

/// 正则化下不完全 Gamma 函数 P(a, x) 的级数展开. 适用于 `x < a + 1`.
fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..200 {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * 1e-15 {
            break;
        }
    }
    sum * (a * x.ln() - x - ln_gamma(a)).exp()
}

/// 正则化上不完全 Gamma 函数 Q(a, x) 的连分式展开. 适用于 `x >= a + 1`.
fn gamma_q_cont_frac(a: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;

    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..200 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < 1e-15 {
            break;
        }
    }
    (a * x.ln() - x - ln_gamma(a)).exp() * h
}

/// 自由度为 `df` 的卡方分布生存函数 P(X > x).
pub(crate) fn chi2_sf(x: f64, df: usize) -> f64 {
    debug_assert!(df >= 1);
    if x <= 0.0 {
        return 1.0;
    }
    let a = df as f64 / 2.0;
    let half = x / 2.0;
    let sf = if half < a + 1.0 {
        1.0 - gamma_p_series(a, half)
    } else {
        gamma_q_cont_frac(a, half)
    };
    sf.clamp(0.0, 1.0)
}

/// `k` 个独立标准正态变量的极差超过 `q` 的概率
/// (自由度无穷的学生化极差分布生存函数).
///
/// P(R <= q) = k * Integral phi(x) * (Phi(x) - Phi(x - q))^(k-1) dx,
/// 以 x 为最大值所在位置, 在 \[-8, 8\] 上用复合 Simpson 求积.
pub(crate) fn studentized_range_sf(q: f64, k: usize) -> f64 {
    debug_assert!(k >= 2);
    if q <= 0.0 {
        return 1.0;
    }

    const LO: f64 = -8.0;
    const HI: f64 = 8.0;
    const STEPS: usize = 4000; // 偶数

    let h = (HI - LO) / STEPS as f64;
    let integrand = |x: f64| normal_pdf(x) * (normal_cdf(x) - normal_cdf(x - q)).powi(k as i32 - 1);

    let mut acc = integrand(LO) + integrand(HI);
    for i in 1..STEPS {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        acc += weight * integrand(LO + i as f64 * h);
    }
    let cdf = k as f64 * acc * h / 3.0;
    (1.0 - cdf).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erf_basics() {
        assert_eq!(erf(0.0), 0.0);
        assert!((erf(1.0) - 0.8427007929).abs() < 2e-7);
        assert!((erf(-1.0) + erf(1.0)).abs() < 1e-15);
        assert!((erf(5.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_chi2_sf_df2_closed_form() {
        // 自由度 2 时 sf(x) = exp(-x / 2).
        for &x in &[0.5, 1.0, 3.0, 6.0, 12.0] {
            assert!((chi2_sf(x, 2) - (-x / 2.0).exp()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_chi2_sf_df1_matches_erf() {
        // 自由度 1 时 sf(x) = 1 - erf(sqrt(x / 2)).
        for &x in &[0.1f64, 1.0, 3.84, 9.0] {
            let expected = 1.0 - erf((x / 2.0).sqrt());
            assert!((chi2_sf(x, 1) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_chi2_sf_monotone_and_bounded() {
        let mut prev = 1.0;
        for i in 1..40 {
            let cur = chi2_sf(i as f64 * 0.5, 4);
            assert!(cur < prev);
            assert!((0.0..=1.0).contains(&cur));
            prev = cur;
        }
        assert_eq!(chi2_sf(0.0, 4), 1.0);
        assert_eq!(chi2_sf(-1.0, 4), 1.0);
    }

    #[test]
    fn test_range_sf_k2_closed_form() {
        // k = 2: 极差 |X1 - X2| 服从标准差 sqrt(2) 的半正态分布,
        // sf(q) = 2 * (1 - Phi(q / sqrt(2))).
        for &q in &[0.5, 1.0, 2.0, 3.5] {
            let expected = 2.0 * (1.0 - normal_cdf(q / std::f64::consts::SQRT_2));
            assert!((studentized_range_sf(q, 2) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_range_sf_known_critical_value() {
        // 自由度无穷, k = 3 时 0.05 分位数约为 3.314.
        let p = studentized_range_sf(3.314, 3);
        assert!((p - 0.05).abs() < 2e-3);
    }

    #[test]
    fn test_range_sf_edge_cases() {
        assert_eq!(studentized_range_sf(0.0, 3), 1.0);
        assert_eq!(studentized_range_sf(-1.0, 3), 1.0);
        assert!(studentized_range_sf(20.0, 3) < 1e-6);
    }
}
