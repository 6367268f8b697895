//! Kolmogorov-Smirnov test for normality.

use serde::Serialize;
use tracing::debug;

use crate::config::validate_alpha;
use crate::descriptive::{mean, std_dev};
use crate::distribution::Distributions;
use crate::error::{ensure_len, Result, StatError};

/// Large-sample Kolmogorov coefficient for α = 0.05: D_crit ≈ 1.36 / √n.
pub const KS_CRITICAL_COEFFICIENT: f64 = 1.36;

/// Result of the Kolmogorov-Smirnov normality test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KsNormalityResult {
    /// D = max(D⁺, D⁻).
    pub statistic: f64,
    /// max(i/n − F(x₍ᵢ₎)).
    pub d_plus: f64,
    /// max(F(x₍ᵢ₎) − (i−1)/n).
    pub d_minus: f64,
    /// 1.36 / √n.
    pub critical_value: f64,
    /// `true` iff D ≤ critical value.
    pub is_normal: bool,
    /// Asymptotic Kolmogorov p-value.
    pub p_value: f64,
    /// α reported back to the caller.
    pub significance_level: f64,
    /// Mean of the fitted normal.
    pub fitted_mean: f64,
    /// Standard deviation of the fitted normal (ddof = 1).
    pub fitted_std_dev: f64,
}

/// Kolmogorov-Smirnov one-sample test against a normal distribution fitted
/// to the sample itself.
///
/// # Algorithm
///
/// 1. Estimate x̄ and s (ddof = 1) from the data, sort it
/// 2. D⁺ = maxᵢ(i/n − F(x₍ᵢ₎)), D⁻ = maxᵢ(F(x₍ᵢ₎) − (i−1)/n), D = max(D⁺, D⁻)
/// 3. Critical value 1.36/√n
/// 4. λ = (√n + 0.12 + 0.11/√n)·D,
///    p = 2·Σⱼ₌₁¹⁰⁰ (−1)ʲ⁻¹ exp(−2j²λ²), clamped to [0, 1]
///
/// # Errors
///
/// - [`StatError::Input`] if fewer than 2 observations, non-finite values,
///   or α outside (0, 1).
/// - [`StatError::Computation`] if the sample has zero variance.
///
/// # Examples
///
/// ```
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::testing::ks_normality_test;
///
/// let data = [-1.2, -0.8, -0.3, 0.1, 0.5, 0.7, 1.1, 1.4];
/// let r = ks_normality_test(&Numflow, &data, 0.05).unwrap();
/// assert!(r.is_normal);
/// assert!(r.p_value > 0.05);
/// ```
pub fn ks_normality_test<D: Distributions>(
    dist: &D,
    data: &[f64],
    alpha: f64,
) -> Result<KsNormalityResult> {
    validate_alpha(alpha)?;
    ensure_len("sample", data, 2)?;

    let fitted_mean = mean(data)?;
    let fitted_std_dev = std_dev(data, 1)?;
    if fitted_std_dev <= 0.0 {
        return Err(StatError::computation(
            "sample has zero variance; normal fit is undefined",
        ));
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let nf = n as f64;
    let mut d_plus = 0.0_f64;
    let mut d_minus = 0.0_f64;
    for (i, &x) in sorted.iter().enumerate() {
        let cdf = dist.normal_cdf(x, fitted_mean, fitted_std_dev);
        d_plus = d_plus.max((i + 1) as f64 / nf - cdf);
        d_minus = d_minus.max(cdf - i as f64 / nf);
    }
    let statistic = d_plus.max(d_minus);
    let critical_value = KS_CRITICAL_COEFFICIENT / nf.sqrt();
    let p_value = kolmogorov_p_value(statistic, n);

    debug!(statistic, critical_value, p_value, n, "ks normality test");
    Ok(KsNormalityResult {
        statistic,
        d_plus,
        d_minus,
        critical_value,
        is_normal: statistic <= critical_value,
        p_value,
        significance_level: alpha,
        fitted_mean,
        fitted_std_dev,
    })
}

// Asymptotic Kolmogorov tail with the Stephens small-sample adjustment.
// Below λ = 0.2 the tail equals 1 to double precision but the truncated
// alternating series does not converge.
fn kolmogorov_p_value(d: f64, n: usize) -> f64 {
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    if lambda < 0.2 {
        return 1.0;
    }
    let sum: f64 = (1..=100)
        .map(|j| {
            let jf = j as f64;
            let sign = if j % 2 == 1 { 1.0 } else { -1.0 };
            sign * (-2.0 * jf * jf * lambda * lambda).exp()
        })
        .sum();
    (2.0 * sum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Numflow;

    #[test]
    fn symmetric_even_sample_passes() {
        let data: Vec<f64> = (0..200).map(|i| i as f64 / 10.0).collect();
        let r = ks_normality_test(&Numflow, &data, 0.05).expect("should compute");
        assert!(
            r.statistic < r.critical_value,
            "D = {}, crit = {}",
            r.statistic,
            r.critical_value
        );
        assert!(r.is_normal);
        assert!((r.critical_value - 1.36 / 200f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn skewed_sample_fails() {
        let data: Vec<f64> = (1..=200).map(|i| (i as f64 / 20.0).exp()).collect();
        let r = ks_normality_test(&Numflow, &data, 0.05).expect("should compute");
        assert!(!r.is_normal, "D = {}", r.statistic);
        assert!(r.p_value < 0.05, "p = {}", r.p_value);
    }

    #[test]
    fn statistic_is_max_of_sides() {
        let data = [0.3, 1.7, 2.2, 2.9, 4.1, 6.5];
        let r = ks_normality_test(&Numflow, &data, 0.05).expect("should compute");
        assert_eq!(r.statistic, r.d_plus.max(r.d_minus));
        assert!(r.statistic > 0.0 && r.statistic < 1.0);
        assert_eq!(r.significance_level, 0.05);
    }

    #[test]
    fn p_value_limits() {
        assert_eq!(kolmogorov_p_value(0.0, 50), 1.0);
        assert!(kolmogorov_p_value(1.0, 50) < 1e-12);
        let mid = kolmogorov_p_value(0.15, 50);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn edge_cases() {
        assert!(matches!(
            ks_normality_test(&Numflow, &[1.0], 0.05),
            Err(StatError::Input(_))
        ));
        assert!(matches!(
            ks_normality_test(&Numflow, &[2.0; 10], 0.05),
            Err(StatError::Computation(_))
        ));
        assert!(matches!(
            ks_normality_test(&Numflow, &[923.966618414014; 9], 0.05),
            Err(StatError::Computation(_))
        ));
    }
}
