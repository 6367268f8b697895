//! Descriptive statistics shared by every test family.
//!
//! `ddof` (delta degrees of freedom) selects the population (0) or sample
//! (1) estimator.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::descriptive::{mean, std_dev, variance};
//!
//! let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
//! assert_eq!(mean(&data).unwrap(), 5.0);
//! assert_eq!(variance(&data, 0).unwrap(), 4.0);
//! assert_eq!(std_dev(&data, 0).unwrap(), 2.0);
//! ```

use u_numflow::stats;

use crate::error::{ensure_finite, Result, StatError};

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Result<f64> {
    ensure_finite("sample", data)?;
    stats::mean(data).ok_or_else(|| StatError::computation("mean is undefined"))
}

/// Variance with `ddof` delta degrees of freedom: Σ(x − x̄)² / (n − ddof).
///
/// Fails with [`StatError::Input`] if the sample is empty or `n ≤ ddof`.
pub fn variance(data: &[f64], ddof: usize) -> Result<f64> {
    let m = mean(data)?;
    let n = data.len();
    if n <= ddof {
        return Err(StatError::input(format!(
            "variance with ddof={ddof} needs more than {ddof} observations, got {n}"
        )));
    }
    Ok(centered_sum_sq(data, m) / (n - ddof) as f64)
}

/// Standard deviation: √variance(data, ddof).
pub fn std_dev(data: &[f64], ddof: usize) -> Result<f64> {
    variance(data, ddof).map(f64::sqrt)
}

/// Σ(x − center)².
pub(crate) fn sum_sq_dev(data: &[f64], center: f64) -> f64 {
    data.iter().map(|&x| (x - center).powi(2)).sum()
}

/// Σ(x − x̄)² about the sample's own mean `mean`.
///
/// A computed mean of a constant sample can be off by one ulp, so a constant
/// sample short-circuits to exactly zero.
pub(crate) fn centered_sum_sq(data: &[f64], mean: f64) -> f64 {
    match data.first() {
        Some(&first) if data.iter().all(|&x| x == first) => 0.0,
        _ => sum_sq_dev(data, mean),
    }
}
