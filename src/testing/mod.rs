//! Hypothesis testing.
//!
//! Parametric mean-comparison tests (t and z), rank-based and sign-based
//! nonparametric tests, and the Kolmogorov-Smirnov normality test.
//!
//! Every test takes its reference distributions through
//! [`Distributions`](crate::distribution::Distributions) and returns an
//! immutable result record carrying the statistic, the p-value, and the
//! decision at the configured α.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::config::TestConfig;
//! use u_hypothesis::distribution::Numflow;
//! use u_hypothesis::testing::one_sample_t_test;
//!
//! let data = [5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9];
//! let r = one_sample_t_test(&Numflow, &data, 5.0, &TestConfig::default()).unwrap();
//! assert!(r.p_value > 0.05); // cannot reject H₀: μ = 5.0
//! assert!(!r.significant);
//! ```
//!
//! # References
//!
//! - Student (1908). "The probable error of a mean". Biometrika, 6(1), 1–25.
//! - Wilcoxon (1945). "Individual comparisons by ranking methods".
//!   Biometrics Bulletin, 1(6), 80–83.
//! - Mann & Whitney (1947). Annals of Mathematical Statistics, 18(1), 50–60.
//! - Marsaglia, Tsang & Wang (2003). "Evaluating Kolmogorov's distribution".
//!   Journal of Statistical Software, 8(18).

mod nonparametric;
mod normality;
mod parametric;

pub use nonparametric::{
    mann_whitney_u_test, sign_test, wilcoxon_signed_rank_test, MannWhitneyResult,
    SignTestResult, WilcoxonResult, WILCOXON_EXACT_MAX_N,
};
pub use normality::{ks_normality_test, KsNormalityResult, KS_CRITICAL_COEFFICIENT};
pub use parametric::{
    independent_t_test, one_sample_t_test, one_sample_z_test, paired_t_test, two_sample_z_test,
};

use serde::Serialize;

use crate::config::{Alternative, Decision};

/// Result of a t- or z-test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Test statistic (t or z).
    pub statistic: f64,
    /// p-value under the selected alternative.
    pub p_value: f64,
    /// Degrees of freedom; `None` for z-tests.
    pub degrees_of_freedom: Option<f64>,
    /// Alternative hypothesis the p-value refers to.
    pub alternative: Alternative,
    /// Decision at the configured α.
    pub decision: Decision,
    /// `true` iff the null hypothesis is rejected.
    pub significant: bool,
    /// Sample mean (of the differences for the paired test, of sample 1
    /// for two-sample tests).
    pub sample_mean: f64,
    /// Second sample mean for two-sample tests.
    pub second_mean: Option<f64>,
    /// Standard error used as the statistic's denominator.
    pub standard_error: f64,
}
