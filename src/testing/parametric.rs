//! t-tests and z-tests for means.

use tracing::debug;

use super::TestResult;
use crate::config::TestConfig;
use crate::descriptive::{mean, variance};
use crate::distribution::Distributions;
use crate::error::{
    ensure_finite, ensure_finite_result, ensure_len, ensure_paired, Result, StatError,
};

/// One-sample t-test: H₀: μ = μ₀.
///
/// # Algorithm
///
/// t = (x̄ − μ₀) / (s / √n), df = n − 1, s the sample standard deviation.
///
/// # Errors
///
/// - [`StatError::Input`] if fewer than 2 observations, non-finite values,
///   or an invalid α.
/// - [`StatError::Computation`] if the sample has zero variance.
///
/// # Examples
///
/// ```
/// use u_hypothesis::config::TestConfig;
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::testing::one_sample_t_test;
///
/// let data = [5.0, 7.0, 5.0, 3.0, 5.0, 3.0, 3.0, 9.0];
/// let r = one_sample_t_test(&Numflow, &data, 5.0, &TestConfig::default()).unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert_eq!(r.degrees_of_freedom, Some(7.0));
/// assert!((r.p_value - 1.0).abs() < 1e-6);
/// ```
pub fn one_sample_t_test<D: Distributions>(
    dist: &D,
    sample: &[f64],
    mu0: f64,
    config: &TestConfig,
) -> Result<TestResult> {
    config.validate()?;
    ensure_len("sample", sample, 2)?;
    if !mu0.is_finite() {
        return Err(StatError::input("population mean must be finite"));
    }

    let n = sample.len() as f64;
    let sample_mean = mean(sample)?;
    let sd = variance(sample, 1)?.sqrt();
    if sd <= 0.0 {
        return Err(StatError::computation(
            "sample has zero variance; t statistic is undefined",
        ));
    }

    let se = sd / n.sqrt();
    let t = (sample_mean - mu0) / se;
    let df = n - 1.0;
    ensure_finite_result("t statistic", &[t])?;

    let p_value = config
        .alternative
        .p_value(t, |x| dist.student_t_cdf(x, df));
    let decision = config.decide(p_value);

    debug!(t, df, p_value, "one-sample t-test");
    Ok(TestResult {
        statistic: t,
        p_value,
        degrees_of_freedom: Some(df),
        alternative: config.alternative,
        decision,
        significant: decision.is_reject(),
        sample_mean,
        second_mean: None,
        standard_error: se,
    })
}

/// Paired t-test: H₀: mean difference = 0.
///
/// Reduces to a one-sample t-test on dᵢ = aᵢ − bᵢ against 0.
///
/// # Errors
///
/// [`StatError::Input`] if the samples differ in length or hold fewer than
/// 2 pairs; otherwise as [`one_sample_t_test`].
pub fn paired_t_test<D: Distributions>(
    dist: &D,
    a: &[f64],
    b: &[f64],
    config: &TestConfig,
) -> Result<TestResult> {
    ensure_paired(a, b)?;
    ensure_len("sample 1", a, 2)?;
    ensure_finite("sample 2", b)?;

    let diffs: Vec<f64> = a.iter().zip(b).map(|(&x, &y)| x - y).collect();
    one_sample_t_test(dist, &diffs, 0.0, config)
}

/// Independent two-sample t-test with pooled variance: H₀: μ₁ = μ₂.
///
/// # Algorithm
///
/// s²ₚ = ((n₁−1)s₁² + (n₂−1)s₂²) / (n₁+n₂−2)
/// t = (x̄₁ − x̄₂) / (sₚ·√(1/n₁ + 1/n₂)), df = n₁+n₂−2.
///
/// # Errors
///
/// - [`StatError::Input`] if either sample has fewer than 2 observations.
/// - [`StatError::Computation`] if the pooled variance is zero.
///
/// # Examples
///
/// ```
/// use u_hypothesis::config::TestConfig;
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::testing::independent_t_test;
///
/// let a = [5.1, 4.9, 5.2, 5.0, 4.8];
/// let b = [7.1, 6.9, 7.2, 7.0, 6.8];
/// let r = independent_t_test(&Numflow, &a, &b, &TestConfig::default()).unwrap();
/// assert_eq!(r.degrees_of_freedom, Some(8.0));
/// assert!(r.p_value < 0.01);
/// ```
pub fn independent_t_test<D: Distributions>(
    dist: &D,
    a: &[f64],
    b: &[f64],
    config: &TestConfig,
) -> Result<TestResult> {
    config.validate()?;
    ensure_len("sample 1", a, 2)?;
    ensure_len("sample 2", b, 2)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = mean(a)?;
    let mean2 = mean(b)?;
    let var1 = variance(a, 1)?;
    let var2 = variance(b, 1)?;

    let df = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
    if pooled <= 0.0 {
        return Err(StatError::computation(
            "pooled variance is zero; t statistic is undefined",
        ));
    }

    let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let t = (mean1 - mean2) / se;
    ensure_finite_result("t statistic", &[t])?;

    let p_value = config
        .alternative
        .p_value(t, |x| dist.student_t_cdf(x, df));
    let decision = config.decide(p_value);

    debug!(t, df, p_value, "independent t-test");
    Ok(TestResult {
        statistic: t,
        p_value,
        degrees_of_freedom: Some(df),
        alternative: config.alternative,
        decision,
        significant: decision.is_reject(),
        sample_mean: mean1,
        second_mean: Some(mean2),
        standard_error: se,
    })
}

/// One-sample z-test with known population standard deviation σ.
///
/// z = (x̄ − μ₀) / (σ / √n). No degrees of freedom.
///
/// # Errors
///
/// [`StatError::Input`] if the sample is empty, holds non-finite values,
/// or σ is not a positive finite number.
pub fn one_sample_z_test<D: Distributions>(
    dist: &D,
    sample: &[f64],
    mu0: f64,
    sigma: f64,
    config: &TestConfig,
) -> Result<TestResult> {
    config.validate()?;
    ensure_finite("sample", sample)?;
    ensure_sigma("population standard deviation", sigma)?;
    if !mu0.is_finite() {
        return Err(StatError::input("population mean must be finite"));
    }

    let n = sample.len() as f64;
    let sample_mean = mean(sample)?;
    let se = sigma / n.sqrt();
    let z = (sample_mean - mu0) / se;
    ensure_finite_result("z statistic", &[z])?;

    let p_value = config.alternative.p_value(z, |x| dist.std_normal_cdf(x));
    let decision = config.decide(p_value);

    debug!(z, p_value, "one-sample z-test");
    Ok(TestResult {
        statistic: z,
        p_value,
        degrees_of_freedom: None,
        alternative: config.alternative,
        decision,
        significant: decision.is_reject(),
        sample_mean,
        second_mean: None,
        standard_error: se,
    })
}

/// Two-sample z-test with known σ₁, σ₂: H₀: μ₁ − μ₂ = `hypothesized_diff`.
///
/// z = (x̄₁ − x̄₂ − (μ₁−μ₂)) / √(σ₁²/n₁ + σ₂²/n₂).
///
/// # Examples
///
/// ```
/// use u_hypothesis::config::{Alternative, TestConfig};
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::testing::two_sample_z_test;
///
/// let a = [10.0, 11.0, 12.0, 11.0];
/// let b = [10.0, 10.5, 11.0, 10.5];
/// let cfg = TestConfig::new(0.05, Alternative::Greater).unwrap();
/// let r = two_sample_z_test(&Numflow, &a, &b, 1.0, 1.0, 0.0, &cfg).unwrap();
/// assert!(r.statistic > 0.0);
/// assert!(r.degrees_of_freedom.is_none());
/// ```
pub fn two_sample_z_test<D: Distributions>(
    dist: &D,
    a: &[f64],
    b: &[f64],
    sigma1: f64,
    sigma2: f64,
    hypothesized_diff: f64,
    config: &TestConfig,
) -> Result<TestResult> {
    config.validate()?;
    ensure_finite("sample 1", a)?;
    ensure_finite("sample 2", b)?;
    ensure_sigma("sigma 1", sigma1)?;
    ensure_sigma("sigma 2", sigma2)?;
    if !hypothesized_diff.is_finite() {
        return Err(StatError::input("hypothesized difference must be finite"));
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = mean(a)?;
    let mean2 = mean(b)?;
    let se = (sigma1 * sigma1 / n1 + sigma2 * sigma2 / n2).sqrt();
    let z = (mean1 - mean2 - hypothesized_diff) / se;
    ensure_finite_result("z statistic", &[z])?;

    let p_value = config.alternative.p_value(z, |x| dist.std_normal_cdf(x));
    let decision = config.decide(p_value);

    debug!(z, p_value, "two-sample z-test");
    Ok(TestResult {
        statistic: z,
        p_value,
        degrees_of_freedom: None,
        alternative: config.alternative,
        decision,
        significant: decision.is_reject(),
        sample_mean: mean1,
        second_mean: Some(mean2),
        standard_error: se,
    })
}

fn ensure_sigma(name: &str, sigma: f64) -> Result<()> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(StatError::input(format!(
            "{name} must be positive and finite, got {sigma}"
        )))
    }
}
