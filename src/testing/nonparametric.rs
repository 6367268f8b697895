//! Sign test, Wilcoxon signed-rank test, and Mann-Whitney U test.
//!
//! All p-values are two-tailed.

use serde::Serialize;
use tracing::debug;
use u_numflow::special;

use crate::config::{validate_alpha, Decision};
use crate::distribution::Distributions;
use crate::error::{ensure_finite, ensure_paired, Result};
use crate::rank::mid_ranks;

/// Largest effective sample size for which the Wilcoxon test uses the exact
/// null distribution instead of the normal approximation.
pub const WILCOXON_EXACT_MAX_N: usize = 20;

// ---------------------------------------------------------------------------
// Sign test
// ---------------------------------------------------------------------------

/// Result of the sign test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTestResult {
    /// Pairs with a strictly positive difference a − b.
    pub positive: usize,
    /// Pairs with a strictly negative difference.
    pub negative: usize,
    /// Pairs with a zero difference (excluded).
    pub ties: usize,
    /// positive + negative.
    pub effective_n: usize,
    /// min(positive, negative).
    pub statistic: usize,
    /// Two-tailed exact binomial p-value.
    pub p_value: f64,
    /// Decision at α.
    pub decision: Decision,
    /// `true` iff the null hypothesis is rejected.
    pub significant: bool,
}

/// Sign test for paired samples: H₀: median difference = 0.
///
/// # Algorithm
///
/// Counts strictly positive and negative differences (zeros are ties and
/// dropped), S = min(n₊, n₋) over n = n₊ + n₋, and
/// p = min(1, 2·Σₖ₌₀ˢ C(n,k)·0.5ⁿ). When every pair is tied, p = 1.
///
/// # Errors
///
/// [`StatError::Input`](crate::StatError::Input) if the samples are empty,
/// differ in length, hold non-finite values, or α is outside (0, 1).
///
/// # Examples
///
/// ```
/// use u_hypothesis::testing::sign_test;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [2.0, 2.0, 2.0, 2.0, 2.0];
/// let r = sign_test(&a, &b, 0.05).unwrap();
/// assert_eq!((r.positive, r.negative, r.ties), (3, 1, 1));
/// assert_eq!(r.effective_n, 4);
/// assert_eq!(r.statistic, 1);
/// ```
pub fn sign_test(a: &[f64], b: &[f64], alpha: f64) -> Result<SignTestResult> {
    validate_alpha(alpha)?;
    ensure_paired(a, b)?;
    ensure_finite("sample 1", a)?;
    ensure_finite("sample 2", b)?;

    let (mut positive, mut negative, mut ties) = (0, 0, 0);
    for (&x, &y) in a.iter().zip(b) {
        let d = x - y;
        if d > 0.0 {
            positive += 1;
        } else if d < 0.0 {
            negative += 1;
        } else {
            ties += 1;
        }
    }

    let n = positive + negative;
    let statistic = positive.min(negative);
    let p_value = if n == 0 {
        1.0
    } else {
        let tail: f64 = (0..=statistic).map(|k| binomial_half_pmf(n, k)).sum();
        (2.0 * tail).min(1.0)
    };
    let decision = Decision::from_p(p_value, alpha);

    debug!(positive, negative, ties, statistic, p_value, "sign test");
    Ok(SignTestResult {
        positive,
        negative,
        ties,
        effective_n: n,
        statistic,
        p_value,
        decision,
        significant: decision.is_reject(),
    })
}

// P(X = k) for X ~ Binomial(n, 0.5)
fn binomial_half_pmf(n: usize, k: usize) -> f64 {
    let ln_choose = ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k);
    (ln_choose - n as f64 * std::f64::consts::LN_2).exp()
}

fn ln_factorial(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    special::ln_gamma(n as f64 + 1.0)
}

// ---------------------------------------------------------------------------
// Wilcoxon signed-rank test
// ---------------------------------------------------------------------------

/// Result of the Wilcoxon signed-rank test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WilcoxonResult {
    /// Sum of ranks of positive differences (W⁺).
    pub positive_rank_sum: f64,
    /// Sum of ranks of negative differences (W⁻).
    pub negative_rank_sum: f64,
    /// min(W⁺, W⁻).
    pub statistic: f64,
    /// Number of non-zero differences.
    pub n: usize,
    /// Number of zero differences dropped.
    pub zeros: usize,
    /// `true` if the exact null distribution was used.
    pub exact: bool,
    /// Continuity-corrected z score under the normal approximation.
    pub z: Option<f64>,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// Decision at α.
    pub decision: Decision,
    /// `true` iff the null hypothesis is rejected.
    pub significant: bool,
}

/// Wilcoxon signed-rank test: H₀: median of differences = 0.
///
/// # Algorithm
///
/// 1. dᵢ = aᵢ − bᵢ, zeros discarded
/// 2. Rank |dᵢ| with mid-ranks for ties
/// 3. W = min(W⁺, W⁻)
/// 4. n ≤ 20: exact p = min(1, 2·P(T ≤ W)) from the count of subsets of
///    {1..n} with each rank sum, built by dynamic programming.
///    n > 20: z = (|W − μ| − 0.5) / σ with μ = n(n+1)/4 and
///    σ² = n(n+1)(2n+1)/24.
///
/// When every difference is zero, p = 1.
///
/// # Examples
///
/// ```
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::testing::wilcoxon_signed_rank_test;
///
/// let before = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
/// let after = [6.0, 7.5, 8.0, 9.5, 11.0, 12.5, 12.0, 14.0];
/// let r = wilcoxon_signed_rank_test(&Numflow, &after, &before, 0.05).unwrap();
/// assert_eq!(r.negative_rank_sum, 0.0);
/// assert!(r.exact);
/// assert!(r.p_value < 0.01);
/// ```
pub fn wilcoxon_signed_rank_test<D: Distributions>(
    dist: &D,
    a: &[f64],
    b: &[f64],
    alpha: f64,
) -> Result<WilcoxonResult> {
    validate_alpha(alpha)?;
    ensure_paired(a, b)?;
    ensure_finite("sample 1", a)?;
    ensure_finite("sample 2", b)?;

    let diffs: Vec<f64> = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| x - y)
        .filter(|&d| d != 0.0)
        .collect();
    let zeros = a.len() - diffs.len();
    let n = diffs.len();

    if n == 0 {
        let decision = Decision::from_p(1.0, alpha);
        debug!(zeros, "wilcoxon signed-rank: all differences are zero");
        return Ok(WilcoxonResult {
            positive_rank_sum: 0.0,
            negative_rank_sum: 0.0,
            statistic: 0.0,
            n,
            zeros,
            exact: true,
            z: None,
            p_value: 1.0,
            decision,
            significant: decision.is_reject(),
        });
    }

    let abs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = mid_ranks(&abs);
    let (mut w_plus, mut w_minus) = (0.0, 0.0);
    for (d, r) in diffs.iter().zip(&ranks) {
        if *d > 0.0 {
            w_plus += r;
        } else {
            w_minus += r;
        }
    }
    let statistic = f64::min(w_plus, w_minus);

    let (exact, z, p_value) = if n <= WILCOXON_EXACT_MAX_N {
        let p = (2.0 * signed_rank_lower_tail(n, statistic)).min(1.0);
        (true, None, p)
    } else {
        let nf = n as f64;
        let mu = nf * (nf + 1.0) / 4.0;
        let sigma = (nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0).sqrt();
        let z = continuity_z(statistic, mu, sigma);
        let p = (2.0 * (1.0 - dist.std_normal_cdf(z.abs()))).clamp(0.0, 1.0);
        (false, Some(z), p)
    };
    let decision = Decision::from_p(p_value, alpha);

    debug!(w_plus, w_minus, n, exact, p_value, "wilcoxon signed-rank test");
    Ok(WilcoxonResult {
        positive_rank_sum: w_plus,
        negative_rank_sum: w_minus,
        statistic,
        n,
        zeros,
        exact,
        z,
        p_value,
        decision,
        significant: decision.is_reject(),
    })
}

/// P(T ≤ w) under H₀ for the signed-rank statistic with `n` untied ranks.
///
/// `counts[s]` holds the number of subsets of {1..n} summing to s, filled in
/// Θ(n·W) with W = n(n+1)/2.
fn signed_rank_lower_tail(n: usize, w: f64) -> f64 {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0_f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }

    if w < 0.0 {
        return 0.0;
    }
    let upper = (w.floor() as usize).min(max_sum);
    let hits: f64 = counts[..=upper].iter().sum();
    hits / 2f64.powi(n as i32)
}

// Continuity-corrected z, signed like (stat − mu), never crossing zero.
fn continuity_z(stat: f64, mu: f64, sigma: f64) -> f64 {
    let magnitude = ((stat - mu).abs() - 0.5).max(0.0) / sigma;
    if stat < mu {
        -magnitude
    } else {
        magnitude
    }
}

// ---------------------------------------------------------------------------
// Mann-Whitney U test
// ---------------------------------------------------------------------------

/// Result of the Mann-Whitney U test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MannWhitneyResult {
    /// Rank sum of sample 1 in the pooled ranking.
    pub rank_sum_1: f64,
    /// Rank sum of sample 2 in the pooled ranking.
    pub rank_sum_2: f64,
    /// U₁ = R₁ − n₁(n₁+1)/2.
    pub u1: f64,
    /// U₂ = R₂ − n₂(n₂+1)/2.
    pub u2: f64,
    /// min(U₁, U₂).
    pub statistic: f64,
    /// Continuity-corrected z score.
    pub z: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// Decision at α.
    pub decision: Decision,
    /// `true` iff the null hypothesis is rejected.
    pub significant: bool,
}

/// Mann-Whitney U test: H₀: both samples come from the same distribution.
///
/// # Algorithm
///
/// 1. Pool both samples and rank with mid-ranks
/// 2. U₁ = R₁ − n₁(n₁+1)/2, U₂ = R₂ − n₂(n₂+1)/2, U = min(U₁, U₂)
/// 3. z = (|U − μ| − 0.5) / σ with μ = n₁n₂/2 and
///    σ = √(n₁n₂(n₁+n₂+1)/12)
///
/// # Examples
///
/// ```
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::testing::mann_whitney_u_test;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let r = mann_whitney_u_test(&Numflow, &a, &b, 0.05).unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert!(r.p_value < 0.05);
/// ```
pub fn mann_whitney_u_test<D: Distributions>(
    dist: &D,
    a: &[f64],
    b: &[f64],
    alpha: f64,
) -> Result<MannWhitneyResult> {
    validate_alpha(alpha)?;
    ensure_finite("sample 1", a)?;
    ensure_finite("sample 2", b)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;

    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = mid_ranks(&pooled);
    let rank_sum_1: f64 = ranks[..a.len()].iter().sum();
    let rank_sum_2: f64 = ranks[a.len()..].iter().sum();

    let u1 = rank_sum_1 - n1 * (n1 + 1.0) / 2.0;
    let u2 = rank_sum_2 - n2 * (n2 + 1.0) / 2.0;
    let statistic = u1.min(u2);

    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 * (n1 + n2 + 1.0) / 12.0).sqrt();
    let z = continuity_z(statistic, mu, sigma);
    let p_value = (2.0 * (1.0 - dist.std_normal_cdf(z.abs()))).clamp(0.0, 1.0);
    let decision = Decision::from_p(p_value, alpha);

    debug!(u1, u2, z, p_value, "mann-whitney u test");
    Ok(MannWhitneyResult {
        rank_sum_1,
        rank_sum_2,
        u1,
        u2,
        statistic,
        z,
        p_value,
        decision,
        significant: decision.is_reject(),
    })
}
