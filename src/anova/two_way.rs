use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{validate_alpha, Decision};
use crate::descriptive::{centered_sum_sq, sum_sq_dev};
use crate::distribution::Distributions;
use crate::error::{Result, StatError};
use crate::factor::{group_two_way, DataTable};

/// One line of a two-way ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectRow {
    /// Sum of squares.
    pub ss: f64,
    /// Degrees of freedom.
    pub df: usize,
    /// Mean square (ss / df).
    pub ms: f64,
    /// F = ms / MSE.
    pub f_statistic: f64,
    /// p-value.
    pub p_value: f64,
    /// Decision at α.
    pub decision: Decision,
    /// `true` iff the effect is significant.
    pub significant: bool,
}

/// Result of two-way ANOVA with interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoWayAnovaResult {
    /// Main effect of factor A (rows).
    pub factor_a: EffectRow,
    /// Main effect of factor B (columns).
    pub factor_b: EffectRow,
    /// A × B interaction.
    pub interaction: EffectRow,
    /// Residual sum of squares.
    pub error_ss: f64,
    /// Residual degrees of freedom (N − ab).
    pub error_df: usize,
    /// Residual mean square.
    pub error_ms: f64,
    /// Total sum of squares about the grand mean.
    pub total_ss: f64,
    /// Grand mean.
    pub grand_mean: f64,
    /// Marginal means of factor A levels.
    pub a_means: Vec<f64>,
    /// Marginal means of factor B levels.
    pub b_means: Vec<f64>,
    /// Cell means; `None` for empty cells.
    pub cell_means: Vec<Vec<Option<f64>>>,
    /// Factor A level labels.
    pub a_labels: Vec<String>,
    /// Factor B level labels.
    pub b_labels: Vec<String>,
    /// Number of empty cells skipped in the interaction sum.
    pub empty_cells: usize,
}

/// Two-way ANOVA with interaction over an a × b grid of cells.
///
/// `cells[i][j]` holds the observations at level i of factor A and level j
/// of factor B; every row must have the same number of cells.
///
/// # Algorithm
///
/// - SS_A = Σᵢ nᵢ.(Āᵢ − x̄)², SS_B = Σⱼ n.ⱼ(B̄ⱼ − x̄)²
/// - SS_AB = Σᵢⱼ nᵢⱼ(x̄ᵢⱼ − Āᵢ − B̄ⱼ + x̄)²
/// - SS_E = ΣᵢⱼΣₖ(xᵢⱼₖ − x̄ᵢⱼ)²
/// - df_A = a−1, df_B = b−1, df_AB = df_A·df_B, df_E = N − ab
///
/// Each effect is tested with F = MS / MS_E. Cells with no observations
/// contribute nothing to SS_AB or SS_E; they are skipped rather than
/// imputed, and reported through `empty_cells`.
///
/// # Errors
///
/// - [`StatError::Input`] if a or b is below 2, the grid is ragged, a factor
///   level has no observations, values are non-finite, or N ≤ ab.
/// - [`StatError::Computation`] if the residual variance is zero.
///
/// # Examples
///
/// ```
/// use u_hypothesis::anova::two_way_anova;
/// use u_hypothesis::distribution::Numflow;
///
/// let cells = vec![
///     vec![vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]],
///     vec![vec![6.0, 7.0, 8.0], vec![9.0, 10.0, 11.0]],
/// ];
/// let r = two_way_anova(&Numflow, &cells, 0.05).unwrap();
/// assert!((r.interaction.ss).abs() < 1e-10); // additive effects
/// assert_eq!(r.error_df, 8);
/// ```
pub fn two_way_anova<D: Distributions>(
    dist: &D,
    cells: &[Vec<Vec<f64>>],
    alpha: f64,
) -> Result<TwoWayAnovaResult> {
    validate_alpha(alpha)?;
    let a = cells.len();
    let b = cells.first().map_or(0, Vec::len);
    if a < 2 || b < 2 {
        return Err(StatError::input(format!(
            "two-way ANOVA needs at least 2 levels per factor, got {a} x {b}"
        )));
    }
    if cells.iter().any(|row| row.len() != b) {
        return Err(StatError::input("two-way ANOVA cell grid is ragged"));
    }
    if cells.iter().flatten().flatten().any(|v| !v.is_finite()) {
        return Err(StatError::input("two-way ANOVA data contains a non-finite value"));
    }

    let (total_n, grand_sum) = count_and_sum(cells.iter().flatten());
    let grand_mean = grand_sum / total_n as f64;

    let mut a_n = Vec::with_capacity(a);
    let mut a_means = Vec::with_capacity(a);
    for (i, row) in cells.iter().enumerate() {
        let (n, s) = count_and_sum(row.iter());
        if n == 0 {
            return Err(StatError::input(format!("factor A level {} has no observations", i + 1)));
        }
        a_n.push(n);
        a_means.push(s / n as f64);
    }

    let mut b_n = Vec::with_capacity(b);
    let mut b_means = Vec::with_capacity(b);
    for j in 0..b {
        let (n, s) = count_and_sum(cells.iter().map(|row| &row[j]));
        if n == 0 {
            return Err(StatError::input(format!("factor B level {} has no observations", j + 1)));
        }
        b_n.push(n);
        b_means.push(s / n as f64);
    }

    let cell_count = a * b;
    if total_n <= cell_count {
        return Err(StatError::input(format!(
            "two-way ANOVA needs more than {cell_count} observations, got {total_n}"
        )));
    }

    let ss_a: f64 = a_n
        .iter()
        .zip(&a_means)
        .map(|(&n, &m)| n as f64 * (m - grand_mean).powi(2))
        .sum();
    let ss_b: f64 = b_n
        .iter()
        .zip(&b_means)
        .map(|(&n, &m)| n as f64 * (m - grand_mean).powi(2))
        .sum();

    let mut ss_ab = 0.0;
    let mut ss_e = 0.0;
    let mut empty_cells = 0;
    let mut cell_means = vec![vec![None; b]; a];
    for (i, row) in cells.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                empty_cells += 1;
                continue;
            }
            let n = cell.len() as f64;
            let m = cell.iter().sum::<f64>() / n;
            cell_means[i][j] = Some(m);
            ss_ab += n * (m - a_means[i] - b_means[j] + grand_mean).powi(2);
            ss_e += centered_sum_sq(cell, m);
        }
    }
    if empty_cells > 0 {
        warn!(empty_cells, "two-way anova: empty cells skipped");
    }

    let total_ss: f64 = cells
        .iter()
        .flatten()
        .map(|c| sum_sq_dev(c, grand_mean))
        .sum();

    let df_a = a - 1;
    let df_b = b - 1;
    let df_ab = df_a * df_b;
    let error_df = total_n - cell_count;
    let error_ms = ss_e / error_df as f64;
    if error_ms <= 0.0 {
        return Err(StatError::computation(
            "within-cell variance is zero; F statistics are undefined",
        ));
    }

    let effect = |ss: f64, df: usize| -> EffectRow {
        let ms = ss / df as f64;
        let f_statistic = ms / error_ms;
        let p_value =
            (1.0 - dist.f_cdf(f_statistic, df as f64, error_df as f64)).clamp(0.0, 1.0);
        let decision = Decision::from_p(p_value, alpha);
        EffectRow {
            ss,
            df,
            ms,
            f_statistic,
            p_value,
            decision,
            significant: decision.is_reject(),
        }
    };

    let factor_a = effect(ss_a, df_a);
    let factor_b = effect(ss_b, df_b);
    let interaction = effect(ss_ab, df_ab);

    debug!(
        f_a = factor_a.f_statistic,
        f_b = factor_b.f_statistic,
        f_ab = interaction.f_statistic,
        error_df,
        "two-way anova"
    );
    Ok(TwoWayAnovaResult {
        factor_a,
        factor_b,
        interaction,
        error_ss: ss_e,
        error_df,
        error_ms,
        total_ss,
        grand_mean,
        a_means,
        b_means,
        cell_means,
        a_labels: (1..=a).map(|i| i.to_string()).collect(),
        b_labels: (1..=b).map(|j| j.to_string()).collect(),
        empty_cells,
    })
}

// Observation count and sum over a set of cells.
fn count_and_sum<'a>(cells: impl Iterator<Item = &'a Vec<f64>>) -> (usize, f64) {
    cells.fold((0, 0.0), |(n, s), c| (n + c.len(), s + c.iter().sum::<f64>()))
}

/// Two-way ANOVA of the `value` column grouped by `factor_a` × `factor_b`.
pub fn two_way_anova_by_factors<D: Distributions>(
    dist: &D,
    table: &DataTable,
    factor_a: &str,
    factor_b: &str,
    value: &str,
    alpha: f64,
) -> Result<TwoWayAnovaResult> {
    let grouped = group_two_way(table, factor_a, factor_b, value)?;
    let mut result = two_way_anova(dist, &grouped.cells, alpha)?;
    result.a_labels = grouped.a_labels();
    result.b_labels = grouped.b_labels();
    Ok(result)
}
