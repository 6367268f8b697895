use serde::Serialize;
use tracing::debug;

use crate::config::{validate_alpha, Decision};
use crate::descriptive::centered_sum_sq;
use crate::distribution::Distributions;
use crate::error::{ensure_finite, Result, StatError};
use crate::factor::{group_one_way, DataTable};

/// Result of one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnovaResult {
    /// F-statistic.
    pub f_statistic: f64,
    /// p-value.
    pub p_value: f64,
    /// Degrees of freedom between groups (k − 1).
    pub df_between: usize,
    /// Degrees of freedom within groups (N − k).
    pub df_within: usize,
    /// Sum of squares between groups.
    pub ss_between: f64,
    /// Sum of squares within groups.
    pub ss_within: f64,
    /// Mean square between.
    pub ms_between: f64,
    /// Mean square within.
    pub ms_within: f64,
    /// Group means.
    pub group_means: Vec<f64>,
    /// Group labels, in the order of `group_means`.
    pub group_labels: Vec<String>,
    /// Grand mean.
    pub grand_mean: f64,
    /// Decision at α.
    pub decision: Decision,
    /// `true` iff the null hypothesis is rejected.
    pub significant: bool,
}

/// One-way ANOVA: H₀: all group means are equal.
///
/// # Algorithm
///
/// SSB = Σᵢ nᵢ(x̄ᵢ − x̄)², SSW = ΣᵢΣⱼ(xᵢⱼ − x̄ᵢ)²,
/// F = (SSB/(k−1)) / (SSW/(N−k)), p = 1 − F_cdf(F; k−1, N−k).
///
/// # Errors
///
/// - [`StatError::Input`] if fewer than 2 groups, an empty group, non-finite
///   values, or N − k = 0.
/// - [`StatError::Computation`] if the within-group variance is zero.
///
/// # Examples
///
/// ```
/// use u_hypothesis::anova::one_way_anova;
/// use u_hypothesis::distribution::Numflow;
///
/// let group1 = [5.0, 6.0, 7.0, 5.5, 6.5];
/// let group2 = [8.0, 9.0, 8.5, 9.5, 8.0];
/// let group3 = [4.0, 3.0, 3.5, 4.5, 4.0];
/// let r = one_way_anova(&Numflow, &[&group1, &group2, &group3], 0.05).unwrap();
/// assert_eq!((r.df_between, r.df_within), (2, 12));
/// assert!(r.p_value < 0.01);
/// ```
pub fn one_way_anova<D: Distributions>(
    dist: &D,
    groups: &[&[f64]],
    alpha: f64,
) -> Result<AnovaResult> {
    validate_alpha(alpha)?;
    let k = groups.len();
    if k < 2 {
        return Err(StatError::input(format!(
            "ANOVA needs at least 2 groups, got {k}"
        )));
    }
    for (i, g) in groups.iter().enumerate() {
        ensure_finite(&format!("group {}", i + 1), g)?;
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    let df_between = k - 1;
    let df_within = total_n - k;
    if df_within == 0 {
        return Err(StatError::input(
            "ANOVA needs more observations than groups",
        ));
    }

    let grand_sum: f64 = groups.iter().flat_map(|g| g.iter()).sum();
    let grand_mean = grand_sum / total_n as f64;

    let group_means: Vec<f64> = groups
        .iter()
        .map(|g| g.iter().sum::<f64>() / g.len() as f64)
        .collect();

    let ss_between: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.len() as f64 * (gm - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| centered_sum_sq(g, gm))
        .sum();

    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;
    if ms_within <= 0.0 {
        return Err(StatError::computation(
            "within-group variance is zero; F statistic is undefined",
        ));
    }

    let f_statistic = ms_between / ms_within;
    let p_value =
        (1.0 - dist.f_cdf(f_statistic, df_between as f64, df_within as f64)).clamp(0.0, 1.0);
    let decision = Decision::from_p(p_value, alpha);

    debug!(f_statistic, df_between, df_within, p_value, "one-way anova");
    Ok(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
        ss_between,
        ss_within,
        ms_between,
        ms_within,
        group_means,
        group_labels: (1..=k).map(|i| i.to_string()).collect(),
        grand_mean,
        decision,
        significant: decision.is_reject(),
    })
}

/// One-way ANOVA of the `value` column grouped by the levels of `factor`.
///
/// Group labels in the result are the factor levels.
pub fn one_way_anova_by_factor<D: Distributions>(
    dist: &D,
    table: &DataTable,
    factor: &str,
    value: &str,
    alpha: f64,
) -> Result<AnovaResult> {
    let grouped = group_one_way(table, factor, value)?;
    let slices: Vec<&[f64]> = grouped.groups.iter().map(Vec::as_slice).collect();
    let mut result = one_way_anova(dist, &slices, alpha)?;
    result.group_labels = grouped.labels();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Numflow;
    use crate::factor::Cell;

    #[test]
    fn textbook_partition() {
        let g1 = [1.0, 2.0, 3.0];
        let g2 = [4.0, 5.0, 6.0];
        let g3 = [7.0, 8.0, 9.0];
        let r = one_way_anova(&Numflow, &[&g1, &g2, &g3], 0.05).expect("should compute");
        // grand mean 5: SSB = 3·(9+0+9) = 54, SSW = 3·2 = 6
        assert!((r.ss_between - 54.0).abs() < 1e-12);
        assert!((r.ss_within - 6.0).abs() < 1e-12);
        assert!((r.f_statistic - 27.0).abs() < 1e-12);
        assert_eq!(r.group_means, vec![2.0, 5.0, 8.0]);
        assert!(r.p_value < 0.01, "p = {}", r.p_value);
        assert!(r.significant);
    }

    #[test]
    fn equal_means_give_zero_f() {
        let g1 = [1.0, 5.0, 3.0];
        let g2 = [2.0, 4.0, 3.0];
        let g3 = [3.0, 3.5, 2.5];
        let r = one_way_anova(&Numflow, &[&g1, &g2, &g3], 0.05).expect("should compute");
        assert!(r.f_statistic.abs() < 1e-12, "F = {}", r.f_statistic);
        assert!((r.p_value - 1.0).abs() < 1e-6, "p = {}", r.p_value);
        assert!(!r.significant);
    }

    #[test]
    fn unequal_group_sizes() {
        let g1 = [10.0, 12.0];
        let g2 = [20.0, 21.0, 22.0, 19.0];
        let r = one_way_anova(&Numflow, &[&g1, &g2], 0.05).expect("should compute");
        assert_eq!(r.df_between, 1);
        assert_eq!(r.df_within, 4);
        assert!((r.grand_mean - 104.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn edge_cases() {
        let g = [1.0, 2.0];
        assert!(matches!(
            one_way_anova(&Numflow, &[&g], 0.05),
            Err(StatError::Input(_))
        ));
        let empty: [f64; 0] = [];
        assert!(one_way_anova(&Numflow, &[&g, &empty], 0.05).is_err());
        assert!(one_way_anova(&Numflow, &[&[1.0], &[2.0]], 0.05).is_err());
        assert!(matches!(
            one_way_anova(&Numflow, &[&[1.0, 1.0], &[2.0, 2.0]], 0.05),
            Err(StatError::Computation(_))
        ));
    }

    #[test]
    fn constant_groups_are_zero_variance() {
        let g1 = [923.966618414014; 9];
        let g2 = [0.1; 5];
        assert!(matches!(
            one_way_anova(&Numflow, &[&g1, &g2], 0.05),
            Err(StatError::Computation(_))
        ));
    }

    #[test]
    fn by_factor_labels() {
        let rows = vec![
            vec![Cell::from("ctl"), Cell::from(4.0)],
            vec![Cell::from("trt"), Cell::from(6.0)],
            vec![Cell::from("ctl"), Cell::from(5.0)],
            vec![Cell::from("trt"), Cell::from(7.0)],
        ];
        let table = DataTable::new(vec!["group".into(), "score".into()], rows);
        let r = one_way_anova_by_factor(&Numflow, &table, "group", "score", 0.05)
            .expect("should compute");
        assert_eq!(r.group_labels, vec!["ctl", "trt"]);
        assert_eq!(r.group_means, vec![4.5, 6.5]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::distribution::Numflow;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn anova_p_bounded(
            g1 in proptest::collection::vec(-1e3_f64..1e3, 3..=15),
            g2 in proptest::collection::vec(-1e3_f64..1e3, 3..=15),
            g3 in proptest::collection::vec(-1e3_f64..1e3, 3..=15),
        ) {
            if let Ok(r) = one_way_anova(&Numflow, &[&g1, &g2, &g3], 0.05) {
                prop_assert!(r.p_value >= 0.0 && r.p_value <= 1.0, "p = {}", r.p_value);
                prop_assert!(r.f_statistic >= 0.0, "F = {}", r.f_statistic);
            }
        }

        #[test]
        fn shifted_copies_have_equal_means(
            base in proptest::collection::vec(-100_i32..100, 3..=12),
        ) {
            let g: Vec<f64> = base.iter().map(|&v| v as f64).collect();
            let mut rev = g.clone();
            rev.reverse();
            if let Ok(r) = one_way_anova(&Numflow, &[&g, &rev], 0.05) {
                prop_assert!(r.f_statistic.abs() < 1e-9, "F = {}", r.f_statistic);
                prop_assert!(r.p_value > 0.999, "p = {}", r.p_value);
            }
        }
    }
}
