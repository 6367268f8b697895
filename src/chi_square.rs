//! Chi-squared tests for categorical data.
//!
//! Goodness-of-fit over the categories of one column and independence over
//! the contingency table of two columns.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::chi_square::{chi_square_independence, ContingencyTable};
//! use u_hypothesis::distribution::Numflow;
//!
//! let table = ContingencyTable::from_counts(vec![vec![10, 10], vec![10, 10]]).unwrap();
//! let r = chi_square_independence(&Numflow, &table, 0.05).unwrap();
//! assert_eq!(r.statistic, 0.0);
//! assert_eq!(r.p_value, 1.0);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{validate_alpha, Decision};
use crate::distribution::Distributions;
use crate::error::{Result, StatError};
use crate::factor::{Cell, DataTable, FactorEncoding};

/// Expected counts below this trigger a warning about the χ² approximation.
const MIN_EXPECTED: f64 = 5.0;

/// Which chi-squared test to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChiSquareKind {
    /// One column against a (default uniform) expected distribution.
    #[serde(rename = "goodness-of-fit")]
    GoodnessOfFit,
    /// Two columns tested for association.
    #[serde(rename = "independence")]
    Independence,
}

impl ChiSquareKind {
    /// Number of columns the test consumes.
    pub fn column_count(self) -> usize {
        match self {
            Self::GoodnessOfFit => 1,
            Self::Independence => 2,
        }
    }
}

impl FromStr for ChiSquareKind {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "goodness-of-fit" => Ok(Self::GoodnessOfFit),
            "independence" => Ok(Self::Independence),
            other => Err(StatError::domain(format!(
                "unsupported chi-square test type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ChiSquareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodnessOfFit => f.write_str("goodness-of-fit"),
            Self::Independence => f.write_str("independence"),
        }
    }
}

// ---------------------------------------------------------------------------
// Contingency table
// ---------------------------------------------------------------------------

/// Two-way table of non-negative counts with its marginals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyTable {
    counts: Vec<Vec<u64>>,
    row_totals: Vec<u64>,
    col_totals: Vec<u64>,
    grand_total: u64,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
}

impl ContingencyTable {
    /// Builds a table from row-major counts; rows and columns are labelled
    /// by 1-based index.
    ///
    /// # Errors
    ///
    /// [`StatError::Input`] if the table is empty or ragged.
    pub fn from_counts(counts: Vec<Vec<u64>>) -> Result<Self> {
        let rows = counts.len();
        let cols = counts.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(StatError::input("contingency table is empty"));
        }
        if counts.iter().any(|r| r.len() != cols) {
            return Err(StatError::input("contingency table rows differ in length"));
        }
        Ok(Self::with_labels(
            counts,
            (1..=rows).map(|i| i.to_string()).collect(),
            (1..=cols).map(|j| j.to_string()).collect(),
        ))
    }

    /// Cross-tabulates two parallel columns of cells over their observed
    /// levels. Pairs where either cell is missing are skipped.
    ///
    /// # Errors
    ///
    /// [`StatError::Input`] if the columns differ in length or no complete
    /// pair exists.
    pub fn from_columns(rows: &[&Cell], cols: &[&Cell]) -> Result<Self> {
        if rows.len() != cols.len() {
            return Err(StatError::input(format!(
                "columns must have equal length, got {} and {}",
                rows.len(),
                cols.len()
            )));
        }
        let pairs: Vec<_> = rows
            .iter()
            .zip(cols)
            .filter_map(|(r, c)| Some((r.level()?, c.level()?)))
            .collect();
        if pairs.is_empty() {
            return Err(StatError::input("no rows with both categories present"));
        }

        let mut row_enc = FactorEncoding::new();
        let mut col_enc = FactorEncoding::new();
        let coded: Vec<(usize, usize)> = pairs
            .into_iter()
            .map(|(r, c)| (row_enc.encode(r), col_enc.encode(c)))
            .collect();

        let mut counts = vec![vec![0_u64; col_enc.len()]; row_enc.len()];
        for (i, j) in coded {
            counts[i][j] += 1;
        }
        let labels = |enc: &FactorEncoding| enc.levels().iter().map(ToString::to_string).collect();
        Ok(Self::with_labels(counts, labels(&row_enc), labels(&col_enc)))
    }

    fn with_labels(
        counts: Vec<Vec<u64>>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    ) -> Self {
        let row_totals: Vec<u64> = counts.iter().map(|r| r.iter().sum()).collect();
        let col_totals: Vec<u64> = (0..col_labels.len())
            .map(|j| counts.iter().map(|r| r[j]).sum())
            .collect();
        let grand_total = row_totals.iter().sum();
        Self {
            counts,
            row_totals,
            col_totals,
            grand_total,
            row_labels,
            col_labels,
        }
    }

    /// Number of row categories.
    pub fn rows(&self) -> usize {
        self.counts.len()
    }

    /// Number of column categories.
    pub fn cols(&self) -> usize {
        self.col_totals.len()
    }

    /// Observed count at (`i`, `j`).
    pub fn count(&self, i: usize, j: usize) -> u64 {
        self.counts[i][j]
    }

    /// Row marginals.
    pub fn row_totals(&self) -> &[u64] {
        &self.row_totals
    }

    /// Column marginals.
    pub fn col_totals(&self) -> &[u64] {
        &self.col_totals
    }

    /// Σᵢⱼ counts.
    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    /// Row category labels.
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column category labels.
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Expected count under independence: rowTotal·colTotal / grandTotal.
    pub fn expected(&self, i: usize, j: usize) -> f64 {
        if self.grand_total == 0 {
            return 0.0;
        }
        self.row_totals[i] as f64 * self.col_totals[j] as f64 / self.grand_total as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Result of a chi-squared test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChiSquareResult {
    /// Which test produced this result.
    pub kind: ChiSquareKind,
    /// χ² statistic.
    pub statistic: f64,
    /// Degrees of freedom.
    pub degrees_of_freedom: usize,
    /// p-value = 1 − χ²_cdf(statistic, df).
    pub p_value: f64,
    /// Decision at α.
    pub decision: Decision,
    /// `true` iff the null hypothesis is rejected.
    pub significant: bool,
    /// Category labels (goodness-of-fit) or row labels (independence).
    pub row_labels: Vec<String>,
    /// Column labels (independence only).
    pub col_labels: Vec<String>,
    /// Observed frequencies; a single row for goodness-of-fit.
    pub observed: Vec<Vec<f64>>,
    /// Expected frequencies, same shape as `observed`.
    pub expected: Vec<Vec<f64>>,
}

/// Chi-squared goodness-of-fit test on category frequencies.
///
/// # Algorithm
///
/// χ² = Σ (Oᵢ − Eᵢ)² / Eᵢ, df = k − 1. With `expected = None` each
/// Eᵢ = ΣO / k.
///
/// # Errors
///
/// [`StatError::Input`] if fewer than 2 categories, negative or non-finite
/// counts, a zero total, or `expected` that differs in length or holds a
/// non-positive value.
///
/// # Examples
///
/// ```
/// use u_hypothesis::chi_square::chi_square_goodness_of_fit;
/// use u_hypothesis::distribution::Numflow;
///
/// let observed = [50.0, 30.0, 20.0];
/// let expected = [40.0, 35.0, 25.0];
/// let r = chi_square_goodness_of_fit(&Numflow, &observed, Some(&expected), 0.05).unwrap();
/// assert_eq!(r.degrees_of_freedom, 2);
/// assert!(r.statistic > 0.0);
/// ```
pub fn chi_square_goodness_of_fit<D: Distributions>(
    dist: &D,
    observed: &[f64],
    expected: Option<&[f64]>,
    alpha: f64,
) -> Result<ChiSquareResult> {
    validate_alpha(alpha)?;
    let k = observed.len();
    if k < 2 {
        return Err(StatError::input(format!(
            "goodness-of-fit needs at least 2 categories, got {k}"
        )));
    }
    if observed.iter().any(|&o| o < 0.0 || !o.is_finite()) {
        return Err(StatError::input("observed frequencies must be non-negative"));
    }
    let total: f64 = observed.iter().sum();
    if total <= 0.0 {
        return Err(StatError::input("observed frequencies sum to zero"));
    }

    let expected: Vec<f64> = match expected {
        Some(e) => {
            if e.len() != k {
                return Err(StatError::input(format!(
                    "expected frequencies must have {k} entries, got {}",
                    e.len()
                )));
            }
            if e.iter().any(|&v| v <= 0.0 || !v.is_finite()) {
                return Err(StatError::input("expected frequencies must be positive"));
            }
            e.to_vec()
        }
        None => vec![total / k as f64; k],
    };
    if expected.iter().any(|&e| e < MIN_EXPECTED) {
        warn!("goodness-of-fit: expected frequency below {MIN_EXPECTED}");
    }

    let statistic: f64 = observed
        .iter()
        .zip(&expected)
        .map(|(&o, &e)| (o - e).powi(2) / e)
        .sum();
    let df = k - 1;

    debug!(statistic, df, "chi-square goodness-of-fit");
    Ok(finish(
        dist,
        ChiSquareKind::GoodnessOfFit,
        statistic,
        df,
        alpha,
        (1..=k).map(|i| i.to_string()).collect(),
        Vec::new(),
        vec![observed.to_vec()],
        vec![expected],
    ))
}

/// Goodness-of-fit over the distinct values of one column against the
/// uniform distribution.
///
/// Categories appear in first-seen order; missing cells are skipped.
pub fn chi_square_goodness_of_fit_column<D: Distributions>(
    dist: &D,
    cells: &[&Cell],
    alpha: f64,
) -> Result<ChiSquareResult> {
    let enc = FactorEncoding::from_cells(cells.iter().copied());
    let mut counts = vec![0.0; enc.len()];
    for level in cells.iter().filter_map(|c| c.level()) {
        if let Some(code) = enc.code(&level) {
            counts[code] += 1.0;
        }
    }

    let mut result = chi_square_goodness_of_fit(dist, &counts, None, alpha)?;
    result.row_labels = enc.levels().iter().map(ToString::to_string).collect();
    Ok(result)
}

/// Chi-squared test of independence on a contingency table.
///
/// # Algorithm
///
/// Eᵢⱼ = rowᵢ·colⱼ / N, χ² = Σ (Oᵢⱼ − Eᵢⱼ)² / Eᵢⱼ over cells with Eᵢⱼ > 0,
/// df = (r − 1)(c − 1).
///
/// # Errors
///
/// [`StatError::Input`] if the table has fewer than 2 rows or columns or a
/// zero grand total.
pub fn chi_square_independence<D: Distributions>(
    dist: &D,
    table: &ContingencyTable,
    alpha: f64,
) -> Result<ChiSquareResult> {
    validate_alpha(alpha)?;
    let (r, c) = (table.rows(), table.cols());
    if r < 2 || c < 2 {
        return Err(StatError::input(format!(
            "independence test needs at least a 2 x 2 table, got {r} x {c}"
        )));
    }
    if table.grand_total() == 0 {
        return Err(StatError::input("contingency table has no observations"));
    }

    let mut statistic = 0.0;
    let mut observed = vec![vec![0.0; c]; r];
    let mut expected = vec![vec![0.0; c]; r];
    let mut sparse = false;
    for i in 0..r {
        for j in 0..c {
            let o = table.count(i, j) as f64;
            let e = table.expected(i, j);
            observed[i][j] = o;
            expected[i][j] = e;
            if e > 0.0 {
                statistic += (o - e).powi(2) / e;
                sparse |= e < MIN_EXPECTED;
            }
        }
    }
    if sparse {
        warn!("chi-square independence: expected frequency below {MIN_EXPECTED}");
    }
    let df = (r - 1) * (c - 1);

    debug!(statistic, df, "chi-square independence");
    Ok(finish(
        dist,
        ChiSquareKind::Independence,
        statistic,
        df,
        alpha,
        table.row_labels().to_vec(),
        table.col_labels().to_vec(),
        observed,
        expected,
    ))
}

/// Runs the chi-squared test `kind` over named columns of `table`.
///
/// # Errors
///
/// [`StatError::Domain`] if the number of columns does not match the test
/// (one for goodness-of-fit, two for independence); otherwise as the
/// underlying test.
///
/// # Examples
///
/// ```
/// use u_hypothesis::chi_square::{chi_square_test, ChiSquareKind};
/// use u_hypothesis::distribution::Numflow;
/// use u_hypothesis::factor::{Cell, DataTable};
///
/// let rows = ["a", "b", "a", "c", "b", "a"]
///     .iter()
///     .map(|&s| vec![Cell::from(s)])
///     .collect();
/// let table = DataTable::new(vec!["letter".into()], rows);
/// let r = chi_square_test(&Numflow, &table, &["letter"], ChiSquareKind::GoodnessOfFit, 0.05)
///     .unwrap();
/// assert_eq!(r.row_labels, vec!["a", "b", "c"]);
/// assert_eq!(r.degrees_of_freedom, 2);
/// ```
pub fn chi_square_test<D: Distributions>(
    dist: &D,
    table: &DataTable,
    columns: &[&str],
    kind: ChiSquareKind,
    alpha: f64,
) -> Result<ChiSquareResult> {
    if columns.len() != kind.column_count() {
        return Err(StatError::domain(format!(
            "{kind} test takes {} column(s), got {}",
            kind.column_count(),
            columns.len()
        )));
    }
    match kind {
        ChiSquareKind::GoodnessOfFit => {
            let cells = table.column(columns[0])?;
            chi_square_goodness_of_fit_column(dist, &cells, alpha)
        }
        ChiSquareKind::Independence => {
            let rows = table.column(columns[0])?;
            let cols = table.column(columns[1])?;
            let contingency = ContingencyTable::from_columns(&rows, &cols)?;
            chi_square_independence(dist, &contingency, alpha)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn finish<D: Distributions>(
    dist: &D,
    kind: ChiSquareKind,
    statistic: f64,
    df: usize,
    alpha: f64,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    observed: Vec<Vec<f64>>,
    expected: Vec<Vec<f64>>,
) -> ChiSquareResult {
    let p_value = (1.0 - dist.chi_squared_cdf(statistic, df as f64)).clamp(0.0, 1.0);
    let decision = Decision::from_p(p_value, alpha);
    ChiSquareResult {
        kind,
        statistic,
        degrees_of_freedom: df,
        p_value,
        decision,
        significant: decision.is_reject(),
        row_labels,
        col_labels,
        observed,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::stub::ClosedForm;
    use crate::distribution::Numflow;

    #[test]
    fn kind_parsing() {
        assert_eq!(
            "independence".parse::<ChiSquareKind>(),
            Ok(ChiSquareKind::Independence)
        );
        assert_eq!(
            "goodness-of-fit".parse::<ChiSquareKind>(),
            Ok(ChiSquareKind::GoodnessOfFit)
        );
        assert!("goodness".parse::<ChiSquareKind>().is_err());
        assert!(matches!(
            "fisher".parse::<ChiSquareKind>(),
            Err(StatError::Domain(_))
        ));
    }

    #[test]
    fn marginals_are_consistent() {
        let t = ContingencyTable::from_counts(vec![vec![3, 5, 2], vec![7, 1, 4]]).unwrap();
        assert_eq!(t.row_totals(), &[10, 12]);
        assert_eq!(t.col_totals(), &[10, 6, 6]);
        assert_eq!(t.grand_total(), 22);
        assert_eq!(t.row_totals().iter().sum::<u64>(), t.col_totals().iter().sum::<u64>());
        assert!(ContingencyTable::from_counts(vec![vec![1, 2], vec![3]]).is_err());
        assert!(ContingencyTable::from_counts(vec![]).is_err());
    }

    #[test]
    fn balanced_table_is_independent() {
        let t = ContingencyTable::from_counts(vec![vec![10, 10], vec![10, 10]]).unwrap();
        let r = chi_square_independence(&Numflow, &t, 0.05).expect("should compute");
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.degrees_of_freedom, 1);
        assert_eq!(r.p_value, 1.0);
        assert!(!r.significant);
    }

    #[test]
    fn strong_association() {
        let t = ContingencyTable::from_counts(vec![vec![30, 10], vec![20, 40]]).unwrap();
        let r = chi_square_independence(&Numflow, &t, 0.05).expect("should compute");
        // E = [[20, 20], [30, 30]]: χ² = 5 + 5 + 10/3 + 10/3
        assert!((r.statistic - 50.0 / 3.0).abs() < 1e-12, "χ² = {}", r.statistic);
        assert!(r.p_value < 0.001);
        assert_eq!(r.expected[0][0], 20.0);
    }

    #[test]
    fn zero_marginal_cells_are_skipped() {
        let t = ContingencyTable::from_counts(vec![vec![5, 0, 5], vec![5, 0, 15]]).unwrap();
        let r = chi_square_independence(&ClosedForm, &t, 0.05).expect("should compute");
        assert!(r.statistic.is_finite());
        assert_eq!(r.degrees_of_freedom, 2);
        assert!((r.p_value - (-r.statistic).exp()).abs() < 1e-12);
    }

    #[test]
    fn goodness_uniform_default() {
        let r = chi_square_goodness_of_fit(&Numflow, &[10.0, 20.0, 30.0], None, 0.05)
            .expect("should compute");
        // E = 20 each: (100 + 0 + 100) / 20
        assert!((r.statistic - 10.0).abs() < 1e-12);
        assert_eq!(r.degrees_of_freedom, 2);
        // χ²(2) tail = e^{−5}
        assert!((r.p_value - (-5.0_f64).exp()).abs() < 1e-6, "p = {}", r.p_value);
    }

    #[test]
    fn goodness_edge_cases() {
        assert!(chi_square_goodness_of_fit(&Numflow, &[5.0], None, 0.05).is_err());
        assert!(chi_square_goodness_of_fit(&Numflow, &[5.0, -1.0], None, 0.05).is_err());
        assert!(chi_square_goodness_of_fit(&Numflow, &[0.0, 0.0], None, 0.05).is_err());
        assert!(chi_square_goodness_of_fit(&Numflow, &[5.0, 5.0], Some(&[1.0]), 0.05).is_err());
        assert!(
            chi_square_goodness_of_fit(&Numflow, &[5.0, 5.0], Some(&[5.0, 0.0]), 0.05).is_err()
        );
    }

    #[test]
    fn from_columns_cross_tabulates() {
        let a: Vec<Cell> = ["m", "f", "m", "f", "m"].iter().map(|&s| s.into()).collect();
        let b: Vec<Cell> = vec!["y".into(), "n".into(), "n".into(), Cell::Empty, "y".into()];
        let ra: Vec<&Cell> = a.iter().collect();
        let rb: Vec<&Cell> = b.iter().collect();
        let t = ContingencyTable::from_columns(&ra, &rb).unwrap();
        assert_eq!(t.row_labels(), &["m", "f"]);
        assert_eq!(t.col_labels(), &["y", "n"]);
        assert_eq!(t.count(0, 0), 2);
        assert_eq!(t.count(0, 1), 1);
        assert_eq!(t.count(1, 1), 1);
        assert_eq!(t.grand_total(), 4);
    }

    #[test]
    fn column_count_mismatch_is_domain_error() {
        let table = DataTable::new(
            vec!["a".into(), "b".into()],
            vec![vec!["x".into(), "y".into()]],
        );
        assert!(matches!(
            chi_square_test(&Numflow, &table, &["a", "b"], ChiSquareKind::GoodnessOfFit, 0.05),
            Err(StatError::Domain(_))
        ));
        assert!(matches!(
            chi_square_test(&Numflow, &table, &["a"], ChiSquareKind::Independence, 0.05),
            Err(StatError::Domain(_))
        ));
    }

    #[test]
    fn independence_from_table_columns() {
        let mut rows = Vec::new();
        for _ in 0..15 {
            rows.push(vec![Cell::from("smoker"), Cell::from("yes")]);
        }
        for _ in 0..5 {
            rows.push(vec![Cell::from("smoker"), Cell::from("no")]);
        }
        for _ in 0..5 {
            rows.push(vec![Cell::from("non"), Cell::from("yes")]);
        }
        for _ in 0..15 {
            rows.push(vec![Cell::from("non"), Cell::from("no")]);
        }
        let table = DataTable::new(vec!["habit".into(), "disease".into()], rows);
        let r = chi_square_test(
            &Numflow,
            &table,
            &["habit", "disease"],
            ChiSquareKind::Independence,
            0.05,
        )
        .expect("should compute");
        // E = 10 everywhere: χ² = 4 · 25/10
        assert!((r.statistic - 10.0).abs() < 1e-12);
        assert!(r.significant);
    }
}
