//! Least-squares linear regression.
//!
//! Simple regression with one predictor (closed form) and multiple
//! regression via the normal equations β = (XᵗX)⁻¹Xᵗy. Both report R²,
//! the residual standard error and a printable equation.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::regression::simple_linear_regression;
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.0, 4.0, 6.0, 8.0, 10.0];
//! let fit = simple_linear_regression(&x, &y).unwrap();
//! assert_eq!(fit.equation, "y = 2.0000x + 0.0000");
//! assert!((fit.predict(6.0) - 12.0).abs() < 1e-12);
//! ```

use serde::Serialize;
use tracing::debug;
use u_numflow::matrix::Matrix;
use u_numflow::stats;

use crate::descriptive::centered_sum_sq;
use crate::error::{ensure_finite, ensure_finite_result, ensure_paired, Result, StatError};
use crate::factor::DataTable;

/// Variance inflation factor above which a predictor is treated as an exact
/// linear combination of the others (R²ⱼ > 1 − 1e-12).
const MAX_VIF: f64 = 1e12;

/// Fitted line y = intercept + slope · x.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleRegression {
    /// Slope (β₁).
    pub slope: f64,
    /// Intercept (β₀).
    pub intercept: f64,
    /// R² = 1 − SS_res / SS_tot.
    pub coefficient_of_determination: f64,
    /// Residual standard error √(SS_res / (n − 2)).
    pub standard_error: f64,
    /// Rendered equation, e.g. `y = 2.0000x + 0.0000`.
    pub equation: String,
    /// Number of observations.
    pub n: usize,
}

impl SimpleRegression {
    /// Fitted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fitted hyperplane y = β₀ + β₁x₁ + … + βₖxₖ.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleRegression {
    /// [β₀, β₁, …, βₖ], intercept first.
    pub coefficients: Vec<f64>,
    /// R² = 1 − SS_res / SS_tot.
    pub coefficient_of_determination: f64,
    /// Residual standard error √(SS_res / (n − k − 1)).
    pub standard_error: f64,
    /// Rendered equation, e.g. `y = 1.0000 + 2.0000*x1 - 0.5000*x2`.
    pub equation: String,
    /// Number of observations.
    pub n: usize,
    /// Predictor names, in coefficient order (excluding the intercept).
    pub predictors: Vec<String>,
}

impl MultipleRegression {
    /// Fitted value for one observation of the k predictors.
    ///
    /// # Errors
    ///
    /// [`StatError::Input`] if `x` does not hold exactly k values.
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        let k = self.coefficients.len() - 1;
        if x.len() != k {
            return Err(StatError::input(format!(
                "expected {k} predictor values, got {}",
                x.len()
            )));
        }
        Ok(self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(x)
                .map(|(b, v)| b * v)
                .sum::<f64>())
    }
}

// ---------------------------------------------------------------------------
// Simple Linear Regression
// ---------------------------------------------------------------------------

/// Ordinary least squares with one predictor.
///
/// # Algorithm
///
/// m = Sxy / Sxx, b = ȳ − m·x̄, which equals the sum form
/// m = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²).
///
/// # Errors
///
/// - [`StatError::Input`] if fewer than 3 pairs, unequal lengths, or
///   non-finite values.
/// - [`StatError::Computation`] if every x is identical, every y is
///   identical (R² undefined), or a result is non-finite.
///
/// # References
///
/// Draper & Smith (1998). "Applied Regression Analysis", 3rd edition.
pub fn simple_linear_regression(x: &[f64], y: &[f64]) -> Result<SimpleRegression> {
    ensure_paired(x, y)?;
    ensure_finite("x", x)?;
    ensure_finite("y", y)?;
    let n = x.len();
    if n < 3 {
        return Err(StatError::input(format!("regression needs at least 3 points, got {n}")));
    }
    if x.iter().all(|&v| v == x[0]) {
        return Err(StatError::computation(
            "cannot calculate slope: all x values are identical",
        ));
    }
    if y.iter().all(|&v| v == y[0]) {
        return Err(StatError::computation(
            "cannot calculate R²: all y values are identical",
        ));
    }

    let x_mean = stats::mean(x).ok_or_else(|| StatError::computation("mean of x"))?;
    let y_mean = stats::mean(y).ok_or_else(|| StatError::computation("mean of y"))?;
    let sxx = centered_sum_sq(x, x_mean);
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_total = centered_sum_sq(y, y_mean);
    let ss_residual: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let r_squared = 1.0 - ss_residual / ss_total;
    let standard_error = (ss_residual / (n - 2) as f64).sqrt();
    ensure_finite_result("regression", &[slope, intercept, r_squared, standard_error])?;

    debug!(slope, intercept, r_squared, n, "simple linear regression");
    Ok(SimpleRegression {
        slope,
        intercept,
        coefficient_of_determination: r_squared,
        standard_error,
        equation: format!("y = {slope:.4}x {}", signed_term(intercept)),
        n,
    })
}

/// Simple regression of the `dependent` column on the `independent`
/// column. Rows where either cell is not numeric are skipped.
pub fn simple_regression_by_columns(
    table: &DataTable,
    independent: &str,
    dependent: &str,
) -> Result<SimpleRegression> {
    let rows = complete_rows(table, &[independent, dependent])?;
    let (x, y): (Vec<f64>, Vec<f64>) = rows.iter().map(|r| (r[0], r[1])).unzip();
    simple_linear_regression(&x, &y)
}

// ---------------------------------------------------------------------------
// Multiple Linear Regression
// ---------------------------------------------------------------------------

/// Ordinary least squares with k predictors.
///
/// `predictors` holds one slice per predictor, each of length n. Predictor
/// names default to `x1`, …, `xk`; see [`multiple_regression_by_columns`]
/// for named predictors.
///
/// # Algorithm
///
/// X = [1 | x₁ | … | xₖ], β = (XᵗX)⁻¹Xᵗy,
/// R² = 1 − SS_res/SS_tot, SE = √(SS_res/(n − k − 1)).
///
/// The normal equations are solved on centered, unit-norm predictor columns
/// and the slopes mapped back, which gives the same β while keeping the
/// system well conditioned for large-magnitude predictors.
///
/// # Errors
///
/// - [`StatError::Input`] if no predictors, mismatched lengths, non-finite
///   values, or n < k + 2.
/// - [`StatError::Computation`] if XᵗX is singular (e.g. collinear
///   predictors), every y is identical, or a result is non-finite.
///
/// # References
///
/// Montgomery, Peck & Vining (2012). "Introduction to Linear Regression
/// Analysis", 5th edition.
///
/// # Examples
///
/// ```
/// use u_hypothesis::regression::multiple_linear_regression;
///
/// let x1 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let x2 = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
/// let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.0 + 2.0 * a - 0.5 * b).collect();
/// let fit = multiple_linear_regression(&[&x1, &x2], &y).unwrap();
/// assert_eq!(fit.equation, "y = 1.0000 + 2.0000*x1 - 0.5000*x2");
/// ```
pub fn multiple_linear_regression(
    predictors: &[&[f64]],
    y: &[f64],
) -> Result<MultipleRegression> {
    let names: Vec<String> = (1..=predictors.len()).map(|j| format!("x{j}")).collect();
    fit_multiple(predictors, y, names)
}

/// Multiple regression of the `dependent` column on the named predictor
/// columns. Rows with any non-numeric cell among those columns are
/// skipped; the column names label the equation.
pub fn multiple_regression_by_columns(
    table: &DataTable,
    independents: &[&str],
    dependent: &str,
) -> Result<MultipleRegression> {
    let mut names = independents.to_vec();
    names.push(dependent);
    let rows = complete_rows(table, &names)?;

    let k = independents.len();
    let columns: Vec<Vec<f64>> = (0..k)
        .map(|j| rows.iter().map(|r| r[j]).collect())
        .collect();
    let y: Vec<f64> = rows.iter().map(|r| r[k]).collect();
    let slices: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
    fit_multiple(
        &slices,
        &y,
        independents.iter().map(ToString::to_string).collect(),
    )
}

fn fit_multiple(
    predictors: &[&[f64]],
    y: &[f64],
    names: Vec<String>,
) -> Result<MultipleRegression> {
    let k = predictors.len();
    let n = y.len();
    if k == 0 {
        return Err(StatError::input("at least one predictor is required"));
    }
    ensure_finite("y", y)?;
    for (j, pred) in predictors.iter().enumerate() {
        ensure_paired(pred, y)?;
        ensure_finite(&names[j], pred)?;
    }
    if n < k + 2 {
        return Err(StatError::input(format!(
            "{k} predictor(s) need at least {} observations, got {n}",
            k + 2
        )));
    }
    if y.iter().all(|&v| v == y[0]) {
        return Err(StatError::computation(
            "cannot calculate R²: all y values are identical",
        ));
    }

    // Z = (X − x̄)/‖X − x̄‖ column-wise; ZᵗZ is the predictor correlation matrix.
    let y_mean = stats::mean(y).ok_or_else(|| StatError::computation("mean of y"))?;
    let mut centers = Vec::with_capacity(k);
    let mut scales = Vec::with_capacity(k);
    for pred in predictors {
        let m = stats::mean(pred).ok_or_else(|| StatError::computation("mean of predictor"))?;
        let scale = centered_sum_sq(pred, m).sqrt();
        if scale == 0.0 {
            // a constant column duplicates the intercept
            return Err(singular());
        }
        centers.push(m);
        scales.push(scale);
    }

    let mut z_data = Vec::with_capacity(n * k);
    for i in 0..n {
        z_data.extend((0..k).map(|j| (predictors[j][i] - centers[j]) / scales[j]));
    }
    let y_centered: Vec<f64> = y.iter().map(|&v| v - y_mean).collect();

    let z_mat = Matrix::new(n, k, z_data).map_err(shape)?;
    let zt = z_mat.transpose();
    let gram = zt.mul_mat(&z_mat).map_err(shape)?;
    let zty = zt.mul_vec(&y_centered).map_err(shape)?;
    let gram_inv = gram.inverse().map_err(|_| singular())?;
    // diag((ZᵗZ)⁻¹) holds the variance inflation factors 1/(1 − R²ⱼ); rounding
    // can let an exactly collinear design through elimination with a huge VIF.
    for j in 0..k {
        let vif = gram_inv.get(j, j);
        if !(vif.is_finite() && vif > 0.0 && vif < MAX_VIF) {
            return Err(singular());
        }
    }
    let gamma = gram_inv.mul_vec(&zty).map_err(shape)?;
    ensure_finite_result("regression coefficients", &gamma)?;

    let slopes: Vec<f64> = gamma.iter().zip(&scales).map(|(g, s)| g / s).collect();
    let intercept = y_mean
        - slopes
            .iter()
            .zip(&centers)
            .map(|(b, m)| b * m)
            .sum::<f64>();
    let mut coefficients = Vec::with_capacity(k + 1);
    coefficients.push(intercept);
    coefficients.extend(slopes);
    ensure_finite_result("regression coefficients", &coefficients)?;

    let fitted = z_mat.mul_vec(&gamma).map_err(shape)?;
    let ss_total = centered_sum_sq(y, y_mean);
    let ss_residual: f64 = y_centered
        .iter()
        .zip(&fitted)
        .map(|(yi, fi)| (yi - fi).powi(2))
        .sum();
    let r_squared = 1.0 - ss_residual / ss_total;
    let standard_error = (ss_residual / (n - k - 1) as f64).sqrt();
    ensure_finite_result("regression", &[r_squared, standard_error])?;

    debug!(k, n, r_squared, "multiple linear regression");
    let mut equation = format!("y = {:.4}", coefficients[0]);
    for (b, name) in coefficients[1..].iter().zip(&names) {
        equation.push(' ');
        equation.push_str(&signed_term(*b));
        equation.push('*');
        equation.push_str(name);
    }

    Ok(MultipleRegression {
        coefficients,
        coefficient_of_determination: r_squared,
        standard_error,
        equation,
        n,
        predictors: names,
    })
}

fn shape<E>(_: E) -> StatError {
    StatError::computation("design matrix has inconsistent shape")
}

fn singular() -> StatError {
    StatError::computation("XᵗX is singular; predictors are collinear")
}

/// `+ 1.5000` or `- 1.5000`.
fn signed_term(v: f64) -> String {
    let sign = if v >= 0.0 { '+' } else { '-' };
    format!("{sign} {:.4}", v.abs())
}

/// Rows where every named column holds a number, as parallel values.
fn complete_rows(table: &DataTable, names: &[&str]) -> Result<Vec<Vec<f64>>> {
    let columns = names
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>>>()?;
    Ok((0..table.row_count())
        .filter_map(|i| columns.iter().map(|col| col[i].as_f64()).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::Cell;

    // -----------------------------------------------------------------------
    // Simple regression tests
    // -----------------------------------------------------------------------

    #[test]
    fn simple_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let r = simple_linear_regression(&x, &y).expect("should compute");
        assert_eq!(format!("{:.4}", r.slope), "2.0000");
        assert_eq!(format!("{:.4}", r.intercept), "0.0000");
        assert_eq!(format!("{:.4}", r.coefficient_of_determination), "1.0000");
        assert_eq!(r.equation, "y = 2.0000x + 0.0000");
        assert!(r.standard_error.abs() < 1e-12);
    }

    #[test]
    fn simple_negative_intercept() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [-3.0, -1.0, 1.0, 3.0];
        let r = simple_linear_regression(&x, &y).expect("should compute");
        assert_eq!(r.equation, "y = 2.0000x - 3.0000");
        assert!((r.predict(10.0) - 17.0).abs() < 1e-12);
    }

    #[test]
    fn simple_with_noise() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.1, 7.9, 10.1];
        let r = simple_linear_regression(&x, &y).expect("should compute");
        // Sxy = 20, Sxx = 10, ȳ = 6.02
        assert!((r.slope - 2.0).abs() < 1e-10, "slope = {}", r.slope);
        assert!((r.intercept - 0.02).abs() < 1e-10, "b = {}", r.intercept);
        assert!(r.coefficient_of_determination > 0.99);
        assert!(r.standard_error > 0.0);
    }

    #[test]
    fn simple_degenerate_inputs() {
        assert!(matches!(
            simple_linear_regression(&[1.0, 2.0], &[1.0, 2.0]),
            Err(StatError::Input(_))
        ));
        assert!(matches!(
            simple_linear_regression(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]),
            Err(StatError::Computation(_))
        ));
        assert!(matches!(
            simple_linear_regression(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]),
            Err(StatError::Computation(_))
        ));
        assert!(simple_linear_regression(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
        assert!(simple_linear_regression(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]).is_err());
    }

    // -----------------------------------------------------------------------
    // Multiple regression tests
    // -----------------------------------------------------------------------

    #[test]
    fn multiple_recovers_exact_plane() {
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let x2 = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(&x2)
            .map(|(a, b)| 1.0 + 2.0 * a - 0.5 * b)
            .collect();
        let r = multiple_linear_regression(&[&x1, &x2], &y).expect("should compute");
        for (got, want) in r.coefficients.iter().zip([1.0, 2.0, -0.5]) {
            assert!((got - want).abs() < 1e-9, "β = {:?}", r.coefficients);
        }
        assert!((r.coefficient_of_determination - 1.0).abs() < 1e-9);
        assert_eq!(r.predictors, vec!["x1", "x2"]);
        let p = r.predict(&[10.0, 4.0]).expect("two values");
        assert!((p - 19.0).abs() < 1e-9);
        assert!(r.predict(&[1.0]).is_err());
    }

    #[test]
    fn multiple_matches_simple_with_one_predictor() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.1, 7.9, 10.1];
        let s = simple_linear_regression(&x, &y).expect("should compute");
        let m = multiple_linear_regression(&[&x], &y).expect("should compute");
        assert!((m.coefficients[0] - s.intercept).abs() < 1e-9);
        assert!((m.coefficients[1] - s.slope).abs() < 1e-9);
        assert!((m.coefficient_of_determination - s.coefficient_of_determination).abs() < 1e-9);
        assert!((m.standard_error - s.standard_error).abs() < 1e-9);
    }

    #[test]
    fn multiple_large_magnitude_predictors() {
        let x1: Vec<f64> = (0..12).map(|i| 1e5 + 10.0 * i as f64).collect();
        let x2 = [3.0, 7.0, 1.0, 8.0, 2.0, 9.0, 4.0, 6.0, 5.0, 10.0, 2.0, 7.0];
        let noise = [0.1, -0.2, 0.05, 0.0, -0.1, 0.15, -0.05, 0.1, -0.15, 0.2, 0.0, -0.1];
        let y: Vec<f64> = (0..12)
            .map(|i| 3.0 + 0.01 * x1[i] + x2[i] + noise[i])
            .collect();
        let r = multiple_linear_regression(&[&x1, &x2], &y).expect("should compute");
        assert!((r.coefficients[1] - 0.01).abs() < 1e-2, "β = {:?}", r.coefficients);
        assert!((r.coefficients[2] - 1.0).abs() < 0.1, "β = {:?}", r.coefficients);
        assert!(r.coefficient_of_determination > 0.99);
        let x2_mean = x2.iter().sum::<f64>() / 12.0;
        let at_mean = r.predict(&[100_055.0, x2_mean]).expect("two values");
        let y_mean = y.iter().sum::<f64>() / 12.0;
        assert!((at_mean - y_mean).abs() < 1e-6, "ŷ(x̄) = {at_mean}, ȳ = {y_mean}");
    }

    #[test]
    fn multiple_constant_predictor_is_singular() {
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = [7.0; 5];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];
        assert!(matches!(
            multiple_linear_regression(&[&x1, &x2], &y),
            Err(StatError::Computation(_))
        ));
    }

    #[test]
    fn multiple_collinear_is_computation_error() {
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = [2.0, 4.0, 6.0, 8.0, 10.0];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];
        assert!(matches!(
            multiple_linear_regression(&[&x1, &x2], &y),
            Err(StatError::Computation(_))
        ));
    }

    #[test]
    fn multiple_needs_residual_df() {
        let x1 = [1.0, 2.0, 3.0];
        let x2 = [3.0, 1.0, 2.0];
        let y = [1.0, 2.0, 4.0];
        assert!(matches!(
            multiple_linear_regression(&[&x1, &x2], &y),
            Err(StatError::Input(_))
        ));
        assert!(multiple_linear_regression(&[], &y).is_err());
    }

    #[test]
    fn regression_from_table_columns() {
        let rows = vec![
            vec![Cell::from(1.0), Cell::from(3.0)],
            vec![Cell::from(2.0), Cell::from(5.0)],
            vec![Cell::from("n/a"), Cell::from(100.0)],
            vec![Cell::from(3.0), Cell::from(7.0)],
            vec![Cell::from(4.0), Cell::Empty],
            vec![Cell::from(4.0), Cell::from(9.0)],
        ];
        let table = DataTable::new(vec!["dose".into(), "response".into()], rows);
        let s = simple_regression_by_columns(&table, "dose", "response").expect("should compute");
        assert_eq!(s.n, 4);
        assert_eq!(s.equation, "y = 2.0000x + 1.0000");

        let m = multiple_regression_by_columns(&table, &["dose"], "response")
            .expect("should compute");
        assert_eq!(m.equation, "y = 1.0000 + 2.0000*dose");
        assert!(simple_regression_by_columns(&table, "dose", "missing").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn r_squared_in_unit_interval(
            pts in proptest::collection::vec((-100_i32..100, -100_i32..100), 3..=30),
        ) {
            let x: Vec<f64> = pts.iter().map(|p| p.0 as f64).collect();
            let y: Vec<f64> = pts.iter().map(|p| p.1 as f64).collect();
            if let Ok(r) = simple_linear_regression(&x, &y) {
                let r2 = r.coefficient_of_determination;
                prop_assert!((-1e-9..=1.0 + 1e-9).contains(&r2), "R² = {}", r2);
                prop_assert!(r.standard_error >= 0.0);
            }
        }

        #[test]
        fn fit_passes_through_centroid(
            pts in proptest::collection::vec((-50_i32..50, -50_i32..50), 3..=20),
        ) {
            let x: Vec<f64> = pts.iter().map(|p| p.0 as f64).collect();
            let y: Vec<f64> = pts.iter().map(|p| p.1 as f64).collect();
            if let Ok(r) = simple_linear_regression(&x, &y) {
                let n = x.len() as f64;
                let (xm, ym) = (x.iter().sum::<f64>() / n, y.iter().sum::<f64>() / n);
                prop_assert!((r.predict(xm) - ym).abs() < 1e-8);
            }
        }
    }
}
