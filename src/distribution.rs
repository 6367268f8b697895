//! Reference distribution functions.
//!
//! Every test takes its CDFs through the [`Distributions`] trait so the
//! numerics backend can be swapped, or replaced by a closed-form stub in
//! tests. [`Numflow`] is the default backend.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::distribution::{Distributions, Numflow};
//!
//! let d = Numflow;
//! assert!((d.normal_cdf(0.0, 0.0, 1.0) - 0.5).abs() < 1e-12);
//! assert!((d.student_t_cdf(0.0, 7.0) - 0.5).abs() < 1e-12);
//! ```

use u_numflow::special;

/// Cumulative distribution functions consumed by the test engine.
///
/// Implementations must return values in [0, 1] for valid parameters.
pub trait Distributions {
    /// CDF of N(mean, sd²) at `x`.
    fn normal_cdf(&self, x: f64, mean: f64, sd: f64) -> f64;

    /// CDF of Student's t with `df` degrees of freedom.
    fn student_t_cdf(&self, t: f64, df: f64) -> f64;

    /// CDF of the central F distribution with (`df1`, `df2`) degrees of freedom.
    fn f_cdf(&self, f: f64, df1: f64, df2: f64) -> f64;

    /// CDF of χ² with `df` degrees of freedom.
    fn chi_squared_cdf(&self, x: f64, df: f64) -> f64;

    /// Standard normal CDF.
    fn std_normal_cdf(&self, z: f64) -> f64 {
        self.normal_cdf(z, 0.0, 1.0)
    }
}

impl<D: Distributions + ?Sized> Distributions for &D {
    fn normal_cdf(&self, x: f64, mean: f64, sd: f64) -> f64 {
        (**self).normal_cdf(x, mean, sd)
    }

    fn student_t_cdf(&self, t: f64, df: f64) -> f64 {
        (**self).student_t_cdf(t, df)
    }

    fn f_cdf(&self, f: f64, df1: f64, df2: f64) -> f64 {
        (**self).f_cdf(f, df1, df2)
    }

    fn chi_squared_cdf(&self, x: f64, df: f64) -> f64 {
        (**self).chi_squared_cdf(x, df)
    }
}

/// Distribution functions backed by `u_numflow::special`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Numflow;

impl Distributions for Numflow {
    fn normal_cdf(&self, x: f64, mean: f64, sd: f64) -> f64 {
        special::standard_normal_cdf((x - mean) / sd)
    }

    fn student_t_cdf(&self, t: f64, df: f64) -> f64 {
        special::t_distribution_cdf(t, df)
    }

    fn f_cdf(&self, f: f64, df1: f64, df2: f64) -> f64 {
        if f <= 0.0 {
            return 0.0;
        }
        special::f_distribution_cdf(f, df1, df2)
    }

    fn chi_squared_cdf(&self, x: f64, df: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        special::chi_squared_cdf(x, df)
    }
}
