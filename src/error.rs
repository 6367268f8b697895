//! Error types for u-hypothesis.

use thiserror::Error;

/// All errors produced by u-hypothesis operations.
///
/// Errors are raised at the point of detection and never accompany a
/// partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatError {
    /// Empty or too-short samples, mismatched lengths, non-finite elements,
    /// unknown columns, or an out-of-range significance level.
    #[error("invalid input: {0}")]
    Input(String),
    /// Unsupported alternative hypothesis, test kind, or column combination.
    #[error("unsupported option: {0}")]
    Domain(String),
    /// Degenerate numerical condition: zero variance, identical predictors,
    /// singular normal equations, or a non-finite result.
    #[error("computation failed: {0}")]
    Computation(String),
}

impl StatError {
    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    pub(crate) fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StatError>;

/// Fails with [`StatError::Input`] if the sample is empty or holds a
/// non-finite element.
pub(crate) fn ensure_finite(name: &str, data: &[f64]) -> Result<()> {
    if data.is_empty() {
        return Err(StatError::input(format!("{name} must not be empty")));
    }
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        return Err(StatError::input(format!(
            "{name} contains a non-finite value at index {pos}"
        )));
    }
    Ok(())
}

/// Fails with [`StatError::Input`] if the sample has fewer than `min`
/// observations.
pub(crate) fn ensure_len(name: &str, data: &[f64], min: usize) -> Result<()> {
    ensure_finite(name, data)?;
    if data.len() < min {
        return Err(StatError::input(format!(
            "{name} needs at least {min} observations, got {}",
            data.len()
        )));
    }
    Ok(())
}

/// Fails with [`StatError::Input`] unless both paired samples have the
/// same length.
pub(crate) fn ensure_paired(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(StatError::input(format!(
            "paired samples must have equal length, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Fails with [`StatError::Computation`] if any value is NaN or infinite.
pub(crate) fn ensure_finite_result(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(StatError::computation(format!("{what} is not finite")))
    }
}
