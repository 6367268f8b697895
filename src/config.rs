//! Test configuration: significance level, alternative hypothesis, and the
//! decision rule derived from them.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::config::{Alternative, TestConfig};
//!
//! let alt: Alternative = "greater".parse().unwrap();
//! let cfg = TestConfig::new(0.01, alt).unwrap();
//! assert_eq!(cfg.alternative, Alternative::Greater);
//! assert!("both".parse::<Alternative>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatError};

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Alternative hypothesis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alternative {
    /// H₁: parameter ≠ hypothesised value.
    #[default]
    #[serde(rename = "two-tailed")]
    TwoTailed,
    /// H₁: parameter > hypothesised value.
    #[serde(rename = "greater")]
    Greater,
    /// H₁: parameter < hypothesised value.
    #[serde(rename = "less")]
    Less,
}

impl Alternative {
    /// p-value of `stat` under a symmetric reference distribution whose CDF
    /// is `cdf`.
    ///
    /// two-tailed = 2·(1 − F(|stat|)), greater = 1 − F(stat), less = F(stat).
    pub fn p_value(self, stat: f64, cdf: impl Fn(f64) -> f64) -> f64 {
        let p = match self {
            Self::TwoTailed => 2.0 * (1.0 - cdf(stat.abs())),
            Self::Greater => 1.0 - cdf(stat),
            Self::Less => cdf(stat),
        };
        p.clamp(0.0, 1.0)
    }

    /// Wire name of the selector.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoTailed => "two-tailed",
            Self::Greater => "greater",
            Self::Less => "less",
        }
    }
}

impl FromStr for Alternative {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "two-tailed" => Ok(Self::TwoTailed),
            "greater" => Ok(Self::Greater),
            "less" => Ok(Self::Less),
            other => Err(StatError::domain(format!(
                "invalid alternative '{other}', expected two-tailed, greater or less"
            ))),
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing a p-value with α.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// p < α.
    Reject,
    /// p ≥ α.
    FailToReject,
}

impl Decision {
    /// Rejects the null hypothesis iff `p_value < alpha`.
    pub fn from_p(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Self::Reject
        } else {
            Self::FailToReject
        }
    }

    /// `true` for [`Decision::Reject`].
    pub fn is_reject(self) -> bool {
        matches!(self, Self::Reject)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("Reject the null hypothesis"),
            Self::FailToReject => f.write_str("Fail to reject the null hypothesis"),
        }
    }
}

/// Significance level and alternative for a single test invocation.
///
/// Deserializes from a request body with both fields optional:
///
/// ```
/// use u_hypothesis::config::{Alternative, TestConfig};
///
/// let cfg: TestConfig = serde_json::from_str(r#"{"alternative": "less"}"#).unwrap();
/// assert_eq!(cfg.alpha, 0.05);
/// assert_eq!(cfg.alternative, Alternative::Less);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Significance level α in (0, 1).
    pub alpha: f64,
    /// Alternative hypothesis.
    pub alternative: Alternative,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            alternative: Alternative::TwoTailed,
        }
    }
}

impl TestConfig {
    /// Creates a validated configuration.
    pub fn new(alpha: f64, alternative: Alternative) -> Result<Self> {
        let cfg = Self { alpha, alternative };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Two-tailed configuration at the given α.
    pub fn with_alpha(alpha: f64) -> Result<Self> {
        Self::new(alpha, Alternative::TwoTailed)
    }

    /// Fails with [`StatError::Input`] unless α lies strictly within (0, 1).
    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)
    }

    /// Decision for `p_value` at this configuration's α.
    pub fn decide(&self, p_value: f64) -> Decision {
        Decision::from_p(p_value, self.alpha)
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(StatError::input(format!(
            "significance level must lie in (0, 1), got {alpha}"
        )))
    }
}
