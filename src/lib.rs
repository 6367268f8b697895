//! # u-hypothesis
//!
//! Classical hypothesis tests and least-squares regression over numeric
//! samples.
//!
//! Every operation is a pure computation: samples and parameters in,
//! statistic, p-value and decision out. Distribution functions are reached
//! through the [`Distributions`](distribution::Distributions) trait, with
//! [`Numflow`](distribution::Numflow) as the default backend.
//!
//! ## Modules
//!
//! - [`descriptive`]: Mean, variance and standard deviation
//! - [`rank`]: Mid-ranks with tie averaging
//! - [`testing`]: t-tests, z-tests, sign, Wilcoxon, Mann-Whitney, KS normality
//! - [`anova`]: One-way and two-way (with interaction) ANOVA
//! - [`chi_square`]: Goodness-of-fit and independence tests
//! - [`regression`]: Simple and multiple linear regression
//! - [`factor`]: Tabular cells and factor-level grouping
//! - [`config`]: Significance level, alternatives and decisions
//!
//! ## Example
//!
//! ```
//! use u_hypothesis::config::TestConfig;
//! use u_hypothesis::distribution::Numflow;
//! use u_hypothesis::testing::one_sample_t_test;
//!
//! let sample = [5.1, 4.9, 5.3, 5.0, 5.2, 4.8];
//! let r = one_sample_t_test(&Numflow, &sample, 5.0, &TestConfig::default()).unwrap();
//! assert!(!r.significant);
//! ```
//!
//! The library emits `tracing` events but never installs a subscriber.

pub mod anova;
pub mod chi_square;
pub mod config;
pub mod descriptive;
pub mod distribution;
pub mod error;
pub mod factor;
pub mod rank;
pub mod regression;
pub mod testing;

pub use error::{Result, StatError};
