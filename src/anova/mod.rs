//! Analysis of variance.
//!
//! - [`one_way_anova`]: k independent groups, one F-test
//! - [`two_way_anova`]: a × b design with interaction, three F-tests
//!
//! Both have table-driven entry points ([`one_way_anova_by_factor`],
//! [`two_way_anova_by_factors`]) that group a value column by one or two
//! factor columns of a [`DataTable`](crate::factor::DataTable) first.
//!
//! # References
//!
//! - Fisher (1925). "Statistical Methods for Research Workers".
//! - Montgomery, D.C. (2017). *Design and Analysis of Experiments*, 9th ed.

mod one_way;
mod two_way;

pub use one_way::{one_way_anova, one_way_anova_by_factor, AnovaResult};
pub use two_way::{two_way_anova, two_way_anova_by_factors, EffectRow, TwoWayAnovaResult};
