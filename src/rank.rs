//! Mid-rank assignment shared by the rank-based tests.
//!
//! Tied values receive the average of the 1-based ranks they would occupy
//! if they were distinct, so `[1, 1, 2, 3, 3, 3]` ranks as
//! `[1.5, 1.5, 3, 5, 5, 5]`.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::rank::mid_ranks;
//!
//! let r = mid_ranks(&[3.0, 1.0, 3.0, 2.0]);
//! assert_eq!(r, vec![3.5, 1.0, 3.5, 2.0]);
//! ```

use std::cmp::Ordering;

/// Ranks `values` in place order, averaging ranks over ties.
///
/// The output is parallel to the input: `ranks[i]` is the rank of
/// `values[i]`. Values are compared exactly; callers are expected to pass
/// finite numbers.
pub fn mid_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    for (start, end) in tie_runs(values, &order) {
        // Positions start..end are tied; average rank = (start+1 + end) / 2
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
    }
    ranks
}

// Half-open runs of equal values over the sorted order.
fn tie_runs(values: &[f64], order: &[usize]) -> Vec<(usize, usize)> {
    let n = order.len();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        runs.push((i, j));
        i = j;
    }
    runs
}
