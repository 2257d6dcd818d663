//! Synergy scoring: how strongly independent signals agree on one row.
//!
//! Pure functions: signal row (and optional weight map) in, scalar out.
//! Absent columns contribute zero; they never fail the score.

use std::collections::BTreeMap;

use crate::domain::SignalRow;

/// Flag columns counted by the unweighted policy, 1.0 each.
pub const DEFAULT_SYNERGY_COLUMNS: [&str; 3] = ["demark_signal", "pivot_signal", "valuation_signal"];

/// Column name → weight.
pub type SynergyMap = BTreeMap<String, f64>;

/// Score one row.
///
/// Without a map, counts the truthy [`DEFAULT_SYNERGY_COLUMNS`]. With a map,
/// sums `weight * numeric(value)` over the mapped columns present in the
/// row; mapped columns missing from the row are skipped with a warning.
/// A weighted sum that overflows to a non-finite value scores 0.
pub fn synergy_score(row: &SignalRow, synergy_map: Option<&SynergyMap>) -> f64 {
    match synergy_map {
        None => DEFAULT_SYNERGY_COLUMNS
            .iter()
            .filter(|col| row.is_set(col))
            .count() as f64,
        Some(map) => {
            let mut score = 0.0;
            for (column, weight) in map {
                match row.get(column) {
                    Some(value) => score += weight * value.as_f64(),
                    None => {
                        tracing::warn!(column = %column, "synergy column missing from signal row; treating as 0");
                    }
                }
            }
            if score.is_finite() {
                score
            } else {
                tracing::warn!(score, "weighted synergy overflowed; treating as 0");
                0.0
            }
        }
    }
}

/// Score every row of a signal table, in order.
pub fn score_signals(rows: &[SignalRow], synergy_map: Option<&SynergyMap>) -> Vec<f64> {
    rows.iter().map(|row| synergy_score(row, synergy_map)).collect()
}
