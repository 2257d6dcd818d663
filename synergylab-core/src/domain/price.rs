//! PriceBar: one OHLCV row of the price table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for the simulated symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PriceBar {
    /// Index of the first bar at or after `time`, if any.
    ///
    /// Assumes `bars` is sorted by time.
    pub fn first_at_or_after(bars: &[PriceBar], time: NaiveDateTime) -> Option<usize> {
        let idx = bars.partition_point(|b| b.time < time);
        (idx < bars.len()).then_some(idx)
    }
}
