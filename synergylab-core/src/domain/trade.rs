//! Trade: a completed round-trip position, and the raw candidate a strategy emits.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Profit of a round trip at the given prices and quantity.
    pub fn profit(self, entry_price: f64, exit_price: f64, quantity: f64) -> f64 {
        match self {
            Side::Long => (exit_price - entry_price) * quantity,
            Side::Short => (entry_price - exit_price) * quantity,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

/// A finalized trade: every optional column has been resolved.
///
/// `profit` is trusted as supplied until the Kelly sizer recomputes it from
/// prices and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    pub side: Side,
    pub quantity: f64,
    pub profit: f64,

    // ── Annotation ──
    pub synergy_score: f64,
    #[serde(default)]
    pub reason_codes: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,
}

impl Trade {
    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        let cost = self.entry_price * self.quantity;
        if cost == 0.0 || !cost.is_finite() {
            return 0.0;
        }
        self.profit / cost
    }

    /// Whole days between entry and exit.
    pub fn holding_days(&self) -> i64 {
        (self.exit_time - self.entry_time).num_days()
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}

/// Raw trade row as produced by a strategy.
///
/// Only the timing, prices and side are required; the rest is filled in by
/// [`crate::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub side: Side,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub profit: Option<f64>,
    #[serde(default)]
    pub synergy_score: Option<f64>,
    #[serde(default)]
    pub reason_codes: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,
}

impl TradeCandidate {
    /// Candidate with only the required columns set.
    pub fn new(
        entry_time: NaiveDateTime,
        exit_time: NaiveDateTime,
        entry_price: f64,
        exit_price: f64,
        side: Side,
    ) -> Self {
        Self {
            entry_time,
            exit_time,
            entry_price,
            exit_price,
            side,
            quantity: None,
            profit: None,
            synergy_score: None,
            reason_codes: None,
            commentary: None,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_profit(mut self, profit: f64) -> Self {
        self.profit = Some(profit);
        self
    }

    pub fn with_synergy(mut self, synergy_score: f64) -> Self {
        self.synergy_score = Some(synergy_score);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason_codes = Some(reason.into());
        self
    }
}
