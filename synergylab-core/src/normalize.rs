//! Trade normalization: resolves strategy output into finalized trades.
//!
//! Runs once per backtest, before synergy, sizing and metrics. Every
//! optional column is resolved here with a single default policy:
//!
//! | column          | when absent                                        |
//! |-----------------|----------------------------------------------------|
//! | `quantity`      | [`DEFAULT_QUANTITY`]                               |
//! | `profit`        | `(exit - entry) * quantity`, negated for shorts    |
//! | `synergy_score` | [`DEFAULT_SYNERGY`]                                |
//! | `reason_codes`  | `None`                                             |
//! | `commentary`    | `None`                                             |
//!
//! Candidates that cannot describe a real trade (non-finite numbers,
//! negative quantity, exit before entry) are rejected. Non-positive prices
//! are accepted; sizing degrades them to zero quantity downstream.
//!
//! Validation runs before sizing and checks every supplied column. A bad
//! `quantity` or `profit` rejects the run even when Kelly sizing would
//! later overwrite both.

use thiserror::Error;

use crate::domain::{Trade, TradeCandidate};

pub const DEFAULT_QUANTITY: f64 = 1.0;
pub const DEFAULT_SYNERGY: f64 = 0.0;

/// Why a single candidate was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("quantity must be non-negative, got {0}")]
    NegativeQuantity(f64),
    #[error("exit time {exit} precedes entry time {entry}")]
    ExitBeforeEntry {
        entry: chrono::NaiveDateTime,
        exit: chrono::NaiveDateTime,
    },
}

/// A rejected candidate and its position in the strategy output.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("trade #{index}: {source}")]
pub struct InvalidTrade {
    pub index: usize,
    pub source: NormalizeError,
}

fn finite(field: &'static str, value: f64) -> Result<f64, NormalizeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NormalizeError::NonFinite { field, value })
    }
}

/// Resolve one candidate into a [`Trade`].
pub fn normalize_trade(candidate: TradeCandidate) -> Result<Trade, NormalizeError> {
    let entry_price = finite("entry_price", candidate.entry_price)?;
    let exit_price = finite("exit_price", candidate.exit_price)?;

    if candidate.exit_time < candidate.entry_time {
        return Err(NormalizeError::ExitBeforeEntry {
            entry: candidate.entry_time,
            exit: candidate.exit_time,
        });
    }

    let quantity = finite("quantity", candidate.quantity.unwrap_or(DEFAULT_QUANTITY))?;
    if quantity < 0.0 {
        return Err(NormalizeError::NegativeQuantity(quantity));
    }

    let profit = match candidate.profit {
        Some(p) => finite("profit", p)?,
        None => candidate.side.profit(entry_price, exit_price, quantity),
    };
    let synergy_score = finite(
        "synergy_score",
        candidate.synergy_score.unwrap_or(DEFAULT_SYNERGY),
    )?;

    Ok(Trade {
        entry_time: candidate.entry_time,
        entry_price,
        exit_time: candidate.exit_time,
        exit_price,
        side: candidate.side,
        quantity,
        profit,
        synergy_score,
        reason_codes: candidate.reason_codes,
        commentary: candidate.commentary,
    })
}

/// Resolve a whole strategy output, preserving order.
///
/// Stops at the first rejected candidate.
pub fn normalize_trades(candidates: Vec<TradeCandidate>) -> Result<Vec<Trade>, InvalidTrade> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(index, c)| normalize_trade(c).map_err(|source| InvalidTrade { index, source }))
        .collect()
}
