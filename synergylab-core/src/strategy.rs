//! Strategy contract: price and signal tables in, candidate trades out.
//!
//! The engine never inspects strategy internals. A strategy sees only the
//! tables it is handed; it cannot observe capital or sizing.

use thiserror::Error;

use crate::domain::{PriceBar, SignalRow, TradeCandidate};
use crate::rules::RuleError;

/// Strategy name used when a strategy does not report one.
pub const UNKNOWN_STRATEGY: &str = "Unknown";

/// Faults raised by a strategy. The runner propagates them unmodified.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("rule evaluation failed: {0}")]
    Rule(#[from] RuleError),
    #[error("{0}")]
    Failed(String),
}

/// Converts price + signal tables into a raw list of candidate trades.
///
/// An empty vector is a valid "no trades" outcome, not an error.
pub trait Strategy: Send + Sync {
    fn generate_trades(
        &self,
        prices: &[PriceBar],
        signals: &[SignalRow],
    ) -> Result<Vec<TradeCandidate>, StrategyError>;

    /// Identifier echoed into the result.
    fn name(&self) -> &str {
        UNKNOWN_STRATEGY
    }
}
