//! SynergyLab Core: domain types, trade normalization, synergy scoring, Kelly sizing.
//!
//! This crate contains the pure building blocks of the backtest engine:
//! - Domain types (trades, trade candidates, signal rows, price bars)
//! - Trade normalization with a single default policy
//! - Synergy scorer (default flag count or weighted column map)
//! - Fractional Kelly sizer and the capital fold that re-sizes trades
//! - Strategy contract, rule engine and a rule-driven reference strategy

pub mod domain;
pub mod normalize;
pub mod rules;
pub mod sizers;
pub mod strategy;
pub mod synergy;

pub use domain::{
    pivot_signal_events, PriceBar, Side, SignalEvent, SignalRow, SignalValue, Trade,
    TradeCandidate,
};
pub use normalize::{normalize_trade, normalize_trades, InvalidTrade, NormalizeError};
pub use rules::{CompareOp, Condition, Operand, Rule, RuleError, RuleStrategy};
pub use sizers::{
    estimate_win_probability, kelly_fraction, resize_trades, CapitalPolicy, KellySizer, Sizer,
};
pub use strategy::{Strategy, StrategyError, UNKNOWN_STRATEGY};
pub use synergy::{score_signals, synergy_score, SynergyMap, DEFAULT_SYNERGY_COLUMNS};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core types are Send + Sync.
    ///
    /// Callers run independent backtests on their own threads; if any type
    /// fails this check, the build breaks immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<Trade>();
        require_sync::<Trade>();
        require_send::<TradeCandidate>();
        require_sync::<TradeCandidate>();
        require_send::<SignalRow>();
        require_sync::<SignalRow>();
        require_send::<PriceBar>();
        require_sync::<PriceBar>();

        // Components
        require_send::<KellySizer>();
        require_sync::<KellySizer>();
        require_send::<RuleStrategy>();
        require_sync::<RuleStrategy>();
        require_send::<Rule>();
        require_sync::<Rule>();

        // Errors
        require_send::<StrategyError>();
        require_sync::<StrategyError>();
        require_send::<InvalidTrade>();
        require_sync::<InvalidTrade>();
    }

    /// Architecture contract: Strategy does NOT see capital or sizing.
    ///
    /// `generate_trades()` takes only the price and signal tables. If someone
    /// adds a capital parameter, the trait changes and this breaks loudly.
    #[test]
    fn strategy_trait_has_no_capital_parameter() {
        fn _check_trait_object_builds(
            strategy: &dyn Strategy,
            prices: &[PriceBar],
            signals: &[SignalRow],
        ) -> Result<Vec<TradeCandidate>, StrategyError> {
            strategy.generate_trades(prices, signals)
        }
    }
}
