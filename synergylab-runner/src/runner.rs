//! Backtest runner: wires together strategy, synergy, sizing and metrics.
//!
//! One entry point, [`run_backtest`], executing a fixed linear pipeline:
//! generate → normalize → synergy annotation → Kelly re-sizing →
//! commentary → score. Each optional stage is switched by the config.
//! The caller's price and signal tables are only borrowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use synergylab_core::{
    normalize_trades, resize_trades, score_signals, InvalidTrade, PriceBar, SignalRow, Sizer,
    Strategy, StrategyError, Trade,
};

use crate::commentary;
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::metrics::{equity_curve, PerformanceMetrics};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("strategy '{name}' failed: {source}")]
    Strategy {
        name: String,
        source: StrategyError,
    },
    #[error("invalid strategy output: {0}")]
    InvalidTrade(#[from] InvalidTrade),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy_name: String,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
    pub equity_curve: Vec<f64>,
    /// Per-row synergy of the signal table; empty unless `synergy_enabled`.
    #[serde(default)]
    pub signal_synergy: Vec<f64>,
    pub config: BacktestConfig,
    pub timestamp: DateTime<Utc>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one backtest.
///
/// Returns early with an empty, zero-metric result when the strategy
/// produces no trades; no later stage runs in that case. Strategy faults
/// and malformed strategy output are returned as errors.
pub fn run_backtest(
    strategy: &dyn Strategy,
    prices: &[PriceBar],
    signals: &[SignalRow],
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let strategy_name = strategy.name().to_string();

    // Generate
    let candidates = strategy
        .generate_trades(prices, signals)
        .map_err(|source| RunError::Strategy {
            name: strategy_name.clone(),
            source,
        })?;
    tracing::debug!(strategy = %strategy_name, candidates = candidates.len(), "trades generated");

    if candidates.is_empty() {
        tracing::info!(strategy = %strategy_name, "no trades generated");
        return Ok(BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id,
            strategy_name,
            trades: Vec::new(),
            metrics: PerformanceMetrics::default(),
            equity_curve: vec![config.initial_capital],
            signal_synergy: Vec::new(),
            config: config.clone(),
            timestamp: Utc::now(),
        });
    }

    // Normalize
    let mut trades = normalize_trades(candidates)?;

    // Synergy annotation
    let signal_synergy = if config.synergy_enabled {
        let scores = score_signals(signals, config.synergy_map.as_ref());
        tracing::debug!(rows = scores.len(), "signal rows scored");
        scores
    } else {
        Vec::new()
    };

    // Kelly re-sizing
    if config.use_kelly {
        let sizer = config.kelly_sizer();
        tracing::debug!(
            sizer = sizer.name(),
            policy = ?config.capital_policy,
            scale = config.kelly_fraction,
            "re-sizing trades"
        );
        trades = resize_trades(
            trades,
            &sizer,
            config.initial_capital,
            config.capital_policy,
        );
    }

    // Commentary
    if config.commentary {
        trades = commentary::annotate(trades);
    }

    // Score
    let metrics = PerformanceMetrics::compute(&trades, config.initial_capital);
    let equity_curve = equity_curve(&trades, config.initial_capital);

    tracing::info!(
        strategy = %strategy_name,
        trades = metrics.num_trades,
        total_return = metrics.total_return,
        max_drawdown = metrics.max_drawdown,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy_name,
        trades,
        metrics,
        equity_curve,
        signal_synergy,
        config: config.clone(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use synergylab_core::{Side, TradeCandidate};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Returns a fixed list of candidates regardless of input.
    struct Fixed(Vec<TradeCandidate>);

    impl Strategy for Fixed {
        fn generate_trades(
            &self,
            _prices: &[PriceBar],
            _signals: &[SignalRow],
        ) -> Result<Vec<TradeCandidate>, StrategyError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "Fixed"
        }
    }

    struct Broken;

    impl Strategy for Broken {
        fn generate_trades(
            &self,
            _prices: &[PriceBar],
            _signals: &[SignalRow],
        ) -> Result<Vec<TradeCandidate>, StrategyError> {
            Err(StrategyError::Failed("indicator warmup exceeded data".into()))
        }
    }

    #[test]
    fn strategy_error_propagates_with_name() {
        let err = run_backtest(&Broken, &[], &[], &BacktestConfig::default()).unwrap_err();
        match err {
            RunError::Strategy { name, source } => {
                assert_eq!(name, "Unknown");
                assert_eq!(source.to_string(), "indicator warmup exceeded data");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = BacktestConfig {
            initial_capital: -1.0,
            ..BacktestConfig::default()
        };
        let err = run_backtest(&Fixed(Vec::new()), &[], &[], &config).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_candidate_is_rejected() {
        let bad = TradeCandidate::new(day(5), day(1), 10.0, 11.0, Side::Long);
        let err = run_backtest(&Fixed(vec![bad]), &[], &[], &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, RunError::InvalidTrade(InvalidTrade { index: 0, .. })));
    }

    #[test]
    fn result_carries_run_id_and_schema() {
        let c = TradeCandidate::new(day(1), day(2), 10.0, 11.0, Side::Long);
        let config = BacktestConfig::default();
        let result = run_backtest(&Fixed(vec![c]), &[], &[], &config).unwrap();
        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.run_id, config.run_id().unwrap());
        assert_eq!(result.strategy_name, "Fixed");
        assert_eq!(result.equity_curve, vec![100_000.0, 100_001.0]);
    }

    #[test]
    fn result_deserializes_without_schema_version() {
        let c = TradeCandidate::new(day(1), day(2), 10.0, 11.0, Side::Long);
        let result = run_backtest(&Fixed(vec![c]), &[], &[], &BacktestConfig::default()).unwrap();
        let mut json = serde_json::to_value(&result).unwrap();
        json.as_object_mut().unwrap().remove("schema_version");
        let back: BacktestResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.trades, result.trades);
    }
}
