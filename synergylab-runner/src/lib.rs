//! SynergyLab Runner: backtest orchestration, metrics, config, and I/O.
//!
//! This crate builds on `synergylab-core` to provide:
//! - Single-backtest orchestrator (generate, normalize, annotate, size, score)
//! - Performance metrics and equity curve
//! - TOML configuration with content-addressed run ids
//! - CSV loaders for price and signal tables
//! - JSON/CSV result export

pub mod commentary;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{
    load_prices_csv, load_signal_events_csv, load_signals_csv, parse_timestamp, LoadError,
};
pub use export::{
    export_equity_csv, export_json, export_trades_csv, import_json, load_artifacts,
    save_artifacts, short_run_id, summary_table, write_equity_csv, write_result_json,
    write_trades_csv,
};
pub use metrics::{compute_metrics, equity_curve, PerformanceMetrics};
pub use runner::{run_backtest, BacktestResult, RunError, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
