//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: trade list and/or equity curve in,
//! scalar out. Trades are taken in input order; nothing here re-sorts them.

use serde::{Deserialize, Serialize};
use synergylab_core::Trade;

/// Cap for profit factor when there are no losing trades.
const PROFIT_FACTOR_CAP: f64 = 100.0;
/// Annualization factor for the per-trade Sharpe ratio.
const PERIODS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
///
/// `Default` is the all-zero record returned for an empty trade list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub win_rate: f64,
    pub avg_profit: f64,
    /// Largest peak-to-trough decline as a non-negative fraction of the peak.
    pub max_drawdown: f64,
    pub num_trades: usize,
    pub avg_synergy: f64,
    pub profit_factor: f64,
    pub sharpe: f64,
    pub avg_holding_days: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a finalized trade list.
    pub fn compute(trades: &[Trade], initial_capital: f64) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let curve = equity_curve(trades, initial_capital);
        Self {
            total_return: total_return(trades, initial_capital),
            win_rate: win_rate(trades),
            avg_profit: avg_profit(trades),
            max_drawdown: max_drawdown(&curve),
            num_trades: trades.len(),
            avg_synergy: avg_synergy(trades),
            profit_factor: profit_factor(trades),
            sharpe: sharpe_ratio(trades),
            avg_holding_days: avg_holding_days(trades),
        }
    }
}

/// Free-function form of [`PerformanceMetrics::compute`].
pub fn compute_metrics(trades: &[Trade], initial_capital: f64) -> PerformanceMetrics {
    PerformanceMetrics::compute(trades, initial_capital)
}

// ─── Equity curve ───────────────────────────────────────────────────

/// Account value after each trade, starting at `initial_capital`.
///
/// Always `trades.len() + 1` points.
pub fn equity_curve(trades: &[Trade], initial_capital: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(initial_capital);
    let mut equity = initial_capital;
    for trade in trades {
        equity += trade.profit;
        curve.push(equity);
    }
    curve
}

// ─── Individual metric functions ────────────────────────────────────

/// Total profit as a fraction of initial capital.
///
/// Returns 0.0 when `initial_capital` is not positive.
pub fn total_return(trades: &[Trade], initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    total_pnl(trades) / initial_capital
}

pub fn total_pnl(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.profit).sum()
}

/// Win rate: fraction of trades with strictly positive profit.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

pub fn avg_profit(trades: &[Trade]) -> f64 {
    let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();
    mean_f64(&profits)
}

pub fn avg_synergy(trades: &[Trade]) -> f64 {
    let scores: Vec<f64> = trades.iter().map(|t| t.synergy_score).collect();
    mean_f64(&scores)
}

/// Maximum drawdown as a non-negative fraction (e.g., 0.15 = 15% drawdown).
///
/// Measured against the running peak. Points where the peak is not
/// positive contribute 0. Returns 0.0 for a non-decreasing curve.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit > 0.0)
        .map(|t| t.profit)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit < 0.0)
        .map(|t| t.profit.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

/// Annualized Sharpe ratio over per-trade returns.
///
/// Sharpe = mean(return_pct) / std(return_pct) * sqrt(252), population std.
/// Returns 0.0 if variance is zero or fewer than 2 trades.
pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = trades.iter().map(|t| t.return_pct()).collect();
    let std = population_std(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Mean holding period in whole days.
pub fn avg_holding_days(trades: &[Trade]) -> f64 {
    let days: Vec<f64> = trades.iter().map(|t| t.holding_days() as f64).collect();
    mean_f64(&days)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
