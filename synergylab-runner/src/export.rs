//! Result export: JSON, CSV, and a plain-text summary.
//!
//! Provides the persisted forms of a backtest result:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade tape and equity curve for external analysis tools
//! - **Text**: the summary table printed by the CLI
//!
//! Persisted JSON carries a `schema_version` field. Newer versions are
//! rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use synergylab_core::Trade;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: entry_time, entry_price, exit_time, exit_price, side, quantity,
/// profit, return_pct, synergy_score, reason_codes, commentary
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "side",
        "quantity",
        "profit",
        "return_pct",
        "synergy_score",
        "reason_codes",
        "commentary",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.entry_time.format(TIME_FORMAT).to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_time.format(TIME_FORMAT).to_string(),
            &format!("{:.6}", t.exit_price),
            &t.side.to_string(),
            &format!("{:.6}", t.quantity),
            &format!("{:.2}", t.profit),
            &format!("{:.6}", t.return_pct()),
            &format!("{:.4}", t.synergy_score),
            t.reason_codes.as_deref().unwrap_or(""),
            t.commentary.as_deref().unwrap_or(""),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export an equity curve as CSV with trade_index and equity columns.
///
/// Index 0 is the initial capital; index `i` is the equity after trade `i`.
pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade_index", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.2}", eq)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── File writers ───────────────────────────────────────────────────

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    let csv = export_trades_csv(trades)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_equity_csv(path: &Path, equity_curve: &[f64]) -> Result<()> {
    let csv = export_equity_csv(equity_curve)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_result_json(path: &Path, result: &BacktestResult) -> Result<()> {
    let json = export_json(result)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{strategy}_{run_id prefix}/` under
/// `output_dir` containing:
/// - `result.json`: the full `BacktestResult`
/// - `trades.csv`: finalized trade tape
/// - `equity.csv`: per-trade equity curve
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        sanitize(&result.strategy_name),
        short_run_id(&result.run_id)
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_result_json(&run_dir.join("result.json"), result)?;
    write_trades_csv(&run_dir.join("trades.csv"), &result.trades)?;
    write_equity_csv(&run_dir.join("equity.csv"), &result.equity_curve)?;

    tracing::info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Display prefix of a run id: the first 12 characters.
///
/// Counts chars, not bytes; ids read back from `result.json` are not
/// guaranteed to be hex.
pub fn short_run_id(run_id: &str) -> String {
    run_id.chars().take(12).collect()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

// ─── Summary ────────────────────────────────────────────────────────

/// Render the metric summary shown after a run.
pub fn summary_table(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::with_capacity(512);

    let rows: [(&str, String); 10] = [
        ("Strategy", result.strategy_name.clone()),
        ("Trades", m.num_trades.to_string()),
        ("Total Return", format!("{:.2}%", m.total_return * 100.0)),
        ("Win Rate", format!("{:.1}%", m.win_rate * 100.0)),
        ("Avg Profit", format!("{:.2}", m.avg_profit)),
        ("Max Drawdown", format!("{:.2}%", m.max_drawdown * 100.0)),
        ("Profit Factor", format!("{:.2}", m.profit_factor)),
        ("Sharpe", format!("{:.3}", m.sharpe)),
        ("Avg Synergy", format!("{:.2}", m.avg_synergy)),
        ("Avg Holding", format!("{:.1} days", m.avg_holding_days)),
    ];

    for (label, value) in rows {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{label:<16}{value:>16}");
    }
    out
}
