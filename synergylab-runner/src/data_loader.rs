//! CSV loading for price and signal tables.
//!
//! The engine itself does no I/O; these loaders exist for the CLI and for
//! callers that keep their tables on disk. Every loader returns its rows in
//! time order.
//!
//! Accepted timestamp formats: `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
//! (optionally with fractional seconds) and plain `YYYY-MM-DD` (midnight).

use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use thiserror::Error;

use synergylab_core::{pivot_signal_events, PriceBar, SignalEvent, SignalRow, SignalValue};

/// Column holding the row timestamp in every table.
pub const TIME_COLUMN: &str = "datetime";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("{path} line {line}: invalid timestamp '{value}'")]
    BadTimestamp {
        path: String,
        line: usize,
        value: String,
    },

    #[error("{path} line {line}: column '{column}' has non-numeric or non-finite value '{value}'")]
    BadNumber {
        path: String,
        line: usize,
        column: String,
        value: String,
    },
}

/// Parse a timestamp cell in any accepted format.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Interpret a signal cell. Empty cells are absent; `inf`/`NaN` spellings
/// stay text so they coerce to 0.
pub fn parse_signal_value(value: &str) -> Option<SignalValue> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.eq_ignore_ascii_case("true") {
        return Some(SignalValue::Flag(true));
    }
    if value.eq_ignore_ascii_case("false") {
        return Some(SignalValue::Flag(false));
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(SignalValue::Number(n)),
        _ => Some(SignalValue::Text(value.to_string())),
    }
}

struct Table {
    path: String,
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self, LoadError> {
        let display = path.display().to_string();
        let csv_err = |source| LoadError::Csv {
            path: display.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;
        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;
        Ok(Self {
            path: display,
            headers,
            records,
        })
    }

    fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| LoadError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// 1-based file line of a record (the header is line 1).
    fn line(idx: usize) -> usize {
        idx + 2
    }

    fn timestamp(&self, idx: usize, col: usize) -> Result<NaiveDateTime, LoadError> {
        let value = self.records[idx].get(col).unwrap_or("");
        parse_timestamp(value).ok_or_else(|| LoadError::BadTimestamp {
            path: self.path.clone(),
            line: Self::line(idx),
            value: value.to_string(),
        })
    }

    /// Finite number cell; `inf` and `NaN` are rejected like any bad cell.
    fn number(&self, idx: usize, col: usize) -> Result<f64, LoadError> {
        let value = self.records[idx].get(col).unwrap_or("");
        let parsed = value.parse::<f64>().ok().filter(|n| n.is_finite());
        parsed.ok_or_else(|| LoadError::BadNumber {
            path: self.path.clone(),
            line: Self::line(idx),
            column: self.headers[col].clone(),
            value: value.to_string(),
        })
    }
}

/// Load an OHLCV price table.
///
/// Required columns: `datetime, open, high, low, close`; `volume` is
/// optional (0 when absent). Rows are sorted by time; for duplicate
/// timestamps the last row in the file wins.
pub fn load_prices_csv(path: &Path) -> Result<Vec<PriceBar>, LoadError> {
    let table = Table::read(path)?;
    let time_col = table.column(TIME_COLUMN)?;
    let open_col = table.column("open")?;
    let high_col = table.column("high")?;
    let low_col = table.column("low")?;
    let close_col = table.column("close")?;
    let volume_col = table.column("volume").ok();

    let mut bars = Vec::with_capacity(table.records.len());
    for idx in 0..table.records.len() {
        bars.push(PriceBar {
            time: table.timestamp(idx, time_col)?,
            open: table.number(idx, open_col)?,
            high: table.number(idx, high_col)?,
            low: table.number(idx, low_col)?,
            close: table.number(idx, close_col)?,
            volume: match volume_col {
                Some(col) => table.number(idx, col)?,
                None => 0.0,
            },
        });
    }

    bars.sort_by_key(|b| b.time);
    let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => deduped.push(bar),
        }
    }

    tracing::debug!(path = %table.path, bars = deduped.len(), "loaded prices");
    Ok(deduped)
}

/// Load a wide signal table: one row per timestamp, one column per signal.
///
/// Every column other than `datetime` becomes a signal column. Cells are
/// read as flags (`true`/`false`), numbers, or text; empty cells are left
/// out of the row.
pub fn load_signals_csv(path: &Path) -> Result<Vec<SignalRow>, LoadError> {
    let table = Table::read(path)?;
    let time_col = table.column(TIME_COLUMN)?;

    let mut rows = Vec::with_capacity(table.records.len());
    for (idx, record) in table.records.iter().enumerate() {
        let mut row = SignalRow::new(Some(table.timestamp(idx, time_col)?));
        for (col, cell) in record.iter().enumerate() {
            if col == time_col {
                continue;
            }
            if let (Some(name), Some(value)) = (table.headers.get(col), parse_signal_value(cell)) {
                row.insert(name.as_str(), value);
            }
        }
        rows.push(row);
    }

    rows.sort_by_key(|r| r.time);
    tracing::debug!(path = %table.path, rows = rows.len(), "loaded signals");
    Ok(rows)
}

/// Load a long-form signal event table (`datetime, signal`, plus any
/// ignored extra columns) and pivot it into one flag row per timestamp.
pub fn load_signal_events_csv(path: &Path) -> Result<Vec<SignalRow>, LoadError> {
    let table = Table::read(path)?;
    let time_col = table.column(TIME_COLUMN)?;
    let signal_col = table.column("signal")?;

    let mut events = Vec::with_capacity(table.records.len());
    for (idx, record) in table.records.iter().enumerate() {
        let signal = record.get(signal_col).unwrap_or("").trim();
        if signal.is_empty() {
            tracing::warn!(path = %table.path, line = Table::line(idx), "empty signal name; skipping event");
            continue;
        }
        events.push(SignalEvent {
            time: table.timestamp(idx, time_col)?,
            signal: signal.to_string(),
        });
    }

    let rows = pivot_signal_events(&events);
    tracing::debug!(path = %table.path, events = events.len(), rows = rows.len(), "loaded signal events");
    Ok(rows)
}
