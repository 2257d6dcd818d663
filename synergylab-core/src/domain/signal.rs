//! Signal rows: auxiliary flag/indicator data aligned by time.
//!
//! Columns are dynamic: a row carries whatever the upstream signal source
//! produced. Consumers resolve absent columns to neutral values instead of
//! failing.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single cell of signal data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl SignalValue {
    /// Numeric coercion: flags become 1/0; non-finite numbers and unparsable
    /// text become 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Flag(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            SignalValue::Number(n) if !n.is_finite() => 0.0,
            SignalValue::Number(n) => *n,
            SignalValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            SignalValue::Flag(b) => *b,
            SignalValue::Number(n) => *n != 0.0 && n.is_finite(),
            SignalValue::Text(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }

    /// Text view used by equality rules.
    pub fn as_text(&self) -> String {
        match self {
            SignalValue::Flag(b) => b.to_string(),
            SignalValue::Number(n) => n.to_string(),
            SignalValue::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for SignalValue {
    fn from(b: bool) -> Self {
        SignalValue::Flag(b)
    }
}

impl From<f64> for SignalValue {
    fn from(n: f64) -> Self {
        SignalValue::Number(n)
    }
}

impl From<&str> for SignalValue {
    fn from(s: &str) -> Self {
        SignalValue::Text(s.to_string())
    }
}

/// One row of the signal table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    #[serde(default)]
    pub time: Option<NaiveDateTime>,
    #[serde(default)]
    pub columns: BTreeMap<String, SignalValue>,
}

impl SignalRow {
    pub fn new(time: Option<NaiveDateTime>) -> Self {
        Self {
            time,
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SignalValue>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SignalValue>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&SignalValue> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Present and truthy.
    pub fn is_set(&self, column: &str) -> bool {
        self.get(column).is_some_and(SignalValue::is_truthy)
    }
}

/// A long-form signal event: "signal X fired at time T".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub time: NaiveDateTime,
    pub signal: String,
}

/// Pivot long-form events into one row per timestamp.
///
/// Every distinct signal name becomes a flag column on every row: `true`
/// where the signal fired at that time, `false` elsewhere. Rows come out in
/// time order.
pub fn pivot_signal_events(events: &[SignalEvent]) -> Vec<SignalRow> {
    let names: BTreeSet<&str> = events.iter().map(|e| e.signal.as_str()).collect();

    let mut by_time: BTreeMap<NaiveDateTime, SignalRow> = BTreeMap::new();
    for event in events {
        let row = by_time.entry(event.time).or_insert_with(|| {
            let mut row = SignalRow::new(Some(event.time));
            for name in &names {
                row.insert(*name, false);
            }
            row
        });
        row.insert(event.signal.as_str(), true);
    }

    by_time.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(SignalValue::Flag(true).as_f64(), 1.0);
        assert_eq!(SignalValue::Flag(false).as_f64(), 0.0);
        assert_eq!(SignalValue::Number(2.5).as_f64(), 2.5);
        assert_eq!(SignalValue::Number(f64::NAN).as_f64(), 0.0);
        assert_eq!(SignalValue::Text(" 1.5 ".into()).as_f64(), 1.5);
        assert_eq!(SignalValue::Text("buy".into()).as_f64(), 0.0);
    }

    #[test]
    fn infinite_values_coerce_to_zero() {
        assert_eq!(SignalValue::Number(f64::INFINITY).as_f64(), 0.0);
        assert_eq!(SignalValue::Number(f64::NEG_INFINITY).as_f64(), 0.0);
        assert_eq!(SignalValue::Text("inf".into()).as_f64(), 0.0);
        assert_eq!(SignalValue::Text("-Infinity".into()).as_f64(), 0.0);
        assert!(!SignalValue::Number(f64::INFINITY).is_truthy());
    }

    #[test]
    fn truthiness() {
        assert!(SignalValue::Flag(true).is_truthy());
        assert!(!SignalValue::Number(0.0).is_truthy());
        assert!(!SignalValue::Number(f64::NAN).is_truthy());
        assert!(SignalValue::Number(-1.0).is_truthy());
        assert!(SignalValue::Text("Perfection9Up".into()).is_truthy());
        assert!(!SignalValue::Text("False".into()).is_truthy());
        assert!(!SignalValue::Text("".into()).is_truthy());
    }

    #[test]
    fn untagged_json_values() {
        let row: SignalRow = serde_json::from_str(
            r#"{"columns": {"demark_signal": true, "rsi": 41.5, "signal": "C13Up"}}"#,
        )
        .unwrap();
        assert_eq!(row.get("demark_signal"), Some(&SignalValue::Flag(true)));
        assert_eq!(row.get("rsi"), Some(&SignalValue::Number(41.5)));
        assert_eq!(row.get("signal"), Some(&SignalValue::Text("C13Up".into())));
        assert!(row.time.is_none());
    }

    #[test]
    fn pivot_fills_absent_signals_with_false() {
        let events = vec![
            SignalEvent { time: day(2), signal: "C13Up".into() },
            SignalEvent { time: day(1), signal: "Perfection9Up".into() },
            SignalEvent { time: day(2), signal: "Perfection9Up".into() },
        ];
        let rows = pivot_signal_events(&events);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, Some(day(1)));
        assert!(rows[0].is_set("Perfection9Up"));
        assert!(rows[0].contains("C13Up"));
        assert!(!rows[0].is_set("C13Up"));
        assert!(rows[1].is_set("C13Up"));
        assert!(rows[1].is_set("Perfection9Up"));
    }

    #[test]
    fn pivot_empty() {
        assert!(pivot_signal_events(&[]).is_empty());
    }
}
