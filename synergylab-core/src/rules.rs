//! Rule engine and the rule-driven reference strategy.
//!
//! A rule is an AND of column conditions evaluated against one signal row,
//! e.g. `signal == "Perfection9Up"` and `rsi < 60`. [`RuleStrategy`] enters
//! wherever its rule matches and holds for a fixed number of price bars.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{PriceBar, Side, SignalRow, TradeCandidate};
use crate::strategy::{Strategy, StrategyError};
use crate::synergy::{synergy_score, SynergyMap};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("operator {op} cannot compare column '{column}' against text")]
    TextOrdering { column: String, op: CompareOp },
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        };
        f.write_str(s)
    }
}

impl FromStr for CompareOp {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Text(String),
}

/// `column op value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: Operand,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: CompareOp, value: Operand) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn evaluate(&self, row: &SignalRow) -> Result<bool, RuleError> {
        let cell = row
            .get(&self.column)
            .ok_or_else(|| RuleError::MissingColumn(self.column.clone()))?;

        match &self.value {
            Operand::Number(rhs) => Ok(self.op.compare(cell.as_f64(), *rhs)),
            Operand::Text(rhs) => {
                let lhs = cell.as_text();
                match self.op {
                    CompareOp::Eq => Ok(lhs == *rhs),
                    CompareOp::Ne => Ok(lhs != *rhs),
                    op => Err(RuleError::TextOrdering {
                        column: self.column.clone(),
                        op,
                    }),
                }
            }
        }
    }
}

/// AND of conditions. An empty rule matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Every condition is evaluated so a missing column always surfaces,
    /// even when an earlier condition is already false.
    pub fn matches(&self, row: &SignalRow) -> Result<bool, RuleError> {
        let mut result = true;
        for condition in &self.conditions {
            result &= condition.evaluate(row)?;
        }
        Ok(result)
    }
}

/// Enters on every matching signal row and exits a fixed number of bars later.
///
/// Entry is the close of the first price bar at or after the signal time;
/// exit is the close `hold_bars` bars later, or the last bar. A match while a
/// trade is still open is ignored. The triggering row's synergy is attached
/// to the candidate; quantity and profit are left to the runner.
#[derive(Debug, Clone)]
pub struct RuleStrategy {
    name: String,
    rule: Rule,
    side: Side,
    hold_bars: usize,
    reason: Option<String>,
    synergy_map: Option<SynergyMap>,
}

impl RuleStrategy {
    pub const DEFAULT_HOLD_BARS: usize = 5;

    pub fn new(name: impl Into<String>, rule: Rule) -> Self {
        Self {
            name: name.into(),
            rule,
            side: Side::Long,
            hold_bars: Self::DEFAULT_HOLD_BARS,
            reason: None,
            synergy_map: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_hold_bars(mut self, hold_bars: usize) -> Self {
        self.hold_bars = hold_bars;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_synergy_map(mut self, synergy_map: Option<SynergyMap>) -> Self {
        self.synergy_map = synergy_map;
        self
    }
}

impl Strategy for RuleStrategy {
    fn generate_trades(
        &self,
        prices: &[PriceBar],
        signals: &[SignalRow],
    ) -> Result<Vec<TradeCandidate>, StrategyError> {
        let Some(last_idx) = prices.len().checked_sub(1) else {
            return Ok(Vec::new());
        };

        let mut trades = Vec::new();
        let mut open_until: Option<usize> = None;

        for row in signals {
            let Some(time) = row.time else {
                continue;
            };
            if !self.rule.matches(row)? {
                continue;
            }
            let Some(entry_idx) = PriceBar::first_at_or_after(prices, time) else {
                continue;
            };
            if open_until.is_some_and(|exit_idx| entry_idx < exit_idx) {
                continue;
            }

            let exit_idx = (entry_idx + self.hold_bars).min(last_idx);
            let entry = &prices[entry_idx];
            let exit = &prices[exit_idx];

            let mut candidate =
                TradeCandidate::new(entry.time, exit.time, entry.close, exit.close, self.side)
                    .with_synergy(synergy_score(row, self.synergy_map.as_ref()));
            if let Some(reason) = &self.reason {
                candidate = candidate.with_reason(reason.clone());
            }
            trades.push(candidate);
            open_until = Some(exit_idx);
        }

        Ok(trades)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn prices(n: u32) -> Vec<PriceBar> {
        (1..=n)
            .map(|d| {
                let close = 100.0 + d as f64;
                PriceBar {
                    time: day(d),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    fn perfection_row(d: u32, rsi: f64) -> SignalRow {
        SignalRow::new(Some(day(d)))
            .with("signal", "Perfection9Up")
            .with("RSI", rsi)
    }

    fn perfection_rule() -> Rule {
        Rule::new(vec![
            Condition::new("signal", CompareOp::Eq, Operand::Text("Perfection9Up".into())),
            Condition::new("RSI", CompareOp::Lt, Operand::Number(60.0)),
        ])
    }

    #[test]
    fn condition_numeric_ops() {
        let row = SignalRow::new(None).with("rsi", 30.0);
        let check = |op, v| Condition::new("rsi", op, Operand::Number(v)).evaluate(&row).unwrap();
        assert!(check(CompareOp::Lt, 40.0));
        assert!(check(CompareOp::Le, 30.0));
        assert!(!check(CompareOp::Gt, 30.0));
        assert!(check(CompareOp::Ge, 30.0));
        assert!(check(CompareOp::Eq, 30.0));
        assert!(check(CompareOp::Ne, 31.0));
    }

    #[test]
    fn condition_flag_compares_numerically() {
        let row = SignalRow::new(None).with("C13Up", true);
        let cond = Condition::new("C13Up", CompareOp::Eq, Operand::Number(1.0));
        assert!(cond.evaluate(&row).unwrap());
    }

    #[test]
    fn condition_missing_column_errors() {
        let row = SignalRow::new(None);
        let cond = Condition::new("RSI", CompareOp::Lt, Operand::Number(30.0));
        assert_eq!(
            cond.evaluate(&row),
            Err(RuleError::MissingColumn("RSI".into()))
        );
    }

    #[test]
    fn condition_text_ordering_errors() {
        let row = SignalRow::new(None).with("signal", "C13Up");
        let cond = Condition::new("signal", CompareOp::Gt, Operand::Text("A".into()));
        assert!(matches!(cond.evaluate(&row), Err(RuleError::TextOrdering { .. })));
    }

    #[test]
    fn rule_surfaces_missing_column_after_false_condition() {
        let row = SignalRow::new(None).with("signal", "C13Down");
        assert!(perfection_rule().matches(&row).is_err());
    }

    #[test]
    fn empty_rule_matches() {
        assert!(Rule::default().matches(&SignalRow::default()).unwrap());
    }

    #[test]
    fn compare_op_parse_and_display() {
        for s in ["<", "<=", ">", ">=", "==", "!="] {
            let op: CompareOp = s.parse().unwrap();
            assert_eq!(op.to_string(), s);
        }
        assert!("=>".parse::<CompareOp>().is_err());
    }

    #[test]
    fn rule_deserializes_from_json() {
        let rule: Rule = serde_json::from_str(
            r#"{"conditions": [
                {"column": "signal", "op": "==", "value": "Perfection9Up"},
                {"column": "RSI", "op": "<", "value": 60}
            ]}"#,
        )
        .unwrap();
        assert_eq!(rule, perfection_rule());
    }

    #[test]
    fn strategy_holds_for_fixed_bars() {
        let strategy = RuleStrategy::new("Perfection9Up", perfection_rule())
            .with_hold_bars(2)
            .with_reason("Perfection9Up");
        let trades = strategy
            .generate_trades(&prices(10), &[perfection_row(3, 45.0)])
            .unwrap();

        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.entry_time, day(3));
        assert_eq!(t.exit_time, day(5));
        assert_eq!(t.entry_price, 103.0);
        assert_eq!(t.exit_price, 105.0);
        assert_eq!(t.side, Side::Long);
        assert_eq!(t.reason_codes.as_deref(), Some("Perfection9Up"));
        assert_eq!(t.quantity, None);
        assert_eq!(t.synergy_score, Some(0.0));
    }

    #[test]
    fn strategy_clamps_exit_to_last_bar() {
        let strategy = RuleStrategy::new("p9", perfection_rule()).with_hold_bars(10);
        let trades = strategy
            .generate_trades(&prices(4), &[perfection_row(3, 45.0)])
            .unwrap();
        assert_eq!(trades[0].exit_time, day(4));
    }

    #[test]
    fn strategy_skips_overlapping_and_non_matching_rows() {
        let strategy = RuleStrategy::new("p9", perfection_rule()).with_hold_bars(3);
        let signals = vec![
            perfection_row(1, 45.0),
            perfection_row(2, 45.0), // still open
            perfection_row(3, 75.0), // RSI too high
            perfection_row(4, 45.0), // enters on the previous exit bar
            SignalRow::new(None).with("signal", "Perfection9Up").with("RSI", 1.0),
        ];
        let trades = strategy.generate_trades(&prices(10), &signals).unwrap();
        let entries: Vec<_> = trades.iter().map(|t| t.entry_time).collect();
        assert_eq!(entries, vec![day(1), day(4)]);
    }

    #[test]
    fn strategy_attaches_row_synergy() {
        let strategy = RuleStrategy::new("p9", Rule::default());
        let row = SignalRow::new(Some(day(2)))
            .with("demark_signal", true)
            .with("pivot_signal", true);
        let trades = strategy.generate_trades(&prices(5), &[row]).unwrap();
        assert_eq!(trades[0].synergy_score, Some(2.0));
    }

    #[test]
    fn strategy_ignores_signals_after_last_bar() {
        let strategy = RuleStrategy::new("p9", Rule::default());
        let row = SignalRow::new(Some(day(20)));
        assert!(strategy.generate_trades(&prices(5), &[row]).unwrap().is_empty());
    }

    #[test]
    fn strategy_no_prices_no_trades() {
        let strategy = RuleStrategy::new("p9", Rule::default());
        let row = SignalRow::new(Some(day(1)));
        assert!(strategy.generate_trades(&[], &[row]).unwrap().is_empty());
    }

    #[test]
    fn strategy_propagates_missing_column() {
        let strategy = RuleStrategy::new("p9", perfection_rule());
        let row = SignalRow::new(Some(day(1))).with("signal", "Perfection9Up");
        let err = strategy.generate_trades(&prices(3), &[row]).unwrap_err();
        assert!(matches!(err, StrategyError::Rule(RuleError::MissingColumn(_))));
    }
}
