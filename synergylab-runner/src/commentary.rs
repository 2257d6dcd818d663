//! Per-trade commentary generation.

use synergylab_core::Trade;

const SEPARATOR: &str = "; ";

/// Human-readable summary of one trade's side, synergy and size.
pub fn describe(trade: &Trade) -> String {
    format!(
        "{} trade | synergy {:.2} | qty {:.4}",
        trade.side, trade.synergy_score, trade.quantity
    )
}

/// Append generated commentary to every trade, keeping any existing text.
pub fn annotate(trades: Vec<Trade>) -> Vec<Trade> {
    trades
        .into_iter()
        .map(|trade| {
            let generated = describe(&trade);
            let commentary = match trade.commentary {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing}{SEPARATOR}{generated}")
                }
                _ => generated,
            };
            Trade {
                commentary: Some(commentary),
                ..trade
            }
        })
        .collect()
}
