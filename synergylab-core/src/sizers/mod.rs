//! Position Sizers: re-derive trade quantity from available capital
//!
//! Sizers translate a capital figure plus a trade's annotations into a
//! quantity. Re-sizing a trade also recomputes its profit from prices, so
//! a re-sized trade's profit is always consistent with its quantity.

pub mod kelly;

pub use kelly::{estimate_win_probability, kelly_fraction, KellySizer};

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// Position sizing logic
///
/// # Responsibilities
/// - Convert capital + trade annotations → quantity
/// - Return 0.0 when the trade cannot be sized (no capital, bad price)
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the strategy's job)
/// - Sizers do NOT track capital across trades (that's [`resize_trades`])
pub trait Sizer: Send + Sync {
    /// Quantity to trade given `capital` available to this trade.
    fn size(&self, capital: f64, trade: &Trade) -> f64;

    /// Sizer name for logging
    fn name(&self) -> &str;
}

/// How the capital figure evolves while re-sizing a sequence of trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapitalPolicy {
    /// Every trade sizes against the initial capital.
    #[default]
    Fixed,
    /// Each trade's profit is added to the capital before the next trade sizes.
    Compounding,
}

/// Re-size every trade in order, replacing `quantity` and `profit`.
///
/// Capital is seeded once from `initial_capital` and threaded through the
/// fold according to `policy`.
pub fn resize_trades(
    trades: Vec<Trade>,
    sizer: &dyn Sizer,
    initial_capital: f64,
    policy: CapitalPolicy,
) -> Vec<Trade> {
    let (_, resized) = trades.into_iter().fold(
        (initial_capital, Vec::new()),
        |(capital, mut out), trade| {
            let quantity = sizer.size(capital, &trade);
            let profit = trade.side.profit(trade.entry_price, trade.exit_price, quantity);
            let next_capital = match policy {
                CapitalPolicy::Fixed => capital,
                CapitalPolicy::Compounding => capital + profit,
            };
            out.push(Trade {
                quantity,
                profit,
                ..trade
            });
            (next_capital, out)
        },
    );
    resized
}
