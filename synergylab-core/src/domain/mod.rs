//! Domain types for SynergyLab

pub mod price;
pub mod signal;
pub mod trade;

pub use price::PriceBar;
pub use signal::{pivot_signal_events, SignalEvent, SignalRow, SignalValue};
pub use trade::{Side, Trade, TradeCandidate};
