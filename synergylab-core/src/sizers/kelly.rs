//! Fractional Kelly sizer
//!
//! Sizes a trade in proportion to its estimated statistical edge, damped by
//! a scale factor to cut variance relative to full Kelly.

use crate::domain::Trade;
use crate::sizers::Sizer;

/// Prior win probability before any synergy nudge.
const BASE_WIN_PROBABILITY: f64 = 0.5;
/// Probability added per unit of synergy.
const SYNERGY_PROBABILITY_STEP: f64 = 0.1;
const MIN_WIN_PROBABILITY: f64 = 0.1;
const MAX_WIN_PROBABILITY: f64 = 0.9;

/// Fraction of capital to risk, in `[0, 1]`.
///
/// `b = win_multiple / lose_multiple` (just `win_multiple` when
/// `lose_multiple` is 0), `k = (b * prob - (1 - prob)) / b`, result
/// `clamp(k * scale, 0, 1)`. A non-positive payoff ratio or any non-finite
/// intermediate sizes to 0.
pub fn kelly_fraction(prob: f64, win_multiple: f64, lose_multiple: f64, scale: f64) -> f64 {
    let b = if lose_multiple == 0.0 {
        win_multiple
    } else {
        win_multiple / lose_multiple
    };
    let q = 1.0 - prob;
    let k = if b > 0.0 { (b * prob - q) / b } else { 0.0 };

    let fraction = k * scale;
    if !fraction.is_finite() {
        return 0.0;
    }
    fraction.clamp(0.0, 1.0)
}

/// Win probability implied by a synergy score.
///
/// Each unit of synergy moves a 50/50 prior by 10 points, bounded to
/// `[0.1, 0.9]`.
pub fn estimate_win_probability(synergy_score: f64) -> f64 {
    let prob = BASE_WIN_PROBABILITY + synergy_score * SYNERGY_PROBABILITY_STEP;
    if prob.is_nan() {
        return BASE_WIN_PROBABILITY;
    }
    prob.clamp(MIN_WIN_PROBABILITY, MAX_WIN_PROBABILITY)
}

/// Kelly sizer parameterized by payoff ratio and damping scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KellySizer {
    /// Dollars gained per dollar risked on a win.
    pub win_multiple: f64,
    /// Dollars lost per dollar risked on a loss.
    pub lose_multiple: f64,
    /// Damping factor in `(0, 1]`.
    pub scale: f64,
}

impl Default for KellySizer {
    fn default() -> Self {
        Self {
            win_multiple: 2.0,
            lose_multiple: 1.0,
            scale: 0.5,
        }
    }
}

impl KellySizer {
    pub fn new(win_multiple: f64, lose_multiple: f64, scale: f64) -> Self {
        Self {
            win_multiple,
            lose_multiple,
            scale,
        }
    }

    /// Fraction of capital allocated to a trade with the given synergy.
    pub fn fraction(&self, synergy_score: f64) -> f64 {
        kelly_fraction(
            estimate_win_probability(synergy_score),
            self.win_multiple,
            self.lose_multiple,
            self.scale,
        )
    }
}

impl Sizer for KellySizer {
    fn size(&self, capital: f64, trade: &Trade) -> f64 {
        if capital <= 0.0 || trade.entry_price <= 0.0 {
            return 0.0;
        }
        let allocated = capital * self.fraction(trade.synergy_score);
        allocated / trade.entry_price
    }

    fn name(&self) -> &str {
        "FractionalKelly"
    }
}
