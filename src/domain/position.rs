//! Position — the single open-trade slot owned by one simulation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Take-profit plan fixed at entry time.
///
/// `Ladder` is the two-stage variant used by the live engine: half the units
/// close at `tp1`, the remainder keeps trailing toward `tp2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TakeProfit {
    None,
    Single { price: f64 },
    Ladder { tp1: f64, tp2: f64 },
}

/// State of one open long position.
///
/// Exactly one may exist per simulation run at a time. Mutated once per bar
/// (high-water mark, partial-exit bookkeeping); never aliased outside the
/// simulation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    /// Raw close at the entry bar.
    pub entry_price: f64,
    /// Cost basis after entry slippage; TP/SL thresholds derive from this.
    pub entry_price_effective: f64,
    /// Total fee paid at entry for `units_initial`, already deducted from
    /// the balance; allocated to trade legs pro rata on close.
    pub entry_fee: f64,
    pub units_initial: f64,
    /// Units still open (halved after a ladder's first stage fires).
    pub units: f64,
    /// Highest close observed since entry, in raw market prices.
    pub highest_since_entry: f64,
    pub stop_loss_price: Option<f64>,
    pub take_profit: TakeProfit,
    /// Trail distance as a fraction of the high-water mark; 0 disables.
    pub trailing_stop_pct: f64,
    pub tp1_hit: bool,
}

impl Position {
    /// Phase 1 of each bar: ratchet the high-water mark with the bar close.
    /// The mark never moves down.
    pub fn observe_close(&mut self, close: f64) {
        if close > self.highest_since_entry {
            self.highest_since_entry = close;
        }
    }

    /// Mark-to-market PnL of the still-open units against the cost basis.
    /// Slippage and exit fees apply only on an actual close.
    pub fn unrealized_pnl(&self, close: f64) -> f64 {
        (close - self.entry_price_effective) * self.units
    }

    /// Trailing-stop floor under the current high-water mark, if trailing
    /// is active.
    pub fn trailing_floor(&self) -> Option<f64> {
        if self.trailing_stop_pct > 0.0 {
            Some(self.highest_since_entry * (1.0 - self.trailing_stop_pct))
        } else {
            None
        }
    }

    pub fn bars_held(&self, at_index: usize) -> usize {
        at_index.saturating_sub(self.entry_index)
    }

    /// Entry fee attributable to `units_closed` of this position.
    pub fn entry_fee_share(&self, units_closed: f64) -> f64 {
        if self.units_initial == 0.0 {
            return 0.0;
        }
        self.entry_fee * (units_closed / self.units_initial)
    }
}
