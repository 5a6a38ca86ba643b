//! Trade — a closed position leg with full fee/slippage accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position (or a ladder leg of one) was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Take-profit target reached (single target or either ladder stage).
    Tp,
    /// Trailing stop: close fell below the high-water mark by the trail percent.
    Trail,
    /// Fixed stop-loss below the entry cost basis.
    Sl,
    /// Signal-based exit (death cross passed its gates).
    Sell,
    /// Terminal forced close: series exhausted or early-stop abort.
    Last,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::Tp => "TP",
            ExitReason::Trail => "TRAIL",
            ExitReason::Sl => "SL",
            ExitReason::Sell => "SELL",
            ExitReason::Last => "LAST",
        };
        f.write_str(s)
    }
}

/// A completed round trip (or one leg of a partial-exit ladder).
///
/// `units` is the quantity closed by this record; a ladder produces two
/// records sharing `entry_index`. Fee fields are per-leg: the entry fee is
/// allocated pro rata by units closed, so summing `net_pnl` over all trades
/// reproduces the balance change exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_price_effective: f64,
    pub entry_fee: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_price_effective: f64,
    pub exit_fee: f64,
    pub exit_reason: ExitReason,

    // ── Size / PnL ──
    pub units: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,

    // ── Duration ──
    pub bars_held: usize,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Net return as a fraction of the entry cost basis for this leg.
    pub fn return_pct(&self) -> f64 {
        let basis = self.entry_price_effective * self.units;
        if basis == 0.0 {
            return 0.0;
        }
        self.net_pnl / basis
    }
}
