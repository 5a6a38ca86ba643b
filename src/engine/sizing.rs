//! Position-sizing policies, resolved once per entry.

use crate::config::SizingPolicy;

/// Units to open for one entry under the given policy.
///
/// `equity_for_sizing` is the running balance, or the fixed initial balance
/// when compounding is off. Leverage scales the notional only under
/// `CapitalFraction`; `RiskPerTrade` derives units purely from the loss
/// bound at the stop, and `FixedUnits` passes through verbatim.
///
/// `RiskPerTrade` requires `stop_loss_pct > 0`, which config validation
/// enforces before any simulation starts.
pub fn units_for_entry(
    policy: SizingPolicy,
    equity_for_sizing: f64,
    leverage: f64,
    entry_price_effective: f64,
    stop_loss_pct: f64,
) -> f64 {
    match policy {
        SizingPolicy::CapitalFraction { value } => {
            equity_for_sizing * value * leverage / entry_price_effective
        }
        SizingPolicy::RiskPerTrade { value } => {
            equity_for_sizing * value / (stop_loss_pct * entry_price_effective)
        }
        SizingPolicy::FixedUnits { units } => units,
    }
}
