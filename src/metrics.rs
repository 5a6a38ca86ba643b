//! Aggregate performance metrics.
//!
//! Pure functions over already-collected numbers. The simulation loop tracks
//! drawdown incrementally via [`crate::engine::EquityTracker`];
//! [`max_drawdown_pct`] recomputes the same figure from a serialized curve
//! so sweep tooling (and the tests) can cross-check the incremental path.

/// Relative profit over the starting balance, in percent.
pub fn profit_percentage(initial_balance: f64, final_balance: f64) -> f64 {
    if initial_balance == 0.0 {
        return 0.0;
    }
    (final_balance - initial_balance) / initial_balance * 100.0
}

/// Winning trades as a percentage of all trades; 0 when no trades closed.
pub fn win_rate(wins: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    wins as f64 / total as f64 * 100.0
}

/// Largest peak-to-trough equity decline in percent, peak seeded at the
/// initial balance so a drawdown registers before any new high.
pub fn max_drawdown_pct(equity_curve: &[f64], initial_balance: f64) -> f64 {
    let mut peak = initial_balance;
    let mut max_dd = 0.0;
    for &value in equity_curve {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── profit_percentage ──

    #[test]
    fn profit_percentage_is_relative() {
        assert!((profit_percentage(1000.0, 1100.0) - 10.0).abs() < 1e-12);
        assert!((profit_percentage(1000.0, 900.0) + 10.0).abs() < 1e-12);
        assert_eq!(profit_percentage(1000.0, 1000.0), 0.0);
    }

    // ── win_rate ──

    #[test]
    fn win_rate_handles_zero_trades() {
        assert_eq!(win_rate(0, 0), 0.0);
    }

    #[test]
    fn win_rate_is_a_percentage() {
        assert!((win_rate(3, 4) - 75.0).abs() < 1e-12);
        assert!((win_rate(4, 4) - 100.0).abs() < 1e-12);
    }

    // ── max_drawdown_pct ──

    #[test]
    fn drawdown_of_monotonic_curve_is_zero() {
        let curve = [1000.0, 1010.0, 1050.0, 1100.0];
        assert_eq!(max_drawdown_pct(&curve, 1000.0), 0.0);
    }

    #[test]
    fn drawdown_measures_from_running_peak() {
        // Peak 1100, trough 990: (1100-990)/1100 = 10%.
        let curve = [1000.0, 1100.0, 990.0, 1200.0];
        assert!((max_drawdown_pct(&curve, 1000.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_counts_dips_below_the_initial_balance() {
        let curve = [950.0, 980.0];
        assert!((max_drawdown_pct(&curve, 1000.0) - 5.0).abs() < 1e-9);
    }
}
