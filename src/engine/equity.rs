//! Per-bar equity curve with incremental drawdown tracking.

/// Records one equity point per bar and folds each into the running
/// peak/max-drawdown pair, so the metric is available without a second pass
/// over the curve.
///
/// The peak starts at the initial balance: a run that only ever loses money
/// still reports the dip below its starting point as drawdown.
#[derive(Debug, Clone)]
pub struct EquityTracker {
    curve: Vec<f64>,
    peak: f64,
    max_drawdown_pct: f64,
}

impl EquityTracker {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            curve: Vec::new(),
            peak: initial_balance,
            max_drawdown_pct: 0.0,
        }
    }

    /// Record one bar's equity (balance plus unrealized PnL).
    pub fn observe(&mut self, equity: f64) {
        self.curve.push(equity);
        if equity > self.peak {
            self.peak = equity;
        } else if self.peak > 0.0 {
            let dd = (self.peak - equity) / self.peak * 100.0;
            if dd > self.max_drawdown_pct {
                self.max_drawdown_pct = dd;
            }
        }
    }

    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown_pct
    }

    pub fn into_curve(self) -> Vec<f64> {
        self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn fresh_tracker_has_no_drawdown() {
        let tracker = EquityTracker::new(1000.0);
        assert_eq!(tracker.max_drawdown_pct(), 0.0);
    }

    #[test]
    fn rising_equity_never_draws_down() {
        let mut tracker = EquityTracker::new(1000.0);
        for eq in [1000.0, 1020.0, 1080.0, 1200.0] {
            tracker.observe(eq);
        }
        assert_eq!(tracker.max_drawdown_pct(), 0.0);
    }

    #[test]
    fn dip_from_peak_is_measured_against_that_peak() {
        let mut tracker = EquityTracker::new(1000.0);
        for eq in [1000.0, 1100.0, 990.0, 1200.0] {
            tracker.observe(eq);
        }
        assert!((tracker.max_drawdown_pct() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn dip_below_initial_balance_counts() {
        let mut tracker = EquityTracker::new(1000.0);
        tracker.observe(950.0);
        assert!((tracker.max_drawdown_pct() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn incremental_matches_batch_recomputation() {
        let path = [1000.0, 1040.0, 970.0, 1010.0, 1110.0, 1050.0, 990.0];
        let mut tracker = EquityTracker::new(1000.0);
        for eq in path {
            tracker.observe(eq);
        }
        let incremental = tracker.max_drawdown_pct();
        let curve = tracker.into_curve();
        let batch = metrics::max_drawdown_pct(&curve, 1000.0);
        assert!((incremental - batch).abs() < 1e-12);
        assert_eq!(curve, path.to_vec());
    }
}
