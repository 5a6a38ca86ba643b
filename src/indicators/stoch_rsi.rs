//! Stochastic RSI %K.
//!
//! Wilder RSI, then a stochastic of the RSI over the same window, smoothed
//! with a 3-bar mean. Scaled 0–100. Values are NaN until both the RSI and
//! its stochastic window have warmed up.

/// Bars of smoothing applied to the raw %K.
const SMOOTH_K: usize = 3;

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Wilder RSI: seed averages over the first `period` deltas, then smooth
/// with `avg = (avg·(period−1) + current) / period`. NaN for the first
/// `period` indices.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n <= period {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = values[i] - values[i - 1];
        avg_gain += delta.max(0.0);
        avg_loss += (-delta).max(0.0);
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    for i in (period + 1)..n {
        let delta = values[i] - values[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + delta.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + (-delta).max(0.0)) / period as f64;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

/// Stochastic RSI %K over `length` (used for both the RSI period and the
/// stochastic window). A flat RSI window collapses to the 50 midline.
pub fn stoch_rsi_k(closes: &[f64], length: usize) -> Vec<f64> {
    let n = closes.len();
    let rsi_vals = rsi(closes, length);
    let mut raw = vec![f64::NAN; n];

    for i in 0..n {
        if i + 1 < length {
            continue;
        }
        let window = &rsi_vals[i + 1 - length..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        raw[i] = if hi - lo < 1e-12 {
            50.0
        } else {
            (rsi_vals[i] - lo) / (hi - lo) * 100.0
        };
    }

    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        if i + 1 < SMOOTH_K {
            continue;
        }
        let window = &raw[i + 1 - SMOOTH_K..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = window.iter().sum::<f64>() / SMOOTH_K as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_warmup_is_nan() {
        let closes = [44.0, 44.3, 44.1, 44.2, 44.5];
        let out = rsi(&closes, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert!(out[3].is_finite());
    }

    #[test]
    fn rsi_matches_hand_computed_wilder_values() {
        let closes = [44.0, 44.34, 44.09, 44.15, 43.61];
        let out = rsi(&closes, 3);
        // Seed: gains (0.34, 0, 0.06)/3, losses (0, 0.25, 0)/3 → rs = 1.6.
        assert_approx(out[3], 100.0 - 100.0 / 2.6, 1e-9);
        // One Wilder step with a 0.54 loss.
        assert_approx(out[4], 27.397260273972606, 1e-9);
    }

    #[test]
    fn rsi_is_100_for_monotonic_rise() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 4);
        for v in out.iter().skip(4) {
            assert_approx(*v, 100.0, 1e-9);
        }
    }

    #[test]
    fn rsi_is_0_for_monotonic_fall() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&closes, 4);
        for v in out.iter().skip(4) {
            assert_approx(*v, 0.0, 1e-9);
        }
    }

    #[test]
    fn stoch_rsi_flat_window_is_midline() {
        // Monotonic rise pins RSI at 100, so the stochastic window is flat.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = stoch_rsi_k(&closes, 5);
        assert_approx(out[29], 50.0, 1e-9);
    }

    #[test]
    fn stoch_rsi_warmup_length() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.9).sin()).collect();
        let length = 6;
        let out = stoch_rsi_k(&closes, length);
        // RSI valid from `length`, window full at 2·length−1, smoothing adds 2.
        let first_valid = 2 * length + 1;
        for (i, v) in out.iter().enumerate() {
            if i < first_valid {
                assert!(v.is_nan(), "expected NaN at {i}, got {v}");
            } else {
                assert!(v.is_finite(), "expected value at {i}");
            }
        }
    }

    #[test]
    fn stoch_rsi_stays_in_bounds() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0 + (i as f64 * 0.11).cos())
            .collect();
        for v in stoch_rsi_k(&closes, 14) {
            if v.is_finite() {
                assert!((0.0..=100.0).contains(&v), "out of bounds: {v}");
            }
        }
    }
}
