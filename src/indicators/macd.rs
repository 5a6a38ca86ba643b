//! MACD — moving average convergence/divergence.

use super::ema::ema;

/// MACD columns: `line = EMA(fast) − EMA(slow)`, `signal = EMA(line,
/// signal_period)`, `histogram = line − signal`.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute all three MACD columns in one pass over the closes.
///
/// With first-value EMA seeding every index is defined; the early values
/// simply reflect a shorter effective window.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdColumns {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&line, signal_period);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
    MacdColumns {
        line,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn macd_line_is_ema_difference() {
        let closes = [100.0, 101.0, 102.0, 103.0, 104.0];
        let cols = macd(&closes, 2, 4, 3);
        let fast = ema(&closes, 2);
        let slow = ema(&closes, 4);
        for i in 0..closes.len() {
            assert_approx(cols.line[i], fast[i] - slow[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_starts_at_zero() {
        // Both EMAs seed with the first close, so the line opens flat.
        let cols = macd(&[50.0, 51.0, 49.5], 2, 3, 2);
        assert_approx(cols.line[0], 0.0, DEFAULT_EPSILON);
        assert_approx(cols.signal[0], 0.0, DEFAULT_EPSILON);
        assert_approx(cols.histogram[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_positive_in_sustained_uptrend() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let cols = macd(&closes, 12, 26, 9);
        assert!(*cols.line.last().unwrap() > 0.0);
        assert!(*cols.histogram.last().unwrap() >= 0.0);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let cols = macd(&closes, 5, 10, 4);
        for i in 0..closes.len() {
            assert_approx(
                cols.histogram[i],
                cols.line[i] - cols.signal[i],
                DEFAULT_EPSILON,
            );
        }
    }

    #[test]
    fn macd_flat_series_is_all_zero() {
        let cols = macd(&[25.0; 15], 12, 26, 9);
        for i in 0..15 {
            assert_approx(cols.line[i], 0.0, DEFAULT_EPSILON);
            assert_approx(cols.signal[i], 0.0, DEFAULT_EPSILON);
            assert_approx(cols.histogram[i], 0.0, DEFAULT_EPSILON);
        }
    }
}
