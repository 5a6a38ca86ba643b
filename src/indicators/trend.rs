//! Higher-timeframe trend filter.
//!
//! Base-resolution candles are resampled into coarser buckets and a fast/slow
//! EMA pair is maintained over the *completed* bucket closes. The bucket a bar
//! belongs to is still forming while that bar is current, so its close never
//! feeds the EMAs until a bar from a later bucket arrives.

use chrono::{DateTime, Utc};

use crate::config::Timeframe;
use crate::domain::Candle;
use crate::indicators::ema::ema_step;

/// Outcome of the higher-timeframe trend check at one bar.
///
/// `Unavailable` means fewer completed buckets exist than the slow EMA
/// period needs; the signal layer treats it as permissive. Keeping the
/// distinction explicit (instead of collapsing to `true`) leaves the
/// default-to-permissive policy in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrendState {
    /// Not enough completed higher-timeframe buckets to judge.
    Unavailable,
    /// Fast EMA above slow EMA on the higher timeframe.
    Known(bool),
}

impl TrendState {
    /// The single permissive reducer: an unavailable filter passes.
    pub fn permits_entry(self) -> bool {
        match self {
            TrendState::Unavailable => true,
            TrendState::Known(up) => up,
        }
    }
}

/// Per-bar trend state from resampling `candles` to `timeframe` and running a
/// `fast`/`slow` EMA pair over completed bucket closes.
///
/// The state becomes `Known` once at least `slow` buckets have completed and
/// then forward-fills across every base-resolution bar until the next bucket
/// completes.
pub fn trend_states(
    candles: &[Candle],
    timeframe: Timeframe,
    fast: usize,
    slow: usize,
) -> Vec<TrendState> {
    let mut out = Vec::with_capacity(candles.len());
    let mut current_bucket: Option<DateTime<Utc>> = None;
    let mut bucket_close = f64::NAN;
    let mut fast_ema: Option<f64> = None;
    let mut slow_ema: Option<f64> = None;
    let mut completed = 0usize;

    for candle in candles {
        let bucket = timeframe.bucket_start(candle.open_time);
        match current_bucket {
            Some(prev) if prev == bucket => {}
            Some(_) => {
                // A later bucket has started: the previous one is complete.
                fast_ema = Some(ema_step(fast_ema, bucket_close, fast));
                slow_ema = Some(ema_step(slow_ema, bucket_close, slow));
                completed += 1;
                current_bucket = Some(bucket);
            }
            None => current_bucket = Some(bucket),
        }
        bucket_close = candle.close;

        let state = match (fast_ema, slow_ema) {
            (Some(f), Some(s)) if completed >= slow => TrendState::Known(f > s),
            _ => TrendState::Unavailable,
        };
        out.push(state);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Hourly candles with the given closes, starting at a bucket boundary.
    fn hourly(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                open_time: start + Duration::hours(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn unavailable_until_enough_buckets_complete() {
        // H2 buckets over hourly bars: bucket k completes at bar 2k+2.
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let candles = hourly(&closes);
        let states = trend_states(&candles, Timeframe::H2, 2, 3);

        // Buckets completed so far at bar i: i/2 (integer division).
        for (i, state) in states.iter().enumerate() {
            if i / 2 < 3 {
                assert_eq!(*state, TrendState::Unavailable, "bar {i}");
            } else {
                assert!(matches!(state, TrendState::Known(_)), "bar {i}");
            }
        }
    }

    #[test]
    fn rising_closes_give_uptrend() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        let candles = hourly(&closes);
        let states = trend_states(&candles, Timeframe::H2, 2, 3);
        assert_eq!(states[19], TrendState::Known(true));
    }

    #[test]
    fn falling_closes_give_downtrend() {
        let closes: Vec<f64> = (0..20).map(|i| 200.0 - 2.0 * i as f64).collect();
        let candles = hourly(&closes);
        let states = trend_states(&candles, Timeframe::H2, 2, 3);
        assert_eq!(states[19], TrendState::Known(false));
    }

    #[test]
    fn state_forward_fills_within_a_bucket() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + i as f64).collect();
        let candles = hourly(&closes);
        let states = trend_states(&candles, Timeframe::H4, 1, 2);

        // Bars 8..12 share one H4 bucket; no bucket completes between them.
        assert_eq!(states[8], states[9]);
        assert_eq!(states[9], states[10]);
        assert_eq!(states[10], states[11]);
    }

    #[test]
    fn current_bucket_close_does_not_feed_the_emas() {
        // A violent move inside the still-forming bucket must not flip the
        // state until that bucket completes.
        let mut closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let candles_before = hourly(&closes);
        let states_before = trend_states(&candles_before, Timeframe::H2, 2, 3);

        closes[11] = 1.0; // crash on the last bar, same bucket as bar 10
        let candles_after = hourly(&closes);
        let states_after = trend_states(&candles_after, Timeframe::H2, 2, 3);

        assert_eq!(states_before[10], states_after[11]);
    }

    #[test]
    fn unavailable_is_permissive() {
        assert!(TrendState::Unavailable.permits_entry());
        assert!(TrendState::Known(true).permits_entry());
        assert!(!TrendState::Known(false).permits_entry());
    }
}
