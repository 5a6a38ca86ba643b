//! Indicator columns and the analyzer entry point.
//!
//! Every column is produced by a single forward pass: the value at row `i`
//! is a pure function of candles `0..=i`, so prefix recomputation can never
//! disagree with a full-series run. Warmup rows hold `NaN` (numeric columns)
//! or a permissive placeholder (filter columns) instead of leaking future
//! data into shorter effective windows.

pub mod ema;
pub mod levels;
pub mod macd;
pub mod stoch_rsi;
pub mod trend;
pub mod volume;
pub mod vwap;

pub use ema::{ema, ema_step};
pub use levels::{detect_levels, levels_series, near_level, SrLevels};
pub use macd::{macd, MacdColumns};
pub use stoch_rsi::{rsi, stoch_rsi_k};
pub use trend::{trend_states, TrendState};
pub use volume::{avg_volume_shifted, volume_spikes};
pub use vwap::{above_vwap, session_vwap};

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::config::{Session, StrategyConfig};
use crate::domain::{validate_series, Candle, SeriesError};

/// Parallel indicator columns, one row per input candle.
///
/// Numeric columns use `NaN` for warmup rows. `trend` stays
/// [`TrendState::Unavailable`] when the trend filter is disabled, and `sr`
/// is `None` unless level detection is enabled; both read as permissive at
/// the signal layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub stoch_rsi_k: Vec<f64>,
    pub macd_line: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_histogram: Vec<f64>,
    pub avg_volume: Vec<f64>,
    pub volume_spike: Vec<bool>,
    pub vwap: Vec<f64>,
    pub above_vwap: Vec<bool>,
    pub trend: Vec<TrendState>,
    pub session_ok: Vec<bool>,
    pub sr: Option<Vec<SrLevels>>,
}

impl IndicatorSeries {
    /// Number of rows (equals the candle count of the input series).
    pub fn len(&self) -> usize {
        self.ema_fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema_fast.is_empty()
    }
}

/// Compute every indicator column for a validated candle series.
///
/// Structural problems (empty series, malformed candles, non-monotonic
/// timestamps) are the only errors; disabled or data-starved optional
/// features degrade to permissive column values instead of failing.
pub fn compute_indicators(
    candles: &[Candle],
    config: &StrategyConfig,
) -> Result<IndicatorSeries, SeriesError> {
    validate_series(candles)?;

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let avg_volume = avg_volume_shifted(&volumes, config.volume_avg_period);
    let volume_spike = volume_spikes(&volumes, &avg_volume, config.volume_spike_factor);
    let vwap = session_vwap(candles);
    let above_vwap = above_vwap(candles, &vwap);
    let MacdColumns {
        line: macd_line,
        signal: macd_signal,
        histogram: macd_histogram,
    } = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal);

    let trend = if config.enable_trend_filter {
        trend_states(
            candles,
            config.trend_timeframe,
            config.trend_fast,
            config.trend_slow,
        )
    } else {
        vec![TrendState::Unavailable; candles.len()]
    };

    let session_ok = candles
        .iter()
        .map(|c| {
            config
                .allowed_sessions
                .contains(&Session::of_hour(c.open_time.hour()))
        })
        .collect();

    let sr = config
        .enable_sr_detection
        .then(|| levels_series(candles, config.sr_lookback_period, config.sr_num_levels));

    Ok(IndicatorSeries {
        ema_fast: ema(&closes, config.fast_ema_period),
        ema_slow: ema(&closes, config.slow_ema_period),
        stoch_rsi_k: stoch_rsi_k(&closes, config.stoch_length),
        macd_line,
        macd_signal,
        macd_histogram,
        avg_volume,
        volume_spike,
        vwap,
        above_vwap,
        trend,
        session_ok,
        sr,
    })
}

/// Create synthetic candles from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000,
/// hourly timestamps from a fixed origin.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: start + Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
