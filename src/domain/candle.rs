//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV candle (kline) for a fixed interval.
///
/// Crypto venues report fractional volume, so volume is a float. The candle
/// is immutable once produced by the data source; everything downstream
/// treats the series as read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Typical price, the per-bar input to VWAP.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any price field is non-finite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLCV sanity check: high is the band ceiling, low the floor,
    /// prices positive, volume non-negative.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Structural defects in an input candle series.
///
/// These abort the call that received the series. Degraded-feature
/// conditions (insufficient history for an optional filter) are not errors
/// and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("candle series is empty")]
    Empty,

    #[error("open_time not strictly ascending at index {index}")]
    NonMonotonic { index: usize },

    #[error("malformed candle at index {index}: {reason}")]
    Malformed { index: usize, reason: &'static str },
}

/// Validate the structural preconditions every entry point assumes:
/// non-empty, strictly ascending `open_time`, and per-candle sanity.
pub fn validate_series(candles: &[Candle]) -> Result<(), SeriesError> {
    if candles.is_empty() {
        return Err(SeriesError::Empty);
    }
    for (i, candle) in candles.iter().enumerate() {
        if candle.is_void() {
            return Err(SeriesError::Malformed {
                index: i,
                reason: "non-finite field",
            });
        }
        if !candle.is_sane() {
            return Err(SeriesError::Malformed {
                index: i,
                reason: "OHLCV bounds violated",
            });
        }
        if i > 0 && candle.open_time <= candles[i - 1].open_time {
            return Err(SeriesError::NonMonotonic { index: i });
        }
    }
    Ok(())
}
