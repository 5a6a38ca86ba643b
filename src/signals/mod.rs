//! EMA-cross entry/exit signals with configurable confirmation filters.
//!
//! Cross detection is the trigger; every enabled filter then has to agree
//! before the signal stands. Filters whose data is unavailable (trend state
//! [`TrendState::Unavailable`], absent S/R levels) pass by default — the
//! permissive-default policy lives here and nowhere else.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::Candle;
use crate::indicators::{near_level, IndicatorSeries};

/// Per-candle buy/sell flags, aligned with the input series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSeries {
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty()
    }
}

/// Derive buy/sell signals from a candle series and its indicator columns.
///
/// A buy fires on a golden cross (`prev_fast ≤ prev_slow` and
/// `cur_fast > cur_slow`), a sell on the mirror-image death cross. Rows with
/// any non-finite EMA value produce neither. `series` must have been computed
/// from the same `candles`.
pub fn generate_signals(
    candles: &[Candle],
    series: &IndicatorSeries,
    config: &StrategyConfig,
) -> SignalSeries {
    debug_assert_eq!(candles.len(), series.len());
    let n = candles.len();
    let mut buy = vec![false; n];
    let mut sell = vec![false; n];

    for i in 1..n {
        let prev_fast = series.ema_fast[i - 1];
        let prev_slow = series.ema_slow[i - 1];
        let cur_fast = series.ema_fast[i];
        let cur_slow = series.ema_slow[i];
        if !prev_fast.is_finite()
            || !prev_slow.is_finite()
            || !cur_fast.is_finite()
            || !cur_slow.is_finite()
        {
            continue;
        }

        let golden = prev_fast <= prev_slow && cur_fast > cur_slow;
        let death = prev_fast >= prev_slow && cur_fast < cur_slow;
        if !golden && !death {
            continue;
        }
        if config.enable_trend_filter && !series.trend[i].permits_entry() {
            continue;
        }
        if config.enable_session_filter && !series.session_ok[i] {
            continue;
        }

        if golden {
            buy[i] = buy_confirmations_pass(candles, series, config, i);
        } else {
            sell[i] = sell_confirmations_pass(candles, series, config, i);
        }
    }

    SignalSeries { buy, sell }
}

/// Buy-side confirmations: a volume spike with price above VWAP, and no
/// resistance level within the proximity threshold.
fn buy_confirmations_pass(
    candles: &[Candle],
    series: &IndicatorSeries,
    config: &StrategyConfig,
    i: usize,
) -> bool {
    if config.enable_volume_momentum && !(series.volume_spike[i] && series.above_vwap[i]) {
        return false;
    }
    if config.enable_sr_filter {
        if let Some(sr) = &series.sr {
            if near_level(
                candles[i].close,
                &sr[i].resistances,
                config.sr_proximity_threshold,
            ) {
                return false;
            }
        }
    }
    true
}

/// Sell-side confirmations: a volume spike with price below VWAP, and no
/// support level within the proximity threshold.
fn sell_confirmations_pass(
    candles: &[Candle],
    series: &IndicatorSeries,
    config: &StrategyConfig,
    i: usize,
) -> bool {
    if config.enable_volume_momentum && !(series.volume_spike[i] && !series.above_vwap[i]) {
        return false;
    }
    if config.enable_sr_filter {
        if let Some(sr) = &series.sr {
            if near_level(
                candles[i].close,
                &sr[i].supports,
                config.sr_proximity_threshold,
            ) {
                return false;
            }
        }
    }
    true
}
