//! Session VWAP — cumulative volume-weighted typical price, reset daily.

use crate::domain::Candle;

/// Cumulative `Σ(typical_price·volume) / Σ(volume)` within each UTC
/// calendar day, restarting at every midnight boundary.
///
/// While a day's cumulative volume is still zero the previous bar's VWAP is
/// carried forward; a zero-volume first bar of the whole series falls back
/// to its own typical price. Either way the column always holds a finite
/// value, so the boundary never blends two sessions.
pub fn session_vwap(candles: &[Candle]) -> Vec<f64> {
    let mut out = Vec::with_capacity(candles.len());
    let mut session_day = None;
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;
    let mut prev_vwap = f64::NAN;

    for candle in candles {
        let day = candle.open_time.date_naive();
        if session_day != Some(day) {
            session_day = Some(day);
            cum_pv = 0.0;
            cum_vol = 0.0;
        }
        cum_pv += candle.typical_price() * candle.volume;
        cum_vol += candle.volume;

        let vwap = if cum_vol > 0.0 {
            cum_pv / cum_vol
        } else if prev_vwap.is_finite() {
            prev_vwap
        } else {
            candle.typical_price()
        };
        out.push(vwap);
        prev_vwap = vwap;
    }
    out
}

/// Boolean companion column: close strictly above the session VWAP.
pub fn above_vwap(candles: &[Candle], vwap: &[f64]) -> Vec<bool> {
    candles
        .iter()
        .zip(vwap)
        .map(|(c, &v)| c.close > v)
        .collect()
}
