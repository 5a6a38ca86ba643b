//! Exponential moving average.

/// One step of the EMA recurrence with `α = 2/(period+1)`; seeds with the
/// raw value when there is no previous state.
pub fn ema_step(prev: Option<f64>, value: f64, period: usize) -> f64 {
    match prev {
        None => value,
        Some(p) => {
            let alpha = 2.0 / (period as f64 + 1.0);
            p + alpha * (value - p)
        }
    }
}

/// EMA over a series, defined at every index.
///
/// Seeded with the first value rather than an SMA prefix, so short series
/// still produce output (shorter effective window, never future data). The
/// same recurrence backs cross detection, MACD, and the higher-timeframe
/// trend comparison, which keeps crossings consistent across columns.
/// Input is assumed finite.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = ema_step(prev, v, period);
        out.push(next);
        prev = Some(next);
    }
    out
}
