//! Support/resistance levels from confirmed pivot extrema and classic
//! pivot-point formulas.
//!
//! Detection only ever sees the historical prefix `candles[0..=i]`, so the
//! per-bar series is causal by construction: a pivot needs two bars on each
//! side *inside the prefix* before it counts, which mirrors how a live system
//! would only act on pivots already confirmed by later bars.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Levels within `MERGE_TOLERANCE` relative distance collapse into one.
const MERGE_TOLERANCE: f64 = 1e-4;

/// Price levels around the current close: `supports` sorted descending
/// (nearest below first), `resistances` ascending (nearest above first).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SrLevels {
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
}

/// Detect levels from the historical prefix ending at the evaluation bar.
///
/// Candidates are (a) pivot highs/lows inside the last `lookback` bars,
/// confirmed by two strictly lower highs / higher lows on each side, and
/// (b) the classic pivot-point set over the window aggregates:
/// `pivot = (H+L+C)/3`, `r1 = 2·pivot − L`, `s1 = 2·pivot − H`,
/// `r2 = pivot + (H−L)`, `s2 = pivot − (H−L)`. Candidates are deduplicated,
/// classified against the prefix's last close, and capped to
/// `num_levels + 2` per side keeping the levels nearest the close.
pub fn detect_levels(prefix: &[Candle], lookback: usize, num_levels: usize) -> SrLevels {
    if prefix.is_empty() {
        return SrLevels::default();
    }
    let close = prefix[prefix.len() - 1].close;
    let window_start = prefix.len().saturating_sub(lookback);
    let window = &prefix[window_start..];

    let mut candidates = Vec::new();
    for j in window_start..prefix.len() {
        if j < 2 || j + 2 >= prefix.len() {
            continue; // pivot not yet confirmed by two later bars
        }
        let h = prefix[j].high;
        if h > prefix[j - 1].high
            && h > prefix[j - 2].high
            && h > prefix[j + 1].high
            && h > prefix[j + 2].high
        {
            candidates.push(h);
        }
        let l = prefix[j].low;
        if l < prefix[j - 1].low
            && l < prefix[j - 2].low
            && l < prefix[j + 1].low
            && l < prefix[j + 2].low
        {
            candidates.push(l);
        }
    }

    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let pivot = (high + low + close) / 3.0;
    candidates.extend([
        pivot,
        2.0 * pivot - low,
        2.0 * pivot - high,
        pivot + (high - low),
        pivot - (high - low),
    ]);

    let mut supports = Vec::new();
    let mut resistances = Vec::new();
    for level in merge_nearby(candidates) {
        if level > close {
            resistances.push(level);
        } else {
            supports.push(level);
        }
    }
    supports.sort_by(|a, b| b.total_cmp(a));
    resistances.sort_by(f64::total_cmp);
    supports.truncate(num_levels + 2);
    resistances.truncate(num_levels + 2);

    SrLevels {
        supports,
        resistances,
    }
}

/// One `SrLevels` per bar, each computed from that bar's prefix.
pub fn levels_series(candles: &[Candle], lookback: usize, num_levels: usize) -> Vec<SrLevels> {
    (0..candles.len())
        .map(|i| detect_levels(&candles[..=i], lookback, num_levels))
        .collect()
}

/// True when `price` sits within `threshold` relative distance of any level.
pub fn near_level(price: f64, levels: &[f64], threshold: f64) -> bool {
    levels
        .iter()
        .any(|&level| (price - level).abs() <= threshold * price.abs())
}

fn merge_nearby(mut levels: Vec<f64>) -> Vec<f64> {
    levels.retain(|l| l.is_finite());
    levels.sort_by(f64::total_cmp);
    let mut out: Vec<f64> = Vec::with_capacity(levels.len());
    for level in levels {
        let duplicate = out.last().is_some_and(|&kept| {
            (level - kept).abs() <= MERGE_TOLERANCE * kept.abs().max(level.abs())
        });
        if !duplicate {
            out.push(level);
        }
    }
    out
}
