//! Rolling volume baseline and spike detection.

/// Average volume below this is treated as "no baseline" — a spike against
/// a near-zero mean is noise, not momentum.
const VOLUME_FLOOR: f64 = 1e-12;

/// Mean volume of the `period` bars strictly before each index.
///
/// The one-bar shift keeps the current bar's own volume out of its
/// baseline, otherwise a large bar would dampen its own spike flag. NaN
/// until `period` prior bars exist.
pub fn avg_volume_shifted(volumes: &[f64], period: usize) -> Vec<f64> {
    let n = volumes.len();
    let mut out = vec![f64::NAN; n];
    let mut window_sum = 0.0;
    for i in 0..n {
        if i >= period {
            out[i] = window_sum / period as f64;
            window_sum -= volumes[i - period];
        }
        window_sum += volumes[i];
    }
    out
}

/// Spike flag: current volume exceeds `avg × factor`, with the near-zero
/// baseline guarded off.
pub fn volume_spikes(volumes: &[f64], avg_volume: &[f64], factor: f64) -> Vec<bool> {
    volumes
        .iter()
        .zip(avg_volume)
        .map(|(&v, &avg)| avg.is_finite() && avg > VOLUME_FLOOR && v > avg * factor)
        .collect()
}
