//! Agreement properties: the precomputed-signal path must match the
//! end-to-end path exactly, repeated runs must be identical, and results
//! must scale the way the sizing arithmetic says they do.

use candela::config::BacktestConfig;
use candela::domain::Candle;
use candela::engine::{run_simulation, run_simulation_with_signals};
use candela::indicators::compute_indicators;
use candela::signals::generate_signals;
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded random walk: an arbitrary market for agreement checks that must
/// hold whatever the series looks like.
fn walk_candles(seed: u64, n: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    for i in 0..n {
        let open = price;
        price = (price * (1.0 + rng.gen_range(-0.03..0.03))).max(5.0);
        candles.push(Candle {
            open_time: start + Duration::hours(i as i64),
            open,
            high: open.max(price) * 1.001,
            low: open.min(price) * 0.999,
            close: price,
            volume: rng.gen_range(400.0..1600.0),
        });
    }
    candles
}

/// Hourly sine-wave market: guaranteed EMA crossovers in both directions.
fn sine_candles(n: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut candles = Vec::with_capacity(n);
    let mut prev_close = 100.0;
    for i in 0..n {
        let close = 100.0 + 10.0 * ((i as f64) * 0.35).sin();
        candles.push(Candle {
            open_time: start + Duration::hours(i as i64),
            open: prev_close,
            high: prev_close.max(close) + 0.5,
            low: prev_close.min(close) - 0.5,
            close,
            volume: 600.0 + ((i * 97) % 13) as f64 * 80.0,
        });
        prev_close = close;
    }
    candles
}

/// 3/8 crossover with all exit rules armed and a small fee.
fn trading_config() -> BacktestConfig {
    let mut config = BacktestConfig::new(1000.0);
    config.strategy.fast_ema_period = 3;
    config.strategy.slow_ema_period = 8;
    config.risk.stop_loss_pct = 0.02;
    config.risk.take_profit_pct = 0.04;
    config.risk.trailing_stop_pct = 0.03;
    config.risk.fee_pct = 0.0005;
    config
}

#[test]
fn identical_runs_produce_identical_results() {
    let candles = sine_candles(160);
    let config = trading_config();

    let first = run_simulation(&candles, &config).unwrap();
    let second = run_simulation(&candles, &config).unwrap();
    assert!(first.total_trades >= 2, "sine market should trade");
    assert_eq!(first, second);
}

#[test]
fn precomputed_signals_match_the_end_to_end_run() {
    let candles = walk_candles(7, 400);
    let config = trading_config();

    let end_to_end = run_simulation(&candles, &config).unwrap();

    let series = compute_indicators(&candles, &config.strategy).unwrap();
    let signals = generate_signals(&candles, &series, &config.strategy);
    let replayed = run_simulation_with_signals(&candles, &signals, &config).unwrap();

    assert_eq!(end_to_end, replayed);
}

#[test]
fn precomputed_signals_match_with_every_filter_enabled() {
    use candela::config::{Session, Timeframe};

    let candles = walk_candles(11, 400);
    let mut config = trading_config();
    config.strategy.enable_trend_filter = true;
    config.strategy.trend_timeframe = Timeframe::H4;
    config.strategy.trend_fast = 3;
    config.strategy.trend_slow = 8;
    config.strategy.enable_session_filter = true;
    config.strategy.allowed_sessions = vec![Session::Asia, Session::Europe];
    config.strategy.enable_volume_momentum = true;
    config.strategy.volume_avg_period = 10;
    config.strategy.volume_spike_factor = 1.2;
    config.strategy.enable_sr_detection = true;
    config.strategy.sr_lookback_period = 40;
    config.strategy.sr_num_levels = 3;
    config.strategy.enable_sr_filter = true;
    config.strategy.sr_proximity_threshold = 0.005;

    let end_to_end = run_simulation(&candles, &config).unwrap();

    let series = compute_indicators(&candles, &config.strategy).unwrap();
    let signals = generate_signals(&candles, &series, &config.strategy);
    let replayed = run_simulation_with_signals(&candles, &signals, &config).unwrap();

    assert_eq!(end_to_end, replayed);
}

#[test]
fn profit_percentage_is_independent_of_starting_balance() {
    let candles = sine_candles(160);
    let small = trading_config();
    let mut large = trading_config();
    large.initial_balance = 2500.0;

    let small_run = run_simulation(&candles, &small).unwrap();
    let large_run = run_simulation(&candles, &large).unwrap();

    assert!(small_run.total_trades >= 2);
    assert_eq!(small_run.total_trades, large_run.total_trades);
    assert_eq!(small_run.win_rate, large_run.win_rate);
    for (a, b) in small_run.trades.iter().zip(&large_run.trades) {
        assert_eq!(a.entry_index, b.entry_index);
        assert_eq!(a.exit_index, b.exit_index);
        assert_eq!(a.exit_reason, b.exit_reason);
    }
    // Every cash flow is proportional to balance, so the percentages agree.
    assert!(
        (small_run.profit_percentage - large_run.profit_percentage).abs() < 1e-9,
        "{} vs {}",
        small_run.profit_percentage,
        large_run.profit_percentage
    );
    assert!((small_run.max_drawdown_pct - large_run.max_drawdown_pct).abs() < 1e-9);
}

#[test]
fn profit_scales_linearly_with_leverage_under_fixed_sizing() {
    let candles = sine_candles(160);
    let mut base = trading_config();
    base.risk.fee_pct = 0.0;
    base.sizing.no_compounding = true;

    let mut levered = base.clone();
    levered.leverage = 4.0;

    let one_x = run_simulation(&candles, &base).unwrap();
    let four_x = run_simulation(&candles, &levered).unwrap();

    assert!(one_x.total_trades >= 2);
    assert_eq!(one_x.total_trades, four_x.total_trades);
    for (a, b) in one_x.trades.iter().zip(&four_x.trades) {
        assert_eq!(a.exit_reason, b.exit_reason);
        assert!((b.units - 4.0 * a.units).abs() < 1e-9);
    }
    assert!(
        (four_x.profit_percentage - 4.0 * one_x.profit_percentage).abs() < 1e-9,
        "{} vs 4 × {}",
        four_x.profit_percentage,
        one_x.profit_percentage
    );
}
