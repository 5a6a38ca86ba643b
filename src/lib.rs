//! Candela — indicator/signal computation and position lifecycle simulation
//! for crypto-futures strategy backtests.
//!
//! This crate is the deterministic core a sweep runner or live risk engine
//! calls into:
//! - Domain types (candles, positions, trades) with structural validation
//! - Causal indicator columns (EMA cross, StochRSI, MACD, shifted volume
//!   average, session VWAP, higher-timeframe trend, support/resistance)
//! - EMA-cross signals gated by configurable confirmation filters
//! - A close-to-close position simulator with TP/TRAIL/SL/SELL exits, a
//!   two-stage take-profit ladder, fees, slippage, and sizing policies
//! - Aggregate metrics (profit %, win rate, max drawdown) and run
//!   fingerprinting for sweep deduplication
//!
//! One call to [`run_simulation`] is a single-threaded pure function over
//! its inputs; callers parallelize across runs, never within one.

pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod metrics;
pub mod signals;

pub use config::{
    BacktestConfig, ConfigError, RiskConfig, SizingConfig, SizingPolicy, StrategyConfig,
};
pub use domain::{Candle, ExitReason, SeriesError, Trade};
pub use engine::{run_simulation, run_simulation_with_signals, SimulationError, SimulationResult};
pub use indicators::{compute_indicators, IndicatorSeries};
pub use signals::{generate_signals, SignalSeries};
