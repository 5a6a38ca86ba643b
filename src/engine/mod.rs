//! Position lifecycle simulator.
//!
//! A single-threaded fold over the candle series: one open slot, exits
//! evaluated before entries, one exit per bar in fixed priority
//! (TP → TRAIL → SL → SELL). Exit prices are bar closes; this is a
//! close-to-close simulator, not an intrabar-path simulator. A position
//! opened at bar `i` is first eligible to exit at bar `i + 1`.

pub mod equity;
pub mod sizing;

pub use equity::EquityTracker;
pub use sizing::units_for_entry;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{BacktestConfig, ConfigError, RiskConfig};
use crate::domain::{validate_series, Candle, ExitReason, Position, SeriesError, TakeProfit, Trade};
use crate::indicators::compute_indicators;
use crate::metrics;
use crate::signals::{generate_signals, SignalSeries};

/// Structural failures that abort a run. Degraded optional features never
/// land here; they resolve to permissive defaults inside the analyzer.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid candle series: {0}")]
    Series(#[from] SeriesError),

    #[error("signal series has {signals} rows for {candles} candles")]
    SignalLengthMismatch { signals: usize, candles: usize },
}

/// Aggregate outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub profit: f64,
    pub profit_percentage: f64,
    pub total_trades: usize,
    /// Percentage of trades with positive net PnL; 0 when no trades closed.
    pub win_rate: f64,
    pub max_drawdown_pct: f64,
    pub trades: Vec<Trade>,
    /// Balance plus unrealized PnL at every processed bar.
    pub equity_curve: Vec<f64>,
    /// Set when the early-stop safeguard cut the run short.
    pub aborted_early: bool,
    /// Set when fewer than `min_trades` closed; a confidence flag, not an
    /// error.
    pub insufficient_trades: bool,
}

/// Run a backtest end to end: validate, compute indicators, derive signals,
/// simulate.
pub fn run_simulation(
    candles: &[Candle],
    config: &BacktestConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    let series = compute_indicators(candles, &config.strategy)?;
    let signals = generate_signals(candles, &series, &config.strategy);
    Ok(simulate(candles, &signals, config))
}

/// Simulate against signals the caller already computed.
///
/// Sweep tooling derives signals once and replays them across risk/sizing
/// variants; the outcome is identical to [`run_simulation`] with the same
/// strategy settings.
pub fn run_simulation_with_signals(
    candles: &[Candle],
    signals: &SignalSeries,
    config: &BacktestConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    validate_series(candles)?;
    if signals.len() != candles.len() {
        return Err(SimulationError::SignalLengthMismatch {
            signals: signals.len(),
            candles: candles.len(),
        });
    }
    Ok(simulate(candles, signals, config))
}

/// What the per-bar exit evaluation decided.
enum ExitKind {
    /// Close every remaining unit for the given reason.
    Full(ExitReason),
    /// First stage of a take-profit ladder: close half, keep trailing.
    LadderFirstStage,
}

/// Fixed-priority exit evaluation for one bar. At most one exit fires; a bar
/// touching both the take-profit and stop-loss bands resolves to take-profit.
fn resolve_exit(pos: &Position, close: f64, sell_signal: bool) -> Option<ExitKind> {
    match pos.take_profit {
        TakeProfit::Single { price } if close >= price => {
            return Some(ExitKind::Full(ExitReason::Tp));
        }
        TakeProfit::Ladder { tp1, .. } if !pos.tp1_hit && close >= tp1 => {
            // Even a close beyond tp2 takes the ladder one stage per bar.
            return Some(ExitKind::LadderFirstStage);
        }
        TakeProfit::Ladder { tp2, .. } if pos.tp1_hit && close >= tp2 => {
            return Some(ExitKind::Full(ExitReason::Tp));
        }
        _ => {}
    }
    if let Some(floor) = pos.trailing_floor() {
        if close <= floor {
            return Some(ExitKind::Full(ExitReason::Trail));
        }
    }
    if let Some(stop) = pos.stop_loss_price {
        if close <= stop {
            return Some(ExitKind::Full(ExitReason::Sl));
        }
    }
    if sell_signal {
        return Some(ExitKind::Full(ExitReason::Sell));
    }
    None
}

/// Build the closed-trade record for `units` of the position at this bar's
/// close, with exit slippage and per-leg fee allocation.
fn close_leg(
    pos: &Position,
    units: f64,
    exit_index: usize,
    candle: &Candle,
    reason: ExitReason,
    risk: &RiskConfig,
) -> Trade {
    let exit_price = candle.close;
    let exit_price_effective = exit_price * (1.0 - risk.slippage_pct);
    let exit_fee = risk.fee_pct * units * exit_price_effective;
    let entry_fee = pos.entry_fee_share(units);
    let gross_pnl = (exit_price_effective - pos.entry_price_effective) * units;
    Trade {
        entry_index: pos.entry_index,
        entry_time: pos.entry_time,
        entry_price: pos.entry_price,
        entry_price_effective: pos.entry_price_effective,
        entry_fee,
        exit_index,
        exit_time: candle.open_time,
        exit_price,
        exit_price_effective,
        exit_fee,
        exit_reason: reason,
        units,
        gross_pnl,
        net_pnl: gross_pnl - entry_fee - exit_fee,
        bars_held: pos.bars_held(exit_index),
    }
}

/// The single-threaded bar loop. Inputs are already validated.
fn simulate(candles: &[Candle], signals: &SignalSeries, config: &BacktestConfig) -> SimulationResult {
    let risk = &config.risk;
    let mut balance = config.initial_balance;
    let mut tracker = EquityTracker::new(config.initial_balance);
    let mut trades: Vec<Trade> = Vec::new();
    let mut position: Option<Position> = None;
    let mut aborted_early = false;
    let early_stop_floor = config
        .early_stop_balance_frac
        .map(|frac| config.initial_balance * frac);

    for (i, candle) in candles.iter().enumerate() {
        let close = candle.close;

        // Exits first. The entry bar itself only establishes the position.
        let mut closed_all = false;
        if let Some(pos) = position.as_mut() {
            if i > pos.entry_index {
                pos.observe_close(close);
                match resolve_exit(pos, close, signals.sell[i]) {
                    Some(ExitKind::LadderFirstStage) => {
                        let leg_units = pos.units * 0.5;
                        let trade = close_leg(pos, leg_units, i, candle, ExitReason::Tp, risk);
                        balance += trade.gross_pnl - trade.exit_fee;
                        debug!(
                            index = i,
                            net_pnl = trade.net_pnl,
                            "ladder first stage closed"
                        );
                        trades.push(trade);
                        pos.units -= leg_units;
                        pos.tp1_hit = true;
                    }
                    Some(ExitKind::Full(reason)) => {
                        let trade = close_leg(pos, pos.units, i, candle, reason, risk);
                        balance += trade.gross_pnl - trade.exit_fee;
                        debug!(
                            index = i,
                            reason = %trade.exit_reason,
                            net_pnl = trade.net_pnl,
                            "position closed"
                        );
                        trades.push(trade);
                        closed_all = true;
                    }
                    None => {}
                }
            }
        }
        if closed_all {
            position = None;
        }

        // Entry, only with the slot free and at least one later bar to
        // evaluate the exit conditions on.
        if position.is_none() && signals.buy[i] && i + 1 < candles.len() {
            let entry_price = close;
            let entry_price_effective = entry_price * (1.0 + risk.slippage_pct);
            let equity_for_sizing = if config.sizing.no_compounding {
                config.initial_balance
            } else {
                balance
            };
            let units = units_for_entry(
                config.sizing.policy,
                equity_for_sizing,
                config.leverage,
                entry_price_effective,
                risk.stop_loss_pct,
            );
            let entry_fee = risk.fee_pct * units * entry_price_effective;
            balance -= entry_fee;

            let take_profit = if let Some(ladder) = risk.tp_ladder {
                TakeProfit::Ladder {
                    tp1: entry_price_effective * (1.0 + ladder.tp1_pct),
                    tp2: entry_price_effective * (1.0 + ladder.tp2_pct),
                }
            } else if risk.take_profit_pct > 0.0 {
                TakeProfit::Single {
                    price: entry_price_effective * (1.0 + risk.take_profit_pct),
                }
            } else {
                TakeProfit::None
            };
            let stop_loss_price = (risk.stop_loss_pct > 0.0)
                .then(|| entry_price_effective * (1.0 - risk.stop_loss_pct));

            debug!(index = i, units, entry_price, "position opened");
            position = Some(Position {
                entry_index: i,
                entry_time: candle.open_time,
                entry_price,
                entry_price_effective,
                entry_fee,
                units_initial: units,
                units,
                highest_since_entry: entry_price,
                stop_loss_price,
                take_profit,
                trailing_stop_pct: risk.trailing_stop_pct,
                tp1_hit: false,
            });
        }

        let equity = balance + position.as_ref().map_or(0.0, |p| p.unrealized_pnl(close));
        tracker.observe(equity);

        if let Some(floor) = early_stop_floor {
            if equity <= floor {
                if let Some(pos) = position.take() {
                    let trade = close_leg(&pos, pos.units, i, candle, ExitReason::Last, risk);
                    balance += trade.gross_pnl - trade.exit_fee;
                    trades.push(trade);
                }
                debug!(index = i, equity, floor, "early stop triggered");
                aborted_early = true;
                break;
            }
        }
    }

    // Terminal forced close at the final bar's close.
    if let Some(pos) = position.take() {
        let last = candles.len() - 1;
        let trade = close_leg(&pos, pos.units, last, &candles[last], ExitReason::Last, risk);
        balance += trade.gross_pnl - trade.exit_fee;
        debug!(net_pnl = trade.net_pnl, "series exhausted, position closed");
        trades.push(trade);
    }

    let total_trades = trades.len();
    let wins = trades.iter().filter(|t| t.is_winner()).count();
    SimulationResult {
        initial_balance: config.initial_balance,
        final_balance: balance,
        profit: balance - config.initial_balance,
        profit_percentage: metrics::profit_percentage(config.initial_balance, balance),
        total_trades,
        win_rate: metrics::win_rate(wins, total_trades),
        max_drawdown_pct: tracker.max_drawdown_pct(),
        trades,
        equity_curve: tracker.into_curve(),
        aborted_early,
        insufficient_trades: total_trades < config.min_trades,
    }
}
