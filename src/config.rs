//! Serializable backtest configuration.
//!
//! The whole caller-facing schema lives here: strategy knobs (indicator
//! periods, filter toggles), risk parameters, and the position-sizing
//! policy. Every struct rejects unknown keys, carries documented defaults,
//! and is checked by [`BacktestConfig::validate`] before a simulation runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// UTC trading-session buckets. Hours are half-open: asia [0, 8),
/// europe [8, 16), us [16, 24).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Asia,
    Europe,
    Us,
}

impl Session {
    /// Bucket for a UTC hour (0..24).
    pub fn of_hour(hour: u32) -> Session {
        match hour {
            0..=7 => Session::Asia,
            8..=15 => Session::Europe,
            _ => Session::Us,
        }
    }
}

/// Candle timeframe used for higher-timeframe resampling.
///
/// Buckets are aligned to the Unix epoch, so daily buckets start at UTC
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn duration_secs(&self) -> i64 {
        match self {
            Timeframe::M5 => 5 * 60,
            Timeframe::M15 => 15 * 60,
            Timeframe::M30 => 30 * 60,
            Timeframe::H1 => 3600,
            Timeframe::H2 => 2 * 3600,
            Timeframe::H4 => 4 * 3600,
            Timeframe::D1 => 24 * 3600,
        }
    }

    /// Start of the bucket containing `ts`, floored to the timeframe width.
    pub fn bucket_start(&self, ts: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        let width = self.duration_secs();
        let floored = ts.timestamp().div_euclid(width) * width;
        chrono::DateTime::from_timestamp(floored, 0).expect("floored timestamp representable")
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        };
        f.write_str(s)
    }
}

/// Position-sizing policy, resolved once per entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingPolicy {
    /// Notional = equity × value; units carry the configured leverage.
    CapitalFraction { value: f64 },

    /// Units chosen so a stop-loss hit loses exactly `value` of equity.
    /// Requires a positive `stop_loss_pct`.
    RiskPerTrade { value: f64 },

    /// Direct unit quantity, kept for backward compatibility with older
    /// strategy files.
    FixedUnits { units: f64 },
}

/// Indicator and signal-filter settings consumed by the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    // ── EMA cross ──
    pub fast_ema_period: usize,
    pub slow_ema_period: usize,

    // ── Informational columns ──
    pub stoch_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    // ── Trend filter (higher timeframe) ──
    pub enable_trend_filter: bool,
    pub trend_timeframe: Timeframe,
    pub trend_fast: usize,
    pub trend_slow: usize,

    // ── Session filter ──
    pub enable_session_filter: bool,
    pub allowed_sessions: Vec<Session>,

    // ── Volume/momentum confirmation ──
    pub enable_volume_momentum: bool,
    pub volume_avg_period: usize,
    pub volume_spike_factor: f64,

    // ── Support/resistance ──
    pub enable_sr_detection: bool,
    pub sr_lookback_period: usize,
    pub sr_num_levels: usize,
    pub enable_sr_filter: bool,
    /// Relative distance (fraction of close) under which a level suppresses
    /// a signal.
    pub sr_proximity_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast_ema_period: 9,
            slow_ema_period: 21,
            stoch_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            enable_trend_filter: false,
            trend_timeframe: Timeframe::H4,
            trend_fast: 20,
            trend_slow: 50,
            enable_session_filter: false,
            allowed_sessions: vec![Session::Asia, Session::Europe, Session::Us],
            enable_volume_momentum: false,
            volume_avg_period: 20,
            volume_spike_factor: 1.5,
            enable_sr_detection: false,
            sr_lookback_period: 50,
            sr_num_levels: 3,
            enable_sr_filter: false,
            sr_proximity_threshold: 0.005,
        }
    }
}

/// Two-stage take-profit ladder: half the units close at `tp1_pct`, the
/// remainder keeps trailing toward `tp2_pct`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TpLadder {
    pub tp1_pct: f64,
    pub tp2_pct: f64,
}

/// Exit thresholds and trading-cost model. All values are fractions
/// (0.01 = 1%); zero disables the corresponding exit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    pub fee_pct: f64,
    pub slippage_pct: f64,
    /// Mutually exclusive with `take_profit_pct`. Declared last so TOML
    /// emits it after the scalar keys.
    pub tp_ladder: Option<TpLadder>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            trailing_stop_pct: 0.0,
            fee_pct: 0.0,
            slippage_pct: 0.0,
            tp_ladder: None,
        }
    }
}

/// Sizing policy plus the compounding switch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// When set, entries size off the fixed initial balance instead of the
    /// running balance.
    pub no_compounding: bool,
    pub policy: SizingPolicy,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            no_compounding: false,
            policy: SizingPolicy::CapitalFraction { value: 0.1 },
        }
    }
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub initial_balance: f64,

    #[serde(default = "default_leverage")]
    pub leverage: f64,

    /// Abort the run once equity (incl. unrealized PnL) falls to or below
    /// `initial_balance × frac`. `None` disables the safeguard.
    #[serde(default)]
    pub early_stop_balance_frac: Option<f64>,

    /// Below this trade count the result is flagged `insufficient_trades`.
    #[serde(default)]
    pub min_trades: usize,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub sizing: SizingConfig,
}

fn default_leverage() -> f64 {
    1.0
}

impl BacktestConfig {
    /// Config with defaults everywhere except the starting balance.
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            leverage: 1.0,
            early_stop_balance_frac: None,
            min_trades: 0,
            strategy: StrategyConfig::default(),
            risk: RiskConfig::default(),
            sizing: SizingConfig::default(),
        }
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: BacktestConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every bound the schema promises. Run before any simulation;
    /// the simulator calls this itself on entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ConfigError::NonPositiveBalance(self.initial_balance));
        }
        if !(self.leverage.is_finite() && self.leverage > 0.0) {
            return Err(ConfigError::NonPositiveLeverage(self.leverage));
        }

        let s = &self.strategy;
        for (name, period) in [
            ("fast_ema_period", s.fast_ema_period),
            ("slow_ema_period", s.slow_ema_period),
            ("stoch_length", s.stoch_length),
            ("macd_fast", s.macd_fast),
            ("macd_slow", s.macd_slow),
            ("macd_signal", s.macd_signal),
            ("trend_fast", s.trend_fast),
            ("trend_slow", s.trend_slow),
            ("volume_avg_period", s.volume_avg_period),
            ("sr_lookback_period", s.sr_lookback_period),
            ("sr_num_levels", s.sr_num_levels),
        ] {
            if period == 0 {
                return Err(ConfigError::PeriodTooSmall { name });
            }
        }
        if s.fast_ema_period >= s.slow_ema_period {
            return Err(ConfigError::EmaOrder {
                fast: s.fast_ema_period,
                slow: s.slow_ema_period,
            });
        }
        if s.trend_fast >= s.trend_slow {
            return Err(ConfigError::TrendEmaOrder {
                fast: s.trend_fast,
                slow: s.trend_slow,
            });
        }
        if !(s.volume_spike_factor.is_finite() && s.volume_spike_factor > 0.0) {
            return Err(ConfigError::NonPositiveFactor {
                name: "volume_spike_factor",
            });
        }
        if !(s.sr_proximity_threshold.is_finite() && s.sr_proximity_threshold >= 0.0) {
            return Err(ConfigError::NegativeRate {
                name: "sr_proximity_threshold",
            });
        }
        if s.enable_session_filter && s.allowed_sessions.is_empty() {
            return Err(ConfigError::EmptySessions);
        }

        let r = &self.risk;
        for (name, rate) in [
            ("stop_loss_pct", r.stop_loss_pct),
            ("take_profit_pct", r.take_profit_pct),
            ("trailing_stop_pct", r.trailing_stop_pct),
            ("fee_pct", r.fee_pct),
            ("slippage_pct", r.slippage_pct),
        ] {
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(ConfigError::NegativeRate { name });
            }
        }
        for (name, rate) in [
            ("stop_loss_pct", r.stop_loss_pct),
            ("trailing_stop_pct", r.trailing_stop_pct),
            ("slippage_pct", r.slippage_pct),
        ] {
            if rate >= 1.0 {
                return Err(ConfigError::RateAboveOne { name });
            }
        }
        if let Some(ladder) = r.tp_ladder {
            if !(ladder.tp1_pct.is_finite()
                && ladder.tp2_pct.is_finite()
                && ladder.tp1_pct > 0.0
                && ladder.tp1_pct < ladder.tp2_pct)
            {
                return Err(ConfigError::InvalidLadder);
            }
            if r.take_profit_pct > 0.0 {
                return Err(ConfigError::ConflictingTakeProfit);
            }
        }

        match self.sizing.policy {
            SizingPolicy::CapitalFraction { value } | SizingPolicy::RiskPerTrade { value } => {
                if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                    return Err(ConfigError::SizingValueOutOfRange(value));
                }
            }
            SizingPolicy::FixedUnits { units } => {
                if !(units.is_finite() && units > 0.0) {
                    return Err(ConfigError::NonPositiveUnits(units));
                }
            }
        }
        if matches!(self.sizing.policy, SizingPolicy::RiskPerTrade { .. })
            && self.risk.stop_loss_pct <= 0.0
        {
            return Err(ConfigError::RiskSizingWithoutStop);
        }

        if let Some(frac) = self.early_stop_balance_frac {
            if !(frac.is_finite() && (0.0..=1.0).contains(&frac)) {
                return Err(ConfigError::EarlyStopOutOfRange(frac));
            }
        }

        Ok(())
    }
}

/// A configuration bound was violated, or a config file failed to parse.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial_balance must be positive, got {0}")]
    NonPositiveBalance(f64),

    #[error("leverage must be positive, got {0}")]
    NonPositiveLeverage(f64),

    #[error("{name} must be at least 1")]
    PeriodTooSmall { name: &'static str },

    #[error("fast_ema_period ({fast}) must be below slow_ema_period ({slow})")]
    EmaOrder { fast: usize, slow: usize },

    #[error("trend_fast ({fast}) must be below trend_slow ({slow})")]
    TrendEmaOrder { fast: usize, slow: usize },

    #[error("{name} must be a positive finite number")]
    NonPositiveFactor { name: &'static str },

    #[error("{name} must be a non-negative finite number")]
    NegativeRate { name: &'static str },

    #[error("{name} must be below 1")]
    RateAboveOne { name: &'static str },

    #[error("allowed_sessions must not be empty when the session filter is enabled")]
    EmptySessions,

    #[error("sizing value must be within (0, 1], got {0}")]
    SizingValueOutOfRange(f64),

    #[error("fixed units must be positive, got {0}")]
    NonPositiveUnits(f64),

    #[error("risk_per_trade sizing requires stop_loss_pct > 0")]
    RiskSizingWithoutStop,

    #[error("tp_ladder requires 0 < tp1_pct < tp2_pct")]
    InvalidLadder,

    #[error("tp_ladder and take_profit_pct are mutually exclusive")]
    ConflictingTakeProfit,

    #[error("early_stop_balance_frac must be within [0, 1], got {0}")]
    EarlyStopOutOfRange(f64),

    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize TOML config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
