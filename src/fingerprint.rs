//! Run fingerprinting — deterministic identity of a simulation run.
//!
//! Sweep tooling launches thousands of runs and deduplicates or resumes by
//! identity, so the digest must be stable across processes and platforms:
//! BLAKE3 over a canonical byte form, never a pointer- or iteration-order-
//! dependent hash.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::BacktestConfig;
use crate::domain::Candle;

/// BLAKE3 digest of a configuration's canonical JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigDigest(pub String);

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// BLAKE3 digest of raw candle content (timestamps and OHLCV bit patterns).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetDigest(pub String);

impl fmt::Display for DatasetDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest the full configuration, every strategy/risk/sizing field included.
///
/// Struct field order is fixed at compile time, so `serde_json` output is
/// already canonical without key sorting.
pub fn config_digest(config: &BacktestConfig) -> ConfigDigest {
    let json = serde_json::to_string(config).expect("config must serialize");
    ConfigDigest(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// Digest a candle series by content. Two series hash equal iff every
/// timestamp and every OHLCV value is bit-identical.
pub fn candles_digest(candles: &[Candle]) -> DatasetDigest {
    let mut hasher = blake3::Hasher::new();
    for candle in candles {
        hasher.update(&candle.open_time.timestamp_millis().to_le_bytes());
        hasher.update(&candle.open.to_le_bytes());
        hasher.update(&candle.high.to_le_bytes());
        hasher.update(&candle.low.to_le_bytes());
        hasher.update(&candle.close.to_le_bytes());
        hasher.update(&candle.volume.to_le_bytes());
    }
    DatasetDigest(hasher.finalize().to_hex().to_string())
}

/// Complete identity of one run: the configuration and the data it saw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config: ConfigDigest,
    pub dataset: DatasetDigest,
}

impl RunFingerprint {
    pub fn new(config: &BacktestConfig, candles: &[Candle]) -> Self {
        Self {
            config: config_digest(config),
            dataset: candles_digest(candles),
        }
    }

    /// Combined hex id for result files and resume checks.
    pub fn id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.config.0.as_bytes());
        hasher.update(self.dataset.0.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
