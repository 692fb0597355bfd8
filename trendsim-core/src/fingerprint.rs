//! Run fingerprinting — deterministic identities for datasets and run
//! configurations.
//!
//! - `DatasetHash`: BLAKE3 over every bar's timestamp and OHLCV bits.
//! - `ConfigHash`: BLAKE3 over strategy parameters plus simulation options.
//!
//! Together they key the optimizer's result cache. Hashing uses the exact
//! bit patterns of every float, so two series that differ in any field
//! never collide by construction.

use crate::domain::{PriceBar, StrategyParams};
use crate::engine::SimulationOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash([u8; 32]);

/// Identity of one run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash([u8; 32]);

impl DatasetHash {
    pub fn of(bars: &[PriceBar]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(bars.len() as u64).to_le_bytes());
        for bar in bars {
            let ts = bar.timestamp.and_utc();
            hasher.update(&ts.timestamp().to_le_bytes());
            hasher.update(&ts.timestamp_subsec_nanos().to_le_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        Self(*hasher.finalize().as_bytes())
    }
}

impl ConfigHash {
    pub fn of(params: &StrategyParams, options: &SimulationOptions) -> Self {
        let mut hasher = blake3::Hasher::new();
        for n in [
            params.short_length,
            params.long_length,
            params.signal_length,
            params.channel_length,
        ] {
            hasher.update(&(n as u64).to_le_bytes());
        }
        for v in [
            params.entry_threshold,
            params.exit_threshold,
            options.capital,
            options.risk_fraction,
            options.min_stake,
            options.stake_increment,
            options.spread,
            options.margin_requirement,
            options.min_stop_distance,
        ] {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", blake3::Hash::from(self.0).to_hex())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", blake3::Hash::from(self.0).to_hex())
    }
}
