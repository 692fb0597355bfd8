//! StrategyParams — the tunable numeric knobs of the crossover strategy.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Strategy parameters for one backtest run.
///
/// Thresholds are absolute magnitudes of the MACD histogram (`macd_trend`),
/// expressed in price points. A threshold of zero disables that band. The
/// exit band must sit inside the entry band, otherwise a histogram parked
/// between the two would flip sentiment on every bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub short_length: usize,
    pub long_length: usize,
    pub signal_length: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub channel_length: usize,
}

/// Rejected parameter combinations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("{name} must be >= 1")]
    ZeroPeriod { name: &'static str },
    #[error("short_length {short} must be below long_length {long}")]
    NonMonotonicLengths { short: usize, long: usize },
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("exit_threshold {exit} must not exceed entry_threshold {entry}")]
    InvertedBands { entry: f64, exit: f64 },
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            short_length: 12,
            long_length: 26,
            signal_length: 9,
            entry_threshold: 0.0,
            exit_threshold: 0.0,
            channel_length: 20,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, value) in [
            ("short_length", self.short_length),
            ("long_length", self.long_length),
            ("signal_length", self.signal_length),
            ("channel_length", self.channel_length),
        ] {
            if value == 0 {
                return Err(ParamsError::ZeroPeriod { name });
            }
        }
        if self.short_length >= self.long_length {
            return Err(ParamsError::NonMonotonicLengths {
                short: self.short_length,
                long: self.long_length,
            });
        }
        for (name, value) in [
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamsError::InvalidThreshold { name, value });
            }
        }
        if self.exit_threshold > self.entry_threshold {
            return Err(ParamsError::InvertedBands {
                entry: self.entry_threshold,
                exit: self.exit_threshold,
            });
        }
        Ok(())
    }

    /// Bars required before the simulator may act: the slow EMA and the
    /// Donchian window must both be filled.
    pub fn warmup_bars(&self) -> usize {
        self.channel_length.max(self.long_length)
    }

    /// Deterministic total order used to break ranking ties.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.short_length
            .cmp(&other.short_length)
            .then(self.long_length.cmp(&other.long_length))
            .then(self.signal_length.cmp(&other.signal_length))
            .then(self.entry_threshold.total_cmp(&other.entry_threshold))
            .then(self.exit_threshold.total_cmp(&other.exit_threshold))
            .then(self.channel_length.cmp(&other.channel_length))
    }
}

impl fmt::Display for StrategyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ema({},{}) signal({}) bands({}/{}) channel({})",
            self.short_length,
            self.long_length,
            self.signal_length,
            self.entry_threshold,
            self.exit_threshold,
            self.channel_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(StrategyParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_period() {
        let p = StrategyParams {
            signal_length: 0,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ParamsError::ZeroPeriod {
                name: "signal_length"
            })
        );
    }

    #[test]
    fn rejects_short_not_below_long() {
        let p = StrategyParams {
            short_length: 26,
            long_length: 26,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ParamsError::NonMonotonicLengths { short: 26, long: 26 })
        );
    }

    #[test]
    fn rejects_negative_or_nan_threshold() {
        let p = StrategyParams {
            entry_threshold: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParamsError::InvalidThreshold {
                name: "entry_threshold",
                ..
            })
        ));
        let p = StrategyParams {
            exit_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_exit_band_outside_entry_band() {
        let p = StrategyParams {
            entry_threshold: 0.1,
            exit_threshold: 0.5,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvertedBands {
                entry: 0.1,
                exit: 0.5
            })
        );
        let p = StrategyParams {
            entry_threshold: 0.5,
            exit_threshold: 0.5,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn warmup_is_max_of_channel_and_long() {
        let p = StrategyParams {
            long_length: 40,
            channel_length: 20,
            ..Default::default()
        };
        assert_eq!(p.warmup_bars(), 40);
        let p = StrategyParams {
            long_length: 10,
            short_length: 5,
            channel_length: 30,
            ..Default::default()
        };
        assert_eq!(p.warmup_bars(), 30);
    }

    #[test]
    fn canonical_order_is_total() {
        let a = StrategyParams::default();
        let b = StrategyParams {
            channel_length: 21,
            ..a
        };
        assert_eq!(a.canonical_cmp(&b), Ordering::Less);
        assert_eq!(b.canonical_cmp(&a), Ordering::Greater);
        assert_eq!(a.canonical_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(
            StrategyParams::default().to_string(),
            "ema(12,26) signal(9) bands(0/0) channel(20)"
        );
    }
}
