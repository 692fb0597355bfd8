//! Sweep configuration — TOML-deserializable description of one session.
//!
//! ```toml
//! [account]
//! capital = 10000.0
//! risk_fraction = 0.02
//!
//! [params]            # used by single backtests
//! short_length = 12
//!
//! [space]
//! short_length = [5, 10, 15]
//! long_length = { start = 20, end = 60, step = 10 }
//!
//! [search]
//! mode = "annealing"
//! iterations = 300
//! seed = 7
//! fitness = "return_over_drawdown"
//! ```
//!
//! Every table is optional; missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trendsim_core::{SimulationOptions, StrategyParams};

use crate::fitness::FitnessMetric;
use crate::space::ParamSpace;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid parameter space: {0}")]
    InvalidSpace(String),
    #[error("invalid search settings: {0}")]
    InvalidSearch(&'static str),
}

/// How the optimizer walks the parameter space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Every combination, in parallel when enabled.
    #[default]
    Exhaustive,
    /// Greedy moves to better neighbours.
    HillClimb,
    /// Neighbour moves accepted by the Metropolis rule under a cooling
    /// temperature.
    Annealing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    /// Neighbour proposals for the heuristic modes.
    pub iterations: usize,
    pub seed: u64,
    pub initial_temperature: f64,
    /// Multiplier applied to the temperature after every proposal.
    pub cooling: f64,
    pub fitness: FitnessMetric,
    /// Keep only the best N runs; `None` keeps all.
    pub top_n: Option<usize>,
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Exhaustive,
            iterations: 200,
            seed: 42,
            initial_temperature: 1.0,
            cooling: 0.95,
            fitness: FitnessMetric::NetProfit,
            top_n: None,
            parallel: true,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode != SearchMode::Exhaustive && self.iterations == 0 {
            return Err(ConfigError::InvalidSearch(
                "iterations must be positive for heuristic search",
            ));
        }
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(ConfigError::InvalidSearch(
                "initial_temperature must be finite and positive",
            ));
        }
        if !(self.cooling > 0.0 && self.cooling <= 1.0) {
            return Err(ConfigError::InvalidSearch("cooling must be in (0, 1]"));
        }
        if self.top_n == Some(0) {
            return Err(ConfigError::InvalidSearch("top_n must be positive"));
        }
        Ok(())
    }
}

/// Everything one `backtest` or `optimize` invocation needs besides bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub account: SimulationOptions,
    pub params: StrategyParams,
    pub space: ParamSpace,
    pub search: SearchConfig,
}

impl SweepConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate the space and search tables.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.space.grid()?;
        config.search.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Axis;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = SweepConfig::from_toml("").unwrap();
        assert_eq!(config, SweepConfig::default());
        assert_eq!(config.search.mode, SearchMode::Exhaustive);
        assert_eq!(config.params, StrategyParams::default());
    }

    #[test]
    fn parses_every_table() {
        let config = SweepConfig::from_toml(
            r#"
            [account]
            capital = 5000.0
            spread = 0.5

            [params]
            short_length = 3
            long_length = 8

            [space]
            short_length = [2, 3]
            long_length = { start = 10, end = 30, step = 10 }
            entry_threshold = [0, 0.5]

            [search]
            mode = "hill_climb"
            iterations = 50
            seed = 9
            fitness = "sharpe"
            top_n = 5
            parallel = false
            "#,
        )
        .unwrap();

        assert_eq!(config.account.capital, 5000.0);
        assert_eq!(config.account.risk_fraction, 0.03);
        assert_eq!(config.params.short_length, 3);
        assert_eq!(config.params.signal_length, 9);
        assert_eq!(config.space.short_length, Axis::Values(vec![2, 3]));
        assert_eq!(
            config.space.long_length,
            Axis::Range {
                start: 10,
                end: 30,
                step: 10
            }
        );
        assert_eq!(config.space.entry_threshold, Axis::Values(vec![0.0, 0.5]));
        assert_eq!(config.search.mode, SearchMode::HillClimb);
        assert_eq!(config.search.fitness, FitnessMetric::Sharpe);
        assert_eq!(config.search.top_n, Some(5));
        assert!(!config.search.parallel);
    }

    #[test]
    fn rejects_bad_range() {
        let err = SweepConfig::from_toml(
            r#"
            [space]
            long_length = { start = 30, end = 10, step = 5 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSpace(_)));
    }

    #[test]
    fn rejects_bad_search() {
        let err = SweepConfig::from_toml("[search]\ncooling = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSearch(_)));
        let err = SweepConfig::from_toml("[search]\nmode = \"annealing\"\niterations = 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSearch(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = SweepConfig::from_toml("[search\nmode = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = SweepConfig::from_toml("[search]\nmode = \"genetic\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
