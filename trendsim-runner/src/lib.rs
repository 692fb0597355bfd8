//! TrendSim Runner — parameter optimization, metrics, leaderboards.
//!
//! This crate builds on `trendsim-core` to provide:
//! - Single-backtest runner with metrics and fingerprints
//! - Parameter spaces (value lists and ranges) expanded into a grid
//! - Exhaustive parallel sweep and seeded local search (hill climb, annealing)
//! - In-memory result cache keyed by dataset and run configuration
//! - Ranked, bounded leaderboard
//! - TOML session configuration

pub mod cache;
pub mod config;
pub mod fitness;
pub mod leaderboard;
pub mod metrics;
pub mod optimizer;
pub mod runner;
pub mod space;

pub use cache::ResultCache;
pub use config::{ConfigError, SearchConfig, SearchMode, SweepConfig};
pub use fitness::FitnessMetric;
pub use leaderboard::{rank_cmp, InsertResult, Leaderboard, RankedRun};
pub use metrics::PerformanceMetrics;
pub use optimizer::{
    optimize, Annealing, CancelFlag, HillClimb, LocalSearch, OptimizeError, OptimizeReport,
    Optimizer,
};
pub use runner::{run_single, RunError, RunReport};
pub use space::{Axis, ParamGrid, ParamSpace};
