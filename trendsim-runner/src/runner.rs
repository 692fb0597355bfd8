//! Single-run entry point — wires together the engine, metrics and fitness.
//!
//! `run_single()` replays the config's `[params]` over pre-loaded bars and
//! returns the result with its metrics, score and fingerprints. Used by the
//! CLI `backtest` command.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use trendsim_core::fingerprint::{ConfigHash, DatasetHash};
use trendsim_core::{run_backtest, BacktestResult, EngineError, PriceBar};

use crate::config::SweepConfig;
use crate::fitness::FitnessMetric;
use crate::metrics::PerformanceMetrics;

/// Current schema version for emitted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub dataset_hash: DatasetHash,
    pub config_hash: ConfigHash,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub fitness: FitnessMetric,
    pub metrics: PerformanceMetrics,
    pub result: BacktestResult,
}

pub fn run_single(bars: &[PriceBar], config: &SweepConfig) -> Result<RunReport, RunError> {
    let params = config.params;
    let mut result = run_backtest(bars, &params, &config.account)?;
    let metrics = PerformanceMetrics::compute(&result);
    let fitness = config.search.fitness;
    if result.is_complete() {
        let score = fitness.extract(&metrics);
        result.performance_score = score.is_finite().then_some(score);
    }
    info!(
        %params,
        status = ?result.status,
        trades = metrics.trade_count,
        skipped = metrics.skipped_count,
        net_profit = metrics.net_profit,
        "backtest finished"
    );
    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        dataset_hash: DatasetHash::of(bars),
        config_hash: ConfigHash::of(&params, &config.account),
        bar_count: bars.len(),
        warmup_bars: params.warmup_bars(),
        fitness,
        metrics,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendsim_core::{RunStatus, StrategyParams};

    #[test]
    fn empty_series_reports_insufficient_data() {
        let report = run_single(&[], &SweepConfig::default()).unwrap();
        assert_eq!(report.result.status, RunStatus::InsufficientData);
        assert_eq!(report.result.performance_score, None);
        assert_eq!(report.bar_count, 0);
        assert_eq!(report.warmup_bars, 26);
        assert_eq!(report.metrics.trade_count, 0);
    }

    #[test]
    fn invalid_params_are_an_error() {
        let config = SweepConfig {
            params: StrategyParams {
                short_length: 30,
                long_length: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            run_single(&[], &config),
            Err(RunError::Engine(EngineError::InvalidParams(_)))
        ));
    }
}
