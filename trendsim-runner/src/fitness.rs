//! Fitness function — configurable metric selector for ranking runs.
//!
//! The optimizer accepts any `Fn(&BacktestResult) -> f64 + Sync`; the
//! built-in selectors below cover the common choices.

use crate::metrics::PerformanceMetrics;
use serde::{Deserialize, Serialize};
use trendsim_core::BacktestResult;

/// Drawdown floor for `ReturnOverDrawdown`, so a run that never drew down
/// scores its return times 100 instead of dividing by zero.
const MIN_DRAWDOWN: f64 = 0.01;

/// Which metric to optimize/sort by. Higher is better for all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    NetProfit,
    ReturnOverDrawdown,
    Sharpe,
    ProfitFactor,
    WinRate,
}

impl FitnessMetric {
    /// Extract the relevant metric value from a PerformanceMetrics struct.
    pub fn extract(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            Self::NetProfit => metrics.net_profit,
            Self::ReturnOverDrawdown => {
                metrics.total_return / metrics.max_drawdown.abs().max(MIN_DRAWDOWN)
            }
            Self::Sharpe => metrics.sharpe,
            Self::ProfitFactor => metrics.profit_factor,
            Self::WinRate => metrics.win_rate,
        }
    }

    pub fn score(&self, result: &BacktestResult) -> f64 {
        self.extract(&PerformanceMetrics::compute(result))
    }
}
