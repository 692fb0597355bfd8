//! Performance metrics — pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! The equity curve used here is realized equity plus the open position's
//! unrealized P/L at each bar close.

use serde::{Deserialize, Serialize};
use trendsim_core::{BacktestResult, Trade};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub net_profit: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_risk_reward: f64,
    pub sharpe: f64,
    pub trade_count: usize,
    pub skipped_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let curve: Vec<f64> = result.equity_curve.iter().map(|p| p.total()).collect();
        Self {
            net_profit: result.net_profit(),
            total_return: total_return(result.starting_capital, result.ending_equity),
            max_drawdown: max_drawdown(&curve),
            win_rate: win_rate(&result.trades),
            profit_factor: profit_factor(&result.trades),
            avg_risk_reward: avg_risk_reward(&result.trades),
            sharpe: sharpe_ratio(&curve),
            trade_count: result.trades.len(),
            skipped_count: result.skipped.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_equity - initial) / initial
}

/// Annualized Sharpe ratio of per-bar equity changes.
///
/// Sharpe = mean(bar returns) / std(bar returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * (252.0_f64).sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate: fraction of trades that closed at a profit.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit_or_loss > 0.0)
        .map(|t| t.profit_or_loss)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit_or_loss < 0.0)
        .map(|t| t.profit_or_loss.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean of per-trade P/L divided by initial risk.
pub fn avg_risk_reward(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.risk_reward).sum::<f64>() / trades.len() as f64
}

/// Simple returns between consecutive equity values.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use trendsim_core::{ExitReason, Position, Side};

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// A long trade entered at 100 with stop 90 and one unit per point.
    fn make_trade(exit_price: f64) -> Trade {
        let position = Position {
            side: Side::Long,
            entry_index: 1,
            entry_date: ts(1),
            entry_price: 100.0,
            stake_per_point: 1.0,
            stop_price: 90.0,
            initial_stop: 90.0,
        };
        Trade::close(&position, 2, ts(2), exit_price, ExitReason::Signal)
    }

    #[test]
    fn total_return_positive() {
        assert!((total_return(10_000.0, 11_000.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn total_return_negative() {
        assert!((total_return(10_000.0, 9_000.0) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn total_return_zero_capital() {
        assert_eq!(total_return(0.0, 100.0), 0.0);
    }

    #[test]
    fn sharpe_constant_equity_is_zero() {
        assert_eq!(sharpe_ratio(&[100.0; 50]), 0.0);
    }

    #[test]
    fn sharpe_positive_for_rising_noisy_equity() {
        let curve: Vec<f64> = (0..100)
            .map(|i| 100.0 + i as f64 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        assert!(sharpe_ratio(&curve) > 0.0);
    }

    #[test]
    fn sharpe_single_bar() {
        assert_eq!(sharpe_ratio(&[100.0]), 0.0);
    }

    #[test]
    fn max_drawdown_known() {
        let curve = [100.0, 120.0, 90.0, 110.0, 60.0, 130.0];
        assert!((max_drawdown(&curve) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_increase() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn max_drawdown_empty() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn win_rate_mixed() {
        let trades = vec![make_trade(110.0), make_trade(95.0), make_trade(120.0), make_trade(100.0)];
        // A flat exit is a loss
        assert!((win_rate(&trades) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn win_rate_empty() {
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn profit_factor_mixed() {
        let trades = vec![make_trade(130.0), make_trade(90.0)];
        assert!((profit_factor(&trades) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_all_winners_capped() {
        assert_eq!(profit_factor(&[make_trade(101.0)]), 100.0);
    }

    #[test]
    fn profit_factor_no_trades() {
        assert_eq!(profit_factor(&[]), 0.0);
    }

    #[test]
    fn avg_risk_reward_known() {
        // +2R and -1R
        let trades = vec![make_trade(120.0), make_trade(90.0)];
        assert!((avg_risk_reward(&trades) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bar_returns_known() {
        let r = bar_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }
}
