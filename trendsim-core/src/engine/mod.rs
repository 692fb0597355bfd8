//! Backtest Simulator — bar-by-bar replay of one parameter combination.
//!
//! Per bar, in order:
//!
//! 1. Stop check: an open position whose stop lies inside the bar's range
//!    is closed at the stop price. This always wins over signals.
//! 2. Signal: an exit closes at the bid/ask around the close, after which
//!    the same bar is re-evaluated flat so a reversal can open immediately.
//! 3. Entry: stop from the Donchian bound, stake from the sizer; rejected
//!    entries are recorded as skipped trades.
//! 4. Trail: the stop ratchets toward the current Donchian bound.
//! 5. Mark-to-market: realized equity and unrealized P/L are recorded.
//!
//! A position still open on the final bar is force-closed at the final close.

pub mod simulator;

pub use simulator::run_backtest;

use crate::domain::{BarError, ParamsError, Side, StrategyParams, Trade};
use crate::indicators::IndicatorFrame;
use crate::sizers::{PositionSizer, SkipReason};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account and broker settings for a replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Starting account capital.
    pub capital: f64,
    /// Fraction of realized equity risked per trade.
    pub risk_fraction: f64,
    /// Smallest stake per point the broker accepts.
    pub min_stake: f64,
    /// Stakes are floored to a multiple of this.
    pub stake_increment: f64,
    /// Full bid/ask spread in price points, split evenly around the close.
    pub spread: f64,
    /// Fraction of notional held as margin.
    pub margin_requirement: f64,
    /// Closest allowed distance between entry and stop, in points.
    pub min_stop_distance: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            capital: 10_000.0,
            risk_fraction: 0.03,
            min_stake: 0.5,
            stake_increment: 0.01,
            spread: 0.0,
            margin_requirement: 0.05,
            min_stop_distance: 0.0,
        }
    }
}

impl SimulationOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.capital.is_finite() && self.capital > 0.0) {
            return Err(EngineError::InvalidOptions("capital must be finite and positive"));
        }
        for (value, msg) in [
            (self.spread, "spread must be finite and non-negative"),
            (self.min_stake, "min_stake must be finite and non-negative"),
            (
                self.stake_increment,
                "stake_increment must be finite and non-negative",
            ),
            (
                self.margin_requirement,
                "margin_requirement must be finite and non-negative",
            ),
            (
                self.min_stop_distance,
                "min_stop_distance must be finite and non-negative",
            ),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidOptions(msg));
            }
        }
        Ok(())
    }

    pub fn sizer(&self) -> PositionSizer {
        PositionSizer {
            risk_fraction: self.risk_fraction,
            min_stake: self.min_stake,
            stake_increment: self.stake_increment,
            min_stop_distance: self.min_stop_distance,
            margin_requirement: self.margin_requirement,
        }
    }

    /// Fill price when buying at `close` (long entry, short exit).
    pub fn ask(&self, close: f64) -> f64 {
        close + self.spread / 2.0
    }

    /// Fill price when selling at `close` (short entry, long exit).
    pub fn bid(&self, close: f64) -> f64 {
        close - self.spread / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid params: {0}")]
    InvalidParams(#[from] ParamsError),
    #[error("invalid bars: {0}")]
    InvalidBars(#[from] BarError),
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Complete,
    /// Too few bars for warm-up, or arithmetic degenerated to a non-finite
    /// value. Carries no trades and ranks last.
    InsufficientData,
}

/// An entry signal that did not become a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkippedTrade {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub side: Side,
    pub entry_price: f64,
    pub stop_price: f64,
    pub reason: SkipReason,
}

/// Account state at one bar close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    /// Capital plus closed-trade P/L.
    pub realized: f64,
    /// Open position marked at the bar close.
    pub unrealized: f64,
}

impl EquityPoint {
    pub fn total(&self) -> f64 {
        self.realized + self.unrealized
    }
}

/// Output of one replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub params: StrategyParams,
    pub status: RunStatus,
    pub starting_capital: f64,
    /// One frame per input bar, aligned by index.
    pub indicators: Vec<IndicatorFrame>,
    pub trades: Vec<Trade>,
    pub skipped: Vec<SkippedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Realized equity after every position is closed.
    pub ending_equity: f64,
    /// Filled in by whoever scores the run.
    pub performance_score: Option<f64>,
}

impl BacktestResult {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    pub fn net_profit(&self) -> f64 {
        self.ending_equity - self.starting_capital
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_defaults() {
        let o = SimulationOptions::default();
        assert_eq!(o.capital, 10_000.0);
        assert_eq!(o.risk_fraction, 0.03);
        assert_eq!(o.min_stake, 0.5);
        assert_eq!(o.stake_increment, 0.01);
        assert_eq!(o.spread, 0.0);
        assert_eq!(o.margin_requirement, 0.05);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn bid_ask_split_spread() {
        let o = SimulationOptions {
            spread: 2.0,
            ..Default::default()
        };
        assert_eq!(o.ask(100.0), 101.0);
        assert_eq!(o.bid(100.0), 99.0);
    }

    #[test]
    fn rejects_bad_options() {
        let o = SimulationOptions {
            capital: 0.0,
            ..Default::default()
        };
        assert!(matches!(o.validate(), Err(EngineError::InvalidOptions(_))));
        let o = SimulationOptions {
            spread: -1.0,
            ..Default::default()
        };
        assert!(o.validate().is_err());
    }

    #[test]
    fn partial_options_fill_defaults() {
        let o: SimulationOptions = serde_json::from_str(r#"{"capital": 500.0}"#).unwrap();
        assert_eq!(o.capital, 500.0);
        assert_eq!(o.risk_fraction, 0.03);
    }
}
