//! TrendSim Core — indicators, signals, sizing and the bar-by-bar simulator.
//!
//! This crate contains the pure computation of the trend simulator:
//! - Domain types (price bars, strategy params, positions, trades)
//! - Indicator Engine: EMAs, MACD, sentiment, incremental Donchian channel
//! - Signal Generator with hysteresis-gated EMA crossover
//! - Position Sizer with broker market rules
//! - Backtest Simulator: Flat / Long / Short state machine with trailing stop
//! - Dataset and configuration fingerprints
//!
//! Nothing here performs I/O or touches global state; every run is a pure
//! function of its bars, parameters and options.

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod signals;
pub mod sizers;

pub use domain::{
    Direction, ExitReason, Outcome, ParamsError, Position, PriceBar, Side, StrategyParams, Trade,
};
pub use engine::{
    run_backtest, BacktestResult, EngineError, EquityPoint, RunStatus, SimulationOptions,
    SkippedTrade,
};
pub use indicators::{compute, IndicatorFrame, Sentiment};
pub use signals::{signal_for, TradeSignal};
pub use sizers::{stake_per_point, PositionSizer, SizingError, SkipReason};
