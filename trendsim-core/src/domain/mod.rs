//! Domain types for the trend simulator.

pub mod bar;
pub mod params;
pub mod position;
pub mod trade;

pub use bar::{validate_bars, BarError, PriceBar};
pub use params::{ParamsError, StrategyParams};
pub use position::{held_direction, Direction, Position, Side};
pub use trade::{ExitReason, Outcome, Trade};
