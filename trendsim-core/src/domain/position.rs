//! Position state — the simulator's Flat / Long / Short state machine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Market exposure held by the simulator at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Flat,
    Long,
    Short,
}

/// Side of an open position or completed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Direction::Long,
            Side::Short => Direction::Short,
        }
    }
}

/// An open position. Owned by a single backtest replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_index: usize,
    pub entry_date: NaiveDateTime,
    pub entry_price: f64,
    pub stake_per_point: f64,
    /// Active stop; only ever tightens.
    pub stop_price: f64,
    pub initial_stop: f64,
}

impl Position {
    pub fn direction(&self) -> Direction {
        self.side.into()
    }

    /// Signed price move in the position's favour.
    pub fn points(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price)
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.points(price) * self.stake_per_point
    }

    /// True when the bar's range reaches the active stop.
    pub fn stop_breached(&self, high: f64, low: f64) -> bool {
        match self.side {
            Side::Long => low <= self.stop_price,
            Side::Short => high >= self.stop_price,
        }
    }

    /// Move the stop toward price using a fresh candidate level. The stop
    /// never loosens: longs keep the max, shorts keep the min.
    pub fn ratchet_stop(&mut self, candidate: f64) {
        if !candidate.is_finite() {
            return;
        }
        self.stop_price = match self.side {
            Side::Long => self.stop_price.max(candidate),
            Side::Short => self.stop_price.min(candidate),
        };
    }
}

/// Current exposure, Flat when nothing is open.
pub fn held_direction(position: Option<&Position>) -> Direction {
    position.map_or(Direction::Flat, Position::direction)
}
