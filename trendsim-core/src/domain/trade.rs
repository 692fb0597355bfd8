//! Trade — a completed round trip, immutable once recorded.

use super::position::{Position, Side};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// Signal Generator withdrew support for the held direction.
    Signal,
    /// Bar range touched the active stop.
    Stop,
    /// Still open on the final bar; closed at the final close.
    ForcedClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Profit,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,

    pub entry_index: usize,
    pub entry_date: NaiveDateTime,
    pub entry_price: f64,

    pub exit_index: usize,
    pub exit_date: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    pub stake_per_point: f64,
    /// Stop in force when the trade closed.
    pub stop_price: f64,
    pub initial_stop: f64,

    /// Signed price move in the trade's favour.
    pub points: f64,
    pub profit_or_loss: f64,
    /// Amount at risk at entry: stake * |entry - initial_stop|.
    pub risk: f64,
    /// profit_or_loss / risk.
    pub risk_reward: f64,
    pub outcome: Outcome,
}

impl Trade {
    /// Close `position` at `exit_price` on bar `exit_index`.
    pub fn close(
        position: &Position,
        exit_index: usize,
        exit_date: NaiveDateTime,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let points = position.points(exit_price);
        let profit_or_loss = points * position.stake_per_point;
        let risk = position.stake_per_point * (position.entry_price - position.initial_stop).abs();
        let risk_reward = if risk > 0.0 { profit_or_loss / risk } else { 0.0 };
        Self {
            side: position.side,
            entry_index: position.entry_index,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_index,
            exit_date,
            exit_price,
            exit_reason,
            stake_per_point: position.stake_per_point,
            stop_price: position.stop_price,
            initial_stop: position.initial_stop,
            points,
            profit_or_loss,
            risk,
            risk_reward,
            outcome: if profit_or_loss > 0.0 {
                Outcome::Profit
            } else {
                Outcome::Loss
            },
        }
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Profit
    }
}
