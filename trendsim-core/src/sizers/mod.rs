//! Position Sizer — fixed-fractional risk sizing under broker market rules.
//!
//! # Formula
//! ```text
//! risk_amount    = capital * risk_fraction
//! point_distance = |entry_price - stop_price|
//! stake          = risk_amount / point_distance
//! ```
//!
//! # Example
//! - Capital: 1000, risk 3% (30)
//! - Entry 1800, stop 1750 (50 points)
//! - Stake: 30 / 50 = 0.6 per point
//!
//! The stake is floored to the broker's increment, never rounded up. An
//! entry that cannot satisfy the market rules is reported as a
//! `SkipReason`, leaving the simulator flat.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tolerance absorbing binary representation error before flooring.
const INCREMENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("invalid risk: {0}")]
    InvalidRisk(&'static str),
}

/// Why an entry signal did not become a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Non-positive risk fraction or zero stop distance.
    InvalidRisk,
    /// Floored stake is below the broker minimum.
    BelowMinimumStake,
    /// Stop sits closer to entry than the broker allows.
    StopTooClose,
    /// Margin on the notional exceeds available equity.
    InsufficientMargin,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::InvalidRisk => "invalid risk",
            SkipReason::BelowMinimumStake => "below minimum stake",
            SkipReason::StopTooClose => "stop too close",
            SkipReason::InsufficientMargin => "insufficient margin",
        };
        f.write_str(s)
    }
}

impl From<SizingError> for SkipReason {
    fn from(_: SizingError) -> Self {
        SkipReason::InvalidRisk
    }
}

/// Raw stake per point before any broker rounding.
pub fn stake_per_point(
    capital: f64,
    risk_fraction: f64,
    entry_price: f64,
    stop_price: f64,
) -> Result<f64, SizingError> {
    if !(risk_fraction.is_finite() && risk_fraction > 0.0) {
        return Err(SizingError::InvalidRisk("risk fraction must be positive"));
    }
    if !(capital.is_finite() && capital > 0.0) {
        return Err(SizingError::InvalidRisk("capital must be positive"));
    }
    if !(entry_price.is_finite() && stop_price.is_finite()) {
        return Err(SizingError::InvalidRisk("prices must be finite"));
    }
    let point_distance = (entry_price - stop_price).abs();
    if point_distance == 0.0 {
        return Err(SizingError::InvalidRisk("entry equals stop"));
    }
    Ok(capital * risk_fraction / point_distance)
}

/// Floor `stake` to a multiple of `increment`. A non-positive increment
/// leaves the stake untouched.
pub fn floor_to_increment(stake: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return stake;
    }
    ((stake / increment) + INCREMENT_EPSILON).floor() * increment
}

/// Risk sizer carrying the account's market rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSizer {
    pub risk_fraction: f64,
    pub min_stake: f64,
    pub stake_increment: f64,
    pub min_stop_distance: f64,
    /// Fraction of notional (stake * price) held as margin.
    pub margin_requirement: f64,
}

impl PositionSizer {
    /// Stake per point for an entry, or the reason the trade is not taken.
    pub fn size(&self, capital: f64, entry_price: f64, stop_price: f64) -> Result<f64, SkipReason> {
        let raw = stake_per_point(capital, self.risk_fraction, entry_price, stop_price)?;
        if (entry_price - stop_price).abs() < self.min_stop_distance {
            return Err(SkipReason::StopTooClose);
        }
        let stake = floor_to_increment(raw, self.stake_increment);
        if !(stake.is_finite() && stake > 0.0) || stake < self.min_stake {
            return Err(SkipReason::BelowMinimumStake);
        }
        if stake * entry_price * self.margin_requirement > capital {
            return Err(SkipReason::InsufficientMargin);
        }
        Ok(stake)
    }
}
