//! Signal Generator — hysteresis-gated EMA crossover.
//!
//! A frame leans bullish when the MACD sentiment is Bullish and the short
//! EMA sits above the long EMA; bearish when sentiment is Bearish and the
//! short EMA sits below. Anything else is neutral. Sentiment carries the
//! entry/exit threshold bands, so a crossover alone cannot trigger a trade
//! in a flat market.
//!
//! - Flat: enter on the bar where the bias turns bullish (long) or bearish
//!   (short).
//! - Long / Short: exit as soon as the bias stops supporting the position.
//!
//! Signals never enter the direction already held, and are `None` while the
//! channel is still warming up.

use crate::domain::Direction;
use crate::indicators::{IndicatorFrame, Sentiment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSignal {
    EnterLong,
    EnterShort,
    Exit,
    None,
}

/// Directional lean of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

pub fn bias(frame: &IndicatorFrame) -> Bias {
    match frame.sentiment {
        Sentiment::Bullish if frame.short_ema > frame.long_ema => Bias::Bullish,
        Sentiment::Bearish if frame.short_ema < frame.long_ema => Bias::Bearish,
        _ => Bias::Neutral,
    }
}

/// Classify the transition from `prev` to `cur` given the held direction.
pub fn signal_for(prev: &IndicatorFrame, cur: &IndicatorFrame, held: Direction) -> TradeSignal {
    if !cur.is_ready() {
        return TradeSignal::None;
    }
    let now = bias(cur);
    let before = bias(prev);
    match held {
        Direction::Flat => match now {
            Bias::Bullish if before != Bias::Bullish => TradeSignal::EnterLong,
            Bias::Bearish if before != Bias::Bearish => TradeSignal::EnterShort,
            _ => TradeSignal::None,
        },
        Direction::Long if now != Bias::Bullish => TradeSignal::Exit,
        Direction::Short if now != Bias::Bearish => TradeSignal::Exit,
        _ => TradeSignal::None,
    }
}
