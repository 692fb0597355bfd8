//! Indicator Engine — EMAs, MACD, sentiment and the Donchian channel.
//!
//! `compute` turns a bar sequence into one `IndicatorFrame` per bar, aligned
//! by index. Every recurrence is streamed in a single pass, so the whole
//! series costs O(n) regardless of window lengths. Output is a pure function
//! of the bars and parameters.

pub mod donchian;
pub mod ema;
pub mod macd;
pub mod sentiment;

pub use donchian::{Channel, Donchian};
pub use ema::Ema;
pub use macd::{Macd, MacdPoint};
pub use sentiment::{Sentiment, SentimentTracker};

use crate::domain::{ParamsError, PriceBar, StrategyParams};
use serde::{Deserialize, Serialize};

/// Indicator values describing one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub short_ema: f64,
    pub long_ema: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_trend: f64,
    pub sentiment: Sentiment,
    /// Lowest low of the channel window; `None` during warm-up.
    pub short_stop: Option<f64>,
    /// Highest high of the channel window; `None` during warm-up.
    pub long_stop: Option<f64>,
}

impl IndicatorFrame {
    /// Both channel bounds, when defined.
    pub fn channel(&self) -> Option<Channel> {
        match (self.short_stop, self.long_stop) {
            (Some(short_stop), Some(long_stop)) => Some(Channel {
                short_stop,
                long_stop,
            }),
            _ => None,
        }
    }

    /// True when every numeric field is finite and the channel is defined.
    pub fn is_ready(&self) -> bool {
        self.channel()
            .is_some_and(|c| c.short_stop.is_finite() && c.long_stop.is_finite())
            && [
                self.short_ema,
                self.long_ema,
                self.macd,
                self.macd_signal,
                self.macd_trend,
            ]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Compute the aligned indicator frames for `bars`.
pub fn compute(
    bars: &[PriceBar],
    params: &StrategyParams,
) -> Result<Vec<IndicatorFrame>, ParamsError> {
    params.validate()?;

    let mut macd = Macd::new(params.short_length, params.long_length, params.signal_length);
    let mut sentiment = SentimentTracker::new(params.entry_threshold, params.exit_threshold);
    let mut donchian = Donchian::new(params.channel_length);

    Ok(bars
        .iter()
        .map(|bar| {
            let m = macd.next(bar.close);
            let channel = donchian.next(bar.high, bar.low);
            IndicatorFrame {
                short_ema: m.short_ema,
                long_ema: m.long_ema,
                macd: m.line,
                macd_signal: m.signal,
                macd_trend: m.trend,
                sentiment: sentiment.next(m.trend),
                short_stop: channel.map(|c| c.short_stop),
                long_stop: channel.map(|c| c.long_stop),
            }
        })
        .collect())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
