//! PriceBar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one trading period.
///
/// Bars are supplied by an external loader, ordered strictly by timestamp.
/// Weekends and holidays are simply absent; no gap filling is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Invariant violations in an input bar sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index}: prices must be finite and positive")]
    NonPositivePrice { index: usize },
    /// Volume is negative or not finite. Zero is accepted: index and FX
    /// feeds often report no volume, and no indicator reads it.
    #[error("bar {index}: volume must be finite and non-negative")]
    InvalidVolume { index: usize },
    #[error("bar {index}: high {high} is below low {low}")]
    HighBelowLow { index: usize, high: f64, low: f64 },
    #[error("bar {index}: timestamp {timestamp} does not follow the previous bar")]
    OutOfOrder {
        index: usize,
        timestamp: NaiveDateTime,
    },
}

impl PriceBar {
    fn check(&self, index: usize) -> Result<(), BarError> {
        let prices_ok = [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0);
        if !prices_ok {
            return Err(BarError::NonPositivePrice { index });
        }
        if !(self.volume.is_finite() && self.volume >= 0.0) {
            return Err(BarError::InvalidVolume { index });
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow {
                index,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }
}

/// Validate ordering and positivity invariants for a whole series.
///
/// An empty series is valid; length requirements are the simulator's concern.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), BarError> {
    for (index, bar) in bars.iter().enumerate() {
        bar.check(index)?;
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(BarError::OutOfOrder {
                index,
                timestamp: bar.timestamp,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar(day: u32) -> PriceBar {
        PriceBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn valid_series_passes() {
        let bars = vec![sample_bar(2), sample_bar(3), sample_bar(5)];
        assert!(validate_bars(&bars).is_ok());
        assert!(validate_bars(&[]).is_ok());
    }

    #[test]
    fn detects_void() {
        let mut bar = sample_bar(2);
        bar.open = f64::NAN;
        assert_eq!(
            validate_bars(&[bar]),
            Err(BarError::NonPositivePrice { index: 0 })
        );
    }

    #[test]
    fn rejects_non_positive_close() {
        let mut bar = sample_bar(2);
        bar.close = 0.0;
        assert_eq!(
            validate_bars(&[bar]),
            Err(BarError::NonPositivePrice { index: 0 })
        );
    }

    #[test]
    fn rejects_bad_volume() {
        let mut bar = sample_bar(2);
        bar.volume = -1.0;
        assert_eq!(
            validate_bars(&[bar]),
            Err(BarError::InvalidVolume { index: 0 })
        );
        bar.volume = f64::INFINITY;
        assert_eq!(
            validate_bars(&[bar]),
            Err(BarError::InvalidVolume { index: 0 })
        );
    }

    #[test]
    fn accepts_zero_volume() {
        let mut bar = sample_bar(2);
        bar.volume = 0.0;
        assert!(validate_bars(&[bar]).is_ok());
    }

    #[test]
    fn rejects_high_below_low() {
        let mut bar = sample_bar(2);
        bar.high = 97.0;
        assert!(matches!(
            validate_bars(&[bar]),
            Err(BarError::HighBelowLow { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_or_backwards_timestamps() {
        let bars = vec![sample_bar(3), sample_bar(3)];
        assert!(matches!(
            validate_bars(&bars),
            Err(BarError::OutOfOrder { index: 1, .. })
        ));
        let bars = vec![sample_bar(3), sample_bar(2)];
        assert!(matches!(
            validate_bars(&bars),
            Err(BarError::OutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar(2);
        let json = serde_json::to_string(&bar).unwrap();
        let deser: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
