//! Sentiment — hysteresis classification of the MACD histogram.
//!
//! A bullish regime starts when the histogram rises above `+entry` and ends
//! once it falls back to `+exit` or below. Bearish mirrors this around zero.
//! A direct flip (bullish to bearish) happens only when the histogram jumps
//! past the opposite entry band.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// Stateful classifier carrying the previous sentiment forward.
#[derive(Debug, Clone)]
pub struct SentimentTracker {
    entry: f64,
    exit: f64,
    current: Sentiment,
}

impl SentimentTracker {
    pub fn new(entry_threshold: f64, exit_threshold: f64) -> Self {
        Self {
            entry: entry_threshold,
            exit: exit_threshold,
            current: Sentiment::Neutral,
        }
    }

    /// Classify the next histogram value. Non-finite values reset to Neutral.
    pub fn next(&mut self, trend: f64) -> Sentiment {
        self.current = if !trend.is_finite() {
            Sentiment::Neutral
        } else {
            transition(self.current, trend, self.entry, self.exit)
        };
        self.current
    }
}

fn transition(current: Sentiment, trend: f64, entry: f64, exit: f64) -> Sentiment {
    match current {
        Sentiment::Bullish if trend < -entry => Sentiment::Bearish,
        Sentiment::Bullish if trend <= exit => Sentiment::Neutral,
        Sentiment::Bearish if trend > entry => Sentiment::Bullish,
        Sentiment::Bearish if trend >= -exit => Sentiment::Neutral,
        Sentiment::Neutral if trend > entry => Sentiment::Bullish,
        Sentiment::Neutral if trend < -entry => Sentiment::Bearish,
        unchanged => unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(entry: f64, exit: f64, trends: &[f64]) -> Vec<Sentiment> {
        let mut t = SentimentTracker::new(entry, exit);
        trends.iter().map(|&x| t.next(x)).collect()
    }

    #[test]
    fn zero_bands_follow_sign() {
        use Sentiment::*;
        assert_eq!(
            run(0.0, 0.0, &[0.0, 0.5, 0.1, -0.2, 0.0, 0.3]),
            vec![Neutral, Bullish, Bullish, Bearish, Neutral, Bullish]
        );
    }

    #[test]
    fn entry_band_suppresses_small_moves() {
        use Sentiment::*;
        assert_eq!(
            run(1.0, 0.0, &[0.5, 0.9, 1.0, 1.2, -0.7, -1.5]),
            vec![Neutral, Neutral, Neutral, Bullish, Neutral, Bearish]
        );
    }

    #[test]
    fn exit_band_holds_regime() {
        use Sentiment::*;
        // Bullish persists while trend stays above exit (0.4).
        assert_eq!(
            run(1.0, 0.4, &[1.5, 0.8, 0.5, 0.4, 0.9]),
            vec![Bullish, Bullish, Bullish, Neutral, Neutral]
        );
        assert_eq!(
            run(1.0, 0.4, &[-1.5, -0.5, -0.4]),
            vec![Bearish, Bearish, Neutral]
        );
    }

    #[test]
    fn direct_flip_past_opposite_band() {
        use Sentiment::*;
        assert_eq!(run(1.0, 0.2, &[2.0, -2.0]), vec![Bullish, Bearish]);
    }

    #[test]
    fn nan_resets_to_neutral() {
        use Sentiment::*;
        assert_eq!(run(0.0, 0.0, &[1.0, f64::NAN]), vec![Bullish, Neutral]);
    }
}
