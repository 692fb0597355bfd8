//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = k * x[t] + (1 - k) * EMA[t-1], k = 2 / (N + 1).
//! Seed: EMA[0] = x[0], so every index carries a value.

/// Streaming EMA state.
#[derive(Debug, Clone)]
pub struct Ema {
    k: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        debug_assert!(period >= 1, "EMA period must be >= 1");
        Self {
            k: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    /// Feed the next observation and return the updated average.
    pub fn next(&mut self, x: f64) -> f64 {
        let ema = match self.value {
            None => x,
            Some(prev) => x * self.k + prev * (1.0 - self.k),
        };
        self.value = Some(ema);
        ema
    }
}
