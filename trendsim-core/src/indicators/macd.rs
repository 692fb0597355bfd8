//! MACD — difference of a fast and a slow EMA, its signal line and histogram.
//!
//! - line   = EMA(short) - EMA(long)
//! - signal = EMA(line, signal_length)
//! - trend  = line - signal (the histogram)

use super::ema::Ema;

/// One MACD observation together with the two EMAs that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub short_ema: f64,
    pub long_ema: f64,
    pub line: f64,
    pub signal: f64,
    pub trend: f64,
}

/// Streaming MACD. All three EMAs share the first-value seed.
#[derive(Debug, Clone)]
pub struct Macd {
    short: Ema,
    long: Ema,
    signal: Ema,
}

impl Macd {
    pub fn new(short_length: usize, long_length: usize, signal_length: usize) -> Self {
        Self {
            short: Ema::new(short_length),
            long: Ema::new(long_length),
            signal: Ema::new(signal_length),
        }
    }

    pub fn next(&mut self, close: f64) -> MacdPoint {
        let short_ema = self.short.next(close);
        let long_ema = self.long.next(close);
        let line = short_ema - long_ema;
        let signal = self.signal.next(line);
        MacdPoint {
            short_ema,
            long_ema,
            line,
            signal,
            trend: line - signal,
        }
    }
}
