//! Donchian Channel — lowest low / highest high over a trailing window.
//!
//! - short_stop[t] = min(low[t-L+1..=t])
//! - long_stop[t]  = max(high[t-L+1..=t])
//!
//! Maintained incrementally with monotonic deques, so each bar costs
//! amortised O(1) regardless of the window length. Undefined until `L`
//! bars have been seen.

use std::collections::VecDeque;

/// Channel bounds at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    /// Lowest low in the window; the protective stop for a long entry.
    pub short_stop: f64,
    /// Highest high in the window; the protective stop for a short entry.
    pub long_stop: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Min,
    Max,
}

/// Sliding-window extremum over `(index, value)` candidates.
///
/// The deque holds indices in increasing order with values that are
/// monotonic (non-decreasing for Min, non-increasing for Max), so the
/// front is always the window's extremum.
#[derive(Debug, Clone)]
struct RollingExtreme {
    window: usize,
    kind: Extreme,
    candidates: VecDeque<(usize, f64)>,
}

impl RollingExtreme {
    fn new(window: usize, kind: Extreme) -> Self {
        Self {
            window,
            kind,
            candidates: VecDeque::with_capacity(window),
        }
    }

    fn push(&mut self, index: usize, value: f64) -> f64 {
        while let Some(&(_, back)) = self.candidates.back() {
            let dominated = match self.kind {
                Extreme::Min => back >= value,
                Extreme::Max => back <= value,
            };
            if !dominated {
                break;
            }
            self.candidates.pop_back();
        }
        self.candidates.push_back((index, value));
        while let Some(&(front_index, _)) = self.candidates.front() {
            if front_index + self.window > index {
                break;
            }
            self.candidates.pop_front();
        }
        self.candidates.front().map_or(value, |&(_, v)| v)
    }
}

/// Streaming Donchian channel.
#[derive(Debug, Clone)]
pub struct Donchian {
    length: usize,
    seen: usize,
    lows: RollingExtreme,
    highs: RollingExtreme,
}

impl Donchian {
    pub fn new(length: usize) -> Self {
        debug_assert!(length >= 1, "Donchian length must be >= 1");
        Self {
            length,
            seen: 0,
            lows: RollingExtreme::new(length, Extreme::Min),
            highs: RollingExtreme::new(length, Extreme::Max),
        }
    }

    /// Feed one bar's high/low. Returns `None` during warm-up.
    pub fn next(&mut self, high: f64, low: f64) -> Option<Channel> {
        let index = self.seen;
        self.seen += 1;
        let short_stop = self.lows.push(index, low);
        let long_stop = self.highs.push(index, high);
        (self.seen >= self.length).then_some(Channel {
            short_stop,
            long_stop,
        })
    }
}

/// Naive rescan of the window; reference for tests.
#[cfg(test)]
pub(crate) fn naive_channel(highs: &[f64], lows: &[f64], length: usize, t: usize) -> Option<Channel> {
    if t + 1 < length {
        return None;
    }
    let start = t + 1 - length;
    Some(Channel {
        short_stop: lows[start..=t].iter().copied().fold(f64::INFINITY, f64::min),
        long_stop: highs[start..=t]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max),
    })
}
