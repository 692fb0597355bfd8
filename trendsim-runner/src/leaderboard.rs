//! Leaderboard — bounded, deduplicated, totally ordered ranking of runs.
//!
//! Order: complete runs before `InsufficientData` runs, then score
//! descending (non-finite scores rank as worst), then the canonical
//! parameter order so equal scores always rank the same way.
//! Deduplication key: the run's parameters. A duplicate never replaces the
//! existing entry, since both are replays of identical inputs.

use std::cmp::Ordering;

use serde::Serialize;
use trendsim_core::{BacktestResult, StrategyParams};

/// One scored run.
///
/// Incomplete runs and non-finite scores carry a score of negative
/// infinity and no `performance_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRun {
    pub params: StrategyParams,
    pub score: f64,
    pub result: BacktestResult,
}

impl RankedRun {
    /// Stamp `score` into the result and wrap it.
    pub fn new(mut result: BacktestResult, score: f64) -> Self {
        let score = if result.is_complete() && score.is_finite() {
            score
        } else {
            f64::NEG_INFINITY
        };
        result.performance_score = score.is_finite().then_some(score);
        Self {
            params: result.params,
            score,
            result,
        }
    }
}

/// Total order over runs, best first.
pub fn rank_cmp(a: &RankedRun, b: &RankedRun) -> Ordering {
    b.result
        .is_complete()
        .cmp(&a.result.is_complete())
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.params.canonical_cmp(&b.params))
}

/// Outcome of an insert operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// New entry added to the leaderboard.
    Inserted,
    /// Skipped: duplicate parameters, or worse than every kept entry.
    Skipped,
}

/// Top-N runs of one optimizer session.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<RankedRun>,
    /// `None` keeps every run.
    max_size: Option<usize>,
}

impl Leaderboard {
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
        }
    }

    /// Insert an entry, keeping the board sorted and within `max_size`.
    pub fn insert(&mut self, entry: RankedRun) -> InsertResult {
        if self.contains(&entry.params) {
            return InsertResult::Skipped;
        }
        let pos = self
            .entries
            .partition_point(|e| rank_cmp(e, &entry) == Ordering::Less);
        if let Some(max) = self.max_size {
            if pos >= max {
                return InsertResult::Skipped;
            }
        }
        self.entries.insert(pos, entry);
        if let Some(max) = self.max_size {
            self.entries.truncate(max);
        }
        InsertResult::Inserted
    }

    /// Fold another board into this one. The top N of two boards is the
    /// top N of their union, so per-worker boards reduce to the same ranking
    /// a single board would hold.
    pub fn merge(mut self, other: Leaderboard) -> Self {
        for entry in other.entries {
            self.insert(entry);
        }
        self
    }

    pub fn contains(&self, params: &StrategyParams) -> bool {
        self.entries
            .iter()
            .any(|e| e.params.canonical_cmp(params) == Ordering::Equal)
    }

    pub fn best(&self) -> Option<&RankedRun> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[RankedRun] {
        &self.entries
    }

    pub fn into_ranked(self) -> Vec<RankedRun> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
