//! In-memory result cache with hash-based deduplication.
//!
//! Results are keyed by `(DatasetHash, ConfigHash)`: the same parameters
//! replayed over the same bars with the same account settings always
//! produce the same result, so a hit is returned without re-simulating.
//! The cache lives for one optimizer session and is never persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use trendsim_core::fingerprint::{ConfigHash, DatasetHash};
use trendsim_core::BacktestResult;

pub type CacheKey = (DatasetHash, ConfigHash);

/// Thread-safe memo of completed runs.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, BacktestResult>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a cached result. Counts a hit or a miss.
    pub fn get(&self, key: &CacheKey) -> Option<BacktestResult> {
        let found = match self.entries.read() {
            Ok(map) => map.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        };
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores a result. An existing entry for the same key is kept, since
    /// both are replays of identical inputs.
    pub fn put(&self, key: CacheKey, result: &BacktestResult) {
        let mut map = match self.entries.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(key).or_insert_with(|| result.clone());
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        match self.entries.read() {
            Ok(map) => map.contains_key(key),
            Err(poisoned) => poisoned.into_inner().contains_key(key),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendsim_core::{run_backtest, SimulationOptions, StrategyParams};

    fn sample() -> (CacheKey, BacktestResult) {
        let params = StrategyParams::default();
        let options = SimulationOptions::default();
        let result = run_backtest(&[], &params, &options).unwrap();
        let key = (DatasetHash::of(&[]), ConfigHash::of(&params, &options));
        (key, result)
    }

    #[test]
    fn miss_then_hit() {
        let cache = ResultCache::new();
        let (key, result) = sample();

        assert!(cache.get(&key).is_none());
        cache.put(key, &result);
        assert_eq!(cache.get(&key), Some(result));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_is_idempotent() {
        let cache = ResultCache::new();
        let (key, result) = sample();
        cache.put(key, &result);
        cache.put(key, &result);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key));
    }

    #[test]
    fn empty_cache() {
        let cache = ResultCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
    }
}
