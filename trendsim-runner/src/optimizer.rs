//! Parameter optimizer — drives the simulator across a parameter space and
//! ranks the runs.
//!
//! Two ways to walk the space:
//! - **Exhaustive**: every valid combination, fanned out over rayon and
//!   fanned back in before ranking. Runs share nothing but the read-only
//!   bars; every combination is distinct, so nothing is cached.
//! - **Local search**: a seeded walk over grid neighbours. The acceptance
//!   rule is a [`LocalSearch`] implementation; hill climbing and simulated
//!   annealing ship here. Walks revisit points, so runs are memoized.
//!
//! Combinations with `short_length >= long_length` are skipped silently;
//! other invalid combinations are skipped with a warning. Neither aborts
//! the session. A raised cancel flag stops dispatch of further
//! combinations; runs already produced are kept and ranked.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use trendsim_core::domain::{validate_bars, BarError};
use trendsim_core::fingerprint::{ConfigHash, DatasetHash};
use trendsim_core::{
    run_backtest, BacktestResult, EngineError, PriceBar, SimulationOptions, StrategyParams,
};

use crate::cache::ResultCache;
use crate::config::{ConfigError, SearchConfig, SearchMode};
use crate::leaderboard::{Leaderboard, RankedRun};
use crate::space::{GridPoint, ParamGrid, ParamSpace};

/// Shared flag that stops a running session when set.
pub type CancelFlag = AtomicBool;

/// Random draws tried when looking for a valid starting point.
const START_ATTEMPTS: usize = 64;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid bars: {0}")]
    InvalidBars(#[from] BarError),
    #[error("invalid account settings: {0}")]
    InvalidOptions(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("parameter space has no valid combinations")]
    EmptySpace,
}

/// Ranked output of one session, best first.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeReport {
    pub mode: SearchMode,
    pub dataset: DatasetHash,
    /// Runs scored, including cache hits.
    pub evaluated: usize,
    /// Combinations rejected as invalid parameters.
    pub rejected: usize,
    pub cache_hits: usize,
    pub cancelled: bool,
    pub ranked: Vec<RankedRun>,
}

impl OptimizeReport {
    pub fn best(&self) -> Option<&RankedRun> {
        self.ranked.first()
    }
}

/// Acceptance rule for a local search.
pub trait LocalSearch {
    /// Whether to move from a point scoring `current` to one scoring
    /// `candidate`. Scores are already sanitized: degenerate runs score
    /// negative infinity.
    fn accept(&mut self, current: f64, candidate: f64, rng: &mut StdRng) -> bool;

    /// Called once after every proposal.
    fn step(&mut self) {}
}

/// Move whenever the neighbour is at least as good. Equal scores move too,
/// so the walk can cross plateaus.
#[derive(Debug, Clone, Copy, Default)]
pub struct HillClimb;

impl LocalSearch for HillClimb {
    fn accept(&mut self, current: f64, candidate: f64, _rng: &mut StdRng) -> bool {
        candidate >= current
    }
}

/// Metropolis acceptance under a geometrically cooling temperature.
/// The temperature is in score units.
#[derive(Debug, Clone, Copy)]
pub struct Annealing {
    temperature: f64,
    cooling: f64,
}

impl Annealing {
    pub fn new(initial_temperature: f64, cooling: f64) -> Self {
        Self {
            temperature: initial_temperature,
            cooling,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl LocalSearch for Annealing {
    fn accept(&mut self, current: f64, candidate: f64, rng: &mut StdRng) -> bool {
        if candidate >= current {
            return true;
        }
        if !candidate.is_finite() {
            return false;
        }
        let p = ((candidate - current) / self.temperature).exp();
        rng.gen::<f64>() < p
    }

    fn step(&mut self) {
        self.temperature = (self.temperature * self.cooling).max(f64::MIN_POSITIVE);
    }
}

/// One session over a fixed bar series and account.
#[derive(Debug)]
pub struct Optimizer<'a> {
    bars: &'a [PriceBar],
    dataset: DatasetHash,
    options: SimulationOptions,
    cache: ResultCache,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> Optimizer<'a> {
    /// Validate bars and account settings once for the whole session.
    pub fn new(bars: &'a [PriceBar], options: SimulationOptions) -> Result<Self, OptimizeError> {
        validate_bars(bars)?;
        if let Err(EngineError::InvalidOptions(msg)) = options.validate() {
            return Err(OptimizeError::InvalidOptions(msg));
        }
        Ok(Self {
            bars,
            dataset: DatasetHash::of(bars),
            options,
            cache: ResultCache::new(),
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, flag: &'a CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn dataset(&self) -> DatasetHash {
        self.dataset
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Replay one combination, memoized on `(dataset, params + account)`.
    pub fn evaluate(&self, params: &StrategyParams) -> Result<BacktestResult, EngineError> {
        let key = (self.dataset, ConfigHash::of(params, &self.options));
        if let Some(hit) = self.cache.get(&key) {
            debug!(%params, "cache hit");
            return Ok(hit);
        }
        let result = run_backtest(self.bars, params, &self.options)?;
        self.cache.put(key, &result);
        Ok(result)
    }

    fn rank<F>(
        &self,
        params: &StrategyParams,
        outcome: Result<BacktestResult, EngineError>,
        scoring: &F,
    ) -> Option<RankedRun>
    where
        F: Fn(&BacktestResult) -> f64 + Sync,
    {
        match outcome {
            Ok(result) => {
                let raw = if result.is_complete() {
                    scoring(&result)
                } else {
                    f64::NEG_INFINITY
                };
                if result.is_complete() && !raw.is_finite() {
                    warn!(%params, score = raw, "non-finite score ranked last");
                }
                Some(RankedRun::new(result, raw))
            }
            Err(e) => {
                warn!(%params, error = %e, "combination rejected");
                None
            }
        }
    }

    /// Score every valid combination of `grid`.
    pub fn exhaustive<F>(
        &self,
        grid: &ParamGrid,
        scoring: &F,
        parallel: bool,
        top_n: Option<usize>,
    ) -> Result<OptimizeReport, OptimizeError>
    where
        F: Fn(&BacktestResult) -> f64 + Sync,
    {
        let (combos, rejected) = valid_combinations(grid);
        if combos.is_empty() {
            return Err(OptimizeError::EmptySpace);
        }
        info!(
            combinations = combos.len(),
            rejected,
            parallel,
            dataset = %self.dataset,
            "starting exhaustive sweep"
        );

        let evaluated = AtomicUsize::new(0);
        let dropped = AtomicUsize::new(0);
        let run_one = |params: &StrategyParams| {
            if self.cancelled() {
                dropped.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            let outcome = run_backtest(self.bars, params, &self.options);
            let run = self.rank(params, outcome, scoring)?;
            evaluated.fetch_add(1, Ordering::Relaxed);
            Some(run)
        };
        // Each worker keeps its own top N; only those survive the fan-in
        let board = if parallel {
            combos
                .par_iter()
                .filter_map(run_one)
                .fold(
                    || Leaderboard::new(top_n),
                    |mut board, run| {
                        board.insert(run);
                        board
                    },
                )
                .reduce(|| Leaderboard::new(top_n), Leaderboard::merge)
        } else {
            let mut board = Leaderboard::new(top_n);
            for run in combos.iter().filter_map(run_one) {
                board.insert(run);
            }
            board
        };

        let report = OptimizeReport {
            mode: SearchMode::Exhaustive,
            dataset: self.dataset,
            evaluated: evaluated.into_inner(),
            rejected,
            cache_hits: 0,
            cancelled: dropped.into_inner() > 0,
            ranked: board.into_ranked(),
        };
        log_finish(&report);
        Ok(report)
    }

    /// Seeded walk over grid neighbours, accepting moves by `strategy`.
    pub fn local_search<S, F>(
        &self,
        grid: &ParamGrid,
        strategy: &mut S,
        search: &SearchConfig,
        scoring: &F,
    ) -> Result<OptimizeReport, OptimizeError>
    where
        S: LocalSearch + ?Sized,
        F: Fn(&BacktestResult) -> f64 + Sync,
    {
        let mut rng = StdRng::seed_from_u64(search.seed);
        let mut point = starting_point(grid, &mut rng).ok_or(OptimizeError::EmptySpace)?;
        info!(
            mode = ?search.mode,
            iterations = search.iterations,
            seed = search.seed,
            start = %grid.params_at(point),
            dataset = %self.dataset,
            "starting local search"
        );

        let hits_before = self.cache.hits();
        let mut board = Leaderboard::new(search.top_n);
        let mut evaluated = 0;
        let mut rejected = 0;
        let mut cancelled = false;

        let start_params = grid.params_at(point);
        let start = self
            .rank(&start_params, self.evaluate(&start_params), scoring)
            .ok_or(OptimizeError::EmptySpace)?;
        evaluated += 1;
        let mut current_score = start.score;
        board.insert(start);

        for _ in 0..search.iterations {
            if self.cancelled() {
                cancelled = true;
                break;
            }
            let neighbours: Vec<GridPoint> = grid
                .neighbours(point)
                .into_iter()
                .filter(|p| grid.params_at(*p).validate().is_ok())
                .collect();
            if neighbours.is_empty() {
                break;
            }
            let candidate = neighbours[rng.gen_range(0..neighbours.len())];
            let params = grid.params_at(candidate);
            let Some(run) = self.rank(&params, self.evaluate(&params), scoring) else {
                rejected += 1;
                strategy.step();
                continue;
            };
            evaluated += 1;

            let accepted = strategy.accept(current_score, run.score, &mut rng);
            strategy.step();
            if accepted {
                point = candidate;
                current_score = run.score;
            }
            board.insert(run);
        }

        let report = OptimizeReport {
            mode: search.mode,
            dataset: self.dataset,
            evaluated,
            rejected,
            cache_hits: self.cache.hits() - hits_before,
            cancelled,
            ranked: board.into_ranked(),
        };
        log_finish(&report);
        Ok(report)
    }
}

fn log_finish(report: &OptimizeReport) {
    match report.best() {
        Some(best) => info!(
            evaluated = report.evaluated,
            cache_hits = report.cache_hits,
            cancelled = report.cancelled,
            best = %best.params,
            score = best.score,
            "optimization finished"
        ),
        None => info!(
            evaluated = report.evaluated,
            cancelled = report.cancelled,
            "optimization finished without results"
        ),
    }
}

/// Combinations that pass parameter validation, plus the rejected count.
fn valid_combinations(grid: &ParamGrid) -> (Vec<StrategyParams>, usize) {
    let raw = grid.combinations();
    let mut rejected = grid.size() - raw.len();
    let mut valid = Vec::with_capacity(raw.len());
    for params in raw {
        match params.validate() {
            Ok(()) => valid.push(params),
            Err(e) => {
                warn!(%params, error = %e, "combination rejected");
                rejected += 1;
            }
        }
    }
    (valid, rejected)
}

fn starting_point(grid: &ParamGrid, rng: &mut StdRng) -> Option<GridPoint> {
    for _ in 0..START_ATTEMPTS {
        let p = grid.random_point(rng);
        if grid.params_at(p).validate().is_ok() {
            return Some(p);
        }
    }
    grid.first_valid_point()
}

/// Run one session as described by `search`.
///
/// `scoring` maps a complete run to a score where higher is better;
/// incomplete runs are never passed to it and always rank last.
pub fn optimize<F>(
    bars: &[PriceBar],
    space: &ParamSpace,
    options: &SimulationOptions,
    search: &SearchConfig,
    scoring: &F,
    cancel: Option<&CancelFlag>,
) -> Result<OptimizeReport, OptimizeError>
where
    F: Fn(&BacktestResult) -> f64 + Sync,
{
    search.validate()?;
    let grid = space.grid()?;
    let mut optimizer = Optimizer::new(bars, *options)?;
    if let Some(flag) = cancel {
        optimizer = optimizer.with_cancel(flag);
    }
    match search.mode {
        SearchMode::Exhaustive => {
            optimizer.exhaustive(&grid, scoring, search.parallel, search.top_n)
        }
        SearchMode::HillClimb => optimizer.local_search(&grid, &mut HillClimb, search, scoring),
        SearchMode::Annealing => {
            let mut annealing = Annealing::new(search.initial_temperature, search.cooling);
            optimizer.local_search(&grid, &mut annealing, search, scoring)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hill_climb_accepts_equal_or_better() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut h = HillClimb;
        assert!(h.accept(1.0, 2.0, &mut rng));
        assert!(h.accept(1.0, 1.0, &mut rng));
        assert!(!h.accept(1.0, 0.5, &mut rng));
        assert!(h.accept(f64::NEG_INFINITY, -1e9, &mut rng));
    }

    #[test]
    fn annealing_never_accepts_degenerate_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = Annealing::new(1e12, 0.9);
        for _ in 0..100 {
            assert!(!a.accept(1.0, f64::NEG_INFINITY, &mut rng));
        }
    }

    #[test]
    fn annealing_hot_accepts_cold_rejects() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut hot = Annealing::new(1e9, 1.0);
        let accepted = (0..100).filter(|_| hot.accept(10.0, 9.0, &mut rng)).count();
        assert!(accepted > 90);

        let mut cold = Annealing::new(1e-6, 1.0);
        let accepted = (0..100).filter(|_| cold.accept(10.0, 9.0, &mut rng)).count();
        assert_eq!(accepted, 0);
    }

    #[test]
    fn annealing_cools_geometrically() {
        let mut a = Annealing::new(8.0, 0.5);
        a.step();
        a.step();
        assert!((a.temperature() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn starting_point_is_valid() {
        let grid = ParamSpace::default().grid().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let p = starting_point(&grid, &mut rng).unwrap();
        assert!(grid.params_at(p).validate().is_ok());
    }

    #[test]
    fn no_valid_start_in_inverted_space() {
        use crate::space::Axis;
        let space = ParamSpace {
            short_length: Axis::Values(vec![30, 40]),
            long_length: Axis::Values(vec![10, 20]),
            ..ParamSpace::default()
        };
        let grid = space.grid().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(starting_point(&grid, &mut rng).is_none());
    }
}
