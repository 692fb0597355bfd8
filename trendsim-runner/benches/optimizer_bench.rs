//! Criterion benchmarks for optimizer sessions.
//!
//! Benchmarks:
//! 1. Exhaustive sweep, sequential vs parallel
//! 2. Annealing walk at growing iteration counts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trendsim_core::{BacktestResult, PriceBar, SimulationOptions};
use trendsim_runner::{optimize, Axis, ParamSpace, SearchConfig, SearchMode};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.05).sin() * 12.0 + i as f64 * 0.02;
            PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: close - 0.2,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

fn space() -> ParamSpace {
    ParamSpace {
        short_length: Axis::Range {
            start: 4,
            end: 16,
            step: 4,
        },
        long_length: Axis::Range {
            start: 20,
            end: 50,
            step: 10,
        },
        signal_length: Axis::Values(vec![5, 9]),
        entry_threshold: Axis::Values(vec![0.0, 0.25]),
        exit_threshold: Axis::Values(vec![0.0]),
        channel_length: Axis::Values(vec![10, 20]),
    }
}

fn net_profit(r: &BacktestResult) -> f64 {
    r.net_profit()
}

// ── 1. Exhaustive sweep ──────────────────────────────────────────────

fn bench_exhaustive(c: &mut Criterion) {
    let mut group = c.benchmark_group("exhaustive_sweep");
    group.sample_size(10);
    let bars = make_bars(1_260);
    let options = SimulationOptions::default();
    let space = space();

    for parallel in [false, true] {
        let search = SearchConfig {
            mode: SearchMode::Exhaustive,
            parallel,
            ..SearchConfig::default()
        };
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::new(label, bars.len()), &bars, |b, bars| {
            b.iter(|| optimize(black_box(bars), &space, &options, &search, &net_profit, None))
        });
    }

    group.finish();
}

// ── 2. Annealing ─────────────────────────────────────────────────────

fn bench_annealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("annealing");
    group.sample_size(10);
    let bars = make_bars(1_260);
    let options = SimulationOptions::default();
    let space = space();

    for &iterations in &[25, 100, 400] {
        let search = SearchConfig {
            mode: SearchMode::Annealing,
            iterations,
            initial_temperature: 100.0,
            ..SearchConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new("iterations", iterations),
            &iterations,
            |b, _| b.iter(|| optimize(black_box(&bars), &space, &options, &search, &net_profit, None)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_exhaustive, bench_annealing);
criterion_main!(benches);
