//! TrendSim CLI — single backtests and parameter sweeps over a bar file.
//!
//! Commands:
//! - `backtest` — replay the config's `[params]` and print the run report
//! - `optimize` — search the config's `[space]` and print the ranking
//!
//! Bars are read from a JSON array of `{timestamp, open, high, low, close,
//! volume}` records. Reports go to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trendsim_core::{BacktestResult, PriceBar};
use trendsim_runner::{optimize, run_single, FitnessMetric, SearchMode, SweepConfig};

#[derive(Parser)]
#[command(
    name = "trendsim",
    about = "TrendSim CLI — MACD/Donchian trend-following backtests and optimization"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one parameter set over the bars.
    Backtest {
        /// JSON file holding an array of price bars.
        #[arg(long)]
        bars: PathBuf,

        /// TOML session config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit compact JSON instead of pretty-printed.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Search the parameter space and rank the runs.
    Optimize {
        /// JSON file holding an array of price bars.
        #[arg(long)]
        bars: PathBuf,

        /// TOML session config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override `search.mode`.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Override `search.fitness`.
        #[arg(long, value_enum)]
        fitness: Option<FitnessArg>,

        /// Override `search.seed`.
        #[arg(long)]
        seed: Option<u64>,

        /// Override `search.top_n`.
        #[arg(long)]
        top: Option<usize>,

        /// Emit compact JSON instead of pretty-printed.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Exhaustive,
    HillClimb,
    Annealing,
}

impl From<ModeArg> for SearchMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Exhaustive => SearchMode::Exhaustive,
            ModeArg::HillClimb => SearchMode::HillClimb,
            ModeArg::Annealing => SearchMode::Annealing,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FitnessArg {
    NetProfit,
    ReturnOverDrawdown,
    Sharpe,
    ProfitFactor,
    WinRate,
}

impl From<FitnessArg> for FitnessMetric {
    fn from(f: FitnessArg) -> Self {
        match f {
            FitnessArg::NetProfit => FitnessMetric::NetProfit,
            FitnessArg::ReturnOverDrawdown => FitnessMetric::ReturnOverDrawdown,
            FitnessArg::Sharpe => FitnessMetric::Sharpe,
            FitnessArg::ProfitFactor => FitnessMetric::ProfitFactor,
            FitnessArg::WinRate => FitnessMetric::WinRate,
        }
    }
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            bars,
            config,
            compact,
        } => run_backtest_cmd(&bars, config.as_deref(), compact),
        Commands::Optimize {
            bars,
            config,
            mode,
            fitness,
            seed,
            top,
            compact,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(mode) = mode {
                config.search.mode = mode.into();
            }
            if let Some(fitness) = fitness {
                config.search.fitness = fitness.into();
            }
            if let Some(seed) = seed {
                config.search.seed = seed;
            }
            if top.is_some() {
                config.search.top_n = top;
            }
            run_optimize_cmd(&bars, &config, compact)
        }
    }
}

fn setup_logging() {
    // Logs go to stderr so stdout stays valid JSON
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SweepConfig> {
    match path {
        Some(path) => SweepConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SweepConfig::default()),
    }
}

fn load_bars(path: &Path) -> Result<Vec<PriceBar>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bars {}", path.display()))?;
    let bars: Vec<PriceBar> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse bars {}", path.display()))?;
    info!(count = bars.len(), path = %path.display(), "loaded bars");
    Ok(bars)
}

fn emit<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write report")?;
    Ok(())
}

fn run_backtest_cmd(bars_path: &Path, config_path: Option<&Path>, compact: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let bars = load_bars(bars_path)?;
    let report = run_single(&bars, &config).context("backtest failed")?;
    emit(&report, compact)
}

fn run_optimize_cmd(bars_path: &Path, config: &SweepConfig, compact: bool) -> Result<()> {
    let bars = load_bars(bars_path)?;
    let metric = config.search.fitness;
    let scorer = |r: &BacktestResult| metric.score(r);
    let report = optimize(
        &bars,
        &config.space,
        &config.account,
        &config.search,
        &scorer,
        None,
    )
    .context("optimization failed")?;
    emit(&report, compact)
}
