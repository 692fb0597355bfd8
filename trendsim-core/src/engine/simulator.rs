//! The replay loop.

use super::{
    BacktestResult, EngineError, EquityPoint, RunStatus, SimulationOptions, SkippedTrade,
};
use crate::domain::{
    held_direction, validate_bars, ExitReason, Position, PriceBar, Side, StrategyParams, Trade,
};
use crate::indicators::{self, IndicatorFrame};
use crate::signals::{signal_for, TradeSignal};
use crate::sizers::PositionSizer;
use tracing::{debug, warn};

/// Run one backtest.
///
/// Invalid params, bars or options are errors. A series shorter than the
/// warm-up, or one whose arithmetic degenerates, is returned as
/// `RunStatus::InsufficientData` with no trades.
pub fn run_backtest(
    bars: &[PriceBar],
    params: &StrategyParams,
    options: &SimulationOptions,
) -> Result<BacktestResult, EngineError> {
    params.validate()?;
    options.validate()?;
    validate_bars(bars)?;

    let frames = indicators::compute(bars, params)?;
    let warmup = params.warmup_bars();
    if bars.len() < warmup {
        debug!(bars = bars.len(), warmup, %params, "series shorter than warm-up");
        return Ok(insufficient(params, options, frames));
    }

    let mut replay = Replay::new(bars, &frames, options);
    for i in 0..bars.len() {
        replay.step(i);
    }
    let Replay {
        realized,
        trades,
        skipped,
        equity_curve,
        ..
    } = replay;

    if !realized.is_finite() || trades.iter().any(|t| !t.profit_or_loss.is_finite()) {
        warn!(%params, "non-finite equity, run discarded");
        return Ok(insufficient(params, options, frames));
    }

    debug!(
        %params,
        trades = trades.len(),
        skipped = skipped.len(),
        ending_equity = realized,
        "backtest complete"
    );

    Ok(BacktestResult {
        params: *params,
        status: RunStatus::Complete,
        starting_capital: options.capital,
        indicators: frames,
        trades,
        skipped,
        equity_curve,
        ending_equity: realized,
        performance_score: None,
    })
}

fn insufficient(
    params: &StrategyParams,
    options: &SimulationOptions,
    frames: Vec<IndicatorFrame>,
) -> BacktestResult {
    BacktestResult {
        params: *params,
        status: RunStatus::InsufficientData,
        starting_capital: options.capital,
        indicators: frames,
        trades: Vec::new(),
        skipped: Vec::new(),
        equity_curve: Vec::new(),
        ending_equity: options.capital,
        performance_score: None,
    }
}

/// Mutable state of a single replay.
struct Replay<'a> {
    bars: &'a [PriceBar],
    frames: &'a [IndicatorFrame],
    options: &'a SimulationOptions,
    sizer: PositionSizer,
    realized: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    skipped: Vec<SkippedTrade>,
    equity_curve: Vec<EquityPoint>,
}

impl<'a> Replay<'a> {
    fn new(
        bars: &'a [PriceBar],
        frames: &'a [IndicatorFrame],
        options: &'a SimulationOptions,
    ) -> Self {
        Self {
            bars,
            frames,
            options,
            sizer: options.sizer(),
            realized: options.capital,
            position: None,
            trades: Vec::new(),
            skipped: Vec::new(),
            equity_curve: Vec::with_capacity(bars.len()),
        }
    }

    fn step(&mut self, i: usize) {
        let bar = self.bars[i];
        let last = i + 1 == self.bars.len();

        if i > 0 {
            if let Some(pos) = self.position {
                if pos.stop_breached(bar.high, bar.low) {
                    self.close(i, pos.stop_price, ExitReason::Stop);
                }
            }

            let frames = self.frames;
            let prev = &frames[i - 1];
            let cur = &frames[i];
            let mut signal = signal_for(prev, cur, held_direction(self.position.as_ref()));
            if signal == TradeSignal::Exit {
                if let Some(pos) = self.position {
                    let price = match pos.side {
                        Side::Long => self.options.bid(bar.close),
                        Side::Short => self.options.ask(bar.close),
                    };
                    self.close(i, price, ExitReason::Signal);
                }
                signal = signal_for(prev, cur, held_direction(None));
            }
            if !last {
                match signal {
                    TradeSignal::EnterLong => self.enter(i, Side::Long),
                    TradeSignal::EnterShort => self.enter(i, Side::Short),
                    TradeSignal::Exit | TradeSignal::None => {}
                }
            }

            if let (Some(pos), Some(channel)) = (self.position.as_mut(), cur.channel()) {
                pos.ratchet_stop(match pos.side {
                    Side::Long => channel.short_stop,
                    Side::Short => channel.long_stop,
                });
            }
        }

        if last && self.position.is_some() {
            self.close(i, bar.close, ExitReason::ForcedClose);
        }

        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            realized: self.realized,
            unrealized: self
                .position
                .map_or(0.0, |pos| pos.unrealized_pnl(bar.close)),
        });
    }

    fn enter(&mut self, i: usize, side: Side) {
        let bar = self.bars[i];
        let Some(channel) = self.frames[i].channel() else {
            return;
        };
        let (entry_price, stop_price) = match side {
            Side::Long => (self.options.ask(bar.close), channel.short_stop),
            Side::Short => (self.options.bid(bar.close), channel.long_stop),
        };

        match self.sizer.size(self.realized, entry_price, stop_price) {
            Ok(stake_per_point) => {
                debug!(index = i, ?side, entry_price, stop_price, stake_per_point, "open");
                self.position = Some(Position {
                    side,
                    entry_index: i,
                    entry_date: bar.timestamp,
                    entry_price,
                    stake_per_point,
                    stop_price,
                    initial_stop: stop_price,
                });
            }
            Err(reason) => {
                debug!(index = i, ?side, entry_price, stop_price, %reason, "entry skipped");
                self.skipped.push(SkippedTrade {
                    index: i,
                    timestamp: bar.timestamp,
                    side,
                    entry_price,
                    stop_price,
                    reason,
                });
            }
        }
    }

    fn close(&mut self, i: usize, exit_price: f64, reason: ExitReason) {
        let Some(pos) = self.position.take() else {
            return;
        };
        let trade = Trade::close(&pos, i, self.bars[i].timestamp, exit_price, reason);
        debug!(
            index = i,
            side = ?trade.side,
            exit_price,
            ?reason,
            pnl = trade.profit_or_loss,
            "close"
        );
        self.realized += trade.profit_or_loss;
        self.trades.push(trade);
    }
}
