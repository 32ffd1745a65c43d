//! Backtest engine: folds a signal sequence over a price series.
//!
//! Each bar goes through day rollover, stop-loss override, execution and
//! valuation, then the circuit breakers. A breaker is terminal: the rest of
//! the series is still snapshotted, but frozen or zeroed, and the bar that
//! tripped it books no trade.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::{info, trace, warn};

use super::error::TradebenchError;
use super::execution::{apply_stop_loss, execute_signal};
use super::metrics::Metrics;
use super::ohlcv::{validate_series, PricePoint};
use super::portfolio::{Portfolio, PortfolioSnapshot};
use super::position::ClosedTrade;
use super::signal::Signal;
use super::strategy::Strategy;

/// Falling below this total value liquidates the account. A run that starts
/// below it is only guarded by the single-bar loss breaker.
pub const LIQUIDATION_FLOOR: f64 = 1.0;
/// A single-bar drop to below this fraction of the previous total freezes
/// the account.
pub const CATASTROPHIC_RETAINED_FRACTION: f64 = 0.5;

const PROGRESS_EVERY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarInterval {
    #[default]
    Minute,
    Hour,
    Day,
}

impl BarInterval {
    pub fn bars_per_year(self) -> f64 {
        match self {
            BarInterval::Minute => 252.0 * 24.0 * 60.0,
            BarInterval::Hour => 252.0 * 24.0,
            BarInterval::Day => 252.0,
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarInterval::Minute => write!(f, "minute"),
            BarInterval::Hour => write!(f, "hour"),
            BarInterval::Day => write!(f, "day"),
        }
    }
}

impl FromStr for BarInterval {
    type Err = TradebenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" | "1m" => Ok(BarInterval::Minute),
            "hour" | "1h" => Ok(BarInterval::Hour),
            "day" | "1d" => Ok(BarInterval::Day),
            other => Err(TradebenchError::invalid(
                "backtest",
                "bar_interval",
                format!("expected minute, hour or day, got '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub position_size: f64,
    pub stop_loss: f64,
    pub reinvest_profits: bool,
    pub bar_interval: BarInterval,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100.0,
            position_size: 0.8,
            stop_loss: 0.02,
            reinvest_profits: true,
            bar_interval: BarInterval::Minute,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), TradebenchError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(TradebenchError::invalid(
                "backtest",
                "initial_capital",
                format!("must be positive, got {}", self.initial_capital),
            ));
        }
        if !(self.position_size > 0.0 && self.position_size <= 1.0) {
            return Err(TradebenchError::invalid(
                "backtest",
                "position_size",
                format!("must be in (0, 1], got {}", self.position_size),
            ));
        }
        if !(self.stop_loss > 0.0 && self.stop_loss <= 1.0) {
            return Err(TradebenchError::invalid(
                "backtest",
                "stop_loss",
                format!("must be in (0, 1], got {}", self.stop_loss),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Total value fell below [`LIQUIDATION_FLOOR`].
    Liquidated,
    /// Total value lost more than half in one bar.
    CatastrophicLoss,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::Liquidated => write!(f, "liquidated"),
            HaltReason::CatastrophicLoss => write!(f, "catastrophic single-bar loss"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt {
    pub timestamp: NaiveDateTime,
    pub reason: HaltReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub snapshots: Vec<PortfolioSnapshot>,
    pub metrics: Metrics,
    /// Round trips in exit order, stop-loss exits included. A position still
    /// open at the end (or at a halt) is not listed.
    pub trades: Vec<ClosedTrade>,
    pub halt: Option<Halt>,
}

impl BacktestResult {
    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    pub fn halted_early(&self) -> bool {
        self.halt.is_some()
    }

    pub fn halted_at(&self) -> Option<NaiveDateTime> {
        self.halt.map(|h| h.timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Active,
    Frozen(PortfolioSnapshot),
    Liquidated,
}

#[derive(Debug)]
struct Simulation<'a> {
    config: &'a BacktestConfig,
    portfolio: Portfolio,
    phase: Phase,
    halt: Option<Halt>,
    snapshots: Vec<PortfolioSnapshot>,
    trades: Vec<ClosedTrade>,
}

impl<'a> Simulation<'a> {
    fn new(config: &'a BacktestConfig, capacity: usize) -> Self {
        Simulation {
            config,
            portfolio: Portfolio::new(config.initial_capital),
            phase: Phase::Active,
            halt: None,
            snapshots: Vec::with_capacity(capacity),
            trades: Vec::new(),
        }
    }

    fn step(mut self, bar: &PricePoint, signal: Signal) -> Self {
        let snapshot = match self.phase {
            Phase::Liquidated => {
                PortfolioSnapshot::liquidated(bar.timestamp, bar.close, Signal::Hold, 0.0)
            }
            Phase::Frozen(frozen) => frozen.frozen_at(bar.timestamp, bar.close),
            Phase::Active => self.trade(bar, signal),
        };
        self.snapshots.push(snapshot);
        if self.snapshots.len() % PROGRESS_EVERY == 0 {
            trace!(
                bars = self.snapshots.len(),
                total_value = snapshot.total_value,
                "simulation progress"
            );
        }
        self
    }

    fn trade(&mut self, bar: &PricePoint, signal: Signal) -> PortfolioSnapshot {
        let previous = self.snapshots.last().copied();

        if let Some(prev) = previous {
            if prev.timestamp.date() != bar.timestamp.date() {
                self.portfolio
                    .start_new_day(prev.total_value, self.config.reinvest_profits);
            }
        }

        let signal = apply_stop_loss(
            &self.portfolio.position,
            bar.close,
            self.config.stop_loss,
            signal,
        );
        let fill = execute_signal(
            &mut self.portfolio,
            signal,
            bar.close,
            bar.timestamp,
            self.config.position_size,
        );

        let previous_total = previous.map(|p| p.total_value);
        let snapshot = self
            .portfolio
            .snapshot(bar.timestamp, bar.close, signal, previous_total);

        let total_before = previous_total.unwrap_or(self.config.initial_capital);
        if snapshot.total_value < LIQUIDATION_FLOOR && total_before >= LIQUIDATION_FLOOR {
            self.halt(bar.timestamp, HaltReason::Liquidated, snapshot.total_value);
            self.phase = Phase::Liquidated;
            return PortfolioSnapshot::liquidated(
                bar.timestamp,
                bar.close,
                signal,
                previous_total.map_or(0.0, |prev| -prev),
            );
        }

        if let Some(prev) = previous {
            if prev.total_value > 0.0
                && snapshot.total_value < prev.total_value * CATASTROPHIC_RETAINED_FRACTION
            {
                self.halt(bar.timestamp, HaltReason::CatastrophicLoss, snapshot.total_value);
                self.phase = Phase::Frozen(prev);
                return prev.frozen_at(bar.timestamp, bar.close);
            }
        }

        if let Some(trade) = fill.closed_trade() {
            self.trades.push(trade);
        }
        snapshot
    }

    fn halt(&mut self, timestamp: NaiveDateTime, reason: HaltReason, total_value: f64) {
        warn!(%timestamp, %reason, total_value, "circuit breaker tripped, halting");
        self.halt = Some(Halt { timestamp, reason });
    }
}

/// Runs strategies or precomputed signals against a validated config.
#[derive(Debug, Clone)]
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self, TradebenchError> {
        config.validate()?;
        Ok(Backtester { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run(
        &self,
        bars: &[PricePoint],
        strategy: &dyn Strategy,
    ) -> Result<BacktestResult, TradebenchError> {
        validate_series(bars)?;
        let signals = strategy.generate_signals(bars);
        self.run_signals(strategy.name(), bars, &signals)
    }

    pub fn run_signals(
        &self,
        strategy_name: &str,
        bars: &[PricePoint],
        signals: &[Signal],
    ) -> Result<BacktestResult, TradebenchError> {
        validate_series(bars)?;
        if signals.len() != bars.len() {
            return Err(TradebenchError::SignalLengthMismatch {
                bars: bars.len(),
                signals: signals.len(),
            });
        }

        info!(
            strategy = strategy_name,
            bars = bars.len(),
            initial_capital = self.config.initial_capital,
            "starting backtest"
        );

        let simulation = bars
            .iter()
            .zip(signals)
            .fold(Simulation::new(&self.config, bars.len()), |sim, (bar, &signal)| {
                sim.step(bar, signal)
            });

        let metrics = Metrics::compute(
            &simulation.snapshots,
            self.config.initial_capital,
            self.config.bar_interval,
        );

        info!(
            strategy = strategy_name,
            final_value = metrics.final_value,
            total_profit = metrics.total_profit,
            total_return = metrics.total_return,
            sharpe_ratio = metrics.sharpe_ratio,
            num_trades = metrics.num_trades,
            halted = simulation.halt.is_some(),
            "backtest complete"
        );

        Ok(BacktestResult {
            strategy_name: strategy_name.to_string(),
            snapshots: simulation.snapshots,
            metrics,
            trades: simulation.trades,
            halt: simulation.halt,
        })
    }
}
