//! Signal generators and the shared minimum-holding-period filter.
//!
//! Every variant implements [`Strategy`]. The regime classifier is an
//! optional collaborator each variant is built with; strategies keep no
//! mutable state between calls.

pub mod moving_average;
pub mod mean_reversion;
pub mod rsi_bollinger;

use std::fmt;
use std::str::FromStr;

use super::error::TradebenchError;
use super::ohlcv::PricePoint;
use super::signal::Signal;

pub use mean_reversion::{MeanReversion, MeanReversionParams};
pub use moving_average::{MovingAverageCrossover, MovingAverageParams};
pub use rsi_bollinger::{RsiBollinger, RsiBollingerParams};

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// One signal per bar, aligned with `bars`.
    fn generate_signals(&self, bars: &[PricePoint]) -> Vec<Signal>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    MovingAverage,
    MovingAverageVolume,
    MeanReversion,
    MeanReversionVolume,
    RsiBollinger,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::MovingAverage,
        StrategyKind::MovingAverageVolume,
        StrategyKind::MeanReversion,
        StrategyKind::MeanReversionVolume,
        StrategyKind::RsiBollinger,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StrategyKind::MovingAverage => "moving_average",
            StrategyKind::MovingAverageVolume => "moving_average_volume",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::MeanReversionVolume => "mean_reversion_volume",
            StrategyKind::RsiBollinger => "rsi_bollinger",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StrategyKind::MovingAverage => "Moving Average",
            StrategyKind::MovingAverageVolume => "MA Volume Compensated",
            StrategyKind::MeanReversion => "Mean Reversion",
            StrategyKind::MeanReversionVolume => "Mean Reversion Volume Compensated",
            StrategyKind::RsiBollinger => "RSI + Bollinger",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for StrategyKind {
    type Err = TradebenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| TradebenchError::UnknownStrategy(s.to_string()))
    }
}

/// Suppress signals that would exit a shadow position before
/// `min_holding_period` bars have elapsed since entry, and repeated
/// same-direction signals while positioned. An accepted opposite signal
/// flattens the shadow position; it does not reverse it.
pub fn apply_min_holding_period(signals: &[Signal], min_holding_period: usize) -> Vec<Signal> {
    let mut position = Signal::Hold;
    let mut entry_index = 0usize;

    signals
        .iter()
        .enumerate()
        .map(|(i, &signal)| match (position, signal) {
            (_, Signal::Hold) => Signal::Hold,
            (Signal::Hold, entry) => {
                position = entry;
                entry_index = i;
                entry
            }
            (held, same) if held == same => Signal::Hold,
            (_, exit) => {
                if i - entry_index >= min_holding_period {
                    position = Signal::Hold;
                    exit
                } else {
                    Signal::Hold
                }
            }
        })
        .collect()
}

/// Apply the holding filter when one is configured.
pub(crate) fn finish_signals(
    signals: Vec<Signal>,
    min_holding_period: Option<usize>,
) -> Vec<Signal> {
    match min_holding_period {
        Some(period) => apply_min_holding_period(&signals, period),
        None => signals,
    }
}
