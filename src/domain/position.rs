//! Position state for a single-instrument simulation.

use std::fmt;

use chrono::NaiveDateTime;

/// An open position. `shares` is always non-negative; direction lives in
/// [`PositionState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub shares: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
}

impl OpenPosition {
    /// Close the whole position at `exit_price`.
    pub fn close(self, side: TradeSide, exit_price: f64, exit_time: NaiveDateTime) -> ClosedTrade {
        let pnl = match side {
            TradeSide::Long => (exit_price - self.entry_price) * self.shares,
            TradeSide::Short => (self.entry_price - exit_price) * self.shares,
        };
        ClosedTrade {
            side,
            shares: self.shares,
            entry_price: self.entry_price,
            exit_price,
            entry_time: self.entry_time,
            exit_time,
            pnl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Long,
    Short,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Long => f.pad("long"),
            TradeSide::Short => f.pad("short"),
        }
    }
}

/// A completed round trip, entry to exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedTrade {
    pub side: TradeSide,
    pub shares: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub pnl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long(OpenPosition),
    Short(OpenPosition),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    /// `+shares` when long, `-shares` when short, 0 when flat.
    pub fn signed_shares(&self) -> f64 {
        match self {
            PositionState::Flat => 0.0,
            PositionState::Long(p) => p.shares,
            PositionState::Short(p) => -p.shares,
        }
    }

    /// Mark-to-market value. A short is carried at its unrealized P&L,
    /// not at its notional.
    pub fn holdings(&self, price: f64) -> f64 {
        match self {
            PositionState::Flat => 0.0,
            PositionState::Long(p) => p.shares * price,
            PositionState::Short(p) => (p.entry_price - price) * p.shares,
        }
    }

    /// Adverse move since entry as a fraction of the entry price.
    pub fn adverse_move(&self, price: f64) -> f64 {
        match self {
            PositionState::Flat => 0.0,
            PositionState::Long(p) => (p.entry_price - price) / p.entry_price,
            PositionState::Short(p) => (price - p.entry_price) / p.entry_price,
        }
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss: f64) -> bool {
        !self.is_flat() && self.adverse_move(price) >= stop_loss
    }
}
