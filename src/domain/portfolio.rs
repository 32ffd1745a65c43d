//! Portfolio state and per-bar snapshots.

use chrono::NaiveDateTime;

use super::position::PositionState;
use super::signal::Signal;

/// One row of the simulation output, one per input bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioSnapshot {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub signal: Signal,
    /// Signed share count: positive long, negative short.
    pub position: f64,
    pub cash: f64,
    pub holdings: f64,
    pub total_value: f64,
    pub daily_pnl: f64,
}

impl PortfolioSnapshot {
    /// Terminal snapshot after liquidation: nothing left.
    pub fn liquidated(
        timestamp: NaiveDateTime,
        price: f64,
        signal: Signal,
        daily_pnl: f64,
    ) -> Self {
        PortfolioSnapshot {
            timestamp,
            price,
            signal,
            position: 0.0,
            cash: 0.0,
            holdings: 0.0,
            total_value: 0.0,
            daily_pnl,
        }
    }

    /// Copy of `self` re-stamped for a later bar with no activity.
    pub fn frozen_at(&self, timestamp: NaiveDateTime, price: f64) -> Self {
        PortfolioSnapshot {
            timestamp,
            price,
            signal: Signal::Hold,
            daily_pnl: 0.0,
            ..*self
        }
    }
}

/// Mutable simulation state carried from bar to bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub position: PositionState,
    pub daily_start_value: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            position: PositionState::Flat,
            daily_start_value: initial_capital,
        }
    }

    /// Roll over to a new calendar day. With reinvestment on, the previous
    /// day's profit (if any) is added to cash.
    pub fn start_new_day(&mut self, previous_total: f64, reinvest_profits: bool) {
        if reinvest_profits && previous_total > self.daily_start_value {
            self.cash += previous_total - self.daily_start_value;
        }
        self.daily_start_value = previous_total;
    }

    pub fn holdings(&self, price: f64) -> f64 {
        self.position.holdings(price)
    }

    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.holdings(price)
    }

    pub fn snapshot(
        &self,
        timestamp: NaiveDateTime,
        price: f64,
        signal: Signal,
        previous_total: Option<f64>,
    ) -> PortfolioSnapshot {
        let holdings = self.holdings(price);
        let total_value = self.cash + holdings;
        PortfolioSnapshot {
            timestamp,
            price,
            signal,
            position: self.position.signed_shares(),
            cash: self.cash,
            holdings,
            total_value,
            daily_pnl: previous_total.map_or(0.0, |prev| total_value - prev),
        }
    }
}
