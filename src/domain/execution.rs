//! Stop-loss override and signal execution against a [`Portfolio`].
//!
//! Sizing is fractional: an entry commits `min(cash * position_size, cash)`.
//! Opening a short leaves cash untouched and covering credits the full
//! `|shares| * price`; closing either side always goes flat, never reverses.

use chrono::NaiveDateTime;
use tracing::debug;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, OpenPosition, PositionState, TradeSide};
use super::signal::Signal;

/// What executing a signal did to the portfolio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    OpenedLong { shares: f64, cost: f64 },
    OpenedShort { shares: f64 },
    ClosedLong { proceeds: f64, trade: ClosedTrade },
    CoveredShort { proceeds: f64, trade: ClosedTrade },
    NoTrade,
}

impl Fill {
    /// The round trip this fill completed, if it closed a position.
    pub fn closed_trade(&self) -> Option<ClosedTrade> {
        match self {
            Fill::ClosedLong { trade, .. } | Fill::CoveredShort { trade, .. } => Some(*trade),
            _ => None,
        }
    }
}

/// Replace `signal` with the closing signal when the open position has
/// moved against entry by at least `stop_loss`.
pub fn apply_stop_loss(
    position: &PositionState,
    price: f64,
    stop_loss: f64,
    signal: Signal,
) -> Signal {
    if !position.should_stop_loss(price, stop_loss) {
        return signal;
    }
    let closing = match position {
        PositionState::Long(_) => Signal::Sell,
        PositionState::Short(_) => Signal::Buy,
        PositionState::Flat => return signal,
    };
    debug!(
        price,
        adverse_move = position.adverse_move(price),
        stop_loss,
        %closing,
        "stop-loss triggered"
    );
    closing
}

/// Apply one signal at `price`. Cash is clamped to zero afterwards.
pub fn execute_signal(
    portfolio: &mut Portfolio,
    signal: Signal,
    price: f64,
    timestamp: NaiveDateTime,
    position_size: f64,
) -> Fill {
    let fill = match (signal, portfolio.position) {
        (Signal::Buy, PositionState::Flat) => {
            let cost = (portfolio.cash * position_size).min(portfolio.cash);
            let shares = cost / price;
            portfolio.cash -= cost;
            portfolio.position = PositionState::Long(OpenPosition {
                shares,
                entry_price: price,
                entry_time: timestamp,
            });
            Fill::OpenedLong { shares, cost }
        }
        (Signal::Sell, PositionState::Flat) => {
            let notional = (portfolio.cash * position_size).min(portfolio.cash);
            let shares = notional / price;
            portfolio.position = PositionState::Short(OpenPosition {
                shares,
                entry_price: price,
                entry_time: timestamp,
            });
            Fill::OpenedShort { shares }
        }
        (Signal::Sell, PositionState::Long(open)) => {
            let proceeds = open.shares * price;
            portfolio.cash += proceeds;
            portfolio.position = PositionState::Flat;
            Fill::ClosedLong {
                proceeds,
                trade: open.close(TradeSide::Long, price, timestamp),
            }
        }
        (Signal::Buy, PositionState::Short(open)) => {
            let proceeds = open.shares * price;
            portfolio.cash += proceeds;
            portfolio.position = PositionState::Flat;
            Fill::CoveredShort {
                proceeds,
                trade: open.close(TradeSide::Short, price, timestamp),
            }
        }
        _ => Fill::NoTrade,
    };
    portfolio.cash = portfolio.cash.max(0.0);
    fill
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn buy_while_flat_opens_long() {
        let mut portfolio = Portfolio::new(100.0);
        let fill = execute_signal(&mut portfolio, Signal::Buy, 50.0, ts(), 0.8);
        assert_eq!(
            fill,
            Fill::OpenedLong {
                shares: 1.6,
                cost: 80.0
            }
        );
        assert_relative_eq!(portfolio.cash, 20.0);
        assert_relative_eq!(portfolio.position.signed_shares(), 1.6);
    }

    #[test]
    fn sell_while_flat_opens_short_without_crediting_cash() {
        let mut portfolio = Portfolio::new(100.0);
        let fill = execute_signal(&mut portfolio, Signal::Sell, 50.0, ts(), 0.5);
        assert_eq!(fill, Fill::OpenedShort { shares: 1.0 });
        assert_relative_eq!(portfolio.cash, 100.0);
        assert_relative_eq!(portfolio.position.signed_shares(), -1.0);
    }

    #[test]
    fn sell_while_long_closes() {
        let mut portfolio = Portfolio::new(100.0);
        execute_signal(&mut portfolio, Signal::Buy, 50.0, ts(), 1.0);
        let fill = execute_signal(&mut portfolio, Signal::Sell, 60.0, ts(), 1.0);
        let Fill::ClosedLong { proceeds, trade } = fill else {
            panic!("expected a closed long, got {fill:?}");
        };
        assert_relative_eq!(proceeds, 120.0);
        assert_eq!(trade.side, TradeSide::Long);
        assert_relative_eq!(trade.shares, 2.0);
        assert_relative_eq!(trade.pnl, 20.0);
        assert_relative_eq!(portfolio.cash, 120.0);
        assert!(portfolio.position.is_flat());
    }

    #[test]
    fn buy_while_short_covers_with_full_notional() {
        let mut portfolio = Portfolio::new(100.0);
        execute_signal(&mut portfolio, Signal::Sell, 50.0, ts(), 0.5);
        let fill = execute_signal(&mut portfolio, Signal::Buy, 40.0, ts(), 0.5);
        let Fill::CoveredShort { proceeds, trade } = fill else {
            panic!("expected a covered short, got {fill:?}");
        };
        assert_relative_eq!(proceeds, 40.0);
        assert_eq!(fill.closed_trade(), Some(trade));
        assert_relative_eq!(trade.entry_price, 50.0);
        assert_relative_eq!(trade.pnl, 10.0);
        assert_relative_eq!(portfolio.cash, 140.0);
        assert!(portfolio.position.is_flat());
    }

    #[test]
    fn same_direction_signal_is_ignored() {
        let mut portfolio = Portfolio::new(100.0);
        execute_signal(&mut portfolio, Signal::Buy, 50.0, ts(), 0.5);
        let fill = execute_signal(&mut portfolio, Signal::Buy, 55.0, ts(), 0.5);
        assert_eq!(fill, Fill::NoTrade);
        assert!(fill.closed_trade().is_none());
        assert_relative_eq!(portfolio.cash, 50.0);
    }

    #[test]
    fn hold_does_nothing() {
        let mut portfolio = Portfolio::new(100.0);
        assert_eq!(
            execute_signal(&mut portfolio, Signal::Hold, 50.0, ts(), 0.5),
            Fill::NoTrade
        );
        assert_eq!(portfolio, Portfolio::new(100.0));
    }

    #[test]
    fn stop_loss_overrides_hold_on_long() {
        let pos = PositionState::Long(OpenPosition {
            shares: 1.0,
            entry_price: 100.0,
            entry_time: ts(),
        });
        assert_eq!(apply_stop_loss(&pos, 97.0, 0.02, Signal::Hold), Signal::Sell);
        assert_eq!(apply_stop_loss(&pos, 99.0, 0.02, Signal::Hold), Signal::Hold);
    }

    #[test]
    fn stop_loss_overrides_sell_on_short() {
        let pos = PositionState::Short(OpenPosition {
            shares: 1.0,
            entry_price: 100.0,
            entry_time: ts(),
        });
        assert_eq!(apply_stop_loss(&pos, 103.0, 0.02, Signal::Sell), Signal::Buy);
    }

    #[test]
    fn stop_loss_ignored_when_flat() {
        assert_eq!(
            apply_stop_loss(&PositionState::Flat, 1.0, 0.02, Signal::Sell),
            Signal::Sell
        );
    }
}
