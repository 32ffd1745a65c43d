//! Performance metrics computed from a snapshot sequence.

use super::backtest::BarInterval;
use super::portfolio::PortfolioSnapshot;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_value: f64,
    pub total_profit: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a non-positive fraction.
    pub max_drawdown: f64,
    pub volatility: f64,
    pub num_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
}

impl Metrics {
    pub fn compute(
        snapshots: &[PortfolioSnapshot],
        initial_capital: f64,
        bar_interval: BarInterval,
    ) -> Self {
        let final_value = snapshots
            .last()
            .map(|s| s.total_value)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let elapsed_days = match (snapshots.first(), snapshots.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
            _ => 0,
        };
        let annualized_return = annualize(total_return, elapsed_days);

        let returns = bar_returns(snapshots);
        let (sharpe_ratio, volatility) = compute_risk_adjusted(&returns, bar_interval);

        let (num_trades, win_rate, profit_factor) = compute_trade_stats(snapshots);

        Metrics {
            final_value,
            total_profit: final_value - initial_capital,
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown: compute_drawdown(snapshots),
            volatility,
            num_trades,
            win_rate,
            profit_factor,
        }
    }
}

fn annualize(total_return: f64, elapsed_days: i64) -> f64 {
    if elapsed_days <= 0 {
        return 0.0;
    }
    let annualized = (1.0 + total_return).powf(DAYS_PER_YEAR / elapsed_days as f64) - 1.0;
    if annualized.is_finite() {
        annualized
    } else {
        0.0
    }
}

/// Bar-over-bar percentage change of total value, skipping bars whose
/// previous value is zero.
pub fn bar_returns(snapshots: &[PortfolioSnapshot]) -> Vec<f64> {
    snapshots
        .windows(2)
        .filter(|w| w[0].total_value != 0.0)
        .map(|w| (w[1].total_value - w[0].total_value) / w[0].total_value)
        .collect()
}

fn compute_risk_adjusted(returns: &[f64], bar_interval: BarInterval) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return (0.0, 0.0);
    }

    let scale = bar_interval.bars_per_year().sqrt();
    (mean / std_dev * scale, std_dev * scale)
}

fn compute_drawdown(snapshots: &[PortfolioSnapshot]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for snap in snapshots {
        peak = peak.max(snap.total_value);
        if peak > 0.0 {
            max_dd = max_dd.min((snap.total_value - peak) / peak);
        }
    }

    max_dd
}

/// Count, win rate and profit factor over bars that carried a trade signal.
fn compute_trade_stats(snapshots: &[PortfolioSnapshot]) -> (usize, f64, f64) {
    let trades: Vec<f64> = snapshots
        .iter()
        .filter(|s| s.signal.is_trade())
        .map(|s| s.daily_pnl)
        .collect();

    if trades.is_empty() {
        return (0, 0.0, 0.0);
    }

    let wins = trades.iter().filter(|pnl| **pnl > 0.0).count();
    let gross_profit: f64 = trades.iter().filter(|pnl| **pnl > 0.0).sum();
    let gross_loss: f64 = trades.iter().filter(|pnl| **pnl < 0.0).map(|pnl| pnl.abs()).sum();

    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    (trades.len(), wins as f64 / trades.len() as f64, profit_factor)
}
