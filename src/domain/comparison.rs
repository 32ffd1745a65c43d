//! Side-by-side runs of several strategies over the same series.

use rayon::prelude::*;
use tracing::info;

use super::backtest::{BacktestResult, Backtester};
use super::error::TradebenchError;
use super::ohlcv::{validate_series, PricePoint};
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyComparison {
    /// Results in the order the strategies were supplied.
    pub results: Vec<BacktestResult>,
    /// Indices into `results`, best first.
    pub ranking: Vec<usize>,
}

impl StrategyComparison {
    pub fn from_results(results: Vec<BacktestResult>) -> Self {
        let ranking = rank(&results);
        StrategyComparison { results, ranking }
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.ranking.first().map(|&i| &self.results[i])
    }

    pub fn ranked(&self) -> impl Iterator<Item = &BacktestResult> {
        self.ranking.iter().map(|&i| &self.results[i])
    }
}

/// Sort by Sharpe ratio, then total return, both descending. Ties keep
/// input order.
fn rank(results: &[BacktestResult]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&a, &b| {
        let (ma, mb) = (&results[a].metrics, &results[b].metrics);
        mb.sharpe_ratio
            .total_cmp(&ma.sharpe_ratio)
            .then_with(|| mb.total_return.total_cmp(&ma.total_return))
    });
    order
}

impl Backtester {
    /// Run every strategy against the same bars on the rayon pool. Results
    /// come back in input order.
    pub fn run_multiple_strategies(
        &self,
        bars: &[PricePoint],
        strategies: &[Box<dyn Strategy>],
    ) -> Result<StrategyComparison, TradebenchError> {
        validate_series(bars)?;

        let results = strategies
            .par_iter()
            .map(|strategy| self.run(bars, strategy.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let comparison = StrategyComparison::from_results(results);
        if let Some(best) = comparison.best() {
            info!(
                strategies = comparison.results.len(),
                best = %best.strategy_name,
                sharpe_ratio = best.metrics.sharpe_ratio,
                "comparison complete"
            );
        }
        Ok(comparison)
    }
}
