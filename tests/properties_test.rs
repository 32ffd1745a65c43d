//! Property tests over random price paths and signal scripts.

mod common;

use chrono::Duration;
use common::*;
use proptest::prelude::*;
use tradebench::domain::backtest::{BacktestConfig, Backtester, BarInterval};
use tradebench::domain::signal::Signal;

fn bars_from(closes: &[f64]) -> Vec<PricePoint> {
    // 37-minute spacing so longer paths cross midnight
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            timestamp: base_time() + Duration::minutes(i as i64 * 37),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

fn signal_strategy() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Hold), Just(Signal::Buy), Just(Signal::Sell)]
}

fn scenario() -> impl Strategy<Value = (Vec<f64>, Vec<Signal>)> {
    (2usize..150).prop_flat_map(|n| {
        (
            prop::collection::vec(1.0f64..500.0, n),
            prop::collection::vec(signal_strategy(), n),
        )
    })
}

fn config_strategy() -> impl Strategy<Value = BacktestConfig> {
    (0.5f64..10_000.0, 0.05f64..=1.0, 0.005f64..=1.0, any::<bool>()).prop_map(
        |(initial_capital, position_size, stop_loss, reinvest_profits)| BacktestConfig {
            initial_capital,
            position_size,
            stop_loss,
            reinvest_profits,
            bar_interval: BarInterval::Minute,
        },
    )
}

proptest! {
    #[test]
    fn accounting_identities_hold((closes, signals) in scenario(), config in config_strategy()) {
        let bars = bars_from(&closes);
        let result = Backtester::new(config)
            .unwrap()
            .run_signals("random", &bars, &signals)
            .unwrap();

        prop_assert_eq!(result.snapshots.len(), bars.len());
        for (i, snap) in result.snapshots.iter().enumerate() {
            let tolerance = 1e-9 * snap.total_value.abs().max(1.0);
            prop_assert!((snap.total_value - (snap.cash + snap.holdings)).abs() <= tolerance);
            prop_assert!(snap.cash >= 0.0, "negative cash at bar {}", i);
            prop_assert!(snap.total_value >= 0.0);
            prop_assert_eq!(snap.timestamp, bars[i].timestamp);
            if i > 0 {
                let prev = result.snapshots[i - 1].total_value;
                let pnl_tolerance = tolerance.max(1e-9 * prev.abs());
                prop_assert!((snap.daily_pnl - (snap.total_value - prev)).abs() <= pnl_tolerance);
            }
        }

        let m = &result.metrics;
        prop_assert!(m.max_drawdown <= 0.0);
        prop_assert!(m.max_drawdown >= -1.0);
        prop_assert!(m.win_rate >= 0.0 && m.win_rate <= 1.0);
        prop_assert!(m.volatility >= 0.0);

        for trade in &result.trades {
            prop_assert!(trade.entry_time <= trade.exit_time);
            prop_assert!(trade.shares >= 0.0);
        }
        prop_assert!(result.trades.len() <= m.num_trades);
    }

    #[test]
    fn drawdown_is_zero_iff_value_never_falls(
        (closes, signals) in scenario(),
        config in config_strategy(),
    ) {
        let bars = bars_from(&closes);
        let result = Backtester::new(config)
            .unwrap()
            .run_signals("random", &bars, &signals)
            .unwrap();

        let never_falls = result
            .snapshots
            .windows(2)
            .all(|w| w[1].total_value >= w[0].total_value);
        prop_assert_eq!(result.metrics.max_drawdown == 0.0, never_falls);
    }

    #[test]
    fn liquidation_is_terminal((closes, signals) in scenario(), config in config_strategy()) {
        let bars = bars_from(&closes);
        let result = Backtester::new(config)
            .unwrap()
            .run_signals("random", &bars, &signals)
            .unwrap();

        if let Some(first_zero) = result.snapshots.iter().position(|s| s.total_value == 0.0) {
            prop_assert!(result.halted_early());
            for snap in &result.snapshots[first_zero..] {
                prop_assert_eq!(snap.total_value, 0.0);
                prop_assert_eq!(snap.position, 0.0);
            }
        }
    }

    #[test]
    fn hold_only_script_keeps_capital(closes in prop::collection::vec(1.0f64..500.0, 1..200)) {
        let bars = bars_from(&closes);
        let signals = vec![Signal::Hold; bars.len()];
        let result = Backtester::new(sample_config())
            .unwrap()
            .run_signals("idle", &bars, &signals)
            .unwrap();

        for snap in &result.snapshots {
            prop_assert_eq!(snap.total_value, 100.0);
            prop_assert_eq!(snap.cash, 100.0);
        }
        prop_assert_eq!(result.metrics.num_trades, 0);
        prop_assert_eq!(result.metrics.total_return, 0.0);
        prop_assert!(!result.halted_early());
    }
}
