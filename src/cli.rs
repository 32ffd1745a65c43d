//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestResult, Backtester};
use crate::domain::comparison::StrategyComparison;
use crate::domain::config_validation::{
    build_all_strategies, build_backtest_config, build_regime_classifier, build_strategy,
    data_path, data_range, strategy_kind, validate_config,
};
use crate::domain::error::TradebenchError;
use crate::domain::ohlcv::PricePoint;
use crate::domain::regime::MULTIPLIER_TABLE_VERSION;
use crate::domain::strategy::StrategyKind;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tradebench", about = "Regime-aware strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single strategy
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [strategy] kind
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// Run every strategy over the same data and rank them
    Compare {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest { config, strategy } => run_backtest(&config, strategy.as_deref()),
        Command::Compare { config } => run_compare(&config),
        Command::Validate { config } => run_validate(&config),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradebenchError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Relative data paths resolve against the config file's directory.
fn resolve_data_path(config_path: &Path, data: &str) -> PathBuf {
    let data = PathBuf::from(data);
    if data.is_absolute() {
        return data;
    }
    match config_path.parent() {
        Some(dir) => dir.join(data),
        None => data,
    }
}

fn load_bars(
    config_path: &Path,
    adapter: &FileConfigAdapter,
) -> Result<Vec<PricePoint>, TradebenchError> {
    let path = resolve_data_path(config_path, &data_path(adapter)?);
    let (start, end) = data_range(adapter)?;
    let source = CsvAdapter::new(path);

    eprintln!("Loading price data from {}", source.source_name());
    let bars = source.fetch_bars(start, end)?;
    if bars.is_empty() {
        return Err(TradebenchError::NoData {
            source_name: source.source_name(),
        });
    }
    eprintln!(
        "  {} bars from {} to {}",
        bars.len(),
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp
    );
    Ok(bars)
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
) -> Result<(), TradebenchError> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let kind = match strategy_override {
        Some(s) => s.parse::<StrategyKind>()?,
        None => strategy_kind(&adapter)?,
    };
    let strategy = build_strategy(&adapter, kind)?;
    let backtester = Backtester::new(build_backtest_config(&adapter)?)?;
    let bars = load_bars(config_path, &adapter)?;

    eprintln!("Running strategy: {}", strategy.name());
    let result = backtester.run(&bars, strategy.as_ref())?;
    print_summary(&result);
    Ok(())
}

fn run_compare(config_path: &Path) -> Result<(), TradebenchError> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let strategies = build_all_strategies(&adapter)?;
    let backtester = Backtester::new(build_backtest_config(&adapter)?)?;
    let bars = load_bars(config_path, &adapter)?;

    eprintln!("Running {} strategies...", strategies.len());
    let comparison = backtester.run_multiple_strategies(&bars, &strategies)?;
    print_comparison(&comparison);
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradebenchError> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let backtest = build_backtest_config(&adapter)?;
    let (start, end) = data_range(&adapter)?;
    let bound = |b: Option<chrono::NaiveDateTime>| b.map_or("open".to_string(), |t| t.to_string());

    eprintln!("\nData:");
    eprintln!("  path:  {}", data_path(&adapter)?);
    eprintln!("  range: {} .. {}", bound(start), bound(end));
    eprintln!("\nBacktest:");
    eprintln!("  initial capital:  {:.2}", backtest.initial_capital);
    eprintln!("  position size:    {:.2}", backtest.position_size);
    eprintln!("  stop loss:        {:.2}%", backtest.stop_loss * 100.0);
    eprintln!("  reinvest profits: {}", backtest.reinvest_profits);
    eprintln!("  bar interval:     {}", backtest.bar_interval);
    eprintln!("\nStrategy: {}", strategy_kind(&adapter)?);
    match build_regime_classifier(&adapter)? {
        Some(c) => eprintln!(
            "Regime detection: ATR {} / ADX {} (multiplier tables v{})",
            c.atr_period, c.adx_period, MULTIPLIER_TABLE_VERSION
        ),
        None => eprintln!("Regime detection: disabled"),
    }
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} ===", result.strategy_name);
    eprintln!("Final Value:       {:.2}", m.final_value);
    eprintln!("Total Profit:      {:.2}", m.total_profit);
    eprintln!("Total Return:      {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized Return: {:.2}%", m.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:      {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:      {:.2}%", m.max_drawdown * 100.0);
    eprintln!("Volatility:        {:.2}%", m.volatility * 100.0);
    eprintln!("Total Trades:      {}", m.num_trades);
    eprintln!("Win Rate:          {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:     {:.2}", m.profit_factor);
    if let Some(halt) = result.halt {
        eprintln!("Halted:            {} at {}", halt.reason, halt.timestamp);
    }
    print_trades(result);
}

const TRADES_SHOWN: usize = 20;

fn print_trades(result: &BacktestResult) {
    eprintln!(
        "\nClosed trades: {} (realized P&L {:.2})",
        result.trades.len(),
        result.realized_pnl()
    );
    if result.trades.is_empty() {
        return;
    }
    eprintln!(
        "{:<6} {:<20} {:>10} {:<20} {:>10} {:>10} {:>10}",
        "Side", "Entry", "Price", "Exit", "Price", "Shares", "P&L"
    );
    let skipped = result.trades.len().saturating_sub(TRADES_SHOWN);
    for trade in &result.trades[skipped..] {
        eprintln!(
            "{:<6} {:<20} {:>10.2} {:<20} {:>10.2} {:>10.4} {:>10.2}",
            trade.side,
            trade.entry_time.to_string(),
            trade.entry_price,
            trade.exit_time.to_string(),
            trade.exit_price,
            trade.shares,
            trade.pnl
        );
    }
    if skipped > 0 {
        eprintln!("  ({skipped} earlier trades not shown)");
    }
}

fn print_comparison(comparison: &StrategyComparison) {
    eprintln!("\n=== Strategy Comparison ===");
    eprintln!(
        "{:<4} {:<36} {:>10} {:>8} {:>10} {:>7} {:>8}",
        "Rank", "Strategy", "Return", "Sharpe", "Drawdown", "Trades", "Halted"
    );
    for (rank, result) in comparison.ranked().enumerate() {
        let m = &result.metrics;
        eprintln!(
            "{:<4} {:<36} {:>9.2}% {:>8.2} {:>9.2}% {:>7} {:>8}",
            rank + 1,
            result.strategy_name,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.num_trades,
            if result.halted_early() { "yes" } else { "no" }
        );
    }
    if let Some(best) = comparison.best() {
        eprintln!("\nBest strategy: {}", best.strategy_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_with_strategy_override() {
        let cli = Cli::try_parse_from([
            "tradebench",
            "backtest",
            "--config",
            "bt.ini",
            "--strategy",
            "mean_reversion",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest { config, strategy } => {
                assert_eq!(config, PathBuf::from("bt.ini"));
                assert_eq!(strategy.as_deref(), Some("mean_reversion"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn compare_requires_config() {
        assert!(Cli::try_parse_from(["tradebench", "compare"]).is_err());
    }

    #[test]
    fn relative_data_path_resolves_next_to_config() {
        let resolved = resolve_data_path(Path::new("/etc/tb/bt.ini"), "prices.csv");
        assert_eq!(resolved, PathBuf::from("/etc/tb/prices.csv"));
        let absolute = resolve_data_path(Path::new("/etc/tb/bt.ini"), "/data/p.csv");
        assert_eq!(absolute, PathBuf::from("/data/p.csv"));
    }

    #[test]
    fn missing_config_maps_to_io_exit() {
        let code = run(Cli {
            command: Command::Validate {
                config: PathBuf::from("/nonexistent/tradebench.ini"),
            },
        });
        // ExitCode has no PartialEq; compare debug forms
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(1)));
    }
}
