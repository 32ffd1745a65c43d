//! CLI integration tests: real INI and CSV files on disk, dispatched through
//! `cli::run` and checked by exit code.

mod common;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use common::*;
use tempfile::TempDir;
use tradebench::cli::{self, Cli, Command};
use tradebench::domain::config_validation::{build_strategy, strategy_kind, validate_config};
use tradebench::domain::strategy::StrategyKind;

const BASE_INI: &str = r#"
[data]
path = prices.csv

[backtest]
initial_capital = 100.0
position_size = 0.8
stop_loss = 0.02
reinvest_profits = true
bar_interval = minute

[strategy]
kind = moving_average
min_holding_period = 3

[regime]
enabled = true
atr_period = 14
adx_period = 14

[moving_average]
short_window = 5
long_window = 20
"#;

fn prices_csv(n: usize) -> String {
    let mut out = String::from("Timestamp,Open,High,Low,Close,Volume\n");
    for bar in synthetic_bars(n) {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.and_utc().timestamp(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    out
}

/// Writes `bt.ini` and `prices.csv` side by side.
fn workspace(ini: &str, csv: Option<&str>) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bt.ini");
    fs::write(&config, ini).unwrap();
    if let Some(csv) = csv {
        fs::write(dir.path().join("prices.csv"), csv).unwrap();
    }
    (dir, config)
}

fn exit_code(command: Command) -> String {
    format!("{:?}", cli::run(Cli { command }))
}

fn expected(code: u8) -> String {
    if code == 0 {
        format!("{:?}", ExitCode::SUCCESS)
    } else {
        format!("{:?}", ExitCode::from(code))
    }
}

mod validate {
    use super::*;

    #[test]
    fn valid_config_succeeds_without_data() {
        let (_dir, config) = workspace(BASE_INI, None);
        assert_eq!(exit_code(Command::Validate { config }), expected(0));
    }

    #[test]
    fn unparsable_number_is_config_error() {
        let ini = BASE_INI.replace("initial_capital = 100.0", "initial_capital = lots");
        let (_dir, config) = workspace(&ini, None);
        assert_eq!(exit_code(Command::Validate { config }), expected(2));
    }

    #[test]
    fn out_of_range_value_is_config_error() {
        let ini = BASE_INI.replace("position_size = 0.8", "position_size = 2.0");
        let (_dir, config) = workspace(&ini, None);
        assert_eq!(exit_code(Command::Validate { config }), expected(2));
    }

    #[test]
    fn missing_data_path_is_config_error() {
        let ini = BASE_INI.replace("path = prices.csv", "");
        let (_dir, config) = workspace(&ini, None);
        assert_eq!(exit_code(Command::Validate { config }), expected(2));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("absent.ini");
        assert_eq!(exit_code(Command::Validate { config }), expected(1));
    }
}

mod backtest {
    use super::*;

    #[test]
    fn runs_configured_strategy() {
        let (_dir, config) = workspace(BASE_INI, Some(&prices_csv(600)));
        let code = exit_code(Command::Backtest {
            config,
            strategy: None,
        });
        assert_eq!(code, expected(0));
    }

    #[test]
    fn strategy_override_is_honoured() {
        let (_dir, config) = workspace(BASE_INI, Some(&prices_csv(600)));
        let code = exit_code(Command::Backtest {
            config,
            strategy: Some("rsi-bollinger".to_string()),
        });
        assert_eq!(code, expected(0));
    }

    #[test]
    fn unknown_strategy_is_strategy_error() {
        let (_dir, config) = workspace(BASE_INI, Some(&prices_csv(50)));
        let code = exit_code(Command::Backtest {
            config,
            strategy: Some("martingale".to_string()),
        });
        assert_eq!(code, expected(4));
    }

    #[test]
    fn missing_price_file_is_io_error() {
        let (_dir, config) = workspace(BASE_INI, None);
        let code = exit_code(Command::Backtest {
            config,
            strategy: None,
        });
        assert_eq!(code, expected(1));
    }

    #[test]
    fn corrupt_price_file_is_data_error() {
        let csv = "Timestamp,Open,High,Low,Close,Volume\n1672531200,1,1,1,oops,1\n";
        let (_dir, config) = workspace(BASE_INI, Some(csv));
        let code = exit_code(Command::Backtest {
            config,
            strategy: None,
        });
        assert_eq!(code, expected(3));
    }

    #[test]
    fn empty_date_range_is_data_error() {
        // synthetic bars start in January 2023
        let ini = BASE_INI.replace(
            "path = prices.csv",
            "path = prices.csv\nstart = 2030-01-01\nend = 2030-01-02",
        );
        let (_dir, config) = workspace(&ini, Some(&prices_csv(50)));
        let code = exit_code(Command::Backtest {
            config,
            strategy: None,
        });
        assert_eq!(code, expected(3));
    }
}

mod compare {
    use super::*;

    #[test]
    fn ranks_all_strategies() {
        let (_dir, config) = workspace(BASE_INI, Some(&prices_csv(800)));
        assert_eq!(exit_code(Command::Compare { config }), expected(0));
    }

    #[test]
    fn absolute_data_path_is_used_as_is() {
        let data_dir = TempDir::new().unwrap();
        let csv_path = data_dir.path().join("elsewhere.csv");
        fs::write(&csv_path, prices_csv(200)).unwrap();
        let ini = BASE_INI.replace(
            "path = prices.csv",
            &format!("path = {}", csv_path.display()),
        );
        let (_dir, config) = workspace(&ini, None);
        assert_eq!(exit_code(Command::Compare { config }), expected(0));
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_builds_configured_strategy() {
        let (_dir, path) = workspace(BASE_INI, None);
        let config = cli::load_config(&path).unwrap();
        validate_config(&config).unwrap();

        let kind = strategy_kind(&config).unwrap();
        assert_eq!(kind, StrategyKind::MovingAverage);
        let strategy = build_strategy(&config, kind).unwrap();
        assert_eq!(strategy.name(), "Moving Average");
    }

    #[test]
    fn temp_file_config_round_trips_through_loader() {
        let file =
            write_temp_file("[data]\npath = p.csv\n[strategy]\nkind = mean_reversion_volume\n");
        let config = cli::load_config(file.path()).unwrap();
        assert_eq!(
            strategy_kind(&config).unwrap(),
            StrategyKind::MeanReversionVolume
        );
    }
}
