//! Build validated domain values from a [`ConfigPort`].
//!
//! Missing optional keys fall back to defaults; present but malformed or
//! out-of-range values are errors naming section and key.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::domain::backtest::{BacktestConfig, BarInterval};
use crate::domain::error::TradebenchError;
use crate::domain::regime::{RegimeClassifier, DEFAULT_ADX_PERIOD, DEFAULT_ATR_PERIOD};
use crate::domain::strategy::{
    MeanReversion, MeanReversionParams, MovingAverageCrossover, MovingAverageParams, RsiBollinger,
    RsiBollingerParams, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub const KNOWN_SECTIONS: [&str; 7] = [
    "data",
    "backtest",
    "regime",
    "strategy",
    "moving_average",
    "mean_reversion",
    "rsi_bollinger",
];

/// Run every builder once; used by `validate` and before any backtest.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradebenchError> {
    for section in unknown_sections(config) {
        warn!(%section, "ignoring unknown config section");
    }
    data_path(config)?;
    data_range(config)?;
    build_backtest_config(config)?;
    strategy_kind(config)?;
    build_all_strategies(config)?;
    Ok(())
}

/// Sections no builder reads; usually a typo.
pub fn unknown_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| s != "default" && !KNOWN_SECTIONS.contains(&s.as_str()))
        .collect()
}

pub fn data_path(config: &dyn ConfigPort) -> Result<String, TradebenchError> {
    match config.get_string("data", "path") {
        Some(path) => Ok(path),
        None => Err(TradebenchError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

/// Optional inclusive `[data] start` / `end` bounds.
pub fn data_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), TradebenchError> {
    let start = parse_datetime(config, "start", false)?;
    let end = parse_datetime(config, "end", true)?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(TradebenchError::invalid(
                "data",
                "start",
                "start must not be after end",
            ));
        }
    }
    Ok((start, end))
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare date. A bare end date covers the
/// whole day.
fn parse_datetime(
    config: &dyn ConfigPort,
    key: &str,
    end_of_day: bool,
) -> Result<Option<NaiveDateTime>, TradebenchError> {
    let Some(raw) = config.get_string("data", key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT) {
        return Ok(Some(dt));
    }
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        TradebenchError::invalid(
            "data",
            key,
            format!("expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, got '{raw}'"),
        )
    })?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    Ok(time)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradebenchError> {
    let defaults = BacktestConfig::default();
    let bar_interval = match config.get_string("backtest", "bar_interval") {
        Some(s) => s.parse::<BarInterval>()?,
        None => defaults.bar_interval,
    };
    let number = |key: &str, default: f64| read_f64(config, "backtest", key, default);
    let backtest = BacktestConfig {
        initial_capital: number("initial_capital", defaults.initial_capital)?,
        position_size: number("position_size", defaults.position_size)?,
        stop_loss: number("stop_loss", defaults.stop_loss)?,
        reinvest_profits: read_bool(
            config,
            "backtest",
            "reinvest_profits",
            defaults.reinvest_profits,
        )?,
        bar_interval,
    };
    backtest.validate()?;
    Ok(backtest)
}

/// `None` when `[regime] enabled = false`.
pub fn build_regime_classifier(
    config: &dyn ConfigPort,
) -> Result<Option<RegimeClassifier>, TradebenchError> {
    if !read_bool(config, "regime", "enabled", true)? {
        return Ok(None);
    }
    let atr_period = read_period(config, "regime", "atr_period", DEFAULT_ATR_PERIOD)?;
    let adx_period = read_period(config, "regime", "adx_period", DEFAULT_ADX_PERIOD)?;
    Ok(Some(RegimeClassifier::new(atr_period, adx_period)))
}

pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, TradebenchError> {
    config
        .get_string("strategy", "kind")
        .map_or(Ok(StrategyKind::MovingAverage), |s| s.parse())
}

fn min_holding_period(config: &dyn ConfigPort) -> Result<Option<usize>, TradebenchError> {
    config
        .get_string("strategy", "min_holding_period")
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                TradebenchError::invalid(
                    "strategy",
                    "min_holding_period",
                    format!("expected a non-negative integer, got '{}'", raw.trim()),
                )
            })
        })
        .transpose()
}

pub fn build_moving_average_params(
    config: &dyn ConfigPort,
) -> Result<MovingAverageParams, TradebenchError> {
    let defaults = MovingAverageParams::default();
    let params = MovingAverageParams {
        short_window: read_period(config, "moving_average", "short_window", defaults.short_window)?,
        long_window: read_period(config, "moving_average", "long_window", defaults.long_window)?,
        min_strength: read_f64(config, "moving_average", "min_strength", defaults.min_strength)?,
        min_holding_period: min_holding_period(config)?,
    };
    if params.short_window >= params.long_window {
        return Err(TradebenchError::invalid(
            "moving_average",
            "short_window",
            "short_window must be less than long_window",
        ));
    }
    if params.min_strength < 0.0 {
        return Err(TradebenchError::invalid(
            "moving_average",
            "min_strength",
            "min_strength must be non-negative",
        ));
    }
    Ok(params)
}

pub fn build_mean_reversion_params(
    config: &dyn ConfigPort,
) -> Result<MeanReversionParams, TradebenchError> {
    let defaults = MeanReversionParams::default();
    let params = MeanReversionParams {
        window: read_period(config, "mean_reversion", "window", defaults.window)?,
        threshold: read_f64(config, "mean_reversion", "threshold", defaults.threshold)?,
        min_holding_period: min_holding_period(config)?,
    };
    if params.threshold <= 0.0 {
        return Err(TradebenchError::invalid(
            "mean_reversion",
            "threshold",
            "threshold must be positive",
        ));
    }
    Ok(params)
}

pub fn build_rsi_bollinger_params(
    config: &dyn ConfigPort,
) -> Result<RsiBollingerParams, TradebenchError> {
    const SECTION: &str = "rsi_bollinger";
    let d = RsiBollingerParams::default();
    let params = RsiBollingerParams {
        rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
        bb_period: read_period(config, SECTION, "bb_period", d.bb_period)?,
        bb_std: read_f64(config, SECTION, "bb_std", d.bb_std)?,
        rsi_oversold: read_f64(config, SECTION, "rsi_oversold", d.rsi_oversold)?,
        rsi_overbought: read_f64(config, SECTION, "rsi_overbought", d.rsi_overbought)?,
        volume_threshold: read_f64(config, SECTION, "volume_threshold", d.volume_threshold)?,
        exit_long_rsi: read_f64(config, SECTION, "exit_long_rsi", d.exit_long_rsi)?,
        exit_short_rsi: read_f64(config, SECTION, "exit_short_rsi", d.exit_short_rsi)?,
        min_holding_period: min_holding_period(config)?,
    };

    let in_rsi_range = |v: f64| (0.0..=100.0).contains(&v);
    for (key, value) in [
        ("rsi_oversold", params.rsi_oversold),
        ("rsi_overbought", params.rsi_overbought),
        ("exit_long_rsi", params.exit_long_rsi),
        ("exit_short_rsi", params.exit_short_rsi),
    ] {
        if !in_rsi_range(value) {
            return Err(TradebenchError::invalid(
                SECTION,
                key,
                format!("must be within 0..=100, got {value}"),
            ));
        }
    }
    if params.rsi_oversold >= params.rsi_overbought {
        return Err(TradebenchError::invalid(
            SECTION,
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }
    if params.bb_std <= 0.0 {
        return Err(TradebenchError::invalid(SECTION, "bb_std", "bb_std must be positive"));
    }
    if params.volume_threshold < 0.0 {
        return Err(TradebenchError::invalid(
            SECTION,
            "volume_threshold",
            "volume_threshold must be non-negative",
        ));
    }
    Ok(params)
}

pub fn build_strategy(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<Box<dyn Strategy>, TradebenchError> {
    let regime = build_regime_classifier(config)?;

    let strategy: Box<dyn Strategy> = match kind {
        StrategyKind::MovingAverage | StrategyKind::MovingAverageVolume => {
            let mut s = MovingAverageCrossover::new(build_moving_average_params(config)?);
            if kind == StrategyKind::MovingAverageVolume {
                s = s.with_volume_confirmation();
            }
            if let Some(classifier) = regime {
                s = s.with_regime(classifier);
            }
            Box::new(s)
        }
        StrategyKind::MeanReversion | StrategyKind::MeanReversionVolume => {
            let mut s = MeanReversion::new(build_mean_reversion_params(config)?);
            if kind == StrategyKind::MeanReversionVolume {
                s = s.with_volume_confirmation();
            }
            if let Some(classifier) = regime {
                s = s.with_regime(classifier);
            }
            Box::new(s)
        }
        StrategyKind::RsiBollinger => {
            let mut s = RsiBollinger::new(build_rsi_bollinger_params(config)?);
            if let Some(classifier) = regime {
                s = s.with_regime(classifier);
            }
            Box::new(s)
        }
    };
    Ok(strategy)
}

pub fn build_all_strategies(
    config: &dyn ConfigPort,
) -> Result<Vec<Box<dyn Strategy>>, TradebenchError> {
    StrategyKind::ALL
        .into_iter()
        .map(|kind| build_strategy(config, kind))
        .collect()
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradebenchError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                let reason = format!("expected a number, got '{}'", raw.trim());
                TradebenchError::invalid(section, key, reason)
            }),
    }
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, TradebenchError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(TradebenchError::invalid(
                section,
                key,
                format!("expected true or false, got '{other}'"),
            )),
        },
    }
}

/// A window length: an integer of at least 1.
fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TradebenchError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| {
                TradebenchError::invalid(
                    section,
                    key,
                    format!("expected a positive integer, got '{}'", raw.trim()),
                )
            }),
    }
}
