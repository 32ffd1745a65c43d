#![allow(dead_code)]

use std::io::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tradebench::domain::backtest::{BacktestConfig, BarInterval};
use tradebench::domain::error::TradebenchError;
pub use tradebench::domain::ohlcv::PricePoint;
use tradebench::domain::signal::Signal;
use tradebench::domain::strategy::Strategy;
use tradebench::ports::data_port::DataPort;

pub struct MockDataPort {
    pub bars: Vec<PricePoint>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<PricePoint>) -> Self {
        Self { bars, error: None }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<PricePoint>, TradebenchError> {
        if let Some(reason) = &self.error {
            return Err(TradebenchError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.timestamp >= s))
            .filter(|b| end.is_none_or(|e| b.timestamp <= e))
            .cloned()
            .collect())
    }

    fn source_name(&self) -> String {
        "mock".to_string()
    }
}

/// Replays a fixed signal list, padded with Hold.
pub struct ScriptedStrategy {
    pub name: String,
    pub signals: Vec<Signal>,
}

impl ScriptedStrategy {
    pub fn new(name: &str, signals: Vec<Signal>) -> Self {
        Self {
            name: name.to_string(),
            signals,
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, bars: &[PricePoint]) -> Vec<Signal> {
        (0..bars.len())
            .map(|i| self.signals.get(i).copied().unwrap_or(Signal::Hold))
            .collect()
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

/// Flat bar (open = high = low = close) at `base_time() + minutes`.
pub fn make_bar(minutes: i64, close: f64) -> PricePoint {
    PricePoint {
        timestamp: base_time() + Duration::minutes(minutes),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

/// One bar per minute.
pub fn minute_bars(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i as i64, c))
        .collect()
}

/// Deterministic noisy walk with a spread between high and low and varying
/// volume, spanning several days of minute bars.
pub fn synthetic_bars(n: usize) -> Vec<PricePoint> {
    let mut price = 100.0_f64;
    (0..n)
        .map(|i| {
            let x = i as f64;
            let step = (x * 0.37).sin() * 0.6 + (x * 0.05).cos() * 0.3;
            let prev = price;
            price = (price + step).max(1.0);
            let spike = if i % 17 == 0 { 3000.0 } else { 0.0 };
            PricePoint {
                timestamp: base_time() + Duration::minutes(i as i64 * 7),
                open: prev,
                high: prev.max(price) + 0.25,
                low: prev.min(price) - 0.25,
                close: price,
                volume: 1000.0 + 400.0 * (x * 0.9).sin().abs() + spike,
            }
        })
        .collect()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 100.0,
        position_size: 1.0,
        stop_loss: 1.0,
        reinvest_profits: true,
        bar_interval: BarInterval::Minute,
    }
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
