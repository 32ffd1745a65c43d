//! CSV price file adapter.
//!
//! Expects a header row naming `Timestamp,Open,High,Low,Close,Volume`
//! (any order, case-insensitive) with the timestamp in Unix seconds.

use std::fs::File;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime};
use csv::StringRecord;
use tracing::debug;

use crate::domain::error::TradebenchError;
use crate::domain::ohlcv::PricePoint;
use crate::ports::data_port::DataPort;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn column_indices(headers: &StringRecord) -> Result<[usize; 6], TradebenchError> {
    let mut indices = [0usize; 6];
    for (slot, name) in indices.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| TradebenchError::Data {
                reason: format!("missing {name} column"),
            })?;
    }
    Ok(indices)
}

fn field(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<f64, TradebenchError> {
    let raw = record.get(index).ok_or_else(|| TradebenchError::Data {
        reason: format!("line {line}: missing {name} value"),
    })?;
    raw.trim().parse::<f64>().map_err(|e| TradebenchError::Data {
        reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
    })
}

fn parse_timestamp(seconds: f64, line: u64) -> Result<NaiveDateTime, TradebenchError> {
    if !seconds.is_finite() {
        return Err(TradebenchError::Data {
            reason: format!("line {line}: invalid timestamp {seconds}"),
        });
    }
    DateTime::from_timestamp(seconds.floor() as i64, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| TradebenchError::Data {
            reason: format!("line {line}: timestamp {seconds} out of range"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<PricePoint>, TradebenchError> {
        let file = File::open(&self.path)?;
        let mut rdr = csv::Reader::from_reader(file);

        let headers = rdr.headers().map_err(|e| TradebenchError::Data {
            reason: format!("CSV header error: {e}"),
        })?;
        let [ts_i, open_i, high_i, low_i, close_i, volume_i] = column_indices(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TradebenchError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let timestamp = parse_timestamp(field(&record, ts_i, "timestamp", line)?, line)?;
            if start.is_some_and(|s| timestamp < s) || end.is_some_and(|e| timestamp > e) {
                continue;
            }

            bars.push(PricePoint {
                timestamp,
                open: field(&record, open_i, "open", line)?,
                high: field(&record, high_i, "high", line)?,
                low: field(&record, low_i, "low", line)?,
                close: field(&record, close_i, "close", line)?,
                volume: field(&record, volume_i, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(path = %self.path.display(), bars = bars.len(), "loaded price bars");
        Ok(bars)
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }
}
