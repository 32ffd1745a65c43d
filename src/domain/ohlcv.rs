//! Price bar representation and series validation.

use chrono::NaiveDateTime;

use super::error::TradebenchError;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Check that a series is non-empty, strictly increasing in time, and has
/// positive finite closes.
pub fn validate_series(bars: &[PricePoint]) -> Result<(), TradebenchError> {
    if bars.is_empty() {
        return Err(TradebenchError::NoData {
            source_name: "input series".to_string(),
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(TradebenchError::InvalidSeries {
                index: i,
                reason: format!("close must be positive and finite, got {}", bar.close),
            });
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(TradebenchError::InvalidSeries {
                index: i,
                reason: format!(
                    "timestamp {} does not follow {}",
                    bar.timestamp,
                    bars[i - 1].timestamp
                ),
            });
        }
    }

    Ok(())
}

/// Per-bar close prices.
pub fn closes(bars: &[PricePoint]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Per-bar volumes.
pub fn volumes(bars: &[PricePoint]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}
