//! Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR(n) is the rolling mean of TR with a widening window, so every bar is
//! valid.

use super::{rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn true_ranges(bars: &[PricePoint]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    let atr = rolling_mean(&true_ranges(bars), period);

    let values = atr
        .into_iter()
        .map(|value| IndicatorPoint {
            valid: true,
            value: IndicatorValue::Simple(value),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
