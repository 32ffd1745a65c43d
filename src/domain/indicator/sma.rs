//! Simple moving averages of close and volume.
//!
//! SMA(n)[i] = mean of the last min(n, i+1) values. Every point is valid:
//! the window widens until n samples exist.

use super::{rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{closes, volumes, PricePoint};

pub fn calculate_sma(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    build(rolling_mean(&closes(bars), period), IndicatorType::Sma(period))
}

pub fn calculate_volume_sma(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    build(
        rolling_mean(&volumes(bars), period),
        IndicatorType::VolumeSma(period),
    )
}

fn build(means: Vec<f64>, indicator_type: IndicatorType) -> IndicatorSeries {
    let values = means
        .into_iter()
        .map(|mean| IndicatorPoint {
            valid: true,
            value: IndicatorValue::Simple(mean),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
