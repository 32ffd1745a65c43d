//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: rolling mean of close over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1). Windows widen
//! during warmup, so every point is valid; a one-bar window has zero width.

use crate::domain::indicator::{
    rolling_mean, rolling_sample_stddev, IndicatorPoint, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::ohlcv::{closes, PricePoint};

pub fn calculate_bollinger(bars: &[PricePoint], period: usize, mult: f64) -> IndicatorSeries {
    let prices = closes(bars);
    let middles = rolling_mean(&prices, period);
    let stddevs = rolling_sample_stddev(&prices, period);

    let values = middles
        .iter()
        .zip(&stddevs)
        .map(|(&middle, &stddev)| IndicatorPoint {
            valid: true,
            value: IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100: (mult * 100.0).round() as u32,
        },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn bollinger_constant_values() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let series = calculate_bollinger(&bars, 3, 2.0);
        let (upper, middle, lower) = series.bands(3).unwrap();
        assert_abs_diff_eq!(middle, 100.0);
        assert_abs_diff_eq!(upper, 100.0);
        assert_abs_diff_eq!(lower, 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, 3, 2.0);
        let (upper, middle, lower) = series.bands(2).unwrap();

        // sample stddev of [10, 20, 30] is 10
        assert_abs_diff_eq!(middle, 20.0, epsilon = 1e-10);
        assert_abs_diff_eq!(upper, 40.0, epsilon = 1e-10);
        assert_abs_diff_eq!(lower, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_first_bar_has_zero_width() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_bollinger(&bars, 20, 2.0);
        let (upper, middle, lower) = series.bands(0).unwrap();
        assert_abs_diff_eq!(upper, middle);
        assert_abs_diff_eq!(lower, middle);
    }

    #[test]
    fn bollinger_symmetry() {
        let bars = make_bars(&[10.0, 25.0, 30.0, 12.0]);
        let series = calculate_bollinger(&bars, 3, 1.5);
        let (upper, middle, lower) = series.bands(3).unwrap();
        assert_abs_diff_eq!(upper - middle, middle - lower, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_indicator_type() {
        let series = calculate_bollinger(&make_bars(&[1.0]), 20, 2.4);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 240
            }
        );
    }
}
