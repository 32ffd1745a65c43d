//! Average Directional Index.
//!
//! +DM = high - prev_high when it exceeds prev_low - low and is positive, else 0.
//! -DM = prev_low - low when it exceeds high - prev_high and is positive, else 0.
//! TR, +DM and -DM are smoothed with a widening rolling mean over n, then
//! +DI = 100 * +DM_s / TR_s, -DI = 100 * -DM_s / TR_s,
//! DX = 100 * |+DI - -DI| / (+DI + -DI), ADX = rolling mean of DX over n.
//!
//! Any zero denominator yields 0 rather than NaN.

use super::atr::true_ranges;
use super::{rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_adx(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    let (plus_dm, minus_dm): (Vec<f64>, Vec<f64>) = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                return (0.0, 0.0);
            }
            let prev = &bars[i - 1];
            let up = bar.high - prev.high;
            let down = prev.low - bar.low;
            let plus = if up > down && up > 0.0 { up } else { 0.0 };
            let minus = if down > up && down > 0.0 { down } else { 0.0 };
            (plus, minus)
        })
        .unzip();

    let tr_smooth = rolling_mean(&true_ranges(bars), period);
    let plus_smooth = rolling_mean(&plus_dm, period);
    let minus_smooth = rolling_mean(&minus_dm, period);

    let dx: Vec<f64> = tr_smooth
        .iter()
        .zip(plus_smooth.iter().zip(&minus_smooth))
        .map(|(&tr, (&plus, &minus))| {
            let plus_di = ratio(100.0 * plus, tr);
            let minus_di = ratio(100.0 * minus, tr);
            ratio(100.0 * (plus_di - minus_di).abs(), plus_di + minus_di)
        })
        .collect();

    let values = rolling_mean(&dx, period)
        .into_iter()
        .map(|adx| IndicatorPoint {
            valid: true,
            value: IndicatorValue::Simple(adx),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
