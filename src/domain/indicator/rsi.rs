//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are simple means of the last n close-to-close changes
//! (not Wilder smoothing):
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, otherwise 50 (flat market).
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

const NEUTRAL_RSI: f64 = 50.0;

pub fn calculate_rsi(bars: &[PricePoint], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let valid = period > 0 && i >= period;

        let rsi = if valid {
            let (gain_sum, loss_sum) = bars[i - period..=i].windows(2).fold(
                (0.0_f64, 0.0_f64),
                |(gains, losses), pair| {
                    let change = pair[1].close - pair[0].close;
                    if change > 0.0 {
                        (gains + change, losses)
                    } else {
                        (gains, losses - change)
                    }
                },
            );
            let avg_gain = gain_sum / period as f64;
            let avg_loss = loss_sum / period as f64;
            rsi_from_averages(avg_gain, avg_loss)
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            valid,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { NEUTRAL_RSI }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
