//! Rolling indicators over price bars: SMA, RSI, Bollinger bands, ATR and ADX.
//!
//! Each `calculate_*` function returns an [`IndicatorSeries`] aligned
//! one-to-one with its input bars.
//!
//! Rolling statistics widen progressively while fewer than `period` samples
//! exist, so short history never makes an indicator fail.

pub mod sma;
pub mod rsi;
pub mod bollinger;
pub mod atr;
pub mod adx;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    VolumeSma(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Simple value at `index`, or `None` during warmup.
    pub fn simple(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// (upper, middle, lower) at `index`, or `None` during warmup.
    pub fn bands(&self, index: usize) -> Option<(f64, f64, f64)> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value:
                    IndicatorValue::Bollinger {
                        upper,
                        middle,
                        lower,
                    },
                ..
            }) => Some((*upper, *middle, *lower)),
            _ => None,
        }
    }
}

fn window_start(index: usize, period: usize) -> usize {
    (index + 1).saturating_sub(period.max(1))
}

/// Rolling mean with a widening window.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let window = &values[window_start(i, period)..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Rolling sample standard deviation (n - 1) with a widening window.
/// A single-sample window has deviation 0.
pub(crate) fn rolling_sample_stddev(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| sample_stddev(&values[window_start(i, period)..=i]))
        .collect()
}

/// Rolling quantile with linear interpolation between order statistics.
pub(crate) fn rolling_quantile(values: &[f64], period: usize, quantile: f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let mut window = values[window_start(i, period)..=i].to_vec();
            window.sort_by(f64::total_cmp);
            interpolate_quantile(&window, quantile)
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn interpolate_quantile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let position = quantile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (position - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rolling_mean_widens_during_warmup() {
        let means = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(means.len(), 4);
        assert_abs_diff_eq!(means[0], 2.0);
        assert_abs_diff_eq!(means[1], 3.0);
        assert_abs_diff_eq!(means[2], 4.0);
        assert_abs_diff_eq!(means[3], 6.0);
    }

    #[test]
    fn rolling_mean_zero_period_behaves_as_one() {
        let means = rolling_mean(&[2.0, 4.0], 0);
        assert_abs_diff_eq!(means[1], 4.0);
    }

    #[test]
    fn sample_stddev_uses_n_minus_one() {
        // mean 20, squared deviations 100 + 0 + 100, / 2 = 100
        assert_abs_diff_eq!(sample_stddev(&[10.0, 20.0, 30.0]), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sample_stddev(&[5.0]), 0.0);
    }

    #[test]
    fn rolling_stddev_first_sample_is_zero() {
        let std = rolling_sample_stddev(&[10.0, 20.0, 30.0], 2);
        assert_abs_diff_eq!(std[0], 0.0);
        assert_abs_diff_eq!(std[1], 50.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn quantile_interpolates() {
        let q = rolling_quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 100, 0.75);
        // last window [1..5]: position 3.0 -> 4.0
        assert_abs_diff_eq!(q[4], 4.0);
        // window [1,2]: position 0.75 -> 1.75
        assert_abs_diff_eq!(q[1], 1.75);
    }

    #[test]
    fn quantile_respects_window() {
        let q = rolling_quantile(&[100.0, 1.0, 2.0, 3.0], 3, 0.25);
        // last window [1,2,3]: position 0.5 -> 1.5
        assert_abs_diff_eq!(q[3], 1.5);
    }
}
