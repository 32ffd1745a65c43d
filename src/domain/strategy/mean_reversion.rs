//! Mean reversion around a rolling mean.
//!
//! deviation = (close - SMA(window)) / SMA(window); buy when deviation is at
//! or below -threshold, sell when at or above +threshold.
//!
//! The volume-compensated variant additionally requires that price has just
//! crossed the mean on this bar and that volume is above its own rolling
//! mean over the same window.

use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::ohlcv::PricePoint;
use crate::domain::regime::{
    adapt_to_latest, scale_holding, scale_window, MultiplierTable, ParamMultipliers,
    RegimeAdaptive, RegimeClassifier, TrendRegime, VolatilityRegime,
};
use crate::domain::signal::Signal;
use crate::domain::strategy::{finish_signals, Strategy};

pub const MEAN_REVERSION_MULTIPLIERS_V1: MultiplierTable = MultiplierTable {
    high_volatility: ParamMultipliers {
        window: 0.8,
        threshold: 1.5,
        holding: 1.0,
    },
    medium_volatility: ParamMultipliers::IDENTITY,
    low_volatility: ParamMultipliers {
        window: 1.2,
        threshold: 0.7,
        holding: 1.0,
    },
    trending: ParamMultipliers {
        window: 1.2,
        threshold: 1.3,
        holding: 1.5,
    },
    moderate: ParamMultipliers::IDENTITY,
    ranging: ParamMultipliers {
        window: 1.0,
        threshold: 0.8,
        holding: 1.0,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionParams {
    pub window: usize,
    pub threshold: f64,
    pub min_holding_period: Option<usize>,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        MeanReversionParams {
            window: 20,
            threshold: 0.005,
            min_holding_period: None,
        }
    }
}

impl MeanReversionParams {
    fn scaled(&self, m: ParamMultipliers) -> Self {
        MeanReversionParams {
            window: scale_window(self.window, m.window),
            threshold: self.threshold * m.threshold,
            min_holding_period: scale_holding(self.min_holding_period, m.holding),
        }
    }
}

impl RegimeAdaptive for MeanReversionParams {
    fn adjust_for_volatility(&self, regime: VolatilityRegime) -> Self {
        self.scaled(MEAN_REVERSION_MULTIPLIERS_V1.for_volatility(regime))
    }

    fn adjust_for_trend(&self, regime: TrendRegime) -> Self {
        self.scaled(MEAN_REVERSION_MULTIPLIERS_V1.for_trend(regime))
    }
}

#[derive(Debug, Clone)]
pub struct MeanReversion {
    name: String,
    params: MeanReversionParams,
    volume_confirmation: bool,
    regime: Option<RegimeClassifier>,
}

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Self {
        MeanReversion {
            name: "Mean Reversion".to_string(),
            params,
            volume_confirmation: false,
            regime: None,
        }
    }

    pub fn with_volume_confirmation(mut self) -> Self {
        self.volume_confirmation = true;
        self.name = "Mean Reversion Volume Compensated".to_string();
        self
    }

    pub fn with_regime(mut self, classifier: RegimeClassifier) -> Self {
        self.regime = Some(classifier);
        self
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, bars: &[PricePoint]) -> Vec<Signal> {
        let params = adapt_to_latest(&self.params, self.regime.as_ref(), bars);

        let mean_price = calculate_sma(bars, params.window);
        let mean_volume = self
            .volume_confirmation
            .then(|| calculate_volume_sma(bars, params.window));

        let signals = (0..bars.len())
            .map(|i| {
                let Some(mean) = mean_price.simple(i).filter(|m| *m != 0.0) else {
                    return Signal::Hold;
                };
                let close = bars[i].close;
                let deviation = (close - mean) / mean;

                let raw = if deviation <= -params.threshold {
                    Signal::Buy
                } else if deviation >= params.threshold {
                    Signal::Sell
                } else {
                    Signal::Hold
                };

                match (&mean_volume, raw) {
                    (_, Signal::Hold) | (None, _) => raw,
                    (Some(volume_ma), signal) => {
                        let volume_ok = bars[i].volume > volume_ma.simple(i).unwrap_or(f64::MAX);
                        let crossed = i > 0
                            && match (signal, mean_price.simple(i - 1)) {
                                (Signal::Buy, Some(prev_mean)) => {
                                    close < mean && bars[i - 1].close >= prev_mean
                                }
                                (Signal::Sell, Some(prev_mean)) => {
                                    close > mean && bars[i - 1].close <= prev_mean
                                }
                                _ => false,
                            };
                        if volume_ok && crossed {
                            signal
                        } else {
                            Signal::Hold
                        }
                    }
                }
            })
            .collect();

        finish_signals(signals, params.min_holding_period)
    }
}
