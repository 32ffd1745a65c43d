//! Moving-average crossover, optionally confirmed by volume.
//!
//! Buy while SMA(short) > SMA(long) and |short - long| / long > min_strength,
//! sell on the mirrored condition. The check is level-based: every bar that
//! satisfies it signals, not only the bar where the averages cross.
//!
//! With volume confirmation, a buy also needs the short-window mean volume
//! above the long-window mean volume, and a sell needs it below.

use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::ohlcv::PricePoint;
use crate::domain::regime::{
    adapt_to_latest, scale_holding, scale_window, MultiplierTable, ParamMultipliers,
    RegimeAdaptive, RegimeClassifier, TrendRegime, VolatilityRegime,
};
use crate::domain::signal::Signal;
use crate::domain::strategy::{finish_signals, Strategy};

pub const MOVING_AVERAGE_MULTIPLIERS_V1: MultiplierTable = MultiplierTable {
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
        threshold: 1.0,
        holding: 1.5,
    },
    moderate: ParamMultipliers::IDENTITY,
    ranging: ParamMultipliers {
        window: 0.9,
        threshold: 1.0,
        holding: 0.8,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageParams {
    pub short_window: usize,
    pub long_window: usize,
    pub min_strength: f64,
    pub min_holding_period: Option<usize>,
}

impl Default for MovingAverageParams {
    fn default() -> Self {
        MovingAverageParams {
            short_window: 20,
            long_window: 50,
            min_strength: 0.001,
            min_holding_period: None,
        }
    }
}

impl MovingAverageParams {
    fn scaled(&self, m: ParamMultipliers) -> Self {
        let short_window = scale_window(self.short_window, m.window);
        let long_window = scale_window(self.long_window, m.window).max(short_window + 1);
        MovingAverageParams {
            short_window,
            long_window,
            min_strength: self.min_strength * m.threshold,
            min_holding_period: scale_holding(self.min_holding_period, m.holding),
        }
    }
}

impl RegimeAdaptive for MovingAverageParams {
    fn adjust_for_volatility(&self, regime: VolatilityRegime) -> Self {
        self.scaled(MOVING_AVERAGE_MULTIPLIERS_V1.for_volatility(regime))
    }

    fn adjust_for_trend(&self, regime: TrendRegime) -> Self {
        self.scaled(MOVING_AVERAGE_MULTIPLIERS_V1.for_trend(regime))
    }
}

#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    name: String,
    params: MovingAverageParams,
    volume_confirmation: bool,
    regime: Option<RegimeClassifier>,
}

impl MovingAverageCrossover {
    pub fn new(params: MovingAverageParams) -> Self {
        MovingAverageCrossover {
            name: "Moving Average".to_string(),
            params,
            volume_confirmation: false,
            regime: None,
        }
    }

    pub fn with_volume_confirmation(mut self) -> Self {
        self.volume_confirmation = true;
        self.name = "MA Volume Compensated".to_string();
        self
    }

    pub fn with_regime(mut self, classifier: RegimeClassifier) -> Self {
        self.regime = Some(classifier);
        self
    }
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, bars: &[PricePoint]) -> Vec<Signal> {
        let params = adapt_to_latest(&self.params, self.regime.as_ref(), bars);

        let short_ma = calculate_sma(bars, params.short_window);
        let long_ma = calculate_sma(bars, params.long_window);
        let volumes = self.volume_confirmation.then(|| {
            (
                calculate_volume_sma(bars, params.short_window),
                calculate_volume_sma(bars, params.long_window),
            )
        });

        let signals = (0..bars.len())
            .map(|i| {
                let (Some(short), Some(long)) = (short_ma.simple(i), long_ma.simple(i)) else {
                    return Signal::Hold;
                };
                if long == 0.0 || (short - long).abs() / long <= params.min_strength {
                    return Signal::Hold;
                }

                let volume_bias = volumes.as_ref().map(|(short_vol, long_vol)| {
                    let s = short_vol.simple(i).unwrap_or(0.0);
                    let l = long_vol.simple(i).unwrap_or(0.0);
                    s.partial_cmp(&l)
                });

                match volume_bias {
                    None if short > long => Signal::Buy,
                    None if short < long => Signal::Sell,
                    Some(Some(std::cmp::Ordering::Greater)) if short > long => Signal::Buy,
                    Some(Some(std::cmp::Ordering::Less)) if short < long => Signal::Sell,
                    _ => Signal::Hold,
                }
            })
            .collect();

        finish_signals(signals, params.min_holding_period)
    }
}
