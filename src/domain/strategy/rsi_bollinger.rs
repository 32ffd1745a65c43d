//! RSI combined with Bollinger Bands and a volume spike filter.
//!
//! Entries need all three: RSI beyond its band, close touching the outer
//! Bollinger band (within a 0.1% tolerance), and volume above its rolling
//! mean times `volume_threshold`. Once an entry is implied, the first bar
//! where RSI reaches the exit level or close crosses the middle band is
//! turned into the opposing signal.

use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_volume_sma;
use crate::domain::ohlcv::PricePoint;
use crate::domain::regime::{
    adapt_to_latest, RegimeAdaptive, RegimeClassifier, TrendRegime, VolatilityRegime,
};
use crate::domain::signal::Signal;
use crate::domain::strategy::{finish_signals, Strategy};

pub const BAND_TOLERANCE: f64 = 0.001;

/// Per-regime change to the RSI band and Bollinger/volume multipliers.
/// `band_shift` moves oversold down and overbought up by that many points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiBollingerAdjustment {
    pub band_shift: f64,
    pub bb_std: f64,
    pub volume: f64,
}

impl RsiBollingerAdjustment {
    pub const IDENTITY: RsiBollingerAdjustment = RsiBollingerAdjustment {
        band_shift: 0.0,
        bb_std: 1.0,
        volume: 1.0,
    };
}

pub const RSI_BOLLINGER_HIGH_VOLATILITY_V1: RsiBollingerAdjustment = RsiBollingerAdjustment {
    band_shift: 5.0,
    bb_std: 1.2,
    volume: 1.3,
};

pub const RSI_BOLLINGER_LOW_VOLATILITY_V1: RsiBollingerAdjustment = RsiBollingerAdjustment {
    band_shift: -5.0,
    bb_std: 0.8,
    volume: 0.8,
};

pub const RSI_BOLLINGER_TRENDING_V1: RsiBollingerAdjustment = RsiBollingerAdjustment {
    band_shift: 10.0,
    bb_std: 1.5,
    volume: 1.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RsiBollingerParams {
    pub rsi_period: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub volume_threshold: f64,
    pub exit_long_rsi: f64,
    pub exit_short_rsi: f64,
    pub min_holding_period: Option<usize>,
}

impl Default for RsiBollingerParams {
    fn default() -> Self {
        RsiBollingerParams {
            rsi_period: 14,
            bb_period: 20,
            bb_std: 2.0,
            rsi_oversold: 25.0,
            rsi_overbought: 75.0,
            volume_threshold: 2.0,
            exit_long_rsi: 65.0,
            exit_short_rsi: 35.0,
            min_holding_period: None,
        }
    }
}

impl RsiBollingerParams {
    fn adjusted(&self, adj: RsiBollingerAdjustment) -> Self {
        RsiBollingerParams {
            bb_std: self.bb_std * adj.bb_std,
            rsi_oversold: self.rsi_oversold - adj.band_shift,
            rsi_overbought: self.rsi_overbought + adj.band_shift,
            volume_threshold: self.volume_threshold * adj.volume,
            ..self.clone()
        }
    }
}

impl RegimeAdaptive for RsiBollingerParams {
    fn adjust_for_volatility(&self, regime: VolatilityRegime) -> Self {
        self.adjusted(match regime {
            VolatilityRegime::High => RSI_BOLLINGER_HIGH_VOLATILITY_V1,
            VolatilityRegime::Low => RSI_BOLLINGER_LOW_VOLATILITY_V1,
            VolatilityRegime::Medium => RsiBollingerAdjustment::IDENTITY,
        })
    }

    fn adjust_for_trend(&self, regime: TrendRegime) -> Self {
        self.adjusted(match regime {
            TrendRegime::Trending => RSI_BOLLINGER_TRENDING_V1,
            TrendRegime::Moderate | TrendRegime::Ranging => RsiBollingerAdjustment::IDENTITY,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RsiBollinger {
    name: String,
    params: RsiBollingerParams,
    regime: Option<RegimeClassifier>,
}

impl RsiBollinger {
    pub fn new(params: RsiBollingerParams) -> Self {
        RsiBollinger {
            name: "RSI + Bollinger".to_string(),
            params,
            regime: None,
        }
    }

    pub fn with_regime(mut self, classifier: RegimeClassifier) -> Self {
        self.regime = Some(classifier);
        self
    }
}

impl Strategy for RsiBollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_signals(&self, bars: &[PricePoint]) -> Vec<Signal> {
        let params = adapt_to_latest(&self.params, self.regime.as_ref(), bars);

        let rsi = calculate_rsi(bars, params.rsi_period);
        let bands = calculate_bollinger(bars, params.bb_period, params.bb_std);
        let volume_ma = calculate_volume_sma(bars, params.bb_period);

        let mut position = Signal::Hold;
        let signals = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let Some((upper, middle, lower)) = bands.bands(i) else {
                    return Signal::Hold;
                };
                let rsi = rsi.simple(i);
                let spike = volume_ma
                    .simple(i)
                    .is_some_and(|ma| bar.volume > ma * params.volume_threshold);

                let buy = spike
                    && rsi.is_some_and(|r| r < params.rsi_oversold)
                    && bar.close <= lower * (1.0 + BAND_TOLERANCE);
                let sell = spike
                    && rsi.is_some_and(|r| r > params.rsi_overbought)
                    && bar.close >= upper * (1.0 - BAND_TOLERANCE);

                if buy {
                    position = Signal::Buy;
                    Signal::Buy
                } else if sell {
                    position = Signal::Sell;
                    Signal::Sell
                } else {
                    let exit = match position {
                        Signal::Buy => {
                            rsi.is_some_and(|r| r > params.exit_long_rsi) || bar.close < middle
                        }
                        Signal::Sell => {
                            rsi.is_some_and(|r| r < params.exit_short_rsi) || bar.close > middle
                        }
                        Signal::Hold => false,
                    };
                    if exit {
                        let closing = position.opposite();
                        position = Signal::Hold;
                        closing
                    } else {
                        Signal::Hold
                    }
                }
            })
            .collect();

        finish_signals(signals, params.min_holding_period)
    }
}
