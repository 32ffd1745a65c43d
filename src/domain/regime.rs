//! Market regime detection and regime-driven parameter adaptation.
//!
//! Volatility is classified by comparing ATR to its own rolling 100-sample
//! quartiles; trend strength by fixed ADX thresholds. Strategy parameter
//! types implement [`RegimeAdaptive`] so that [`adapt`] can apply the
//! volatility adjustment first and the trend adjustment on top of it.

use std::fmt;

use tracing::debug;

use super::indicator::adx::calculate_adx;
use super::indicator::atr::calculate_atr;
use super::indicator::rolling_quantile;
use super::ohlcv::PricePoint;

pub const VOLATILITY_LOOKBACK: usize = 100;
pub const HIGH_VOLATILITY_QUANTILE: f64 = 0.75;
pub const LOW_VOLATILITY_QUANTILE: f64 = 0.25;
pub const TRENDING_ADX: f64 = 25.0;
pub const RANGING_ADX: f64 = 20.0;

pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const DEFAULT_ADX_PERIOD: usize = 14;

/// Bumped whenever any strategy's multiplier table changes, so results can
/// be tied to the table that produced them.
pub const MULTIPLIER_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolatilityRegime {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendRegime {
    Trending,
    Moderate,
    Ranging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegimeLabel {
    pub volatility: VolatilityRegime,
    pub trend: TrendRegime,
}

impl fmt::Display for VolatilityRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilityRegime::High => write!(f, "high"),
            VolatilityRegime::Medium => write!(f, "medium"),
            VolatilityRegime::Low => write!(f, "low"),
        }
    }
}

impl fmt::Display for TrendRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendRegime::Trending => write!(f, "trending"),
            TrendRegime::Moderate => write!(f, "moderate"),
            TrendRegime::Ranging => write!(f, "ranging"),
        }
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.volatility, self.trend)
    }
}

pub fn classify_volatility(atr: f64, low_threshold: f64, high_threshold: f64) -> VolatilityRegime {
    if atr > high_threshold {
        VolatilityRegime::High
    } else if atr < low_threshold {
        VolatilityRegime::Low
    } else {
        VolatilityRegime::Medium
    }
}

pub fn classify_trend(adx: f64) -> TrendRegime {
    if adx > TRENDING_ADX {
        TrendRegime::Trending
    } else if adx < RANGING_ADX {
        TrendRegime::Ranging
    } else {
        TrendRegime::Moderate
    }
}

/// Derives per-bar regime labels from high/low/close history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeClassifier {
    pub atr_period: usize,
    pub adx_period: usize,
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        RegimeClassifier {
            atr_period: DEFAULT_ATR_PERIOD,
            adx_period: DEFAULT_ADX_PERIOD,
        }
    }
}

impl RegimeClassifier {
    pub fn new(atr_period: usize, adx_period: usize) -> Self {
        RegimeClassifier {
            atr_period,
            adx_period,
        }
    }

    pub fn classify(&self, bars: &[PricePoint]) -> Vec<RegimeLabel> {
        let atr_series = calculate_atr(bars, self.atr_period);
        let adx_series = calculate_adx(bars, self.adx_period);

        let atr: Vec<f64> = (0..bars.len())
            .map(|i| atr_series.simple(i).unwrap_or(0.0))
            .collect();
        let high = rolling_quantile(&atr, VOLATILITY_LOOKBACK, HIGH_VOLATILITY_QUANTILE);
        let low = rolling_quantile(&atr, VOLATILITY_LOOKBACK, LOW_VOLATILITY_QUANTILE);

        (0..bars.len())
            .map(|i| RegimeLabel {
                volatility: classify_volatility(atr[i], low[i], high[i]),
                trend: classify_trend(adx_series.simple(i).unwrap_or(0.0)),
            })
            .collect()
    }

    /// Label of the most recent bar, `None` for an empty slice.
    pub fn current(&self, bars: &[PricePoint]) -> Option<RegimeLabel> {
        self.classify(bars).last().copied()
    }
}

/// Parameter sets that can be re-tuned for a market regime.
pub trait RegimeAdaptive: Sized {
    fn adjust_for_volatility(&self, regime: VolatilityRegime) -> Self;
    fn adjust_for_trend(&self, regime: TrendRegime) -> Self;
}

/// Volatility adjustment first, then the trend adjustment on top.
pub fn adapt<P: RegimeAdaptive>(
    base: &P,
    volatility: VolatilityRegime,
    trend: TrendRegime,
) -> P {
    base.adjust_for_volatility(volatility)
        .adjust_for_trend(trend)
}

/// Adapt `base` to the regime of the last bar when a classifier is present.
pub fn adapt_to_latest<P>(base: &P, classifier: Option<&RegimeClassifier>, bars: &[PricePoint]) -> P
where
    P: RegimeAdaptive + Clone + fmt::Debug,
{
    match classifier.and_then(|c| c.current(bars)) {
        Some(label) => {
            let adapted = adapt(base, label.volatility, label.trend);
            debug!(regime = %label, ?adapted, "adapted strategy parameters");
            adapted
        }
        None => base.clone(),
    }
}

/// Multipliers applied to window-style parameters for one regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamMultipliers {
    pub window: f64,
    pub threshold: f64,
    pub holding: f64,
}

impl ParamMultipliers {
    pub const IDENTITY: ParamMultipliers = ParamMultipliers {
        window: 1.0,
        threshold: 1.0,
        holding: 1.0,
    };
}

/// One [`ParamMultipliers`] entry per volatility and trend label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplierTable {
    pub high_volatility: ParamMultipliers,
    pub medium_volatility: ParamMultipliers,
    pub low_volatility: ParamMultipliers,
    pub trending: ParamMultipliers,
    pub moderate: ParamMultipliers,
    pub ranging: ParamMultipliers,
}

impl MultiplierTable {
    pub fn for_volatility(&self, regime: VolatilityRegime) -> ParamMultipliers {
        match regime {
            VolatilityRegime::High => self.high_volatility,
            VolatilityRegime::Medium => self.medium_volatility,
            VolatilityRegime::Low => self.low_volatility,
        }
    }

    pub fn for_trend(&self, regime: TrendRegime) -> ParamMultipliers {
        match regime {
            TrendRegime::Trending => self.trending,
            TrendRegime::Moderate => self.moderate,
            TrendRegime::Ranging => self.ranging,
        }
    }
}

/// Scale a window length, rounding and never dropping below 1.
pub fn scale_window(window: usize, factor: f64) -> usize {
    ((window as f64 * factor).round() as usize).max(1)
}

pub fn scale_holding(holding: Option<usize>, factor: f64) -> Option<usize> {
    holding.map(|h| (h as f64 * factor).round() as usize)
}
