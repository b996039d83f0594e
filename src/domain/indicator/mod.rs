//! Technical indicators.
//!
//! - `IndicatorPoint`: one timestamped value, `None` while the indicator is not available
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: one indicator column aligned with a price series
//! - `IndicatorSet`: every column computed for a series by [`compute_indicators`]

pub mod levels;
pub mod rsi;
pub mod sma;
pub mod volatility;

use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::params::IndicatorParams;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Volatility(usize),
    Support,
    Resistance,
    SmoothedSupport,
    SmoothedResistance,
    StopLoss,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Volatility(period) => write!(f, "VOLATILITY({})", period),
            IndicatorType::Support => write!(f, "SUPPORT"),
            IndicatorType::Resistance => write!(f, "RESISTANCE"),
            IndicatorType::SmoothedSupport => write!(f, "SMOOTH_SUPPORT"),
            IndicatorType::SmoothedResistance => write!(f, "SMOOTH_RESISTANCE"),
            IndicatorType::StopLoss => write!(f, "STOP_LOSS"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn from_values(
        indicator_type: IndicatorType,
        prices: &PriceSeries,
        values: Vec<Option<f64>>,
    ) -> Self {
        let values = prices
            .bars()
            .iter()
            .zip(values)
            .map(|(bar, value)| IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            })
            .collect();
        Self {
            indicator_type,
            values,
        }
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bare values, for callers that only need the column.
    pub fn raw(&self) -> Vec<Option<f64>> {
        self.values.iter().map(|p| p.value).collect()
    }
}

/// All indicator columns for one price series, aligned 1:1 with its bars.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub symbol: String,
    pub params: IndicatorParams,
    len: usize,
    series: HashMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator_type)
    }

    pub fn value(&self, indicator_type: &IndicatorType, index: usize) -> Option<f64> {
        self.get(indicator_type).and_then(|s| s.value_at(index))
    }

    pub fn fast_sma(&self, index: usize) -> Option<f64> {
        self.value(&IndicatorType::Sma(self.params.fast_window), index)
    }

    pub fn slow_sma(&self, index: usize) -> Option<f64> {
        self.value(&IndicatorType::Sma(self.params.slow_window), index)
    }

    pub fn rsi(&self, index: usize) -> Option<f64> {
        self.value(&IndicatorType::Rsi(self.params.rsi_window), index)
    }

    pub fn indicator_types(&self) -> Vec<&IndicatorType> {
        let mut types: Vec<_> = self.series.keys().collect();
        types.sort_by_key(|t| t.to_string());
        types
    }

    fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.indicator_type.clone(), series);
    }
}

/// Compute every indicator column for `prices`.
///
/// All-or-nothing: a non-finite value anywhere fails the whole stage rather than
/// returning a partial set.
pub fn compute_indicators(
    prices: &PriceSeries,
    params: &IndicatorParams,
) -> Result<IndicatorSet, TrendscopeError> {
    if prices.is_empty() {
        return Err(TrendscopeError::DataUnavailable {
            symbol: prices.symbol().to_string(),
        });
    }

    let mut set = IndicatorSet {
        symbol: prices.symbol().to_string(),
        params: params.clone(),
        len: prices.len(),
        series: HashMap::new(),
    };

    set.insert(sma::calculate_sma(prices, params.fast_window));
    set.insert(sma::calculate_sma(prices, params.slow_window));
    set.insert(rsi::calculate_rsi(prices, params.rsi_window));
    set.insert(volatility::calculate_volatility(prices, params.volatility_window));

    let support = levels::calculate_support(prices, params.support_run);
    let resistance = levels::calculate_resistance(prices, params.support_run);
    set.insert(levels::forward_fill(&support, IndicatorType::SmoothedSupport));
    set.insert(levels::forward_fill(&resistance, IndicatorType::SmoothedResistance));
    set.insert(support);
    set.insert(resistance);
    set.insert(levels::calculate_stop_loss(prices, params.stop_loss_pct));

    for series in set.series.values() {
        if let Some(point) = series
            .values
            .iter()
            .find(|p| p.value.is_some_and(|v| !v.is_finite()))
        {
            let err = TrendscopeError::Computation {
                symbol: prices.symbol().to_string(),
                stage: "indicators".to_string(),
                reason: format!(
                    "{} produced a non-finite value at {}",
                    series.indicator_type, point.timestamp
                ),
            };
            warn!(symbol = prices.symbol(), stage = "indicators", "{err}");
            return Err(err);
        }
    }

    debug!(
        symbol = prices.symbol(),
        bars = prices.len(),
        columns = set.series.len(),
        "indicators computed"
    );
    Ok(set)
}
