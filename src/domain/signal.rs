//! Signal generation from indicator columns.
//!
//! Every rule reads only bars at or before the bar it labels, so a signal never
//! changes when later bars are appended.

use crate::domain::error::TrendscopeError;
use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::params::{SignalParams, StrategyKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    /// +1, -1 or 0.
    pub fn direction(self) -> f64 {
        match self {
            Signal::Long => 1.0,
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => f.write_str("+1"),
            Signal::Short => f.write_str("-1"),
            Signal::Flat => f.write_str("0"),
        }
    }
}

/// Long while the fast average is above the slow one, short while below.
/// Undefined where either average is not yet available.
pub fn crossover_positions(set: &IndicatorSet) -> Vec<Option<Signal>> {
    (0..set.len())
        .map(|i| match (set.fast_sma(i), set.slow_sma(i)) {
            (Some(fast), Some(slow)) if fast > slow => Some(Signal::Long),
            (Some(fast), Some(slow)) if fast < slow => Some(Signal::Short),
            (Some(_), Some(_)) => Some(Signal::Flat),
            _ => None,
        })
        .collect()
}

/// Support/resistance breakout confirmed by trend and fading RSI.
///
/// Long: close crosses above the smoothed resistance by more than `margin`, the
/// fast average is above the slow one and RSI fell versus the prior bar.
/// Short is the mirror image against the smoothed support.
pub fn breakout_signals(prices: &PriceSeries, set: &IndicatorSet, margin: f64) -> Vec<Signal> {
    let bars = prices.bars();
    let warmup = set.params.warmup();
    let resistance = IndicatorType::SmoothedResistance;
    let support = IndicatorType::SmoothedSupport;

    (0..bars.len())
        .map(|i| {
            if i < warmup || i == 0 {
                return Signal::Flat;
            }
            let close = bars[i].close;
            let prev_close = bars[i - 1].close;
            let trend = set.fast_sma(i).zip(set.slow_sma(i));
            let rsi = set.rsi(i).zip(set.rsi(i - 1));

            let buy = match (
                set.value(&resistance, i - 1),
                set.value(&resistance, i),
                trend,
                rsi,
            ) {
                (Some(prev_res), Some(res), Some((fast, slow)), Some((rsi, prev_rsi))) => {
                    prev_close < prev_res
                        && close > res * (1.0 + margin)
                        && fast > slow
                        && rsi < prev_rsi
                }
                _ => false,
            };

            let sell = match (
                set.value(&support, i - 1),
                set.value(&support, i),
                trend,
                rsi,
            ) {
                (Some(prev_sup), Some(sup), Some((fast, slow)), Some((rsi, prev_rsi))) => {
                    prev_close > prev_sup
                        && close < sup * (1.0 - margin)
                        && fast < slow
                        && rsi > prev_rsi
                }
                _ => false,
            };

            match (buy, sell) {
                (true, false) => Signal::Long,
                (false, true) => Signal::Short,
                _ => Signal::Flat,
            }
        })
        .collect()
}

/// Two-candle engulfing pattern on open/close bodies.
///
/// Short when a red bar opens at or above the prior green close and closes
/// under the prior open; long for the mirror case. Bar 0 has no prior candle.
pub fn engulfing_signals(prices: &PriceSeries) -> Vec<Signal> {
    let bars = prices.bars();
    (0..bars.len())
        .map(|i| {
            if i == 0 {
                return Signal::Flat;
            }
            let (prev, cur) = (&bars[i - 1], &bars[i]);
            let bearish = cur.open > cur.close
                && prev.open < prev.close
                && cur.close < prev.open
                && cur.open >= prev.close;
            let bullish = cur.open < cur.close
                && prev.open > prev.close
                && cur.close > prev.open
                && cur.open <= prev.close;
            match (bullish, bearish) {
                (true, _) => Signal::Long,
                (_, true) => Signal::Short,
                _ => Signal::Flat,
            }
        })
        .collect()
}

/// Per-bar position for the configured strategy.
pub fn compute_signal(
    prices: &PriceSeries,
    set: &IndicatorSet,
    params: &SignalParams,
) -> Result<Vec<Option<Signal>>, TrendscopeError> {
    if set.len() != prices.len() {
        return Err(TrendscopeError::Computation {
            symbol: prices.symbol().to_string(),
            stage: "signal".to_string(),
            reason: format!(
                "indicator set has {} rows but series has {} bars",
                set.len(),
                prices.len()
            ),
        });
    }

    Ok(match params.strategy {
        StrategyKind::Crossover => crossover_positions(set),
        StrategyKind::Breakout => breakout_signals(prices, set, params.breakout_margin)
            .into_iter()
            .map(Some)
            .collect(),
        StrategyKind::Engulfing => engulfing_signals(prices).into_iter().map(Some).collect(),
    })
}
