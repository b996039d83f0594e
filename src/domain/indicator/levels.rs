//! Support, resistance and stop-loss levels.
//!
//! Bar i is a support point when the lows of the preceding `run` bars fall
//! strictly into it: L[i-run] > L[i-run+1] > ... > L[i]. The value is L[i].
//! Resistance mirrors this with highs rising strictly into bar i.
//! The smoothed variants carry the last detected level forward until a new one
//! replaces it.
//! A stop is triggered when a close reaches the previous bar's stop level.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_support(prices: &PriceSeries, run: usize) -> IndicatorSeries {
    let lows: Vec<f64> = prices.bars().iter().map(|b| b.low).collect();
    let values = detect_runs(&lows, run, |earlier, later| earlier > later);
    IndicatorSeries::from_values(IndicatorType::Support, prices, values)
}

pub fn calculate_resistance(prices: &PriceSeries, run: usize) -> IndicatorSeries {
    let highs: Vec<f64> = prices.bars().iter().map(|b| b.high).collect();
    let values = detect_runs(&highs, run, |earlier, later| earlier < later);
    IndicatorSeries::from_values(IndicatorType::Resistance, prices, values)
}

fn detect_runs(values: &[f64], run: usize, step: impl Fn(f64, f64) -> bool) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if run == 0 || i < run {
                return None;
            }
            let window = &values[i - run..=i];
            window
                .windows(2)
                .all(|w| step(w[0], w[1]))
                .then_some(values[i])
        })
        .collect()
}

/// Carry each defined value forward until the next defined value.
pub fn forward_fill(series: &IndicatorSeries, indicator_type: IndicatorType) -> IndicatorSeries {
    let mut last = None;
    let values = series
        .values
        .iter()
        .map(|p| {
            if p.value.is_some() {
                last = p.value;
            }
            IndicatorPoint {
                timestamp: p.timestamp,
                value: last,
            }
        })
        .collect();
    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_stop_loss(prices: &PriceSeries, stop_loss_pct: f64) -> IndicatorSeries {
    let values = prices
        .bars()
        .iter()
        .map(|b| Some(b.close * (1.0 - stop_loss_pct)))
        .collect();
    IndicatorSeries::from_values(IndicatorType::StopLoss, prices, values)
}

/// Bars whose close falls to or below the stop level set on the bar before.
pub fn stop_loss_triggers(prices: &PriceSeries, stop_loss: &IndicatorSeries) -> Vec<bool> {
    prices
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            i > 0
                && stop_loss
                    .value_at(i - 1)
                    .is_some_and(|stop| bar.close <= stop)
        })
        .collect()
}
