//! RSI (Relative Strength Index).
//!
//! Over the trailing n close-to-close deltas:
//! RSI = 100 * mean(max(delta, 0)) / mean(|delta|)
//!
//! Equivalent to 100 - 100 / (1 + avg_gain / avg_loss) with simple averages.
//! Not available for the first n bars (n deltas are needed), and not available
//! when every delta in the window is zero.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_rsi(prices: &PriceSeries, period: usize) -> IndicatorSeries {
    let closes = prices.closes();
    let mut values = vec![None; closes.len()];

    if period > 0 && closes.len() > period {
        let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

        for (i, value) in values.iter_mut().enumerate().skip(period) {
            // deltas[i-1] is the move into bar i
            let window = &deltas[i - period..i];
            let gain: f64 = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
            let movement: f64 = window.iter().map(|d| d.abs()).sum::<f64>() / period as f64;

            *value = if movement == 0.0 {
                None
            } else {
                Some(100.0 * gain / movement)
            };
        }
    }

    IndicatorSeries::from_values(IndicatorType::Rsi(period), prices, values)
}
