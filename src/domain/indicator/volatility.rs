//! Rolling volatility.
//!
//! Sample standard deviation of the last n close-to-close percentage returns.
//! VOL(n)[i] = sqrt(sum((R[i-j] - mean)^2 for j in 0..n) / (n - 1))
//! Warmup: first n bars are not available (bar 0 has no return). Periods below 2
//! yield no values.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_volatility(prices: &PriceSeries, period: usize) -> IndicatorSeries {
    let returns = prices.pct_change();
    let mut values = vec![None; returns.len()];

    if period >= 2 {
        for (i, value) in values.iter_mut().enumerate().skip(period) {
            let window: Vec<f64> = returns[i + 1 - period..=i].iter().flatten().copied().collect();
            *value = sample_stddev(&window);
        }
    }

    IndicatorSeries::from_values(IndicatorType::Volatility(period), prices, values)
}

/// Sample (n - 1) standard deviation; `None` below two observations.
pub(crate) fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
