//! Returns, drawdown and risk-adjusted performance metrics.
//!
//! Positions are always applied with a one-bar lag: the position decided at
//! bar t-1 earns the return realised over [t-1, t].

use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::Signal;
use crate::domain::indicator::volatility::sample_stddev;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Per-bar returns aligned with a price series; `None` where undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<Option<f64>>,
}

impl ReturnSeries {
    /// Unlevered close-to-close returns of simply holding the instrument.
    pub fn buy_and_hold(prices: &PriceSeries) -> Self {
        Self {
            timestamps: prices.timestamps(),
            values: prices.pct_change(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn defined(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .zip(&self.values)
            .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
    }

    fn defined_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    fn mean(&self) -> Option<f64> {
        let values = self.defined_values();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

fn check_aligned(prices: &PriceSeries, positions: usize, stage: &str) -> Result<(), TrendscopeError> {
    if prices.is_empty() {
        return Err(TrendscopeError::DataUnavailable {
            symbol: prices.symbol().to_string(),
        });
    }
    if positions != prices.len() {
        return Err(TrendscopeError::Computation {
            symbol: prices.symbol().to_string(),
            stage: stage.to_string(),
            reason: format!(
                "{} positions for {} bars",
                positions,
                prices.len()
            ),
        });
    }
    Ok(())
}

/// r[t] = (close[t] / close[t-1] - 1) * position[t-1]
pub fn compute_returns(
    prices: &PriceSeries,
    positions: &[Option<Signal>],
) -> Result<ReturnSeries, TrendscopeError> {
    check_aligned(prices, positions.len(), "returns")?;

    let pct = prices.pct_change();
    let values = (0..pct.len())
        .map(|t| {
            if t == 0 {
                return None;
            }
            let position = positions[t - 1]?;
            pct[t].map(|r| r * position.direction())
        })
        .collect();

    Ok(ReturnSeries {
        timestamps: prices.timestamps(),
        values,
    })
}

/// Return of a breakout trade held for `duration` bars.
///
/// r[t] = (pct[t] + pct[t-1] + ... + pct[t-duration+1]) * signal[t-duration],
/// less `spread` whenever the lagged signal opened a position.
pub fn holding_returns(
    prices: &PriceSeries,
    signals: &[Option<Signal>],
    duration: usize,
    spread: f64,
) -> Result<ReturnSeries, TrendscopeError> {
    check_aligned(prices, signals.len(), "holding returns")?;

    let duration = duration.max(1);
    let pct = prices.pct_change();
    let values = (0..pct.len())
        .map(|t| {
            if t < duration {
                return None;
            }
            let signal = signals[t - duration]?;
            let held: f64 = pct[t + 1 - duration..=t].iter().flatten().sum();
            let gross = held * signal.direction();
            Some(if signal == Signal::Flat { gross } else { gross - spread })
        })
        .collect();

    Ok(ReturnSeries {
        timestamps: prices.timestamps(),
        values,
    })
}

/// Running sum of returns; undefined bars contribute nothing.
pub fn cumulative_returns(returns: &ReturnSeries) -> Vec<f64> {
    let mut total = 0.0;
    returns
        .values
        .iter()
        .map(|r| {
            total += r.unwrap_or(0.0);
            total
        })
        .collect()
}

/// dd[t] = (1 + cum[t]) / max(1 + cum[..=t]) - 1
pub fn drawdown_from_cumulative(cumulative: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    cumulative
        .iter()
        .map(|c| {
            let wealth = 1.0 + c;
            peak = peak.max(wealth);
            if peak > 0.0 { (wealth / peak - 1.0).min(0.0) } else { 0.0 }
        })
        .collect()
}

pub fn compute_drawdown(returns: &ReturnSeries) -> DrawdownSeries {
    DrawdownSeries {
        timestamps: returns.timestamps.clone(),
        values: drawdown_from_cumulative(&cumulative_returns(returns)),
    }
}

/// Deepest drawdown as a positive percentage.
pub fn max_drawdown(drawdown: &DrawdownSeries) -> f64 {
    let deepest = drawdown.values.iter().copied().fold(0.0_f64, f64::min);
    if deepest < 0.0 { -deepest * 100.0 } else { 0.0 }
}

/// sqrt(annualization) * mean(r) / stdev(r where r < 0)
pub fn sortino(returns: &ReturnSeries, annualization: f64) -> Result<f64, TrendscopeError> {
    let mean = returns
        .mean()
        .ok_or_else(|| TrendscopeError::degenerate("sortino", "no returns"))?;

    let downside: Vec<f64> = returns
        .defined_values()
        .into_iter()
        .filter(|r| *r < 0.0)
        .collect();
    if downside.is_empty() {
        return Err(TrendscopeError::degenerate("sortino", "no negative returns"));
    }
    let downside_std = sample_stddev(&downside).ok_or_else(|| {
        TrendscopeError::degenerate("sortino", "a single negative return has no deviation")
    })?;
    if downside_std == 0.0 {
        return Err(TrendscopeError::degenerate(
            "sortino",
            "negative returns have zero deviation",
        ));
    }

    Ok(annualization.sqrt() * mean / downside_std)
}

/// cov(asset, benchmark) / var(benchmark) over the bars both series define.
pub fn beta(asset: &ReturnSeries, benchmark: &ReturnSeries) -> Result<f64, TrendscopeError> {
    let bench: HashMap<NaiveDateTime, f64> = benchmark.defined().collect();
    let pairs: Vec<(f64, f64)> = asset
        .defined()
        .filter_map(|(ts, a)| bench.get(&ts).map(|b| (a, *b)))
        .collect();

    if pairs.len() < 2 {
        return Err(TrendscopeError::degenerate(
            "beta",
            "fewer than two overlapping returns",
        ));
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let cov = pairs
        .iter()
        .map(|(a, b)| (a - mean_a) * (b - mean_b))
        .sum::<f64>()
        / (n - 1.0);
    let var = pairs.iter().map(|(_, b)| (b - mean_b).powi(2)).sum::<f64>() / (n - 1.0);

    if var == 0.0 {
        return Err(TrendscopeError::degenerate(
            "beta",
            "benchmark variance is zero",
        ));
    }
    Ok(cov / var)
}

/// annualization * mean(r) * (1 - beta) * 100, in percent.
pub fn alpha(
    asset: &ReturnSeries,
    beta: Option<f64>,
    annualization: f64,
) -> Result<f64, TrendscopeError> {
    let beta = beta.ok_or_else(|| TrendscopeError::degenerate("alpha", "beta is undefined"))?;
    let mean = asset
        .mean()
        .ok_or_else(|| TrendscopeError::degenerate("alpha", "no returns"))?;
    Ok(annualization * mean * (1.0 - beta) * 100.0)
}

#[derive(Debug)]
pub struct PerformanceReport {
    pub returns: ReturnSeries,
    pub cumulative: Vec<f64>,
    pub drawdown: DrawdownSeries,
    /// Final cumulative return, in percent.
    pub total_return: f64,
    /// Deepest drawdown, positive percent.
    pub max_drawdown: f64,
    pub sortino: Result<f64, TrendscopeError>,
    pub beta: Result<f64, TrendscopeError>,
    pub alpha: Result<f64, TrendscopeError>,
}

impl PerformanceReport {
    pub fn compute(
        returns: ReturnSeries,
        benchmark: Option<&ReturnSeries>,
        annualization: f64,
    ) -> Self {
        let cumulative = cumulative_returns(&returns);
        let drawdown = compute_drawdown(&returns);
        let total_return = cumulative.last().copied().unwrap_or(0.0) * 100.0;
        let max_drawdown = max_drawdown(&drawdown);
        let sortino = sortino(&returns, annualization);
        let beta = match benchmark {
            Some(bench) => beta(&returns, bench),
            None => Err(TrendscopeError::degenerate("beta", "no benchmark configured")),
        };
        let alpha = alpha(&returns, beta.as_ref().ok().copied(), annualization);

        PerformanceReport {
            returns,
            cumulative,
            drawdown,
            total_return,
            max_drawdown,
            sortino,
            beta,
            alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::series_from_closes;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(day)
    }

    fn returns_from(values: &[Option<f64>]) -> ReturnSeries {
        ReturnSeries {
            timestamps: (0..values.len() as i64).map(ts).collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn lagged_returns_fixture() {
        let prices = series_from_closes(&[100.0, 102.0, 101.0, 105.0, 104.0]);
        let positions = [
            Some(Signal::Long),
            Some(Signal::Long),
            Some(Signal::Short),
            Some(Signal::Short),
            Some(Signal::Flat),
        ];
        let returns = compute_returns(&prices, &positions).unwrap();

        assert_eq!(returns.values[0], None);
        assert_abs_diff_eq!(returns.values[1].unwrap(), 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(returns.values[2].unwrap(), -0.0098, epsilon = 1e-4);
        assert_abs_diff_eq!(returns.values[3].unwrap(), -0.0396, epsilon = 1e-4);
        // bar 3 was short, so the drop into bar 4 is a gain
        assert_abs_diff_eq!(returns.values[4].unwrap(), 1.0 / 105.0, epsilon = 1e-12);
    }

    #[test]
    fn returns_undefined_after_undefined_position() {
        let prices = series_from_closes(&[100.0, 102.0, 101.0]);
        let returns = compute_returns(&prices, &[None, Some(Signal::Long), None]).unwrap();
        assert_eq!(returns.values[1], None);
        assert!(returns.values[2].is_some());
    }

    #[test]
    fn returns_reject_misaligned_positions() {
        let prices = series_from_closes(&[100.0, 102.0, 101.0]);
        let err = compute_returns(&prices, &[None]).unwrap_err();
        assert!(matches!(err, TrendscopeError::Computation { .. }));
    }

    #[test]
    fn returns_on_empty_series_is_unavailable() {
        let prices = series_from_closes(&[]);
        let err = compute_returns(&prices, &[]).unwrap_err();
        assert!(matches!(err, TrendscopeError::DataUnavailable { .. }));
    }

    #[test]
    fn holding_returns_sum_window_and_charge_spread() {
        let prices = series_from_closes(&[100.0, 110.0, 121.0, 108.9]);
        let signals = [
            Some(Signal::Long),
            Some(Signal::Flat),
            Some(Signal::Short),
            Some(Signal::Flat),
        ];
        let returns = holding_returns(&prices, &signals, 2, 0.001).unwrap();

        assert_eq!(returns.values[0], None);
        assert_eq!(returns.values[1], None);
        // long from bar 0: +10% + 10%, less spread
        assert_abs_diff_eq!(returns.values[2].unwrap(), 0.2 - 0.001, epsilon = 1e-12);
        // flat from bar 1: no spread
        assert_abs_diff_eq!(returns.values[3].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn drawdown_fixture() {
        let dd = drawdown_from_cumulative(&[0.0, 0.02, 0.01, 0.05, 0.03]);
        let expected = [0.0, 0.0, -0.0098, 0.0, -0.0190];
        for (got, want) in dd.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-4);
        }
    }

    #[test]
    fn drawdown_from_returns_matches_cumulative_path() {
        let returns = returns_from(&[None, Some(0.02), Some(-0.01), Some(0.04), Some(-0.02)]);
        let cum = cumulative_returns(&returns);
        assert_abs_diff_eq!(cum[4], 0.03, epsilon = 1e-12);

        let dd = compute_drawdown(&returns);
        assert_eq!(dd.values.len(), 5);
        assert_abs_diff_eq!(max_drawdown(&dd), (1.0 - 1.03 / 1.05) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn max_drawdown_of_rising_curve_is_zero() {
        let returns = returns_from(&[None, Some(0.01), Some(0.02)]);
        assert_eq!(max_drawdown(&compute_drawdown(&returns)), 0.0);
    }

    #[test]
    fn sortino_known_value() {
        let returns = returns_from(&[None, Some(0.01), Some(-0.02), Some(0.03), Some(-0.04)]);
        let mean = (0.01 - 0.02 + 0.03 - 0.04) / 4.0;
        let downside_std = (0.0002_f64).sqrt();
        let expected = 252.0_f64.sqrt() * mean / downside_std;
        assert_abs_diff_eq!(sortino(&returns, 252.0).unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn sortino_without_negative_returns_is_undefined() {
        let returns = returns_from(&[Some(0.01), Some(0.02)]);
        assert!(sortino(&returns, 252.0).unwrap_err().is_degenerate());
    }

    #[test]
    fn sortino_with_flat_downside_is_undefined() {
        let returns = returns_from(&[Some(0.01), Some(-0.02), Some(-0.02)]);
        assert!(sortino(&returns, 252.0).unwrap_err().is_degenerate());
    }

    #[test]
    fn sortino_on_empty_returns_is_undefined() {
        let returns = returns_from(&[None, None]);
        assert!(sortino(&returns, 252.0).unwrap_err().is_degenerate());
    }

    #[test]
    fn beta_of_levered_benchmark() {
        let bench = returns_from(&[None, Some(0.01), Some(-0.02), Some(0.03)]);
        let asset = returns_from(&[None, Some(0.02), Some(-0.04), Some(0.06)]);
        assert_abs_diff_eq!(beta(&asset, &bench).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn beta_uses_only_shared_timestamps() {
        let bench = ReturnSeries {
            timestamps: vec![ts(1), ts(2), ts(3), ts(9)],
            values: vec![Some(0.01), Some(-0.02), Some(0.03), Some(0.5)],
        };
        let asset = ReturnSeries {
            timestamps: vec![ts(0), ts(1), ts(2), ts(3)],
            values: vec![Some(0.7), Some(0.01), Some(-0.02), Some(0.03)],
        };
        assert_abs_diff_eq!(beta(&asset, &bench).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn beta_with_flat_benchmark_is_undefined() {
        let bench = returns_from(&[Some(0.5), Some(0.5), Some(0.5)]);
        let asset = returns_from(&[Some(0.02), Some(-0.01), Some(0.03)]);
        assert!(beta(&asset, &bench).unwrap_err().is_degenerate());
    }

    #[test]
    fn alpha_formula() {
        let asset = returns_from(&[None, Some(0.01), Some(0.03)]);
        let a = alpha(&asset, Some(0.5), 252.0).unwrap();
        assert_abs_diff_eq!(a, 252.0 * 0.02 * 0.5 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn alpha_without_beta_is_undefined() {
        let asset = returns_from(&[None, Some(0.01)]);
        assert!(alpha(&asset, None, 252.0).unwrap_err().is_degenerate());
    }

    #[test]
    fn report_without_benchmark_leaves_beta_and_alpha_undefined() {
        let returns = returns_from(&[None, Some(0.01), Some(-0.02), Some(0.03), Some(-0.01)]);
        let report = PerformanceReport::compute(returns, None, 252.0);

        assert!(report.sortino.is_ok());
        assert!(report.beta.is_err());
        assert!(report.alpha.is_err());
        assert_abs_diff_eq!(report.total_return, 1.0, epsilon = 1e-9);
        assert!(report.max_drawdown > 0.0);
    }
}
