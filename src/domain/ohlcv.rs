//! Price bars and ordered price series.

use crate::domain::error::TrendscopeError;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Bar interval understood by the data port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Daily,
    Hourly,
    FiveMinutes,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interval::Daily => "1d",
            Interval::Hourly => "1h",
            Interval::FiveMinutes => "5m",
        };
        f.write_str(s)
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(Interval::Daily),
            "1h" => Ok(Interval::Hourly),
            "5m" => Ok(Interval::FiveMinutes),
            other => Err(format!("unknown interval '{other}' (expected 1d, 1h or 5m)")),
        }
    }
}

/// Bars for one symbol, strictly increasing by timestamp.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, TrendscopeError> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(TrendscopeError::InvalidSeries {
                    symbol,
                    reason: format!("non-positive price at {}", bar.timestamp),
                });
            }
            if bar.volume < 0 {
                return Err(TrendscopeError::InvalidSeries {
                    symbol,
                    reason: format!("negative volume at {}", bar.timestamp),
                });
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(TrendscopeError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "timestamps not strictly increasing at {}",
                        bar.timestamp
                    ),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// The first `len` bars as a new series.
    pub fn prefix(&self, len: usize) -> PriceSeries {
        PriceSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }

    /// Close-to-close percentage changes; the first entry is `None`.
    pub fn pct_change(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.bars.len());
        for i in 0..self.bars.len() {
            if i == 0 {
                out.push(None);
            } else {
                out.push(Some(self.bars[i].close / self.bars[i - 1].close - 1.0));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn accepts_ordered_bars() {
        let series = PriceSeries::new("AAPL", vec![bar(1, 100.0), bar(2, 101.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "AAPL");
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = PriceSeries::new("AAPL", vec![bar(1, 100.0), bar(1, 101.0)]).unwrap_err();
        assert!(matches!(err, TrendscopeError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let err = PriceSeries::new("AAPL", vec![bar(2, 100.0), bar(1, 101.0)]).unwrap_err();
        assert!(matches!(err, TrendscopeError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_non_positive_prices() {
        let mut b = bar(1, 100.0);
        b.low = 0.0;
        assert!(PriceSeries::new("AAPL", vec![b]).is_err());
    }

    #[test]
    fn pct_change_first_is_none() {
        let series = PriceSeries::new("AAPL", vec![bar(1, 100.0), bar(2, 110.0)]).unwrap();
        let pct = series.pct_change();
        assert_eq!(pct[0], None);
        assert!((pct[1].unwrap() - 0.10).abs() < 1e-12);
    }

    #[test]
    fn prefix_truncates() {
        let series =
            PriceSeries::new("AAPL", vec![bar(1, 100.0), bar(2, 101.0), bar(3, 102.0)]).unwrap();
        assert_eq!(series.prefix(2).len(), 2);
        assert_eq!(series.prefix(10).len(), 3);
    }

    #[test]
    fn interval_round_trips_through_display() {
        for s in ["1d", "1h", "5m"] {
            let interval: Interval = s.parse().unwrap();
            assert_eq!(interval.to_string(), s);
        }
        assert!("1w".parse::<Interval>().is_err());
    }
}
