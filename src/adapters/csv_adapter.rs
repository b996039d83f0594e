//! CSV file data adapter.
//!
//! One file per symbol and interval: `{dir}/{SYMBOL}_{interval}.csv` with a
//! `time,open,high,low,close,volume` header. `time` is either `YYYY-MM-DD` or
//! `YYYY-MM-DD HH:MM:SS`.

use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::{Interval, PriceBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }
}

fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<T, TrendscopeError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| TrendscopeError::InvalidSeries {
        symbol: symbol.to_string(),
        reason: format!("missing {} column", name),
    })?;
    raw.trim().parse().map_err(|e| TrendscopeError::InvalidSeries {
        symbol: symbol.to_string(),
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSeries, TrendscopeError> {
        let path = self.csv_path(symbol, interval);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(symbol, path = %path.display(), "cannot read price file: {e}");
                return Err(TrendscopeError::DataUnavailable {
                    symbol: symbol.to_string(),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TrendscopeError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let time_str = record.get(0).unwrap_or_default();
            let timestamp = parse_time(time_str).ok_or_else(|| TrendscopeError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: format!("invalid time '{}'", time_str),
            })?;

            let date = timestamp.date();
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                open: field(&record, 1, "open", symbol)?,
                high: field(&record, 2, "high", symbol)?,
                low: field(&record, 3, "low", symbol)?,
                close: field(&record, 4, "close", symbol)?,
                volume: field::<f64>(&record, 5, "volume", symbol)? as i64,
            });
        }

        if bars.is_empty() {
            return Err(TrendscopeError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, TrendscopeError> {
        let entries = fs::read_dir(&self.base_path)?;

        let suffix = format!("_{}.csv", interval);
        let mut symbols = Vec::new();

        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
