//! Market-data access port.

use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::{Interval, PriceSeries};
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` between `start_date` and `end_date` inclusive.
    ///
    /// Unknown symbols and empty ranges return `DataUnavailable` rather than
    /// an empty series.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSeries, TrendscopeError>;

    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, TrendscopeError>;
}
