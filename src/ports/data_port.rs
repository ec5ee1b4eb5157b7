//! Historical price data access port.

use crate::domain::error::SimError;
use crate::domain::price::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `instrument` within `[start_date, end_date]`, ascending by date.
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SimError>;

    fn list_instruments(&self) -> Result<Vec<String>, SimError>;

    /// First date, last date, and bar count stored for `instrument`.
    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SimError>;
}
