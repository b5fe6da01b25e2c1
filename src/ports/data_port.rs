//! Price data access port trait.

use crate::domain::error::BillpulseError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Trading-day closes for `ticker` within `[start_date, end_date]`.
    ///
    /// An empty series means the source had no rows; an `Err` means the fetch
    /// itself failed. Callers treat the two differently.
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BillpulseError>;

    fn list_tickers(&self) -> Result<Vec<String>, BillpulseError>;

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BillpulseError>;
}
