//! Market data access port.

use crate::domain::error::MeanrevError;
use crate::domain::instrument::{BenchmarkBar, InstrumentBar};
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily rows for one equity, sorted by date, within `[start_date, end_date]`.
    fn fetch_instrument(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<InstrumentBar>, MeanrevError>;

    /// Daily rows for a reference index within `[start_date, end_date]`.
    fn fetch_benchmark(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, MeanrevError>;

    /// First date, last date and row count available for an equity.
    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MeanrevError>;
}
