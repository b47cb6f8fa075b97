//! CSV file data adapter.
//!
//! One file per code: `<dir>/<CODE>_<EXCHANGE>.csv`. Instrument files carry
//! `date,close,volume,amount,market_value`; benchmark files carry
//! `date,close,pct_change`.

use crate::domain::error::MeanrevError;
use crate::domain::instrument::{BenchmarkBar, InstrumentBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    date: String,
    close: f64,
    volume: f64,
    amount: f64,
    market_value: f64,
}

#[derive(Debug, Deserialize)]
struct BenchmarkRow {
    date: String,
    close: f64,
    pct_change: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }

    fn read_rows<T: DeserializeOwned>(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Vec<T>, MeanrevError> {
        let path = self.csv_path(code, exchange);
        let content = fs::read_to_string(&path).map_err(|e| MeanrevError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        rdr.deserialize()
            .map(|row| {
                row.map_err(|e| MeanrevError::DataParse {
                    reason: format!("{}: {}", path.display(), e),
                })
            })
            .collect()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, MeanrevError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| MeanrevError::DataParse {
        reason: format!("invalid date '{}': {}", value, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_instrument(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<InstrumentBar>, MeanrevError> {
        let rows: Vec<InstrumentRow> = self.read_rows(code, exchange)?;
        let mut bars = Vec::with_capacity(rows.len());

        for row in rows {
            let date = parse_date(&row.date)?;
            if date < start_date || date > end_date {
                continue;
            }
            bars.push(InstrumentBar {
                date,
                close: row.close,
                volume: row.volume,
                amount: row.amount,
                market_value: row.market_value,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_benchmark(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, MeanrevError> {
        let rows: Vec<BenchmarkRow> = self.read_rows(code, exchange)?;
        let mut bars = Vec::with_capacity(rows.len());

        for row in rows {
            let date = parse_date(&row.date)?;
            if date < start_date || date > end_date {
                continue;
            }
            bars.push(BenchmarkBar {
                date,
                close: row.close,
                pct_change: row.pct_change,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MeanrevError> {
        if !self.csv_path(code, exchange).exists() {
            return Ok(None);
        }

        let rows: Vec<InstrumentRow> = self.read_rows(code, exchange)?;
        let mut range: Option<(NaiveDate, NaiveDate, usize)> = None;
        for row in &rows {
            let date = parse_date(&row.date)?;
            range = Some(match range {
                None => (date, date, 1),
                Some((first, last, n)) => (first.min(date), last.max(date), n + 1),
            });
        }
        Ok(range)
    }
}
