//! Tushare Pro HTTP data adapter.
//!
//! Every call is a POST of `{api_name, token, params, fields}`; the response
//! carries a table as parallel `fields` / `items` arrays. Instruments join
//! `daily` with `daily_basic` (for `circ_mv`); benchmarks come from
//! `index_daily`.

use crate::domain::error::MeanrevError;
use crate::domain::instrument::{BenchmarkBar, InstrumentBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TUSHARE_URL: &str = "http://api.tushare.pro";

const WIRE_DATE_FORMAT: &str = "%Y%m%d";

/// Widest range `get_data_range` probes.
const RANGE_PROBE: ((i32, u32, u32), (i32, u32, u32)) = ((1990, 1, 1), (2099, 12, 31));

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<TushareTable>,
}

#[derive(Debug, Deserialize)]
struct TushareTable {
    fields: Vec<String>,
    items: Vec<Vec<Value>>,
}

impl TushareTable {
    fn column(&self, name: &str) -> Result<usize, MeanrevError> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| MeanrevError::DataParse {
                reason: format!("response is missing field '{}'", name),
            })
    }
}

pub struct TushareAdapter {
    client: reqwest::blocking::Client,
    token: String,
    url: String,
}

impl TushareAdapter {
    pub fn new(token: String, url: Option<String>) -> Result<Self, MeanrevError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MeanrevError::DataSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            token,
            url: url.unwrap_or_else(|| DEFAULT_TUSHARE_URL.to_string()),
        })
    }

    fn query(
        &self,
        api_name: &str,
        ts_code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        fields: &str,
    ) -> Result<TushareTable, MeanrevError> {
        let body = json!({
            "api_name": api_name,
            "token": self.token,
            "params": {
                "ts_code": ts_code,
                "start_date": start_date.format(WIRE_DATE_FORMAT).to_string(),
                "end_date": end_date.format(WIRE_DATE_FORMAT).to_string(),
            },
            "fields": fields,
        });

        debug!(api_name, ts_code, "tushare request");

        let response: TushareResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| MeanrevError::DataSource {
                reason: format!("{} request for {} failed: {}", api_name, ts_code, e),
            })?
            .json()
            .map_err(|e| MeanrevError::DataParse {
                reason: format!("{} response for {}: {}", api_name, ts_code, e),
            })?;

        parse_response(api_name, response)
    }
}

fn parse_response(api_name: &str, response: TushareResponse) -> Result<TushareTable, MeanrevError> {
    if response.code != 0 {
        return Err(MeanrevError::DataSource {
            reason: format!(
                "{} returned code {}: {}",
                api_name,
                response.code,
                response.msg.unwrap_or_default()
            ),
        });
    }
    response.data.ok_or_else(|| MeanrevError::DataParse {
        reason: format!("{} response has no data", api_name),
    })
}

/// `600519` on `SH` becomes `600519.SH`.
pub fn ts_code(code: &str, exchange: &str) -> String {
    format!("{}.{}", code, exchange.to_uppercase())
}

fn cell_date(row: &[Value], idx: usize) -> Result<NaiveDate, MeanrevError> {
    let raw = row.get(idx).and_then(Value::as_str).ok_or_else(|| MeanrevError::DataParse {
        reason: "trade_date is not a string".into(),
    })?;
    NaiveDate::parse_from_str(raw, WIRE_DATE_FORMAT).map_err(|e| MeanrevError::DataParse {
        reason: format!("invalid trade_date '{}': {}", raw, e),
    })
}

/// Numeric cell; `null` reads as NaN.
fn cell_f64(row: &[Value], idx: usize) -> f64 {
    row.get(idx).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn join_instrument(daily: &TushareTable, basic: &TushareTable) -> Result<Vec<InstrumentBar>, MeanrevError> {
    let b_date = basic.column("trade_date")?;
    let b_mv = basic.column("circ_mv")?;
    let mut market_value = HashMap::with_capacity(basic.items.len());
    for row in &basic.items {
        market_value.insert(cell_date(row, b_date)?, cell_f64(row, b_mv));
    }

    let d_date = daily.column("trade_date")?;
    let d_close = daily.column("close")?;
    let d_vol = daily.column("vol")?;
    let d_amount = daily.column("amount")?;

    let mut bars = Vec::with_capacity(daily.items.len());
    for row in &daily.items {
        let date = cell_date(row, d_date)?;
        // Inner join on trade date.
        let Some(&mv) = market_value.get(&date) else {
            continue;
        };
        bars.push(InstrumentBar {
            date,
            close: cell_f64(row, d_close),
            volume: cell_f64(row, d_vol),
            amount: cell_f64(row, d_amount),
            market_value: mv,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn benchmark_rows(table: &TushareTable) -> Result<Vec<BenchmarkBar>, MeanrevError> {
    let date_idx = table.column("trade_date")?;
    let close_idx = table.column("close")?;
    let pct_idx = table.column("pct_chg")?;

    let mut bars = table
        .items
        .iter()
        .map(|row| {
            Ok(BenchmarkBar {
                date: cell_date(row, date_idx)?,
                close: cell_f64(row, close_idx),
                pct_change: cell_f64(row, pct_idx),
            })
        })
        .collect::<Result<Vec<_>, MeanrevError>>()?;

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for TushareAdapter {
    fn fetch_instrument(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<InstrumentBar>, MeanrevError> {
        let ts_code = ts_code(code, exchange);
        let daily = self.query(
            "daily",
            &ts_code,
            start_date,
            end_date,
            "ts_code,trade_date,close,vol,amount",
        )?;
        let basic = self.query(
            "daily_basic",
            &ts_code,
            start_date,
            end_date,
            "ts_code,trade_date,circ_mv",
        )?;
        join_instrument(&daily, &basic)
    }

    fn fetch_benchmark(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, MeanrevError> {
        let table = self.query(
            "index_daily",
            &ts_code(code, exchange),
            start_date,
            end_date,
            "ts_code,trade_date,close,pct_chg",
        )?;
        benchmark_rows(&table)
    }

    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MeanrevError> {
        let ((sy, sm, sd), (ey, em, ed)) = RANGE_PROBE;
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(sy, sm, sd),
            NaiveDate::from_ymd_opt(ey, em, ed),
        ) else {
            return Ok(None);
        };

        let table = self.query(
            "daily",
            &ts_code(code, exchange),
            start,
            end,
            "ts_code,trade_date",
        )?;
        let date_idx = table.column("trade_date")?;

        let mut range: Option<(NaiveDate, NaiveDate, usize)> = None;
        for row in &table.items {
            let date = cell_date(row, date_idx)?;
            range = Some(match range {
                None => (date, date, 1),
                Some((first, last, n)) => (first.min(date), last.max(date), n + 1),
            });
        }
        Ok(range)
    }
}
