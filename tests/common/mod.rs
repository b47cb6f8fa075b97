#![allow(dead_code)]

use chrono::NaiveDate;
use meanrev::domain::backtest::BacktestConfig;
use meanrev::domain::error::MeanrevError;
use meanrev::domain::instrument::{BenchmarkBar, InstrumentBar};
use meanrev::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub instruments: HashMap<String, Vec<InstrumentBar>>,
    pub benchmarks: HashMap<String, Vec<BenchmarkBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            instruments: HashMap::new(),
            benchmarks: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_instrument(mut self, code: &str, bars: Vec<InstrumentBar>) -> Self {
        self.instruments.insert(code.to_string(), bars);
        self
    }

    pub fn with_benchmark(mut self, code: &str, bars: Vec<BenchmarkBar>) -> Self {
        self.benchmarks.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    fn check_error(&self, code: &str) -> Result<(), MeanrevError> {
        match self.errors.get(code) {
            Some(reason) => Err(MeanrevError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_instrument(
        &self,
        code: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<InstrumentBar>, MeanrevError> {
        self.check_error(code)?;
        Ok(self
            .instruments
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_benchmark(
        &self,
        code: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, MeanrevError> {
        self.check_error(code)?;
        Ok(self
            .benchmarks
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        code: &str,
        _exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MeanrevError> {
        self.check_error(code)?;
        match self.instruments.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64, market_value: f64) -> InstrumentBar {
    InstrumentBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        close,
        volume: 1_000.0,
        amount: close * 1_000.0,
        market_value,
    }
}

/// Daily bars from `closes`, one calendar day apart.
pub fn bars_from_closes(start_date: &str, closes: &[f64], market_value: f64) -> Vec<InstrumentBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| InstrumentBar {
            date: start + chrono::Duration::days(i as i64),
            close,
            volume: 1_000.0,
            amount: close * 1_000.0,
            market_value,
        })
        .collect()
}

/// Oscillating closes around `base`, enough to flip the deviation sign.
pub fn generate_bars(start_date: &str, count: usize, base: f64) -> Vec<InstrumentBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| base + (i as f64 * 0.9).sin() * base * 0.05 + i as f64 * 0.01)
        .collect();
    bars_from_closes(start_date, &closes, 1.0e9)
}

pub fn benchmark_from_pcts(start_date: &str, pcts: &[f64]) -> Vec<BenchmarkBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    let mut close = 1_000.0;
    pcts.iter()
        .enumerate()
        .map(|(i, &pct)| {
            close *= 1.0 + pct / 100.0;
            BenchmarkBar {
                date: start + chrono::Duration::days(i as i64),
                close,
                pct_change: pct,
            }
        })
        .collect()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        ma_window: 2,
        risk_free_rate: 0.01,
    }
}
