//! Per-instrument daily rows as delivered by a data source, plus the derived
//! daily percent change.

use chrono::NaiveDate;
use std::collections::HashMap;

/// One trading day of an equity as returned by the data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
    /// Free-float (circulating) market value.
    pub market_value: f64,
}

/// One trading day of the external reference index.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkBar {
    pub date: NaiveDate,
    pub close: f64,
    /// Daily change in percent units (1.5 means 1.5%).
    pub pct_change: f64,
}

/// Date-indexed series for one instrument.
///
/// Dates are unique and strictly increasing. `pct_change[i]` is the close to
/// close change from the previous row of this same instrument, in percent
/// units; it is `None` on the first row and after a non-positive close.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub code: String,
    pub exchange: String,
    pub bars: Vec<InstrumentBar>,
    pub pct_change: Vec<Option<f64>>,
    date_index: HashMap<NaiveDate, usize>,
}

impl InstrumentSeries {
    pub fn new(code: String, exchange: String, mut bars: Vec<InstrumentBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        // Keep the last row for a repeated date.
        let mut deduped: Vec<InstrumentBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        let pct_change = pct_changes(&deduped);
        let date_index = deduped
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();

        Self {
            code,
            exchange,
            bars: deduped,
            pct_change,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&InstrumentBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn get_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn pct_change_on(&self, date: NaiveDate) -> Option<f64> {
        self.get_index(date).and_then(|i| self.pct_change[i])
    }
}

fn pct_changes(bars: &[InstrumentBar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let prev = bars[i - 1].close;
        if prev > 0.0 && bar.close.is_finite() {
            out.push(Some((bar.close / prev - 1.0) * 100.0));
        } else {
            out.push(None);
        }
    }
    out
}

/// Sort benchmark rows by date and drop repeated dates (last row wins).
pub fn normalize_benchmark(mut bars: Vec<BenchmarkBar>) -> Vec<BenchmarkBar> {
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<BenchmarkBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}
