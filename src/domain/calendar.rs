//! Master calendar and reindexing of instrument columns onto it.
//!
//! An aligned column has exactly one entry per calendar date. Dates on which
//! an instrument has no row are `None`; nothing is interpolated here.

use crate::domain::instrument::{BenchmarkBar, InstrumentBar, InstrumentSeries};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Aligned column: one optional value per master calendar date.
pub type Column = Vec<Option<f64>>;

/// Sorted union of every instrument's dates.
pub fn build_master_calendar(series: &[InstrumentSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series.iter().flat_map(|s| s.dates()).collect();
    unique_dates.into_iter().collect()
}

/// Reindex one field of an instrument onto `calendar`.
pub fn align_field<F>(series: &InstrumentSeries, calendar: &[NaiveDate], field: F) -> Column
where
    F: Fn(&InstrumentBar) -> f64,
{
    calendar
        .iter()
        .map(|&date| series.get_bar(date).map(&field).filter(|v| !v.is_nan()))
        .collect()
}

/// Reindex the derived percent change of an instrument onto `calendar`.
pub fn align_pct_change(series: &InstrumentSeries, calendar: &[NaiveDate]) -> Column {
    calendar
        .iter()
        .map(|&date| series.pct_change_on(date))
        .collect()
}

/// Reindex benchmark percent changes onto `calendar`. Expects `bars` sorted by
/// date with unique dates.
pub fn align_benchmark(bars: &[BenchmarkBar], calendar: &[NaiveDate]) -> Column {
    let mut out = Vec::with_capacity(calendar.len());
    let mut j = 0;
    for &date in calendar {
        while j < bars.len() && bars[j].date < date {
            j += 1;
        }
        if j < bars.len() && bars[j].date == date && !bars[j].pct_change.is_nan() {
            out.push(Some(bars[j].pct_change));
        } else {
            out.push(None);
        }
    }
    out
}

/// Replace each `None` with the most recent defined value. Leading gaps stay
/// `None`.
pub fn forward_fill(column: &[Option<f64>]) -> Column {
    let mut last = None;
    column
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Every instrument column the pipeline needs, reindexed onto one calendar.
///
/// Columns are stored per instrument in `codes` order, so
/// `close[k][i]` is the close of `codes[k]` on `calendar[i]`.
#[derive(Debug, Clone)]
pub struct AlignedUniverse {
    pub calendar: Vec<NaiveDate>,
    pub codes: Vec<String>,
    pub close: Vec<Column>,
    pub market_value: Vec<Column>,
    pub pct_change: Vec<Column>,
}

impl AlignedUniverse {
    pub fn new(series: &[InstrumentSeries]) -> Self {
        let calendar = build_master_calendar(series);
        let codes = series.iter().map(|s| s.code.clone()).collect();
        let close = series
            .iter()
            .map(|s| align_field(s, &calendar, |b| b.close))
            .collect();
        let market_value = series
            .iter()
            .map(|s| align_field(s, &calendar, |b| b.market_value))
            .collect();
        let pct_change = series
            .iter()
            .map(|s| align_pct_change(s, &calendar))
            .collect();

        Self {
            calendar,
            codes,
            close,
            market_value,
            pct_change,
        }
    }

    pub fn date_count(&self) -> usize {
        self.calendar.len()
    }

    pub fn instrument_count(&self) -> usize {
        self.codes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(code: &str, rows: &[(&str, f64)]) -> InstrumentSeries {
        let bars = rows
            .iter()
            .map(|&(date, close)| InstrumentBar {
                date: d(date),
                close,
                volume: 100.0,
                amount: close * 100.0,
                market_value: close * 10.0,
            })
            .collect();
        InstrumentSeries::new(code.into(), "SH".into(), bars)
    }

    #[test]
    fn calendar_merges_and_sorts() {
        let a = series("A", &[("2024-01-02", 1.0), ("2024-01-05", 1.0)]);
        let b = series("B", &[("2024-01-01", 1.0), ("2024-01-02", 1.0), ("2024-01-03", 1.0)]);

        let calendar = build_master_calendar(&[a, b]);

        assert_eq!(
            calendar,
            vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03"), d("2024-01-05")]
        );
    }

    #[test]
    fn calendar_empty_input() {
        assert!(build_master_calendar(&[]).is_empty());
    }

    #[test]
    fn align_marks_gaps_as_missing() {
        let a = series("A", &[("2024-01-01", 10.0), ("2024-01-03", 12.0)]);
        let calendar = vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03")];

        let closes = align_field(&a, &calendar, |b| b.close);

        assert_eq!(closes, vec![Some(10.0), None, Some(12.0)]);
    }

    #[test]
    fn align_pct_change_uses_instrument_own_history() {
        // The change on 01-03 is against 01-01, the previous row of A.
        let a = series("A", &[("2024-01-01", 10.0), ("2024-01-03", 12.0)]);
        let calendar = vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03")];

        let pct = align_pct_change(&a, &calendar);

        assert_eq!(pct[0], None);
        assert_eq!(pct[1], None);
        assert!((pct[2].unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn align_benchmark_skips_dates_outside_calendar() {
        let bars = vec![
            BenchmarkBar {
                date: d("2023-12-29"),
                close: 1.0,
                pct_change: 9.0,
            },
            BenchmarkBar {
                date: d("2024-01-02"),
                close: 1.0,
                pct_change: 0.5,
            },
        ];
        let calendar = vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03")];

        let aligned = align_benchmark(&bars, &calendar);

        assert_eq!(aligned, vec![None, Some(0.5), None]);
    }

    #[test]
    fn forward_fill_keeps_leading_gap() {
        let filled = forward_fill(&[None, Some(1.0), None, None, Some(2.0), None]);
        assert_eq!(
            filled,
            vec![None, Some(1.0), Some(1.0), Some(1.0), Some(2.0), Some(2.0)]
        );
    }

    #[test]
    fn aligned_universe_shapes() {
        let a = series("A", &[("2024-01-01", 10.0), ("2024-01-02", 11.0)]);
        let b = series("B", &[("2024-01-02", 20.0), ("2024-01-03", 21.0)]);

        let universe = AlignedUniverse::new(&[a, b]);

        assert_eq!(universe.date_count(), 3);
        assert_eq!(universe.instrument_count(), 2);
        assert_eq!(universe.codes, vec!["A", "B"]);
        for column in universe.close.iter().chain(&universe.market_value) {
            assert_eq!(column.len(), 3);
        }
        assert_eq!(universe.close[1], vec![None, Some(20.0), Some(21.0)]);
        assert_eq!(universe.market_value[0], vec![Some(100.0), Some(110.0), None]);
    }
}
