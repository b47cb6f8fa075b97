//! Backtest pipeline: align, build the composite, derive signals and
//! holdings, compound NAVs.
//!
//! The result carries every aligned column, NAV and drawdown series the
//! report renders.

use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, info};

use crate::domain::calendar::{align_benchmark, forward_fill, AlignedUniverse};
use crate::domain::composite::build_composite;
use crate::domain::instrument::{BenchmarkBar, InstrumentSeries};
use crate::domain::metrics::drawdown_series;
use crate::domain::nav::{nav_from_returns, nav_values, NavPoint};
use crate::domain::position::{strategy_returns, PositionMatrix};
use crate::domain::signal::{compute_signals, SignalSeries};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ma_window: usize,
    pub risk_free_rate: f64,
}

/// The three NAV series every run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Strategy,
    Composite,
    Benchmark,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::Strategy,
        SeriesKind::Composite,
        SeriesKind::Benchmark,
    ];
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Strategy => write!(f, "Strategy"),
            SeriesKind::Composite => write!(f, "Composite"),
            SeriesKind::Benchmark => write!(f, "Benchmark"),
        }
    }
}

/// Where the benchmark NAV came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkSource {
    External,
    /// No external index was available; the composite NAV stands in.
    Composite,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub universe: AlignedUniverse,
    pub signals: Vec<SignalSeries>,
    pub positions: PositionMatrix,
    pub strategy_returns: Vec<f64>,
    pub composite_returns: Vec<f64>,
    pub benchmark_returns: Vec<f64>,
    pub strategy_nav: Vec<NavPoint>,
    pub composite_nav: Vec<NavPoint>,
    pub benchmark_nav: Vec<NavPoint>,
    pub benchmark_source: BenchmarkSource,
}

impl BacktestResult {
    pub fn calendar(&self) -> &[NaiveDate] {
        &self.universe.calendar
    }

    pub fn nav(&self, kind: SeriesKind) -> &[NavPoint] {
        match kind {
            SeriesKind::Strategy => &self.strategy_nav,
            SeriesKind::Composite => &self.composite_nav,
            SeriesKind::Benchmark => &self.benchmark_nav,
        }
    }

    /// Drawdown in percent from the running peak of one NAV series.
    pub fn drawdown(&self, kind: SeriesKind) -> Vec<f64> {
        drawdown_series(&nav_values(self.nav(kind)))
    }
}

/// Benchmark percent changes on the calendar: forward-filled, with 0.0
/// before the first observation.
pub fn benchmark_returns(bars: &[BenchmarkBar], calendar: &[NaiveDate]) -> Vec<f64> {
    forward_fill(&align_benchmark(bars, calendar))
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect()
}

pub fn run_backtest(
    series: &[InstrumentSeries],
    benchmark: Option<&[BenchmarkBar]>,
    config: &BacktestConfig,
) -> BacktestResult {
    let universe = AlignedUniverse::new(series);
    let calendar = universe.calendar.clone();
    debug!(
        dates = calendar.len(),
        instruments = universe.instrument_count(),
        "aligned universe"
    );

    let composite_returns = build_composite(&universe);

    let signals = compute_signals(&universe.close, config.ma_window);
    let deviations: Vec<_> = signals.iter().map(|s| &s.deviation).collect();
    let positions = PositionMatrix::from_deviation(&deviations, calendar.len());

    let strategy_returns = strategy_returns(&positions, &universe.pct_change);

    let strategy_nav = nav_from_returns(&calendar, &strategy_returns);
    let composite_nav = nav_from_returns(&calendar, &composite_returns);

    let (benchmark_returns, benchmark_nav, benchmark_source) = match benchmark {
        Some(bars) if !bars.is_empty() => {
            let returns = benchmark_returns(bars, &calendar);
            let nav = nav_from_returns(&calendar, &returns);
            (returns, nav, BenchmarkSource::External)
        }
        _ => {
            info!("no external benchmark, using composite index in its place");
            (
                composite_returns.clone(),
                composite_nav.clone(),
                BenchmarkSource::Composite,
            )
        }
    };

    BacktestResult {
        universe,
        signals,
        positions,
        strategy_returns,
        composite_returns,
        benchmark_returns,
        strategy_nav,
        composite_nav,
        benchmark_nav,
        benchmark_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::InstrumentBar;
    use approx::assert_relative_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: d("2024-01-01"),
            end_date: d("2024-12-31"),
            ma_window: 2,
            risk_free_rate: 0.01,
        }
    }

    fn series(code: &str, rows: &[(&str, f64, f64)]) -> InstrumentSeries {
        let bars = rows
            .iter()
            .map(|&(date, close, mv)| InstrumentBar {
                date: d(date),
                close,
                volume: 1.0,
                amount: close,
                market_value: mv,
            })
            .collect();
        InstrumentSeries::new(code.into(), "SH".into(), bars)
    }

    #[test]
    fn single_instrument_pipeline() {
        // closes 10, 11, 10, 12 with MA(2): 10.5, 10.5, 11
        // deviation: -, +0.0476, -0.0476, +0.0909
        let a = series(
            "A",
            &[
                ("2024-01-01", 10.0, 100.0),
                ("2024-01-02", 11.0, 110.0),
                ("2024-01-03", 10.0, 100.0),
                ("2024-01-04", 12.0, 120.0),
            ],
        );

        let result = run_backtest(&[a], None, &sample_config());

        assert_eq!(result.positions.column(0), vec![1, 1, 0, 1]);
        assert_eq!(result.strategy_returns[0], 0.0);
        assert_relative_eq!(result.strategy_returns[1], 10.0, epsilon = 1e-9);
        assert_eq!(result.strategy_returns[2], 0.0);
        assert_relative_eq!(result.strategy_returns[3], 20.0, epsilon = 1e-9);
        assert_relative_eq!(result.strategy_nav[3].nav, 1.1 * 1.2, epsilon = 1e-9);
        assert_eq!(result.benchmark_source, BenchmarkSource::Composite);
        assert_eq!(result.benchmark_nav, result.composite_nav);
    }

    #[test]
    fn drawdown_follows_each_nav() {
        let a = series(
            "A",
            &[
                ("2024-01-01", 10.0, 100.0),
                ("2024-01-02", 11.0, 110.0),
                ("2024-01-03", 10.0, 100.0),
                ("2024-01-04", 12.0, 120.0),
            ],
        );

        let result = run_backtest(&[a], None, &sample_config());

        // Composite NAV 1.0, 1.1, 1.0, 1.2.
        let composite = result.drawdown(SeriesKind::Composite);
        assert_eq!(composite.len(), 4);
        assert_relative_eq!(composite[1], 0.0);
        assert_relative_eq!(composite[2], (1.0 / 1.1 - 1.0) * 100.0, epsilon = 1e-9);
        assert_relative_eq!(composite[3], 0.0);

        // Strategy sits out the down day.
        assert!(result.drawdown(SeriesKind::Strategy).iter().all(|&dd| dd == 0.0));
    }

    #[test]
    fn external_benchmark_is_forward_filled() {
        let a = series(
            "A",
            &[
                ("2024-01-01", 10.0, 1.0),
                ("2024-01-02", 10.0, 1.0),
                ("2024-01-03", 10.0, 1.0),
            ],
        );
        let bench = vec![BenchmarkBar {
            date: d("2024-01-02"),
            close: 3500.0,
            pct_change: 1.0,
        }];

        let result = run_backtest(&[a], Some(bench.as_slice()), &sample_config());

        assert_eq!(result.benchmark_source, BenchmarkSource::External);
        assert_eq!(result.benchmark_returns, vec![0.0, 1.0, 1.0]);
        assert_relative_eq!(result.benchmark_nav[2].nav, 1.01 * 1.01, epsilon = 1e-12);
    }

    #[test]
    fn navs_share_the_calendar() {
        let a = series("A", &[("2024-01-01", 10.0, 1.0), ("2024-01-03", 11.0, 1.0)]);
        let b = series("B", &[("2024-01-02", 20.0, 2.0), ("2024-01-03", 19.0, 2.0)]);

        let result = run_backtest(&[a, b], None, &sample_config());

        for kind in SeriesKind::ALL {
            let dates: Vec<_> = result.nav(kind).iter().map(|p| p.date).collect();
            assert_eq!(dates, result.calendar());
        }
        assert_eq!(result.positions.row(0), &[true, true]);
    }

    #[test]
    fn empty_universe_produces_empty_result() {
        let result = run_backtest(&[], None, &sample_config());
        assert!(result.calendar().is_empty());
        assert!(result.strategy_nav.is_empty());
        assert_eq!(result.positions.date_count(), 0);
    }

    #[test]
    fn series_kind_display() {
        assert_eq!(SeriesKind::Strategy.to_string(), "Strategy");
        assert_eq!(SeriesKind::Benchmark.to_string(), "Benchmark");
    }
}
