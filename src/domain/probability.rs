//! Holding-outcome estimators over a NAV series.

use chrono::{Months, NaiveDate};

use super::backtest::{BacktestResult, SeriesKind};
use super::nav::NavPoint;

pub const DEFAULT_TARGET_RETURN: f64 = 0.2;
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;
pub const DEFAULT_HOLDING_PERIOD: usize = 252;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Fractional target (0.2 = 20%).
    pub target_return: f64,
    pub horizon_months: u32,
    /// Holding period in trading days.
    pub holding_period: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_return: DEFAULT_TARGET_RETURN,
            horizon_months: DEFAULT_HORIZON_MONTHS,
            holding_period: DEFAULT_HOLDING_PERIOD,
        }
    }
}

/// Probability that buying on a given day reaches `target` cumulative return
/// at some point within `months` calendar months (purchase day included).
///
/// Only purchase days whose full horizon fits inside the series are counted.
/// Each purchase day is counted at most once, at its first crossing.
pub fn target_probability(nav: &[NavPoint], target: f64, months: u32) -> f64 {
    let Some(last_date) = nav.last().map(|p| p.date) else {
        return 0.0;
    };

    let mut qualified = 0usize;
    let mut valid_buy_dates = 0usize;

    for (i, buy) in nav.iter().enumerate() {
        let Some(obs_end) = horizon_end(buy.date, months) else {
            continue;
        };
        if obs_end > last_date {
            continue;
        }

        let window = nav[i..].iter().take_while(|p| p.date <= obs_end);
        let mut window = window.peekable();
        if window.peek().is_none() {
            continue;
        }
        valid_buy_dates += 1;

        for sell in window {
            if sell.nav / buy.nav - 1.0 >= target {
                qualified += 1;
                break;
            }
        }
    }

    if valid_buy_dates > 0 {
        qualified as f64 / valid_buy_dates as f64
    } else {
        0.0
    }
}

/// `date + months`, clamped to the last day of the target month.
fn horizon_end(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Fraction of start days whose `holding_period`-day forward return is
/// positive. Start days without a point `holding_period` rows ahead, or with
/// an undefined return, are dropped; 0.0 if none remain.
pub fn rolling_win_rate(nav: &[NavPoint], holding_period: usize) -> f64 {
    let mut wins = 0usize;
    let mut total = 0usize;

    for (i, start) in nav.iter().enumerate() {
        let Some(end) = nav.get(i + holding_period) else {
            break;
        };
        let ret = (end.nav - start.nav) / start.nav;
        if ret.is_nan() {
            continue;
        }
        total += 1;
        if ret > 0.0 {
            wins += 1;
        }
    }

    if total > 0 {
        wins as f64 / total as f64
    } else {
        0.0
    }
}

/// Estimator outputs for one NAV series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldingOutcome {
    pub target_probability: f64,
    pub win_rate: f64,
}

impl HoldingOutcome {
    pub fn compute(nav: &[NavPoint], config: &AnalysisConfig) -> Self {
        Self {
            target_probability: target_probability(
                nav,
                config.target_return,
                config.horizon_months,
            ),
            win_rate: rolling_win_rate(nav, config.holding_period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub config: AnalysisConfig,
    pub strategy: HoldingOutcome,
    pub composite: HoldingOutcome,
    pub benchmark: HoldingOutcome,
}

impl AnalysisResult {
    pub fn compute(result: &BacktestResult, config: &AnalysisConfig) -> Self {
        AnalysisResult {
            config: config.clone(),
            strategy: HoldingOutcome::compute(&result.strategy_nav, config),
            composite: HoldingOutcome::compute(&result.composite_nav, config),
            benchmark: HoldingOutcome::compute(&result.benchmark_nav, config),
        }
    }

    pub fn get(&self, kind: SeriesKind) -> &HoldingOutcome {
        match kind {
            SeriesKind::Strategy => &self.strategy,
            SeriesKind::Composite => &self.composite,
            SeriesKind::Benchmark => &self.benchmark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points(rows: &[(&str, f64)]) -> Vec<NavPoint> {
        rows.iter()
            .map(|&(date, nav)| NavPoint {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                nav,
            })
            .collect()
    }

    #[test]
    fn target_reached_from_first_day_only() {
        // Horizon of one month: only 01-01 has its full window (ending 02-01)
        // inside the data.
        let nav = points(&[
            ("2024-01-01", 1.0),
            ("2024-01-10", 1.1),
            ("2024-01-20", 1.05),
            ("2024-02-01", 1.25),
        ]);

        assert_relative_eq!(target_probability(&nav, 0.2, 1), 1.0);
    }

    #[test]
    fn target_missed_by_shorter_windows() {
        let nav = points(&[
            ("2024-01-01", 1.0),
            ("2024-01-15", 1.1),
            ("2024-02-01", 1.05),
            ("2024-02-15", 1.25),
        ]);

        // 01-01 window ends 02-01: best is +10%.
        // 01-15 window ends 02-15: best is 1.25 / 1.1 - 1 ≈ 13.6%.
        assert_eq!(target_probability(&nav, 0.2, 1), 0.0);
        assert_relative_eq!(target_probability(&nav, 0.12, 1), 0.5);
    }

    #[test]
    fn first_crossing_counted_once() {
        // 01-01 crosses +5% on 01-05 and again on 01-20: counted once.
        // 01-05 never gains 5% (best 1.07 / 1.06).
        // 01-10 crosses on 01-20 (1.07 / 0.98).
        // 01-20 stays flat. 03-01 has no full window.
        let nav = points(&[
            ("2024-01-01", 1.0),
            ("2024-01-05", 1.06),
            ("2024-01-10", 0.98),
            ("2024-01-20", 1.07),
            ("2024-03-01", 1.0),
        ]);

        assert_relative_eq!(target_probability(&nav, 0.05, 1), 0.5);
    }

    #[test]
    fn no_valid_buy_dates_is_zero() {
        let nav = points(&[("2024-01-01", 1.0), ("2024-01-02", 2.0)]);
        assert_eq!(target_probability(&nav, 0.1, 12), 0.0);
        assert_eq!(target_probability(&[], 0.1, 12), 0.0);
    }

    #[test]
    fn horizon_clamps_to_month_end() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            horizon_end(start, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn zero_month_horizon_checks_purchase_day_only() {
        let nav = points(&[("2024-01-01", 1.0), ("2024-01-02", 2.0)]);
        assert_eq!(target_probability(&nav, 0.0, 0), 1.0);
        assert_eq!(target_probability(&nav, 0.5, 0), 0.0);
    }

    #[test]
    fn win_rate_one_day_holding() {
        let nav = points(&[
            ("2024-01-01", 1.0),
            ("2024-01-02", 1.2),
            ("2024-01-03", 0.9),
            ("2024-01-04", 1.3),
        ]);

        assert_relative_eq!(rolling_win_rate(&nav, 1), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn win_rate_period_longer_than_series() {
        let nav = points(&[("2024-01-01", 1.0), ("2024-01-02", 1.2)]);
        assert_eq!(rolling_win_rate(&nav, 252), 0.0);
    }

    #[test]
    fn win_rate_flat_is_not_a_win() {
        let nav = points(&[("2024-01-01", 1.0), ("2024-01-02", 1.0), ("2024-01-03", 1.1)]);
        assert_relative_eq!(rolling_win_rate(&nav, 1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn analysis_config_defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.target_return, 0.2);
        assert_eq!(c.horizon_months, 12);
        assert_eq!(c.holding_period, 252);
    }
}
