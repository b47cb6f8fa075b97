//! Performance metrics for NAV series.
//!
//! Returns and drawdowns are reported in percent units; Sharpe and Calmar are
//! plain ratios.

use super::backtest::{BacktestResult, SeriesKind};
use super::nav::NavPoint;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;

/// Below this absolute drawdown (in percent) the Calmar ratio is reported as
/// infinite.
const CALMAR_DRAWDOWN_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub trading_days: usize,
}

impl Metrics {
    pub fn compute(nav: &[NavPoint], risk_free_rate: f64) -> Self {
        let values: Vec<f64> = nav.iter().map(|p| p.nav).collect();
        Self::from_values(&values, risk_free_rate)
    }

    pub fn from_values(nav: &[f64], risk_free_rate: f64) -> Self {
        let trading_days = nav.len();
        let total_return = total_return(nav);
        let annualized_return = annualized_return(total_return, trading_days);
        let max_drawdown = max_drawdown(nav);
        let sharpe_ratio = sharpe_ratio(nav, risk_free_rate);
        let calmar_ratio = calmar_ratio(annualized_return, max_drawdown);

        Metrics {
            total_return,
            annualized_return,
            max_drawdown,
            sharpe_ratio,
            calmar_ratio,
            trading_days,
        }
    }
}

/// `(NAV[last] - 1) * 100`; NAV series are seeded at 1.0.
pub fn total_return(nav: &[f64]) -> f64 {
    nav.last().map(|&v| (v - 1.0) * 100.0).unwrap_or(0.0)
}

/// Geometric annualization over `days` NAV observations.
pub fn annualized_return(total_return_pct: f64, days: usize) -> f64 {
    if days == 0 {
        return 0.0;
    }
    ((1.0 + total_return_pct / 100.0).powf(TRADING_DAYS_PER_YEAR / days as f64) - 1.0) * 100.0
}

/// Drawdown from the running peak (inclusive) at every point, in percent.
pub fn drawdown_series(nav: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    nav.iter()
        .map(|&v| {
            if v > peak {
                peak = v;
            }
            (v / peak - 1.0) * 100.0
        })
        .collect()
}

/// Deepest drawdown in percent. Always <= 0.
pub fn max_drawdown(nav: &[f64]) -> f64 {
    drawdown_series(nav)
        .into_iter()
        .filter(|dd| !dd.is_nan())
        .fold(0.0_f64, f64::min)
}

/// Daily simple returns of a NAV series as fractions.
pub fn daily_returns(nav: &[f64]) -> Vec<f64> {
    nav.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Annualized Sharpe ratio of daily excess returns.
///
/// The daily risk-free rate is the geometric de-annualization of
/// `risk_free_rate`. Standard deviation is the sample (n-1) estimate. NaN when
/// fewer than two daily returns exist or the deviation is zero.
pub fn sharpe_ratio(nav: &[f64], risk_free_rate: f64) -> f64 {
    let daily_rf = (1.0 + risk_free_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0;
    let excess: Vec<f64> = daily_returns(nav)
        .into_iter()
        .filter(|r| r.is_finite())
        .map(|r| r - daily_rf)
        .collect();

    if excess.len() < 2 {
        return f64::NAN;
    }

    let n = excess.len() as f64;
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev == 0.0 {
        return f64::NAN;
    }

    TRADING_DAYS_PER_YEAR.sqrt() * mean / stddev
}

/// Annualized return over absolute max drawdown; +inf when there is
/// effectively no drawdown.
pub fn calmar_ratio(annualized_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct.abs() > CALMAR_DRAWDOWN_FLOOR {
        annualized_return_pct / max_drawdown_pct.abs()
    } else {
        f64::INFINITY
    }
}

/// One metrics record per reported NAV series.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub strategy: Metrics,
    pub composite: Metrics,
    pub benchmark: Metrics,
}

impl PerformanceReport {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        PerformanceReport {
            strategy: Metrics::compute(&result.strategy_nav, risk_free_rate),
            composite: Metrics::compute(&result.composite_nav, risk_free_rate),
            benchmark: Metrics::compute(&result.benchmark_nav, risk_free_rate),
        }
    }

    pub fn get(&self, kind: SeriesKind) -> &Metrics {
        match kind {
            SeriesKind::Strategy => &self.strategy,
            SeriesKind::Composite => &self.composite,
            SeriesKind::Benchmark => &self.benchmark,
        }
    }
}
