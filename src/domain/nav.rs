//! Net asset value series.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

/// Compound percent returns into a NAV series seeded at 1.0 before the
/// first observation: `nav[i] = prod(1 + r[k]/100, k <= i)`.
pub fn nav_from_returns(dates: &[NaiveDate], returns: &[f64]) -> Vec<NavPoint> {
    let mut nav = 1.0_f64;
    dates
        .iter()
        .zip(returns)
        .map(|(&date, &r)| {
            nav *= 1.0 + r / 100.0;
            NavPoint { date, nav }
        })
        .collect()
}

/// Normalize a price path to a NAV starting at 1.0 on its first point.
pub fn nav_from_prices(points: &[(NaiveDate, f64)]) -> Vec<NavPoint> {
    let Some(&(_, base)) = points.first() else {
        return Vec::new();
    };
    points
        .iter()
        .map(|&(date, price)| NavPoint {
            date,
            nav: if base != 0.0 { price / base } else { f64::NAN },
        })
        .collect()
}

pub fn nav_values(points: &[NavPoint]) -> Vec<f64> {
    points.iter().map(|p| p.nav).collect()
}
