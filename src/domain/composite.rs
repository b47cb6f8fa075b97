//! Capitalization-weighted composite index built from the backtest universe.
//!
//! For each calendar date the composite return is
//! `sum(mv * pct) / sum(mv)` over the instruments that have both a market
//! value and a percent change on that date. Returns are in percent units.

use crate::domain::calendar::{AlignedUniverse, Column};

/// Daily composite return per calendar date. A date with no participating
/// instrument, or with non-positive total capitalization, yields 0.0.
pub fn composite_returns(market_value: &[Column], pct_change: &[Column], dates: usize) -> Vec<f64> {
    let mut returns = Vec::with_capacity(dates);

    for i in 0..dates {
        let mut total_cap = 0.0_f64;
        let mut weighted = 0.0_f64;

        for (mv_col, pct_col) in market_value.iter().zip(pct_change) {
            let (Some(mv), Some(pct)) = (mv_col[i], pct_col[i]) else {
                continue;
            };
            total_cap += mv;
            weighted += mv * pct;
        }

        returns.push(if total_cap > 0.0 {
            weighted / total_cap
        } else {
            0.0
        });
    }

    returns
}

/// Composite returns for an already aligned universe.
pub fn build_composite(universe: &AlignedUniverse) -> Vec<f64> {
    composite_returns(
        &universe.market_value,
        &universe.pct_change,
        universe.date_count(),
    )
}
