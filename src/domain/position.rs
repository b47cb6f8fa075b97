//! Eligibility / position matrix.
//!
//! Row 0 holds every instrument. Row i > 0 holds instrument k iff its
//! deviation ratio on row i-1 is negative or undefined.

use crate::domain::calendar::Column;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMatrix {
    rows: Vec<Vec<bool>>,
    instruments: usize,
}

impl PositionMatrix {
    /// Build holdings from per-instrument deviation columns (one column per
    /// instrument, each `dates` long).
    pub fn from_deviation(deviation: &[&Column], dates: usize) -> Self {
        let instruments = deviation.len();
        let mut rows = Vec::with_capacity(dates);

        for i in 0..dates {
            if i == 0 {
                rows.push(vec![true; instruments]);
                continue;
            }
            let row = deviation
                .iter()
                .map(|col| is_buy_signal(col[i - 1]))
                .collect();
            rows.push(row);
        }

        Self { rows, instruments }
    }

    pub fn date_count(&self) -> usize {
        self.rows.len()
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments
    }

    pub fn is_held(&self, date_idx: usize, instrument_idx: usize) -> bool {
        self.rows[date_idx][instrument_idx]
    }

    pub fn row(&self, date_idx: usize) -> &[bool] {
        &self.rows[date_idx]
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Number of instruments held on a date.
    pub fn held_count(&self, date_idx: usize) -> usize {
        self.rows[date_idx].iter().filter(|&&h| h).count()
    }

    /// Holding state of one instrument across the calendar as 0/1.
    pub fn column(&self, instrument_idx: usize) -> Vec<u8> {
        self.rows
            .iter()
            .map(|row| u8::from(row[instrument_idx]))
            .collect()
    }
}

/// A missing deviation counts as a buy signal, same as a negative one.
fn is_buy_signal(deviation: Option<f64>) -> bool {
    match deviation {
        None => true,
        Some(r) => r < 0.0 || r.is_nan(),
    }
}

/// Equal-weight daily strategy return in percent units.
///
/// An instrument that is held but has no percent change on a date adds 0 to
/// the sum while still counting toward the divisor. A date with nothing held
/// divides by 1 and therefore returns 0.
pub fn strategy_returns(positions: &PositionMatrix, pct_change: &[Column]) -> Vec<f64> {
    (0..positions.date_count())
        .map(|i| {
            let row = positions.row(i);
            let total: f64 = row
                .iter()
                .zip(pct_change)
                .filter(|&(&held, _)| held)
                .map(|(_, col)| col[i].unwrap_or(0.0))
                .sum();
            let count = positions.held_count(i).max(1);
            total / count as f64
        })
        .collect()
}
