//! Moving-average deviation signal.
//!
//! MA(n)[i] = mean(C[i-n+1..=i]); undefined while fewer than n trailing
//! closes are defined on the calendar.
//! ratio[i] = (C[i] - MA[i]) / MA[i]; undefined wherever MA is undefined or
//! zero.

use crate::domain::calendar::Column;

pub const DEFAULT_MA_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub rolling_mean: Column,
    pub deviation: Column,
}

/// Simple moving average over the trailing `window` aligned closes.
pub fn rolling_mean(closes: &[Option<f64>], window: usize) -> Column {
    let mut out = Vec::with_capacity(closes.len());
    if window == 0 {
        out.resize(closes.len(), None);
        return out;
    }

    for i in 0..closes.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        let slice = &closes[i + 1 - window..=i];
        let sum: Option<f64> = slice.iter().copied().sum();
        out.push(sum.map(|s| s / window as f64));
    }
    out
}

/// Relative deviation of each close from its moving average.
pub fn deviation_ratio(closes: &[Option<f64>], mean: &[Option<f64>]) -> Column {
    closes
        .iter()
        .zip(mean)
        .map(|(&close, &ma)| match (close, ma) {
            (Some(c), Some(m)) if m != 0.0 => Some((c - m) / m),
            _ => None,
        })
        .collect()
}

pub fn compute_signal(closes: &[Option<f64>], window: usize) -> SignalSeries {
    let rolling_mean = rolling_mean(closes, window);
    let deviation = deviation_ratio(closes, &rolling_mean);
    SignalSeries {
        rolling_mean,
        deviation,
    }
}

/// Signal for every instrument column, in column order.
pub fn compute_signals(closes: &[Column], window: usize) -> Vec<SignalSeries> {
    closes.iter().map(|c| compute_signal(c, window)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn defined(values: &[f64]) -> Column {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn rolling_mean_warmup() {
        let ma = rolling_mean(&defined(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]), 5);

        assert!(ma[..4].iter().all(|v| v.is_none()));
        assert_relative_eq!(ma[4].unwrap(), 30.0, epsilon = 1e-12);
        assert_relative_eq!(ma[5].unwrap(), 40.0, epsilon = 1e-12);
    }

    #[test]
    fn rolling_mean_gap_invalidates_window() {
        let closes = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
        let ma = rolling_mean(&closes, 3);

        assert_eq!(ma[2], None);
        assert_eq!(ma[3], None);
        assert_eq!(ma[4], None);
        assert_relative_eq!(ma[5].unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn rolling_mean_zero_window_is_undefined() {
        let ma = rolling_mean(&defined(&[1.0, 2.0]), 0);
        assert_eq!(ma, vec![None, None]);
    }

    #[test]
    fn deviation_sign() {
        let signal = compute_signal(&defined(&[10.0, 10.0, 10.0, 10.0, 8.0, 14.0]), 5);

        // MA = 9.6, close 8 → negative
        assert!(signal.deviation[4].unwrap() < 0.0);
        assert_relative_eq!(signal.deviation[4].unwrap(), (8.0 - 9.6) / 9.6, epsilon = 1e-12);
        // MA = 10.4, close 14 → positive
        assert!(signal.deviation[5].unwrap() > 0.0);
    }

    #[test]
    fn deviation_undefined_where_mean_undefined() {
        let signal = compute_signal(&defined(&[1.0, 2.0, 3.0]), 5);
        assert!(signal.deviation.iter().all(|v| v.is_none()));
    }

    #[test]
    fn compute_signals_per_column() {
        let signals = compute_signals(&[defined(&[1.0, 2.0]), defined(&[3.0, 4.0])], 2);
        assert_eq!(signals.len(), 2);
        assert_relative_eq!(signals[1].rolling_mean[1].unwrap(), 3.5, epsilon = 1e-12);
    }
}
