//! Universe module: code list parsing and tolerant batch loading.
//!
//! A failed or empty fetch for one code never aborts the batch; the code is
//! logged and reported as skipped.

use crate::domain::error::MeanrevError;
use crate::domain::instrument::{normalize_benchmark, BenchmarkBar, InstrumentSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Universe {
    pub codes: Vec<String>,
    pub exchange: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
            SkipReason::NoData => write!(f, "no data in range"),
        }
    }
}

pub struct LoadedUniverse {
    pub series: Vec<InstrumentSeries>,
    pub skipped: Vec<SkippedCode>,
}

/// Fetch every code of `universe`. Fails only if nothing loads.
pub fn load_universe(
    data_port: &dyn DataPort,
    universe: &Universe,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedUniverse, MeanrevError> {
    let exchange = universe.exchange.as_str();
    let mut series = Vec::with_capacity(universe.count());
    let mut skipped = Vec::new();

    for code in &universe.codes {
        let bars = match data_port.fetch_instrument(code, exchange, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(code = %code, exchange, error = %e, "skipping instrument");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(code = %code, exchange, "skipping instrument: no data found");
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        info!(code = %code, rows = bars.len(), "loaded instrument");
        series.push(InstrumentSeries::new(
            code.clone(),
            exchange.to_string(),
            bars,
        ));
    }

    if series.is_empty() {
        return Err(MeanrevError::EmptyUniverse {
            requested: universe.count(),
        });
    }

    if !skipped.is_empty() {
        info!(
            loaded = series.len(),
            requested = universe.count(),
            "universe partially loaded"
        );
    }

    Ok(LoadedUniverse { series, skipped })
}

/// Fetch the reference index. Failures are logged and yield `None`.
pub fn load_benchmark(
    data_port: &dyn DataPort,
    code: &str,
    exchange: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<Vec<BenchmarkBar>> {
    match data_port.fetch_benchmark(code, exchange, start_date, end_date) {
        Ok(bars) if bars.is_empty() => {
            warn!(code, exchange, "benchmark returned no data");
            None
        }
        Ok(bars) => {
            info!(code, rows = bars.len(), "loaded benchmark");
            Some(normalize_benchmark(bars))
        }
        Err(e) => {
            warn!(code, exchange, error = %e, "benchmark fetch failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_basic() {
        let result = parse_codes("600519,600036,600900").unwrap();
        assert_eq!(result, vec!["600519", "600036", "600900"]);
    }

    #[test]
    fn test_parse_codes_with_whitespace() {
        let result = parse_codes("  600519 , 600036 ,600900").unwrap();
        assert_eq!(result, vec!["600519", "600036", "600900"]);
    }

    #[test]
    fn test_parse_codes_uppercase() {
        let result = parse_codes("bhp,cba").unwrap();
        assert_eq!(result, vec!["BHP", "CBA"]);
    }

    #[test]
    fn test_parse_codes_empty_token() {
        let result = parse_codes("600519,,600036");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_codes_duplicate() {
        let result = parse_codes("600519,600036,600519");
        assert!(matches!(result, Err(UniverseError::DuplicateCode(s)) if s == "600519"));
    }

    #[test]
    fn test_universe_count() {
        let universe = Universe {
            codes: vec!["600519".to_string(), "600036".to_string()],
            exchange: "SH".to_string(),
        };
        assert_eq!(universe.count(), 2);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::NoData.to_string(), "no data in range");
        assert_eq!(
            SkipReason::FetchFailed("timeout".into()).to_string(),
            "fetch failed: timeout"
        );
    }
}
