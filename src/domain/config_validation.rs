//! Configuration validation.
//!
//! Validates all config fields before any data is fetched.

use crate::domain::error::MeanrevError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    validate_dates(config)?;
    validate_exchange(config)?;
    validate_codes(config)?;
    validate_ma_window(config)?;
    validate_risk_free_rate(config)?;
    validate_data_source(config)?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let target = config.get_double("analysis", "target_return", 0.2);
    if !(target > 0.0) {
        return Err(MeanrevError::invalid(
            "analysis",
            "target_return",
            "target_return must be positive",
        ));
    }
    let horizon = config.get_int("analysis", "horizon_months", 12);
    if horizon < 1 {
        return Err(MeanrevError::invalid(
            "analysis",
            "horizon_months",
            "horizon_months must be at least 1",
        ));
    }
    if u32::try_from(horizon).is_err() {
        return Err(MeanrevError::invalid(
            "analysis",
            "horizon_months",
            format!("horizon_months must be at most {}", u32::MAX),
        ));
    }
    if config.get_int("analysis", "holding_period", 252) < 1 {
        return Err(MeanrevError::invalid(
            "analysis",
            "holding_period",
            "holding_period must be at least 1",
        ));
    }
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    match config.get_string("report", "language").as_deref() {
        None | Some("en") | Some("zh") => Ok(()),
        Some(other) => Err(MeanrevError::invalid(
            "report",
            "language",
            format!("unsupported language '{}', expected en or zh", other),
        )),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(MeanrevError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MeanrevError> {
    match value {
        None => Err(MeanrevError::missing("backtest", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
            MeanrevError::invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_exchange(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    match config.get_string("backtest", "exchange") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(MeanrevError::missing("backtest", "exchange")),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let codes = config.get_string("backtest", "codes");
    let code = config.get_string("backtest", "code");

    match (codes, code) {
        (Some(c), _) if !c.trim().is_empty() => crate::domain::universe::parse_codes(&c)
            .map(|_| ())
            .map_err(|e| MeanrevError::invalid("backtest", "codes", e.to_string())),
        (None, Some(c)) if !c.trim().is_empty() => Ok(()),
        _ => Err(MeanrevError::missing("backtest", "codes")),
    }
}

fn validate_ma_window(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    if config.get_int("backtest", "ma_window", 5) < 1 {
        return Err(MeanrevError::invalid(
            "backtest",
            "ma_window",
            "ma_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.01);
    if !(0.0..1.0).contains(&value) {
        return Err(MeanrevError::invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    match config.get_string("data", "source").as_deref() {
        None | Some("csv") => Ok(()),
        Some("tushare") => match config.get_string("data", "tushare_token") {
            Some(t) if !t.trim().is_empty() => Ok(()),
            _ => Err(MeanrevError::missing("data", "tushare_token")),
        },
        Some(other) => Err(MeanrevError::invalid(
            "data",
            "source",
            format!("unknown data source '{}', expected csv or tushare", other),
        )),
    }
}
