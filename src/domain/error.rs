//! Domain error types.

/// Top-level error type for meanrev.
///
/// Only the I/O boundary (data sources, configuration, report output) produces
/// these. The numeric pipeline itself never fails; it falls back to sentinel
/// values instead.
#[derive(Debug, thiserror::Error)]
pub enum MeanrevError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("data parse error: {reason}")]
    DataParse { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("none of the {requested} requested codes produced data")]
    EmptyUniverse { requested: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MeanrevError {
    pub(crate) fn missing(section: &str, key: &str) -> Self {
        MeanrevError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        MeanrevError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl MeanrevError {
    /// Process exit status for this error class.
    pub fn exit_status(&self) -> u8 {
        match self {
            MeanrevError::Io(_) => 1,
            MeanrevError::ConfigParse { .. }
            | MeanrevError::ConfigMissing { .. }
            | MeanrevError::ConfigInvalid { .. } => 2,
            MeanrevError::DataSource { .. } | MeanrevError::DataParse { .. } => 3,
            MeanrevError::NoData { .. } | MeanrevError::EmptyUniverse { .. } => 5,
            MeanrevError::Report { .. } => 6,
        }
    }
}

impl From<&MeanrevError> for std::process::ExitCode {
    fn from(err: &MeanrevError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config_missing() {
        let err = MeanrevError::missing("backtest", "start_date");
        assert_eq!(err.to_string(), "missing config key [backtest] start_date");
    }

    #[test]
    fn display_empty_universe() {
        let err = MeanrevError::EmptyUniverse { requested: 3 };
        assert_eq!(
            err.to_string(),
            "none of the 3 requested codes produced data"
        );
    }

    #[test]
    fn exit_codes_by_class() {
        assert_eq!(
            MeanrevError::invalid("backtest", "ma_window", "must be positive").exit_status(),
            2
        );
        assert_eq!(
            MeanrevError::DataSource {
                reason: "timeout".into()
            }
            .exit_status(),
            3
        );
        assert_eq!(
            MeanrevError::NoData {
                code: "600519".into()
            }
            .exit_status(),
            5
        );
        assert_eq!(
            MeanrevError::Report {
                reason: "bad template".into()
            }
            .exit_status(),
            6
        );
    }
}
