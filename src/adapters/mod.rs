//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "tushare")]
pub mod tushare_adapter;
pub mod typst_report;
