//! Core domain types and logic.

pub mod error;
pub mod instrument;
pub mod calendar;
pub mod composite;
pub mod signal;
pub mod nav;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod probability;
pub mod universe;
pub mod config_validation;
