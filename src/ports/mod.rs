//! Port traits: the boundaries between the pipeline and the outside world.

pub mod config_port;
pub mod data_port;
pub mod report_port;
