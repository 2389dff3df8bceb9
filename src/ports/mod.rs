//! Port traits for the data, config and report collaborators.

pub mod config_port;
pub mod data_port;
pub mod report_port;
