//! Logging setup for Campus
//!
//! Everything logs through `tracing`. This crate installs the global
//! subscriber from a [`LoggingConfig`].

pub mod init;

pub use campus_config::{LogFormat, LogLevel, LoggingConfig};
pub use init::{build_filter, filter_directives, init_logging, init_with_level};
