//! # Loggers
//!
//! Installs the process-wide `log` sink used by dictionary servers.

/// fern based console + file logger with rotation.
pub mod loggerlocal;

pub use loggerlocal::{parse_level, setup_logging};
