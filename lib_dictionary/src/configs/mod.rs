//! # Configuration Modules
//!
//! Runtime configuration for processes hosting a `Dictionary`.

/// Layered (defaults, file, environment, CLI) dictionary server configuration.
pub mod config_dictionary;

pub use config_dictionary::{load_config, load_config_from, DictionaryConfig};
