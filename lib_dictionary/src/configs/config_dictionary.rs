use clap::Parser;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use crate::dictionary::apicall::DEFAULT_API_URL;
use crate::dictionary::service::DictionaryOptions;

const DEFAULT_CONFIG_FILE: &str = "server_dictionary.conf";

/// Server configuration. Every field is optional so layers can be merged.
#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Dictionary text-record lookup server", version)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryConfig {
    /// Path of the JSON configuration file.
    #[clap(long, env = "DICT_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    /// `User-Agent` header for upstream requests.
    #[clap(long, env = "DICT_USER_AGENT", help = "User-Agent header sent to the dictionary API.")]
    pub user_agent: Option<String>,

    /// Upstream base URL.
    #[clap(long, env = "DICT_API_URL", help = "Base URL of the dictionary API; the word is appended.")]
    pub api_url: Option<String>,

    /// Outbound lookups per second.
    #[clap(long, env = "DICT_RATE_LIMIT", help = "Outbound lookups allowed per second.")]
    pub rate_limit_per_sec: Option<f64>,

    /// Outbound lookups allowed back to back.
    #[clap(long, env = "DICT_RATE_BURST", help = "Outbound lookups allowed back to back.")]
    pub rate_limit_burst: Option<u32>,

    /// Where the cache snapshot is read from and written to.
    #[clap(long, env = "DICT_SNAPSHOT_PATH", help = "File the cache is persisted to.")]
    pub snapshot_path: Option<PathBuf>,

    /// Seconds between periodic snapshots; 0 disables them.
    #[clap(long, env = "DICT_SNAPSHOT_INTERVAL_SECONDS", help = "Seconds between periodic cache snapshots (0 disables).")]
    pub snapshot_interval_secs: Option<u64>,

    /// Directory for log files.
    #[clap(long, env = "DICT_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    /// Log level name.
    #[clap(long, env = "DICT_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl DictionaryConfig {
    /// Built-in defaults, the bottom layer.
    pub fn defaults() -> Self {
        let options = DictionaryOptions::default();
        DictionaryConfig {
            user_agent: Some(options.user_agent),
            api_url: Some(DEFAULT_API_URL.to_string()),
            rate_limit_per_sec: Some(options.rate_limit_per_sec),
            rate_limit_burst: Some(options.rate_limit_burst),
            snapshot_path: Some(PathBuf::from("./dictionary.snapshot")),
            snapshot_interval_secs: Some(300),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: DictionaryConfig) -> DictionaryConfig {
        DictionaryConfig {
            config_path: other.config_path.or(self.config_path),
            user_agent: other.user_agent.or(self.user_agent),
            api_url: other.api_url.or(self.api_url),
            rate_limit_per_sec: other.rate_limit_per_sec.or(self.rate_limit_per_sec),
            rate_limit_burst: other.rate_limit_burst.or(self.rate_limit_burst),
            snapshot_path: other.snapshot_path.or(self.snapshot_path),
            snapshot_interval_secs: other.snapshot_interval_secs.or(self.snapshot_interval_secs),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Options for `Dictionary::new`; unset fields fall back to library defaults.
    pub fn to_options(&self) -> DictionaryOptions {
        let defaults = DictionaryOptions::default();
        DictionaryOptions {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            api_url: self.api_url.clone().unwrap_or(defaults.api_url),
            rate_limit_per_sec: self.rate_limit_per_sec.unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: self.rate_limit_burst.unwrap_or(defaults.rate_limit_burst),
            ..defaults
        }
    }
}

/// Loads configuration from the process arguments and environment.
pub fn load_config() -> DictionaryConfig {
    load_config_from(std::env::args_os())
}

/// Loads configuration with explicit arguments (first item is the program name).
///
/// Layers, lowest first: built-in defaults, the JSON config file
/// (`server_dictionary.conf` unless `--config-path` says otherwise), then
/// environment variables and CLI flags.
pub fn load_config_from<I, T>(args: I) -> DictionaryConfig
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // 1. Load defaults
    let mut current_config = DictionaryConfig::defaults();

    // 2. CLI (including env) is parsed once: it may name the config file and
    //    is applied last.
    let cli_args = DictionaryConfig::parse_from(args);

    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if config_file_path.exists() {
        match fs::read_to_string(&config_file_path) {
            Ok(config_str) => match serde_json::from_str::<DictionaryConfig>(&config_str) {
                Ok(file_config) => current_config = current_config.merge(file_config),
                Err(e) => log::warn!(
                    "Failed to parse config file {}: {}. Falling back to other sources.",
                    config_file_path.display(),
                    e
                ),
            },
            Err(e) => log::warn!(
                "Failed to read config file {}: {}. Falling back to other sources.",
                config_file_path.display(),
                e
            ),
        }
    } else {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            config_file_path.display()
        );
    }

    // 3. Override with environment variables and CLI arguments
    current_config.merge(cli_args)
}
