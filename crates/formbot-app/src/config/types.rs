//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use formbot_core::logging::LogOptions;
use serde::{Deserialize, Serialize};

/// Settings from `.formbot/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub dispatch: DispatchSettings,

    #[serde(default)]
    pub state: StateSettings,

    #[serde(default)]
    pub client: ClientSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Dispatch engine settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DispatchSettings {
    /// Command tokens that are offered to subscribers before form dispatch
    #[serde(default = "default_system_calls")]
    pub system_calls: Vec<String>,

    /// Emit a message-observed event for every update
    #[serde(default)]
    pub verbose: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            system_calls: default_system_calls(),
            verbose: false,
        }
    }
}

fn default_system_calls() -> Vec<String> {
    vec!["/start".to_string()]
}

/// Session state persistence settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StateSettings {
    /// Persist sessions to a JSON state file
    #[serde(default)]
    pub enabled: bool,

    /// State file, relative to `.formbot/`
    #[serde(default = "default_state_file")]
    pub file: String,

    #[serde(default = "default_true")]
    pub restore_on_start: bool,

    #[serde(default = "default_true")]
    pub save_on_stop: bool,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            file: default_state_file(),
            restore_on_start: true,
            save_on_stop: true,
        }
    }
}

fn default_state_file() -> String {
    "state.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Platform client settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientSettings {
    /// Device id the console client reports messages from
    #[serde(default = "default_device_id")]
    pub device_id: i64,

    /// Timeout for outbound requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_device_id() -> i64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Log file settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Level for the formbot crates; `FORMBOT_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory, the platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl LoggingSettings {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: self.level.clone(),
            directory: self.directory.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
