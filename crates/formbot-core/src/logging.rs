//! File logging for formbot processes
//!
//! Everything goes to a daily-rolling file, since the console client owns
//! stdin/stdout. The filter is built from [`LogOptions`] unless
//! `FORMBOT_LOG` is set, which replaces it entirely:
//!
//! ```bash
//! FORMBOT_LOG=formbot_app=trace,warn formbot
//! ```

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "FORMBOT_LOG";

/// Base name of the rolling log file
pub const LOG_FILE_NAME: &str = "formbot.log";

/// Crates the configured level applies to; everything else logs at `warn`
const FORMBOT_TARGETS: [&str; 4] = ["formbot", "formbot_core", "formbot_client", "formbot_app"];

/// Where and how verbosely to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Level for the formbot crates (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,

    /// Log directory, `<data_local_dir>/formbot/logs` when unset
    pub directory: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl LogOptions {
    /// Filter directives: the configured level per formbot crate, `warn`
    /// for dependencies
    pub fn directives(&self) -> String {
        let level = self.level.trim().to_ascii_lowercase();
        let mut directives: Vec<String> = FORMBOT_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect();
        directives.push("warn".to_string());
        directives.join(",")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_log_dir)
    }

    /// Path of the active log file
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join(LOG_FILE_NAME)
    }

    fn filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
        EnvFilter::try_new(self.directives())
            .map_err(|e| Error::config(format!("Invalid log level {:?}: {}", self.level, e)))
    }
}

/// `<data_local_dir>/formbot/logs`, or `./formbot/logs` without a data dir
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("formbot")
        .join("logs")
}

/// Install the global subscriber. Returns the log directory in use.
///
/// Fails on an unparsable level or an uncreatable directory; can only
/// succeed once per process.
pub fn init(options: &LogOptions) -> Result<PathBuf> {
    let filter = options.filter()?;
    let log_dir = options.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Logging already initialized: {}", e)))?;

    Ok(log_dir)
}
