//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // ─────────────────────────────────────────────────────────────
    // Transport Errors (messaging platform client)
    // ─────────────────────────────────────────────────────────────
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request timed out after {seconds}s")]
    RequestTimeout { seconds: u64 },

    // ─────────────────────────────────────────────────────────────
    // Form/Dispatch Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Form error: {message}")]
    Form { message: String },

    #[error("Navigation error: {message}")]
    Navigation { message: String },

    // ─────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Unknown form type: {discriminator}")]
    UnknownFormType { discriminator: String },

    #[error("Failed to access state field '{name}': {message}")]
    StateField { name: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No state store configured")]
    NoStateStore,

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self::Form {
            message: message.into(),
        }
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn unknown_form_type(discriminator: impl Into<String>) -> Self {
        Self::UnknownFormType {
            discriminator: discriminator.into(),
        }
    }

    pub fn state_field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StateField {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Errors raised by the platform client while talking to the network.
    ///
    /// These are contained to the update being processed and never reach
    /// the exception notification channel.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::RequestTimeout { .. })
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::RequestTimeout { .. }
                | Error::Form { .. }
                | Error::Navigation { .. }
                | Error::Persistence { .. }
                | Error::UnknownFormType { .. }
                | Error::StateField { .. }
        )
    }

    /// Check if this error is a precondition failure the host must fix
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NoStateStore | Error::Config { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
