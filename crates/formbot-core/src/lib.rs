//! # formbot-core - Core Domain Types
//!
//! Foundation crate for formbot. Provides the update/message model, system
//! command parsing, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`DeviceId`] - Chat/device identifier a session is keyed by
//! - [`Message`], [`MessageKind`] - Normalized inbound message
//! - [`Update`], [`UpdateKind`] - One event from the platform client
//! - [`SystemCommand`] - Parsed `/token args...` command
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with transport/application/persistence classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use formbot_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all formbot crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use types::{DeviceId, Message, MessageKind, SystemCommand, Update, UpdateKind};
