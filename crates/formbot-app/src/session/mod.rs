//! Per-device session state for a chat

#[allow(clippy::module_inception)]
mod session;


use std::sync::Arc;

pub use session::Session;

/// Shared, serialized access to one session.
///
/// A dispatch pass holds the lock for its whole duration, so two updates for
/// the same device never interleave.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;
