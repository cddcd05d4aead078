//! Domain events emitted by the Engine for external consumers
//!
//! Events are delivered synchronously to registered
//! [`EngineSubscriber`](crate::subscriber::EngineSubscriber)s and published
//! on the broadcast channel returned by `Engine::subscribe()`.

use formbot_core::{DeviceId, Message, SystemCommand, UpdateKind};

/// Domain events emitted by the Engine for external consumers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Session Lifecycle
    // ─────────────────────────────────────────────────────────
    /// First update from a device created a new session
    SessionBegins { device_id: DeviceId, title: String },

    /// A session was removed from the registry
    SessionEnded { device_id: DeviceId },

    // ─────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────
    /// An update arrived (verbose mode only)
    MessageObserved {
        device_id: DeviceId,
        kind: UpdateKind,
        message: Message,
    },

    /// A recognized system command was offered to subscribers
    SystemCall {
        device_id: DeviceId,
        command: SystemCommand,
        handled: bool,
    },

    /// An action was not handled by the active form
    UnhandledCall {
        device_id: DeviceId,
        data: String,
        handled: bool,
    },

    /// A dispatch pass failed with an application error
    Exception {
        device_id: DeviceId,
        title: String,
        text: String,
        error: String,
    },

    // ─────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────
    /// Session state was written to the state store
    StateSaved { count: usize },

    /// Sessions were restored from the state store
    StateRestored { count: usize },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionBegins { .. } => "session_begins",
            Self::SessionEnded { .. } => "session_ended",
            Self::MessageObserved { .. } => "message_observed",
            Self::SystemCall { .. } => "system_call",
            Self::UnhandledCall { .. } => "unhandled_call",
            Self::Exception { .. } => "exception",
            Self::StateSaved { .. } => "state_saved",
            Self::StateRestored { .. } => "state_restored",
            Self::Shutdown => "shutdown",
        }
    }

    /// Device the event concerns, if any
    pub fn device_id(&self) -> Option<&DeviceId> {
        match self {
            Self::SessionBegins { device_id, .. }
            | Self::SessionEnded { device_id }
            | Self::MessageObserved { device_id, .. }
            | Self::SystemCall { device_id, .. }
            | Self::UnhandledCall { device_id, .. }
            | Self::Exception { device_id, .. } => Some(device_id),
            Self::StateSaved { .. } | Self::StateRestored { .. } | Self::Shutdown => None,
        }
    }
}
