//! Subscriber hooks for observing and steering the Engine.
//!
//! The `EngineSubscriber` trait lets the hosting application receive
//! lifecycle notifications and take part in the two awaited decisions of a
//! dispatch pass: recognized system commands and actions the active form did
//! not handle.
//!
//! For read-only observation from another task, prefer `Engine::subscribe()`
//! which provides a broadcast channel of `EngineEvent` values.

use std::fmt;

use async_trait::async_trait;

use crate::engine_event::EngineEvent;
use crate::form::FormContext;
use formbot_core::prelude::*;

/// Extension trait for Engine subscribers.
///
/// Each callback has a default no-op implementation, so subscribers only
/// need to override the hooks they care about.
///
/// # Call contexts
///
/// `on_system_call` and `on_unhandled_call` receive the same
/// [`FormContext`] forms use. A subscriber consumes the call with
/// [`FormContext::mark_handled`] and may request navigation with
/// [`FormContext::navigate_to`]; the engine applies it to the session
/// before deciding how the pass continues.
///
/// # Thread Safety
///
/// Subscribers must be `Send + Sync` because passes for different sessions
/// run concurrently.
#[async_trait]
pub trait EngineSubscriber: Send + Sync + fmt::Debug {
    /// Unique name for this subscriber (for logging and identification).
    fn name(&self) -> &str;

    /// Called for each emitted EngineEvent.
    ///
    /// Errors are logged and otherwise ignored.
    fn on_event(&self, _event: &EngineEvent) -> Result<()> {
        Ok(())
    }

    /// Called for a message whose command token is a registered system call.
    ///
    /// Marking the context handled stops the pass before form dispatch.
    async fn on_system_call(&self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Called when the active form left an action unhandled.
    ///
    /// Handled without navigation skips rendering for this pass; handled with
    /// navigation re-enters the loop on the new form.
    async fn on_unhandled_call(&self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }
}
