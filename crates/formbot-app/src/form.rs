//! Form lifecycle contract
//!
//! A form is the stateful UI unit a session is currently showing. The
//! dispatcher calls its hooks in a fixed order for every update:
//!
//! 1. `pre_load`, `load_controls`, `load`
//! 2. `sent_data` (attachments only) or `action_controls`, `action` (actions only)
//! 3. `render_controls`, `render`
//!
//! plus `edited` for message edits and the out-of-loop `on_init`,
//! `on_opened` and `on_closed` hooks around navigation.
//!
//! Every hook has a no-op default, so forms only implement what they use.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::state::StateValues;
use formbot_client::BotClient;
use formbot_core::prelude::*;
use formbot_core::{DeviceId, Message, Update};

/// Upcast helper so registered form types can be recovered from a `dyn Form`.
///
/// Implemented for every `'static` type; form authors never implement it.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The capability set every pluggable form exposes.
#[async_trait]
pub trait Form: AsAny + Send + Sync {
    /// Called once on a freshly constructed form before it becomes active
    async fn on_init(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Called after the form became the active form of its session
    async fn on_opened(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Called on the outgoing form when navigation replaces it
    async fn on_closed(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    async fn pre_load(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    async fn load_controls(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    async fn load(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Receives photo/document/location/contact/video/audio payloads
    async fn sent_data(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    async fn action_controls(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Handle a callback/action. Call [`FormContext::mark_handled`] when consumed.
    async fn action(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    async fn render_controls(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    async fn render(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Called when the user edits a message previously sent to this form
    async fn edited(&mut self, _ctx: &mut FormContext) -> Result<()> {
        Ok(())
    }

    /// Explicit state export. `None` means the form does not export state.
    ///
    /// Names starting with `$` belong to persisted fields and are dropped.
    fn export_state(&self) -> Result<Option<StateValues>> {
        Ok(None)
    }

    /// Explicit state import, called with the full persisted value mapping
    fn import_state(&mut self, _values: &StateValues) -> Result<()> {
        Ok(())
    }
}

/// Recover the concrete form type behind a `dyn Form`
pub fn downcast_ref<F: Form>(form: &dyn Form) -> Option<&F> {
    form.as_any().downcast_ref::<F>()
}

/// Mutable variant of [`downcast_ref`]
pub fn downcast_mut<F: Form>(form: &mut dyn Form) -> Option<&mut F> {
    form.as_any_mut().downcast_mut::<F>()
}

/// Per-update context handed to every hook.
///
/// Hooks use it to reply through the platform client, to mark the update
/// handled, and to request navigation to another form. Navigation is applied
/// by the dispatcher as soon as the requesting hook returns.
pub struct FormContext {
    device_id: DeviceId,
    title: String,
    update: Option<Update>,
    client: Arc<dyn BotClient>,
    handled: bool,
    navigation: Option<Box<dyn Form>>,
}

impl FormContext {
    pub fn new(
        device_id: DeviceId,
        title: impl Into<String>,
        update: Option<Update>,
        client: Arc<dyn BotClient>,
    ) -> Self {
        Self {
            device_id,
            title: title.into(),
            update,
            client,
            handled: false,
            navigation: None,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Display title of the session
    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The update being dispatched. `None` while restoring persisted state.
    pub fn update(&self) -> Option<&Update> {
        self.update.as_ref()
    }

    pub fn message(&self) -> Option<&Message> {
        self.update.as_ref().map(|u| &u.message)
    }

    /// Text of the message, or the callback payload for actions
    pub fn raw_data(&self) -> &str {
        self.message().map(Message::raw_data).unwrap_or_default()
    }

    pub fn client(&self) -> &Arc<dyn BotClient> {
        &self.client
    }

    /// Reply to this session's chat
    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.client.send_text(&self.device_id, text).await
    }

    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Request that `form` replaces the session's active form
    pub fn navigate_to<F: Form>(&mut self, form: F) {
        self.navigation = Some(Box::new(form));
    }

    pub fn navigate_to_boxed(&mut self, form: Box<dyn Form>) {
        self.navigation = Some(form);
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.navigation.is_some()
    }

    pub(crate) fn take_navigation(&mut self) -> Option<Box<dyn Form>> {
        self.navigation.take()
    }
}

impl std::fmt::Debug for FormContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormContext")
            .field("device_id", &self.device_id)
            .field("title", &self.title)
            .field("update", &self.update.as_ref().map(|u| u.kind))
            .field("client", &self.client.name())
            .field("handled", &self.handled)
            .field("has_navigation", &self.navigation.is_some())
            .finish()
    }
}
