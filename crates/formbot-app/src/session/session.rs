//! Per-device session state: active form, metadata and navigation

use chrono::{DateTime, Utc};

use crate::dispatch::MAX_NAVIGATION;
use crate::form::{Form, FormContext};
use formbot_core::prelude::*;
use formbot_core::{DeviceId, Message};

/// A single chat session
pub struct Session {
    /// Device/chat identifier the session is keyed by
    pub device_id: DeviceId,

    /// Display title (chat title, falling back to the username)
    pub title: String,

    /// The active form. Only replaced through [`Session::apply_navigation`].
    pub form: Box<dyn Form>,

    // ─────────────────────────────────────────────────────────
    // Activity Tracking
    // ─────────────────────────────────────────────────────────
    /// Last inbound message
    pub last_message: Option<Message>,

    /// When the last update for this session was handled
    pub last_action: DateTime<Utc>,

    /// When this session was created or restored
    pub created_at: DateTime<Utc>,

    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────
    /// Set when the active form was replaced during the current iteration
    pub form_switched: bool,

    /// Whether the initial form already received `on_init`/`on_opened`
    pub(crate) opened: bool,
}

impl Session {
    /// Create a new session showing `form`
    pub fn new(device_id: DeviceId, form: Box<dyn Form>) -> Self {
        let now = Utc::now();
        Self {
            device_id,
            title: String::new(),
            form,
            last_message: None,
            last_action: now,
            created_at: now,
            form_switched: false,
            opened: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Record an inbound message: title, activity timestamp, last message
    pub fn update_metadata(&mut self, message: &Message) {
        if let Some(title) = message.display_title() {
            self.title = title.to_string();
        }
        self.last_action = Utc::now();
        self.last_message = Some(message.clone());
    }

    /// Run the opening hooks on the initial form, then apply any navigation
    /// they requested.
    pub async fn open(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.form.on_init(ctx).await?;
        self.form.on_opened(ctx).await?;
        self.opened = true;
        self.apply_navigation(ctx).await
    }

    /// Replace the active form with any form requested through `ctx`.
    ///
    /// The incoming form receives `on_init`, the outgoing one `on_closed`,
    /// then the incoming one `on_opened`. Hooks of the incoming form may
    /// request navigation again; chains longer than [`MAX_NAVIGATION`] are
    /// truncated.
    pub async fn apply_navigation(&mut self, ctx: &mut FormContext) -> Result<()> {
        let mut hops = 0;
        while let Some(mut next) = ctx.take_navigation() {
            if hops == MAX_NAVIGATION {
                warn!(
                    "Dropping navigation for {}: more than {} chained switches",
                    self.device_id, MAX_NAVIGATION
                );
                break;
            }
            hops += 1;

            next.on_init(ctx).await?;
            self.form.on_closed(ctx).await?;
            self.form = next;
            self.form_switched = true;
            self.form.on_opened(ctx).await?;
        }
        Ok(())
    }

    /// Deliver `on_closed` to the active form before the session is dropped
    pub async fn close(&mut self, ctx: &mut FormContext) -> Result<()> {
        self.form.on_closed(ctx).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("device_id", &self.device_id)
            .field("title", &self.title)
            .field("last_action", &self.last_action)
            .field("created_at", &self.created_at)
            .field("form_switched", &self.form_switched)
            .field("opened", &self.opened)
            .finish_non_exhaustive()
    }
}
