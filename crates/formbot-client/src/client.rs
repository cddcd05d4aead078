//! Platform client contract consumed by the dispatch engine

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use formbot_core::prelude::*;
use formbot_core::{DeviceId, Update};

/// Connection to a messaging platform.
///
/// Implementations deliver normalized [`Update`]s on the channel returned by
/// [`BotClient::start`] and expose the outbound send primitive. Network
/// failures must surface as [`Error::Transport`] or [`Error::RequestTimeout`]
/// so the dispatcher can keep them off the exception channel.
#[async_trait]
pub trait BotClient: Send + Sync + fmt::Debug {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Begin receiving updates. The channel closes when the client stops.
    async fn start(&self) -> Result<mpsc::Receiver<Update>>;

    /// Stop receiving updates
    async fn stop(&self) -> Result<()>;

    /// Send a text message to a chat/device
    async fn send_text(&self, device_id: &DeviceId, text: &str) -> Result<()>;
}
