//! Test utilities for client types
//!
//! Provides an in-memory [`BotClient`] that records outbound messages and lets
//! tests inject inbound updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::client::BotClient;
use formbot_core::prelude::*;
use formbot_core::{DeviceId, Update};

/// A message passed to [`BotClient::send_text`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub device_id: DeviceId,
    pub text: String,
}

/// In-memory client for tests.
#[derive(Debug, Default)]
pub struct RecordingClient {
    sent: Mutex<Vec<SentMessage>>,
    fail_sends: AtomicBool,
    inbox: Mutex<Option<mpsc::Sender<Update>>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, in order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Texts sent to one device, in order
    pub fn sent_to(&self, device_id: &DeviceId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| &m.device_id == device_id)
            .map(|m| m.text)
            .collect()
    }

    /// Make every following send fail with a transport error
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Deliver an update as if it arrived from the platform.
    ///
    /// Fails with [`Error::ChannelClosed`] if the client was never started or
    /// has been stopped.
    pub async fn inject(&self, update: Update) -> Result<()> {
        let sender = self
            .inbox
            .lock()
            .ok()
            .and_then(|inbox| inbox.clone())
            .ok_or(Error::ChannelClosed)?;
        sender.send(update).await.map_err(|_| Error::ChannelClosed)
    }
}

#[async_trait]
impl BotClient for RecordingClient {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Update>> {
        let (tx, rx) = mpsc::channel(64);
        if let Ok(mut inbox) = self.inbox.lock() {
            *inbox = Some(tx);
        }
        Ok(rx)
    }

    async fn stop(&self) -> Result<()> {
        // Dropping the sender closes the engine's receive loop
        if let Ok(mut inbox) = self.inbox.lock() {
            inbox.take();
        }
        Ok(())
    }

    async fn send_text(&self, device_id: &DeviceId, text: &str) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::transport("simulated transport failure"));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                device_id: device_id.clone(),
                text: text.to_string(),
            });
        }
        Ok(())
    }
}
