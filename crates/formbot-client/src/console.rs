//! Console client: stdin lines in, stdout lines out

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch, Mutex};

use super::client::BotClient;
use super::protocol::parse_console_line;
use formbot_core::prelude::*;
use formbot_core::{DeviceId, Update};

/// Capacity of the update channel handed to the engine
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Default timeout for outbound writes
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`BotClient`] backed by the local terminal.
///
/// Every stdin line is attributed to a single configured device, which makes
/// it handy for driving forms by hand.
#[derive(Debug)]
pub struct ConsoleClient {
    device_id: DeviceId,
    username: Option<String>,
    request_timeout: Duration,
    next_message_id: Arc<AtomicI64>,
    shutdown_tx: watch::Sender<bool>,
    stdout: Mutex<tokio::io::Stdout>,
}

impl ConsoleClient {
    pub fn new(device_id: impl Into<DeviceId>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            device_id: device_id.into(),
            username: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            next_message_id: Arc::new(AtomicI64::new(1)),
            shutdown_tx,
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read stdin until EOF or shutdown, forwarding parsed updates.
    async fn stdin_reader(
        device_id: DeviceId,
        username: Option<String>,
        next_message_id: Arc<AtomicI64>,
        mut shutdown_rx: watch::Receiver<bool>,
        tx: mpsc::Sender<Update>,
    ) {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                _ = shutdown_rx.changed() => {
                    debug!("console reader received shutdown");
                    break;
                }
                line = reader.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            };

            let message_id = next_message_id.fetch_add(1, Ordering::SeqCst);
            let Some(mut update) = parse_console_line(&device_id, message_id, &line) else {
                continue;
            };
            update.message.username = username.clone();
            trace!("console update: {:?}", update.kind);

            if tx.send(update).await.is_err() {
                debug!("update channel closed");
                break;
            }
        }

        debug!("console reader finished");
    }
}

#[async_trait]
impl BotClient for ConsoleClient {
    fn name(&self) -> &str {
        "console"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Update>> {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        self.shutdown_tx.send_replace(false);

        tokio::spawn(Self::stdin_reader(
            self.device_id.clone(),
            self.username.clone(),
            Arc::clone(&self.next_message_id),
            self.shutdown_tx.subscribe(),
            tx,
        ));

        info!("Console client started for device {}", self.device_id);
        Ok(rx)
    }

    async fn stop(&self) -> Result<()> {
        self.shutdown_tx.send_replace(true);
        info!("Console client stopped");
        Ok(())
    }

    async fn send_text(&self, device_id: &DeviceId, text: &str) -> Result<()> {
        let line = format!("[{}] {}\n", device_id, text);

        let write = async {
            let mut stdout = self.stdout.lock().await;
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await
        };

        match tokio::time::timeout(self.request_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::transport(format!("stdout write failed: {}", e))),
            Err(_) => Err(Error::RequestTimeout {
                seconds: self.request_timeout.as_secs(),
            }),
        }
    }
}
