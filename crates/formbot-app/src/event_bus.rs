//! Fan-out of engine events to subscribers and the broadcast channel

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::engine_event::EngineEvent;
use crate::form::FormContext;
use crate::subscriber::EngineSubscriber;
use formbot_core::prelude::*;

/// Capacity of the broadcast channel returned by [`EventBus::subscribe`]
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the subscriber list and the event broadcast channel.
///
/// Subscribers are registered before the engine starts and read-only after.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
    subscribers: Vec<Arc<dyn EngineSubscriber>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tx,
            subscribers: Vec::new(),
        }
    }

    pub fn register(&mut self, subscriber: Arc<dyn EngineSubscriber>) {
        debug!("Registered subscriber {}", subscriber.name());
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Receiver for all events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Deliver an event to every subscriber, then publish it.
    ///
    /// Subscriber errors are logged; having no receivers is not an error.
    pub fn emit(&self, event: EngineEvent) {
        trace!("Emitting {}", event.event_type());
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.on_event(&event) {
                warn!(
                    "Subscriber {} failed on {}: {}",
                    subscriber.name(),
                    event.event_type(),
                    e
                );
            }
        }
        let _ = self.tx.send(event);
    }

    /// Offer a system call to subscribers until one handles it
    pub async fn system_call(&self, ctx: &mut FormContext) -> Result<()> {
        for subscriber in &self.subscribers {
            subscriber.on_system_call(ctx).await?;
            if ctx.is_handled() {
                debug!("System call handled by {}", subscriber.name());
                break;
            }
        }
        Ok(())
    }

    /// Offer an unhandled action to subscribers until one handles it
    pub async fn unhandled_call(&self, ctx: &mut FormContext) -> Result<()> {
        for subscriber in &self.subscribers {
            subscriber.on_unhandled_call(ctx).await?;
            if ctx.is_handled() {
                debug!("Unhandled call recovered by {}", subscriber.name());
                break;
            }
        }
        Ok(())
    }
}
