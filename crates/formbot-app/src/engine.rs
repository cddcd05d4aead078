//! Engine - wires the platform client, session registry, forms and state store
//!
//! The `Engine` owns everything a running bot needs. Updates received from
//! the [`BotClient`] are dispatched on independent tasks; passes for
//! different devices run concurrently while passes for the same device are
//! serialized by the session lock.
//!
//! ```ignore
//! let engine = Engine::builder(client)
//!     .with_settings(&settings)
//!     .start_form::<WelcomeForm>()
//!     .build()?;
//! engine.start().await?;
//! engine.closed().await;
//! engine.stop().await?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::Settings;
use crate::dispatch::DispatchReport;
use crate::engine_event::EngineEvent;
use crate::event_bus::EventBus;
use crate::form::{Form, FormContext};
use crate::session::{Session, SessionHandle};
use crate::session_manager::SessionManager;
use crate::state::{capture_entry, restore_form, FormRegistry, FormType, StateContainer, StateStore};
use crate::subscriber::EngineSubscriber;
use formbot_client::BotClient;
use formbot_core::prelude::*;
use formbot_core::{DeviceId, Update};

/// Builds the form a brand-new session starts on
pub type FormFactory = Arc<dyn Fn() -> Box<dyn Form> + Send + Sync>;

/// The session/dispatch engine
pub struct Engine {
    pub(crate) client: Arc<dyn BotClient>,
    pub(crate) sessions: SessionManager,
    pub(crate) forms: FormRegistry,
    pub(crate) start_form: FormFactory,
    pub(crate) system_calls: HashSet<String>,
    pub(crate) verbose: bool,
    pub(crate) bus: EventBus,
    state_store: Option<Arc<dyn StateStore>>,
    restore_on_start: bool,
    save_on_stop: bool,
    receiver: Mutex<Option<JoinHandle<()>>>,
    closed_tx: watch::Sender<bool>,
}

impl Engine {
    /// Start configuring an engine around `client`
    pub fn builder(client: Arc<dyn BotClient>) -> EngineBuilder {
        EngineBuilder::new(client)
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Restore persisted sessions (if configured) and begin receiving updates.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        if self.restore_on_start && self.state_store.is_some() {
            match self.load_state().await {
                Ok(count) => info!("Restored {} session(s)", count),
                Err(e) => warn!("Failed to restore sessions: {}", e),
            }
        }

        let mut updates = self.client.start().await?;
        info!("Engine started with client {}", self.client.name());

        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut passes = JoinSet::new();

            while let Some(update) = updates.recv().await {
                let engine = Arc::clone(&engine);
                passes.spawn(async move { engine.dispatch(update).await });

                while let Some(finished) = passes.try_join_next() {
                    if let Err(e) = finished {
                        error!("Dispatch task failed: {}", e);
                    }
                }
            }

            debug!("Update stream closed, draining {} pass(es)", passes.len());
            while let Some(finished) = passes.join_next().await {
                if let Err(e) = finished {
                    error!("Dispatch task failed: {}", e);
                }
            }
            engine.mark_closed();
        });

        *self.receiver.lock().await = Some(handle);
        Ok(())
    }

    /// Stop receiving updates, wait for in-flight passes and persist state
    /// (if configured).
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping engine");
        if let Err(e) = self.client.stop().await {
            warn!("Client {} failed to stop cleanly: {}", self.client.name(), e);
        }

        if let Some(handle) = self.receiver.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Receive loop failed: {}", e);
            }
        }

        let saved = if self.save_on_stop && self.state_store.is_some() {
            self.save_state().await.map(|_| ())
        } else {
            Ok(())
        };

        self.bus.emit(EngineEvent::Shutdown);
        self.mark_closed();
        saved
    }

    /// Resolves once the update stream has ended or the engine was stopped,
    /// including when that happened before the call.
    pub async fn closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        if rx.wait_for(|closed| *closed).await.is_err() {
            warn!("Engine close signal dropped");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    // The value must be stored even while nobody waits on `closed()`
    fn mark_closed(&self) {
        if self.closed_tx.send_replace(true) {
            trace!("Engine already marked closed");
        }
    }

    /// Dispatch an update on its own task.
    ///
    /// The returned handle resolves with the pass report once the pass is
    /// complete.
    pub fn spawn_dispatch(self: &Arc<Self>, update: Update) -> JoinHandle<DispatchReport> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.dispatch(update).await })
    }

    // ─────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────

    /// Session of `device_id`, if one exists
    pub fn session(&self, device_id: &DeviceId) -> Option<SessionHandle> {
        self.sessions.get(device_id)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Evict a session. Its active form receives `on_closed`.
    ///
    /// Returns `false` when no session existed.
    pub async fn end_session(&self, device_id: &DeviceId) -> Result<bool> {
        let Some(handle) = self.sessions.remove(device_id) else {
            return Ok(false);
        };

        let mut session = handle.lock().await;
        let mut ctx = FormContext::new(
            device_id.clone(),
            session.title.clone(),
            None,
            Arc::clone(&self.client),
        );
        let closed = session.close(&mut ctx).await;

        info!("Ended session {}", device_id);
        self.bus.emit(EngineEvent::SessionEnded {
            device_id: device_id.clone(),
        });
        closed.map(|_| true)
    }

    /// Send `text` to every session. Returns the number of successful sends.
    pub async fn broadcast(&self, text: &str) -> usize {
        let mut delivered = 0;
        for device_id in self.sessions.ids() {
            match self.client.send_text(&device_id, text).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Broadcast to {} failed: {}", device_id, e),
            }
        }
        delivered
    }

    // ─────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────

    fn store(&self) -> Result<&Arc<dyn StateStore>> {
        self.state_store.as_ref().ok_or(Error::NoStateStore)
    }

    /// Write the state of every persistable session to the state store.
    ///
    /// Sessions whose state cannot be read are skipped. Returns the number of
    /// entries written.
    pub async fn save_state(&self) -> Result<usize> {
        let store = self.store()?;

        let mut container = StateContainer::new();
        for (device_id, handle) in self.sessions.list() {
            let session = handle.lock().await;
            match capture_entry(&session, &self.forms) {
                Ok(Some(entry)) => container.push(entry),
                Ok(None) => trace!("Session {} opts out of persistence", device_id),
                Err(e) => warn!("Skipping state of session {}: {}", device_id, e),
            }
        }

        store.save_form_states(&container).await?;

        let count = container.len();
        self.bus.emit(EngineEvent::StateSaved { count });
        Ok(count)
    }

    /// Restore sessions from the state store.
    ///
    /// Entries that cannot be resolved or whose opening hooks fail are
    /// skipped. Returns the number of sessions restored.
    pub async fn load_state(&self) -> Result<usize> {
        let store = self.store()?;
        let container = store.load_form_states().await?;

        let mut restored = 0;
        for entry in container {
            let form = match restore_form(&entry, &self.forms) {
                Ok(form) => form,
                Err(e) => {
                    warn!("Skipping persisted session {}: {}", entry.device_id, e);
                    continue;
                }
            };

            let handle = self
                .sessions
                .insert(Session::new(entry.device_id.clone(), form).with_title(&entry.title));

            let mut session = handle.lock().await;
            let mut ctx = FormContext::new(
                entry.device_id.clone(),
                entry.title.clone(),
                None,
                Arc::clone(&self.client),
            );
            if let Err(e) = session.open(&mut ctx).await {
                warn!("Discarding restored session {}: {}", entry.device_id, e);
                drop(session);
                self.sessions.remove(&entry.device_id);
                continue;
            }
            restored += 1;
        }

        self.bus.emit(EngineEvent::StateRestored { count: restored });
        Ok(restored)
    }

    // ─────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────

    /// Receiver for all engine events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    pub fn client(&self) -> &Arc<dyn BotClient> {
        &self.client
    }

    pub fn forms(&self) -> &FormRegistry {
        &self.forms
    }

    /// Registered system call tokens, sorted
    pub fn system_calls(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.system_calls.iter().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_system_call(&self, token: &str) -> bool {
        self.system_calls.contains(token)
    }

    pub fn has_state_store(&self) -> bool {
        self.state_store.is_some()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("client", &self.client.name())
            .field("sessions", &self.sessions.len())
            .field("forms", &self.forms.len())
            .field("system_calls", &self.system_calls)
            .field("verbose", &self.verbose)
            .field("bus", &self.bus)
            .field("state_store", &self.state_store)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────

/// Configures an [`Engine`] before it starts.
///
/// System calls, subscribers and form registrations are fixed once built.
pub struct EngineBuilder {
    client: Arc<dyn BotClient>,
    forms: FormRegistry,
    start_form: Option<FormFactory>,
    system_calls: HashSet<String>,
    verbose: bool,
    bus: EventBus,
    state_store: Option<Arc<dyn StateStore>>,
    restore_on_start: bool,
    save_on_stop: bool,
}

impl EngineBuilder {
    pub fn new(client: Arc<dyn BotClient>) -> Self {
        Self {
            client,
            forms: FormRegistry::new(),
            start_form: None,
            system_calls: HashSet::new(),
            verbose: false,
            bus: EventBus::new(),
            state_store: None,
            restore_on_start: true,
            save_on_stop: true,
        }
    }

    /// Apply dispatch and state flags from settings.
    ///
    /// The state store itself is attached with [`Self::with_state_store`].
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.system_calls
            .extend(settings.dispatch.system_calls.iter().cloned());
        self.verbose = settings.dispatch.verbose;
        self.restore_on_start = settings.state.restore_on_start;
        self.save_on_stop = settings.state.save_on_stop;
        self
    }

    /// Recognize `token` (for example `/start`) as a system call
    pub fn with_system_call(mut self, token: impl Into<String>) -> Self {
        self.system_calls.insert(token.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn with_restore_on_start(mut self, enabled: bool) -> Self {
        self.restore_on_start = enabled;
        self
    }

    pub fn with_save_on_stop(mut self, enabled: bool) -> Self {
        self.save_on_stop = enabled;
        self
    }

    /// Make a form type restorable from persisted state
    pub fn register_form<F: FormType>(mut self) -> Self {
        self.forms.register::<F>();
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn EngineSubscriber>) -> Self {
        self.bus.register(subscriber);
        self
    }

    /// New sessions start on a default `F`, which is also registered
    pub fn start_form<F: FormType>(mut self) -> Self {
        self.forms.register::<F>();
        self.start_form = Some(Arc::new(|| Box::new(F::default()) as Box<dyn Form>));
        self
    }

    /// New sessions start on whatever `factory` builds
    pub fn start_form_with<T>(mut self, factory: T) -> Self
    where
        T: Fn() -> Box<dyn Form> + Send + Sync + 'static,
    {
        self.start_form = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Result<Arc<Engine>> {
        let start_form = self
            .start_form
            .ok_or_else(|| Error::config("no start form configured"))?;

        if self.system_calls.is_empty() {
            debug!("No system calls registered");
        }

        let (closed_tx, _) = watch::channel(false);
        Ok(Arc::new(Engine {
            client: self.client,
            sessions: SessionManager::new(),
            forms: self.forms,
            start_form,
            system_calls: self.system_calls,
            verbose: self.verbose,
            bus: self.bus,
            state_store: self.state_store,
            restore_on_start: self.restore_on_start,
            save_on_stop: self.save_on_stop,
            receiver: Mutex::new(None),
            closed_tx,
        }))
    }
}
