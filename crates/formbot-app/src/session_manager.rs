//! Registry of live sessions keyed by device

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use formbot_core::prelude::*;
use formbot_core::DeviceId;

use crate::session::{Session, SessionHandle};

/// Concurrent device → session map.
///
/// The map lock is only held for lookups and inserts, never across an
/// `.await`; per-session work is serialized by each [`SessionHandle`].
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<DeviceId, SessionHandle>>,
}

impl SessionManager {
    /// Create an empty session manager
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<DeviceId, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a session by device
    pub fn get(&self, device_id: &DeviceId) -> Option<SessionHandle> {
        self.sessions().get(device_id).cloned()
    }

    /// Get the session for `device_id`, building it with `factory` if absent.
    ///
    /// Lookup and insert happen under one lock, so concurrent first contact
    /// from the same device runs `factory` exactly once. The flag is `true`
    /// for the caller whose factory ran.
    pub fn get_or_create<F>(&self, device_id: &DeviceId, factory: F) -> (SessionHandle, bool)
    where
        F: FnOnce() -> Session,
    {
        let mut sessions = self.sessions();
        if let Some(handle) = sessions.get(device_id) {
            return (handle.clone(), false);
        }

        let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(factory()));
        sessions.insert(device_id.clone(), handle.clone());
        debug!("Created session for {}", device_id);
        (handle, true)
    }

    /// Insert a session, replacing any existing one for the same device
    pub fn insert(&self, session: Session) -> SessionHandle {
        let device_id = session.device_id.clone();
        let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(session));
        if self
            .sessions()
            .insert(device_id.clone(), handle.clone())
            .is_some()
        {
            debug!("Replaced existing session for {}", device_id);
        }
        handle
    }

    /// Remove a session
    pub fn remove(&self, device_id: &DeviceId) -> Option<SessionHandle> {
        self.sessions().remove(device_id)
    }

    /// Stable snapshot of all sessions, ordered by device
    pub fn list(&self) -> Vec<(DeviceId, SessionHandle)> {
        let mut snapshot: Vec<_> = self
            .sessions()
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// Device ids of all sessions, ordered
    pub fn ids(&self) -> Vec<DeviceId> {
        self.list().into_iter().map(|(id, _)| id).collect()
    }

    pub fn contains(&self, device_id: &DeviceId) -> bool {
        self.sessions().contains_key(device_id)
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Check if there are no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}
