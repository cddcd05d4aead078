//! Persisted snapshot format exchanged with state stores

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use formbot_core::DeviceId;

/// Named values of one form, ordered by name
pub type StateValues = BTreeMap<String, serde_json::Value>;

/// Snapshot of one session and its active form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub device_id: DeviceId,

    #[serde(default)]
    pub title: String,

    /// Registered type name used to reconstruct the form
    pub form_type: String,

    /// Explicitly exported values merged with prefixed persisted fields
    #[serde(default)]
    pub values: StateValues,
}

impl StateEntry {
    pub fn new(device_id: DeviceId, title: impl Into<String>, form_type: impl Into<String>) -> Self {
        Self {
            device_id,
            title: title.into(),
            form_type: form_type.into(),
            values: StateValues::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

/// Ordered collection of entries; the unit read from and written to a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateContainer {
    #[serde(default)]
    pub entries: Vec<StateEntry>,
}

impl StateContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. An existing entry for the same device is replaced in place.
    pub fn push(&mut self, entry: StateEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.device_id == entry.device_id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, device_id: &DeviceId) -> Option<&StateEntry> {
        self.entries.iter().find(|e| &e.device_id == device_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for StateContainer {
    type Item = StateEntry;
    type IntoIter = std::vec::IntoIter<StateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
