//! State storage backends

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::container::StateContainer;
use formbot_core::prelude::*;

/// Physical storage for persisted session state.
///
/// The engine reads the whole container once at startup and writes it once
/// on shutdown; byte-level encoding is up to the implementation.
#[async_trait]
pub trait StateStore: Send + Sync + fmt::Debug {
    async fn load_form_states(&self) -> Result<StateContainer>;

    async fn save_form_states(&self, container: &StateContainer) -> Result<()>;
}

/// Pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load_form_states(&self) -> Result<StateContainer> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("No state file at {:?}, starting empty", self.path);
            return Ok(StateContainer::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let container: StateContainer = serde_json::from_str(&content)
            .map_err(|e| Error::persistence(format!("Failed to parse {:?}: {}", self.path, e)))?;

        debug!(
            "Loaded {} state entries from {:?}",
            container.len(),
            self.path
        );
        Ok(container)
    }

    async fn save_form_states(&self, container: &StateContainer) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::persistence(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        let content = serde_json::to_string_pretty(container)?;

        // Atomic write: write to temp, then rename
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| Error::persistence(format!("Failed to write temp file: {}", e)))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::persistence(format!("Failed to rename temp file: {}", e)))?;

        info!(
            "Saved {} state entries to {:?}",
            container.len(),
            self.path
        );
        Ok(())
    }
}

/// In-process store, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    container: Mutex<StateContainer>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(container: StateContainer) -> Self {
        Self {
            container: Mutex::new(container),
        }
    }

    /// Copy of the last saved container
    pub async fn snapshot(&self) -> StateContainer {
        self.container.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_form_states(&self) -> Result<StateContainer> {
        Ok(self.container.lock().await.clone())
    }

    async fn save_form_states(&self, container: &StateContainer) -> Result<()> {
        *self.container.lock().await = container.clone();
        Ok(())
    }
}
