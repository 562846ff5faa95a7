//! # State Stores
//!
//! - [`InMemoryStateStore`]: for tests
//! - [`JsonFileStateStore`]: the whole state as one JSON document, replaced
//!   atomically on each commit

use crate::domain::state::LedgerState;
use crate::errors::StoreError;
use crate::ports::outbound::StateStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// In-memory state store for testing.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: RwLock<LedgerState>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `state`.
    #[must_use]
    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self) -> Result<LedgerState, StoreError> {
        Ok(self.state.read().clone())
    }

    async fn commit(&self, state: &LedgerState) -> Result<(), StoreError> {
        *self.state.write() = state.clone();
        Ok(())
    }
}

/// File-backed state store.
///
/// A missing file reads as the empty state. Commits write a sibling temp
/// file, sync it, then rename it over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self) -> Result<LedgerState, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "loading state");
                Ok(serde_json::from_slice(&bytes)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LedgerState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn commit(&self, state: &LedgerState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "state committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("ledger.json"));
        let state = store.load().await.unwrap();
        assert!(!state.is_initialized());
        assert!(state.partners.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = JsonFileStateStore::new(&path);
        assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_in_memory_commit_replaces_state() {
        let store = InMemoryStateStore::new();
        let mut state = store.load().await.unwrap();
        state.config = None;
        store.commit(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);
    }
}
