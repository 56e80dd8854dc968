//! Persistence for the merged question pool.
//!
//! The store is a simple keyed blob store. Each entry carries the seed
//! version it was written under so stale copies of built-in content can be
//! detected after an upgrade.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::types::Question;

/// Storage key under which the question pool is kept
pub const STORAGE_KEY: &str = "trivia_questions";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A persisted snapshot of the question pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPool {
    pub version: u32,
    pub questions: Vec<Question>,
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<StoredPool>, StoreError>;

    async fn save(&self, key: &str, pool: &StoredPool) -> Result<(), StoreError>;
}

/// One pretty-printed JSON file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl QuestionStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<StoredPool>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, pool: &StoredPool) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(pool)?;

        // Write-then-rename so a crash never leaves a truncated file behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            "Saved {} questions to {}",
            pool.questions.len(),
            path.display()
        );
        Ok(())
    }
}

/// In-memory store, used by tests and when no storage directory is configured
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredPool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<StoredPool>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, pool: &StoredPool) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), pool.clone());
        Ok(())
    }
}
