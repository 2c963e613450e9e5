//! In-memory [`KvStore`].
//!
//! Clones share one map, which is how two actors share a payment channel in
//! tests and in single-process demo runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::KvStore;
use crate::error::DbResult;

#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        MemoryKvStore::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn remove_if(&self, key: &str, expected: &str) -> DbResult<bool> {
        let mut entries = self.entries.lock().await;
        if entries.get(key).map(String::as_str) == Some(expected) {
            entries.remove(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn replace_if(&self, key: &str, expected: &str, value: &str) -> DbResult<bool> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(current) if current.as_str() == expected => {
                *current = value.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self) -> DbResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
