use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::StorageError;

/// Durable, synchronous, string-keyed storage for the session record.
///
/// The browser-local-storage equivalent of the host UI. Operations are
/// idempotent; only [`crate::store::SessionStore`] may touch it.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Thread-safe in-memory storage; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.remove(key);
        Ok(())
    }
}
