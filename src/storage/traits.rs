use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;

/// Capacity of the change-notification channel per store.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Key-value store addressed by string keys holding JSON values
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value stored under `key`, notifying subscribers
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Receive a [`StorageChange`] for every successful `set`
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Change notification carrying both the previous and the new value
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Memory-only store for tests and short-lived sessions
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            changes,
        }
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let old_value = self.values.write().insert(key.to_string(), value.clone());

        // No subscribers is fine
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: value,
        });

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
