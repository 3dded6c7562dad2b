use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::{broadcast, Mutex};

use crate::error::{Error, Result};
use crate::storage::traits::{KeyValueStore, StorageChange};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Key-value store persisted as a single JSON object on disk
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    Error::Storage(format!(
                        "Failed to create store directory '{}': {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            tracing::debug!("Store file does not exist yet: {}", self.path.display());
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to read store file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Storage(format!(
                "Store file '{}' does not hold a JSON object (found {})",
                self.path.display(),
                kind_of(&other)
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        let json_content = serde_json::to_string_pretty(map)?;

        // Write to temporary file first, then rename (atomic operation)
        let temp_file = self.path.with_extension("tmp");
        fs::write(&temp_file, json_content).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to write store to '{}': {}",
                temp_file.display(),
                e
            ))
        })?;

        fs::rename(&temp_file, &self.path).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to rename store file '{}' to '{}': {}",
                temp_file.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_all().await?;
        let old_value = map.insert(key.to_string(), value.clone());
        self.write_all(&map).await?;

        tracing::debug!("Saved key '{}' to {}", key, self.path.display());

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
