//! Key-value persistence for progression records.
//!
//! The engine only needs two calls: load a serialised record by key and
//! save one back. Backends implement [`KeyValueStore`]; the store owns its
//! backend exclusively, so implementations take `&self` and may use
//! interior mutability but need not be `Sync`.

pub mod file;
pub mod sqlite;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::config::{PersistenceConfig, StorageBackend};
use crate::error::Result;

pub use file::JsonFileStore;
pub use sqlite::SqliteStore;

/// Durable key-value storage for serialised records.
pub trait KeyValueStore: Send + fmt::Debug {
    /// Read the value stored under `key`, or `None` if nothing was saved.
    ///
    /// # Errors
    /// Returns an error if the backend is unavailable or unreadable.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the write does not reach the backend.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Process-local storage. Clones share the same map, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `key` with a raw value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Raw value currently stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Open the backend selected by `config`.
///
/// # Errors
/// Returns an error if the SQLite database or JSON directory cannot be
/// opened.
pub fn open_store(config: &PersistenceConfig) -> Result<Box<dyn KeyValueStore>> {
    let store: Box<dyn KeyValueStore> = match config.backend {
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.path, config)?),
        StorageBackend::Json => Box::new(JsonFileStore::open(&config.path)?),
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };
    info!(
        backend = store.backend_name(),
        path = %config.path.display(),
        "Progression storage opened"
    );
    Ok(store)
}
