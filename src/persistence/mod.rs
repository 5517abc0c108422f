//! Key-value persistence
//!
//! The progression record and the local leaderboard are each one JSON
//! document under a fixed key. Backends:
//! - `MemoryStorage`: tests and storage-less environments
//! - `FileStorage`: native builds, one file per key
//! - `LocalStorage`: browser `window.localStorage` (wasm32)
//!
//! Callers treat every error as recoverable: log and keep going.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

/// Persistence failures
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// No backing store (private browsing, missing window)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Backend rejected the write (quota, read-only)
    #[error("storage write rejected for key {key}: {reason}")]
    WriteRejected { key: String, reason: String },
    /// Filesystem error
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Stored document could not be (de)serialized
    #[error("stored document is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    /// Stored bytes can't be read back as a document (not UTF-8)
    #[error("stored document is corrupt: {0}")]
    Corrupt(String),
}

/// String key-value store with localStorage semantics
pub trait Storage {
    /// Read a key. `Ok(None)` when the key was never written.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// In-memory storage
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// a store wrote. Writes can be made to fail to exercise the degrade path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key directly (bypasses `fail_writes`)
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make subsequent writes fail with `WriteRejected`
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Raw value currently stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
