//! Key-Value Storage Abstraction
//!
//! Controller stores persist a small projection of their state (currently the
//! volume) through a string key-value backend. The contract mirrors the Web
//! Storage API so that `localStorage` can back it directly, while native hosts
//! can plug in SQLite or anything else that stores strings by key.
//!
//! Two host-agnostic backends ship with this crate:
//! - [`NoopStorage`]: discards writes and never returns data (persistence off)
//! - [`MemoryStorage`]: process-local map, mostly useful for tests and previews

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::{error::Result, platform::PlatformSendSync};

/// Key-value storage trait
///
/// Implementations may be synchronous underneath; the async surface only
/// exists so that IndexedDB- or database-backed stores fit the same contract.
///
/// # Platform Support
///
/// - **Desktop**: SQLite table (`bridge-desktop::SqliteStorage`)
/// - **Web**: `window.localStorage` (`bridge-wasm::WebStorage`)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageBackend;
///
/// async fn remember(storage: &dyn StorageBackend) -> Result<()> {
///     storage.set_item("player-volume", "0.4").await?;
///     Ok(())
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait StorageBackend: PlatformSendSync {
    /// Read the value stored under `key`, `Ok(None)` when absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Storage backend that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl StorageBackend for NoopStorage {
    async fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    async fn remove_item(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl StorageBackend for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}
