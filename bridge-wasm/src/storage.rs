//! `localStorage` implementation of the storage bridge.
//!
//! Web Storage is synchronous; the async trait methods complete immediately.
//! Without a namespace keys are used as-is, so envelopes written by other
//! players on the same origin stay readable.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::StorageBackend,
};
use tracing::debug;

use crate::error::js_error;

fn local_storage() -> BridgeResult<web_sys::Storage> {
    let window = web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".into()))?;
    window
        .local_storage()
        .map_err(|err| js_error("localStorage", err))?
        .ok_or_else(|| BridgeError::NotAvailable("localStorage".into()))
}

/// [`StorageBackend`] over `window.localStorage`.
#[derive(Clone)]
pub struct WebStorage {
    storage: web_sys::Storage,
    namespace: Option<String>,
}

impl WebStorage {
    /// Storage using unprefixed keys.
    pub fn new() -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            namespace: None,
        })
    }

    /// Storage whose keys are prefixed with `{namespace}::`, so several
    /// embeds on one origin do not share volume.
    pub fn with_namespace(namespace: impl Into<String>) -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            namespace: Some(namespace.into()),
        })
    }

    fn key_for(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}::{key}"),
            None => key.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl StorageBackend for WebStorage {
    async fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
        self.storage
            .get_item(&self.key_for(key))
            .map_err(|err| js_error("localStorage.getItem", err))
    }

    async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
        // quota errors surface here
        self.storage
            .set_item(&self.key_for(key), value)
            .map_err(|err| js_error("localStorage.setItem", err))?;
        debug!(key, "Stored item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> BridgeResult<()> {
        self.storage
            .remove_item(&self.key_for(key))
            .map_err(|err| js_error("localStorage.removeItem", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn unique_namespace(prefix: &str) -> String {
        format!("{prefix}-{}", js_sys::Date::now())
    }

    #[wasm_bindgen_test]
    async fn web_storage_roundtrip() {
        console_error_panic_hook::set_once();
        let store = WebStorage::with_namespace(unique_namespace("storage")).expect("storage init");

        assert_eq!(store.get_item("volume").await.expect("get"), None);
        store.set_item("volume", "0.4").await.expect("set");
        assert_eq!(
            store.get_item("volume").await.expect("get"),
            Some("0.4".to_string())
        );

        store.remove_item("volume").await.expect("remove");
        assert_eq!(store.get_item("volume").await.expect("get"), None);
    }

    #[wasm_bindgen_test]
    async fn namespaces_are_isolated() {
        let a = WebStorage::with_namespace(unique_namespace("a")).expect("storage init");
        let b = WebStorage::with_namespace(unique_namespace("b")).expect("storage init");

        a.set_item("key", "from-a").await.expect("set");
        assert_eq!(b.get_item("key").await.expect("get"), None);
        a.remove_item("key").await.expect("remove");
    }
}
