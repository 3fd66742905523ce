//! # Controller Configuration
//!
//! Builder-based configuration for media and broadcast controllers.
//!
//! ## Overview
//!
//! [`ControllerConfig`] carries the host bridges a controller needs and the
//! knobs that shape its behaviour. Every bridge has a host-agnostic default so
//! that a controller can always be constructed:
//!
//! - `StorageBackend` - defaults to [`NoopStorage`] (nothing persisted)
//! - `PlatformEnvironment` - defaults to [`HeadlessEnvironment`]
//!
//! When the `desktop-shims` feature is enabled and a storage path is given,
//! a `SqliteStorage` from `bridge-desktop` is injected instead of
//! `NoopStorage`.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::ControllerConfig;
//!
//! let config = ControllerConfig::builder()
//!     .sdk_version("4.2.0")
//!     .hotkeys(false)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.sdk_version, "4.2.0");
//! assert!(!config.hotkeys);
//! assert!(config.persist.enabled);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::{ControllerConfig, PersistConfig};
//!
//! ControllerConfig::builder()
//!     .persist(PersistConfig { enabled: true, version: 0 })
//!     .build()
//!     .expect("version 0 is rejected");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HeadlessEnvironment, NoopStorage, PlatformEnvironment, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

/// Persisted envelope schema version written by this release.
pub const PERSIST_VERSION: u32 = 1;

/// Persistence settings for the controller's whitelisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistConfig {
    /// Rehydrate on creation and write back on change
    pub enabled: bool,
    /// Envelope version; payloads with any other version are ignored
    pub version: u32,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version: PERSIST_VERSION,
        }
    }
}

impl PersistConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Configuration shared by the player and broadcast controllers.
#[derive(Clone)]
pub struct ControllerConfig {
    /// SDK version reported in the device snapshot
    pub sdk_version: String,
    pub storage: Arc<dyn StorageBackend>,
    pub environment: Arc<dyn PlatformEnvironment>,
    /// Attach keyboard shortcuts when binding an element
    pub hotkeys: bool,
    pub persist: PersistConfig,
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("sdk_version", &self.sdk_version)
            .field("storage", &"StorageBackend { ... }")
            .field("environment", &"PlatformEnvironment { ... }")
            .field("hotkeys", &self.hotkeys)
            .field("persist", &self.persist)
            .finish()
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            storage: Arc::new(NoopStorage),
            environment: Arc::new(HeadlessEnvironment),
            hotkeys: true,
            persist: PersistConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.sdk_version.trim().is_empty() {
            return Err(Error::Config(
                "SDK version must not be empty. Use .sdk_version() to set it.".to_string(),
            ));
        }

        if self.persist.version < 1 {
            return Err(Error::Config(format!(
                "Persist version must be at least 1, got {}",
                self.persist.version
            )));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_storage(path: Option<PathBuf>) -> Result<Arc<dyn StorageBackend>> {
    use bridge_desktop::SqliteStorage;

    let Some(path) = path.or_else(SqliteStorage::default_path) else {
        return Err(Error::CapabilityMissing {
            capability: "StorageBackend".to_string(),
            message: "No storage path was given and the platform data directory is unknown. \
                      Use .storage_path() or inject a StorageBackend with .storage()."
                .to_string(),
        });
    };

    let storage: Arc<dyn StorageBackend> = Arc::new(SqliteStorage::new(path));
    Ok(storage)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_storage(path: Option<PathBuf>) -> Result<Arc<dyn StorageBackend>> {
    if path.is_some() {
        return Err(Error::CapabilityMissing {
            capability: "StorageBackend".to_string(),
            message: "A storage path was given but no file-backed storage is compiled in. \
                      Desktop: enable the 'desktop-shims' feature to use SqliteStorage. \
                      Web: inject bridge-wasm's WebStorage with .storage()."
                .to_string(),
        });
    }

    let storage: Arc<dyn StorageBackend> = Arc::new(NoopStorage);
    Ok(storage)
}

/// Builder for [`ControllerConfig`].
#[derive(Default)]
pub struct ControllerConfigBuilder {
    sdk_version: Option<String>,
    storage: Option<Arc<dyn StorageBackend>>,
    storage_path: Option<PathBuf>,
    environment: Option<Arc<dyn PlatformEnvironment>>,
    hotkeys: Option<bool>,
    persist: Option<PersistConfig>,
}

impl ControllerConfigBuilder {
    pub fn sdk_version(mut self, version: impl Into<String>) -> Self {
        self.sdk_version = Some(version.into());
        self
    }

    /// Inject a storage backend. Takes precedence over [`Self::storage_path`].
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Database file for the desktop default storage.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn environment(mut self, environment: Arc<dyn PlatformEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn hotkeys(mut self, enabled: bool) -> Self {
        self.hotkeys = Some(enabled);
        self
    }

    pub fn persist(mut self, persist: PersistConfig) -> Self {
        self.persist = Some(persist);
        self
    }

    pub fn build(self) -> Result<ControllerConfig> {
        let defaults = ControllerConfig::default();
        let persist = self.persist.unwrap_or(defaults.persist);

        let storage = match self.storage {
            Some(storage) => storage,
            None if !persist.enabled => defaults.storage,
            None if cfg!(feature = "desktop-shims") || self.storage_path.is_some() => {
                provide_default_storage(self.storage_path)?
            }
            None => defaults.storage,
        };

        let config = ControllerConfig {
            sdk_version: self.sdk_version.unwrap_or(defaults.sdk_version),
            storage,
            environment: self.environment.unwrap_or(defaults.environment),
            hotkeys: self.hotkeys.unwrap_or(defaults.hotkeys),
            persist,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::MemoryStorage;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::builder().build().unwrap();

        assert_eq!(config.sdk_version, env!("CARGO_PKG_VERSION"));
        assert!(config.hotkeys);
        assert_eq!(config.persist, PersistConfig::default());
        assert_eq!(config.persist.version, 1);
        assert_eq!(config.environment.user_agent(), None);
    }

    #[test]
    fn test_empty_sdk_version_rejected() {
        let err = ControllerConfig::builder().sdk_version("  ").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("SDK version")));
    }

    #[test]
    fn test_zero_persist_version_rejected() {
        let err = ControllerConfig::builder()
            .persist(PersistConfig {
                enabled: true,
                version: 0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_injected_storage_is_used() {
        let storage = Arc::new(MemoryStorage::new());
        let config = ControllerConfig::builder()
            .storage(storage.clone())
            .build()
            .unwrap();

        config.storage.set_item("k", "v").await.unwrap();
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_disabled_persistence_ignores_storage_path() {
        let config = ControllerConfig::builder()
            .persist(PersistConfig::disabled())
            .storage_path("/nonexistent/controller.db")
            .build()
            .unwrap();
        assert!(!config.persist.enabled);
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_storage_path_without_shims_is_capability_error() {
        let err = ControllerConfig::builder()
            .storage_path("/tmp/controller.db")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "StorageBackend"));
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_desktop_default_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("core-runtime-test-{}", std::process::id()));
        let path = dir.join("controller.db");

        let config = ControllerConfig::builder()
            .storage_path(&path)
            .build()
            .expect("desktop default storage");

        config.storage.set_item("volume", "0.4").await.unwrap();
        let value = config.storage.get_item("volume").await.unwrap();
        assert_eq!(value.as_deref(), Some("0.4"));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
