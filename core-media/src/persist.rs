//! # Persistence Adapter
//!
//! Saves the whitelisted part of a controller state (the volume) under a
//! versioned JSON envelope and reads it back when a store is created:
//!
//! ```json
//! { "name": "livepeer-broadcast-controller", "version": 1, "state": { "volume": 0.4 } }
//! ```
//!
//! The envelope is stored under its `name`. Unreadable payloads, a different
//! name or a different version all count as "nothing persisted"; storage
//! failures are logged and never reach the controller.

use bridge_traits::platform::PlatformSendSync;
use bridge_traits::StorageBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MediaError, Result};
use crate::queue::SerialQueue;
use crate::store::{Store, Subscription};
use crate::volume::VolumeState;

/// Whitelisted state projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub volume: f64,
}

/// Stored envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope {
    pub name: String,
    pub version: u32,
    pub state: PersistedState,
}

/// Reads and writes one controller's envelope.
pub struct PersistenceAdapter {
    storage: Arc<dyn StorageBackend>,
    name: String,
    version: u32,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn StorageBackend>, name: impl Into<String>, version: u32) -> Self {
        Self {
            storage,
            name: name.into(),
            version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn encode(&self, state: PersistedState) -> Result<String> {
        let envelope = PersistedEnvelope {
            name: self.name.clone(),
            version: self.version,
            state,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    pub fn decode(&self, raw: &str) -> Result<PersistedState> {
        let envelope: PersistedEnvelope = serde_json::from_str(raw)?;

        if envelope.name != self.name {
            return Err(MediaError::Persistence(format!(
                "envelope name '{}' does not match '{}'",
                envelope.name, self.name
            )));
        }
        if envelope.version != self.version {
            return Err(MediaError::Persistence(format!(
                "envelope version {} does not match {}",
                envelope.version, self.version
            )));
        }

        Ok(envelope.state)
    }

    /// Read the persisted state. Any failure reads as "nothing persisted".
    pub async fn load(&self) -> Option<PersistedState> {
        let raw = match self.storage.get_item(&self.name).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(name = %self.name, error = %e, "Failed to read persisted state");
                return None;
            }
        };

        match self.decode(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(name = %self.name, error = %e, "Ignoring persisted state");
                None
            }
        }
    }

    pub async fn save(&self, state: PersistedState) -> Result<()> {
        let raw = self.encode(state)?;
        self.storage.set_item(&self.name, &raw).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_item(&self.name).await?;
        Ok(())
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish()
    }
}

/// Write the volume back whenever it changes.
///
/// Writes are serialized so the last change always wins. Returns `None`
/// (and persists nothing) when no async runtime is available.
pub fn attach_writer<S>(store: &Store<S>, adapter: PersistenceAdapter) -> Option<Subscription>
where
    S: VolumeState + PlatformSendSync + 'static,
{
    let queue = match SerialQueue::start(format!("persist-{}", adapter.name())) {
        Ok(queue) => queue,
        Err(e) => {
            warn!(name = %adapter.name(), error = %e, "Volume will not be persisted");
            return None;
        }
    };
    let adapter = Arc::new(adapter);

    Some(store.subscribe(Arc::new(move |current: &S, previous: &S| {
        if current.volume() == previous.volume() {
            return;
        }

        let adapter = Arc::clone(&adapter);
        let state = PersistedState {
            volume: current.volume(),
        };
        queue.enqueue(move || async move {
            match adapter.save(state).await {
                Ok(()) => debug!(name = %adapter.name(), volume = state.volume, "Persisted volume"),
                Err(e) => warn!(name = %adapter.name(), error = %e, "Failed to persist volume"),
            }
        });
    })))
}
