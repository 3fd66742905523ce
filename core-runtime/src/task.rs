//! Task spawning across targets.
//!
//! - Native: spawns onto the ambient Tokio runtime. There is no implicit
//!   runtime; calling [`spawn`] outside one reports a missing capability
//!   instead of panicking.
//! - WASM: spawns onto the browser event loop via `spawn_local`, which never
//!   fails and does not require `Send`.

use crate::error::Result;
use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
use crate::error::Error;

/// Spawn a detached background task.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<F>(future: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::CapabilityMissing {
        capability: "AsyncRuntime".to_string(),
        message: "No Tokio runtime is running on this thread. \
                  Create controller bindings from within a Tokio context."
            .to_string(),
    })?;
    handle.spawn(future);
    Ok(())
}

/// Spawn a detached background task.
#[cfg(target_arch = "wasm32")]
pub fn spawn<F>(future: F) -> Result<()>
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
    Ok(())
}
