//! # Media Controller Error Types
//!
//! Most failures in the controller core never surface as errors: unresolvable
//! sources are `None`, failed probes read as "unsupported", and effect or
//! persistence failures are logged and dropped. What remains here is misuse at
//! construction time and the errors bridges hand back to callers that ask for
//! them directly.

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    /// `bind` was called on a binder that is still bound.
    #[error("Effect binder is already bound to an element; call destroy() first")]
    AlreadyBound,

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl MediaError {
    /// Whether the error comes from a host bridge rather than the core.
    pub fn is_bridge_error(&self) -> bool {
        matches!(self, MediaError::Bridge(_))
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;
