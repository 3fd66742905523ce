//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the media controller crates:
//! - Logging and tracing setup
//! - Controller configuration
//! - Platform task spawning
//!
//! Nothing in here knows about media state. `core-media` builds on these
//! pieces, and host shells use them to configure the SDK.

pub mod config;
pub mod error;
pub mod logging;
pub mod task;

pub use config::{ControllerConfig, ControllerConfigBuilder, PersistConfig};
pub use error::{Error, Result};
