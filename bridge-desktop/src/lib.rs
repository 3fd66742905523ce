//! # Desktop Bridge Implementations
//!
//! Native implementations of bridge traits for desktop hosts (macOS,
//! Windows, Linux).
//!
//! ## Overview
//!
//! - `StorageBackend` using a SQLite key-value table ([`SqliteStorage`])
//!
//! Native shells have no DOM, so there is no media element or environment
//! bridge here: they either embed a web view (and use `bridge-wasm` inside
//! it) or implement `MediaElement` over their own player.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::SqliteStorage;
//! use core_runtime::ControllerConfig;
//! use std::sync::Arc;
//!
//! let storage = SqliteStorage::default_path()
//!     .map(SqliteStorage::new)
//!     .unwrap_or_else(SqliteStorage::in_memory);
//!
//! let config = ControllerConfig::builder()
//!     .storage(Arc::new(storage))
//!     .build()?;
//! ```

mod storage;

pub use storage::SqliteStorage;
