//! # Host Bridge Traits
//!
//! Capabilities the media controller core needs from its host, expressed as
//! traits so that the same core runs in a browser (via `bridge-wasm`), in a
//! native shell (via `bridge-desktop`) and in tests.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaElement`](media::MediaElement) - The live media element the effect binder drives
//! - [`KeyEventTarget`](media::KeyEventTarget) - Where keyboard shortcuts are attached
//!
//! ### Environment & Data
//! - [`PlatformEnvironment`](environment::PlatformEnvironment) - Feature detection inputs for the device probe
//! - [`StorageBackend`](storage::StorageBackend) - Key-value storage for persisted controller state
//! - [`PlaybackInfoProvider`](provider::PlaybackInfoProvider) - Playback ID to server sources
//!
//! ### Utilities
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Host-agnostic defaults
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`NoopStorage`](storage::NoopStorage) | Persistence disabled |
//! | [`MemoryStorage`](storage::MemoryStorage) | Process-local storage |
//! | [`HeadlessEnvironment`](environment::HeadlessEnvironment) | No browser APIs |
//! | [`ConsoleLogger`](logger::ConsoleLogger) | stdout log sink |
//!
//! ## Thread Safety
//!
//! On native targets every bridge is `Send + Sync`. On `wasm32` the bounds are
//! dropped (see [`platform`]) because `web_sys` handles are single-threaded.

pub mod environment;
pub mod error;
pub mod logger;
pub mod media;
pub mod platform;
pub mod provider;
pub mod storage;

pub use error::BridgeError;

pub use environment::{HeadlessEnvironment, PlatformEnvironment};
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{KeyEventTarget, KeyListener, KeyboardEvent, ListenerHandle, MediaElement};
pub use provider::{PlaybackInfo, PlaybackInfoProvider, PlaybackMeta, PlaybackSourceInfo};
pub use storage::{MemoryStorage, NoopStorage, StorageBackend};
