//! WebAssembly Bridge Implementations
//!
//! Browser implementations of the traits defined in `bridge-traits`, built on
//! `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to nothing on native targets.
//!
//! # Implementations
//!
//! - [`WebStorage`]: `localStorage`-backed `StorageBackend`
//! - [`BrowserEnvironment`]: `navigator`/`document` feature detection
//! - [`HtmlMediaElementBridge`]: `<audio>`/`<video>` element plus [`DomKeyTarget`]
//! - [`FetchPlaybackInfoProvider`]: playback info over `fetch`
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{BrowserEnvironment, HtmlMediaElementBridge, WebStorage};
//! use core_runtime::ControllerConfig;
//! use std::sync::Arc;
//!
//! let config = ControllerConfig::builder()
//!     .storage(Arc::new(WebStorage::new()?))
//!     .environment(Arc::new(BrowserEnvironment::new()?))
//!     .build()?;
//! let element = Arc::new(HtmlMediaElementBridge::new(video)?);
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]
#![allow(clippy::arc_with_non_send_sync)]

pub mod environment;
pub mod error;
pub mod media;
pub mod provider;
pub mod storage;

pub use environment::BrowserEnvironment;
pub use error::{WasmError, WasmResult};
pub use media::{DomKeyTarget, HtmlMediaElementBridge};
pub use provider::FetchPlaybackInfoProvider;
pub use storage::WebStorage;

/// Route Rust panics to `console.error`. Safe to call more than once.
pub fn install_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(test)]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);
