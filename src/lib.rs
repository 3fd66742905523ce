//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-media`). Host applications can
//! depend on `media-sdk-workspace`, enable `desktop-shims` or `wasm`, and use
//! the re-exported crates without wiring each one individually.

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_media as media;

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_service as service;
