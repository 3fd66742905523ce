//! # Media Controller Core
//!
//! Host-independent state machines for a media player and a WebRTC
//! broadcaster.
//!
//! ## Overview
//!
//! - [`source`] turns a URL or playback info into typed [`MediaSource`]s
//! - [`device`] snapshots what the host can do
//! - [`store`] is the reactive state container both controllers build on
//! - [`player`] and [`broadcast`] hold the controller state and controls
//! - [`binder`] applies state changes to a live [`MediaElement`](bridge_traits::MediaElement)
//!   through a serial [`queue`]
//! - [`persist`] keeps the volume across sessions
//!
//! ## Example
//!
//! ```no_run
//! use bridge_traits::MediaElement;
//! use core_media::{bind, BinderOptions, BroadcastControls, BroadcastProps, BroadcastStore};
//! use core_runtime::ControllerConfig;
//! use std::sync::Arc;
//!
//! # async fn run(element: Arc<dyn MediaElement>) -> core_media::Result<()> {
//! let config = ControllerConfig::default();
//! let broadcast = BroadcastStore::create(&config, BroadcastProps::default()).await;
//!
//! let binder = bind(element, broadcast.clone(), BinderOptions::default())?;
//! broadcast.request_toggle_mute();
//! binder.flush().await;
//! binder.destroy();
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod broadcast;
pub mod device;
pub mod error;
pub mod persist;
pub mod player;
pub mod queue;
pub mod source;
pub mod store;
pub mod volume;

pub use binder::{bind, BindableController, BinderOptions, EffectBinder, ElementEffect};
pub use broadcast::{
    sanitize_broadcast_state, BroadcastCallbackState, BroadcastControls, BroadcastProps,
    BroadcastState, BroadcastStore, DeviceIds, MediaStreamHandle,
};
pub use device::DeviceSnapshot;
pub use error::{MediaError, Result};
pub use persist::{PersistedState, PersistenceAdapter};
pub use player::{
    sanitize_media_controller_state, MediaControllerCallbackState, MediaControllerState,
    MediaControllerStore, MediaControls, PlayerProps, DEFAULT_AUTOHIDE_TIME,
};
pub use queue::SerialQueue;
pub use source::{MediaSource, SourceKind};
pub use store::{Listener, Store, Subscription};
pub use volume::{bounded_volume, VolumeControls, VolumeState};
