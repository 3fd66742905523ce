//! # Broadcast Controller
//!
//! State and controls for an in-browser WebRTC (WHIP) broadcast: whether the
//! broadcast is live or in preview, whether video is on, which capture
//! devices are selected and the monitor volume.
//!
//! The observable fields live on [`BroadcastState`]; bookkeeping that must
//! never reach external callbacks (initial props, device snapshot, volume
//! controls) sits in [`BroadcastInternals`] and is stripped by
//! [`BroadcastState::sanitize`].

use core_runtime::ControllerConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::binder::{self, BindableController, ElementEffect};
use crate::device::{self, DeviceSnapshot};
use crate::persist::{self, PersistenceAdapter};
use crate::store::{Store, Subscription};
use crate::volume::{self, bounded_volume, VolumeControls, VolumeState, DEFAULT_VOLUME_LEVEL};

/// WHIP ingest endpoint used when none is configured.
pub const DEFAULT_INGEST_URL: &str = "https://playback.livepeer.studio/webrtc";

/// Storage key of the persisted broadcast envelope.
pub const BROADCAST_STORAGE_NAME: &str = "livepeer-broadcast-controller";

pub const ARIA_START_BROADCAST: &str = "Start broadcasting (b)";
pub const ARIA_STOP_BROADCAST: &str = "Stop broadcasting (b)";
pub const ARIA_VIDEO_OFF: &str = "Turn video off (v)";
pub const ARIA_VIDEO_ON: &str = "Turn video on (v)";

/// Props a host passes when creating a broadcast. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastProps {
    pub aspect_ratio: Option<f64>,
    pub stream_key: Option<String>,
    pub ingest_url: Option<String>,
    pub creator_id: Option<String>,
    pub volume: Option<f64>,
}

/// Props after defaults were applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialBroadcastProps {
    pub aspect_ratio: Option<f64>,
    pub stream_key: Option<String>,
    pub ingest_url: String,
    pub creator_id: Option<String>,
    pub volume: f64,
}

impl InitialBroadcastProps {
    fn from_props(props: BroadcastProps) -> Self {
        Self {
            aspect_ratio: props.aspect_ratio,
            stream_key: props.stream_key,
            ingest_url: props
                .ingest_url
                .unwrap_or_else(|| DEFAULT_INGEST_URL.to_string()),
            creator_id: props.creator_id,
            volume: bounded_volume(props.volume.unwrap_or(DEFAULT_VOLUME_LEVEL)),
        }
    }
}

/// Selected capture devices. Ids are opaque host strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl DeviceIds {
    pub fn audio(id: impl Into<String>) -> Self {
        Self {
            audio: Some(id.into()),
            video: None,
        }
    }

    pub fn video(id: impl Into<String>) -> Self {
        Self {
            audio: None,
            video: Some(id.into()),
        }
    }

    /// Overlay the ids present in `update`; missing ones are kept.
    pub fn merged(&self, update: &DeviceIds) -> DeviceIds {
        DeviceIds {
            audio: update.audio.clone().or_else(|| self.audio.clone()),
            video: update.video.clone().or_else(|| self.video.clone()),
        }
    }
}

/// Opaque reference to the host's current capture stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamHandle {
    pub id: String,
}

impl MediaStreamHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastAriaText {
    pub start: String,
    pub video_trigger: String,
}

impl BroadcastAriaText {
    fn derive(enabled: bool, video: Option<bool>) -> Self {
        Self {
            start: if enabled {
                ARIA_STOP_BROADCAST
            } else {
                ARIA_START_BROADCAST
            }
            .to_string(),
            // unknown video state reads as "on"
            video_trigger: if video == Some(false) {
                ARIA_VIDEO_ON
            } else {
                ARIA_VIDEO_OFF
            }
            .to_string(),
        }
    }
}

/// Internal-only part of the broadcast state.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastInternals {
    pub initial_props: InitialBroadcastProps,
    pub device: Arc<DeviceSnapshot>,
    pub controls: VolumeControls,
}

/// Broadcast controller snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastState {
    pub aria: BroadcastAriaText,
    /// `None` until a capture stream was reported
    pub device_ids: Option<DeviceIds>,
    /// Live (`true`) or preview (`false`)
    pub enabled: bool,
    /// `None` until video was toggled or a video device was selected
    pub video: Option<bool>,
    /// Observed volume, `0` while muted
    pub volume: f64,
    pub media_stream: Option<MediaStreamHandle>,
    internals: BroadcastInternals,
}

/// Broadcast state without internal fields, safe to hand to callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastCallbackState {
    pub aria: BroadcastAriaText,
    pub device_ids: Option<DeviceIds>,
    pub enabled: bool,
    pub video: Option<bool>,
    pub volume: f64,
}

impl BroadcastState {
    pub fn new(device: DeviceSnapshot, props: BroadcastProps) -> Self {
        let initial_props = InitialBroadcastProps::from_props(props);
        let controls = VolumeControls::new(initial_props.volume);

        Self {
            aria: BroadcastAriaText::derive(false, None),
            device_ids: None,
            enabled: false,
            video: None,
            volume: initial_props.volume,
            media_stream: None,
            internals: BroadcastInternals {
                initial_props,
                device: Arc::new(device),
                controls,
            },
        }
    }

    pub fn initial_props(&self) -> &InitialBroadcastProps {
        &self.internals.initial_props
    }

    pub fn device(&self) -> &DeviceSnapshot {
        &self.internals.device
    }

    pub fn controls(&self) -> VolumeControls {
        self.internals.controls
    }

    /// Whether the observed volume is silent.
    pub fn is_muted(&self) -> bool {
        self.volume == 0.0
    }

    pub fn sanitize(&self) -> BroadcastCallbackState {
        BroadcastCallbackState {
            aria: self.aria.clone(),
            device_ids: self.device_ids.clone(),
            enabled: self.enabled,
            video: self.video,
            volume: self.volume,
        }
    }

    fn with_aria(mut self) -> Self {
        self.aria = BroadcastAriaText::derive(self.enabled, self.video);
        self
    }
}

impl VolumeState for BroadcastState {
    fn volume(&self) -> f64 {
        self.volume
    }

    fn volume_controls(&self) -> VolumeControls {
        self.internals.controls
    }

    fn with_volume(&self, volume: f64, controls: VolumeControls) -> Self {
        let mut next = self.clone();
        next.volume = volume;
        next.internals.controls = controls;
        next
    }
}

/// Project a broadcast state for external callbacks.
pub fn sanitize_broadcast_state(state: &BroadcastState) -> BroadcastCallbackState {
    state.sanitize()
}

/// Commands that mutate a broadcast controller.
pub trait BroadcastControls {
    /// Record a new capture stream; ids missing from `ids` keep their value.
    fn update_media_stream(&self, stream: MediaStreamHandle, ids: Option<DeviceIds>);

    fn toggle_video(&self);

    fn request_volume(&self, volume: f64);

    fn set_volume(&self, volume: f64);

    fn request_toggle_mute(&self);

    fn toggle_enabled(&self);
}

/// Broadcast controller store.
#[derive(Clone)]
pub struct BroadcastStore {
    store: Store<BroadcastState>,
    writer: Option<Arc<Subscription>>,
}

impl BroadcastStore {
    /// Store without persistence.
    pub fn new(device: DeviceSnapshot, props: BroadcastProps) -> Self {
        Self::from_state(BroadcastState::new(device, props))
    }

    /// Probe the device, rehydrate the persisted volume and start writing it
    /// back. The returned store already reflects the persisted volume.
    pub async fn create(config: &ControllerConfig, props: BroadcastProps) -> Self {
        let device = device::probe(config.environment.as_ref(), &config.sdk_version);
        let mut state = BroadcastState::new(device, props);

        if !config.persist.enabled {
            return Self::from_state(state);
        }

        let adapter = PersistenceAdapter::new(
            Arc::clone(&config.storage),
            BROADCAST_STORAGE_NAME,
            config.persist.version,
        );
        if let Some(persisted) = adapter.load().await {
            state = volume::rehydrate(&state, persisted.volume);
            debug!(volume = state.volume, "Rehydrated broadcast volume");
        }

        let mut broadcast = Self::from_state(state);
        broadcast.writer = persist::attach_writer(&broadcast.store, adapter).map(Arc::new);
        broadcast
    }

    fn from_state(state: BroadcastState) -> Self {
        Self {
            store: Store::new(state),
            writer: None,
        }
    }

    /// Whether volume changes are still written back to storage.
    pub fn is_persisting(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| w.is_active())
    }

    /// Stop writing volume changes back. Writes already queued still land.
    ///
    /// Applies to every clone of this store. Returns `false` if nothing was
    /// being persisted.
    pub fn stop_persisting(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| w.unsubscribe())
    }

    pub fn get_state(&self) -> Arc<BroadcastState> {
        self.store.get_state()
    }

    pub fn subscribe(
        &self,
        listener: crate::store::Listener<BroadcastState>,
    ) -> Subscription {
        self.store.subscribe(listener)
    }

    /// Subscribe with sanitized snapshots only.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn subscribe_sanitized<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&BroadcastCallbackState) + Send + Sync + 'static,
    {
        self.store
            .subscribe(Arc::new(move |current: &BroadcastState, _: &BroadcastState| {
                callback(&current.sanitize())
            }))
    }

    /// Subscribe with sanitized snapshots only.
    #[cfg(target_arch = "wasm32")]
    pub fn subscribe_sanitized<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&BroadcastCallbackState) + 'static,
    {
        self.store
            .subscribe(Arc::new(move |current: &BroadcastState, _: &BroadcastState| {
                callback(&current.sanitize())
            }))
    }
}

impl BroadcastControls for BroadcastStore {
    fn update_media_stream(&self, stream: MediaStreamHandle, ids: Option<DeviceIds>) {
        self.store.update(|state| {
            let mut next = state.clone();
            next.media_stream = Some(stream);
            if let Some(ids) = ids {
                if ids.video.is_some() {
                    next.video = Some(true);
                }
                let current = state.device_ids.clone().unwrap_or_default();
                next.device_ids = Some(current.merged(&ids));
            }
            next.with_aria()
        });
    }

    fn toggle_video(&self) {
        self.store.update(|state| {
            let mut next = state.clone();
            next.video = Some(!state.video.unwrap_or(false));
            next.with_aria()
        });
    }

    fn request_volume(&self, volume: f64) {
        self.store.update(|state| volume::request_volume(state, volume));
    }

    fn set_volume(&self, volume: f64) {
        self.store.update(|state| volume::set_volume(state, volume));
    }

    fn request_toggle_mute(&self) {
        if !self.store.try_update(volume::toggle_mute) {
            debug!("Toggle mute ignored: nothing to restore");
        }
    }

    fn toggle_enabled(&self) {
        self.store.update(|state| {
            let mut next = state.clone();
            next.enabled = !state.enabled;
            next.with_aria()
        });
    }
}

impl BindableController for BroadcastStore {
    type State = BroadcastState;

    const LABEL: &'static str = "broadcast";

    fn store(&self) -> &Store<BroadcastState> {
        &self.store
    }

    fn effects(current: &BroadcastState, previous: &BroadcastState) -> Vec<ElementEffect> {
        binder::volume_effects(current, previous)
    }

    fn handle_hotkey(&self, code: &str) -> bool {
        match code {
            "Space" | "KeyL" => self.request_toggle_mute(),
            "KeyV" => self.toggle_video(),
            "KeyB" => self.toggle_enabled(),
            _ => return false,
        }
        true
    }
}
