//! # Media Player Controller
//!
//! State and controls for playback of a resolved [`MediaSource`]: play/pause,
//! volume, fullscreen, picture-in-picture and the live flag.
//!
//! Fullscreen and picture-in-picture need the live element, so the controls
//! only record a request. The effect binder performs it and reports back
//! what the element ended up doing through [`MediaControls::set_fullscreen`]
//! and [`MediaControls::set_picture_in_picture`]. Play and pause flip
//! `playing` right away and are confirmed the same way, so a rejected
//! `play()` leaves the player paused.

use bridge_traits::MediaElement;
use core_runtime::ControllerConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::binder::{self, BindableController, ElementEffect};
use crate::device::{self, DeviceSnapshot};
use crate::persist::{self, PersistenceAdapter};
use crate::source::MediaSource;
use crate::store::{Listener, Store, Subscription};
use crate::volume::{self, bounded_volume, VolumeControls, VolumeState, DEFAULT_VOLUME_LEVEL};

/// Storage key of the persisted player envelope.
pub const PLAYER_STORAGE_NAME: &str = "livepeer-media-controller";

/// Milliseconds of inactivity before a host hides its player controls.
pub const DEFAULT_AUTOHIDE_TIME: u64 = 3000;

pub const ARIA_PLAY: &str = "Play (k)";
pub const ARIA_PAUSE: &str = "Pause (k)";
pub const ARIA_MUTE: &str = "Mute (m)";
pub const ARIA_UNMUTE: &str = "Unmute (m)";
pub const ARIA_ENTER_FULLSCREEN: &str = "Full screen (f)";
pub const ARIA_EXIT_FULLSCREEN: &str = "Exit full screen (f)";
pub const ARIA_ENTER_PICTURE_IN_PICTURE: &str = "Mini player (i)";
pub const ARIA_EXIT_PICTURE_IN_PICTURE: &str = "Exit mini player (i)";

/// Props a host passes when creating a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProps {
    pub volume: Option<f64>,
    pub autoplay: Option<bool>,
    pub aspect_ratio: Option<f64>,
    /// Controls autohide delay in milliseconds, `0` disables it
    pub autohide: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPlayerProps {
    pub volume: f64,
    pub autoplay: bool,
    pub aspect_ratio: Option<f64>,
    pub autohide: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AriaText {
    pub play_pause: String,
    pub mute: String,
    pub fullscreen: String,
    pub picture_in_picture: String,
}

impl AriaText {
    fn derive(playing: bool, volume: f64, fullscreen: bool, picture_in_picture: bool) -> Self {
        let pick = |on: bool, yes: &str, no: &str| if on { yes } else { no }.to_string();
        Self {
            play_pause: pick(playing, ARIA_PAUSE, ARIA_PLAY),
            mute: pick(volume == 0.0, ARIA_UNMUTE, ARIA_MUTE),
            fullscreen: pick(fullscreen, ARIA_EXIT_FULLSCREEN, ARIA_ENTER_FULLSCREEN),
            picture_in_picture: pick(
                picture_in_picture,
                ARIA_EXIT_PICTURE_IN_PICTURE,
                ARIA_ENTER_PICTURE_IN_PICTURE,
            ),
        }
    }
}

/// Internal control bookkeeping of the player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerControls {
    pub volume: VolumeControls,
    /// Bumped on every play/pause toggle
    pub play_requests: u64,
    /// Bumped on every fullscreen toggle request
    pub fullscreen_requests: u64,
    /// Bumped on every picture-in-picture toggle request
    pub picture_in_picture_requests: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInternals {
    pub initial_props: InitialPlayerProps,
    pub device: Arc<DeviceSnapshot>,
    pub controls: PlayerControls,
}

/// Player controller snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaControllerState {
    pub aria: AriaText,
    pub playing: bool,
    /// Observed volume, `0` while muted
    pub volume: f64,
    pub fullscreen: bool,
    pub picture_in_picture: bool,
    pub live: bool,
    pub source: Option<MediaSource>,
    internals: PlayerInternals,
}

/// Player state without internal fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaControllerCallbackState {
    pub aria: AriaText,
    pub playing: bool,
    pub volume: f64,
    pub fullscreen: bool,
    pub picture_in_picture: bool,
    pub live: bool,
    pub source: Option<MediaSource>,
}

impl MediaControllerState {
    pub fn new(device: DeviceSnapshot, props: PlayerProps) -> Self {
        let initial_props = InitialPlayerProps {
            volume: bounded_volume(props.volume.unwrap_or(DEFAULT_VOLUME_LEVEL)),
            autoplay: props.autoplay.unwrap_or(false),
            aspect_ratio: props.aspect_ratio,
            autohide: props.autohide.unwrap_or(DEFAULT_AUTOHIDE_TIME),
        };
        let controls = PlayerControls {
            volume: VolumeControls::new(initial_props.volume),
            ..Default::default()
        };

        Self {
            aria: AriaText::derive(false, initial_props.volume, false, false),
            playing: false,
            volume: initial_props.volume,
            fullscreen: false,
            picture_in_picture: false,
            live: false,
            source: None,
            internals: PlayerInternals {
                initial_props,
                device: Arc::new(device),
                controls,
            },
        }
    }

    pub fn initial_props(&self) -> &InitialPlayerProps {
        &self.internals.initial_props
    }

    pub fn device(&self) -> &DeviceSnapshot {
        &self.internals.device
    }

    pub fn controls(&self) -> PlayerControls {
        self.internals.controls
    }

    pub fn is_muted(&self) -> bool {
        self.volume == 0.0
    }

    pub fn sanitize(&self) -> MediaControllerCallbackState {
        MediaControllerCallbackState {
            aria: self.aria.clone(),
            playing: self.playing,
            volume: self.volume,
            fullscreen: self.fullscreen,
            picture_in_picture: self.picture_in_picture,
            live: self.live,
            source: self.source.clone(),
        }
    }

    fn with_aria(mut self) -> Self {
        self.aria = AriaText::derive(
            self.playing,
            self.volume,
            self.fullscreen,
            self.picture_in_picture,
        );
        self
    }
}

impl VolumeState for MediaControllerState {
    fn volume(&self) -> f64 {
        self.volume
    }

    fn volume_controls(&self) -> VolumeControls {
        self.internals.controls.volume
    }

    fn with_volume(&self, volume: f64, controls: VolumeControls) -> Self {
        let mut next = self.clone();
        next.volume = volume;
        next.internals.controls.volume = controls;
        next.with_aria()
    }
}

pub fn sanitize_media_controller_state(state: &MediaControllerState) -> MediaControllerCallbackState {
    state.sanitize()
}

/// Commands that mutate a player controller.
pub trait MediaControls {
    fn toggle_play(&self);

    fn request_volume(&self, volume: f64);

    fn set_volume(&self, volume: f64);

    fn request_toggle_mute(&self);

    /// Ask the bound element to enter or leave fullscreen.
    fn request_toggle_fullscreen(&self);

    /// Ask the bound element to enter or leave picture-in-picture.
    fn request_toggle_picture_in_picture(&self);

    /// Record the element's actual fullscreen state.
    fn set_fullscreen(&self, fullscreen: bool);

    /// Record the element's actual picture-in-picture state.
    fn set_picture_in_picture(&self, picture_in_picture: bool);

    /// Record the element's actual playback state.
    fn set_playing(&self, playing: bool);

    fn set_live(&self, live: bool);

    fn set_source(&self, source: Option<MediaSource>);
}

/// Player controller store.
#[derive(Clone)]
pub struct MediaControllerStore {
    store: Store<MediaControllerState>,
    writer: Option<Arc<Subscription>>,
}

impl MediaControllerStore {
    pub fn new(device: DeviceSnapshot, props: PlayerProps) -> Self {
        Self {
            store: Store::new(MediaControllerState::new(device, props)),
            writer: None,
        }
    }

    /// Probe the device, rehydrate the persisted volume and keep it in sync.
    pub async fn create(config: &ControllerConfig, props: PlayerProps) -> Self {
        let device = device::probe(config.environment.as_ref(), &config.sdk_version);
        let mut state = MediaControllerState::new(device, props);

        let adapter = config.persist.enabled.then(|| {
            PersistenceAdapter::new(
                Arc::clone(&config.storage),
                PLAYER_STORAGE_NAME,
                config.persist.version,
            )
        });

        if let Some(adapter) = &adapter {
            if let Some(persisted) = adapter.load().await {
                state = volume::rehydrate(&state, persisted.volume);
                debug!(volume = state.volume, "Rehydrated player volume");
            }
        }

        let store = Store::new(state);
        let writer = adapter
            .and_then(|adapter| persist::attach_writer(&store, adapter))
            .map(Arc::new);
        Self { store, writer }
    }

    pub fn is_persisting(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| w.is_active())
    }

    /// Stop writing volume changes back. Writes already queued still land.
    pub fn stop_persisting(&self) -> bool {
        self.writer.as_ref().is_some_and(|w| w.unsubscribe())
    }

    pub fn get_state(&self) -> Arc<MediaControllerState> {
        self.store.get_state()
    }

    pub fn subscribe(&self, listener: Listener<MediaControllerState>) -> Subscription {
        self.store.subscribe(listener)
    }

    /// Subscribe with sanitized snapshots only.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn subscribe_sanitized<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MediaControllerCallbackState) + Send + Sync + 'static,
    {
        self.store.subscribe(Arc::new(
            move |current: &MediaControllerState, _: &MediaControllerState| {
                callback(&current.sanitize())
            },
        ))
    }

    /// Subscribe with sanitized snapshots only.
    #[cfg(target_arch = "wasm32")]
    pub fn subscribe_sanitized<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MediaControllerCallbackState) + 'static,
    {
        self.store.subscribe(Arc::new(
            move |current: &MediaControllerState, _: &MediaControllerState| {
                callback(&current.sanitize())
            },
        ))
    }

    fn transition<F>(&self, change: F)
    where
        F: FnOnce(&mut MediaControllerState),
    {
        self.store.update(|state| {
            let mut next = state.clone();
            change(&mut next);
            next.with_aria()
        });
    }
}

impl MediaControls for MediaControllerStore {
    fn toggle_play(&self) {
        self.transition(|state| {
            state.playing = !state.playing;
            state.internals.controls.play_requests += 1;
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

    fn request_toggle_fullscreen(&self) {
        self.transition(|state| state.internals.controls.fullscreen_requests += 1);
    }

    fn request_toggle_picture_in_picture(&self) {
        self.transition(|state| state.internals.controls.picture_in_picture_requests += 1);
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.store.try_update(|state| {
            (state.fullscreen != fullscreen).then(|| {
                let mut next = state.clone();
                next.fullscreen = fullscreen;
                next.with_aria()
            })
        });
    }

    fn set_picture_in_picture(&self, picture_in_picture: bool) {
        self.store.try_update(|state| {
            (state.picture_in_picture != picture_in_picture).then(|| {
                let mut next = state.clone();
                next.picture_in_picture = picture_in_picture;
                next.with_aria()
            })
        });
    }

    fn set_playing(&self, playing: bool) {
        self.store.try_update(|state| {
            (state.playing != playing).then(|| {
                let mut next = state.clone();
                next.playing = playing;
                next.with_aria()
            })
        });
    }

    fn set_live(&self, live: bool) {
        self.transition(|state| state.live = live);
    }

    fn set_source(&self, source: Option<MediaSource>) {
        self.transition(|state| state.source = source);
    }
}

impl BindableController for MediaControllerStore {
    type State = MediaControllerState;

    const LABEL: &'static str = "player";

    fn store(&self) -> &Store<MediaControllerState> {
        &self.store
    }

    fn effects(current: &MediaControllerState, previous: &MediaControllerState) -> Vec<ElementEffect> {
        let mut effects = binder::volume_effects(current, previous);

        let (now, before) = (current.controls(), previous.controls());
        // confirmations from the element change `playing` without a request
        if now.play_requests != before.play_requests {
            effects.push(if current.playing {
                ElementEffect::Play
            } else {
                ElementEffect::Pause
            });
        }
        if now.fullscreen_requests != before.fullscreen_requests {
            effects.push(ElementEffect::ToggleFullscreen);
        }
        if now.picture_in_picture_requests != before.picture_in_picture_requests {
            effects.push(ElementEffect::TogglePictureInPicture);
        }

        effects
    }

    fn handle_hotkey(&self, code: &str) -> bool {
        match code {
            "Space" | "KeyK" => self.toggle_play(),
            "KeyM" => self.request_toggle_mute(),
            "KeyF" => self.request_toggle_fullscreen(),
            "KeyI" => self.request_toggle_picture_in_picture(),
            _ => return false,
        }
        true
    }

    fn effect_applied(&self, effect: ElementEffect, element: &dyn MediaElement) {
        match effect {
            ElementEffect::Play => self.set_playing(true),
            ElementEffect::Pause => self.set_playing(false),
            ElementEffect::ToggleFullscreen => self.set_fullscreen(element.is_fullscreen()),
            ElementEffect::TogglePictureInPicture => {
                self.set_picture_in_picture(element.is_picture_in_picture())
            }
            _ => {}
        }
    }

    fn effect_failed(&self, effect: ElementEffect, element: &dyn MediaElement) {
        match effect {
            ElementEffect::Play => {
                debug!("play() rejected, reverting to paused");
                self.set_playing(false);
            }
            ElementEffect::ToggleFullscreen => self.set_fullscreen(element.is_fullscreen()),
            ElementEffect::TogglePictureInPicture => {
                self.set_picture_in_picture(element.is_picture_in_picture())
            }
            _ => {}
        }
    }

    fn bound(&self) {
        let state = self.get_state();
        if state.initial_props().autoplay && !state.playing {
            debug!("Autoplay requested");
            self.toggle_play();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::resolve;

    fn player() -> MediaControllerStore {
        MediaControllerStore::new(DeviceSnapshot::headless("test"), PlayerProps::default())
    }

    #[test]
    fn test_initial_aria() {
        let state = player().get_state();
        assert_eq!(state.aria.play_pause, ARIA_PLAY);
        assert_eq!(state.aria.mute, ARIA_MUTE);
        assert_eq!(state.initial_props().autohide, DEFAULT_AUTOHIDE_TIME);
        assert_eq!(state.aria.fullscreen, ARIA_ENTER_FULLSCREEN);
        assert_eq!(state.aria.picture_in_picture, ARIA_ENTER_PICTURE_IN_PICTURE);
    }

    #[test]
    fn test_aria_follows_state() {
        let player = player();
        player.toggle_play();
        player.request_toggle_mute();
        player.set_fullscreen(true);
        player.set_picture_in_picture(true);

        let aria = player.get_state().aria.clone();
        assert_eq!(aria.play_pause, ARIA_PAUSE);
        assert_eq!(aria.mute, ARIA_UNMUTE);
        assert_eq!(aria.fullscreen, ARIA_EXIT_FULLSCREEN);
        assert_eq!(aria.picture_in_picture, ARIA_EXIT_PICTURE_IN_PICTURE);
    }

    #[test]
    fn test_fullscreen_request_becomes_effect() {
        let player = player();
        let before = player.get_state();
        player.request_toggle_fullscreen();
        let after = player.get_state();

        // the request alone does not flip the flag
        assert!(!after.fullscreen);
        assert_eq!(
            MediaControllerStore::effects(&after, &before),
            vec![ElementEffect::ToggleFullscreen]
        );

        player.set_fullscreen(true);
        let entered = player.get_state();
        assert!(MediaControllerStore::effects(&entered, &after).is_empty());
        player.request_toggle_fullscreen();
        assert_eq!(
            MediaControllerStore::effects(&player.get_state(), &entered),
            vec![ElementEffect::ToggleFullscreen]
        );
    }

    #[test]
    fn test_set_fullscreen_same_value_is_silent() {
        let player = player();
        let sub_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&sub_calls);
        let _sub = player.subscribe_sanitized(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        player.set_fullscreen(false);
        player.set_picture_in_picture(false);
        assert_eq!(sub_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_play_pause_effects() {
        let player = player();
        let before = player.get_state();
        player.toggle_play();
        let playing = player.get_state();
        assert_eq!(MediaControllerStore::effects(&playing, &before), vec![ElementEffect::Play]);

        player.toggle_play();
        assert_eq!(
            MediaControllerStore::effects(&player.get_state(), &playing),
            vec![ElementEffect::Pause]
        );
    }

    #[test]
    fn test_set_playing_emits_no_effect() {
        let player = player();
        player.toggle_play();
        let playing = player.get_state();

        player.set_playing(false);
        let reverted = player.get_state();
        assert!(!reverted.playing);
        assert_eq!(reverted.aria.play_pause, ARIA_PLAY);
        assert!(MediaControllerStore::effects(&reverted, &playing).is_empty());
    }

    #[test]
    fn test_set_volume_clamps() {
        let player = player();
        player.set_volume(2.0);
        assert_eq!(player.get_state().volume, 1.0);
        player.set_volume(-1.0);
        assert_eq!(player.get_state().volume, 0.0);
    }

    #[test]
    fn test_hotkeys() {
        let player = player();
        assert!(player.handle_hotkey("KeyK"));
        assert!(player.get_state().playing);
        assert!(player.handle_hotkey("KeyM"));
        assert!(player.get_state().is_muted());
        assert!(player.handle_hotkey("KeyF"));
        assert_eq!(player.get_state().controls().fullscreen_requests, 1);
        assert!(player.handle_hotkey("KeyI"));
        assert_eq!(player.get_state().controls().picture_in_picture_requests, 1);
        assert!(!player.handle_hotkey("KeyB"));
    }

    #[test]
    fn test_sanitize_keeps_source() {
        let player = player();
        player.set_source(resolve(Some("https://x.com/video.m3u8"), None));
        player.set_live(true);

        let sanitized = player.get_state().sanitize();
        assert!(sanitized.live);
        assert_eq!(sanitized.source.unwrap().src, "https://x.com/video.m3u8");

        let json = serde_json::to_value(player.get_state().sanitize()).unwrap();
        assert!(json.get("initialProps").is_none());
        assert!(json.get("pictureInPicture").is_some());
    }
}
