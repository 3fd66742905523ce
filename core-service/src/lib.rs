//! Core service façade and bootstrap helpers.
//!
//! [`MediaSdk`] wires a [`ControllerConfig`] (storage, environment, hotkeys,
//! persistence) into controller construction and element binding, so hosts
//! deal with one handle instead of threading the config through every call.
//! Desktop apps typically enable the `desktop-shims` feature (SQLite-backed
//! persistence from `bridge-desktop`), whereas WebAssembly builds enable the
//! `wasm` feature and use the adapters from `bridge-wasm`.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{MediaElement, PlaybackInfoProvider};
use core_media::{
    source, BindableController, BinderOptions, BroadcastProps, BroadcastStore, EffectBinder,
    MediaControllerStore, MediaControls, MediaSource, PlayerProps,
};
use core_runtime::ControllerConfig;
use tracing::{debug, info};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct MediaSdk {
    config: Arc<ControllerConfig>,
    provider: Option<Arc<dyn PlaybackInfoProvider>>,
}

impl MediaSdk {
    /// Create an SDK handle. The config is validated again so hand-built
    /// configs get the same checks as builder output.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        info!(
            sdk_version = %config.sdk_version,
            hotkeys = config.hotkeys,
            persist = config.persist.enabled,
            "Media SDK initialized"
        );
        Ok(Self {
            config: Arc::new(config),
            provider: None,
        })
    }

    /// Attach the provider used by [`Self::resolve_playback_info`].
    pub fn with_provider(mut self, provider: Arc<dyn PlaybackInfoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Broadcast controller with the persisted volume already applied.
    pub async fn create_broadcast(&self, props: BroadcastProps) -> BroadcastStore {
        BroadcastStore::create(&self.config, props).await
    }

    /// Player controller with the persisted volume already applied.
    pub async fn create_player(&self, props: PlayerProps) -> MediaControllerStore {
        MediaControllerStore::create(&self.config, props).await
    }

    /// Player controller whose source is resolved from `src`.
    ///
    /// An unrecognised `src` leaves the source empty; the player is still
    /// returned.
    pub async fn create_player_for(&self, src: &str, props: PlayerProps) -> MediaControllerStore {
        let player = self.create_player(props).await;
        let resolved = source::resolve(Some(src), None);
        if resolved.is_none() {
            debug!(src = core_runtime::logging::redact_url(src), "Unrecognised player source");
        }
        player.set_source(resolved);
        player
    }

    /// Bind a controller to a live element, with hotkeys as configured.
    pub fn bind<C: BindableController>(
        &self,
        element: Arc<dyn MediaElement>,
        controller: C,
    ) -> Result<EffectBinder> {
        let options = BinderOptions {
            hotkeys: self.config.hotkeys,
        };
        Ok(core_media::bind(element, controller, options)?)
    }

    /// Typed source for a URL, `None` when the kind is not recognised.
    pub fn resolve_source(&self, src: &str) -> Option<MediaSource> {
        source::resolve(Some(src), None)
    }

    /// Fetch and resolve the server sources of a playback ID.
    pub async fn resolve_playback_info(&self, playback_id: &str) -> Result<Vec<MediaSource>> {
        let provider = self.provider.as_ref().ok_or_else(|| CoreError::CapabilityMissing {
            capability: "PlaybackInfoProvider".to_string(),
            message: "Attach a provider with MediaSdk::with_provider()".to_string(),
        })?;

        Ok(source::resolve_playback_info(provider.as_ref(), playback_id).await?)
    }
}

/// Bootstrapper for desktop hosts: SQLite persistence in the platform data
/// directory, headless environment.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # fn example() -> core_service::Result<()> {
/// let sdk = core_service::bootstrap_desktop()?;
/// assert!(sdk.config().persist.enabled);
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn bootstrap_desktop() -> Result<MediaSdk> {
    let config = ControllerConfig::builder().build()?;
    MediaSdk::new(config)
}

/// Convenience bootstrapper for WebAssembly hosts.
///
/// ```
/// # #[cfg(feature = "wasm")]
/// # fn example() -> core_service::Result<()> {
/// let sdk = core_service::bootstrap_wasm()?;
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub fn bootstrap_wasm() -> Result<MediaSdk> {
    use bridge_wasm::{BrowserEnvironment, FetchPlaybackInfoProvider, WebStorage};

    bridge_wasm::install_panic_hook();

    let storage = WebStorage::new().map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let environment =
        BrowserEnvironment::new().map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let provider = FetchPlaybackInfoProvider::new()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    let config = ControllerConfig::builder()
        .storage(Arc::new(storage))
        .environment(Arc::new(environment))
        .build()?;

    Ok(MediaSdk::new(config)?.with_provider(Arc::new(provider)))
}
