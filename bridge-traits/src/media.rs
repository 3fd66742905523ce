//! Media element and key-event bridge traits.
//!
//! The core never owns the live media element: the embedding UI creates it,
//! hands a bridge to the effect binder and destroys it again. These traits are
//! the narrow surface the binder needs from that element (volume, mute,
//! play/pause, fullscreen, picture-in-picture) plus the event target that
//! receives keyboard shortcuts.
//!
//! Mutating methods take `&self`. DOM handles are reference types, so hosts
//! implement them with interior mutability rather than exclusive borrows.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::Result, platform::PlatformSendSync};

/// A `keyup` event delivered to a [`KeyListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// Physical key code as reported by the host (`"KeyM"`, `"Space"`, ...).
    pub code: String,
}

impl KeyboardEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Callback invoked for each key event.
///
/// Returns `true` when the key was handled, in which case the host should
/// stop default handling and propagation.
#[cfg(not(target_arch = "wasm32"))]
pub type KeyListener = Arc<dyn Fn(&KeyboardEvent) -> bool + Send + Sync>;

/// Callback invoked for each key event.
#[cfg(target_arch = "wasm32")]
pub type KeyListener = Arc<dyn Fn(&KeyboardEvent) -> bool>;

/// Opaque handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(Uuid);

impl ListenerHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListenerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something keyboard listeners can be attached to.
///
/// On the web this is the media element's parent node (or the element itself
/// when it is detached).
pub trait KeyEventTarget: PlatformSendSync {
    /// Register a `keyup` listener.
    fn add_keyup_listener(&self, listener: KeyListener) -> Result<ListenerHandle>;

    /// Remove a listener.
    ///
    /// Returns `Ok(false)` when the handle is unknown (already removed), which
    /// lets callers tear down more than once.
    fn remove_keyup_listener(&self, handle: ListenerHandle) -> Result<bool>;

    /// Set an attribute on the target (used for `tabindex`).
    fn set_attribute(&self, name: &str, value: &str) -> Result<()>;
}

/// Live media element bridge.
///
/// Mutations are async because some hosts (fullscreen, picture-in-picture,
/// `play()`) resolve them through promises. The effect binder awaits each call
/// before issuing the next one.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::MediaElement;
///
/// async fn silence(element: &dyn MediaElement) -> Result<()> {
///     element.set_muted(true).await?;
///     element.set_volume(0.0).await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaElement: PlatformSendSync {
    /// Assign the element volume (already clamped to `[0, 1]` by the caller).
    async fn set_volume(&self, volume: f64) -> Result<()>;

    /// Assign the element `muted` flag.
    async fn set_muted(&self, muted: bool) -> Result<()>;

    /// Start playback.
    async fn play(&self) -> Result<()>;

    /// Pause playback.
    async fn pause(&self) -> Result<()>;

    /// Reset the element and start selecting a source.
    fn load(&self) -> Result<()>;

    /// Enter fullscreen for the element (or its container).
    async fn request_fullscreen(&self) -> Result<()>;

    /// Leave fullscreen.
    async fn exit_fullscreen(&self) -> Result<()>;

    /// Whether the element is currently displayed fullscreen.
    fn is_fullscreen(&self) -> bool;

    /// Enter picture-in-picture.
    async fn request_picture_in_picture(&self) -> Result<()>;

    /// Leave picture-in-picture.
    async fn exit_picture_in_picture(&self) -> Result<()>;

    /// Whether the element is currently shown picture-in-picture.
    fn is_picture_in_picture(&self) -> bool;

    /// Target for keyboard shortcuts: the parent when attached, otherwise the
    /// element itself.
    fn key_target(&self) -> Arc<dyn KeyEventTarget>;
}
