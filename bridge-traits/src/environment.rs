//! Platform Environment Abstraction
//!
//! Exposes the raw runtime facts the device capability probe needs. Each
//! query is independent and fallible: a host that lacks the underlying API
//! answers with [`BridgeError::NotAvailable`](crate::error::BridgeError) and
//! the probe treats that as "unsupported".

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};

/// Host environment queried once per controller store.
///
/// # Platform Support
///
/// - **Web**: `navigator`, `document`, `window` feature detection
///   (`bridge-wasm::BrowserEnvironment`)
/// - **Native / tests**: [`HeadlessEnvironment`]
pub trait PlatformEnvironment: PlatformSendSync {
    /// The user-agent string, `None` outside a browser-like host.
    fn user_agent(&self) -> Option<String>;

    /// `navigator.maxTouchPoints`
    fn max_touch_points(&self) -> Result<u32>;

    /// Whether the document allows fullscreen requests.
    fn fullscreen_enabled(&self) -> Result<bool>;

    /// Whether the document allows picture-in-picture requests.
    fn picture_in_picture_enabled(&self) -> Result<bool>;

    /// Whether `RTCPeerConnection` (or a vendor-prefixed variant) exists.
    fn peer_connection_available(&self) -> Result<bool>;

    /// Whether Media Source Extensions are available.
    fn media_source_available(&self) -> Result<bool>;

    /// Whether a media element reports it can play `mime` natively.
    fn can_play_type(&self, mime: &str) -> Result<bool>;
}

/// Environment with no browser APIs at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessEnvironment;

impl HeadlessEnvironment {
    fn missing<T>(api: &str) -> Result<T> {
        Err(BridgeError::NotAvailable(format!(
            "{api} is not available in a headless environment"
        )))
    }
}

impl PlatformEnvironment for HeadlessEnvironment {
    fn user_agent(&self) -> Option<String> {
        None
    }

    fn max_touch_points(&self) -> Result<u32> {
        Self::missing("navigator.maxTouchPoints")
    }

    fn fullscreen_enabled(&self) -> Result<bool> {
        Self::missing("document.fullscreenEnabled")
    }

    fn picture_in_picture_enabled(&self) -> Result<bool> {
        Self::missing("document.pictureInPictureEnabled")
    }

    fn peer_connection_available(&self) -> Result<bool> {
        Self::missing("RTCPeerConnection")
    }

    fn media_source_available(&self) -> Result<bool> {
        Self::missing("MediaSource")
    }

    fn can_play_type(&self, _mime: &str) -> Result<bool> {
        Self::missing("HTMLMediaElement.canPlayType")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_environment_reports_nothing() {
        let env = HeadlessEnvironment;
        assert!(env.user_agent().is_none());
        assert!(env.fullscreen_enabled().unwrap_err().is_not_available());
        assert!(env.can_play_type("video/mp4").is_err());
    }
}
