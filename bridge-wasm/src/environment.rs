//! Browser feature detection for the device probe.

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    environment::PlatformEnvironment,
};
use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlMediaElement, Window};

use crate::error::js_error;

/// [`PlatformEnvironment`] reading `navigator`, `document` and `window`.
pub struct BrowserEnvironment {
    window: Window,
    document: Document,
}

impl BrowserEnvironment {
    /// Bind to the current window.
    pub fn new() -> BridgeResult<Self> {
        let window = web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| BridgeError::NotAvailable("document".into()))?;
        Ok(Self { window, document })
    }

    fn has_global(&self, name: &str) -> BridgeResult<bool> {
        Reflect::has(&self.window, &JsValue::from_str(name))
            .map_err(|err| js_error(&format!("window.{name}"), err))
    }
}

impl PlatformEnvironment for BrowserEnvironment {
    fn user_agent(&self) -> Option<String> {
        self.window.navigator().user_agent().ok()
    }

    fn max_touch_points(&self) -> BridgeResult<u32> {
        Ok(self.window.navigator().max_touch_points().max(0) as u32)
    }

    fn fullscreen_enabled(&self) -> BridgeResult<bool> {
        Ok(self.document.fullscreen_enabled())
    }

    fn picture_in_picture_enabled(&self) -> BridgeResult<bool> {
        let enabled = Reflect::get(&self.document, &JsValue::from_str("pictureInPictureEnabled"))
            .map_err(|err| js_error("document.pictureInPictureEnabled", err))?;
        Ok(enabled.as_bool().unwrap_or(false))
    }

    fn peer_connection_available(&self) -> BridgeResult<bool> {
        Ok(self.has_global("RTCPeerConnection")?
            || self.has_global("webkitRTCPeerConnection")?)
    }

    fn media_source_available(&self) -> BridgeResult<bool> {
        Ok(self.has_global("MediaSource")? || self.has_global("ManagedMediaSource")?)
    }

    fn can_play_type(&self, mime: &str) -> BridgeResult<bool> {
        let probe: HtmlMediaElement = self
            .document
            .create_element("video")
            .map_err(|err| js_error("createElement(video)", err))?
            .dyn_into()
            .map_err(|_| BridgeError::OperationFailed("video is not a media element".into()))?;

        // "", "maybe" or "probably"
        Ok(!probe.can_play_type(mime).is_empty())
    }
}
