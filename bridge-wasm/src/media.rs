//! `HTMLMediaElement` implementation of the media element bridge.
//!
//! Fullscreen is requested on the element's container so custom controls stay
//! visible; iOS Safari only supports native video fullscreen, which is used as
//! a fallback. Picture-in-picture is not in the stable `web-sys` surface and
//! goes through `Reflect`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    media::{KeyEventTarget, KeyListener, KeyboardEvent, ListenerHandle, MediaElement},
};
use js_sys::{Function, Promise, Reflect};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlMediaElement};

use crate::error::{js_error, js_message};

const KEYUP: &str = "keyup";

/// Call `target[method]()` and await the result when it is a promise.
async fn call_method(target: &JsValue, method: &str) -> BridgeResult<JsValue> {
    let function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(|err| js_error(method, err))?
        .dyn_into::<Function>()
        .map_err(|_| BridgeError::NotAvailable(method.to_string()))?;

    let result = function
        .call0(target)
        .map_err(|err| BridgeError::Element(format!("{method}: {}", js_message(&err))))?;

    match result.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise)
            .await
            .map_err(|err| BridgeError::Element(format!("{method}: {}", js_message(&err)))),
        Err(value) => Ok(value),
    }
}

fn has_method(target: &JsValue, method: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(method))
        .map(|value| value.is_function())
        .unwrap_or(false)
}

fn is_present(target: &JsValue, property: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(property))
        .map(|value| !value.is_null() && !value.is_undefined())
        .unwrap_or(false)
}

// ============================================================================
// Key target
// ============================================================================

type KeyClosure = Closure<dyn FnMut(web_sys::KeyboardEvent)>;

/// DOM element receiving `keyup` shortcuts.
pub struct DomKeyTarget {
    target: Element,
    listeners: RefCell<HashMap<ListenerHandle, KeyClosure>>,
}

impl DomKeyTarget {
    /// Wrap an element.
    pub fn new(target: Element) -> Self {
        Self {
            target,
            listeners: RefCell::new(HashMap::new()),
        }
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl KeyEventTarget for DomKeyTarget {
    fn add_keyup_listener(&self, listener: KeyListener) -> BridgeResult<ListenerHandle> {
        let closure: KeyClosure = Closure::wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            if listener(&KeyboardEvent::new(event.code())) {
                event.prevent_default();
                event.stop_propagation();
            }
        }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

        self.target
            .add_event_listener_with_callback(KEYUP, closure.as_ref().unchecked_ref())
            .map_err(|err| js_error("addEventListener", err))?;

        let handle = ListenerHandle::new();
        self.listeners.borrow_mut().insert(handle, closure);
        Ok(handle)
    }

    fn remove_keyup_listener(&self, handle: ListenerHandle) -> BridgeResult<bool> {
        let Some(closure) = self.listeners.borrow_mut().remove(&handle) else {
            return Ok(false);
        };

        self.target
            .remove_event_listener_with_callback(KEYUP, closure.as_ref().unchecked_ref())
            .map_err(|err| js_error("removeEventListener", err))?;
        Ok(true)
    }

    fn set_attribute(&self, name: &str, value: &str) -> BridgeResult<()> {
        self.target
            .set_attribute(name, value)
            .map_err(|err| js_error("setAttribute", err))
    }
}

impl Drop for DomKeyTarget {
    fn drop(&mut self) {
        for (_, closure) in self.listeners.borrow_mut().drain() {
            let _ = self
                .target
                .remove_event_listener_with_callback(KEYUP, closure.as_ref().unchecked_ref());
        }
    }
}

// ============================================================================
// Media element
// ============================================================================

/// [`MediaElement`] over an `<audio>` or `<video>` element.
pub struct HtmlMediaElementBridge {
    element: HtmlMediaElement,
    document: Document,
    key_target: Arc<DomKeyTarget>,
}

impl HtmlMediaElementBridge {
    /// Wrap an element. Shortcuts attach to its parent, or to the element
    /// itself while it is detached.
    pub fn new(element: HtmlMediaElement) -> BridgeResult<Self> {
        let document = element
            .owner_document()
            .ok_or_else(|| BridgeError::NotAvailable("document".into()))?;
        let target: Element = element
            .parent_element()
            .unwrap_or_else(|| element.clone().unchecked_into());

        #[allow(clippy::arc_with_non_send_sync)]
        let key_target = Arc::new(DomKeyTarget::new(target));

        Ok(Self {
            element,
            document,
            key_target,
        })
    }

    /// The wrapped element.
    pub fn element(&self) -> &HtmlMediaElement {
        &self.element
    }

    fn container(&self) -> Element {
        self.element
            .parent_element()
            .unwrap_or_else(|| self.element.clone().unchecked_into())
    }
}

#[async_trait(?Send)]
impl MediaElement for HtmlMediaElementBridge {
    async fn set_volume(&self, volume: f64) -> BridgeResult<()> {
        self.element.set_volume(volume);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> BridgeResult<()> {
        self.element.set_muted(muted);
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let promise = self
            .element
            .play()
            .map_err(|err| BridgeError::Element(format!("play: {}", js_message(&err))))?;
        // rejected when autoplay is blocked
        JsFuture::from(promise)
            .await
            .map_err(|err| BridgeError::Element(format!("play: {}", js_message(&err))))?;
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.element
            .pause()
            .map_err(|err| BridgeError::Element(format!("pause: {}", js_message(&err))))
    }

    fn load(&self) -> BridgeResult<()> {
        self.element.load();
        Ok(())
    }

    async fn request_fullscreen(&self) -> BridgeResult<()> {
        if self.document.fullscreen_enabled() {
            let container: JsValue = self.container().into();
            call_method(&container, "requestFullscreen").await?;
            return Ok(());
        }

        if has_method(self.element.as_ref(), "webkitEnterFullscreen") {
            debug!("Falling back to native video fullscreen");
            call_method(self.element.as_ref(), "webkitEnterFullscreen").await?;
            return Ok(());
        }

        Err(BridgeError::NotAvailable("fullscreen".into()))
    }

    async fn exit_fullscreen(&self) -> BridgeResult<()> {
        if self.document.fullscreen_element().is_some() {
            call_method(self.document.as_ref(), "exitFullscreen").await?;
        } else if has_method(self.element.as_ref(), "webkitExitFullscreen") {
            call_method(self.element.as_ref(), "webkitExitFullscreen").await?;
        }
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.document.fullscreen_element().is_some()
            || Reflect::get(self.element.as_ref(), &JsValue::from_str("webkitDisplayingFullscreen"))
                .map(|value| value.is_truthy())
                .unwrap_or(false)
    }

    async fn request_picture_in_picture(&self) -> BridgeResult<()> {
        call_method(self.element.as_ref(), "requestPictureInPicture").await?;
        Ok(())
    }

    async fn exit_picture_in_picture(&self) -> BridgeResult<()> {
        if self.is_picture_in_picture() {
            call_method(self.document.as_ref(), "exitPictureInPicture").await?;
        }
        Ok(())
    }

    fn is_picture_in_picture(&self) -> bool {
        is_present(self.document.as_ref(), "pictureInPictureElement")
    }

    fn key_target(&self) -> Arc<dyn KeyEventTarget> {
        self.key_target.clone()
    }
}
