//! Playback info provider backed by the browser's `fetch` API.
//!
//! Issues `GET {base_url}/playback/{id}` and decodes the JSON body into
//! [`PlaybackInfo`]. Requests can be bounded with a timeout, enforced through
//! an `AbortController`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    provider::{PlaybackInfo, PlaybackInfoProvider},
};
use futures::{
    future::{select, Either},
    pin_mut, FutureExt,
};
use gloo_timers::future::TimeoutFuture;
use std::time::Duration;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Request, RequestInit, RequestMode, Response, Window};

use crate::error::{js_error, WasmError};

/// Default public API origin of the streaming platform.
pub const DEFAULT_API_URL: &str = "https://livepeer.studio/api";

/// [`PlaybackInfoProvider`] using `window.fetch`.
pub struct FetchPlaybackInfoProvider {
    window: Window,
    base_url: String,
    timeout: Option<Duration>,
}

impl FetchPlaybackInfoProvider {
    /// Provider for the default API origin.
    pub fn new() -> BridgeResult<Self> {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Provider for a custom API origin (self-hosted gateways, tests).
    pub fn with_base_url(base_url: impl Into<String>) -> BridgeResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".to_string()))?;
        Ok(Self {
            window,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        })
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// URL queried for `playback_id`.
    pub fn playback_url(&self, playback_id: &str) -> String {
        format!("{}/playback/{}", self.base_url, playback_id)
    }

    async fn fetch(&self, request: &Request, controller: Option<AbortController>) -> BridgeResult<Response> {
        let fetch = JsFuture::from(self.window.fetch_with_request(request));

        let result = match (self.timeout, controller) {
            (Some(timeout), Some(controller)) => {
                let timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;
                let timeout_fut = TimeoutFuture::new(timeout_ms).map(|_| ());
                pin_mut!(timeout_fut);
                pin_mut!(fetch);

                match select(fetch, timeout_fut).await {
                    Either::Left((response, _)) => response,
                    Either::Right((_, pending_fetch)) => {
                        controller.abort();
                        // poll once more so the abort is observed
                        let _ = pending_fetch.await;
                        return Err(WasmError::Timeout(timeout_ms).into());
                    }
                }
            }
            _ => fetch.await,
        };

        result
            .map_err(|err| js_error("fetch", err))?
            .dyn_into::<Response>()
            .map_err(|_| BridgeError::OperationFailed("fetch returned non-Response".into()))
    }
}

#[async_trait(?Send)]
impl PlaybackInfoProvider for FetchPlaybackInfoProvider {
    async fn get_playback_info(&self, playback_id: &str) -> BridgeResult<PlaybackInfo> {
        let controller = match self.timeout {
            Some(_) => Some(AbortController::new().map_err(|err| js_error("AbortController", err))?),
            None => None,
        };

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_mode(RequestMode::Cors);
        if let Some(controller) = &controller {
            init.set_signal(Some(&controller.signal()));
        }

        let url = self.playback_url(playback_id);
        let request = Request::new_with_str_and_init(&url, &init)
            .map_err(|err| js_error("build request", err))?;

        let response = self.fetch(&request, controller).await?;
        if !response.ok() {
            return Err(BridgeError::OperationFailed(format!(
                "playback info for {playback_id} returned HTTP {}",
                response.status()
            )));
        }

        let text = JsFuture::from(response.text().map_err(|err| js_error("response.text", err))?)
            .await
            .map_err(|err| js_error("response body", err))?
            .as_string()
            .unwrap_or_default();

        let info: PlaybackInfo = serde_json::from_str(&text)?;
        debug!(playback_id, sources = info.meta.source.len(), "Fetched playback info");
        Ok(info)
    }
}
