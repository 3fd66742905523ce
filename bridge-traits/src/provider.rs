//! Playback info provider bridge.
//!
//! The streaming platform's REST client lives outside the core. The core only
//! needs one call from it: resolve a playback ID into the list of sources the
//! server can deliver, which the source resolver then turns into typed media
//! sources.

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// One server-provided playback source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSourceInfo {
    /// Human readable name (`"HLS (TS)"`, `"WebRTC (H264)"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrn: Option<String>,
    /// Server-side kind hint; informational only, the URL decides the kind.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind_hint: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl PlaybackSourceInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Metadata block of a playback info response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<bool>,
    #[serde(default)]
    pub source: Vec<PlaybackSourceInfo>,
}

/// Playback info response for a stream or asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    /// `"live"`, `"vod"`, ... as reported by the server.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub meta: PlaybackMeta,
}

impl PlaybackInfo {
    pub fn from_sources(sources: Vec<PlaybackSourceInfo>) -> Self {
        Self {
            kind: None,
            meta: PlaybackMeta {
                live: None,
                source: sources,
            },
        }
    }
}

/// Provider capability consumed by the source resolver's batch mode.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlaybackInfoProvider: PlatformSendSync {
    /// Fetch playback info for a playback ID.
    async fn get_playback_info(&self, playback_id: &str) -> Result<PlaybackInfo>;
}
