//! # Source Resolver
//!
//! Maps a source string to a typed [`MediaSource`]: which pipeline should
//! play it (HLS, WebRTC, progressive video/audio, image), its MIME type and
//! optional display size.
//!
//! Detection is pattern based and ordered; the first matching rule wins:
//!
//! 1. WebRTC / SDP signalling URLs
//! 2. HLS manifests (`.m3u8`)
//! 3. Progressive video extensions
//! 4. Audio extensions
//! 5. Base64 `data:video` URIs (played as video)
//! 6. Image extensions
//!
//! Anything else resolves to `None`. Resolution is pure and cheap enough to
//! run on every render.

use bridge_traits::{PlaybackInfo, PlaybackInfoProvider};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::Result;

/// MIME type reported for WebRTC sources.
pub const WEBRTC_MIME: &str = "video/h264";

/// MIME type assumed for base64 video without a parseable header.
pub const DEFAULT_BASE64_MIME: &str = "video/mp4";

mod patterns {
    use super::{LazyLock, Regex};

    pub static WEBRTC: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(webrtc|sdp)").expect("Invalid webrtc regex"));

    pub static HLS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\.(m3u8)($|\?)").expect("Invalid hls regex"));

    pub static VIDEO: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\.(mp4|ogv|webm|mov|m4v|avi|m3u8)($|\?)").expect("Invalid video regex")
    });

    pub static AUDIO: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\.(m4a|mp4a|mpga|mp2|mp2a|mp3|m2a|m3a|wav|weba|aac|oga|spx)($|\?)")
            .expect("Invalid audio regex")
    });

    pub static BASE64_VIDEO: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)data:video").expect("Invalid base64 regex"));

    pub static BASE64_MIME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"data:(.+?);base64").expect("Invalid base64 mime regex"));

    pub static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\.(jpg|jpeg|png|gif|bmp|webp)($|\?)").expect("Invalid image regex")
    });
}

/// Playback pipeline a source is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Audio,
    Video,
    Hls,
    #[serde(rename = "webrtc")]
    WebRtc,
    Image,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Audio => "audio",
            SourceKind::Video => "video",
            SourceKind::Hls => "hls",
            SourceKind::WebRtc => "webrtc",
            SourceKind::Image => "image",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit display size for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSize {
    pub width: u32,
    pub height: u32,
}

impl ElementSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A resolved media source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub src: String,
    pub mime: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaSource {
    /// Whether the source came from an inline base64 data URI.
    pub fn is_base64(&self) -> bool {
        self.kind == SourceKind::Video && patterns::BASE64_VIDEO.is_match(&self.src)
    }

    pub fn size(&self) -> Option<ElementSize> {
        Some(ElementSize::new(self.width?, self.height?))
    }
}

/// MIME type for a file extension, matched case-insensitively.
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "m3u8" => "application/vnd.apple.mpegurl",
        "mp4" => "video/mp4",
        "ogv" => "video/ogg",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        "avi" => "video/x-msvideo",
        "m4a" | "mp4a" => "audio/mp4",
        "mpga" | "mp2" | "mp2a" | "mp3" | "m2a" | "m3a" => "audio/mpeg",
        "wav" => "audio/wav",
        "weba" => "audio/webm",
        "aac" => "audio/aac",
        "oga" | "spx" => "audio/ogg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mime)
}

fn extension_mime(pattern: &Regex, src: &str) -> Option<String> {
    pattern
        .captures(src)
        .and_then(|caps| caps.get(1))
        .and_then(|ext| mime_type_for_extension(ext.as_str()))
        .map(str::to_string)
}

/// Resolve a source string into a [`MediaSource`].
///
/// `None` and empty input resolve to `None`, as does any string no rule
/// recognises. When `sizing` is given its dimensions are attached to the
/// source; otherwise width and height stay unset.
///
/// ```
/// use core_media::source::{resolve, SourceKind};
///
/// let hls = resolve(Some("https://x.com/video.m3u8"), None).unwrap();
/// assert_eq!(hls.kind, SourceKind::Hls);
/// assert_eq!(hls.mime.as_deref(), Some("application/vnd.apple.mpegurl"));
///
/// assert!(resolve(Some("not-a-real-path"), None).is_none());
/// ```
pub fn resolve(src: Option<&str>, sizing: Option<ElementSize>) -> Option<MediaSource> {
    let src = src.filter(|s| !s.is_empty())?;

    let (kind, mime) = if patterns::WEBRTC.is_match(src) {
        (SourceKind::WebRtc, Some(WEBRTC_MIME.to_string()))
    } else if patterns::HLS.is_match(src) {
        (SourceKind::Hls, extension_mime(&patterns::HLS, src))
    } else if patterns::VIDEO.is_match(src) {
        (SourceKind::Video, extension_mime(&patterns::VIDEO, src))
    } else if patterns::AUDIO.is_match(src) {
        (SourceKind::Audio, extension_mime(&patterns::AUDIO, src))
    } else if patterns::BASE64_VIDEO.is_match(src) {
        let mime = patterns::BASE64_MIME
            .captures(src)
            .and_then(|caps| caps.get(1))
            .map_or(DEFAULT_BASE64_MIME, |m| m.as_str());
        (SourceKind::Video, Some(mime.to_string()))
    } else if patterns::IMAGE.is_match(src) {
        (SourceKind::Image, extension_mime(&patterns::IMAGE, src))
    } else {
        return None;
    };

    Some(MediaSource {
        kind,
        src: src.to_string(),
        mime,
        width: sizing.map(|s| s.width),
        height: sizing.map(|s| s.height),
    })
}

/// Resolve every server-provided source of a playback info response.
///
/// Sources without a URL or with an unrecognised URL are dropped; the rest
/// keep their relative order. A size is attached only when the server sent
/// both a non-zero width and height. Returns `None` when there is no
/// playback info at all.
pub fn parse_playback_info(info: Option<&PlaybackInfo>) -> Option<Vec<MediaSource>> {
    let info = info?;

    let sources = info
        .meta
        .source
        .iter()
        .filter_map(|source| {
            let sizing = match (source.width, source.height) {
                (Some(width), Some(height)) if width > 0 && height > 0 => {
                    Some(ElementSize::new(width, height))
                }
                _ => None,
            };
            let resolved = resolve(source.url.as_deref(), sizing);
            if resolved.is_none() {
                debug!(
                    hrn = source.hrn.as_deref().unwrap_or_default(),
                    "Dropping unrecognised playback source"
                );
            }
            resolved
        })
        .collect();

    Some(sources)
}

/// Fetch playback info for `playback_id` and resolve its sources.
///
/// Provider failures propagate; an empty result means the server returned no
/// playable source.
pub async fn resolve_playback_info(
    provider: &dyn PlaybackInfoProvider,
    playback_id: &str,
) -> Result<Vec<MediaSource>> {
    let info = provider.get_playback_info(playback_id).await.map_err(|e| {
        warn!(playback_id, error = %e, "Failed to fetch playback info");
        e
    })?;

    let sources = parse_playback_info(Some(&info)).unwrap_or_default();
    debug!(playback_id, count = sources.len(), "Resolved playback sources");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::PlaybackSourceInfo;

    fn kind_of(src: &str) -> Option<SourceKind> {
        resolve(Some(src), None).map(|s| s.kind)
    }

    #[test]
    fn test_empty_input_resolves_to_none() {
        assert_eq!(resolve(None, None), None);
        assert_eq!(resolve(Some(""), None), None);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(kind_of("https://x.com/webrtc/abc"), Some(SourceKind::WebRtc));
        // webrtc beats hls even when the manifest extension is present
        assert_eq!(kind_of("https://x.com/webrtc/index.m3u8"), Some(SourceKind::WebRtc));
        // m3u8 is in the video table too, hls must win
        assert_eq!(kind_of("https://x.com/index.m3u8"), Some(SourceKind::Hls));
        assert_eq!(kind_of("https://x.com/clip.mp4?t=1"), Some(SourceKind::Video));
        assert_eq!(kind_of("https://x.com/song.mp3"), Some(SourceKind::Audio));
        assert_eq!(kind_of("data:video/webm;base64,AAA"), Some(SourceKind::Video));
        assert_eq!(kind_of("https://x.com/photo.PNG"), Some(SourceKind::Image));
        assert_eq!(kind_of("https://x.com/archive.zip"), None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let inputs = [
            "https://x.com/webrtc/abc",
            "https://x.com/index.m3u8",
            "https://x.com/clip.mp4?t=1",
            "data:video/webm;base64,AAA",
            "https://x.com/archive.zip",
        ];
        for src in inputs {
            let size = Some(ElementSize::new(640, 360));
            assert_eq!(resolve(Some(src), size), resolve(Some(src), size), "{src}");
        }
    }

    #[test]
    fn test_extension_must_end_path() {
        assert_eq!(kind_of("https://x.com/clip.mp4.zip"), None);
        assert_eq!(kind_of("https://x.com/clip.mp4?token=1"), Some(SourceKind::Video));
    }

    #[test]
    fn test_mime_types() {
        let webrtc = resolve(Some("https://x.com/webrtc/key"), None).unwrap();
        assert_eq!(webrtc.mime.as_deref(), Some(WEBRTC_MIME));

        let video = resolve(Some("https://x.com/CLIP.MOV"), None).unwrap();
        assert_eq!(video.mime.as_deref(), Some("video/quicktime"));

        let audio = resolve(Some("https://x.com/a.m4a"), None).unwrap();
        assert_eq!(audio.mime.as_deref(), Some("audio/mp4"));

        let image = resolve(Some("https://x.com/a.jpeg"), None).unwrap();
        assert_eq!(image.mime.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_base64_mime() {
        let webm = resolve(Some("data:video/webm;base64,AAA"), None).unwrap();
        assert_eq!(webm.mime.as_deref(), Some("video/webm"));
        assert!(webm.is_base64());

        let bare = resolve(Some("data:video,AAA"), None).unwrap();
        assert_eq!(bare.mime.as_deref(), Some(DEFAULT_BASE64_MIME));
    }

    #[test]
    fn test_sizing_hint() {
        let sized = resolve(Some("https://x.com/a.mp4"), Some(ElementSize::new(1280, 720))).unwrap();
        assert_eq!(sized.width, Some(1280));
        assert_eq!(sized.height, Some(720));
        assert_eq!(sized.size(), Some(ElementSize::new(1280, 720)));

        let unsized_source = resolve(Some("https://x.com/a.mp4"), None).unwrap();
        assert_eq!(unsized_source.width, None);
        assert_eq!(unsized_source.size(), None);
    }

    #[test]
    fn test_parse_playback_info_requires_both_dimensions() {
        let mut half = PlaybackSourceInfo::new("https://x.com/b.mp4");
        half.width = Some(640);

        let info = PlaybackInfo::from_sources(vec![
            PlaybackSourceInfo::new("https://x.com/a.mp4").with_size(1920, 1080),
            half,
        ]);

        let sources = parse_playback_info(Some(&info)).unwrap();
        assert_eq!(sources[0].size(), Some(ElementSize::new(1920, 1080)));
        assert_eq!(sources[1].width, None);
        assert_eq!(sources[1].height, None);
    }

    #[test]
    fn test_parse_playback_info_none() {
        assert_eq!(parse_playback_info(None), None);
        assert_eq!(
            parse_playback_info(Some(&PlaybackInfo::default())),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let source = resolve(Some("https://x.com/webrtc/key"), None).unwrap();
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "webrtc");
        assert_eq!(json["mime"], "video/h264");
    }
}
