//! # Device Capability Probe
//!
//! Builds the [`DeviceSnapshot`] a controller store carries for its whole
//! lifetime. Every capability is probed independently through the
//! [`PlatformEnvironment`] bridge; a missing or failing API reads as
//! "unsupported" and never aborts the probe.

use bridge_traits::PlatformEnvironment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// User agent reported when the host has no `navigator`.
pub const UNKNOWN_USER_AGENT: &str = "Node.js or unknown";

const HLS_MIME: &str = "application/vnd.apple.mpegurl";

static ANDROID_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)android").expect("Invalid android regex"));

static IOS_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)iphone|ipad|ipod").expect("Invalid ios regex"));

// iPadOS 13+ reports a desktop Safari user agent
static DESKTOP_SAFARI_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)macintosh").expect("Invalid macintosh regex"));

static MOBILE_UA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)mobi|android|iphone|ipad|ipod|iemobile|opera mini|blackberry")
        .expect("Invalid mobile regex")
});

/// Immutable device information captured once per store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// SDK version string the store was created with
    pub version: String,
    pub is_android: bool,
    pub is_ios: bool,
    pub is_mobile: bool,
    pub user_agent: String,
    pub is_fullscreen_supported: bool,
    #[serde(rename = "isWebRTCSupported")]
    pub is_webrtc_supported: bool,
    pub is_picture_in_picture_supported: bool,
    pub is_hls_supported: bool,
    pub is_volume_change_supported: bool,
}

impl DeviceSnapshot {
    /// Snapshot for a host with no browser APIs at all.
    pub fn headless(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            is_android: false,
            is_ios: false,
            is_mobile: false,
            user_agent: UNKNOWN_USER_AGENT.to_string(),
            is_fullscreen_supported: false,
            is_webrtc_supported: false,
            is_picture_in_picture_supported: false,
            is_hls_supported: false,
            is_volume_change_supported: true,
        }
    }
}

/// Probe the environment. Never fails.
pub fn probe(env: &dyn PlatformEnvironment, version: &str) -> DeviceSnapshot {
    let user_agent = env.user_agent();
    let ua = user_agent.as_deref().unwrap_or_default();
    let touch_points = env.max_touch_points().unwrap_or(0);

    let is_android = ANDROID_UA.is_match(ua);
    let is_ios = IOS_UA.is_match(ua) || (DESKTOP_SAFARI_UA.is_match(ua) && touch_points > 1);
    let is_mobile = is_android || is_ios || MOBILE_UA.is_match(ua);

    let is_hls_supported = env.media_source_available().unwrap_or(false)
        || env.can_play_type(HLS_MIME).unwrap_or(false);

    let snapshot = DeviceSnapshot {
        version: version.to_string(),
        is_android,
        is_ios,
        is_mobile,
        user_agent: user_agent.unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string()),
        is_fullscreen_supported: env.fullscreen_enabled().unwrap_or(false),
        is_webrtc_supported: env.peer_connection_available().unwrap_or(false),
        is_picture_in_picture_supported: env.picture_in_picture_enabled().unwrap_or(false),
        is_hls_supported,
        is_volume_change_supported: true,
    };

    debug!(
        mobile = snapshot.is_mobile,
        webrtc = snapshot.is_webrtc_supported,
        hls = snapshot.is_hls_supported,
        "Probed device capabilities"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result};
    use bridge_traits::HeadlessEnvironment;
    use mockall::mock;

    mock! {
        Env {}

        impl PlatformEnvironment for Env {
            fn user_agent(&self) -> Option<String>;
            fn max_touch_points(&self) -> Result<u32>;
            fn fullscreen_enabled(&self) -> Result<bool>;
            fn picture_in_picture_enabled(&self) -> Result<bool>;
            fn peer_connection_available(&self) -> Result<bool>;
            fn media_source_available(&self) -> Result<bool>;
            fn can_play_type(&self, mime: &str) -> Result<bool>;
        }
    }

    fn browser(ua: &'static str, touch_points: u32) -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_user_agent().return_const(Some(ua.to_string()));
        env.expect_max_touch_points().returning(move || Ok(touch_points));
        env.expect_fullscreen_enabled().returning(|| Ok(true));
        env.expect_picture_in_picture_enabled().returning(|| Ok(true));
        env.expect_peer_connection_available().returning(|| Ok(true));
        env.expect_media_source_available().returning(|| Ok(false));
        env.expect_can_play_type().returning(|mime| Ok(mime == HLS_MIME));
        env
    }

    #[test]
    fn test_headless_probe_matches_headless_snapshot() {
        let snapshot = probe(&HeadlessEnvironment, "4.0.0");
        assert_eq!(snapshot, DeviceSnapshot::headless("4.0.0"));
        assert_eq!(snapshot.user_agent, UNKNOWN_USER_AGENT);
        assert!(snapshot.is_volume_change_supported);
    }

    #[test]
    fn test_iphone() {
        let env = browser(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
            5,
        );
        let snapshot = probe(&env, "4.0.0");
        assert!(snapshot.is_ios);
        assert!(snapshot.is_mobile);
        assert!(!snapshot.is_android);
        assert!(snapshot.is_hls_supported);
    }

    #[test]
    fn test_ipad_with_desktop_user_agent() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15";
        assert!(probe(&browser(ua, 5), "4.0.0").is_ios);
        assert!(!probe(&browser(ua, 0), "4.0.0").is_ios);
    }

    #[test]
    fn test_android() {
        let env = browser(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36",
            5,
        );
        let snapshot = probe(&env, "4.0.0");
        assert!(snapshot.is_android);
        assert!(snapshot.is_mobile);
        assert!(!snapshot.is_ios);
    }

    #[test]
    fn test_failing_apis_read_as_unsupported() {
        let mut env = MockEnv::new();
        env.expect_user_agent()
            .return_const(Some("Mozilla/5.0 (X11; Linux x86_64)".to_string()));
        env.expect_max_touch_points()
            .returning(|| Err(BridgeError::OperationFailed("boom".to_string())));
        env.expect_fullscreen_enabled()
            .returning(|| Err(BridgeError::OperationFailed("boom".to_string())));
        env.expect_picture_in_picture_enabled()
            .returning(|| Err(BridgeError::NotAvailable("pip".to_string())));
        env.expect_peer_connection_available().returning(|| Ok(true));
        env.expect_media_source_available().returning(|| Ok(true));
        env.expect_can_play_type().never();

        let snapshot = probe(&env, "4.0.0");
        assert!(!snapshot.is_fullscreen_supported);
        assert!(!snapshot.is_picture_in_picture_supported);
        assert!(snapshot.is_webrtc_supported);
        assert!(snapshot.is_hls_supported);
        assert!(!snapshot.is_mobile);
    }

    #[test]
    fn test_serializes_with_camel_case_names() {
        let json = serde_json::to_value(DeviceSnapshot::headless("1.0.0")).unwrap();
        assert_eq!(json["isWebRTCSupported"], false);
        assert_eq!(json["isVolumeChangeSupported"], true);
        assert_eq!(json["userAgent"], UNKNOWN_USER_AGENT);
    }
}
