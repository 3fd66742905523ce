//! Controller store tests through the public API
//!
//! Covers creation from a [`ControllerConfig`] (probing, rehydration and
//! write-back of the persisted volume) and batch source resolution.

#![cfg(not(target_arch = "wasm32"))]

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    MemoryStorage, PlaybackInfo, PlaybackInfoProvider, PlaybackSourceInfo, StorageBackend,
};
use core_media::broadcast::BROADCAST_STORAGE_NAME;
use core_media::player::PLAYER_STORAGE_NAME;
use core_media::source::{parse_playback_info, resolve_playback_info};
use core_media::{
    BroadcastControls, BroadcastProps, BroadcastStore, MediaControllerStore, MediaControls,
    MediaError, PlayerProps, SourceKind,
};
use core_runtime::config::{ControllerConfig, PersistConfig};
use std::sync::Arc;
use std::time::Duration;

fn config_with(storage: Arc<MemoryStorage>, persist: PersistConfig) -> ControllerConfig {
    ControllerConfig::builder()
        .sdk_version("test")
        .storage(storage)
        .persist(persist)
        .build()
        .unwrap()
}

fn envelope(name: &str, version: u32, volume: f64) -> String {
    serde_json::json!({ "name": name, "version": version, "state": { "volume": volume } })
        .to_string()
}

/// Poll storage until `key` holds a volume matching `expected`.
async fn wait_for_volume(storage: &MemoryStorage, key: &str, expected: f64) -> bool {
    for _ in 0..50 {
        if let Ok(Some(raw)) = storage.get_item(key).await {
            let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
            if json["state"]["volume"].as_f64() == Some(expected) {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_rehydrated_before_first_observation() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(BROADCAST_STORAGE_NAME, &envelope(BROADCAST_STORAGE_NAME, 1, 0.3))
        .await
        .unwrap();

    let broadcast =
        BroadcastStore::create(&config_with(storage, PersistConfig::default()), BroadcastProps::default())
            .await;

    let state = broadcast.get_state();
    assert_eq!(state.volume, 0.3);
    assert!(!state.is_muted());
}

#[tokio::test]
async fn test_rehydrated_zero_can_be_unmuted() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(PLAYER_STORAGE_NAME, &envelope(PLAYER_STORAGE_NAME, 1, 0.0))
        .await
        .unwrap();

    let player = MediaControllerStore::create(
        &config_with(storage, PersistConfig::default()),
        PlayerProps {
            volume: Some(0.6),
            ..Default::default()
        },
    )
    .await;
    assert!(player.get_state().is_muted());

    player.request_toggle_mute();
    assert_eq!(player.get_state().volume, 0.6);
}

#[tokio::test]
async fn test_other_version_is_ignored() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(BROADCAST_STORAGE_NAME, &envelope(BROADCAST_STORAGE_NAME, 2, 0.3))
        .await
        .unwrap();

    let broadcast =
        BroadcastStore::create(&config_with(storage, PersistConfig::default()), BroadcastProps::default())
            .await;
    assert_eq!(broadcast.get_state().volume, 1.0);
}

#[tokio::test]
async fn test_volume_changes_are_written_back() {
    let storage = Arc::new(MemoryStorage::new());
    let broadcast = BroadcastStore::create(
        &config_with(storage.clone(), PersistConfig::default()),
        BroadcastProps::default(),
    )
    .await;

    broadcast.request_volume(0.2);
    broadcast.request_volume(0.45);
    assert!(wait_for_volume(&storage, BROADCAST_STORAGE_NAME, 0.45).await);

    broadcast.request_toggle_mute();
    assert!(wait_for_volume(&storage, BROADCAST_STORAGE_NAME, 0.0).await);
}

#[tokio::test]
async fn test_stop_persisting_detaches_writer() {
    let storage = Arc::new(MemoryStorage::new());
    let player = MediaControllerStore::create(
        &config_with(storage.clone(), PersistConfig::default()),
        PlayerProps::default(),
    )
    .await;
    assert!(player.is_persisting());

    player.request_volume(0.4);
    assert!(wait_for_volume(&storage, PLAYER_STORAGE_NAME, 0.4).await);

    assert!(player.stop_persisting());
    assert!(!player.stop_persisting());
    assert!(!player.is_persisting());

    player.request_volume(0.8);
    tokio::time::sleep(Duration::from_millis(30)).await;
    let raw = storage.get_item(PLAYER_STORAGE_NAME).await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["state"]["volume"].as_f64(), Some(0.4));
}

#[tokio::test]
async fn test_set_volume_is_clamped_and_persisted_bounded() {
    let storage = Arc::new(MemoryStorage::new());
    let broadcast = BroadcastStore::create(
        &config_with(storage.clone(), PersistConfig::default()),
        BroadcastProps::default(),
    )
    .await;

    broadcast.set_volume(-1.0);
    assert_eq!(broadcast.get_state().volume, 0.0);
    assert!(wait_for_volume(&storage, BROADCAST_STORAGE_NAME, 0.0).await);

    broadcast.set_volume(2.0);
    assert_eq!(broadcast.get_state().volume, 1.0);
    assert!(wait_for_volume(&storage, BROADCAST_STORAGE_NAME, 1.0).await);
}

#[tokio::test]
async fn test_player_and_broadcast_keep_separate_keys() {
    let storage = Arc::new(MemoryStorage::new());
    let config = config_with(storage.clone(), PersistConfig::default());

    let player = MediaControllerStore::create(&config, PlayerProps::default()).await;
    let broadcast = BroadcastStore::create(&config, BroadcastProps::default()).await;

    player.request_volume(0.9);
    broadcast.request_volume(0.1);

    assert!(wait_for_volume(&storage, PLAYER_STORAGE_NAME, 0.9).await);
    assert!(wait_for_volume(&storage, BROADCAST_STORAGE_NAME, 0.1).await);
}

#[tokio::test]
async fn test_persistence_disabled() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(PLAYER_STORAGE_NAME, &envelope(PLAYER_STORAGE_NAME, 1, 0.3))
        .await
        .unwrap();

    let player =
        MediaControllerStore::create(&config_with(storage.clone(), PersistConfig::disabled()), PlayerProps::default())
            .await;
    assert_eq!(player.get_state().volume, 1.0);

    player.request_volume(0.5);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let raw = storage.get_item(PLAYER_STORAGE_NAME).await.unwrap().unwrap();
    assert_eq!(raw, envelope(PLAYER_STORAGE_NAME, 1, 0.3));
}

#[tokio::test]
async fn test_headless_config_probes_unknown_device() {
    let broadcast = BroadcastStore::create(&ControllerConfig::default(), BroadcastProps::default()).await;
    let device = broadcast.get_state().device().clone();

    assert_eq!(device.user_agent, "Node.js or unknown");
    assert!(!device.is_webrtc_supported);
}

// ============================================================================
// Batch source resolution
// ============================================================================

struct StaticProvider {
    info: Option<PlaybackInfo>,
}

#[async_trait::async_trait]
impl PlaybackInfoProvider for StaticProvider {
    async fn get_playback_info(&self, playback_id: &str) -> BridgeResult<PlaybackInfo> {
        self.info
            .clone()
            .ok_or_else(|| BridgeError::OperationFailed(format!("unknown playback id {playback_id}")))
    }
}

/// Five sources, two of which (an unknown extension and an empty URL) do
/// not resolve.
fn mixed_sources() -> PlaybackInfo {
    PlaybackInfo::from_sources(vec![
        PlaybackSourceInfo::new("https://cdn.x.com/hls/abc/index.m3u8").with_size(1920, 1080),
        PlaybackSourceInfo::new("https://cdn.x.com/hls/abc/file.zip"),
        PlaybackSourceInfo::new("https://cdn.x.com/webrtc/abc"),
        PlaybackSourceInfo::default(),
        PlaybackSourceInfo::new("https://cdn.x.com/abc/720p.mp4").with_size(1280, 0),
    ])
}

#[test]
fn test_batch_keeps_recognised_sources_in_order() {
    let sources = parse_playback_info(Some(&mixed_sources())).unwrap();

    let kinds: Vec<SourceKind> = sources.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SourceKind::Hls, SourceKind::WebRtc, SourceKind::Video]);

    assert_eq!(sources[0].width, Some(1920));
    assert_eq!(sources[0].height, Some(1080));
    // a zero dimension drops the size hint
    assert_eq!(sources[2].size(), None);
}

#[test]
fn test_batch_without_info() {
    assert_eq!(parse_playback_info(None), None);
    assert_eq!(parse_playback_info(Some(&PlaybackInfo::default())), Some(Vec::new()));
}

#[tokio::test]
async fn test_resolve_playback_info_through_provider() {
    let provider = StaticProvider {
        info: Some(mixed_sources()),
    };
    let sources = resolve_playback_info(&provider, "abc").await.unwrap();
    assert_eq!(sources.len(), 3);

    let failing = StaticProvider { info: None };
    let err = resolve_playback_info(&failing, "missing").await.unwrap_err();
    assert!(matches!(err, MediaError::Bridge(_)));
    assert!(err.is_bridge_error());
}
