use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpStream, ResponseHead};
use bridge_traits::source::{MediaInfo, QueueDataSource};
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_playback::{
    DecoderEvent, MediaSource, MediaTransport, PlaybackError, PlaybackState, Player, PlayerConfig,
    RangeRequest, RepeatMode,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CacheEvent, CoreEvent, PlaybackEvent, Receiver};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    Unload,
}

#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    position: Mutex<Duration>,
}

impl RecordingTransport {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn clear(&self) {
        self.calls.lock().clear();
    }

    fn set_position(&self, position: Duration) {
        *self.position.lock() = position;
    }
}

#[async_trait]
impl MediaTransport for RecordingTransport {
    async fn load(&self, source: MediaSource) -> core_playback::Result<()> {
        let described = match source {
            MediaSource::LocalFile { path } => format!("local:{}", path.display()),
            MediaSource::Remote { url } => format!("remote:{}", url),
            MediaSource::Intercepted { url, .. } => format!("intercepted:{}", url),
        };
        self.calls.lock().push(Call::Load(described));
        Ok(())
    }

    async fn play(&self) -> core_playback::Result<()> {
        self.calls.lock().push(Call::Play);
        Ok(())
    }

    async fn pause(&self) -> core_playback::Result<()> {
        self.calls.lock().push(Call::Pause);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> core_playback::Result<()> {
        self.calls.lock().push(Call::Seek(position));
        Ok(())
    }

    fn position(&self) -> Duration {
        *self.position.lock()
    }

    async fn unload(&self) -> core_playback::Result<()> {
        self.calls.lock().push(Call::Unload);
        Ok(())
    }
}

/// Items `0..n` at `https://media.example.com/<i>.mp3`; `None` entries fail
/// to resolve.
struct VecSource {
    items: Vec<Option<Url>>,
    cache_dir: Option<PathBuf>,
}

impl VecSource {
    fn new(count: usize) -> Self {
        Self {
            items: (0..count).map(|i| Some(item_url(i))).collect(),
            cache_dir: None,
        }
    }

    fn unresolvable(mut self, index: usize) -> Self {
        self.items[index] = None;
        self
    }

    fn cached_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl QueueDataSource for VecSource {
    fn total_items(&self) -> usize {
        self.items.len()
    }

    async fn url_for_item(&self, index: usize) -> BridgeResult<Url> {
        self.items
            .get(index)
            .cloned()
            .flatten()
            .ok_or_else(|| BridgeError::OperationFailed(format!("no url for {}", index)))
    }

    fn should_cache_item(&self, _index: usize) -> bool {
        self.cache_dir.is_some()
    }

    fn cache_path_for_item(&self, index: usize) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.mp3", index)))
    }

    fn media_info(&self, index: usize) -> MediaInfo {
        MediaInfo::new(format!("Track {}", index), "Artist", "Album")
    }
}

/// Answers every request with the same status and body.
struct FixedHttp {
    status: u16,
    body: Bytes,
}

#[async_trait]
impl HttpClient for FixedHttp {
    async fn open_stream(&self, _request: HttpRequest) -> BridgeResult<HttpStream> {
        let head = ResponseHead {
            status: self.status,
            mime_type: Some("audio/mpeg".to_string()),
            content_length: Some(self.body.len() as u64),
            headers: HashMap::new(),
        };
        let body = futures::stream::iter(vec![Ok(self.body.clone())]);
        Ok(HttpStream::new(head, body.boxed()))
    }
}

#[derive(Default)]
struct MemoryFs {
    files: Mutex<HashMap<PathBuf, Bytes>>,
}

#[async_trait]
impl FileSystemAccess for MemoryFs {
    async fn get_cache_directory(&self) -> BridgeResult<PathBuf> {
        Ok(PathBuf::from("/cache"))
    }

    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
        self.files.lock().insert(path.to_path_buf(), data);
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
        self.files.lock().remove(path);
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    player: Player,
    transport: Arc<RecordingTransport>,
    fs: Arc<MemoryFs>,
    events: Receiver<CoreEvent>,
}

fn item_url(index: usize) -> Url {
    Url::parse(&format!("https://media.example.com/{}.mp3", index)).unwrap()
}

fn remote(index: usize) -> Call {
    Call::Load(format!("remote:{}", item_url(index)))
}

fn harness(source: VecSource, config: PlayerConfig) -> Harness {
    harness_with_http(
        source,
        config,
        FixedHttp {
            status: 200,
            body: Bytes::from_static(b"0123456789"),
        },
    )
}

fn harness_with_http(source: VecSource, config: PlayerConfig, http: FixedHttp) -> Harness {
    let fs = Arc::new(MemoryFs::default());
    let core = CoreConfig::builder()
        .http_client(Arc::new(http))
        .file_system(fs.clone())
        .build()
        .unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let player = Player::new(&core, Arc::new(source), transport.clone(), config).unwrap();
    let events = player.subscribe();
    Harness {
        player,
        transport,
        fs,
        events,
    }
}

fn drain(events: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn failed_indices(events: &[CoreEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::Playback(PlaybackEvent::ItemFailed { index, .. }) => Some(*index),
            _ => None,
        })
        .collect()
}

fn started_count(events: &[CoreEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::ItemStarted { .. })))
        .count()
}

async fn wait_for<F>(events: &mut Receiver<CoreEvent>, mut matches: F) -> CoreEvent
where
    F: FnMut(&CoreEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for player event")
            .expect("event bus closed");
        if matches(&event) {
            return event;
        }
    }
}

async fn start(h: &Harness, index: usize) {
    h.player.play(Some(index)).await.unwrap();
    h.player
        .handle_decoder_event(DecoderEvent::ReadyToPlay)
        .await
        .unwrap();
}

// ============================================================================
// Loading and starting
// ============================================================================

#[tokio::test]
async fn test_play_on_empty_queue_does_nothing() {
    let mut h = harness(VecSource::new(0), PlayerConfig::default());

    h.player.play(None).await.unwrap();

    assert_eq!(h.player.state().await, PlaybackState::Waiting);
    assert!(h.transport.calls().is_empty());
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_play_out_of_range_is_rejected() {
    let h = harness(VecSource::new(3), PlayerConfig::default());

    let result = h.player.play(Some(5)).await;
    assert!(matches!(
        result,
        Err(PlaybackError::InvalidIndex { index: 5, total: 3 })
    ));
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_play_loads_item_and_starts_on_readiness() {
    let mut h = harness(VecSource::new(3), PlayerConfig::default());

    h.player.play(Some(1)).await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Buffering);
    assert_eq!(h.transport.calls(), vec![remote(1)]);

    let events = drain(&mut h.events);
    assert_eq!(
        events,
        vec![
            CoreEvent::Playback(PlaybackEvent::StateWillChange {
                from: PlaybackState::Waiting,
                to: PlaybackState::Buffering,
            }),
            CoreEvent::Playback(PlaybackEvent::StateDidChange {
                from: PlaybackState::Waiting,
                to: PlaybackState::Buffering,
            }),
        ]
    );

    h.player
        .handle_decoder_event(DecoderEvent::ReadyToPlay)
        .await
        .unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Playing);
    assert_eq!(h.transport.calls(), vec![remote(1), Call::Play]);

    let events = drain(&mut h.events);
    assert!(events.contains(&CoreEvent::Playback(PlaybackEvent::ItemStarted {
        index: 1,
        info: MediaInfo::new("Track 1", "Artist", "Album"),
    })));

    // A second readiness signal does not restart the item.
    h.player
        .handle_decoder_event(DecoderEvent::ReadyToPlay)
        .await
        .unwrap();
    assert_eq!(started_count(&drain(&mut h.events)), 0);
}

#[tokio::test]
async fn test_play_current_item_resumes_without_reloading() {
    let h = harness(VecSource::new(3), PlayerConfig::default());
    start(&h, 0).await;
    h.player.pause().await.unwrap();
    h.transport.clear();

    h.player.play(None).await.unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Play]);
    assert_eq!(h.player.state().await, PlaybackState::Playing);
}

#[tokio::test]
async fn test_play_other_index_tears_down_first() {
    let h = harness(VecSource::new(3), PlayerConfig::default());
    start(&h, 0).await;
    h.transport.clear();

    h.player.play(Some(2)).await.unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Unload, remote(2)]);
    assert_eq!(h.player.loaded_index().await, Some(2));
    assert_eq!(h.player.current_index().await, 2);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_decoder_failure_skips_to_next_item() {
    let config = PlayerConfig::default().with_repeat_mode(RepeatMode::All);
    let mut h = harness(VecSource::new(5), config);
    start(&h, 2).await;
    drain(&mut h.events);
    h.transport.clear();

    h.player
        .handle_decoder_event(DecoderEvent::Failed {
            message: "corrupt frame".to_string(),
        })
        .await
        .unwrap();

    let events = drain(&mut h.events);
    assert_eq!(failed_indices(&events), vec![2]);
    assert!(events.contains(&CoreEvent::Playback(PlaybackEvent::ItemFailed {
        index: 2,
        url: Some(item_url(2).to_string()),
        message: "corrupt frame".to_string(),
    })));
    assert_eq!(h.transport.calls(), vec![Call::Unload, remote(3)]);
    assert_eq!(h.player.loaded_index().await, Some(3));
    assert_eq!(h.player.state().await, PlaybackState::Buffering);
}

#[tokio::test]
async fn test_unresolvable_item_is_skipped() {
    let mut h = harness(VecSource::new(3).unresolvable(1), PlayerConfig::default());

    h.player.play(Some(1)).await.unwrap();

    let events = drain(&mut h.events);
    assert_eq!(failed_indices(&events), vec![1]);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::ItemFailed { index: 1, url: None, .. })
    )));
    assert_eq!(h.transport.calls(), vec![remote(2)]);
    assert_eq!(h.player.loaded_index().await, Some(2));
}

#[tokio::test]
async fn test_every_item_failing_settles_in_waiting() {
    let source = VecSource::new(3)
        .unresolvable(0)
        .unresolvable(1)
        .unresolvable(2);
    let config = PlayerConfig::default().with_repeat_mode(RepeatMode::All);
    let mut h = harness(source, config);

    h.player.play(Some(0)).await.unwrap();

    let events = drain(&mut h.events);
    assert_eq!(failed_indices(&events), vec![0, 1, 2]);
    assert_eq!(h.player.state().await, PlaybackState::Waiting);
    assert_eq!(h.player.loaded_index().await, None);
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_failure_without_skipping_waits() {
    let config = PlayerConfig::default().with_skip_on_failure(false);
    let mut h = harness(VecSource::new(3), config);
    start(&h, 0).await;
    drain(&mut h.events);
    h.transport.clear();

    h.player
        .handle_decoder_event(DecoderEvent::Failed {
            message: "unsupported codec".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(failed_indices(&drain(&mut h.events)), vec![0]);
    assert_eq!(h.transport.calls(), vec![Call::Unload]);
    assert_eq!(h.player.state().await, PlaybackState::Waiting);
}

// ============================================================================
// Transport control
// ============================================================================

#[tokio::test]
async fn test_pause_only_applies_while_playing() {
    let h = harness(VecSource::new(2), PlayerConfig::default());

    h.player.play(Some(0)).await.unwrap();
    h.player.pause().await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Buffering);
    assert!(!h.transport.calls().contains(&Call::Pause));

    h.player
        .handle_decoder_event(DecoderEvent::ReadyToPlay)
        .await
        .unwrap();
    h.player.pause().await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Paused);

    h.player.toggle_play_pause().await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Playing);
    assert_eq!(
        h.transport.calls(),
        vec![remote(0), Call::Play, Call::Pause, Call::Play]
    );
}

#[tokio::test]
async fn test_stop_tears_down() {
    let h = harness(VecSource::new(2), PlayerConfig::default());
    start(&h, 1).await;
    h.transport.clear();

    h.player.stop().await.unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Unload]);
    assert_eq!(h.player.state().await, PlaybackState::Waiting);
    assert_eq!(h.player.loaded_index().await, None);
}

#[tokio::test]
async fn test_previous_restarts_past_threshold() {
    let h = harness(VecSource::new(3), PlayerConfig::default());
    start(&h, 2).await;
    h.transport.clear();

    h.transport.set_position(Duration::from_secs(10));
    h.player.previous().await.unwrap();
    assert_eq!(h.transport.calls(), vec![Call::Seek(Duration::ZERO)]);
    assert_eq!(h.player.loaded_index().await, Some(2));

    h.transport.clear();
    h.transport.set_position(Duration::from_secs(1));
    h.player.previous().await.unwrap();
    assert_eq!(h.transport.calls(), vec![Call::Unload, remote(1)]);
    assert_eq!(h.player.loaded_index().await, Some(1));
}

#[tokio::test]
async fn test_previous_at_first_item_restarts_it() {
    let h = harness(VecSource::new(3), PlayerConfig::default());
    start(&h, 0).await;
    h.transport.clear();

    h.player.previous().await.unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Seek(Duration::ZERO)]);
    assert_eq!(h.player.loaded_index().await, Some(0));
}

#[tokio::test]
async fn test_next_past_last_item_does_nothing() {
    let h = harness(VecSource::new(2), PlayerConfig::default());
    start(&h, 1).await;
    h.transport.clear();

    h.player.next().await.unwrap();

    assert!(h.transport.calls().is_empty());
    assert_eq!(h.player.state().await, PlaybackState::Playing);
}

#[tokio::test]
async fn test_next_wraps_with_repeat_all() {
    let config = PlayerConfig::default().with_repeat_mode(RepeatMode::All);
    let h = harness(VecSource::new(2), config);
    start(&h, 1).await;
    h.transport.clear();

    h.player.next().await.unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Unload, remote(0)]);
}

#[tokio::test]
async fn test_reaching_end_of_queue_stops() {
    let h = harness(VecSource::new(2), PlayerConfig::default());
    start(&h, 1).await;
    h.transport.clear();

    h.player
        .handle_decoder_event(DecoderEvent::ReachedEnd)
        .await
        .unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Unload]);
    assert_eq!(h.player.state().await, PlaybackState::Waiting);
}

#[tokio::test]
async fn test_reaching_end_advances() {
    let h = harness(VecSource::new(3), PlayerConfig::default());
    start(&h, 0).await;
    h.transport.clear();

    h.player
        .handle_decoder_event(DecoderEvent::ReachedEnd)
        .await
        .unwrap();

    assert_eq!(h.transport.calls(), vec![Call::Unload, remote(1)]);
    assert_eq!(h.player.state().await, PlaybackState::Buffering);
}

#[tokio::test]
async fn test_single_repeat_restarts_item_at_end() {
    let config = PlayerConfig::default().with_repeat_mode(RepeatMode::Single);
    let h = harness(VecSource::new(3), config);
    start(&h, 1).await;
    h.transport.clear();

    h.player
        .handle_decoder_event(DecoderEvent::ReachedEnd)
        .await
        .unwrap();

    assert_eq!(
        h.transport.calls(),
        vec![Call::Seek(Duration::ZERO), Call::Play]
    );
    assert_eq!(h.player.loaded_index().await, Some(1));
    assert_eq!(h.player.state().await, PlaybackState::Playing);
}

// ============================================================================
// Decoder signals
// ============================================================================

#[tokio::test]
async fn test_stall_and_recovery() {
    let mut h = harness(VecSource::new(1), PlayerConfig::default());
    start(&h, 0).await;
    drain(&mut h.events);

    h.player
        .handle_decoder_event(DecoderEvent::Stalled)
        .await
        .unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Buffering);

    h.player
        .handle_decoder_event(DecoderEvent::LikelyToKeepUp)
        .await
        .unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Playing);
    assert_eq!(started_count(&drain(&mut h.events)), 0);
}

#[tokio::test]
async fn test_progress_and_position_are_published() {
    let mut h = harness(VecSource::new(1), PlayerConfig::default());
    start(&h, 0).await;
    drain(&mut h.events);

    h.player
        .handle_decoder_event(DecoderEvent::LoadedRange {
            loaded: Duration::from_millis(1500),
            total: Some(Duration::from_secs(180)),
        })
        .await
        .unwrap();
    h.player
        .handle_decoder_event(DecoderEvent::Position {
            current: Duration::from_secs(3),
            total: None,
        })
        .await
        .unwrap();

    assert_eq!(
        drain(&mut h.events),
        vec![
            CoreEvent::Playback(PlaybackEvent::Progress {
                loaded_secs: 1.5,
                total_secs: Some(180.0),
            }),
            CoreEvent::Playback(PlaybackEvent::PositionChanged {
                current_secs: 3.0,
                total_secs: None,
            }),
        ]
    );
}

#[tokio::test]
async fn test_interruption_resumes_only_what_it_paused() {
    let h = harness(VecSource::new(1), PlayerConfig::default());
    start(&h, 0).await;

    h.player.begin_interruption().await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Paused);
    h.player.end_interruption().await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Playing);

    h.player.pause().await.unwrap();
    h.player.begin_interruption().await.unwrap();
    h.player.end_interruption().await.unwrap();
    assert_eq!(h.player.state().await, PlaybackState::Paused);
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_cached_copy_is_played_from_disk() {
    let h = harness(VecSource::new(2).cached_in("/cache"), PlayerConfig::default());
    let cached = PathBuf::from("/cache/1.mp3");
    h.fs.files
        .lock()
        .insert(cached.clone(), Bytes::from_static(b"audio"));

    h.player.play(Some(1)).await.unwrap();

    assert_eq!(
        h.transport.calls(),
        vec![Call::Load(format!("local:{}", cached.display()))]
    );
    assert!(h.player.active_cache().await.is_none());
}

#[tokio::test]
async fn test_relative_cache_paths_resolve_against_cache_dir() {
    let fs = Arc::new(MemoryFs::default());
    fs.files
        .lock()
        .insert(PathBuf::from("/data/music/0.mp3"), Bytes::from_static(b"audio"));
    let core = CoreConfig::builder()
        .http_client(Arc::new(FixedHttp {
            status: 200,
            body: Bytes::new(),
        }))
        .file_system(fs)
        .cache_dir("/data")
        .build()
        .unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let player = Player::new(
        &core,
        Arc::new(VecSource::new(1).cached_in("music")),
        transport.clone(),
        PlayerConfig::default(),
    )
    .unwrap();

    player.play(Some(0)).await.unwrap();

    assert_eq!(
        transport.calls(),
        vec![Call::Load("local:/data/music/0.mp3".to_string())]
    );
}

#[tokio::test]
async fn test_cacheable_item_is_intercepted_and_persisted() {
    let mut h = harness(VecSource::new(2).cached_in("/cache"), PlayerConfig::default());

    h.player.play(Some(0)).await.unwrap();
    assert_eq!(
        h.transport.calls(),
        vec![Call::Load(
            "intercepted:streaming+https://media.example.com/0.mp3".to_string()
        )]
    );

    let cache = h.player.active_cache().await.expect("item is intercepted");
    let response = cache
        .request_range(RangeRequest::new(0, 4))
        .into_response()
        .await
        .unwrap();
    assert_eq!(response.data.as_ref(), b"0123");

    let event = wait_for(&mut h.events, |e| {
        matches!(e, CoreEvent::Cache(CacheEvent::ItemCached { .. }))
    })
    .await;
    assert_eq!(
        event,
        CoreEvent::Cache(CacheEvent::ItemCached {
            index: 0,
            source_url: item_url(0).to_string(),
            file_url: "file:///cache/0.mp3".to_string(),
        })
    );
    assert_eq!(
        h.fs.files.lock().get(Path::new("/cache/0.mp3")),
        Some(&Bytes::from_static(b"0123456789"))
    );
}

#[tokio::test]
async fn test_cache_events_follow_moved_item() {
    let mut h = harness(VecSource::new(3).cached_in("/cache"), PlayerConfig::default());

    h.player.play(Some(0)).await.unwrap();
    h.player.moved_item(0, 2).await;
    assert_eq!(h.player.loaded_index().await, Some(2));

    let cache = h.player.active_cache().await.expect("item is intercepted");
    let _pending = cache.request_range(RangeRequest::new(0, 4));

    let event = wait_for(&mut h.events, |e| {
        matches!(e, CoreEvent::Cache(CacheEvent::ItemCached { .. }))
    })
    .await;
    assert_eq!(
        event,
        CoreEvent::Cache(CacheEvent::ItemCached {
            index: 2,
            source_url: item_url(0).to_string(),
            file_url: "file:///cache/0.mp3".to_string(),
        })
    );
}

#[tokio::test]
async fn test_download_failure_skips_to_next_item() {
    let http = FixedHttp {
        status: 404,
        body: Bytes::new(),
    };
    let mut h = harness_with_http(
        VecSource::new(3).cached_in("/cache"),
        PlayerConfig::default(),
        http,
    );

    h.player.play(Some(0)).await.unwrap();
    let cache = h.player.active_cache().await.expect("item is intercepted");
    let _pending = cache.request_range(RangeRequest::new(0, 4));

    let event = wait_for(&mut h.events, |e| {
        matches!(e, CoreEvent::Playback(PlaybackEvent::ItemFailed { .. }))
    })
    .await;
    assert!(matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::ItemFailed { index: 0, .. })
    ));
    assert_eq!(h.player.loaded_index().await, Some(1));
    assert_eq!(h.player.state().await, PlaybackState::Buffering);
}

// ============================================================================
// Configuration and queue changes
// ============================================================================

#[tokio::test]
async fn test_invalid_intercept_scheme_is_rejected() {
    let fs = Arc::new(MemoryFs::default());
    let core = CoreConfig::builder()
        .http_client(Arc::new(FixedHttp {
            status: 200,
            body: Bytes::new(),
        }))
        .file_system(fs)
        .build()
        .unwrap();
    for scheme in ["https", "x+cache"] {
        let result = Player::new(
            &core,
            Arc::new(VecSource::new(1)),
            Arc::new(RecordingTransport::default()),
            PlayerConfig::default().with_intercept_scheme(scheme),
        );
        assert!(
            matches!(result, Err(PlaybackError::Config(_))),
            "{:?} should be rejected",
            scheme
        );
    }
}

#[tokio::test]
async fn test_removing_earlier_item_keeps_loaded_item() {
    let h = harness(VecSource::new(4), PlayerConfig::default());
    start(&h, 2).await;
    h.transport.clear();

    h.player.removed_item(0).await;
    assert_eq!(h.player.current_index().await, 1);
    assert_eq!(h.player.loaded_index().await, Some(1));

    // Still the same item: resuming does not reload it.
    h.player.play(None).await.unwrap();
    assert_eq!(h.transport.calls(), vec![Call::Play]);
}
