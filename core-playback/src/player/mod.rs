//! # Player
//!
//! State machine driving a host [`MediaTransport`] through a
//! [`QueueDataSource`]'s items.
//!
//! ## States
//!
//! ```text
//!            play                ReadyToPlay
//! Waiting ─────────▶ Buffering ─────────────▶ Playing ◀──┐
//!    ▲                  ▲   │                  │  │      │ play
//!    │ stop             │   │ Failed           │  └──▶ Paused
//!    │                  │   ▼                  │ Stalled
//!    └──────────────── Failed ◀────────────────┘ (back to Buffering)
//!                        │
//!                        └── automatic advance to the next item
//! ```
//!
//! Every transition publishes `StateWillChange` and `StateDidChange` on the
//! event bus. All other host-visible signals (item started or failed,
//! progress, position, cache results) are published there too.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # use core_playback::{Player, PlayerConfig, DecoderEvent};
//! # use std::sync::Arc;
//! # async fn demo(
//! #     core: core_runtime::config::CoreConfig,
//! #     source: Arc<dyn bridge_traits::QueueDataSource>,
//! #     transport: Arc<dyn core_playback::MediaTransport>,
//! # ) -> core_playback::Result<()> {
//! let player = Player::new(&core, source, transport, PlayerConfig::default())?;
//! let mut events = player.subscribe();
//!
//! player.play(Some(0)).await?;
//! // The host forwards its decoder's signals:
//! player.handle_decoder_event(DecoderEvent::ReadyToPlay).await?;
//! # Ok(())
//! # }
//! ```

mod lifecycle;
mod signals;

use bridge_traits::{FileSystemAccess, HttpClient, QueueDataSource};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PlaybackState, Receiver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::queue::{PlaybackQueue, RepeatMode};
use crate::stream_cache::StreamCache;
use crate::traits::MediaTransport;

/// The item currently handed to the transport.
struct ActiveItem {
    index: usize,
    /// Distinguishes this load from earlier loads of the same index.
    generation: u64,
    url: Url,
    cache: Option<StreamCache>,
    /// `ItemStarted` has been published for this load.
    started: bool,
}

/// Mutable player state, guarded by one async mutex.
struct PlayerCore {
    state: PlaybackState,
    queue: PlaybackQueue,
    active: Option<ActiveItem>,
    generation: u64,
    /// Items failed in a row since the last successful start.
    consecutive_failures: usize,
    interrupted_while_playing: bool,
}

pub(crate) struct PlayerInner {
    config: PlayerConfig,
    bus: EventBus,
    transport: Arc<dyn MediaTransport>,
    source: Arc<dyn QueueDataSource>,
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystemAccess>,
    /// Base for relative cache paths handed out by the data source.
    cache_dir: Option<PathBuf>,
    core: Mutex<PlayerCore>,
}

impl PlayerInner {
    fn emit(&self, event: CoreEvent) {
        // No subscribers is fine; the host simply isn't listening.
        let _ = self.bus.emit(event);
    }

    fn transition(&self, core: &mut PlayerCore, to: PlaybackState) {
        let from = core.state;
        if from == to {
            return;
        }

        self.emit(CoreEvent::Playback(PlaybackEvent::StateWillChange { from, to }));
        core.state = to;
        debug!(%from, %to, "Playback state changed");
        self.emit(CoreEvent::Playback(PlaybackEvent::StateDidChange { from, to }));
    }
}

/// Owned handle to a player. Clones share the same player.
#[derive(Clone)]
pub struct Player {
    inner: Arc<PlayerInner>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("config", &self.inner.config)
            .field("bus", &self.inner.bus)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Create a player over `source`, driving `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Config`](crate::PlaybackError::Config) if
    /// `config` does not validate.
    pub fn new(
        core: &CoreConfig,
        source: Arc<dyn QueueDataSource>,
        transport: Arc<dyn MediaTransport>,
        config: PlayerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let queue = PlaybackQueue::new(Arc::clone(&source), config.repeat_mode, config.shuffle);
        let inner = PlayerInner {
            bus: core.event_bus(),
            transport,
            source,
            http: Arc::clone(&core.http_client),
            fs: Arc::clone(&core.file_system),
            cache_dir: core.cache_dir.clone(),
            core: Mutex::new(PlayerCore {
                state: PlaybackState::Waiting,
                queue,
                active: None,
                generation: 0,
                consecutive_failures: 0,
                interrupted_while_playing: false,
            }),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Subscribe to the player's events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.inner.bus.subscribe()
    }

    /// The bus the player publishes to.
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.core.lock().await.state
    }

    pub async fn current_index(&self) -> usize {
        self.inner.core.lock().await.queue.current_index()
    }

    /// Index of the item handed to the transport, if any.
    pub async fn loaded_index(&self) -> Option<usize> {
        self.inner.core.lock().await.active.as_ref().map(|a| a.index)
    }

    /// Stream cache serving the loaded item, if it is being intercepted.
    pub async fn active_cache(&self) -> Option<StreamCache> {
        self.inner
            .core
            .lock()
            .await
            .active
            .as_ref()
            .and_then(|a| a.cache.clone())
    }

    // ========================================================================
    // Transport control
    // ========================================================================

    /// Play the item at `index`, or the current item when `None`.
    ///
    /// An empty queue is a no-op. An already loaded item resumes.
    #[instrument(skip(self))]
    pub async fn play(&self, index: Option<usize>) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        core.consecutive_failures = 0;
        self.inner.play_locked(&mut core, index).await
    }

    /// Pause. Only effective while playing.
    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        self.inner.pause_locked(&mut core).await
    }

    /// Tear down the loaded item and return to `Waiting`.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        self.inner.stop_locked(&mut core).await;
        Ok(())
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        if core.state == PlaybackState::Playing {
            self.inner.pause_locked(&mut core).await
        } else {
            core.consecutive_failures = 0;
            self.inner.play_locked(&mut core, None).await
        }
    }

    /// Skip to the next item, ignoring single-item repeat.
    pub async fn next(&self) -> Result<()> {
        self.next_with(true).await
    }

    /// Skip to the next item. Nothing happens when there is none.
    #[instrument(skip(self))]
    pub async fn next_with(&self, ignore_repeat: bool) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        core.consecutive_failures = 0;
        self.inner.advance_locked(&mut core, ignore_repeat).await
    }

    /// Go back one item, ignoring single-item repeat.
    pub async fn previous(&self) -> Result<()> {
        self.previous_with(true).await
    }

    /// Go back one item, or restart the current one when it has played past
    /// the restart threshold or has no predecessor.
    #[instrument(skip(self))]
    pub async fn previous_with(&self, ignore_repeat: bool) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        core.consecutive_failures = 0;
        self.inner.retreat_locked(&mut core, ignore_repeat).await
    }

    /// Seek within the loaded item.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let core = self.inner.core.lock().await;
        if core.active.is_none() {
            return Ok(());
        }
        self.inner.transport.seek(position).await
    }

    // ========================================================================
    // Queue
    // ========================================================================

    pub async fn repeat_mode(&self) -> RepeatMode {
        self.inner.core.lock().await.queue.repeat_mode()
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) {
        self.inner.core.lock().await.queue.set_repeat_mode(mode);
    }

    pub async fn shuffle(&self) -> bool {
        self.inner.core.lock().await.queue.shuffle()
    }

    pub async fn set_shuffle(&self, shuffle: bool) {
        self.inner.core.lock().await.queue.set_shuffle(shuffle);
    }

    /// The host inserted an item at `index`.
    pub async fn added_item(&self, index: usize) {
        let mut core = self.inner.core.lock().await;
        core.queue.added_item(index);
        core.follow_queue();
    }

    /// The host removed the item at `index`.
    pub async fn removed_item(&self, index: usize) {
        let mut core = self.inner.core.lock().await;
        core.queue.removed_item(index);
        core.follow_queue();
    }

    /// The host moved an item from `from` to `to`.
    pub async fn moved_item(&self, from: usize, to: usize) {
        let mut core = self.inner.core.lock().await;
        core.queue.moved_item(from, to);
        core.follow_queue();
    }
}

impl PlayerCore {
    /// Keep the loaded item's index in step with the queue position.
    fn follow_queue(&mut self) {
        let current = self.queue.current_index();
        if let Some(active) = self.active.as_mut() {
            active.index = current;
        }
    }
}
