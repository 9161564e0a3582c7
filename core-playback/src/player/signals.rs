//! Reactions to host decoder signals, audio interruptions and stream cache
//! events.

use core_runtime::events::{CacheEvent, CoreEvent, PlaybackEvent, PlaybackState};
use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, trace};
use url::Url;

use super::{Player, PlayerCore, PlayerInner};
use crate::error::Result;
use crate::stream_cache::StreamCacheEvent;
use crate::traits::DecoderEvent;

impl Player {
    /// Feed a signal from the host decoder into the state machine.
    pub async fn handle_decoder_event(&self, event: DecoderEvent) -> Result<()> {
        trace!(?event, "Decoder event");
        let mut core = self.inner.core.lock().await;
        let inner = &self.inner;

        match event {
            DecoderEvent::ReadyToPlay => inner.on_ready(&mut core).await?,
            DecoderEvent::LikelyToKeepUp => {
                if core.state == PlaybackState::Buffering {
                    inner.on_ready(&mut core).await?;
                }
            }
            DecoderEvent::Failed { message } => inner.fail_active(&mut core, message).await,
            DecoderEvent::Stalled | DecoderEvent::BufferEmpty => {
                if core.state == PlaybackState::Playing {
                    inner.transition(&mut core, PlaybackState::Buffering);
                }
            }
            DecoderEvent::ReachedEnd => inner.on_reached_end(&mut core).await?,
            DecoderEvent::LoadedRange { loaded, total } => {
                inner.emit(CoreEvent::Playback(PlaybackEvent::Progress {
                    loaded_secs: loaded.as_secs_f64(),
                    total_secs: total.map(|t| t.as_secs_f64()),
                }));
            }
            DecoderEvent::Position { current, total } => {
                inner.emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
                    current_secs: current.as_secs_f64(),
                    total_secs: total.map(|t| t.as_secs_f64()),
                }));
            }
        }
        Ok(())
    }

    /// The host lost audio focus. Pauses if playing.
    pub async fn begin_interruption(&self) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        if core.state != PlaybackState::Playing {
            return Ok(());
        }
        debug!("Interrupted while playing");
        core.interrupted_while_playing = true;
        self.inner.pause_locked(&mut core).await
    }

    /// The host regained audio focus. Resumes only what the interruption
    /// paused.
    pub async fn end_interruption(&self) -> Result<()> {
        let mut core = self.inner.core.lock().await;
        if !std::mem::take(&mut core.interrupted_while_playing) {
            return Ok(());
        }
        if core.state != PlaybackState::Paused {
            return Ok(());
        }
        debug!("Resuming after interruption");
        self.inner.play_locked(&mut core, None).await
    }
}

impl PlayerInner {
    async fn on_ready(&self, core: &mut PlayerCore) -> Result<()> {
        let Some(active) = core.active.as_mut() else {
            return Ok(());
        };
        let index = active.index;
        let first_start = !std::mem::replace(&mut active.started, true);

        if core.state == PlaybackState::Buffering {
            self.transport.play().await?;
            self.transition(core, PlaybackState::Playing);
        }

        if first_start {
            core.consecutive_failures = 0;
            let info = self.source.media_info(index);
            debug!(index, title = %info.title, "Item started");
            self.emit(CoreEvent::Playback(PlaybackEvent::ItemStarted { index, info }));
        }
        Ok(())
    }

    async fn on_reached_end(self: &Arc<Self>, core: &mut PlayerCore) -> Result<()> {
        match core.queue.next_index(false) {
            None => {
                debug!("Reached end of queue");
                self.stop_locked(core).await;
                Ok(())
            }
            Some(next) if next == core.queue.current_index() && core.active.is_some() => {
                self.transport.seek(Duration::ZERO).await?;
                self.transport.play().await?;
                self.transition(core, PlaybackState::Playing);
                Ok(())
            }
            Some(next) => self.play_locked(core, Some(next)).await,
        }
    }

    /// Queue position of load `generation`, if it is still loaded.
    async fn loaded_index_of(&self, generation: u64) -> Option<usize> {
        self.core
            .lock()
            .await
            .active
            .as_ref()
            .filter(|a| a.generation == generation)
            .map(|a| a.index)
    }

    /// Map one stream cache event of load `generation` onto the bus.
    ///
    /// Cache results are published even after the item was replaced; a
    /// download failure only affects playback while its load is current.
    /// Events carry the item's current position, or `loaded_at` once the
    /// item is no longer loaded.
    fn on_cache_event(
        self: Arc<Self>,
        generation: u64,
        loaded_at: usize,
        event: StreamCacheEvent,
    ) -> BoxFuture<'static, ()> {
        async move {
            let index = match &event {
                StreamCacheEvent::DownloadProgress { .. }
                | StreamCacheEvent::Cached { .. }
                | StreamCacheEvent::CacheWriteFailed { .. } => self
                    .loaded_index_of(generation)
                    .await
                    .unwrap_or(loaded_at),
                _ => loaded_at,
            };

            match event {
                StreamCacheEvent::DownloadProgress {
                    bytes_received,
                    expected_bytes,
                } => self.emit(CoreEvent::Cache(CacheEvent::DownloadProgress {
                    index,
                    bytes_received,
                    expected_bytes,
                })),
                StreamCacheEvent::Cached { source_url, path } => {
                    let file_url = Url::from_file_path(&path)
                        .map(String::from)
                        .unwrap_or_else(|()| path.to_string_lossy().into_owned());
                    self.emit(CoreEvent::Cache(CacheEvent::ItemCached {
                        index,
                        source_url: source_url.to_string(),
                        file_url,
                    }));
                }
                StreamCacheEvent::CacheWriteFailed { message } => {
                    self.emit(CoreEvent::Cache(CacheEvent::CacheWriteFailed { index, message }))
                }
                StreamCacheEvent::Failed { message, .. } => {
                    let mut core = self.core.lock().await;
                    let current = core
                        .active
                        .as_ref()
                        .is_some_and(|a| a.generation == generation);
                    if current {
                        self.fail_active(&mut core, message).await;
                    } else {
                        trace!(generation, "Ignoring failure of a replaced item");
                    }
                }
                StreamCacheEvent::ResponseReceived { .. } | StreamCacheEvent::Completed { .. } => {}
            }
        }
        .boxed()
    }
}

/// Relay a stream cache's events until the cache and its download are gone.
pub(super) async fn forward_cache_events(
    player: Weak<PlayerInner>,
    generation: u64,
    index: usize,
    mut events: UnboundedReceiver<StreamCacheEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = player.upgrade() else {
            return;
        };
        inner.on_cache_event(generation, index, event).await;
    }
    trace!(generation, "Cache event stream closed");
}
