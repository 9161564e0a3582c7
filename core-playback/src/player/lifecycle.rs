//! Loading, tearing down and advancing between items.

use core_runtime::events::{CoreEvent, PlaybackEvent, PlaybackState};
use core_runtime::logging::{redact_url, strip_path};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{signals, ActiveItem, PlayerCore, PlayerInner};
use crate::config::StreamCacheOptions;
use crate::error::{PlaybackError, Result};
use crate::stream_cache::{scheme, StreamCache};
use crate::traits::MediaSource;

impl PlayerInner {
    pub(super) async fn play_locked(
        self: &Arc<Self>,
        core: &mut PlayerCore,
        index: Option<usize>,
    ) -> Result<()> {
        let total = core.queue.total_items();
        if total == 0 {
            debug!("Play requested on an empty queue");
            return Ok(());
        }

        let target = index.unwrap_or_else(|| core.queue.current_index());
        if target >= total {
            return Err(PlaybackError::InvalidIndex {
                index: target,
                total,
            });
        }

        if core.active.as_ref().is_some_and(|a| a.index != target) {
            self.teardown(core).await;
        }

        if core.active.is_some() {
            self.transport.play().await?;
            self.transition(core, PlaybackState::Playing);
            return Ok(());
        }

        self.load_with_skip(core, target).await;
        Ok(())
    }

    pub(super) async fn pause_locked(&self, core: &mut PlayerCore) -> Result<()> {
        if core.state != PlaybackState::Playing {
            return Ok(());
        }
        self.transport.pause().await?;
        self.transition(core, PlaybackState::Paused);
        Ok(())
    }

    pub(super) async fn stop_locked(&self, core: &mut PlayerCore) {
        self.teardown(core).await;
        core.interrupted_while_playing = false;
        self.transition(core, PlaybackState::Waiting);
    }

    /// Move to the successor of the current item.
    ///
    /// A successor equal to the current item restarts it in place.
    pub(super) async fn advance_locked(
        self: &Arc<Self>,
        core: &mut PlayerCore,
        ignore_repeat: bool,
    ) -> Result<()> {
        let Some(next) = core.queue.next_index(ignore_repeat) else {
            debug!("No next item");
            return Ok(());
        };

        if next == core.queue.current_index() && core.active.is_some() {
            self.transport.seek(Duration::ZERO).await?;
            return self.play_locked(core, None).await;
        }

        self.play_locked(core, Some(next)).await
    }

    pub(super) async fn retreat_locked(
        self: &Arc<Self>,
        core: &mut PlayerCore,
        ignore_repeat: bool,
    ) -> Result<()> {
        let loaded = core.active.is_some();
        if loaded && self.transport.position() > self.config.restart_threshold {
            return self.transport.seek(Duration::ZERO).await;
        }

        match core.queue.previous_index(ignore_repeat) {
            Some(previous) if previous != core.queue.current_index() || !loaded => {
                self.play_locked(core, Some(previous)).await
            }
            _ if loaded => self.transport.seek(Duration::ZERO).await,
            _ => Ok(()),
        }
    }

    /// Load `start`, skipping forward past items that fail to load.
    ///
    /// Gives up after one full lap of failures and returns to `Waiting`.
    pub(super) async fn load_with_skip(self: &Arc<Self>, core: &mut PlayerCore, start: usize) {
        let mut target = start;
        loop {
            let error = match self.load_item(core, target).await {
                Ok(()) => return,
                Err(e) => e,
            };

            let url = core.active.as_ref().map(|a| a.url.to_string());
            self.report_failure(core, target, url, error.to_string()).await;

            match self.next_after_failure(core, target) {
                Some(next) => target = next,
                None => return,
            }
        }
    }

    /// Hand the item at `index` to the transport and enter `Buffering`.
    async fn load_item(self: &Arc<Self>, core: &mut PlayerCore, index: usize) -> Result<()> {
        core.queue.set_current(index);
        core.generation += 1;
        let generation = core.generation;

        let url = self
            .source
            .url_for_item(index)
            .await
            .map_err(|e| PlaybackError::SourceResolution {
                index,
                message: e.to_string(),
            })?;

        let cache_path = self
            .source
            .cache_path_for_item(index)
            .map(|path| match &self.cache_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            });
        let options = StreamCacheOptions {
            cache_path,
            caching_enabled: self.source.should_cache_item(index),
            request_timeout: self.config.request_timeout,
        };

        let (media, cache) = if options.is_caching_enabled() {
            let (cache, events) = StreamCache::new(
                url.clone(),
                options,
                Arc::clone(&self.http),
                Arc::clone(&self.fs),
            );

            let local_copy = if cache.has_local_copy().await {
                cache.cache_path().map(Path::to_path_buf)
            } else {
                None
            };

            match local_copy {
                Some(path) => {
                    info!(index, file = %strip_path(&path.to_string_lossy()), "Playing cached copy");
                    (MediaSource::LocalFile { path }, None)
                }
                None => {
                    let marked = scheme::to_intercepted(&url, &self.config.intercept_scheme)?;
                    tokio::spawn(signals::forward_cache_events(
                        Arc::downgrade(self),
                        generation,
                        index,
                        events,
                    ));
                    (
                        MediaSource::Intercepted {
                            url: marked,
                            cache: cache.clone(),
                        },
                        Some(cache),
                    )
                }
            }
        } else {
            (MediaSource::Remote { url: url.clone() }, None)
        };

        debug!(
            index,
            generation,
            url = %redact_url(url.as_str()),
            intercepted = cache.is_some(),
            "Loading item"
        );
        core.active = Some(ActiveItem {
            index,
            generation,
            url,
            cache,
            started: false,
        });
        self.transition(core, PlaybackState::Buffering);

        self.transport.load(media).await
    }

    /// Release the loaded item. The stream cache is invalidated and the
    /// transport unloaded.
    pub(super) async fn teardown(&self, core: &mut PlayerCore) {
        let Some(active) = core.active.take() else {
            return;
        };

        debug!(index = active.index, generation = active.generation, "Tearing down item");
        if let Some(cache) = &active.cache {
            cache.invalidate();
        }
        if let Err(e) = self.transport.unload().await {
            warn!(error = %e, "Transport failed to unload");
        }
    }

    /// Publish `ItemFailed` for `index` after tearing it down.
    pub(super) async fn report_failure(
        &self,
        core: &mut PlayerCore,
        index: usize,
        url: Option<String>,
        message: String,
    ) {
        warn!(index, error = %message, "Item failed");
        core.consecutive_failures += 1;
        self.transition(core, PlaybackState::Failed);
        self.teardown(core).await;
        self.emit(CoreEvent::Playback(PlaybackEvent::ItemFailed {
            index,
            url,
            message,
        }));
    }

    /// Pick the item to try after `failed`, or settle in `Waiting` when
    /// skipping is off, the queue is exhausted, or a full lap has failed.
    pub(super) fn next_after_failure(&self, core: &mut PlayerCore, failed: usize) -> Option<usize> {
        let next = if !self.config.skip_on_failure {
            None
        } else if core.consecutive_failures >= core.queue.total_items() {
            info!(failures = core.consecutive_failures, "Every item failed, giving up");
            None
        } else {
            core.queue.next_index(true).filter(|&next| next != failed)
        };

        if next.is_none() {
            self.transition(core, PlaybackState::Waiting);
        }
        next
    }

    /// Fail the loaded item and skip past it.
    pub(super) async fn fail_active(self: &Arc<Self>, core: &mut PlayerCore, message: String) {
        let Some(active) = core.active.as_ref() else {
            return;
        };
        let index = active.index;
        let url = Some(active.url.to_string());

        self.report_failure(core, index, url, message).await;
        if let Some(next) = self.next_after_failure(core, index) {
            self.load_with_skip(core, next).await;
        }
    }
}
