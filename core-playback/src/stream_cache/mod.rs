//! # Stream Cache
//!
//! Serves byte-range reads for one remote item while it is still being
//! downloaded, and persists the completed download to local storage.
//!
//! ## Overview
//!
//! ```text
//!  transport ──request_range──▶ ┌──────────────┐ ◀──chunks── download task
//!            ◀──Ready/Deferred── │ StreamCache  │             (one per cache)
//!                                │  buffer      │
//!                                │  pending     │ ──write_file──▶ FileSystemAccess
//!                                └──────┬───────┘
//!                                       │ StreamCacheEvent
//!                                       ▼
//!                                     owner
//! ```
//!
//! - The download starts lazily on the first read that cannot be answered
//!   from the buffer, and at most once per cache.
//! - A read is answered exactly once, when the buffer holds its whole range.
//!   Reads still open when the download completes are answered with whatever
//!   bytes exist (possibly none) and `end_of_stream` set.
//! - A failed download leaves open reads queued; the owner is expected to
//!   [`invalidate`](StreamCache::invalidate) the cache.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_playback::stream_cache::{RangeRequest, StreamCache};
//! use core_playback::StreamCacheOptions;
//! # use std::sync::Arc;
//! # async fn demo(http: Arc<dyn bridge_traits::HttpClient>, fs: Arc<dyn bridge_traits::FileSystemAccess>) -> core_playback::Result<()> {
//! let url = url::Url::parse("https://cdn.example.com/track.mp3").unwrap();
//! let (cache, _events) = StreamCache::new(url, StreamCacheOptions::cached_at("/tmp/track.mp3"), http, fs);
//!
//! let response = cache.request_range(RangeRequest::new(0, 4096)).into_response().await?;
//! assert_eq!(response.offset, 0);
//! # Ok(())
//! # }
//! ```

mod loader;
pub mod request;
pub mod scheme;

pub use request::{ContentInfo, PendingRange, RangeReply, RangeRequest, RangeResponse, RequestId};

use bridge_traits::{FileSystemAccess, HttpClient};
use bytes::Bytes;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::StreamCacheOptions;

/// Notifications a stream cache sends to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamCacheEvent {
    /// Response headers arrived.
    ResponseReceived { content: ContentInfo },
    /// A chunk was appended to the buffer.
    DownloadProgress {
        bytes_received: u64,
        expected_bytes: Option<u64>,
    },
    /// The download finished; every open read has been answered.
    Completed { total_bytes: u64 },
    /// The download failed. Open reads stay queued.
    Failed { message: String, network: bool },
    /// The complete download was written to `path`.
    Cached { source_url: Url, path: PathBuf },
    /// Writing the cache file failed. Playback is unaffected.
    CacheWriteFailed { message: String },
}

/// Lifecycle of the single download a cache performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    NotStarted,
    Running,
    Completed,
    Failed,
    Invalidated,
}

struct PendingRead {
    id: RequestId,
    request: RangeRequest,
    reply: oneshot::Sender<RangeResponse>,
}

struct CacheState {
    buffer: Vec<u8>,
    content: Option<ContentInfo>,
    pending: Vec<PendingRead>,
    download: DownloadState,
}

type Resolved = Vec<(oneshot::Sender<RangeResponse>, RangeResponse)>;

impl CacheState {
    fn buffered(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Answer for `request` if it can be given now.
    fn try_answer(&self, request: &RangeRequest) -> Option<RangeResponse> {
        let buffered = self.buffered();
        let start = request.start_offset();
        let end = request.end_offset();
        let complete = self.download == DownloadState::Completed;

        if buffered >= end {
            // Both bounds are within the buffer, so they fit in usize.
            let data = Bytes::copy_from_slice(&self.buffer[start as usize..end as usize]);
            return Some(RangeResponse {
                offset: start,
                data,
                end_of_stream: complete && end == buffered,
                content: self.content.clone(),
            });
        }

        if complete {
            let available = if start < buffered {
                Bytes::copy_from_slice(&self.buffer[start as usize..])
            } else {
                Bytes::new()
            };
            return Some(RangeResponse {
                offset: start,
                data: available,
                end_of_stream: true,
                content: self.content.clone(),
            });
        }

        None
    }

    /// Re-evaluate every queued read in arrival order.
    fn drain_satisfied(&mut self) -> Resolved {
        let reads = std::mem::take(&mut self.pending);
        let mut resolved = Vec::new();
        let mut still_pending = Vec::with_capacity(reads.len());

        for read in reads {
            match self.try_answer(&read.request) {
                Some(response) => {
                    trace!(
                        id = read.id,
                        offset = response.offset,
                        length = response.data.len(),
                        "Range resolved"
                    );
                    resolved.push((read.reply, response));
                }
                None => still_pending.push(read),
            }
        }

        self.pending = still_pending;
        resolved
    }
}

/// Delivers answers outside the state lock.
fn deliver(resolved: Resolved) {
    for (reply, response) in resolved {
        // The requester may have dropped its handle; nothing to do then.
        let _ = reply.send(response);
    }
}

pub(crate) struct Inner {
    source_url: Url,
    options: StreamCacheOptions,
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystemAccess>,
    events: mpsc::UnboundedSender<StreamCacheEvent>,
    state: Mutex<CacheState>,
    cancel: CancellationToken,
    next_request_id: AtomicU64,
}

impl Inner {
    fn notify(&self, event: StreamCacheEvent) {
        // A closed channel means the owner is gone and no longer cares.
        let _ = self.events.send(event);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Progressive-download cache for one media item.
///
/// Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct StreamCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StreamCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("StreamCache")
            .field("source_url", &self.inner.source_url.as_str())
            .field("buffered", &state.buffer.len())
            .field("pending", &state.pending.len())
            .field("download", &state.download)
            .finish()
    }
}

impl StreamCache {
    /// Create a cache for `source_url`.
    ///
    /// `source_url` may carry the intercept marker scheme; it is stripped
    /// before the download hits the network. The returned receiver yields the
    /// cache's [`StreamCacheEvent`]s and may be dropped if unused.
    pub fn new(
        source_url: Url,
        options: StreamCacheOptions,
        http: Arc<dyn HttpClient>,
        fs: Arc<dyn FileSystemAccess>,
    ) -> (Self, mpsc::UnboundedReceiver<StreamCacheEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Inner {
            source_url,
            options,
            http,
            fs,
            events,
            state: Mutex::new(CacheState {
                buffer: Vec::new(),
                content: None,
                pending: Vec::new(),
                download: DownloadState::NotStarted,
            }),
            cancel: CancellationToken::new(),
            next_request_id: AtomicU64::new(1),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    pub fn source_url(&self) -> &Url {
        &self.inner.source_url
    }

    pub fn options(&self) -> &StreamCacheOptions {
        &self.inner.options
    }

    pub fn is_caching_enabled(&self) -> bool {
        self.inner.options.is_caching_enabled()
    }

    /// Bytes received so far.
    pub fn buffered_len(&self) -> u64 {
        self.inner.state.lock().buffered()
    }

    /// Content information, once the response headers have arrived.
    pub fn content_info(&self) -> Option<ContentInfo> {
        self.inner.state.lock().content.clone()
    }

    pub fn download_state(&self) -> DownloadState {
        self.inner.state.lock().download
    }

    /// Number of reads waiting for data.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Issue a byte-range read.
    ///
    /// Answered immediately when the buffer already holds the whole range,
    /// otherwise queued. The first queued read starts the download.
    pub fn request_range(&self, request: RangeRequest) -> RangeReply {
        let mut state = self.inner.state.lock();

        if let Some(response) = state.try_answer(&request) {
            trace!(
                offset = response.offset,
                length = response.data.len(),
                "Range answered from buffer"
            );
            return RangeReply::Ready(response);
        }

        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (reply, receiver) = oneshot::channel();

        if state.download == DownloadState::Invalidated {
            // Sender dropped here: the caller observes a cancelled read.
            debug!(id, "Range requested on invalidated cache");
            return RangeReply::Deferred(PendingRange::new(id, receiver));
        }

        state.pending.push(PendingRead { id, request, reply });
        trace!(
            id,
            offset = request.start_offset(),
            length = request.requested_length,
            buffered = state.buffered(),
            "Range queued"
        );

        if state.download == DownloadState::NotStarted {
            state.download = DownloadState::Running;
            drop(state);
            self.start_download();
        }

        RangeReply::Deferred(PendingRange::new(id, receiver))
    }

    /// Remove a queued read. Returns `false` if it was already answered.
    ///
    /// The download keeps going for the other reads and for caching.
    pub fn cancel_request(&self, id: RequestId) -> bool {
        let mut state = self.inner.state.lock();
        let before = state.pending.len();
        state.pending.retain(|read| read.id != id);
        let removed = state.pending.len() != before;
        if removed {
            trace!(id, "Range cancelled");
        }
        removed
    }

    /// Whether a complete local copy exists.
    ///
    /// When true the transport should play the file and never issue reads
    /// against this cache.
    pub async fn has_local_copy(&self) -> bool {
        let Some(path) = self.cache_path() else {
            return false;
        };
        match self.inner.fs.exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(error = %e, "Failed to check for cached copy");
                false
            }
        }
    }

    /// Cache file destination when caching is enabled.
    pub fn cache_path(&self) -> Option<&std::path::Path> {
        if self.is_caching_enabled() {
            self.inner.options.cache_path.as_deref()
        } else {
            None
        }
    }

    /// Cancel the download, drop every queued read and release the buffer.
    pub fn invalidate(&self) {
        self.inner.cancel.cancel();

        let dropped = {
            let mut state = self.inner.state.lock();
            if state.download == DownloadState::Invalidated {
                return;
            }
            state.download = DownloadState::Invalidated;
            state.buffer = Vec::new();
            state.content = None;
            std::mem::take(&mut state.pending)
        };

        debug!(pending = dropped.len(), "Stream cache invalidated");
        // Dropping the senders resolves each waiter with RangeCancelled.
        drop(dropped);
    }

    fn start_download(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(&self.inner);
                let cancel = self.inner.cancel.clone();
                handle.spawn(loader::run(weak, cancel));
            }
            Err(_) => {
                warn!("No async runtime available, download cannot start");
                self.inner.state.lock().download = DownloadState::Failed;
                self.inner.notify(StreamCacheEvent::Failed {
                    message: "no async runtime available".to_string(),
                    network: false,
                });
            }
        }
    }
}
