//! Download task feeding a stream cache.

use bridge_traits::http::{HttpRequest, ResponseHead};
use bytes::Bytes;
use futures::StreamExt;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{deliver, scheme, ContentInfo, DownloadState, Inner, StreamCacheEvent};
use crate::error::PlaybackError;
use core_runtime::logging::{redact_url, strip_path};

/// Marker prefix stripped from intercepted URLs before the request is sent.
const MARKER_SEPARATOR: char = '+';

/// Drive the single download of a cache until it completes, fails or is
/// cancelled.
///
/// Holds only a weak reference between steps so that dropping the last
/// cache handle ends the task.
#[instrument(skip_all)]
pub(super) async fn run(cache: Weak<Inner>, cancel: CancellationToken) {
    let Some(request) = build_request(&cache) else {
        return;
    };
    let url = request.url.clone();
    debug!(url = %redact_url(&url), "Starting download");

    let opened = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("Download cancelled before headers");
            return;
        }
        opened = open(&cache, request) => opened,
    };

    let mut body = match opened {
        Ok(body) => body,
        Err(error) => {
            fail(&cache, error);
            return;
        }
    };

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(url = %redact_url(&url), "Download cancelled");
                return;
            }
            next = body.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                if !on_chunk(&cache, chunk) {
                    return;
                }
            }
            Some(Err(e)) => {
                fail(&cache, PlaybackError::StreamingFailed(e.to_string()));
                return;
            }
            None => break,
        }
    }

    on_complete(&cache).await;
}

fn build_request(cache: &Weak<Inner>) -> Option<HttpRequest> {
    let inner = cache.upgrade()?;
    let source = &inner.source_url;

    // The marker is whatever precedes the first '+' in the scheme; a bare
    // non-http scheme is a marker on its own.
    let source_scheme = source.scheme();
    let transport_url = match source_scheme.split_once(MARKER_SEPARATOR) {
        Some((marker, _)) => scheme::to_transport(source, marker),
        None if !matches!(source_scheme, "http" | "https") => {
            scheme::to_transport(source, source_scheme)
        }
        None => Ok(source.clone()),
    };

    let transport_url = match transport_url {
        Ok(url) => url,
        Err(e) => {
            drop(inner);
            fail(cache, e);
            return None;
        }
    };

    Some(HttpRequest::get(transport_url.as_str()))
}

async fn open(
    cache: &Weak<Inner>,
    request: HttpRequest,
) -> Result<bridge_traits::ByteStream, PlaybackError> {
    let (http, timeout) = match cache.upgrade() {
        Some(inner) => (Arc::clone(&inner.http), inner.options.request_timeout),
        None => return Err(PlaybackError::RangeCancelled),
    };

    // Bounds the wait for headers only.
    let url = request.url.clone();
    let stream = match timeout {
        Some(limit) => tokio::time::timeout(limit, http.open_stream(request))
            .await
            .map_err(|_| PlaybackError::ResponseTimeout(limit))??,
        None => http.open_stream(request).await?,
    };

    if stream.head.status >= 400 {
        return Err(PlaybackError::HttpStatus {
            status: stream.head.status,
            url: redact_url(&url).to_string(),
        });
    }

    on_response(cache, &stream.head);
    Ok(stream.body)
}

fn on_response(cache: &Weak<Inner>, head: &ResponseHead) {
    let Some(inner) = cache.upgrade() else {
        return;
    };

    let content = ContentInfo {
        content_type: head.mime_type.clone(),
        content_length: head.content_length,
        byte_range_access: true,
    };

    debug!(
        status = head.status,
        content_type = ?content.content_type,
        content_length = ?content.content_length,
        "Response received"
    );

    let resolved = {
        let mut state = inner.state.lock();
        if state.download != DownloadState::Running {
            return;
        }
        state.buffer.clear();
        if let Some(length) = head.content_length {
            state.buffer.reserve(length.min(64 * 1024 * 1024) as usize);
        }
        state.content = Some(content.clone());
        state.drain_satisfied()
    };

    deliver(resolved);
    inner.notify(StreamCacheEvent::ResponseReceived { content });
}

/// Append a chunk and answer what it satisfies. Returns `false` once the
/// cache is gone.
fn on_chunk(cache: &Weak<Inner>, chunk: Bytes) -> bool {
    let Some(inner) = cache.upgrade() else {
        return false;
    };

    let (resolved, received, expected) = {
        let mut state = inner.state.lock();
        if state.download != DownloadState::Running {
            return false;
        }
        state.buffer.extend_from_slice(&chunk);
        let resolved = state.drain_satisfied();
        let expected = state.content.as_ref().and_then(|c| c.content_length);
        (resolved, state.buffered(), expected)
    };

    deliver(resolved);
    inner.notify(StreamCacheEvent::DownloadProgress {
        bytes_received: received,
        expected_bytes: expected,
    });
    true
}

async fn on_complete(cache: &Weak<Inner>) {
    let Some(inner) = cache.upgrade() else {
        return;
    };

    let (resolved, snapshot, total_bytes) = {
        let mut state = inner.state.lock();
        if state.download != DownloadState::Running {
            return;
        }
        state.download = DownloadState::Completed;
        let resolved = state.drain_satisfied();
        let snapshot = inner
            .options
            .is_caching_enabled()
            .then(|| Bytes::copy_from_slice(&state.buffer));
        (resolved, snapshot, state.buffered())
    };

    info!(
        url = %redact_url(inner.source_url.as_str()),
        bytes = total_bytes,
        answered = resolved.len(),
        "Download completed"
    );
    deliver(resolved);
    inner.notify(StreamCacheEvent::Completed { total_bytes });

    let (Some(data), Some(path)) = (snapshot, inner.options.cache_path.clone()) else {
        return;
    };

    let fs = Arc::clone(&inner.fs);
    let events = inner.events.clone();
    let source_url = inner.source_url.clone();
    // The write outlives the cache if the owner lets go of it meanwhile.
    drop(inner);

    let file = strip_path(&path.to_string_lossy()).to_string();
    let event = match fs.write_file(&path, data).await {
        Ok(()) => {
            info!(file = %file, "Cached item to disk");
            StreamCacheEvent::Cached { source_url, path }
        }
        Err(e) => {
            warn!(file = %file, error = %e, "Failed to write cache file");
            StreamCacheEvent::CacheWriteFailed {
                message: e.to_string(),
            }
        }
    };
    let _ = events.send(event);
}

fn fail(cache: &Weak<Inner>, error: PlaybackError) {
    let Some(inner) = cache.upgrade() else {
        return;
    };

    {
        let mut state = inner.state.lock();
        if state.download != DownloadState::Running {
            return;
        }
        state.download = DownloadState::Failed;
    }

    warn!(
        url = %redact_url(inner.source_url.as_str()),
        error = %error,
        "Download failed"
    );
    inner.notify(StreamCacheEvent::Failed {
        message: error.to_string(),
        network: error.is_network_error(),
    });
}
