//! Range request and response types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{PlaybackError, Result};

/// Identifies a deferred range request for cancellation.
pub type RequestId = u64;

/// A byte-range read issued by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    /// Offset the transport originally asked for.
    pub requested_offset: u64,
    /// Number of bytes the transport asked for.
    pub requested_length: u64,
    /// Read cursor of a request the transport has partially consumed.
    /// Zero means "not started"; the requested offset is used instead.
    pub current_offset: u64,
}

impl RangeRequest {
    pub fn new(offset: u64, length: u64) -> Self {
        Self {
            requested_offset: offset,
            requested_length: length,
            current_offset: 0,
        }
    }

    pub fn with_current_offset(mut self, offset: u64) -> Self {
        self.current_offset = offset;
        self
    }

    /// Offset the answer starts at.
    pub fn start_offset(&self) -> u64 {
        if self.current_offset != 0 {
            self.current_offset
        } else {
            self.requested_offset
        }
    }

    /// Buffered length at which the request can be answered in full.
    pub fn end_offset(&self) -> u64 {
        self.start_offset().saturating_add(self.requested_length)
    }
}

/// Content information taken from the download's response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    /// MIME type of the resource (e.g. `audio/mpeg`).
    pub content_type: Option<String>,
    /// Total size of the resource, if the server announced it.
    pub content_length: Option<u64>,
    /// Reads may address arbitrary offsets.
    pub byte_range_access: bool,
}

/// Answer to a range request.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeResponse {
    /// Offset of the first byte in `data`.
    pub offset: u64,
    pub data: Bytes,
    /// No bytes exist past `offset + data.len()`.
    pub end_of_stream: bool,
    /// Filled in once the response headers have arrived.
    pub content: Option<ContentInfo>,
}

impl RangeResponse {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of [`StreamCache::request_range`](super::StreamCache::request_range).
#[derive(Debug)]
pub enum RangeReply {
    /// Enough data was buffered to answer at once.
    Ready(RangeResponse),
    /// The request was queued and will be answered as data arrives.
    Deferred(PendingRange),
}

impl RangeReply {
    pub fn is_ready(&self) -> bool {
        matches!(self, RangeReply::Ready(_))
    }

    /// Wait for the answer, whichever way it comes.
    pub async fn into_response(self) -> Result<RangeResponse> {
        match self {
            RangeReply::Ready(response) => Ok(response),
            RangeReply::Deferred(pending) => pending.wait().await,
        }
    }
}

/// Handle to a queued range request.
///
/// Dropping it is allowed; the request stays queued until answered or
/// cancelled through [`StreamCache::cancel_request`](super::StreamCache::cancel_request).
#[derive(Debug)]
pub struct PendingRange {
    id: RequestId,
    receiver: oneshot::Receiver<RangeResponse>,
}

impl PendingRange {
    pub(crate) fn new(id: RequestId, receiver: oneshot::Receiver<RangeResponse>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait until the request is answered.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::RangeCancelled`] if the request was cancelled or the
    /// cache invalidated first.
    pub async fn wait(self) -> Result<RangeResponse> {
        self.receiver
            .await
            .map_err(|_| PlaybackError::RangeCancelled)
    }

    /// Non-blocking poll: `None` while the request is still queued.
    pub fn try_response(&mut self) -> Option<Result<RangeResponse>> {
        match self.receiver.try_recv() {
            Ok(response) => Some(Ok(response)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(PlaybackError::RangeCancelled)),
        }
    }
}
