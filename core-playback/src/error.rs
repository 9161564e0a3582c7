//! # Playback Error Types
//!
//! Error types for the stream cache, the queue and the player.

use bridge_traits::error::BridgeError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The data source could not resolve an item to a URL.
    #[error("Failed to resolve item {index}: {message}")]
    SourceResolution { index: usize, message: String },

    /// The index does not address an item in the queue.
    #[error("Invalid queue index {index} (queue has {total} items)")]
    InvalidIndex { index: usize, total: usize },

    /// A URL could not be rewritten between transport and marker schemes.
    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),

    // ========================================================================
    // Streaming Errors
    // ========================================================================
    /// Network streaming failed.
    #[error("Streaming failed: {0}")]
    StreamingFailed(String),

    /// The server answered with an error status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The server sent no response headers in time.
    #[error("No response within {0:?}")]
    ResponseTimeout(Duration),

    /// A deferred range read was dropped before it could be answered.
    #[error("Range request cancelled")]
    RangeCancelled,

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// Writing the completed download to disk failed.
    #[error("Cache write failed: {0}")]
    CacheWrite(String),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The host media transport rejected an operation.
    #[error("Media transport error: {0}")]
    Transport(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Invalid player configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error reported by a host bridge.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::StreamingFailed(_) | PlaybackError::ResponseTimeout(_) => true,
            PlaybackError::HttpStatus { status, .. } => *status >= 500,
            PlaybackError::Bridge(e) => e.is_network(),
            _ => false,
        }
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        match self {
            PlaybackError::StreamingFailed(_)
            | PlaybackError::ResponseTimeout(_)
            | PlaybackError::HttpStatus { .. } => true,
            PlaybackError::Bridge(e) => e.is_network(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
