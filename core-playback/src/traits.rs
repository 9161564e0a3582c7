//! # Media Transport Abstraction
//!
//! The player does not decode or render audio. It drives a host-provided
//! [`MediaTransport`] (AVPlayer, ExoPlayer, a GStreamer pipeline) and listens
//! to the [`DecoderEvent`]s the host pushes back through
//! [`Player::handle_decoder_event`](crate::player::Player::handle_decoder_event).
//!
//! ## Loading
//!
//! Every item is handed to the transport as a [`MediaSource`]:
//!
//! - `LocalFile` when a complete cached copy already exists on disk
//! - `Intercepted` when the item should be cached while it plays; the
//!   transport must route byte-range reads for the marker URL to the enclosed
//!   [`StreamCache`]
//! - `Remote` when caching is disabled and the transport can fetch directly
//!
//! ## Example
//!
//! ```rust,no_run
//! # use core_playback::{DecoderEvent, MediaSource, MediaTransport, StreamCache, RangeRequest};
//! # use std::time::Duration;
//! struct HostTransport;
//!
//! #[async_trait::async_trait]
//! impl MediaTransport for HostTransport {
//!     async fn load(&self, source: MediaSource) -> core_playback::Result<()> {
//!         if let MediaSource::Intercepted { cache, .. } = source {
//!             // Wire the host's resource loader to the cache.
//!             let _reply = cache.request_range(RangeRequest::new(0, 2));
//!         }
//!         Ok(())
//!     }
//!     async fn play(&self) -> core_playback::Result<()> { Ok(()) }
//!     async fn pause(&self) -> core_playback::Result<()> { Ok(()) }
//!     async fn seek(&self, _position: Duration) -> core_playback::Result<()> { Ok(()) }
//!     fn position(&self) -> Duration { Duration::ZERO }
//!     async fn unload(&self) -> core_playback::Result<()> { Ok(()) }
//! }
//! ```

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::Result;
use crate::stream_cache::StreamCache;

// ============================================================================
// Media Source
// ============================================================================

/// What the transport should play for the current item.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// A complete local copy of the item.
    LocalFile {
        /// Absolute path to the cached file
        path: PathBuf,
    },

    /// The remote URL, fetched by the transport itself.
    Remote { url: Url },

    /// Marker-scheme URL whose reads are served by `cache`.
    Intercepted { url: Url, cache: StreamCache },
}

impl MediaSource {
    /// Returns `true` if this source requires network access.
    pub fn is_remote(&self) -> bool {
        !matches!(self, MediaSource::LocalFile { .. })
    }

    /// The stream cache backing this source, if any.
    pub fn stream_cache(&self) -> Option<&StreamCache> {
        match self {
            MediaSource::Intercepted { cache, .. } => Some(cache),
            _ => None,
        }
    }
}

// ============================================================================
// Decoder Events
// ============================================================================

/// Signals the host's decoder pushes into the player.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    /// The loaded item can start playing.
    ReadyToPlay,
    /// The item cannot be played.
    Failed { message: String },
    /// Playback stopped because data did not arrive in time.
    Stalled,
    /// The decoder's playback buffer ran dry.
    BufferEmpty,
    /// Enough data is buffered to keep playing.
    LikelyToKeepUp,
    /// Playback reached the end of the item.
    ReachedEnd,
    /// Amount of media the decoder has loaded.
    LoadedRange {
        loaded: Duration,
        total: Option<Duration>,
    },
    /// Playback position heartbeat.
    Position {
        current: Duration,
        total: Option<Duration>,
    },
}

// ============================================================================
// Media Transport
// ============================================================================

/// Host media engine driven by the player.
///
/// Calls are serialized by the player; implementations never see two
/// concurrent calls from the same player.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Load a new item, replacing whatever was loaded.
    ///
    /// The transport reports readiness or failure later through
    /// [`DecoderEvent`]s; returning an error here is treated as an immediate
    /// failure of the item.
    async fn load(&self, source: MediaSource) -> Result<()>;

    /// Start or resume playback of the loaded item.
    async fn play(&self) -> Result<()>;

    /// Pause playback without releasing the item.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position in the loaded item.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Elapsed time in the loaded item.
    fn position(&self) -> Duration;

    /// Release the loaded item.
    async fn unload(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_source_classification() {
        let local = MediaSource::LocalFile {
            path: "/cache/a.mp3".into(),
        };
        assert!(!local.is_remote());
        assert!(local.stream_cache().is_none());

        let remote = MediaSource::Remote {
            url: Url::parse("https://cdn.example.com/a.mp3").unwrap(),
        };
        assert!(remote.is_remote());
        assert!(remote.stream_cache().is_none());
    }

    #[test]
    fn decoder_events_compare() {
        assert_eq!(DecoderEvent::Stalled, DecoderEvent::Stalled);
        assert_ne!(
            DecoderEvent::Failed {
                message: "a".into()
            },
            DecoderEvent::Failed {
                message: "b".into()
            }
        );
    }
}
