//! Queue data source
//!
//! The host owns the list of media items; the core only ever sees indices.
//! Everything it needs to know about an index (where to fetch it, whether to
//! keep a local copy, what to show for it) is asked through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::Result;

/// Descriptive metadata for a queue item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Location of the album art, if the host has one.
    pub artwork_url: Option<String>,
}

impl MediaInfo {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            artwork_url: None,
        }
    }

    pub fn with_artwork(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }
}

/// Host-side model of the playback queue.
///
/// Only `total_items` and `url_for_item` are required. The optional methods
/// default to "no caching", empty metadata and no preferred next item.
///
/// `total_items` is polled on every queue access and may change between
/// calls as the host adds or removes items.
#[async_trait]
pub trait QueueDataSource: Send + Sync {
    /// Number of items currently in the queue.
    fn total_items(&self) -> usize;

    /// Resolve a queue index to the remote location of its media.
    ///
    /// # Errors
    ///
    /// Implementations report an error when the item cannot be resolved (for
    /// example a signed URL could not be fetched); the player treats that as
    /// a failed item and skips forward.
    async fn url_for_item(&self, index: usize) -> Result<Url>;

    /// Whether the item at `index` should be cached to local storage.
    fn should_cache_item(&self, _index: usize) -> bool {
        false
    }

    /// Destination of the cache file for the item at `index`.
    fn cache_path_for_item(&self, _index: usize) -> Option<PathBuf> {
        None
    }

    /// Descriptive metadata for the item at `index`.
    fn media_info(&self, _index: usize) -> MediaInfo {
        MediaInfo::default()
    }

    /// Overrides the queue's own ordering for the next item when set.
    fn preferred_next_index(&self) -> Option<usize> {
        None
    }
}
