//! # Streaming Playback Core
//!
//! Drives a host media transport through a host-owned queue of remote items,
//! serving their bytes from a progressive-download cache.
//!
//! ## Overview
//!
//! - [`StreamCache`]: one download per item, answering byte-range reads as
//!   data arrives and optionally persisting the finished file
//! - [`PlaybackQueue`]: next/previous resolution with repeat and shuffle
//! - [`Player`]: the playback state machine, publishing
//!   [`CoreEvent`](core_runtime::events::CoreEvent)s on an event bus
//!
//! The host supplies a [`MediaTransport`] (its decoder) and a
//! [`QueueDataSource`](bridge_traits::QueueDataSource) (its queue model), and
//! forwards decoder signals as [`DecoderEvent`]s.

pub mod config;
pub mod error;
pub mod player;
pub mod queue;
pub mod stream_cache;
pub mod traits;

pub use config::{PlayerConfig, StreamCacheOptions};
pub use error::{PlaybackError, Result};
pub use player::Player;
pub use queue::{PlaybackQueue, RepeatMode};
pub use stream_cache::{
    ContentInfo, DownloadState, PendingRange, RangeReply, RangeRequest, RangeResponse, RequestId,
    StreamCache, StreamCacheEvent,
};
pub use traits::{DecoderEvent, MediaSource, MediaTransport};

pub use core_runtime::events::PlaybackState;
