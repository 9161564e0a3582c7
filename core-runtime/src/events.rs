//! # Event Bus System
//!
//! Typed event fan-out for the player core using `tokio::sync::broadcast`.
//! The player never calls back into the host directly: everything a host
//! would observe (state transitions, item lifecycle, download progress,
//! cache results) is published here and consumed by any number of
//! subscribers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Player       ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Host UI    │
//!                                │ (broadcast│                  └────────────┘
//! ┌──────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │ Stream cache ├──────────────>│           ├─────────────────>│ Now playing│
//! └──────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PlaybackState};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::StateDidChange {
//!         from: PlaybackState::Waiting,
//!         to: PlaybackState::Buffering,
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Playback state changed");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed `n`
//!   events. Non-fatal; keep receiving.
//! - **`RecvError::Closed`**: every sender has been dropped. Treat as shutdown.
//!
//! `emit` returns an error when nobody is subscribed. The player ignores that
//! error: a host that does not listen simply sees nothing.

use bridge_traits::source::MediaInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position heartbeats are the highest-volume event; 100 slots absorbs a few
/// seconds of them for a slow subscriber before it starts lagging.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// State machine and item lifecycle events
    Playback(PlaybackEvent),
    /// Progressive download and cache persistence events
    Cache(CacheEvent),
}

impl CoreEvent {
    /// Human-readable description of the event
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
        }
    }

    /// Severity used by hosts to decide whether to surface the event
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::ItemFailed { .. }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::CacheWriteFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::ItemStarted { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::StateDidChange { .. }) => EventSeverity::Info,
            CoreEvent::Cache(CacheEvent::ItemCached { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Player state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlaybackState {
    /// Nothing loaded. Initial state, and where `stop()` lands.
    #[default]
    Waiting,
    /// An item is loaded but the decoder cannot play yet.
    Buffering,
    Playing,
    Paused,
    /// The current item failed. Always followed by an automatic advance.
    Failed,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Waiting => "waiting",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Playback Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Emitted immediately before a state transition
    StateWillChange {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// Emitted immediately after a state transition
    StateDidChange {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// First readiness of a freshly loaded item
    ItemStarted { index: usize, info: MediaInfo },
    /// The item could not be played; the player skips forward next
    ItemFailed {
        index: usize,
        url: Option<String>,
        message: String,
    },
    /// Amount of media the decoder has loaded
    Progress {
        loaded_secs: f64,
        total_secs: Option<f64>,
    },
    /// Playback position heartbeat
    PositionChanged {
        current_secs: f64,
        total_secs: Option<f64>,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StateWillChange { .. } => "Playback state changing",
            PlaybackEvent::StateDidChange { .. } => "Playback state changed",
            PlaybackEvent::ItemStarted { .. } => "Item started",
            PlaybackEvent::ItemFailed { .. } => "Item failed to play",
            PlaybackEvent::Progress { .. } => "Load progress",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    DownloadProgress {
        index: usize,
        bytes_received: u64,
        expected_bytes: Option<u64>,
    },
    /// The complete download was written to disk
    ItemCached {
        index: usize,
        source_url: String,
        file_url: String,
    },
    /// Persisting the download failed. Playback is unaffected.
    CacheWriteFailed { index: usize, message: String },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::DownloadProgress { .. } => "Download in progress",
            CacheEvent::ItemCached { .. } => "Item cached to disk",
            CacheEvent::CacheWriteFailed { .. } => "Failed to write cache file",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for core events.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see the event, or an error
    /// if there are none. Never blocks.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Subscription that only yields events matching an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let cache_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Cache(_)));
/// # drop(cache_only);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    /// Wait for the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Return the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
