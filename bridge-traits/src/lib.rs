//! # Host Bridge Traits
//!
//! Capabilities the playback core needs from its host but does not implement
//! itself.
//!
//! ## Overview
//!
//! The core plays a consumer-supplied queue of remote media items. It never
//! talks to the network, the disk or the host's queue model directly; instead
//! it goes through the traits defined here so that every platform (desktop,
//! mobile, tests) can plug in its own implementation.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Streaming GET used by the stream cache
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Cache file persistence
//!
//! ### Queue model
//! - [`QueueDataSource`](source::QueueDataSource) - Item count, URL resolution,
//!   caching policy and descriptive metadata per queue index
//!
//! ### Utilities
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Tests    | hand-written mocks  |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep the message actionable
//! (URL, path, status code).
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so implementations can be shared across
//! the tasks the core spawns (one download task per active item).

pub mod error;
pub mod http;
pub mod source;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpStream, ResponseHead};
pub use source::{MediaInfo, QueueDataSource};
pub use storage::FileSystemAccess;
pub use time::{LogEntry, LogLevel, LoggerSink};
