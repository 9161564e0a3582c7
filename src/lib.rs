//! Workspace facade crate.
//!
//! Host applications can depend on `stream-player-workspace` and get the
//! player, stream cache and queue from `core-playback` together with the
//! runtime pieces (configuration, event bus, logging) from `core-runtime`
//! without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;

#[cfg(feature = "desktop-shims")]
pub use core_runtime as runtime;
