//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the stream player core:
//! - Logging and tracing setup
//! - Bridge configuration
//! - Event bus carrying playback and cache events
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one for its logging
//! conventions and for the typed event channel the player publishes to in
//! place of host callbacks.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
