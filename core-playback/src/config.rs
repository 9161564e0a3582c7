//! # Player Configuration
//!
//! Settings for the player state machine and for individual stream caches.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PlaybackError, Result};
use crate::queue::RepeatMode;

/// Player configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// How far into an item `previous()` restarts it instead of going back.
    ///
    /// Default: 4 seconds.
    #[serde(default = "default_restart_threshold")]
    pub restart_threshold: Duration,

    /// Initial repeat mode.
    ///
    /// Default: `RepeatMode::None`.
    #[serde(default)]
    pub repeat_mode: RepeatMode,

    /// Whether the queue starts shuffled.
    ///
    /// Default: false.
    #[serde(default)]
    pub shuffle: bool,

    /// Advance to the next item automatically when the current one fails.
    ///
    /// Default: true.
    #[serde(default = "default_skip_on_failure")]
    pub skip_on_failure: bool,

    /// Scheme prefix the transport sees for intercepted items.
    ///
    /// `https://host/a.mp3` is handed to the transport as
    /// `streaming+https://host/a.mp3` so that its reads are routed to the
    /// stream cache instead of the network.
    ///
    /// Default: `"streaming"`.
    #[serde(default = "default_intercept_scheme")]
    pub intercept_scheme: String,

    /// Time allowed for the item download's response headers. Reading the
    /// body is not bounded.
    ///
    /// Default: none.
    #[serde(default)]
    pub request_timeout: Option<Duration>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            restart_threshold: default_restart_threshold(),
            repeat_mode: RepeatMode::default(),
            shuffle: false,
            skip_on_failure: default_skip_on_failure(),
            intercept_scheme: default_intercept_scheme(),
            request_timeout: None,
        }
    }
}

impl PlayerConfig {
    pub fn with_restart_threshold(mut self, threshold: Duration) -> Self {
        self.restart_threshold = threshold;
        self
    }

    pub fn with_repeat_mode(mut self, mode: RepeatMode) -> Self {
        self.repeat_mode = mode;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_skip_on_failure(mut self, skip: bool) -> Self {
        self.skip_on_failure = skip;
        self
    }

    pub fn with_intercept_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.intercept_scheme = scheme.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let scheme = self.intercept_scheme.as_str();
        let mut chars = scheme.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        // '+' separates the marker from the transport scheme, so it cannot
        // appear inside the marker.
        let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'));

        if !starts_alpha || !rest_valid {
            return Err(PlaybackError::Config(format!(
                "intercept_scheme {:?} is not a valid URL scheme",
                scheme
            )));
        }

        if matches!(scheme, "http" | "https" | "file") {
            return Err(PlaybackError::Config(format!(
                "intercept_scheme cannot be the transport scheme {:?}",
                scheme
            )));
        }

        Ok(())
    }
}

fn default_restart_threshold() -> Duration {
    Duration::from_secs(4)
}

fn default_skip_on_failure() -> bool {
    true
}

fn default_intercept_scheme() -> String {
    "streaming".to_string()
}

/// Options for a single stream cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamCacheOptions {
    /// Where the completed download is written.
    pub cache_path: Option<PathBuf>,
    /// Policy flag from the data source.
    pub caching_enabled: bool,
    /// Time allowed for the download's response headers.
    pub request_timeout: Option<Duration>,
}

impl StreamCacheOptions {
    /// Options with caching turned off.
    pub fn uncached() -> Self {
        Self::default()
    }

    /// Options that persist the download to `path`.
    pub fn cached_at(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: Some(path.into()),
            caching_enabled: true,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Caching needs both the flag and a non-empty path.
    pub fn is_caching_enabled(&self) -> bool {
        self.caching_enabled
            && self
                .cache_path
                .as_ref()
                .is_some_and(|p| !p.as_os_str().is_empty())
    }
}
