//! Session configuration
//!
//! Paths and readiness bounds for one AR session. Everything here has a
//! sensible default so embedding applications can construct a session
//! with `SessionConfig::default()` or deserialize one from JSON.

use std::time::Duration;

use serde::Deserialize;

/// Default poll interval for the tracking-engine readiness wait
pub const DEFAULT_READINESS_POLL_MS: u64 = 100;

/// Default maximum number of readiness poll attempts
pub const DEFAULT_READINESS_MAX_ATTEMPTS: u32 = 50;

/// Configuration for one AR session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the compiled tracking-target resource
    pub target_path: String,

    /// Poll interval of the readiness wait, in milliseconds
    pub readiness_poll_ms: u64,

    /// Maximum number of readiness poll attempts before giving up
    pub readiness_max_attempts: u32,

    /// Target frame interval of the render loop, in milliseconds
    pub frame_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_path: "assets/targets/postcard.mind".to_string(),
            readiness_poll_ms: DEFAULT_READINESS_POLL_MS,
            readiness_max_attempts: DEFAULT_READINESS_MAX_ATTEMPTS,
            frame_interval_ms: 16,
        }
    }
}

impl SessionConfig {
    /// Total bound of the readiness wait (poll interval x max attempts)
    ///
    /// The wait itself is a timeout over the engine factory's readiness
    /// future, so the interval/attempt pair only defines the deadline.
    pub fn readiness_deadline(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms * u64::from(self.readiness_max_attempts))
    }

    /// Render loop tick interval
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
