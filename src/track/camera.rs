//! Platform capabilities: graphics probe and camera permission

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

/// Graphics capability probe
///
/// Checked first in the precondition chain: a device that cannot create
/// a rendering context fails before anything else runs.
pub trait GraphicsProbe: Send + Sync {
    /// Whether a rendering context can be created on this device
    fn create_context(&self) -> bool;
}

/// How a camera permission request was refused
#[derive(Debug)]
pub enum CameraDenial {
    /// The user (or a policy) denied access
    Denied,
    /// No camera device exists
    NotFound,
    /// Another process holds the camera
    InUse,
    /// Anything else the platform reported
    Other(anyhow::Error),
}

/// A granted probe stream
///
/// Only used to verify access; the tracking engine manages the real
/// camera channel, so the probe is released immediately after a grant.
#[derive(Debug)]
pub struct ProbeStream {
    released: Arc<AtomicBool>,
}

impl ProbeStream {
    pub fn new() -> Self {
        Self {
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to the release flag, for observing the revocation
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    /// Revoke the stream
    pub fn release(self) {
        debug!("camera probe stream released");
        self.released.store(true, Ordering::Release);
    }
}

impl Default for ProbeStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera permission facility
///
/// The request may block indefinitely on a user prompt; no timeout is
/// imposed here. The caller offers retry, not cancellation.
#[async_trait]
pub trait CameraAccess: Send + Sync {
    async fn request_stream(&self) -> Result<ProbeStream, CameraDenial>;
}
