//! Session state machine and per-session context

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::animation::AnimationEngine;
use crate::assets::ModelKey;
use crate::scene::{Object3d, ObjectId};
use crate::track::{Anchor, CameraHandle, Renderer, TrackingEngine};

/// Lifecycle states of one AR session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No initialization has been attempted
    #[default]
    Uninitialized,
    /// The precondition chain is running
    Initializing,
    /// All preconditions passed; tracking has not started
    Ready,
    /// The capture loop and render loop are running
    Tracking,
    /// Torn down by `stop()`; a fresh `initialize()` may follow
    Stopped,
    /// A precondition failed; a fresh `initialize()` may retry
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "Uninitialized"),
            SessionState::Initializing => write!(f, "Initializing"),
            SessionState::Ready => write!(f, "Ready"),
            SessionState::Tracking => write!(f, "Tracking"),
            SessionState::Stopped => write!(f, "Stopped"),
            SessionState::Failed => write!(f, "Failed"),
        }
    }
}

/// Everything one session owns, behind a single exclusive handle
///
/// All shared mutable state lives here, scoped to one controller
/// instance; there is no module-level session state, so parallel
/// sessions (and tests) cannot leak into each other.
pub(crate) struct SessionContext {
    pub state: SessionState,

    /// Initialization epoch; `stop()` increments it so an in-flight
    /// `initialize()` or model load can detect it went stale before
    /// committing anything.
    pub epoch: u64,

    pub engine: Option<Box<dyn TrackingEngine>>,
    pub renderer: Option<Arc<dyn Renderer>>,
    pub scene: Option<Object3d>,
    pub camera: Option<CameraHandle>,
    pub anchor: Option<Anchor>,

    /// Key and identity of the model currently attached to the anchor
    pub active_model: Option<(ModelKey, ObjectId)>,

    /// Whether the target is currently recognized
    pub is_tracking: bool,

    pub animation: AnimationEngine,

    /// Handle of the spawned render loop
    pub frame_task: Option<JoinHandle<()>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            epoch: 0,
            engine: None,
            renderer: None,
            scene: None,
            camera: None,
            anchor: None,
            active_model: None,
            is_tracking: false,
            animation: AnimationEngine::new(),
            frame_task: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.state, SessionState::Uninitialized);
        assert_eq!(ctx.epoch, 0);
        assert!(!ctx.is_tracking);
        assert!(ctx.engine.is_none());
        assert!(ctx.anchor.is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", SessionState::Uninitialized), "Uninitialized");
        assert_eq!(format!("{}", SessionState::Tracking), "Tracking");
    }
}
