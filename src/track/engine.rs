//! Tracking engine interface and anchor types

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::scene::{Object3d, RendererSettings};

/// Construction parameters for a tracking engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identifier of the host element the engine binds its video to
    pub container: String,
    /// Path of the compiled tracking-target resource
    pub target_path: String,
}

/// Tracking events emitted for an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEvent {
    TargetFound,
    TargetLost,
}

/// Spatial attachment bound to a recognized target
///
/// One per session, created during initialization and never recreated
/// without a full re-initialize. Attached 3D content is parented under
/// `group`; tracking events arrive on the embedded receiver and are
/// drained once per frame by the render loop.
#[derive(Debug)]
pub struct Anchor {
    index: usize,
    pub group: Object3d,
    events: mpsc::UnboundedReceiver<AnchorEvent>,
}

impl Anchor {
    pub fn new(index: usize, events: mpsc::UnboundedReceiver<AnchorEvent>) -> Self {
        Self {
            index,
            group: Object3d::group(format!("anchor-{index}")),
            events,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Take every event delivered since the last drain
    pub fn drain_events(&mut self) -> Vec<AnchorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Opaque camera handle exposed by the engine after construction
#[derive(Debug, Clone)]
pub struct CameraHandle {
    pub label: String,
}

/// One-frame render capability exposed by the engine
pub trait Renderer: Send + Sync {
    /// Apply the standard color/tone-mapping/shadow configuration
    fn apply_settings(&self, settings: &RendererSettings);

    /// Render a single frame of the scene through the camera
    fn render(&self, scene: &Object3d, camera: &CameraHandle);
}

/// A constructed image-tracking engine instance
#[async_trait]
pub trait TrackingEngine: Send + Sync {
    /// Begin the capture loop; rejections carry the engine's own message
    async fn start(&mut self) -> anyhow::Result<()>;

    /// Stop the capture loop; must be safe after a failed start
    fn stop(&mut self);

    /// Create the anchor at the given target index
    fn add_anchor(&mut self, index: usize) -> anyhow::Result<Anchor>;

    /// Renderer handle, available post-construction
    fn renderer(&self) -> Arc<dyn Renderer>;

    /// Scene root handle, available post-construction
    fn scene(&self) -> Object3d;

    /// Camera handle, available post-construction
    fn camera(&self) -> CameraHandle;
}

/// Injected factory for the tracking engine
///
/// Replaces any ambient lookup of a globally-attached engine: whoever
/// loads the engine supplies readiness and construction here, which also
/// makes the engine substitutable in tests.
#[async_trait]
pub trait TrackingEngineFactory: Send + Sync {
    /// Resolves once the engine is locally available
    ///
    /// The session bounds this wait with a timeout; the future itself
    /// may take as long as it needs.
    async fn ready(&self) -> anyhow::Result<()>;

    /// Construct an engine bound to the container and target
    async fn create(&self, config: &EngineConfig) -> anyhow::Result<Box<dyn TrackingEngine>>;
}
