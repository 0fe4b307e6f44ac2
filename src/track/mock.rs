//! Mock platform and tracking-engine implementations for testing
//!
//! These doubles script every outcome the session cares about: graphics
//! support, camera grants and denials (with optional delay, to hold an
//! initialization mid-flight), engine readiness delay, construction and
//! start failures, injected tracking events, and rendered frame counts.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::scene::{Object3d, RendererSettings};
use crate::track::camera::{CameraAccess, CameraDenial, GraphicsProbe, ProbeStream};
use crate::track::engine::{
    Anchor, AnchorEvent, CameraHandle, EngineConfig, Renderer, TrackingEngine,
    TrackingEngineFactory,
};

/// Graphics probe double
#[derive(Debug)]
pub struct MockGraphics {
    supported: bool,
}

impl MockGraphics {
    pub fn supported() -> Self {
        Self { supported: true }
    }

    pub fn unsupported() -> Self {
        Self { supported: false }
    }
}

impl GraphicsProbe for MockGraphics {
    fn create_context(&self) -> bool {
        self.supported
    }
}

/// Scripted result of a camera permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCameraOutcome {
    Grant,
    Deny,
    NotFound,
    InUse,
    Fail,
}

/// Camera permission double
///
/// Counts requests so tests can assert that a short-circuited
/// initialization never prompted, and keeps the release flag of the
/// last granted stream.
pub struct MockCamera {
    outcome: MockCameraOutcome,
    grant_delay: Duration,
    requests: AtomicUsize,
    last_stream: Mutex<Option<Arc<AtomicBool>>>,
}

impl MockCamera {
    pub fn granting() -> Self {
        Self::with_outcome(MockCameraOutcome::Grant)
    }

    pub fn with_outcome(outcome: MockCameraOutcome) -> Self {
        Self {
            outcome,
            grant_delay: Duration::ZERO,
            requests: AtomicUsize::new(0),
            last_stream: Mutex::new(None),
        }
    }

    /// Delay before the request resolves, as a pending user prompt would
    pub fn with_grant_delay(mut self, delay: Duration) -> Self {
        self.grant_delay = delay;
        self
    }

    /// How many permission requests were ever issued
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Acquire)
    }

    /// Whether the most recently granted probe stream was released
    pub fn last_stream_released(&self) -> bool {
        self.last_stream
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|flag| flag.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

#[async_trait]
impl CameraAccess for MockCamera {
    async fn request_stream(&self) -> Result<ProbeStream, CameraDenial> {
        self.requests.fetch_add(1, Ordering::AcqRel);
        if !self.grant_delay.is_zero() {
            tokio::time::sleep(self.grant_delay).await;
        }
        match self.outcome {
            MockCameraOutcome::Grant => {
                let stream = ProbeStream::new();
                *self.last_stream.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(stream.release_flag());
                Ok(stream)
            }
            MockCameraOutcome::Deny => Err(CameraDenial::Denied),
            MockCameraOutcome::NotFound => Err(CameraDenial::NotFound),
            MockCameraOutcome::InUse => Err(CameraDenial::InUse),
            MockCameraOutcome::Fail => Err(CameraDenial::Other(anyhow::anyhow!(
                "mock camera transport error"
            ))),
        }
    }
}

/// Renderer double counting rendered frames
#[derive(Debug, Default)]
pub struct MockRenderer {
    frames: AtomicUsize,
    settings: Mutex<Option<RendererSettings>>,
}

impl MockRenderer {
    pub fn frame_count(&self) -> usize {
        self.frames.load(Ordering::Acquire)
    }

    pub fn applied_settings(&self) -> Option<RendererSettings> {
        *self.settings.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Renderer for MockRenderer {
    fn apply_settings(&self, settings: &RendererSettings) {
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = Some(*settings);
    }

    fn render(&self, _scene: &Object3d, _camera: &CameraHandle) {
        self.frames.fetch_add(1, Ordering::AcqRel);
    }
}

struct MockEngine {
    start_error: Option<String>,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    renderer: Arc<MockRenderer>,
    anchor_rx: Mutex<Option<mpsc::UnboundedReceiver<AnchorEvent>>>,
}

#[async_trait]
impl TrackingEngine for MockEngine {
    async fn start(&mut self) -> anyhow::Result<()> {
        if let Some(message) = &self.start_error {
            anyhow::bail!("{message}");
        }
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn add_anchor(&mut self, index: usize) -> anyhow::Result<Anchor> {
        let rx = self
            .anchor_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| anyhow::anyhow!("anchor {index} already created"))?;
        Ok(Anchor::new(index, rx))
    }

    fn renderer(&self) -> Arc<dyn Renderer> {
        Arc::clone(&self.renderer) as Arc<dyn Renderer>
    }

    fn scene(&self) -> Object3d {
        Object3d::group("scene-root")
    }

    fn camera(&self) -> CameraHandle {
        CameraHandle {
            label: "mock-camera".to_string(),
        }
    }
}

/// Shared handle for observing and driving a mock engine from a test
///
/// The sender is repointed at every `create()` so the handle always
/// drives the most recently constructed engine, which keeps it valid
/// across a stop-and-reinitialize cycle.
#[derive(Clone)]
pub struct MockEngineHandle {
    events: Arc<Mutex<mpsc::UnboundedSender<AnchorEvent>>>,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    renderer: Arc<MockRenderer>,
}

impl MockEngineHandle {
    fn send(&self, event: AnchorEvent) {
        let _ = self
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send(event);
    }

    /// Deliver a target-found event to the session's anchor
    pub fn emit_found(&self) {
        self.send(AnchorEvent::TargetFound);
    }

    /// Deliver a target-lost event to the session's anchor
    pub fn emit_lost(&self) {
        self.send(AnchorEvent::TargetLost);
    }

    pub fn engine_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn engine_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn frames_rendered(&self) -> usize {
        self.renderer.frame_count()
    }

    pub fn renderer(&self) -> Arc<MockRenderer> {
        Arc::clone(&self.renderer)
    }
}

/// Tracking-engine factory double
pub struct MockEngineFactory {
    ready_delay: Duration,
    create_error: Option<String>,
    start_error: Option<String>,
    handle: MockEngineHandle,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        // Placeholder channel; create() repoints the sender per engine
        let (tx, _rx) = mpsc::unbounded_channel();
        Self {
            ready_delay: Duration::ZERO,
            create_error: None,
            start_error: None,
            handle: MockEngineHandle {
                events: Arc::new(Mutex::new(tx)),
                started: Arc::new(AtomicBool::new(false)),
                stopped: Arc::new(AtomicBool::new(false)),
                renderer: Arc::new(MockRenderer::default()),
            },
        }
    }

    /// Delay before the readiness future resolves
    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    /// Make construction fail, as a malformed target would
    pub fn with_create_error(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    /// Make the engine's start call reject with the given message
    pub fn with_start_error(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    /// Handle for observing and driving the created engine
    pub fn handle(&self) -> MockEngineHandle {
        self.handle.clone()
    }
}

impl Default for MockEngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingEngineFactory for MockEngineFactory {
    async fn ready(&self) -> anyhow::Result<()> {
        if !self.ready_delay.is_zero() {
            tokio::time::sleep(self.ready_delay).await;
        }
        Ok(())
    }

    async fn create(&self, _config: &EngineConfig) -> anyhow::Result<Box<dyn TrackingEngine>> {
        if let Some(message) = &self.create_error {
            anyhow::bail!("{message}");
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .handle
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = tx;
        Ok(Box::new(MockEngine {
            start_error: self.start_error.clone(),
            started: Arc::clone(&self.handle.started),
            stopped: Arc::clone(&self.handle.stopped),
            renderer: Arc::clone(&self.handle.renderer),
            anchor_rx: Mutex::new(Some(rx)),
        }))
    }
}
