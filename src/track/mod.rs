//! Injected tracking and platform capabilities
//!
//! This module provides:
//! - `TrackingEngineFactory` / `TrackingEngine` - the image-tracking
//!   engine behind an injected factory, substitutable by a test double
//! - `Renderer` - the one-frame render capability exposed by the engine
//! - `Anchor` / `AnchorEvent` - the spatial attachment and its
//!   target-found / target-lost event stream
//! - `GraphicsProbe` / `CameraAccess` - platform capability and camera
//!   permission facilities
//! - Mock implementations for testing

mod camera;
mod engine;
mod mock;

pub use camera::{CameraAccess, CameraDenial, GraphicsProbe, ProbeStream};
pub use engine::{Anchor, AnchorEvent, CameraHandle, EngineConfig, Renderer, TrackingEngine, TrackingEngineFactory};
pub use mock::{
    MockCamera, MockCameraOutcome, MockEngineFactory, MockEngineHandle, MockGraphics, MockRenderer,
};
