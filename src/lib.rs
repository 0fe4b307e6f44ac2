//! Anchora - AR Session & Asset Lifecycle Controller
//!
//! Anchora orchestrates an augmented-reality experience: a camera feed
//! is analyzed for a known printed target; once recognized, a 3D model
//! is anchored to it, animated into view, and kept alive with idle
//! motion until tracking is lost or the session ends.
//!
//! # Architecture
//!
//! - `session` - the controller: ordered initialization preconditions,
//!   the session state machine, and the render loop
//! - `assets` - model loading with caching, clone-on-return, and
//!   placeholder degradation on failure
//! - `animation` - the two-phase (emergence, then idle) per-model
//!   animation state machine
//! - `track` - the injected tracking-engine, camera, and graphics
//!   capabilities, with mock implementations for testing
//!
//! The recognition algorithms, rendering pipeline, and UI all live
//! outside this crate; they are consumed as injected capabilities.

pub mod animation;
pub mod assets;
pub mod config;
pub mod error;
pub mod scene;
pub mod session;
pub mod track;

pub use assets::{AssetLoader, ModelKey};
pub use config::SessionConfig;
pub use error::{ArError, ErrorKind, InitOutcome, Result};
pub use session::{SessionController, SessionState};
