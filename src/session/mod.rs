//! AR session orchestration
//!
//! Owns the ordered initialization precondition chain, the session state
//! machine, the render loop, and the wiring between the tracking engine,
//! the asset loader, and the animation engine.

mod context;
mod controller;

pub use context::SessionState;
pub use controller::SessionController;
