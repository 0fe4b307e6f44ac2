//! Model asset loading, caching, and disposal
//!
//! This module provides:
//! - `ModelKey` - the fixed enumeration of supported models
//! - `AssetSource` / `ModelDecoder` - injected fetch and decode capabilities
//! - `AssetLoader` - cache with clone-on-return and placeholder fallback
//! - Mock implementations for testing

mod keys;
mod loader;
mod mock;
mod source;

pub use keys::ModelKey;
pub use loader::{placeholder_model, AssetLoader};
pub use mock::{FetchCounts, MockAssetSource, MockDecoder};
pub use source::{AssetSource, ModelDecoder};
