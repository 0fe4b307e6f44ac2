//! Injected asset fetch and decode capabilities
//!
//! The controller never talks to the network or a model parser directly;
//! both sit behind these traits so the session can run against HTTP
//! endpoints in production and scripted doubles in tests.

use async_trait::async_trait;

use crate::assets::ModelKey;
use crate::scene::Object3d;

/// Static asset endpoint the session validates against and fetches from
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Existence probe (HEAD-style); must not transfer the body
    async fn head(&self, path: &str) -> bool;

    /// Fetch the resource body
    ///
    /// `on_progress` receives the transferred fraction in `[0, 1]`
    /// whenever the transfer length is known; implementations with no
    /// length information may skip intermediate reports.
    async fn fetch(
        &self,
        path: &str,
        on_progress: &mut (dyn FnMut(f32) + Send),
    ) -> anyhow::Result<Vec<u8>>;
}

/// Decodes fetched model bytes into an object tree
pub trait ModelDecoder: Send + Sync {
    fn decode(&self, key: ModelKey, bytes: &[u8]) -> anyhow::Result<Object3d>;
}
