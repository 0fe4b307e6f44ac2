//! Mock asset source and decoder for testing
//!
//! The source scripts per-path existence and fetch failures and counts
//! every fetch so tests can assert how often the network was touched.
//! The decoder builds a small deterministic object tree per key.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::assets::source::{AssetSource, ModelDecoder};
use crate::assets::ModelKey;
use crate::scene::{Geometry, Material, Object3d};

/// Shared fetch counter handed out by `MockAssetSource::fetch_counts`
#[derive(Debug, Clone, Default)]
pub struct FetchCounts(Arc<Mutex<HashMap<String, usize>>>);

impl FetchCounts {
    /// Number of body fetches issued for a path
    pub fn count(&self, path: &str) -> usize {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, path: &str) {
        *self
            .0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(path.to_string())
            .or_insert(0) += 1;
    }
}

/// Scriptable asset endpoint double
#[derive(Debug, Default)]
pub struct MockAssetSource {
    missing: HashSet<String>,
    failing: HashSet<String>,
    counts: FetchCounts,
}

impl MockAssetSource {
    /// Source where every path exists and fetches succeed
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the existence probe fail for a path
    pub fn with_missing(mut self, path: &str) -> Self {
        self.missing.insert(path.to_string());
        self
    }

    /// Make the body fetch fail for a path (existence probe still passes)
    pub fn with_failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Handle to the fetch counters, valid after the source is consumed
    pub fn fetch_counts(&self) -> FetchCounts {
        self.counts.clone()
    }
}

#[async_trait]
impl AssetSource for MockAssetSource {
    async fn head(&self, path: &str) -> bool {
        !self.missing.contains(path)
    }

    async fn fetch(
        &self,
        path: &str,
        on_progress: &mut (dyn FnMut(f32) + Send),
    ) -> anyhow::Result<Vec<u8>> {
        self.counts.record(path);
        if self.missing.contains(path) {
            anyhow::bail!("404: {path}");
        }
        if self.failing.contains(path) {
            anyhow::bail!("fetch failed: {path}");
        }
        on_progress(0.5);
        on_progress(1.0);
        Ok(vec![0x67; 64])
    }
}

/// Decoder double producing a two-mesh group per key
#[derive(Debug, Default)]
pub struct MockDecoder {
    fail_keys: HashSet<ModelKey>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make decoding fail for a key, as a malformed asset would
    pub fn with_failing(mut self, key: ModelKey) -> Self {
        self.fail_keys.insert(key);
        self
    }
}

impl ModelDecoder for MockDecoder {
    fn decode(&self, key: ModelKey, bytes: &[u8]) -> anyhow::Result<Object3d> {
        if bytes.is_empty() {
            anyhow::bail!("empty model payload for {key}");
        }
        if self.fail_keys.contains(&key) {
            anyhow::bail!("malformed model data for {key}");
        }
        let mut root = Object3d::group(format!("{key}-root"));
        root.add_child(Object3d::mesh(
            format!("{key}-body"),
            Geometry::new(format!("{key}-body-geo")),
            Material::new(key.placeholder_color()),
        ));
        root.add_child(Object3d::mesh(
            format!("{key}-detail"),
            Geometry::new(format!("{key}-detail-geo")),
            Material::new([0.8, 0.8, 0.8]),
        ));
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_path_fails_head() {
        let source = MockAssetSource::new().with_missing("assets/targets/postcard.mind");
        assert!(!source.head("assets/targets/postcard.mind").await);
        assert!(source.head("assets/models/sprout.glb").await);
    }

    #[tokio::test]
    async fn test_fetch_counts_and_progress() {
        let source = MockAssetSource::new();
        let counts = source.fetch_counts();
        let mut fractions = Vec::new();
        let mut cb = |f: f32| fractions.push(f);

        let bytes = source
            .fetch("assets/models/sprout.glb", &mut cb)
            .await
            .expect("fetch succeeds");
        assert!(!bytes.is_empty());
        assert_eq!(fractions, vec![0.5, 1.0]);
        assert_eq!(counts.count("assets/models/sprout.glb"), 1);
    }

    #[test]
    fn test_decoder_builds_meshes() {
        let decoder = MockDecoder::new();
        let model = decoder
            .decode(ModelKey::Lantern, &[1, 2, 3])
            .expect("decode succeeds");
        assert_eq!(model.mesh_count(), 2);
    }
}
