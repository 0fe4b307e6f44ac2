//! Model cache with clone-on-return and placeholder fallback
//!
//! Templates are fetched and decoded at most once per key and live in
//! the cache until `clear_cache`. Callers only ever receive deep clones,
//! so no instance mutation can corrupt a template or another caller.
//! A failed load is degraded, not surfaced: the caller gets a synthetic
//! placeholder and the cache stays empty for that key so a later call
//! retries the real asset.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, warn};

use crate::assets::source::{AssetSource, ModelDecoder};
use crate::assets::ModelKey;
use crate::scene::{Geometry, Material, Object3d};

/// Edge length of the placeholder primitive
const PLACEHOLDER_SIZE: f32 = 0.1;

/// Synthesize the deterministic stand-in for a model that failed to load
///
/// A small colored box; the color is a fixed function of the key. Never
/// cached, so every call returns an independently owned instance.
pub fn placeholder_model(key: ModelKey) -> Object3d {
    let mut mesh = Object3d::mesh(
        format!("placeholder-{key}"),
        Geometry::new("placeholder-box"),
        Material::new(key.placeholder_color()),
    );
    mesh.transform.scale = Vec3::splat(PLACEHOLDER_SIZE);
    mesh
}

/// Loads, caches, clones, and disposes model assets
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    decoder: Arc<dyn ModelDecoder>,
    cache: HashMap<ModelKey, Object3d>,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>, decoder: Arc<dyn ModelDecoder>) -> Self {
        Self {
            source,
            decoder,
            cache: HashMap::new(),
        }
    }

    /// Load a model, from cache when possible
    ///
    /// Never fails: on any fetch or decode error the placeholder is
    /// returned instead. `on_progress` receives percentages; a cache hit
    /// or a fallback reports a single `100.0`.
    pub async fn load_model(
        &mut self,
        key: ModelKey,
        mut on_progress: Option<&mut (dyn FnMut(f32) + Send)>,
    ) -> Object3d {
        if let Some(template) = self.cache.get(&key) {
            debug!(model = %key, "model cache hit");
            if let Some(cb) = on_progress.as_mut() {
                cb(100.0);
            }
            return template.deep_clone();
        }

        match self.fetch_and_decode(key, &mut on_progress).await {
            Ok(template) => {
                debug!(model = %key, meshes = template.mesh_count(), "model decoded and cached");
                if let Some(cb) = on_progress.as_mut() {
                    cb(100.0);
                }
                let instance = template.deep_clone();
                // First write wins; the cache is never invalidated implicitly
                self.cache.entry(key).or_insert(template);
                instance
            }
            Err(err) => {
                warn!(model = %key, error = %err, "model load failed, substituting placeholder");
                if let Some(cb) = on_progress.as_mut() {
                    cb(100.0);
                }
                placeholder_model(key)
            }
        }
    }

    async fn fetch_and_decode(
        &self,
        key: ModelKey,
        on_progress: &mut Option<&mut (dyn FnMut(f32) + Send)>,
    ) -> anyhow::Result<Object3d> {
        let mut forward = |fraction: f32| {
            if let Some(cb) = on_progress.as_mut() {
                cb((fraction * 100.0).clamp(0.0, 100.0));
            }
        };
        let bytes = self.source.fetch(key.asset_path(), &mut forward).await?;
        self.decoder.decode(key, &bytes)
    }

    /// Warm the cache for every model key, best-effort
    ///
    /// Continues past individual failures (each degrades to the
    /// placeholder internally). `on_progress` receives the key being
    /// loaded and its percentage.
    pub async fn preload_all(
        &mut self,
        mut on_progress: Option<&mut (dyn FnMut(ModelKey, f32) + Send)>,
    ) {
        for key in ModelKey::ALL {
            let instance = match on_progress.as_mut() {
                Some(cb) => {
                    let mut forward = |percent: f32| cb(key, percent);
                    self.load_model(key, Some(&mut forward)).await
                }
                None => self.load_model(key, None).await,
            };
            // Preloading only warms the cache; the clone is discarded
            drop(instance);
        }
        debug!(cached = self.cache.len(), "model preload finished");
    }

    /// Release graphics resources of a detached instance
    pub fn dispose_model(mut model: Object3d) {
        debug!(name = %model.name, meshes = model.mesh_count(), "disposing model");
        model.dispose();
    }

    /// Dispose every cached template and empty the cache
    pub fn clear_cache(&mut self) {
        for (key, mut template) in self.cache.drain() {
            debug!(model = %key, "disposing cached template");
            template.dispose();
        }
    }

    pub fn is_cached(&self, key: ModelKey) -> bool {
        self.cache.contains_key(&key)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mock::{MockAssetSource, MockDecoder};
    use test_case::test_case;

    fn loader(source: MockAssetSource) -> AssetLoader {
        AssetLoader::new(Arc::new(source), Arc::new(MockDecoder::new()))
    }

    #[tokio::test]
    async fn test_successful_load_fetches_once_and_caches() {
        let source = MockAssetSource::new();
        let counts = source.fetch_counts();
        let mut loader = loader(source);

        let first = loader.load_model(ModelKey::Sprout, None).await;
        let second = loader.load_model(ModelKey::Sprout, None).await;

        assert_eq!(counts.count(ModelKey::Sprout.asset_path()), 1);
        assert!(loader.is_cached(ModelKey::Sprout));
        // Distinct instances, never the template itself
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_cache_hit_reports_single_complete_progress() {
        let mut loader = loader(MockAssetSource::new());
        loader.load_model(ModelKey::Lantern, None).await;

        let mut reports = Vec::new();
        let mut cb = |p: f32| reports.push(p);
        loader.load_model(ModelKey::Lantern, Some(&mut cb)).await;
        assert_eq!(reports, vec![100.0]);
    }

    #[tokio::test]
    async fn test_fetch_progress_is_forwarded_as_percent() {
        let mut loader = loader(MockAssetSource::new());
        let mut reports = Vec::new();
        let mut cb = |p: f32| reports.push(p);
        loader.load_model(ModelKey::Sprout, Some(&mut cb)).await;

        assert!(!reports.is_empty());
        assert!(reports.iter().all(|p| (0.0..=100.0).contains(p)));
        assert_eq!(*reports.last().expect("at least one report"), 100.0);
    }

    #[test_case(ModelKey::Sprout)]
    #[test_case(ModelKey::Lantern)]
    #[test_case(ModelKey::Automaton)]
    #[tokio::test]
    async fn test_failed_fetch_degrades_to_uncached_placeholder(key: ModelKey) {
        let source = MockAssetSource::new().with_failing(key.asset_path());
        let mut loader = loader(source);

        let first = loader.load_model(key, None).await;
        let second = loader.load_model(key, None).await;

        // Never absent, never cached, never the same instance
        assert!(first.is_mesh());
        assert!(!loader.is_cached(key));
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_failed_decode_degrades_to_placeholder() {
        let decoder = MockDecoder::new().with_failing(ModelKey::Automaton);
        let mut loader = AssetLoader::new(Arc::new(MockAssetSource::new()), Arc::new(decoder));

        let model = loader.load_model(ModelKey::Automaton, None).await;
        assert_eq!(model.name, "placeholder-automaton");
        assert!(!loader.is_cached(ModelKey::Automaton));
    }

    #[tokio::test]
    async fn test_placeholder_failure_reports_complete_progress() {
        let source = MockAssetSource::new().with_failing(ModelKey::Sprout.asset_path());
        let mut loader = loader(source);

        let mut reports = Vec::new();
        let mut cb = |p: f32| reports.push(p);
        loader.load_model(ModelKey::Sprout, Some(&mut cb)).await;
        assert_eq!(*reports.last().expect("progress reported"), 100.0);
    }

    #[tokio::test]
    async fn test_preload_continues_past_failures() {
        let source = MockAssetSource::new().with_failing(ModelKey::Lantern.asset_path());
        let mut loader = loader(source);

        let mut seen = Vec::new();
        let mut cb = |key: ModelKey, percent: f32| {
            if percent >= 100.0 {
                seen.push(key);
            }
        };
        loader.preload_all(Some(&mut cb)).await;

        // Every key completed, the bad one via placeholder
        for key in ModelKey::ALL {
            assert!(seen.contains(&key));
        }
        assert!(loader.is_cached(ModelKey::Sprout));
        assert!(!loader.is_cached(ModelKey::Lantern));
        assert!(loader.is_cached(ModelKey::Automaton));
    }

    #[tokio::test]
    async fn test_clear_cache_disposes_templates() {
        let mut loader = loader(MockAssetSource::new());
        loader.load_model(ModelKey::Sprout, None).await;
        assert_eq!(loader.cached_len(), 1);

        loader.clear_cache();
        assert_eq!(loader.cached_len(), 0);

        // A new load fetches again
        loader.load_model(ModelKey::Sprout, None).await;
        assert!(loader.is_cached(ModelKey::Sprout));
    }

    #[test]
    fn test_dispose_model_releases_resources() {
        let model = placeholder_model(ModelKey::Sprout);
        let mut flags = Vec::new();
        let mut model = model;
        model.for_each_mesh_mut(&mut |mesh| {
            if let crate::scene::ObjectKind::Mesh { geometry, .. } = &mesh.kind {
                flags.push(geometry.release_flag());
            }
        });
        AssetLoader::dispose_model(model);
        assert!(flags
            .iter()
            .all(|f| f.load(std::sync::atomic::Ordering::Acquire)));
    }
}
