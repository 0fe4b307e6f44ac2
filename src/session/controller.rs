//! The AR session controller
//!
//! `initialize` runs an ordered, fail-fast precondition chain and only
//! returns a typed outcome, never an error value across the boundary.
//! `start` begins the capture loop and spawns the render loop; `stop`
//! tears everything down and is the only cancellation mechanism.
//! `switch_model` swaps the anchored model without ever failing the
//! session. Concurrent `initialize` calls on one controller are not
//! guarded; callers serialize them.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use glam::Vec3;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::animation;
use crate::assets::{AssetLoader, AssetSource, ModelDecoder, ModelKey};
use crate::config::SessionConfig;
use crate::error::{ArError, InitOutcome, Result};
use crate::scene::{Geometry, Material, Object3d, ObjectKind, RendererSettings};
use crate::session::context::{SessionContext, SessionState};
use crate::track::{
    AnchorEvent, CameraAccess, CameraDenial, EngineConfig, GraphicsProbe, Renderer,
    TrackingEngineFactory,
};

/// Orchestrates one AR session end to end
pub struct SessionController {
    graphics: Arc<dyn GraphicsProbe>,
    camera_access: Arc<dyn CameraAccess>,
    factory: Arc<dyn TrackingEngineFactory>,
    source: Arc<dyn AssetSource>,
    loader: AsyncMutex<AssetLoader>,
    config: SessionConfig,
    ctx: Arc<Mutex<SessionContext>>,
}

impl SessionController {
    /// Build a controller from its injected capabilities
    pub fn new(
        graphics: Arc<dyn GraphicsProbe>,
        camera_access: Arc<dyn CameraAccess>,
        factory: Arc<dyn TrackingEngineFactory>,
        source: Arc<dyn AssetSource>,
        decoder: Arc<dyn ModelDecoder>,
        config: SessionConfig,
    ) -> Self {
        Self {
            graphics,
            camera_access,
            factory,
            source: Arc::clone(&source),
            loader: AsyncMutex::new(AssetLoader::new(source, decoder)),
            config,
            ctx: Arc::new(Mutex::new(SessionContext::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionContext> {
        self.ctx.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the ordered precondition chain and set up the session
    ///
    /// Fail-fast: the first failing step short-circuits the rest, and
    /// the failure comes back inside the outcome, classified per the
    /// error taxonomy. Asset validation deliberately precedes the camera
    /// permission request so a missing resource never prompts the user.
    pub async fn initialize(&self, container: &str) -> InitOutcome {
        let epoch = {
            let mut ctx = self.lock();
            ctx.state = SessionState::Initializing;
            ctx.epoch
        };
        info!(container, "initializing AR session");

        match self.run_precondition_chain(container, epoch).await {
            Ok(()) => {
                info!("AR session ready");
                InitOutcome::ok()
            }
            Err(err) => {
                {
                    let mut ctx = self.lock();
                    // Leave the state alone if a stop() reset it meanwhile
                    if ctx.epoch == epoch {
                        ctx.state = SessionState::Failed;
                    }
                }
                warn!(kind = %err.kind(), error = %err, "AR initialization failed");
                InitOutcome::failed(err)
            }
        }
    }

    async fn run_precondition_chain(&self, container: &str, epoch: u64) -> Result<()> {
        // 1. Capability: no graphics context, no session
        if !self.graphics.create_context() {
            return Err(ArError::Capability);
        }
        debug!("graphics capability confirmed");

        // 2. Asset validation, before any sensitive permission
        let target_path = self.config.target_path.clone();
        if !self.source.head(&target_path).await {
            return Err(ArError::Validation {
                resource: target_path,
            });
        }
        for key in ModelKey::ALL {
            if !self.source.head(key.asset_path()).await {
                return Err(ArError::Validation {
                    resource: key.asset_path().to_string(),
                });
            }
        }
        debug!("all required assets are reachable");

        // 3. Engine readiness, bounded by the configured deadline
        let deadline = self.config.readiness_deadline();
        let waited_ms = deadline.as_millis() as u64;
        match tokio::time::timeout(deadline, self.factory.ready()).await {
            Ok(Ok(())) => debug!("tracking engine is ready"),
            Ok(Err(err)) => {
                warn!(error = %err, "tracking engine readiness failed");
                return Err(ArError::Library { waited_ms });
            }
            Err(_elapsed) => return Err(ArError::Library { waited_ms }),
        }

        // 4. Camera permission; may block on a user prompt indefinitely.
        // The probe stream is released at once: the engine manages the
        // real camera channel itself.
        match self.camera_access.request_stream().await {
            Ok(stream) => {
                stream.release();
                debug!("camera permission granted, probe stream released");
            }
            Err(CameraDenial::Denied) => return Err(ArError::Permission),
            Err(CameraDenial::NotFound) => return Err(ArError::CameraNotFound),
            Err(CameraDenial::InUse) => return Err(ArError::CameraInUse),
            Err(CameraDenial::Other(err)) => {
                return Err(ArError::Unknown {
                    reason: err.to_string(),
                })
            }
        }

        // 5. Engine construction bound to container and target
        let engine_config = EngineConfig {
            container: container.to_string(),
            target_path: self.config.target_path.clone(),
        };
        let mut engine = self
            .factory
            .create(&engine_config)
            .await
            .map_err(|err| ArError::Initialization {
                reason: err.to_string(),
            })?;

        // 6. Scene setup: handles, renderer settings, one anchor with
        // lighting and a shadow-receiving plane, event stream attached
        let renderer = engine.renderer();
        renderer.apply_settings(&RendererSettings::default());
        let scene = engine.scene();
        let camera = engine.camera();
        let mut anchor = engine
            .add_anchor(0)
            .map_err(|err| ArError::Initialization {
                reason: err.to_string(),
            })?;
        anchor.group.add_child(Object3d::ambient_light([1.0, 1.0, 1.0], 0.6));
        let mut key_light = Object3d::directional_light([1.0, 1.0, 1.0], 1.2, true);
        key_light.transform.position = Vec3::new(1.5, 3.0, 1.0);
        anchor.group.add_child(key_light);
        anchor.group.add_child(shadow_plane());

        // Commit, unless a stop() invalidated this initialization while
        // it was suspended
        let mut ctx = self.lock();
        if ctx.epoch != epoch {
            engine.stop();
            return Err(ArError::Initialization {
                reason: "session was stopped during initialization".to_string(),
            });
        }
        ctx.engine = Some(engine);
        ctx.renderer = Some(renderer);
        ctx.scene = Some(scene);
        ctx.camera = Some(camera);
        ctx.anchor = Some(anchor);
        ctx.is_tracking = false;
        ctx.state = SessionState::Ready;
        Ok(())
    }

    /// Begin tracking and the render loop
    ///
    /// Requires a Ready session. Engine rejections come back classified:
    /// camera-related ones as permission errors, target-related ones as
    /// initialization errors with an actionable message.
    pub async fn start(&self) -> Result<()> {
        let (mut engine, epoch) = {
            let mut ctx = self.lock();
            if ctx.state != SessionState::Ready {
                return Err(ArError::Initialization {
                    reason: format!(
                        "start requires an initialized session (state: {})",
                        ctx.state
                    ),
                });
            }
            match ctx.engine.take() {
                Some(engine) => (engine, ctx.epoch),
                None => {
                    return Err(ArError::Initialization {
                        reason: "session has no tracking engine".to_string(),
                    })
                }
            }
        };

        let started = engine.start().await;

        let mut ctx = self.lock();
        if ctx.epoch != epoch {
            // stop() ran while the engine was starting
            engine.stop();
            return Err(ArError::Initialization {
                reason: "session was stopped during start".to_string(),
            });
        }
        ctx.engine = Some(engine);
        match started {
            Ok(()) => {
                ctx.state = SessionState::Tracking;
                drop(ctx);
                info!("tracking engine started");
                self.spawn_frame_loop();
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "tracking engine failed to start");
                Err(classify_start_error(err))
            }
        }
    }

    /// Tear the session down; idempotent and safe before any start
    pub fn stop(&self) {
        let mut ctx = self.lock();
        if ctx.state == SessionState::Uninitialized && ctx.frame_task.is_none() {
            debug!("stop ignored: nothing to tear down");
            return;
        }
        ctx.epoch += 1;

        if let Some(task) = ctx.frame_task.take() {
            task.abort();
            debug!("render loop cancelled");
        }
        if let Some(mut engine) = ctx.engine.take() {
            engine.stop();
            debug!("tracking engine stopped");
        }
        if let Some((key, id)) = ctx.active_model.take() {
            ctx.animation.remove(id);
            if let Some(anchor) = ctx.anchor.as_mut() {
                if let Some(model) = anchor.group.take_child(id) {
                    AssetLoader::dispose_model(model);
                    debug!(model = %key, "active model disposed");
                }
            }
        }
        ctx.animation.clear();
        ctx.renderer = None;
        ctx.scene = None;
        ctx.camera = None;
        ctx.anchor = None;
        ctx.is_tracking = false;
        if ctx.state != SessionState::Uninitialized {
            ctx.state = SessionState::Stopped;
        }
        info!("AR session stopped");
    }

    /// Swap the model attached to the anchor
    ///
    /// Never fails the session: before any anchor exists this is a
    /// no-op, and an asset that cannot be loaded degrades inside the
    /// loader rather than aborting an active experience.
    pub async fn switch_model(&self, key: ModelKey) {
        let epoch = {
            let mut ctx = self.lock();
            if ctx.anchor.is_none() {
                debug!(model = %key, "model switch ignored: no active anchor");
                return;
            }
            if let Some((old_key, id)) = ctx.active_model.take() {
                ctx.animation.remove(id);
                if let Some(anchor) = ctx.anchor.as_mut() {
                    if let Some(old) = anchor.group.take_child(id) {
                        AssetLoader::dispose_model(old);
                        debug!(model = %old_key, "previous model detached and disposed");
                    }
                }
            }
            ctx.epoch
        };

        let mut model = self.loader.lock().await.load_model(key, None).await;

        let mut ctx = self.lock();
        if ctx.epoch != epoch || ctx.anchor.is_none() {
            debug!(model = %key, "session changed during load, discarding instance");
            AssetLoader::dispose_model(model);
            return;
        }

        model.transform.position = Vec3::ZERO;
        model.transform.scale = Vec3::splat(animation::START_SCALE);
        model.for_each_mesh_mut(&mut |mesh| {
            mesh.cast_shadow = true;
            mesh.receive_shadow = true;
            if let ObjectKind::Mesh { material, .. } = &mut mesh.kind {
                material.needs_refresh = true;
            }
        });

        if ctx.is_tracking {
            ctx.animation.start_emergence(&mut model);
        }
        let id = model.id();
        if let Some(anchor) = ctx.anchor.as_mut() {
            anchor.group.add_child(model);
            ctx.active_model = Some((key, id));
            info!(model = %key, "model attached to anchor");
        }
    }

    /// Warm the model cache, best-effort
    pub async fn preload_all_models(
        &self,
        on_progress: Option<&mut (dyn FnMut(ModelKey, f32) + Send)>,
    ) {
        self.loader.lock().await.preload_all(on_progress).await;
    }

    /// Current renderer handle, if the session holds one
    pub fn renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.lock().renderer.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Whether the target is currently recognized
    pub fn is_tracking(&self) -> bool {
        self.lock().is_tracking
    }

    /// Key of the model currently attached to the anchor
    pub fn active_model(&self) -> Option<ModelKey> {
        self.lock().active_model.map(|(key, _)| key)
    }

    /// Drive one frame manually
    ///
    /// For hosts that own their display-refresh callback and deterministic
    /// tests; the internal loop spawned by `start()` does the same thing
    /// on a timer.
    pub fn pump_frame(&self, delta_secs: f32) {
        let mut ctx = self.lock();
        advance_frame(&mut ctx, delta_secs);
    }

    fn spawn_frame_loop(&self) {
        let ctx = Arc::clone(&self.ctx);
        let interval = self.config.frame_interval();
        let task = tokio::spawn(async move {
            debug!("render loop started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let delta = now.duration_since(last).as_secs_f32();
                last = now;
                let keep_going = {
                    let mut guard = ctx.lock().unwrap_or_else(|e| e.into_inner());
                    advance_frame(&mut guard, delta)
                };
                if !keep_going {
                    break;
                }
            }
            debug!("render loop exited");
        });
        self.lock().frame_task = Some(task);
    }
}

/// One render tick: events, animation, one frame
///
/// The sole writer of per-frame transforms. Returns false once the
/// session is no longer tracking-capable, which ends the loop.
pub(crate) fn advance_frame(ctx: &mut SessionContext, delta: f32) -> bool {
    if ctx.state != SessionState::Tracking {
        return false;
    }

    // Target events first, so a fresh find animates this very frame
    let events = match ctx.anchor.as_mut() {
        Some(anchor) => anchor.drain_events(),
        None => Vec::new(),
    };
    for event in events {
        match event {
            AnchorEvent::TargetFound => {
                ctx.is_tracking = true;
                info!("target found");
                // Re-acquisition always replays the entrance
                if let Some((_, id)) = ctx.active_model {
                    if let Some(anchor) = ctx.anchor.as_mut() {
                        if let Some(model) = anchor.group.child_mut(id) {
                            ctx.animation.start_emergence(model);
                        }
                    }
                }
            }
            AnchorEvent::TargetLost => {
                // The model stays visible and static; updates just pause
                ctx.is_tracking = false;
                info!("target lost");
            }
        }
    }

    if ctx.is_tracking {
        if let Some((_, id)) = ctx.active_model {
            if let Some(anchor) = ctx.anchor.as_mut() {
                if let Some(model) = anchor.group.child_mut(id) {
                    ctx.animation.update(model, delta);
                }
            }
        }
    }

    if let (Some(renderer), Some(scene), Some(camera)) =
        (ctx.renderer.as_ref(), ctx.scene.as_ref(), ctx.camera.as_ref())
    {
        renderer.render(scene, camera);
    }
    true
}

/// Shadow-receiving plane parented under the anchor
fn shadow_plane() -> Object3d {
    let mut plane = Object3d::mesh(
        "shadow-plane",
        Geometry::new("plane"),
        Material::new([0.0, 0.0, 0.0]),
    );
    plane.receive_shadow = true;
    plane.transform.scale = Vec3::new(2.0, 1.0, 2.0);
    plane
}

/// Map an engine start rejection onto the error taxonomy
fn classify_start_error(err: anyhow::Error) -> ArError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("camera") || lower.contains("permission") {
        ArError::Permission
    } else if lower.contains("target") {
        ArError::Initialization {
            reason: format!("tracking target could not be loaded: {message}"),
        }
    } else {
        ArError::Unknown { reason: message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::track::Anchor;
    use tokio::sync::mpsc;

    fn tracking_ctx() -> (SessionContext, mpsc::UnboundedSender<AnchorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut ctx = SessionContext::new();
        ctx.state = SessionState::Tracking;
        ctx.anchor = Some(Anchor::new(0, rx));
        (ctx, tx)
    }

    fn attach_model(ctx: &mut SessionContext) -> crate::scene::ObjectId {
        let model = crate::assets::placeholder_model(ModelKey::Sprout);
        let id = model.id();
        if let Some(anchor) = ctx.anchor.as_mut() {
            anchor.group.add_child(model);
        }
        ctx.active_model = Some((ModelKey::Sprout, id));
        id
    }

    #[test]
    fn test_advance_frame_requires_tracking_state() {
        let mut ctx = SessionContext::new();
        assert!(!advance_frame(&mut ctx, 0.016));
    }

    #[test]
    fn test_found_event_starts_emergence_and_lost_pauses() {
        let (mut ctx, tx) = tracking_ctx();
        let id = attach_model(&mut ctx);

        tx.send(AnchorEvent::TargetFound).expect("event sent");
        assert!(advance_frame(&mut ctx, 0.016));
        assert!(ctx.is_tracking);
        assert!(ctx.animation.has_state(id));
        let progress_after_find = ctx.animation.progress(id).expect("registered");

        // A few frames advance the emergence
        advance_frame(&mut ctx, 0.1);
        let progressed = ctx.animation.progress(id).expect("registered");
        assert!(progressed > progress_after_find);

        // Loss pauses animation but keeps the model attached
        tx.send(AnchorEvent::TargetLost).expect("event sent");
        advance_frame(&mut ctx, 0.016);
        assert!(!ctx.is_tracking);
        advance_frame(&mut ctx, 0.5);
        assert_eq!(ctx.animation.progress(id), Some(progressed));
        assert!(ctx.active_model.is_some());
    }

    #[test]
    fn test_refound_replays_entrance() {
        let (mut ctx, tx) = tracking_ctx();
        let id = attach_model(&mut ctx);

        tx.send(AnchorEvent::TargetFound).expect("event sent");
        advance_frame(&mut ctx, 0.016);
        advance_frame(&mut ctx, 2.0);
        assert_eq!(ctx.animation.progress(id), Some(1.0));

        tx.send(AnchorEvent::TargetLost).expect("event sent");
        advance_frame(&mut ctx, 0.016);
        tx.send(AnchorEvent::TargetFound).expect("event sent");
        advance_frame(&mut ctx, 0.0);
        assert_eq!(ctx.animation.progress(id), Some(0.0));
    }

    #[test]
    fn test_no_render_without_all_three_handles() {
        // A tracking ctx with no renderer/scene/camera still ticks
        let (mut ctx, _tx) = tracking_ctx();
        assert!(advance_frame(&mut ctx, 0.016));
    }

    #[test]
    fn test_classify_start_error() {
        let err = classify_start_error(anyhow::anyhow!("Camera stream unavailable"));
        assert_eq!(err.kind(), ErrorKind::Permission);

        let err = classify_start_error(anyhow::anyhow!("failed to parse target file"));
        assert_eq!(err.kind(), ErrorKind::Initialization);

        let err = classify_start_error(anyhow::anyhow!("out of cheese"));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_pump_frame_renders_deterministically() {
        use crate::assets::{MockAssetSource, MockDecoder};
        use crate::track::{MockCamera, MockEngineFactory, MockGraphics};

        let factory = MockEngineFactory::new();
        let handle = factory.handle();
        let controller = SessionController::new(
            Arc::new(MockGraphics::supported()),
            Arc::new(MockCamera::granting()),
            Arc::new(factory),
            Arc::new(MockAssetSource::new()),
            Arc::new(MockDecoder::new()),
            crate::config::SessionConfig::default(),
        );
        assert!(controller.initialize("ar-root").await.success);

        // Enter the tracking state without spawning the internal loop,
        // so this test owns every frame
        controller.lock().state = SessionState::Tracking;
        controller.pump_frame(0.016);
        controller.pump_frame(0.016);
        assert_eq!(handle.frames_rendered(), 2);
    }

    #[test]
    fn test_shadow_plane_receives_shadows() {
        let plane = shadow_plane();
        assert!(plane.receive_shadow);
        assert!(!plane.cast_shadow);
    }
}
