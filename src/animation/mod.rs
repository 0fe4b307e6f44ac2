//! Per-model animation state machine
//!
//! Two phases per attached model: a one-shot emergence (scale and lift
//! from a recessed start pose, with an overshoot ease and a terminal
//! bounce), then an endless idle loop (breathing scale, vertical bob,
//! yaw sway). State lives in an identity-keyed side table; `update` is
//! pure transform mutation with no I/O and no suspension, since the
//! render loop calls it on every frame.

use std::collections::HashMap;
use std::f32::consts::PI;

use glam::Vec3;

use crate::scene::{Object3d, ObjectId};

/// Emergence progress advanced per second
pub const EMERGENCE_SPEED: f32 = 0.8;

/// Scale a model starts at when attached or re-found
pub const START_SCALE: f32 = 0.001;

/// Scale the emergence settles on
pub const TARGET_SCALE: f32 = 0.5;

/// Recessed vertical offset of the start pose
pub const START_Y: f32 = -0.08;

/// Vertical offset the emergence settles on
pub const TARGET_Y: f32 = 0.1;

/// Outward depth offset the emergence settles on
pub const TARGET_Z: f32 = 0.05;

/// Amplitude of the bounce superimposed over the last 20% of emergence
pub const BOUNCE_AMPLITUDE: f32 = 0.015;

/// Amplitude of the idle breathing scale term
pub const BREATH_AMPLITUDE: f32 = 0.012;
const BREATH_FREQUENCY: f32 = 2.0;

/// Amplitude of the idle vertical bob term
pub const BOB_AMPLITUDE: f32 = 0.01;
const BOB_FREQUENCY: f32 = 1.4;

/// Amplitude of the idle yaw sway, in radians
pub const YAW_AMPLITUDE: f32 = 0.06;
const YAW_FREQUENCY: f32 = 0.8;

/// Overshoot easing: rises past 1 and settles back
///
/// ease(t) = 1 + c3*(t-1)^3 + c1*(t-1)^2, c3 = c1 + 1
fn ease_out_back(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    let u = t - 1.0;
    1.0 + C3 * u * u * u + C1 * u * u
}

/// Per-instance animation record
#[derive(Debug, Clone, Copy)]
pub struct AnimationState {
    /// Emergence progress in [0, 1]; 1 means the idle phase is active
    pub emergence_progress: f32,
    /// Seconds accumulated in the idle phase
    pub idle_time: f32,
    pub target_scale: f32,
    pub target_y: f32,
}

impl AnimationState {
    fn fresh() -> Self {
        Self {
            emergence_progress: 0.0,
            idle_time: 0.0,
            target_scale: TARGET_SCALE,
            target_y: TARGET_Y,
        }
    }
}

/// Advances animation state and mutates model transforms in place
#[derive(Debug, Default)]
pub struct AnimationEngine {
    states: HashMap<ObjectId, AnimationState>,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the emergence for a model
    ///
    /// Resets progress to zero and snaps the model to its small recessed
    /// start pose. Called when a model is attached and again on every
    /// target re-acquisition, so the entrance always replays.
    pub fn start_emergence(&mut self, model: &mut Object3d) {
        self.states.insert(model.id(), AnimationState::fresh());
        model.transform.scale = Vec3::splat(START_SCALE);
        model.transform.position = Vec3::new(0.0, START_Y, 0.0);
        model.transform.yaw = 0.0;
    }

    /// Advance by `delta` seconds and write the model's transform
    ///
    /// No-op for a model without a registered state.
    pub fn update(&mut self, model: &mut Object3d, delta: f32) {
        let Some(state) = self.states.get_mut(&model.id()) else {
            return;
        };

        if state.emergence_progress < 1.0 {
            state.emergence_progress =
                (state.emergence_progress + delta * EMERGENCE_SPEED).min(1.0);
            let t = state.emergence_progress;
            let eased = ease_out_back(t);

            let scale = START_SCALE + (state.target_scale - START_SCALE) * eased;
            let mut y = START_Y + (state.target_y - START_Y) * eased;
            let z = TARGET_Z * eased;

            // Terminal bounce over the last fifth of the emergence
            if t > 0.8 {
                y += (t * PI * 10.0).sin() * BOUNCE_AMPLITUDE;
            }

            model.transform.scale = Vec3::splat(scale);
            model.transform.position = Vec3::new(0.0, y, z);
        } else {
            state.idle_time += delta;
            let t = state.idle_time;

            let scale = state.target_scale + (t * BREATH_FREQUENCY).sin() * BREATH_AMPLITUDE;
            let y = state.target_y + (t * BOB_FREQUENCY).sin() * BOB_AMPLITUDE;

            model.transform.scale = Vec3::splat(scale);
            model.transform.position = Vec3::new(0.0, y, TARGET_Z);
            model.transform.yaw = (t * YAW_FREQUENCY).sin() * YAW_AMPLITUDE;
        }
    }

    /// Drop the state entry for a disposed model
    ///
    /// Part of the detach operation; an entry must never outlive its
    /// model.
    pub fn remove(&mut self, id: ObjectId) {
        self.states.remove(&id);
    }

    /// Drop every state entry
    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn has_state(&self, id: ObjectId) -> bool {
        self.states.contains_key(&id)
    }

    /// Emergence progress for a model, if registered
    pub fn progress(&self, id: ObjectId) -> Option<f32> {
        self.states.get(&id).map(|s| s.emergence_progress)
    }
}
