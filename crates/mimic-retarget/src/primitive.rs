//! Primitive avatars
//!
//! Shapes without a skeleton. Fused state lands on mesh-level knobs: eye
//! Y-scale for blinks, mouth Y-scale for openness, group rotation for the
//! head. Each shape layers its own cosmetic motion on a local clock.

use std::f32::consts::TAU;

use mimic_core::{lerp, unit, EulerAngles};
use mimic_fusion::AnimationState;
use serde::{Deserialize, Serialize};

/// Primitive shape variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveShape {
    Sphere,
    Cube,
    Robot,
    Cat,
}

/// Mesh-level parameters the renderer reads each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveParams {
    /// Eye mesh Y-scale, left then right (1.0 = open)
    pub eye_scale_y: [f32; 2],
    /// Mouth mesh Y-scale
    pub mouth_scale_y: f32,
    /// Whole-head group rotation
    pub group_rotation: EulerAngles,
    /// Body scale from breathing
    pub body_scale: f32,
    /// Robot antenna angle (radians)
    pub antenna: f32,
    /// Cat tail angle (radians)
    pub tail: f32,
    /// Cat ear angles, left then right (radians)
    pub ears: [f32; 2],
}

impl Default for PrimitiveParams {
    fn default() -> Self {
        Self {
            eye_scale_y: [1.0, 1.0],
            mouth_scale_y: 0.1,
            group_rotation: EulerAngles::ZERO,
            body_scale: 1.0,
            antenna: 0.0,
            tail: 0.0,
            ears: [0.0, 0.0],
        }
    }
}

/// Mesh scale ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveConfig {
    /// Eye Y-scale when fully closed
    pub closed_eye_scale: f32,
    /// Mouth Y-scale when closed / fully open
    pub mouth_closed_scale: f32,
    pub mouth_open_scale: f32,
}

impl Default for PrimitiveConfig {
    fn default() -> Self {
        Self {
            closed_eye_scale: 0.1,
            mouth_closed_scale: 0.1,
            mouth_open_scale: 1.0,
        }
    }
}

/// A primitive avatar and its local clock
#[derive(Debug, Clone)]
pub struct PrimitiveAvatar {
    shape: PrimitiveShape,
    config: PrimitiveConfig,
    params: PrimitiveParams,
    /// Seconds of local animation time
    clock: f32,
    /// Frame time of the last applied state (seconds)
    last_time: Option<f32>,
}

impl PrimitiveAvatar {
    pub fn new(shape: PrimitiveShape) -> Self {
        Self::with_config(shape, PrimitiveConfig::default())
    }

    pub fn with_config(shape: PrimitiveShape, config: PrimitiveConfig) -> Self {
        Self {
            shape,
            config,
            params: PrimitiveParams::default(),
            clock: 0.0,
            last_time: None,
        }
    }

    pub fn shape(&self) -> PrimitiveShape {
        self.shape
    }

    pub fn params(&self) -> &PrimitiveParams {
        &self.params
    }

    /// Apply one frame of fused state
    pub fn apply(&mut self, state: &AnimationState) {
        let secs = state.time.as_secs_f32();
        let dt = self.last_time.map_or(0.0, |last| (secs - last).max(0.0));
        self.last_time = Some(secs);
        self.clock += dt;

        let cfg = &self.config;
        let eye = |blink: f32| lerp(1.0, cfg.closed_eye_scale, unit(blink));
        let p = &mut self.params;
        p.eye_scale_y = [eye(state.blink_left), eye(state.blink_right)];
        let mouth = unit(state.mouth_open);
        p.mouth_scale_y = lerp(cfg.mouth_closed_scale, cfg.mouth_open_scale, mouth);
        p.group_rotation = state.head_rotation.sanitized();
        p.body_scale = state.breath_scale;

        let t = self.clock;
        match self.shape {
            PrimitiveShape::Robot => {
                // Treble makes the antenna buzz harder
                let amplitude = 0.1 + 0.4 * unit(state.treble);
                p.antenna = (TAU * 1.5 * t).sin() * amplitude;
            }
            PrimitiveShape::Cat => {
                p.tail = (TAU * 0.6 * t).sin() * 0.5;
                p.ears = [ear_twitch(t, 0.0), ear_twitch(t, 1.3)];
            }
            PrimitiveShape::Sphere | PrimitiveShape::Cube => {}
        }
    }
}

/// Short flick every few seconds, offset per ear
fn ear_twitch(t: f32, offset: f32) -> f32 {
    const PERIOD: f32 = 3.7;
    const FLICK: f32 = 0.2;
    let phase = (t + offset).rem_euclid(PERIOD);
    if phase < FLICK {
        (phase / FLICK * std::f32::consts::PI).sin() * 0.3
    } else {
        0.0
    }
}
