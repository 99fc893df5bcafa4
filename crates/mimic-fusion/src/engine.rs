//! Fusion Engine - One coherent pose from many asynchronous sources
//!
//! Each frame the engine reads a FusionInputs snapshot, samples idle
//! motion at the current frame time and resolves every channel by
//! priority:
//!
//! - Mouth: voiced lip-sync > face tracking > idle resting mouth
//! - Head: smoothed tracked rotation, cross-faded with idle by the blend factor
//! - Blinks: face tracking per eye, otherwise idle cadence
//! - Breathing: max(idle breath, audio bass boost), never the sum
//! - Expression: modifiers layered on top of the above
//!
//! Missing or malformed input is never an error here. It falls back to
//! the next-lower-priority signal.

use std::time::Duration;

use mimic_core::{unit, EulerAngles, Expression, FrameTime, RotationLimits};
use mimic_signal::{IdleConfig, IdleGenerator, IdleState, VisemeWeights};
use mimic_time::{FrameClock, FrameTick};
use serde::{Deserialize, Serialize};

use crate::{AnimationState, BlendController, ExpressionModifier, FusionInputs, MouthSource};

/// Fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Per-frame exponential smoothing factor for tracked head rotation (0, 1]
    pub head_smoothing: f32,

    /// Idle → tracking ramp length in milliseconds
    pub transition_ms: u64,

    /// Breathing target per unit of bass in audio-reactive mode
    pub breath_boost_gain: f32,

    /// Head rotation range
    pub head_limits: RotationLimits,

    /// Expression cross-fade length in milliseconds
    pub expression_ramp_ms: u64,

    /// Strength of expression modifiers
    pub expression_intensity: f32,

    /// Idle motion generator
    pub idle: IdleConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            head_smoothing: 0.3,
            transition_ms: 400,
            breath_boost_gain: 0.2,
            head_limits: RotationLimits::head(),
            expression_ramp_ms: 250,
            expression_intensity: 1.0,
            idle: IdleConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn transition_window(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn expression_ramp(&self) -> Duration {
        Duration::from_millis(self.expression_ramp_ms)
    }
}

/// Animation fusion engine
pub struct FusionEngine {
    /// Configuration
    config: FusionConfig,

    /// Internal monotonic clock
    clock: FrameClock,

    /// Idle motion (always sampled)
    idle: IdleGenerator,

    /// Idle/tracking blend
    blend: BlendController,

    /// Smoothed tracked head rotation, present while tracking
    tracked_head: Option<EulerAngles>,

    /// Expression currently ramping or held
    expression: Expression,

    /// Time since the expression last changed
    expression_elapsed: Duration,

    /// Last fused state
    state: AnimationState,
}

impl FusionEngine {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::with_config(FusionConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(config: FusionConfig) -> Self {
        let idle = IdleGenerator::new(config.idle.clone());
        let blend = BlendController::new(config.transition_window());
        let mut state = AnimationState::default();
        state.mouth_open = idle.resting_mouth();
        // Start with the neutral preset fully applied
        state.expression_weight = 1.0;

        Self {
            config,
            clock: FrameClock::new(),
            idle,
            blend,
            tracked_head: None,
            expression: Expression::Neutral,
            expression_elapsed: Duration::MAX,
            state,
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Advance by an explicit frame delta and fuse
    pub fn update(&mut self, inputs: &FusionInputs, dt: Duration) -> &AnimationState {
        let tick = self.clock.advance(dt);
        self.fuse(inputs, tick)
    }

    /// Advance from the OS clock and fuse
    pub fn tick(&mut self, inputs: &FusionInputs) -> &AnimationState {
        let tick = self.clock.tick();
        self.fuse(inputs, tick)
    }

    /// Last fused state
    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Current idle/tracking blend factor
    pub fn blend_factor(&self) -> f32 {
        self.blend.factor()
    }

    /// Idle motion sampled on the last frame
    pub fn idle_state(&self) -> IdleState {
        self.idle.current()
    }

    /// Current frame time
    pub fn now(&self) -> FrameTime {
        self.clock.now()
    }

    fn fuse(&mut self, inputs: &FusionInputs, tick: FrameTick) -> &AnimationState {
        let idle = self.idle.sample(tick.now);
        let face = &inputs.face;
        let tracking = face.tracked;
        let blend = self.blend.update(tracking, tick.dt);

        // Head
        let head = if tracking {
            let target = face.head_rotation.sanitized().clamp_to(&self.config.head_limits);
            let smoothed = match self.tracked_head {
                Some(prev) => prev.lerp(&target, self.config.head_smoothing.clamp(0.0, 1.0)),
                None => idle.head_rotation,
            };
            self.tracked_head = Some(smoothed);
            idle.head_rotation.lerp(&smoothed, blend.factor)
        } else {
            self.tracked_head = None;
            idle.head_rotation
        };

        // Mouth
        let (mouth_source, mouth_open, visemes) = if inputs.lip_sync_voiced() {
            let weights = inputs.viseme.weights.sanitized();
            (MouthSource::Viseme, weights.mouth_open(), weights)
        } else if tracking {
            (MouthSource::Face, unit(face.mouth_open), VisemeWeights::default())
        } else {
            (MouthSource::Idle, idle.mouth_open, VisemeWeights::default())
        };
        if mouth_source != self.state.mouth_source {
            tracing::trace!(
                from = ?self.state.mouth_source,
                to = ?mouth_source,
                "mouth source changed"
            );
        }

        // Blinks
        let (blink_left, blink_right) = if tracking {
            (unit(face.blink_left), unit(face.blink_right))
        } else {
            (idle.blink_left, idle.blink_right)
        };

        // Breathing and audio
        let audio_active = inputs.audio_active();
        let (volume, bass, treble) = if audio_active {
            (unit(inputs.audio.volume), unit(inputs.audio.bass), unit(inputs.audio.treble))
        } else {
            (0.0, 0.0, 0.0)
        };
        let breath_scale = if audio_active {
            let boost = 1.0 + bass * self.config.breath_boost_gain.max(0.0);
            idle.breath_scale.max(boost)
        } else {
            idle.breath_scale
        };

        // Expression
        let expression_weight = self.update_expression(inputs.expression.expression, tick.dt);
        let modifier = ExpressionModifier::for_expression(
            self.expression,
            expression_weight * self.config.expression_intensity.max(0.0),
            tick.now.as_secs_f32(),
        );
        let head_rotation = (head + modifier.head_offset)
            .sanitized()
            .clamp_to(&self.config.head_limits);
        let mouth_open = if mouth_source.is_live() {
            unit(mouth_open + modifier.mouth_bias)
        } else {
            mouth_open
        };

        self.state = AnimationState {
            time: tick.now,
            head_rotation,
            mouth_open,
            visemes,
            blink_left,
            blink_right,
            breath_scale,
            body_sway: idle.body_sway * (1.0 - blend.factor),
            expression: self.expression,
            expression_weight,
            blend,
            mouth_source,
            volume,
            bass,
            treble,
        };
        &self.state
    }

    /// Track expression changes and return the ramp weight
    fn update_expression(&mut self, requested: Expression, dt: Duration) -> f32 {
        if requested != self.expression {
            tracing::debug!(from = %self.expression, to = %requested, "expression changed");
            self.expression = requested;
            self.expression_elapsed = Duration::ZERO;
        } else {
            self.expression_elapsed = self.expression_elapsed.saturating_add(dt);
        }

        let ramp = self.config.expression_ramp();
        if ramp.is_zero() || self.expression_elapsed >= ramp {
            1.0
        } else {
            unit(self.expression_elapsed.as_secs_f32() / ramp.as_secs_f32())
        }
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::Vec3;
    use mimic_signal::{AudioSignal, ExpressionOverride, FaceSignal, VisemeSignal};
    use proptest::prelude::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn tracked_face(mouth: f32, yaw: f32) -> FaceSignal {
        FaceSignal {
            tracked: true,
            head_rotation: EulerAngles::new(0.0, yaw, 0.0),
            head_position: Vec3::ZERO,
            mouth_open: mouth,
            blink_left: 0.2,
            blink_right: 0.8,
            ..FaceSignal::default()
        }
    }

    fn voiced() -> VisemeSignal {
        VisemeSignal {
            active: true,
            weights: VisemeWeights { aa: 0.9, ..VisemeWeights::default() },
            silence: 0.1,
        }
    }

    #[test]
    fn test_idle_without_sources() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs::idle();
        for _ in 0..120 {
            let s = *engine.update(&inputs, FRAME);
            assert_eq!(s.mouth_source, MouthSource::Idle);
            assert_eq!(s.mouth_open, engine.idle_state().mouth_open);
            assert_eq!(s.blend.factor, 0.0);
            assert_eq!(s.head_rotation, engine.idle_state().head_rotation);
        }
    }

    #[test]
    fn test_face_drives_mouth_and_blinks() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs { face: tracked_face(0.7, 0.0), ..FusionInputs::idle() };
        let s = *engine.update(&inputs, FRAME);
        assert_eq!(s.mouth_source, MouthSource::Face);
        assert!((s.mouth_open - 0.7).abs() < 1e-6);
        assert_eq!((s.blink_left, s.blink_right), (0.2, 0.8));
    }

    #[test]
    fn test_voiced_lip_sync_beats_face() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs {
            face: tracked_face(0.1, 0.0),
            viseme: voiced(),
            lip_sync: true,
            ..FusionInputs::idle()
        };
        let s = *engine.update(&inputs, FRAME);
        assert_eq!(s.mouth_source, MouthSource::Viseme);
        assert!((s.mouth_open - voiced().mouth_open()).abs() < 1e-6);
        assert!(s.visemes.aa > 0.0);
    }

    #[test]
    fn test_silent_lip_sync_falls_back_to_face() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs {
            face: tracked_face(0.4, 0.0),
            viseme: VisemeSignal { active: true, ..VisemeSignal::silent() },
            lip_sync: true,
            ..FusionInputs::idle()
        };
        let s = *engine.update(&inputs, FRAME);
        assert_eq!(s.mouth_source, MouthSource::Face);
        assert_eq!(s.visemes, VisemeWeights::default());
    }

    #[test]
    fn test_head_smoothed_toward_target() {
        let mut engine = FusionEngine::with_config(FusionConfig {
            transition_ms: 0,
            ..FusionConfig::default()
        });
        let inputs = FusionInputs { face: tracked_face(0.0, 0.8), ..FusionInputs::idle() };
        let first = engine.update(&inputs, FRAME).head_rotation.yaw;
        let second = engine.update(&inputs, FRAME).head_rotation.yaw;
        assert!(first < second);
        for _ in 0..200 {
            engine.update(&inputs, FRAME);
        }
        assert!((engine.state().head_rotation.yaw - 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_breath_takes_max_not_sum() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs {
            audio: AudioSignal { listening: true, volume: 1.0, bass: 1.0, treble: 1.0 },
            audio_reactive: true,
            ..FusionInputs::idle()
        };
        for _ in 0..300 {
            let s = engine.update(&inputs, FRAME);
            assert!((s.breath_scale - 1.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_audio_ignored_unless_reactive() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs {
            audio: AudioSignal { listening: true, volume: 1.0, bass: 1.0, treble: 1.0 },
            audio_reactive: false,
            ..FusionInputs::idle()
        };
        let s = *engine.update(&inputs, FRAME);
        assert!(s.breath_scale <= 1.05 + 1e-6);
        assert_eq!((s.volume, s.bass, s.treble), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_expression_ramps_in() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs {
            expression: ExpressionOverride::new(Expression::Sad, FrameTime::ZERO),
            ..FusionInputs::idle()
        };
        let first = *engine.update(&inputs, FRAME);
        assert_eq!(first.expression, Expression::Sad);
        assert!(first.expression_weight < 0.5);
        for _ in 0..30 {
            engine.update(&inputs, FRAME);
        }
        assert_eq!(engine.state().expression_weight, 1.0);
    }

    #[test]
    fn test_expression_does_not_move_idle_mouth() {
        let mut engine = FusionEngine::new();
        let inputs = FusionInputs {
            expression: ExpressionOverride::new(Expression::Surprised, FrameTime::ZERO),
            ..FusionInputs::idle()
        };
        for _ in 0..60 {
            let s = *engine.update(&inputs, FRAME);
            assert_eq!(s.mouth_open, engine.idle_state().mouth_open);
        }
    }

    #[test]
    fn test_nan_face_is_sanitized() {
        let mut engine = FusionEngine::new();
        let mut face = tracked_face(f32::NAN, f32::NAN);
        face.blink_left = f32::INFINITY;
        let inputs = FusionInputs { face, ..FusionInputs::idle() };
        for _ in 0..10 {
            let s = *engine.update(&inputs, FRAME);
            assert!(s.head_rotation.is_finite());
            assert!(s.unit_channels().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    proptest! {
        #[test]
        fn prop_any_inputs_stay_bounded(
            tracked in any::<bool>(),
            rotation in prop::array::uniform3(prop::num::f32::ANY),
            face_scalars in prop::array::uniform3(prop::num::f32::ANY),
            levels in prop::array::uniform3(-2.0f32..3.0),
            vowels in prop::array::uniform5(-2.0f32..3.0),
            limits in prop::array::uniform3(prop::num::f32::ANY),
            toggles in (any::<bool>(), any::<bool>(), any::<bool>()),
        ) {
            let [pitch, yaw, roll] = rotation;
            let [mouth, blink_left, blink_right] = face_scalars;
            let [volume, bass, treble] = levels;
            let (lip_sync, audio_reactive, listening) = toggles;
            let inputs = FusionInputs {
                face: FaceSignal {
                    tracked,
                    head_rotation: EulerAngles::new(pitch, yaw, roll),
                    mouth_open: mouth,
                    blink_left,
                    blink_right,
                    ..FaceSignal::default()
                },
                audio: AudioSignal { listening, volume, bass, treble },
                audio_reactive,
                viseme: VisemeSignal {
                    active: true,
                    weights: VisemeWeights {
                        aa: vowels[0],
                        ih: vowels[1],
                        ou: vowels[2],
                        ee: vowels[3],
                        oh: vowels[4],
                    },
                    silence: 0.0,
                },
                lip_sync,
                expression: ExpressionOverride::new(Expression::Happy, FrameTime::ZERO),
            };
            let config = FusionConfig {
                head_limits: RotationLimits { pitch: limits[0], yaw: limits[1], roll: limits[2] },
                ..FusionConfig::default()
            };

            let mut engine = FusionEngine::with_config(config);
            for _ in 0..20 {
                let s = *engine.update(&inputs, FRAME);
                prop_assert!(s.head_rotation.is_finite());
                for v in s.unit_channels() {
                    prop_assert!((0.0..=1.0).contains(&v), "channel out of range: {}", v);
                }
                prop_assert!(s.breath_scale.is_finite() && s.breath_scale >= 1.0);
            }
        }
    }
}
