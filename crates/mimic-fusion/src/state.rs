//! Animation State - The one authoritative per-frame snapshot
//!
//! AnimationState is recomputed every rendered frame and has no identity
//! beyond "this frame's value". FusionInputs is the matching input
//! snapshot: every source read exactly once at the start of the frame.

use mimic_core::{EulerAngles, Expression, FrameTime};
use mimic_signal::{AudioSignal, ExpressionOverride, FaceSignal, VisemeSignal, VisemeWeights};
use serde::{Deserialize, Serialize};

use crate::BlendState;

/// Which source drove the mouth this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthSource {
    /// Lip-sync visemes
    Viseme,
    /// Face tracking jawOpen
    Face,
    /// Idle resting mouth
    #[default]
    Idle,
}

impl MouthSource {
    /// Is a live signal (not idle) driving the mouth?
    pub fn is_live(&self) -> bool {
        !matches!(self, MouthSource::Idle)
    }
}

/// Fused pose and expression for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    /// Frame time this state was fused at
    pub time: FrameTime,

    /// Head rotation (radians), inside the configured limits
    pub head_rotation: EulerAngles,

    /// Mouth openness [0.0 - 1.0]
    pub mouth_open: f32,

    /// Per-vowel weights; zero unless lip-sync drives the mouth
    pub visemes: VisemeWeights,

    /// Eye blinks (0.0 = open, 1.0 = closed)
    pub blink_left: f32,
    pub blink_right: f32,

    /// Body scale, 1.0 at rest
    pub breath_scale: f32,

    /// Body roll (radians), faded out as tracking takes over
    pub body_sway: f32,

    /// Hotkey-selected expression
    pub expression: Expression,

    /// Ramp of the current expression [0.0 - 1.0]
    pub expression_weight: f32,

    /// Idle/tracking blend
    pub blend: BlendState,

    pub mouth_source: MouthSource,

    /// Audio levels for decorative consumers (zero unless audio-reactive)
    pub volume: f32,
    pub bass: f32,
    pub treble: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            time: FrameTime::ZERO,
            head_rotation: EulerAngles::ZERO,
            mouth_open: 0.0,
            visemes: VisemeWeights::default(),
            blink_left: 0.0,
            blink_right: 0.0,
            breath_scale: 1.0,
            body_sway: 0.0,
            expression: Expression::Neutral,
            expression_weight: 0.0,
            blend: BlendState::idle(),
            mouth_source: MouthSource::Idle,
            volume: 0.0,
            bass: 0.0,
            treble: 0.0,
        }
    }
}

impl AnimationState {
    /// Every unit-range scalar, for bound checks
    pub fn unit_channels(&self) -> [f32; 13] {
        [
            self.mouth_open,
            self.visemes.aa,
            self.visemes.ih,
            self.visemes.ou,
            self.visemes.ee,
            self.visemes.oh,
            self.blink_left,
            self.blink_right,
            self.expression_weight,
            self.blend.factor,
            self.volume,
            self.bass,
            self.treble,
        ]
    }
}

/// Snapshot of every source for one frame
#[derive(Debug, Clone, Default)]
pub struct FusionInputs {
    pub face: FaceSignal,
    pub audio: AudioSignal,
    /// Audio-reactive mode (bass boosts breathing)
    pub audio_reactive: bool,
    pub viseme: VisemeSignal,
    /// Lip-sync enabled
    pub lip_sync: bool,
    pub expression: ExpressionOverride,
}

impl FusionInputs {
    /// Nothing tracked, nothing enabled
    pub fn idle() -> Self {
        Self::default()
    }

    /// Does lip-sync currently claim the mouth?
    pub fn lip_sync_voiced(&self) -> bool {
        self.lip_sync && self.viseme.active && !self.viseme.is_silent()
    }

    /// Is audio feeding the breathing boost?
    pub fn audio_active(&self) -> bool {
        self.audio_reactive && self.audio.listening
    }
}
