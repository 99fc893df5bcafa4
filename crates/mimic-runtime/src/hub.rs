//! Signal Hub - Shared latest-value slots
//!
//! Trackers write whole signal structs; the frame loop reads every slot
//! once per frame. Each slot has its own lock so a slow writer on one
//! source never stalls another. A reader sees either the previous or the
//! next complete value of a slot, never a mix of the two.

use mimic_core::FrameTime;
use mimic_fusion::FusionInputs;
use mimic_signal::{AudioSignal, ExpressionOverride, FaceSignal, HandPair, VisemeSignal};
use parking_lot::RwLock;

/// Feature toggles owned by the audio settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub lip_sync: bool,
    pub audio_reactive: bool,
}

/// Everything the frame loop needs, read in one pass
#[derive(Debug, Clone, Default)]
pub struct HubSnapshot {
    pub inputs: FusionInputs,
    pub hands: HandPair,
}

/// Shared container for the latest value of every source
#[derive(Debug, Default)]
pub struct SignalHub {
    face: RwLock<FaceSignal>,
    hands: RwLock<HandPair>,
    audio: RwLock<AudioSignal>,
    viseme: RwLock<VisemeSignal>,
    expression: RwLock<ExpressionOverride>,
    toggles: RwLock<Toggles>,
    /// Time of the most recent fused frame
    frame_time: RwLock<FrameTime>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toggles(toggles: Toggles) -> Self {
        Self {
            toggles: RwLock::new(toggles),
            ..Self::default()
        }
    }

    pub fn publish_face(&self, face: FaceSignal) {
        *self.face.write() = face;
    }

    pub fn publish_hands(&self, hands: HandPair) {
        *self.hands.write() = hands;
    }

    pub fn publish_audio(&self, audio: AudioSignal) {
        *self.audio.write() = audio;
    }

    pub fn publish_viseme(&self, viseme: VisemeSignal) {
        *self.viseme.write() = viseme;
    }

    pub fn publish_expression(&self, expression: ExpressionOverride) {
        *self.expression.write() = expression;
    }

    pub fn publish_frame_time(&self, now: FrameTime) {
        *self.frame_time.write() = now;
    }

    pub fn set_lip_sync(&self, enabled: bool) {
        self.toggles.write().lip_sync = enabled;
    }

    pub fn set_audio_reactive(&self, enabled: bool) {
        self.toggles.write().audio_reactive = enabled;
    }

    pub fn toggles(&self) -> Toggles {
        *self.toggles.read()
    }

    pub fn expression(&self) -> ExpressionOverride {
        *self.expression.read()
    }

    pub fn frame_time(&self) -> FrameTime {
        *self.frame_time.read()
    }

    pub fn face_tracked(&self) -> bool {
        self.face.read().tracked
    }

    /// Read every slot once
    pub fn snapshot(&self) -> HubSnapshot {
        let toggles = self.toggles();
        HubSnapshot {
            inputs: FusionInputs {
                face: self.face.read().clone(),
                audio: *self.audio.read(),
                audio_reactive: toggles.audio_reactive,
                viseme: *self.viseme.read(),
                lip_sync: toggles.lip_sync,
                expression: self.expression(),
            },
            hands: self.hands.read().clone(),
        }
    }
}
