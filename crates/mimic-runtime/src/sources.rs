//! Tracker handles
//!
//! Each handle owns the shaping state for one source and holds a shared
//! reference to the hub. Detector callbacks feed raw input in; the handle
//! shapes it and publishes a complete replacement value.

use std::sync::Arc;

use mimic_signal::{
    AudioAnalyzer, AudioConfig, FaceDetection, FaceShaper, FaceShaperConfig, FaceSignal,
    HandDetection, HandPair, HandShaper, HandShaperConfig, HotkeyMap, VisemeAnalyzer,
    VisemeConfig,
};

use crate::SignalHub;

/// Camera face tracking
#[derive(Debug)]
pub struct FaceTracker {
    hub: Arc<SignalHub>,
    shaper: FaceShaper,
    running: bool,
}

impl FaceTracker {
    pub fn new(hub: Arc<SignalHub>, config: FaceShaperConfig) -> Self {
        Self {
            hub,
            shaper: FaceShaper::new(config),
            running: false,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            tracing::debug!("face tracker started");
        }
    }

    /// Stop tracking; the face slot goes to "not tracked" at once
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.hub.publish_face(FaceSignal::not_tracked());
            tracing::debug!("face tracker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Detector callback; None when no face was found this frame
    pub fn on_detection(&mut self, detection: Option<&FaceDetection>) {
        if !self.running {
            return;
        }
        self.hub.publish_face(self.shaper.shape(detection));
    }

    /// Use this detection as the neutral pose
    pub fn calibrate(&mut self, detection: &FaceDetection) {
        self.shaper.calibrate(detection);
        tracing::debug!("face calibrated");
    }

    pub fn reset_calibration(&mut self) {
        self.shaper.reset_calibration();
    }
}

/// Camera hand tracking
#[derive(Debug)]
pub struct HandTracker {
    hub: Arc<SignalHub>,
    shaper: HandShaper,
    running: bool,
}

impl HandTracker {
    pub fn new(hub: Arc<SignalHub>, config: HandShaperConfig) -> Self {
        Self {
            hub,
            shaper: HandShaper::new(config),
            running: false,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            tracing::debug!("hand tracker started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.hub.publish_hands(HandPair::default());
            tracing::debug!("hand tracker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_detections(&mut self, detections: &[HandDetection]) {
        if !self.running {
            return;
        }
        self.hub.publish_hands(self.shaper.shape(detections));
    }
}

/// Microphone input: band levels plus lip-sync visemes
#[derive(Debug)]
pub struct AudioListener {
    hub: Arc<SignalHub>,
    audio: AudioAnalyzer,
    viseme: VisemeAnalyzer,
}

impl AudioListener {
    pub fn new(hub: Arc<SignalHub>, audio: AudioConfig, viseme: VisemeConfig) -> Self {
        Self {
            hub,
            audio: AudioAnalyzer::new(audio),
            viseme: VisemeAnalyzer::new(viseme),
        }
    }

    pub fn start(&mut self) {
        if self.audio.is_listening() {
            return;
        }
        self.audio.start();
        if self.hub.toggles().lip_sync {
            self.viseme.start();
        }
        self.publish();
        tracing::debug!(lip_sync = self.hub.toggles().lip_sync, "audio listener started");
    }

    /// Stop listening; levels and visemes drop to zero
    pub fn stop(&mut self) {
        if !self.audio.is_listening() {
            return;
        }
        self.audio.stop();
        self.viseme.stop();
        self.publish();
        tracing::debug!("audio listener stopped");
    }

    pub fn is_listening(&self) -> bool {
        self.audio.is_listening()
    }

    /// Feed one spectrum; `bin_hz` is the width of one bin
    pub fn on_spectrum(&mut self, bins: &[u8], bin_hz: f32) {
        if !self.audio.is_listening() {
            return;
        }
        self.audio.analyze(bins, bin_hz);
        self.viseme.analyze(bins, bin_hz);
        self.publish();
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.audio.set_sensitivity(sensitivity);
        tracing::debug!(sensitivity = self.audio.sensitivity(), "audio sensitivity changed");
    }

    pub fn set_lip_sync(&mut self, enabled: bool) {
        self.hub.set_lip_sync(enabled);
        if enabled && self.audio.is_listening() {
            self.viseme.start();
        } else {
            self.viseme.stop();
        }
        self.hub.publish_viseme(self.viseme.signal());
        tracing::debug!(enabled, "lip-sync toggled");
    }

    pub fn set_audio_reactive(&mut self, enabled: bool) {
        self.hub.set_audio_reactive(enabled);
        tracing::debug!(enabled, "audio-reactive toggled");
    }

    fn publish(&self) {
        self.hub.publish_audio(self.audio.signal());
        self.hub.publish_viseme(self.viseme.signal());
    }
}

/// Keyboard expression selection
#[derive(Debug)]
pub struct HotkeyTrigger {
    hub: Arc<SignalHub>,
    map: HotkeyMap,
}

impl HotkeyTrigger {
    pub fn new(hub: Arc<SignalHub>, map: HotkeyMap) -> Self {
        Self { hub, map }
    }

    pub fn map(&self) -> &HotkeyMap {
        &self.map
    }

    /// Handle a key press; returns true if the expression changed
    pub fn on_key(&self, key: &str) -> bool {
        let Some(event) = self.map.resolve(key) else {
            return false;
        };
        let mut current = self.hub.expression();
        if !current.apply(event, self.hub.frame_time()) {
            return false;
        }
        self.hub.publish_expression(current);
        tracing::debug!(key, expression = %current.expression, "expression changed");
        true
    }
}
