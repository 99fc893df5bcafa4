//! Session simulator
//!
//! Plays a scripted timeline of source events into a `Studio` at a fixed
//! frame rate and records every fused frame. Detection jitter is drawn
//! from a seeded RNG so a run is reproducible.

use std::sync::Arc;
use std::time::Duration;

use mimic_core::{EulerAngles, Vec3};
use mimic_fusion::AnimationState;
use mimic_runtime::{HotkeyTrigger, SignalHub, Studio, StudioConfig, StudioResult};
use mimic_signal::{
    AudioSignal, FaceSignal, HandPair, HandSignal, Handedness, IdleState, VisemeSignal,
    VisemeWeights, HAND_LANDMARK_COUNT,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Something that happens to a source at a point in the session
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    /// Face appears (or changes) with the given pose
    FaceFound {
        rotation: EulerAngles,
        mouth_open: f32,
        blink: f32,
    },
    FaceLost,
    /// Hand appears with its wrist at a normalized screen position
    HandFound { side: Handedness, wrist: Vec3 },
    HandLost(Handedness),
    /// Microphone levels
    Audio { volume: f32, bass: f32, treble: f32 },
    AudioStopped,
    Visemes(VisemeWeights),
    VisemesStopped,
    LipSync(bool),
    AudioReactive(bool),
    Key(String),
}

/// An event at a time offset from session start
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub at: Duration,
    pub event: ScriptEvent,
}

/// Ordered list of cues
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    cues: Vec<Cue>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cue at `ms` milliseconds
    pub fn at(mut self, ms: u64, event: ScriptEvent) -> Self {
        self.cues.push(Cue { at: Duration::from_millis(ms), event });
        self.cues.sort_by_key(|c| c.at);
        self
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Time of the last cue
    pub fn end(&self) -> Duration {
        self.cues.last().map(|c| c.at).unwrap_or(Duration::ZERO)
    }
}

/// Per-frame detection noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterConfig {
    /// Max rotation error per axis (radians)
    pub rotation: f32,
    /// Max mouth/blink error
    pub scalar: f32,
    /// Chance a tracked face is missed for one frame
    pub dropout: f64,
}

impl JitterConfig {
    /// Perfect detections
    pub fn none() -> Self {
        Self {
            rotation: 0.0,
            scalar: 0.0,
            dropout: 0.0,
        }
    }

    /// Typical webcam noise
    pub fn webcam() -> Self {
        Self {
            rotation: 0.02,
            scalar: 0.05,
            dropout: 0.0,
        }
    }

    /// Noisy detections with occasional misses
    pub fn flaky() -> Self {
        Self {
            rotation: 0.05,
            scalar: 0.1,
            dropout: 0.05,
        }
    }
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub frame: Duration,
    pub seed: u64,
    pub jitter: JitterConfig,
    pub studio: StudioConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(20),
            seed: 0x51_4d,
            jitter: JitterConfig::none(),
            studio: StudioConfig::default(),
        }
    }
}

/// One recorded frame
#[derive(Debug, Clone, Copy)]
pub struct FrameRecord {
    /// Offset from session start
    pub at: Duration,
    pub state: AnimationState,
    /// Idle motion sampled for the same frame
    pub idle: IdleState,
    /// Was a face published for this frame?
    pub face_tracked: bool,
    pub hands: HandPair,
}

#[derive(Debug, Clone, Copy)]
struct FaceScript {
    rotation: EulerAngles,
    mouth_open: f32,
    blink: f32,
}

/// Drives a studio from a timeline
pub struct SessionSimulator {
    config: SimulatorConfig,
    studio: Studio,
    hub: Arc<SignalHub>,
    hotkeys: HotkeyTrigger,
    timeline: Timeline,
    cursor: usize,
    rng: StdRng,
    elapsed: Duration,
    face: Option<FaceScript>,
    hands: HandPair,
    records: Vec<FrameRecord>,
}

impl SessionSimulator {
    pub fn new(config: SimulatorConfig, timeline: Timeline) -> StudioResult<Self> {
        let studio = Studio::new(config.studio.clone())?;
        let hub = studio.hub();
        let hotkeys = studio.hotkey_trigger();
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            studio,
            hub,
            hotkeys,
            timeline,
            cursor: 0,
            rng,
            elapsed: Duration::ZERO,
            face: None,
            hands: HandPair::default(),
            records: Vec::new(),
        })
    }

    /// Default configuration
    pub fn with_timeline(timeline: Timeline) -> StudioResult<Self> {
        Self::new(SimulatorConfig::default(), timeline)
    }

    pub fn studio(&self) -> &Studio {
        &self.studio
    }

    pub fn studio_mut(&mut self) -> &mut Studio {
        &mut self.studio
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    /// Apply due cues, publish the sources and fuse one frame
    pub fn step(&mut self) -> FrameRecord {
        self.apply_due_cues();
        let face_tracked = self.publish_face();

        let state = *self.studio.frame(self.config.frame);
        self.elapsed += self.config.frame;

        let record = FrameRecord {
            at: self.elapsed,
            state,
            idle: self.studio.idle_state(),
            face_tracked,
            hands: *self.studio.hands(),
        };
        self.records.push(record);
        record
    }

    /// Step until `duration` of session time has passed
    pub fn run_for(&mut self, duration: Duration) -> &[FrameRecord] {
        let start = self.records.len();
        let end = self.elapsed + duration;
        while self.elapsed < end {
            self.step();
        }
        &self.records[start..]
    }

    /// Run past the last cue plus `tail`
    pub fn run_to_end(&mut self, tail: Duration) -> &[FrameRecord] {
        let remaining = (self.timeline.end() + tail).saturating_sub(self.elapsed);
        self.run_for(remaining)
    }

    fn apply_due_cues(&mut self) {
        while let Some(cue) = self.timeline.cues.get(self.cursor) {
            if cue.at > self.elapsed {
                break;
            }
            let event = cue.event.clone();
            self.cursor += 1;
            self.apply(event);
        }
    }

    fn apply(&mut self, event: ScriptEvent) {
        match event {
            ScriptEvent::FaceFound { rotation, mouth_open, blink } => {
                self.face = Some(FaceScript { rotation, mouth_open, blink });
            }
            ScriptEvent::FaceLost => self.face = None,
            ScriptEvent::HandFound { side, wrist } => {
                let hand = straight_hand(wrist);
                match side {
                    Handedness::Left => self.hands.left = hand,
                    Handedness::Right => self.hands.right = hand,
                }
                self.hub.publish_hands(self.hands);
            }
            ScriptEvent::HandLost(side) => {
                match side {
                    Handedness::Left => self.hands.left = HandSignal::not_tracked(),
                    Handedness::Right => self.hands.right = HandSignal::not_tracked(),
                }
                self.hub.publish_hands(self.hands);
            }
            ScriptEvent::Audio { volume, bass, treble } => {
                self.hub.publish_audio(AudioSignal { listening: true, volume, bass, treble });
            }
            ScriptEvent::AudioStopped => self.hub.publish_audio(AudioSignal::silent()),
            ScriptEvent::Visemes(weights) => {
                self.hub.publish_viseme(VisemeSignal {
                    active: true,
                    weights,
                    silence: (1.0 - weights.total()).clamp(0.0, 1.0),
                });
            }
            ScriptEvent::VisemesStopped => self.hub.publish_viseme(VisemeSignal::silent()),
            ScriptEvent::LipSync(enabled) => self.hub.set_lip_sync(enabled),
            ScriptEvent::AudioReactive(enabled) => self.hub.set_audio_reactive(enabled),
            ScriptEvent::Key(key) => {
                self.hotkeys.on_key(&key);
            }
        }
    }

    /// Publish this frame's face detection; returns whether it was tracked
    fn publish_face(&mut self) -> bool {
        let Some(script) = self.face else {
            self.hub.publish_face(FaceSignal::not_tracked());
            return false;
        };
        let jitter = self.config.jitter;
        if jitter.dropout > 0.0 && self.rng.gen_bool(jitter.dropout.min(1.0)) {
            self.hub.publish_face(FaceSignal::not_tracked());
            return false;
        }

        let noise = EulerAngles::new(
            self.noise(jitter.rotation),
            self.noise(jitter.rotation),
            self.noise(jitter.rotation),
        );
        let mouth = script.mouth_open + self.noise(jitter.scalar);
        let blink = script.blink + self.noise(jitter.scalar);

        self.hub.publish_face(FaceSignal {
            tracked: true,
            head_rotation: script.rotation + noise,
            mouth_open: mouth,
            blink_left: blink,
            blink_right: blink,
            ..FaceSignal::default()
        });
        true
    }

    fn noise(&mut self, amplitude: f32) -> f32 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }
}

/// Open hand with the wrist at `wrist`, fingers pointing up
pub fn straight_hand(wrist: Vec3) -> HandSignal {
    let points: Vec<Vec3> = (0..HAND_LANDMARK_COUNT)
        .map(|i| Vec3::new(wrist.x, wrist.y - i as f32 * 0.01, wrist.z))
        .collect();
    HandSignal::from_landmarks(&points).unwrap_or_else(|_| HandSignal::not_tracked())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::Expression;

    #[test]
    fn test_timeline_sorted() {
        let timeline = Timeline::new()
            .at(500, ScriptEvent::FaceLost)
            .at(100, ScriptEvent::LipSync(true));
        assert_eq!(timeline.cues()[0].at, Duration::from_millis(100));
        assert_eq!(timeline.end(), Duration::from_millis(500));
    }

    #[test]
    fn test_cues_applied_at_time() {
        let timeline = Timeline::new()
            .at(
                100,
                ScriptEvent::FaceFound { rotation: EulerAngles::ZERO, mouth_open: 0.5, blink: 0.0 },
            )
            .at(300, ScriptEvent::FaceLost);
        let mut sim = SessionSimulator::with_timeline(timeline).unwrap();
        let records = sim.run_for(Duration::from_millis(400)).to_vec();

        assert_eq!(records.len(), 20);
        assert!(!records[0].face_tracked);
        assert!(records[5].face_tracked);
        assert!(!records[19].face_tracked);
    }

    #[test]
    fn test_same_seed_same_session() {
        let timeline = Timeline::new()
            .at(
                0,
                ScriptEvent::FaceFound { rotation: EulerAngles::ZERO, mouth_open: 0.3, blink: 0.1 },
            );
        let config =
            SimulatorConfig { jitter: JitterConfig::flaky(), ..SimulatorConfig::default() };

        let mut a = SessionSimulator::new(config.clone(), timeline.clone()).unwrap();
        let mut b = SessionSimulator::new(config, timeline).unwrap();
        let ra = a.run_for(Duration::from_secs(1)).to_vec();
        let rb = b.run_for(Duration::from_secs(1)).to_vec();

        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.state, y.state);
        }
    }

    #[test]
    fn test_key_cue_sets_expression() {
        let timeline = Timeline::new().at(40, ScriptEvent::Key("5".to_string()));
        let mut sim = SessionSimulator::with_timeline(timeline).unwrap();
        let last = *sim.run_for(Duration::from_millis(600)).last().unwrap();
        assert_eq!(last.state.expression, Expression::Surprised);
    }

    #[test]
    fn test_straight_hand_is_tracked() {
        assert!(straight_hand(Vec3::new(0.5, 0.8, 0.0)).tracked);
    }
}
