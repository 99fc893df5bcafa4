//! End-to-end scenarios
//!
//! Each scenario drives a full studio through the simulator and checks
//! one behavioural guarantee of the fusion pipeline:
//! - Idle mouth rests when nothing drives it
//! - Every output channel stays in range
//! - Blend ramps monotonically and snaps back on loss
//! - Mouth priority (visemes over face over idle)
//! - Breathing takes the max of idle and audio, never the sum
//! - Losing the camera mid-blend hands the head straight to idle

use std::time::Duration;

use mimic_core::{EulerAngles, Vec3};
use mimic_fusion::{BlendPhase, MouthSource};
use mimic_retarget::{ArmConfig, ArmDriver};
use mimic_signal::{HandPair, Handedness, VisemeWeights};

use crate::simulator::{
    FrameRecord, JitterConfig, ScriptEvent, SessionSimulator, SimulatorConfig, Timeline,
};

// ============================================================================
// SCENARIO RESULTS
// ============================================================================

/// Outcome of a scenario run
#[derive(Debug, Clone, Default)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub frames: usize,
    /// Human-readable failures; empty when the scenario passed
    pub violations: Vec<String>,
}

impl ScenarioResult {
    fn new(name: &'static str) -> Self {
        Self { name, ..Self::default() }
    }

    fn check(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.violations.push(message());
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

fn face(rotation: EulerAngles, mouth_open: f32) -> ScriptEvent {
    ScriptEvent::FaceFound { rotation, mouth_open, blink: 0.0 }
}

fn run(config: SimulatorConfig, timeline: Timeline, duration: Duration) -> Vec<FrameRecord> {
    match SessionSimulator::new(config, timeline) {
        Ok(mut sim) => sim.run_for(duration).to_vec(),
        Err(_) => Vec::new(),
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// No tracking, no lip-sync: the mouth never leaves the resting value,
/// even with an expression held and audio playing.
pub fn idle_mouth_rests() -> ScenarioResult {
    let mut result = ScenarioResult::new("idle_mouth_rests");
    let config = SimulatorConfig::default();
    let resting = config.studio.fusion.idle.resting_mouth;

    let timeline = Timeline::new()
        .at(0, ScriptEvent::AudioReactive(true))
        .at(0, ScriptEvent::Audio { volume: 0.8, bass: 0.5, treble: 0.3 })
        .at(500, ScriptEvent::Key("5".to_string()))
        .at(3000, ScriptEvent::Key("0".to_string()));
    let records = run(config, timeline, Duration::from_secs(6));
    result.frames = records.len();

    for r in &records {
        result.check(r.state.mouth_source == MouthSource::Idle, || {
            format!("{:?}: mouth source {:?}", r.at, r.state.mouth_source)
        });
        result.check(r.state.mouth_open == resting && r.idle.mouth_open == resting, || {
            format!("{:?}: mouth {} != resting {}", r.at, r.state.mouth_open, resting)
        });
    }
    result
}

/// Every channel stays in range under noisy, flaky detections with all
/// sources saturated.
pub fn saturated_sources_stay_bounded(seed: u64) -> ScenarioResult {
    let mut result = ScenarioResult::new("saturated_sources_stay_bounded");
    let config = SimulatorConfig {
        seed,
        jitter: JitterConfig::flaky(),
        ..SimulatorConfig::default()
    };
    let gain = config.studio.fusion.breath_boost_gain;
    let loud = VisemeWeights { aa: 1.0, ih: 1.0, ou: 1.0, ee: 1.0, oh: 1.0 };

    let timeline = Timeline::new()
        .at(0, ScriptEvent::LipSync(true))
        .at(0, ScriptEvent::AudioReactive(true))
        .at(0, ScriptEvent::Audio { volume: 1.0, bass: 1.0, treble: 1.0 })
        .at(0, face(EulerAngles::new(3.0, -3.0, 3.0), 1.0))
        .at(0, ScriptEvent::Key("5".to_string()))
        .at(400, ScriptEvent::Visemes(loud))
        .at(900, ScriptEvent::Key("4".to_string()))
        .at(1500, ScriptEvent::VisemesStopped)
        .at(2000, ScriptEvent::FaceLost);
    let records = run(config, timeline, Duration::from_secs(3));
    result.frames = records.len();

    for r in &records {
        for (i, v) in r.state.unit_channels().iter().enumerate() {
            result.check((0.0..=1.0).contains(v), || format!("{:?}: channel {} = {}", r.at, i, v));
        }
        let breath = r.state.breath_scale;
        result.check(breath >= 1.0 && breath <= 1.0 + gain.max(0.06), || {
            format!("{:?}: breath {}", r.at, breath)
        });
        result.check(r.state.head_rotation.is_finite(), || format!("{:?}: head not finite", r.at));
    }
    result
}

/// Blend factor climbs monotonically, hits 1 inside the window and
/// drops to 0 on the first frame without a face.
pub fn blend_ramp_and_reset() -> ScenarioResult {
    let mut result = ScenarioResult::new("blend_ramp_and_reset");
    let config = SimulatorConfig::default();
    let window = config.studio.fusion.transition_window();
    let frame = config.frame;

    let timeline = Timeline::new()
        .at(0, face(EulerAngles::new(0.1, 0.2, 0.0), 0.3))
        .at(1000, ScriptEvent::FaceLost);
    let records = run(config, timeline, Duration::from_millis(1200));
    result.frames = records.len();

    let tracked: Vec<&FrameRecord> = records.iter().filter(|r| r.face_tracked).collect();
    for pair in tracked.windows(2) {
        result.check(pair[1].state.blend.factor >= pair[0].state.blend.factor, || {
            format!("{:?}: blend decreased", pair[1].at)
        });
    }
    for r in tracked.iter().filter(|r| r.at >= window) {
        result.check(r.state.blend.factor == 1.0, || {
            format!("{:?}: factor {} after window", r.at, r.state.blend.factor)
        });
    }

    let lost = records.iter().find(|r| !r.face_tracked && r.at > frame);
    match lost {
        Some(r) => {
            result.check(r.state.blend.factor == 0.0, || format!("{:?}: no reset", r.at));
            result.check(r.state.blend.phase == BlendPhase::Idle, || {
                format!("{:?}: not idle", r.at)
            });
        }
        None => result.violations.push("face never lost".to_string()),
    }
    result
}

/// With lip-sync on and a tracked face, voiced visemes own the mouth.
pub fn visemes_own_the_mouth() -> ScenarioResult {
    let mut result = ScenarioResult::new("visemes_own_the_mouth");
    let weights = VisemeWeights { aa: 0.7, oh: 0.2, ..VisemeWeights::default() };
    let expected = weights.sanitized().mouth_open();
    let face_mouth = 0.15;

    let timeline = Timeline::new()
        .at(0, ScriptEvent::LipSync(true))
        .at(0, face(EulerAngles::ZERO, face_mouth))
        .at(200, ScriptEvent::Visemes(weights))
        .at(600, ScriptEvent::VisemesStopped);
    let records = run(SimulatorConfig::default(), timeline, Duration::from_millis(800));
    result.frames = records.len();

    for r in &records {
        let voiced = r.at > Duration::from_millis(200) && r.at <= Duration::from_millis(600);
        if voiced {
            result.check(r.state.mouth_source == MouthSource::Viseme, || {
                format!("{:?}: source {:?}", r.at, r.state.mouth_source)
            });
            result.check((r.state.mouth_open - expected).abs() < 1e-6, || {
                format!("{:?}: mouth {} != viseme {}", r.at, r.state.mouth_open, expected)
            });
        } else {
            result.check(r.state.mouth_source == MouthSource::Face, || {
                format!("{:?}: source {:?}", r.at, r.state.mouth_source)
            });
            result.check((r.state.mouth_open - face_mouth).abs() < 1e-6, || {
                format!("{:?}: mouth {} != face {}", r.at, r.state.mouth_open, face_mouth)
            });
        }
    }
    result
}

/// Full bass with idle breathing at its peak: the larger value wins.
pub fn breath_takes_max() -> ScenarioResult {
    let mut result = ScenarioResult::new("breath_takes_max");
    let config = SimulatorConfig::default();
    let boost = 1.0 + config.studio.fusion.breath_boost_gain;
    let idle_peak = 1.0 + config.studio.fusion.idle.breath_amplitude;

    let timeline = Timeline::new()
        .at(0, ScriptEvent::AudioReactive(true))
        .at(0, ScriptEvent::Audio { volume: 1.0, bass: 1.0, treble: 0.0 });
    let records = run(config, timeline, Duration::from_secs(5));
    result.frames = records.len();

    let mut saw_peak = false;
    for r in &records {
        saw_peak |= r.idle.breath_scale > idle_peak - 0.001;
        result.check((r.state.breath_scale - boost).abs() < 1e-6, || {
            format!("{:?}: breath {} (idle {})", r.at, r.state.breath_scale, r.idle.breath_scale)
        });
    }
    result.check(saw_peak, || "idle breathing never peaked".to_string());
    result
}

/// Camera lost at blend 0.6: the next frame is pure idle.
pub fn camera_lost_mid_blend() -> ScenarioResult {
    let mut result = ScenarioResult::new("camera_lost_mid_blend");
    let config = SimulatorConfig::default();
    let frame = config.frame;
    let window = config.studio.fusion.transition_window();
    // Frames needed to reach a 0.6 blend
    let frames = (window.as_secs_f32() * 0.6 / frame.as_secs_f32()).round() as u64;
    let lost_at = frames * frame.as_millis() as u64;

    let timeline = Timeline::new()
        .at(0, face(EulerAngles::new(0.4, -0.6, 0.2), 0.5))
        .at(lost_at, ScriptEvent::FaceLost);
    let records = run(config, timeline, Duration::from_millis(lost_at + 60));
    result.frames = records.len();

    let before = records.iter().filter(|r| r.face_tracked).last();
    let after = records.iter().find(|r| !r.face_tracked);
    match (before, after) {
        (Some(b), Some(a)) => {
            result.check((b.state.blend.factor - 0.6).abs() < 1e-3, || {
                format!("blend before loss {}", b.state.blend.factor)
            });
            result.check(a.state.blend.factor == 0.0, || {
                format!("blend after loss {}", a.state.blend.factor)
            });
            result.check(a.state.head_rotation == a.idle.head_rotation, || {
                format!("head {:?} != idle {:?}", a.state.head_rotation, a.idle.head_rotation)
            });
            result.check(a.state.blink_left == a.idle.blink_left, || "blink not idle".to_string());
        }
        _ => result.violations.push("missing frames around loss".to_string()),
    }
    result
}

/// A tracked hand takes over its arm; losing it returns the arm to sway
/// on the very next frame.
pub fn hand_takes_over_arm() -> ScenarioResult {
    let mut result = ScenarioResult::new("hand_takes_over_arm");
    let found = Duration::from_millis(100);
    let lost = Duration::from_millis(300);
    let timeline = Timeline::new()
        .at(
            100,
            ScriptEvent::HandFound { side: Handedness::Right, wrist: Vec3::new(0.6, 0.3, 0.0) },
        )
        .at(300, ScriptEvent::HandLost(Handedness::Right));
    let records = run(SimulatorConfig::default(), timeline, Duration::from_millis(400));
    result.frames = records.len();

    let arms = ArmDriver::new(ArmConfig::default(), false);
    for r in &records {
        let secs = r.at.as_secs_f32();
        let poses = arms.drive(&r.hands, secs);
        let expect = r.at > found && r.at <= lost;
        result.check(poses.right.tracked == expect, || {
            format!("{:?}: right arm tracked {}", r.at, poses.right.tracked)
        });
        result.check(!poses.left.tracked, || format!("{:?}: left arm tracked", r.at));
        if expect {
            // Wrist high in frame raises the arm past rest
            result.check(poses.right.upper_arm.roll > -ArmConfig::default().rest_roll, || {
                format!("{:?}: right arm not raised {:?}", r.at, poses.right.upper_arm)
            });
        }
    }

    match records.iter().find(|r| r.at > lost) {
        Some(r) => {
            let secs = r.at.as_secs_f32();
            let right = arms.drive(&r.hands, secs).right;
            let sway = arms.drive(&HandPair::default(), secs).right;
            result.check(right == sway, || format!("{:?}: arm {:?} is not sway", r.at, right));
        }
        None => result.violations.push("no frame after hand loss".to_string()),
    }
    result
}

/// Run every scenario
pub fn all_scenarios() -> Vec<ScenarioResult> {
    vec![
        idle_mouth_rests(),
        saturated_sources_stay_bounded(7),
        blend_ramp_and_reset(),
        visemes_own_the_mouth(),
        breath_takes_max(),
        camera_lost_mid_blend(),
        hand_takes_over_arm(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::Expression;
    use mimic_fusion::{FusionEngine, FusionInputs};
    use mimic_signal::{
        finger_curl, AudioSignal, ExpressionOverride, FaceSignal, Finger, VisemeSignal,
        CURL_GAIN, INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP,
    };
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    use crate::simulator::straight_hand;

    fn assert_passed(result: ScenarioResult) {
        assert!(result.frames > 0, "{}: no frames", result.name);
        assert!(result.passed(), "{}: {:?}", result.name, result.violations);
    }

    #[test]
    fn test_idle_mouth_rests() {
        assert_passed(idle_mouth_rests());
    }

    #[test]
    fn test_saturated_sources_stay_bounded() {
        for seed in [1, 2, 3] {
            assert_passed(saturated_sources_stay_bounded(seed));
        }
    }

    #[test]
    fn test_blend_ramp_and_reset() {
        assert_passed(blend_ramp_and_reset());
    }

    #[test]
    fn test_visemes_own_the_mouth() {
        assert_passed(visemes_own_the_mouth());
    }

    #[test]
    fn test_breath_takes_max() {
        assert_passed(breath_takes_max());
    }

    #[test]
    fn test_camera_lost_mid_blend() {
        assert_passed(camera_lost_mid_blend());
    }

    #[test]
    fn test_hand_takes_over_arm() {
        assert_passed(hand_takes_over_arm());
    }

    #[test]
    fn test_all_scenarios_named() {
        let names: Vec<_> = all_scenarios().iter().map(|r| r.name).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"camera_lost_mid_blend"));
    }

    #[test]
    fn test_curl_from_landmarks() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        assert!(finger_curl(a, b, Vec3::new(0.0, 2.0, 0.0), CURL_GAIN).abs() < 1e-5);
        let bent = finger_curl(a, b, Vec3::new(1.0, 1.0, 0.0), CURL_GAIN);
        assert!((bent - FRAC_PI_2 * CURL_GAIN).abs() < 1e-4);
    }

    #[test]
    fn test_bent_index_drives_arm_curl() {
        let mut hand = straight_hand(Vec3::new(0.5, 0.9, 0.0));
        hand.landmarks[INDEX_MCP] = Vec3::new(0.5, 0.5, 0.0);
        hand.landmarks[INDEX_PIP] = Vec3::new(0.5, 0.4, 0.0);
        hand.landmarks[INDEX_DIP] = Vec3::new(0.6, 0.4, 0.0);
        hand.landmarks[INDEX_TIP] = Vec3::new(0.7, 0.4, 0.0);

        let driver = ArmDriver::new(ArmConfig::default(), false);
        let poses = driver.drive(&HandPair { right: hand, ..HandPair::default() }, 0.0);
        let index = poses.right.curls.get(Finger::Index);
        assert!((index.proximal - FRAC_PI_2 * CURL_GAIN).abs() < 1e-4);
        assert!(index.distal.abs() < 1e-4);
        assert_eq!(poses.right.curls.get(Finger::Middle).proximal, 0.0);
    }

    fn expression(index: usize) -> Expression {
        Expression::all()[index % Expression::all().len()]
    }

    proptest! {
        #[test]
        fn prop_unit_inputs_give_unit_outputs(
            tracked in any::<bool>(),
            rotation in prop::array::uniform3(-4.0f32..4.0),
            face_scalars in prop::array::uniform3(0.0f32..=1.0),
            levels in prop::array::uniform3(0.0f32..=1.0),
            vowels in prop::array::uniform5(0.0f32..=1.0),
            lip_sync in any::<bool>(),
            audio_reactive in any::<bool>(),
            expr in 0usize..6,
            frames in 1usize..40,
        ) {
            let [pitch, yaw, roll] = rotation;
            let [mouth, blink_l, blink_r] = face_scalars;
            let [volume, bass, treble] = levels;
            let inputs = FusionInputs {
                face: FaceSignal {
                    tracked,
                    head_rotation: EulerAngles::new(pitch, yaw, roll),
                    mouth_open: mouth,
                    blink_left: blink_l,
                    blink_right: blink_r,
                    ..FaceSignal::default()
                },
                audio: AudioSignal { listening: true, volume, bass, treble },
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
                expression: ExpressionOverride::new(expression(expr), Default::default()),
            };

            let mut engine = FusionEngine::new();
            let gain = engine.config().breath_boost_gain;
            for _ in 0..frames {
                let state = *engine.update(&inputs, Duration::from_millis(16));
                for v in state.unit_channels() {
                    prop_assert!((0.0..=1.0).contains(&v), "channel out of range: {}", v);
                }
                prop_assert!(state.breath_scale >= 1.0);
                prop_assert!(state.breath_scale <= 1.0 + gain.max(0.06));
                prop_assert!(state.visemes.total() <= 1.0 + 1e-5);
            }
        }
    }
}
