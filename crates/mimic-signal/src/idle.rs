//! Idle Motion - Keeping the avatar alive without input
//!
//! Idle motion is always available and has no "not tracked" state. It
//! combines:
//! - low-frequency value noise on each head axis
//! - sinusoidal breathing and body sway
//! - blinks on a Gaussian-distributed cadence (never strictly periodic)
//!
//! Output is deterministic for a given seed and sequence of sample times.

use std::f32::consts::TAU;

use mimic_core::{lerp, smoothstep, unit, EulerAngles, FrameTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Lattice points per noise channel
const NOISE_LATTICE: usize = 256;

/// Idle animation output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleState {
    pub head_rotation: EulerAngles,
    pub blink_left: f32,
    pub blink_right: f32,
    /// Body scale from breathing, in [1, 1 + breath_amplitude]
    pub breath_scale: f32,
    /// Body roll (radians)
    pub body_sway: f32,
    /// Resting mouth openness
    pub mouth_open: f32,
}

impl Default for IdleState {
    fn default() -> Self {
        Self {
            head_rotation: EulerAngles::ZERO,
            blink_left: 0.0,
            blink_right: 0.0,
            breath_scale: 1.0,
            body_sway: 0.0,
            mouth_open: 0.0,
        }
    }
}

/// Idle generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Seed for noise and blink cadence
    pub seed: u64,
    /// Peak head rotation per axis (radians)
    pub head_amplitude: EulerAngles,
    /// Noise lattice steps per second
    pub head_frequency: f32,
    /// Seconds per breath
    pub breath_period: f32,
    /// Extra scale at full inhale
    pub breath_amplitude: f32,
    /// Seconds per sway cycle
    pub sway_period: f32,
    /// Peak body roll (radians)
    pub sway_amplitude: f32,
    /// Mean seconds between blinks
    pub blink_interval_mean: f32,
    /// Standard deviation of the blink interval
    pub blink_interval_stddev: f32,
    /// Interval clamp (seconds)
    pub blink_interval_min: f32,
    pub blink_interval_max: f32,
    /// Lid closing time (seconds)
    pub blink_close: f32,
    /// Fully closed hold (seconds)
    pub blink_hold: f32,
    /// Lid opening time (seconds)
    pub blink_open: f32,
    /// Probability that a blink is immediately followed by a second one
    pub double_blink_chance: f32,
    /// Mouth openness at rest
    pub resting_mouth: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            head_amplitude: EulerAngles::new(0.06, 0.1, 0.04),
            head_frequency: 0.25,
            breath_period: 4.0,
            breath_amplitude: 0.05,
            sway_period: 6.5,
            sway_amplitude: 0.03,
            blink_interval_mean: 4.0,
            blink_interval_stddev: 1.2,
            blink_interval_min: 1.5,
            blink_interval_max: 8.0,
            blink_close: 0.06,
            blink_hold: 0.04,
            blink_open: 0.10,
            double_blink_chance: 0.1,
            resting_mouth: 0.0,
        }
    }
}

/// Smoothstep-interpolated 1-D value noise in [-1, 1]
#[derive(Debug, Clone)]
pub struct ValueNoise {
    lattice: Vec<f32>,
}

impl ValueNoise {
    pub fn new(rng: &mut StdRng) -> Self {
        Self {
            lattice: (0..NOISE_LATTICE).map(|_| rng.gen_range(-1.0..=1.0)).collect(),
        }
    }

    pub fn sample(&self, x: f32) -> f32 {
        if !x.is_finite() {
            return 0.0;
        }
        let floor = x.floor();
        let i = (floor as i64).rem_euclid(NOISE_LATTICE as i64) as usize;
        let a = self.lattice[i];
        let b = self.lattice[(i + 1) % NOISE_LATTICE];
        lerp(a, b, smoothstep(x - floor))
    }
}

/// Standard normal sample via Box–Muller
pub fn gaussian(rng: &mut StdRng, mean: f32, stddev: f32) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
    mean + stddev * z
}

/// Procedural idle motion
#[derive(Debug, Clone)]
pub struct IdleGenerator {
    config: IdleConfig,
    rng: StdRng,
    /// Noise per head axis: pitch, yaw, roll
    noise: [ValueNoise; 3],
    /// When the next blink begins (seconds)
    next_blink_at: f32,
    /// Start of the blink in progress
    blink_started: Option<f32>,
    state: IdleState,
}

impl Default for IdleGenerator {
    fn default() -> Self {
        Self::new(IdleConfig::default())
    }
}

impl IdleGenerator {
    pub fn new(config: IdleConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let noise = [
            ValueNoise::new(&mut rng),
            ValueNoise::new(&mut rng),
            ValueNoise::new(&mut rng),
        ];
        let mut generator = Self {
            config,
            rng,
            noise,
            next_blink_at: 0.0,
            blink_started: None,
            state: IdleState::default(),
        };
        generator.state.mouth_open = unit(generator.config.resting_mouth);
        generator.next_blink_at = generator.blink_interval();
        generator
    }

    pub fn config(&self) -> &IdleConfig {
        &self.config
    }

    /// Last sampled state
    pub fn current(&self) -> IdleState {
        self.state
    }

    /// Mouth openness at rest
    pub fn resting_mouth(&self) -> f32 {
        self.state.mouth_open
    }

    /// Sample idle motion at frame time `t`
    pub fn sample(&mut self, t: FrameTime) -> IdleState {
        let secs = t.as_secs_f32();
        let cfg = &self.config;

        let x = secs * cfg.head_frequency;
        let head_rotation = EulerAngles::new(
            self.noise[0].sample(x) * cfg.head_amplitude.pitch,
            self.noise[1].sample(x + 71.3) * cfg.head_amplitude.yaw,
            self.noise[2].sample(x + 143.7) * cfg.head_amplitude.roll,
        );

        let breath_phase = phase(secs, cfg.breath_period);
        let breath_scale = 1.0 + cfg.breath_amplitude.max(0.0) * (0.5 - 0.5 * breath_phase.cos());
        let body_sway = phase(secs, cfg.sway_period).sin() * cfg.sway_amplitude;

        let blink = self.blink_at(secs);

        self.state = IdleState {
            head_rotation: head_rotation.sanitized(),
            blink_left: blink,
            blink_right: blink,
            breath_scale,
            body_sway,
            mouth_open: self.state.mouth_open,
        };
        self.state
    }

    /// Advance the blink schedule and return lid closure at `secs`
    fn blink_at(&mut self, secs: f32) -> f32 {
        if self.blink_started.is_none() && secs >= self.next_blink_at {
            self.blink_started = Some(secs);
        }
        let Some(start) = self.blink_started else {
            return 0.0;
        };

        let (close, hold, open) = (
            self.config.blink_close.max(1e-3),
            self.config.blink_hold.max(0.0),
            self.config.blink_open.max(1e-3),
        );
        let elapsed = (secs - start).max(0.0);

        if elapsed < close {
            elapsed / close
        } else if elapsed < close + hold {
            1.0
        } else if elapsed < close + hold + open {
            1.0 - (elapsed - close - hold) / open
        } else {
            self.blink_started = None;
            let double = self.rng.gen::<f32>() < self.config.double_blink_chance;
            self.next_blink_at = if double {
                secs + 0.12
            } else {
                secs + self.blink_interval()
            };
            0.0
        }
    }

    fn blink_interval(&mut self) -> f32 {
        let cfg = &self.config;
        let min = cfg.blink_interval_min.max(0.1);
        let max = cfg.blink_interval_max.max(min);
        let (mean, stddev) = (cfg.blink_interval_mean, cfg.blink_interval_stddev.max(0.0));
        gaussian(&mut self.rng, mean, stddev).clamp(min, max)
    }
}

/// Oscillator phase in radians for a period in seconds
fn phase(secs: f32, period: f32) -> f32 {
    if period <= 0.0 || !period.is_finite() {
        return 0.0;
    }
    TAU * (secs / period).fract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn run(generator: &mut IdleGenerator, secs: f32, fps: u32) -> Vec<IdleState> {
        let frames = (secs * fps as f32) as u64;
        let step = Duration::from_secs_f32(1.0 / fps as f32);
        let mut t = FrameTime::ZERO;
        (0..frames)
            .map(|_| {
                t = t + step;
                generator.sample(t)
            })
            .collect()
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = IdleGenerator::default();
        let mut b = IdleGenerator::default();
        assert_eq!(run(&mut a, 5.0, 30), run(&mut b, 5.0, 30));
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = IdleGenerator::default();
        let mut b = IdleGenerator::new(IdleConfig { seed: 99, ..IdleConfig::default() });
        assert_ne!(run(&mut a, 3.0, 30), run(&mut b, 3.0, 30));
    }

    #[test]
    fn test_outputs_bounded() {
        let mut generator = IdleGenerator::default();
        let cfg = generator.config().clone();
        for s in run(&mut generator, 30.0, 60) {
            assert!((0.0..=1.0).contains(&s.blink_left));
            assert!(s.breath_scale >= 1.0 && s.breath_scale <= 1.0 + cfg.breath_amplitude + 1e-6);
            assert!(s.head_rotation.yaw.abs() <= cfg.head_amplitude.yaw + 1e-6);
            assert_eq!(s.mouth_open, cfg.resting_mouth);
        }
    }

    #[test]
    fn test_blinks_happen_irregularly() {
        let mut generator = IdleGenerator::default();
        let states = run(&mut generator, 60.0, 60);

        // Frame indices where a blink begins
        let starts: Vec<usize> = states
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0].blink_left == 0.0 && w[1].blink_left > 0.0)
            .map(|(i, _)| i)
            .collect();
        assert!(starts.len() >= 5, "expected regular blinking, got {}", starts.len());

        let gaps: Vec<usize> = starts.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.iter().any(|g| *g != gaps[0]), "blink cadence should not be periodic");
    }

    #[test]
    fn test_breath_reaches_peak() {
        let mut generator = IdleGenerator::default();
        let peak = run(&mut generator, 4.0, 60)
            .iter()
            .map(|s| s.breath_scale)
            .fold(0.0f32, f32::max);
        assert!((peak - 1.05).abs() < 1e-3);
    }

    #[test]
    fn test_value_noise_continuous() {
        let mut rng = StdRng::seed_from_u64(1);
        let noise = ValueNoise::new(&mut rng);
        let a = noise.sample(3.999);
        let b = noise.sample(4.001);
        assert!((a - b).abs() < 0.01);
        assert_eq!(noise.sample(f32::NAN), 0.0);
    }
}
