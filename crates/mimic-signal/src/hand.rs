//! Hand Signal - 21-point hand landmarks and finger curl
//!
//! Each hand is tracked independently: one may be in view while the other
//! is not. Curl angles come from the bend between consecutive finger
//! segments, measured with a guarded dot product.

use mimic_core::{MimicError, MimicResult, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// HAND LANDMARK INDICES
// ============================================================================

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Landmarks per hand
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Default multiplier applied to raw bend angles
pub const CURL_GAIN: f32 = 2.0;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Which hand, in the user's own anatomical terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn opposite(&self) -> Handedness {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

/// Finger identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Four landmarks along the finger, base to tip
    pub fn chain(&self) -> [usize; 4] {
        match self {
            Finger::Thumb => [THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP],
            Finger::Index => [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
            Finger::Middle => [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
            Finger::Ring => [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
            Finger::Pinky => [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
        }
    }
}

/// Raw hand detector output
#[derive(Debug, Clone)]
pub struct HandDetection {
    pub handedness: Handedness,
    /// Detector confidence [0.0 - 1.0]
    pub score: f32,
    /// Landmarks, normalized screen space
    pub landmarks: Vec<Vec3>,
}

/// Shaped signal for one hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSignal {
    pub tracked: bool,
    pub landmarks: [Vec3; HAND_LANDMARK_COUNT],
}

impl Default for HandSignal {
    fn default() -> Self {
        Self::not_tracked()
    }
}

impl HandSignal {
    pub fn not_tracked() -> Self {
        Self {
            tracked: false,
            landmarks: [Vec3::ZERO; HAND_LANDMARK_COUNT],
        }
    }

    /// Build a tracked signal; the slice must hold exactly 21 finite points
    pub fn from_landmarks(points: &[Vec3]) -> MimicResult<Self> {
        if points.len() != HAND_LANDMARK_COUNT {
            return Err(MimicError::InvalidLandmarks {
                expected: HAND_LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        let mut landmarks = [Vec3::ZERO; HAND_LANDMARK_COUNT];
        for (slot, p) in landmarks.iter_mut().zip(points) {
            *slot = if p.is_finite() { *p } else { Vec3::ZERO };
        }
        Ok(Self { tracked: true, landmarks })
    }

    pub fn wrist(&self) -> Vec3 {
        self.landmarks[WRIST]
    }

    /// Curl angles for every finger (zeros when not tracked)
    pub fn finger_curls(&self, gain: f32) -> FingerCurls {
        if !self.tracked {
            return FingerCurls::default();
        }
        FingerCurls::from_landmarks(&self.landmarks, gain)
    }
}

/// Both hands, each with its own staleness
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandPair {
    pub left: HandSignal,
    pub right: HandSignal,
}

impl HandPair {
    pub fn get(&self, hand: Handedness) -> &HandSignal {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    pub fn any_tracked(&self) -> bool {
        self.left.tracked || self.right.tracked
    }
}

// ============================================================================
// CURL ANGLES
// ============================================================================

/// Bend at joint `b` between segments a→b and b→c, clamped to [0, π]
/// then multiplied by `gain`.
///
/// Colinear points give 0; a right-angle bend gives π/2 × gain.
/// Zero-length segments give 0.
pub fn finger_curl(a: Vec3, b: Vec3, c: Vec3, gain: f32) -> f32 {
    let proximal = b - a;
    let distal = c - b;
    let angle = proximal.angle_to(&distal).clamp(0.0, std::f32::consts::PI);
    angle * gain
}

/// Proximal and distal bend of one finger
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FingerCurl {
    pub proximal: f32,
    pub distal: f32,
}

/// Curl for all five fingers, indexed by Finger
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FingerCurls {
    pub fingers: [FingerCurl; 5],
}

impl FingerCurls {
    pub fn from_landmarks(landmarks: &[Vec3; HAND_LANDMARK_COUNT], gain: f32) -> Self {
        let mut curls = FingerCurls::default();
        for (slot, finger) in curls.fingers.iter_mut().zip(Finger::ALL) {
            let [base, mid, upper, tip] = finger.chain().map(|i| landmarks[i]);
            *slot = FingerCurl {
                proximal: finger_curl(base, mid, upper, gain),
                distal: finger_curl(mid, upper, tip, gain),
            };
        }
        curls
    }

    pub fn get(&self, finger: Finger) -> FingerCurl {
        self.fingers[finger as usize]
    }
}

// ============================================================================
// SHAPING
// ============================================================================

/// Hand shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandShaperConfig {
    /// Detections below this score are discarded
    pub min_score: f32,
}

impl Default for HandShaperConfig {
    fn default() -> Self {
        Self { min_score: 0.5 }
    }
}

/// Assigns detections to left/right slots
#[derive(Debug, Clone, Default)]
pub struct HandShaper {
    config: HandShaperConfig,
}

impl HandShaper {
    pub fn new(config: HandShaperConfig) -> Self {
        Self { config }
    }

    /// Shape one frame's detections. When two detections claim the same
    /// hand the higher score wins; malformed or low-score detections
    /// leave that hand untracked.
    pub fn shape(&self, detections: &[HandDetection]) -> HandPair {
        let mut best: [Option<(f32, HandSignal)>; 2] = [None, None];

        for det in detections {
            if !det.score.is_finite() || det.score < self.config.min_score {
                continue;
            }
            let Ok(signal) = HandSignal::from_landmarks(&det.landmarks) else {
                continue;
            };
            let slot = &mut best[det.handedness as usize];
            if slot.as_ref().map_or(true, |(score, _)| det.score > *score) {
                *slot = Some((det.score, signal));
            }
        }

        let [left, right] = best.map(|b| b.map(|(_, s)| s).unwrap_or_default());
        HandPair { left, right }
    }
}
