//! Face Signal - Expression and head pose as state
//!
//! The face tracker delivers one detection per processed camera frame.
//! FaceShaper turns it into a FaceSignal: remapped mouth/blink scalars,
//! head rotation and position, and a sparse landmark subset. A frame with
//! no face produces a "not tracked" signal.

use mimic_core::{remap_unit, EulerAngles, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{BlendshapeChannel, Blendshapes};

/// Dense-mesh indices kept in the sparse landmark list:
/// face oval (36), outer lips (20), left eye (16), right eye (16), nose ridge (4)
pub const SPARSE_LANDMARKS: [usize; 92] = [
    // Face oval
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377,
    152, 148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
    // Outer lips
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 409, 270, 269, 267, 0, 37, 39, 40, 185,
    // Left eye
    263, 249, 390, 373, 374, 380, 381, 382, 362, 398, 384, 385, 386, 387, 388, 466,
    // Right eye
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
    // Nose ridge
    1, 4, 5, 195,
];

/// Raw face detector output for one camera frame
#[derive(Debug, Clone)]
pub struct FaceDetection {
    /// (name, score) blendshape pairs as reported by the detector
    pub blendshapes: Vec<(String, f32)>,
    /// 4×4 facial transformation matrix, column-major
    pub transform: [f32; 16],
    /// Dense landmark mesh, normalized screen space
    pub landmarks: Vec<Vec3>,
}

impl FaceDetection {
    /// Upper-left 3×3 rotation block as a row-major matrix
    pub fn rotation_matrix(&self) -> [[f32; 3]; 3] {
        let t = &self.transform;
        [
            [t[0], t[4], t[8]],
            [t[1], t[5], t[9]],
            [t[2], t[6], t[10]],
        ]
    }

    /// Translation column
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.transform[12], self.transform[13], self.transform[14])
    }
}

/// Shaped face signal, produced once per camera frame
#[derive(Debug, Clone, Default)]
pub struct FaceSignal {
    /// Was a face detected in the last processed frame?
    pub tracked: bool,
    /// Head rotation relative to the calibrated neutral pose
    pub head_rotation: EulerAngles,
    /// Normalized head position: x/y in [-1, 1], z = relative depth
    pub head_position: Vec3,
    /// Mouth openness [0.0 - 1.0]
    pub mouth_open: f32,
    /// Left eye blink (0.0 = open, 1.0 = closed)
    pub blink_left: f32,
    /// Right eye blink (0.0 = open, 1.0 = closed)
    pub blink_right: f32,
    /// Full coefficient vector
    pub blendshapes: Blendshapes,
    /// Raw (uncalibrated) head rotation
    pub rotation: Quat,
    /// Sparse landmark subset, normalized screen space
    pub landmarks: Vec<Vec3>,
}

impl FaceSignal {
    /// No face in view
    pub fn not_tracked() -> Self {
        Self::default()
    }
}

/// Face shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceShaperConfig {
    /// jawOpen score treated as fully closed
    pub jaw_floor: f32,
    /// jawOpen score treated as fully open
    pub jaw_ceiling: f32,
    /// eyeBlink score treated as fully open
    pub blink_floor: f32,
    /// eyeBlink score treated as fully closed
    pub blink_ceiling: f32,
    /// Translation units mapped to ±1 on x/y
    pub position_range: f32,
    /// Translation depth of a head at rest (before calibration)
    pub reference_depth: f32,
    /// Depth units mapped to ±1
    pub depth_range: f32,
}

impl Default for FaceShaperConfig {
    fn default() -> Self {
        Self {
            jaw_floor: 0.02,
            jaw_ceiling: 0.6,
            blink_floor: 0.15,
            blink_ceiling: 0.75,
            position_range: 20.0,
            reference_depth: -50.0,
            depth_range: 25.0,
        }
    }
}

/// Shapes raw detections into face signals
#[derive(Debug, Clone, Default)]
pub struct FaceShaper {
    config: FaceShaperConfig,
    /// Neutral rotation captured by calibrate()
    rotation_offset: EulerAngles,
    /// Depth captured by calibrate()
    depth_baseline: Option<f32>,
}

impl FaceShaper {
    pub fn new(config: FaceShaperConfig) -> Self {
        Self {
            config,
            rotation_offset: EulerAngles::ZERO,
            depth_baseline: None,
        }
    }

    /// Treat the given detection as the user's neutral pose
    pub fn calibrate(&mut self, detection: &FaceDetection) {
        self.rotation_offset = EulerAngles::from_rotation_matrix(&detection.rotation_matrix());
        let z = detection.translation().z;
        self.depth_baseline = z.is_finite().then_some(z);
    }

    /// Forget the neutral pose
    pub fn reset_calibration(&mut self) {
        self.rotation_offset = EulerAngles::ZERO;
        self.depth_baseline = None;
    }

    pub fn is_calibrated(&self) -> bool {
        self.depth_baseline.is_some()
    }

    /// Shape one detection; None means no face this frame
    pub fn shape(&self, detection: Option<&FaceDetection>) -> FaceSignal {
        let Some(detection) = detection else {
            return FaceSignal::not_tracked();
        };
        let cfg = &self.config;

        let blendshapes =
            Blendshapes::from_named(detection.blendshapes.iter().map(|(n, s)| (n.as_str(), *s)));

        let matrix = detection.rotation_matrix();
        let head_rotation =
            (EulerAngles::from_rotation_matrix(&matrix) - self.rotation_offset).sanitized();

        FaceSignal {
            tracked: true,
            head_rotation,
            head_position: self.normalize_position(detection.translation()),
            mouth_open: remap_unit(
                blendshapes.get(BlendshapeChannel::JawOpen),
                cfg.jaw_floor,
                cfg.jaw_ceiling,
            ),
            blink_left: remap_unit(
                blendshapes.get(BlendshapeChannel::EyeBlinkLeft),
                cfg.blink_floor,
                cfg.blink_ceiling,
            ),
            blink_right: remap_unit(
                blendshapes.get(BlendshapeChannel::EyeBlinkRight),
                cfg.blink_floor,
                cfg.blink_ceiling,
            ),
            blendshapes,
            rotation: Quat::from_rotation_matrix(&matrix),
            landmarks: sparse_landmarks(&detection.landmarks),
        }
    }

    fn normalize_position(&self, t: Vec3) -> Vec3 {
        let cfg = &self.config;
        let baseline = self.depth_baseline.unwrap_or(cfg.reference_depth);
        let norm = |v: f32, range: f32| {
            if v.is_finite() && range > 0.0 {
                (v / range).clamp(-1.0, 1.0)
            } else {
                0.0
            }
        };
        Vec3::new(
            norm(t.x, cfg.position_range),
            norm(t.y, cfg.position_range),
            norm(t.z - baseline, cfg.depth_range),
        )
    }
}

/// Pick the sparse subset out of a dense mesh, skipping missing or
/// non-finite points
pub fn sparse_landmarks(dense: &[Vec3]) -> Vec<Vec3> {
    SPARSE_LANDMARKS
        .iter()
        .filter_map(|&i| dense.get(i))
        .filter(|p| p.is_finite())
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_transform(z: f32) -> [f32; 16] {
        [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, z, 1.0,
        ]
    }

    fn detection(jaw: f32, blink_l: f32, blink_r: f32) -> FaceDetection {
        FaceDetection {
            blendshapes: vec![
                ("jawOpen".to_string(), jaw),
                ("eyeBlinkLeft".to_string(), blink_l),
                ("eyeBlinkRight".to_string(), blink_r),
            ],
            transform: identity_transform(-50.0),
            landmarks: vec![Vec3::new(0.5, 0.5, 0.0); 478],
        }
    }

    #[test]
    fn test_no_detection_is_not_tracked() {
        let shaper = FaceShaper::default();
        let signal = shaper.shape(None);
        assert!(!signal.tracked);
        assert_eq!(signal.mouth_open, 0.0);
    }

    #[test]
    fn test_shape_remaps_scalars() {
        let shaper = FaceShaper::new(FaceShaperConfig::default());
        let signal = shaper.shape(Some(&detection(0.6, 0.75, 0.15)));

        assert!(signal.tracked);
        assert!((signal.mouth_open - 1.0).abs() < 1e-5);
        assert!((signal.blink_left - 1.0).abs() < 1e-5);
        assert_eq!(signal.blink_right, 0.0);
        assert_eq!(signal.landmarks.len(), SPARSE_LANDMARKS.len());
    }

    #[test]
    fn test_identity_transform_is_neutral_pose() {
        let shaper = FaceShaper::new(FaceShaperConfig::default());
        let signal = shaper.shape(Some(&detection(0.0, 0.0, 0.0)));
        assert!(signal.head_rotation.pitch.abs() < 1e-5);
        assert!(signal.head_rotation.yaw.abs() < 1e-5);
        assert!(signal.head_position.z.abs() < 1e-5);
        assert!((signal.rotation.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_calibration_removes_offset() {
        let rot = Quat::from_euler(&EulerAngles::new(0.1, 0.2, 0.0)).to_rotation_matrix();
        let mut det = detection(0.0, 0.0, 0.0);
        for r in 0..3 {
            for c in 0..3 {
                det.transform[c * 4 + r] = rot[r][c];
            }
        }
        det.transform[14] = -40.0;

        let mut shaper = FaceShaper::default();
        let before = shaper.shape(Some(&det));
        assert!((before.head_rotation.yaw - 0.2).abs() < 1e-4);

        shaper.calibrate(&det);
        assert!(shaper.is_calibrated());
        let after = shaper.shape(Some(&det));
        assert!(after.head_rotation.yaw.abs() < 1e-4);
        assert!(after.head_position.z.abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_transform_is_sanitized() {
        let mut det = detection(0.3, 0.0, 0.0);
        det.transform = [f32::NAN; 16];
        let signal = FaceShaper::default().shape(Some(&det));
        assert!(signal.head_rotation.is_finite());
        assert!(signal.head_position.is_finite());
    }

    #[test]
    fn test_sparse_landmarks_short_mesh() {
        let dense = vec![Vec3::new(0.1, 0.2, 0.0); 20];
        // Only indices < 20 survive: 10, 17, 0, 7, 1, 4, 5
        assert_eq!(sparse_landmarks(&dense).len(), 7);
    }
}
