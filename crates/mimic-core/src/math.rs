//! Vector and rotation math
//!
//! Small, dependency-free types sized for per-frame animation work.
//! Rotations use the renderer's convention: Y up, Euler order XYZ
//! (pitch about X, yaw about Y, roll about Z), all angles in radians.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::finite_or;

/// Below this length a direction vector is considered degenerate
pub const DEGENERATE_LENGTH: f32 = 1e-6;

/// 3D position or direction (normalized landmark space or world units)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector, or None when the vector is too short to have a direction
    pub fn normalized(&self) -> Option<Vec3> {
        let len = self.length();
        if !len.is_finite() || len < DEGENERATE_LENGTH {
            return None;
        }
        Some(*self * (1.0 / len))
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Distance to another position
    pub fn distance(&self, other: &Vec3) -> f32 {
        (*self - *other).length()
    }

    /// Angle between two directions in [0, π].
    ///
    /// Degenerate inputs yield 0 rather than NaN; the cosine is clamped
    /// to [-1, 1] before `acos` so rounding never leaves the domain.
    pub fn angle_to(&self, other: &Vec3) -> f32 {
        match (self.normalized(), other.normalized()) {
            (Some(a), Some(b)) => a.dot(&b).clamp(-1.0, 1.0).acos(),
            _ => 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Head/bone rotation as Euler angles (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Nod, about X (positive = look down)
    pub pitch: f32,
    /// Turn, about Y
    pub yaw: f32,
    /// Tilt, about Z
    pub roll: f32,
}

impl EulerAngles {
    pub const ZERO: EulerAngles = EulerAngles { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn lerp(&self, other: &EulerAngles, t: f32) -> EulerAngles {
        EulerAngles {
            pitch: self.pitch + (other.pitch - self.pitch) * t,
            yaw: self.yaw + (other.yaw - self.yaw) * t,
            roll: self.roll + (other.roll - self.roll) * t,
        }
    }

    pub fn scale(&self, s: f32) -> EulerAngles {
        EulerAngles::new(self.pitch * s, self.yaw * s, self.roll * s)
    }

    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }

    /// Replace non-finite components with zero
    pub fn sanitized(&self) -> EulerAngles {
        let fix = |v: f32| if v.is_finite() { v } else { 0.0 };
        EulerAngles::new(fix(self.pitch), fix(self.yaw), fix(self.roll))
    }

    /// Clamp each axis to ±limit. Negative limits act as their magnitude,
    /// non-finite ones as zero.
    pub fn clamp_to(&self, limits: &RotationLimits) -> EulerAngles {
        let limits = limits.sanitized();
        EulerAngles {
            pitch: self.pitch.clamp(-limits.pitch, limits.pitch),
            yaw: self.yaw.clamp(-limits.yaw, limits.yaw),
            roll: self.roll.clamp(-limits.roll, limits.roll),
        }
    }

    /// Mirror across the vertical screen axis (yaw and roll flip)
    pub fn mirrored(&self) -> EulerAngles {
        EulerAngles::new(self.pitch, -self.yaw, -self.roll)
    }

    /// Extract XYZ-order angles from a 3×3 rotation matrix (row-major)
    pub fn from_rotation_matrix(m: &[[f32; 3]; 3]) -> EulerAngles {
        let m13 = m[0][2].clamp(-1.0, 1.0);
        let yaw = m13.asin();
        let (pitch, roll) = if m13.abs() < 0.999_999 {
            ((-m[1][2]).atan2(m[2][2]), (-m[0][1]).atan2(m[0][0]))
        } else {
            // Gimbal lock: roll folds into pitch
            (m[2][1].atan2(m[1][1]), 0.0)
        };
        EulerAngles { pitch, yaw, roll }.sanitized()
    }
}

impl Add for EulerAngles {
    type Output = EulerAngles;

    fn add(self, rhs: EulerAngles) -> EulerAngles {
        EulerAngles::new(self.pitch + rhs.pitch, self.yaw + rhs.yaw, self.roll + rhs.roll)
    }
}

impl Sub for EulerAngles {
    type Output = EulerAngles;

    fn sub(self, rhs: EulerAngles) -> EulerAngles {
        EulerAngles::new(self.pitch - rhs.pitch, self.yaw - rhs.yaw, self.roll - rhs.roll)
    }
}

/// Physically sane rotation range per axis (radians, symmetric)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationLimits {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl RotationLimits {
    /// Comfortable human neck range
    pub fn head() -> Self {
        Self { pitch: 0.9, yaw: 1.3, roll: 0.7 }
    }

    /// Every limit finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.pitch, self.yaw, self.roll].iter().all(|l| l.is_finite() && *l >= 0.0)
    }

    pub fn sanitized(&self) -> Self {
        Self {
            pitch: finite_or(self.pitch.abs(), 0.0),
            yaw: finite_or(self.yaw.abs(), 0.0),
            roll: finite_or(self.roll.abs(), 0.0),
        }
    }
}

impl Default for RotationLimits {
    fn default() -> Self {
        Self::head()
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    pub fn identity() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Build from XYZ-order Euler angles
    pub fn from_euler(e: &EulerAngles) -> Self {
        let (s1, c1) = (e.pitch * 0.5).sin_cos();
        let (s2, c2) = (e.yaw * 0.5).sin_cos();
        let (s3, c3) = (e.roll * 0.5).sin_cos();

        Self {
            x: s1 * c2 * c3 + c1 * s2 * s3,
            y: c1 * s2 * c3 - s1 * c2 * s3,
            z: c1 * c2 * s3 + s1 * s2 * c3,
            w: c1 * c2 * c3 - s1 * s2 * s3,
        }
    }

    /// Build from a 3×3 rotation matrix (row-major, orthonormal)
    pub fn from_rotation_matrix(m: &[[f32; 3]; 3]) -> Self {
        let trace = m[0][0] + m[1][1] + m[2][2];

        let q = if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Quat {
                w: 0.25 / s,
                x: (m[2][1] - m[1][2]) * s,
                y: (m[0][2] - m[2][0]) * s,
                z: (m[1][0] - m[0][1]) * s,
            }
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = 2.0 * (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt();
            Quat {
                w: (m[2][1] - m[1][2]) / s,
                x: 0.25 * s,
                y: (m[0][1] + m[1][0]) / s,
                z: (m[0][2] + m[2][0]) / s,
            }
        } else if m[1][1] > m[2][2] {
            let s = 2.0 * (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt();
            Quat {
                w: (m[0][2] - m[2][0]) / s,
                x: (m[0][1] + m[1][0]) / s,
                y: 0.25 * s,
                z: (m[1][2] + m[2][1]) / s,
            }
        } else {
            let s = 2.0 * (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt();
            Quat {
                w: (m[1][0] - m[0][1]) / s,
                x: (m[0][2] + m[2][0]) / s,
                y: (m[1][2] + m[2][1]) / s,
                z: 0.25 * s,
            }
        };

        q.normalize()
    }

    /// Row-major rotation matrix
    pub fn to_rotation_matrix(&self) -> [[f32; 3]; 3] {
        let Quat { w, x, y, z } = self.normalize();
        [
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - z * w), 2.0 * (x * z + y * w)],
            [2.0 * (x * y + z * w), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - x * w)],
            [2.0 * (x * z - y * w), 2.0 * (y * z + x * w), 1.0 - 2.0 * (x * x + y * y)],
        ]
    }

    pub fn to_euler(&self) -> EulerAngles {
        EulerAngles::from_rotation_matrix(&self.to_rotation_matrix())
    }

    /// Spherical linear interpolation
    pub fn slerp(&self, other: &Quat, t: f32) -> Quat {
        let mut dot = self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z;

        let other = if dot < 0.0 {
            dot = -dot;
            Quat { w: -other.w, x: -other.x, y: -other.y, z: -other.z }
        } else {
            *other
        };

        if dot > 0.9995 {
            // Linear interpolation for very close quaternions
            let result = Quat {
                w: self.w + (other.w - self.w) * t,
                x: self.x + (other.x - self.x) * t,
                y: self.y + (other.y - self.y) * t,
                z: self.z + (other.z - self.z) * t,
            };
            return result.normalize();
        }

        let theta_0 = dot.clamp(-1.0, 1.0).acos();
        let theta = theta_0 * t;
        let sin_theta = theta.sin();
        let sin_theta_0 = theta_0.sin();

        let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Quat {
            w: self.w * s0 + other.w * s1,
            x: self.x * s0 + other.x * s1,
            y: self.y * s0 + other.y * s1,
            z: self.z * s0 + other.z * s1,
        }
    }

    pub fn normalize(&self) -> Quat {
        let len = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if !len.is_finite() || len < 0.0001 {
            return Quat::identity();
        }
        Quat { w: self.w / len, x: self.x / len, y: self.y / len, z: self.z / len }
    }
}
