//! Hand-to-Arm Mapping
//!
//! A tracked hand fully overrides procedural sway for its arm; an
//! untracked hand gets sway back immediately, with no ramp. Finger curls
//! come straight from the hand landmarks.
//!
//! With `mirror` set, the avatar's left arm follows the user's detected
//! right hand (and the other way round), like looking in a mirror.

use std::f32::consts::{FRAC_PI_2, TAU};

use mimic_core::{EulerAngles, Quat};
use mimic_signal::{Finger, FingerCurls, HandPair, HandSignal, Handedness, CURL_GAIN};
use serde::{Deserialize, Serialize};

use crate::{FingerJoint, HumanoidBone, HumanoidRig};

/// Arm mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Upper arm roll with the arm hanging at rest (radians)
    pub rest_roll: f32,
    /// Roll swept as the wrist moves from bottom to top of frame
    pub raise_range: f32,
    /// Forearm yaw at the horizontal frame edge
    pub reach_yaw: f32,
    /// Procedural sway amplitude (radians)
    pub sway_amplitude: f32,
    /// Procedural sway frequency (Hz)
    pub sway_hz: f32,
    /// Multiplier on raw finger bend angles
    pub curl_gain: f32,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            rest_roll: 1.2,
            raise_range: 2.0,
            reach_yaw: 0.8,
            sway_amplitude: 0.06,
            sway_hz: 0.35,
            curl_gain: CURL_GAIN,
        }
    }
}

/// Pose for one avatar arm
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArmPose {
    /// Driven by a tracked hand (false = procedural sway)
    pub tracked: bool,
    pub upper_arm: EulerAngles,
    pub lower_arm: EulerAngles,
    pub curls: FingerCurls,
}

/// Both avatar arms, by the avatar's own side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArmPoses {
    pub left: ArmPose,
    pub right: ArmPose,
}

impl ArmPoses {
    pub fn get(&self, side: Handedness) -> &ArmPose {
        match side {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }
}

/// Maps hand signals onto avatar arms
#[derive(Debug, Clone)]
pub struct ArmDriver {
    config: ArmConfig,
    mirror: bool,
}

impl ArmDriver {
    pub fn new(config: ArmConfig, mirror: bool) -> Self {
        Self { config, mirror }
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.mirror = mirror;
    }

    /// Which detected hand drives the given avatar side
    pub fn source_for(&self, side: Handedness) -> Handedness {
        if self.mirror {
            side.opposite()
        } else {
            side
        }
    }

    /// Compute both arm poses at local time `secs`
    pub fn drive(&self, hands: &HandPair, secs: f32) -> ArmPoses {
        let pose = |side: Handedness| {
            let hand = hands.get(self.source_for(side));
            if hand.tracked {
                self.tracked_pose(side, hand)
            } else {
                self.sway_pose(side, secs)
            }
        };
        ArmPoses {
            left: pose(Handedness::Left),
            right: pose(Handedness::Right),
        }
    }

    fn tracked_pose(&self, side: Handedness, hand: &HandSignal) -> ArmPose {
        let cfg = &self.config;
        let sign = side_sign(side);
        let wrist = hand.wrist();

        // Normalized screen position, centre = 0
        let mut dx = ((wrist.x - 0.5) * 2.0).clamp(-1.0, 1.0);
        if self.mirror {
            dx = -dx;
        }
        let raise = (1.0 - wrist.y).clamp(0.0, 1.0);

        ArmPose {
            tracked: true,
            upper_arm: EulerAngles::new(0.0, 0.0, sign * (cfg.rest_roll - raise * cfg.raise_range)),
            lower_arm: EulerAngles::new(0.0, sign * dx * cfg.reach_yaw, 0.0),
            curls: hand.finger_curls(cfg.curl_gain),
        }
    }

    fn sway_pose(&self, side: Handedness, secs: f32) -> ArmPose {
        let cfg = &self.config;
        let sign = side_sign(side);
        let phase = match side {
            Handedness::Left => 0.0,
            Handedness::Right => FRAC_PI_2,
        };
        let sway = (TAU * cfg.sway_hz * secs + phase).sin() * cfg.sway_amplitude;

        ArmPose {
            tracked: false,
            upper_arm: EulerAngles::new(0.0, 0.0, sign * cfg.rest_roll + sway),
            lower_arm: EulerAngles::ZERO,
            curls: FingerCurls::default(),
        }
    }

    /// Write arm and finger bones for both sides
    pub fn apply_to_rig<R>(&self, poses: &ArmPoses, rig: &mut R)
    where
        R: HumanoidRig + ?Sized,
    {
        for side in [Handedness::Left, Handedness::Right] {
            let pose = poses.get(side);
            let sign = side_sign(side);
            rig.set_bone_rotation(HumanoidBone::UpperArm(side), Quat::from_euler(&pose.upper_arm));
            rig.set_bone_rotation(HumanoidBone::LowerArm(side), Quat::from_euler(&pose.lower_arm));

            for finger in Finger::ALL {
                let curl = pose.curls.get(finger);
                for (joint, angle) in [
                    (FingerJoint::Proximal, curl.proximal),
                    (FingerJoint::Intermediate, curl.distal),
                ] {
                    let rotation = Quat::from_euler(&EulerAngles::new(0.0, 0.0, sign * angle));
                    rig.set_bone_rotation(HumanoidBone::Finger(side, finger, joint), rotation);
                }
            }
        }
    }
}

impl Default for ArmDriver {
    fn default() -> Self {
        Self::new(ArmConfig::default(), false)
    }
}

/// Rotation sign so both arms move symmetrically
fn side_sign(side: Handedness) -> f32 {
    match side {
        Handedness::Left => 1.0,
        Handedness::Right => -1.0,
    }
}
