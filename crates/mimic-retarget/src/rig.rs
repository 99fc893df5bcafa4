//! Humanoid rig handle
//!
//! The renderer owns the actual skeleton. Retargeting only needs two
//! capabilities: set a named expression weight and set a bone's local
//! rotation. Both report whether the target exists; a missing channel is
//! an expected condition (imported rigs often omit visemes), not an error.

use std::collections::{HashMap, HashSet};

use mimic_core::{Expression, Quat};
use mimic_signal::{Finger, Handedness, Viseme};

/// Named expression channel on a humanoid rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionChannel {
    BlinkLeft,
    BlinkRight,
    Aa,
    Ih,
    Ou,
    Ee,
    Oh,
    Happy,
    Sad,
    Angry,
    Surprised,
    Relaxed,
    Neutral,
}

impl ExpressionChannel {
    pub const ALL: [ExpressionChannel; 13] = [
        ExpressionChannel::BlinkLeft,
        ExpressionChannel::BlinkRight,
        ExpressionChannel::Aa,
        ExpressionChannel::Ih,
        ExpressionChannel::Ou,
        ExpressionChannel::Ee,
        ExpressionChannel::Oh,
        ExpressionChannel::Happy,
        ExpressionChannel::Sad,
        ExpressionChannel::Angry,
        ExpressionChannel::Surprised,
        ExpressionChannel::Relaxed,
        ExpressionChannel::Neutral,
    ];

    /// Preset name as stored in the rig
    pub fn name(&self) -> &'static str {
        match self {
            ExpressionChannel::BlinkLeft => "blinkLeft",
            ExpressionChannel::BlinkRight => "blinkRight",
            ExpressionChannel::Aa => "aa",
            ExpressionChannel::Ih => "ih",
            ExpressionChannel::Ou => "ou",
            ExpressionChannel::Ee => "ee",
            ExpressionChannel::Oh => "oh",
            ExpressionChannel::Happy => "happy",
            ExpressionChannel::Sad => "sad",
            ExpressionChannel::Angry => "angry",
            ExpressionChannel::Surprised => "surprised",
            ExpressionChannel::Relaxed => "relaxed",
            ExpressionChannel::Neutral => "neutral",
        }
    }

    pub fn from_name(name: &str) -> Option<ExpressionChannel> {
        ExpressionChannel::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn from_viseme(viseme: Viseme) -> ExpressionChannel {
        match viseme {
            Viseme::Aa => ExpressionChannel::Aa,
            Viseme::Ih => ExpressionChannel::Ih,
            Viseme::Ou => ExpressionChannel::Ou,
            Viseme::Ee => ExpressionChannel::Ee,
            Viseme::Oh => ExpressionChannel::Oh,
        }
    }

    pub fn from_expression(expression: Expression) -> ExpressionChannel {
        match expression {
            Expression::Neutral => ExpressionChannel::Neutral,
            Expression::Happy => ExpressionChannel::Happy,
            Expression::Sad => ExpressionChannel::Sad,
            Expression::Angry => ExpressionChannel::Angry,
            Expression::Surprised => ExpressionChannel::Surprised,
            Expression::Relaxed => ExpressionChannel::Relaxed,
        }
    }
}

/// Which joint of a finger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerJoint {
    Proximal,
    Intermediate,
}

/// Humanoid bones the bridge writes. Sides are the avatar's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HumanoidBone {
    Spine,
    Chest,
    Neck,
    Head,
    UpperArm(Handedness),
    LowerArm(Handedness),
    Hand(Handedness),
    Finger(Handedness, Finger, FingerJoint),
}

/// Actuation surface of a rigged avatar
pub trait HumanoidRig {
    /// Set an expression weight; false if the rig lacks the channel
    fn set_expression(&mut self, channel: ExpressionChannel, weight: f32) -> bool;

    /// Set a bone's local rotation directly (no IK); false if absent
    fn set_bone_rotation(&mut self, bone: HumanoidBone, rotation: Quat) -> bool;

    /// Uniform chest scale for breathing; most rigs ignore it
    fn set_body_scale(&mut self, _scale: f32) -> bool {
        false
    }
}

impl<R: HumanoidRig + ?Sized> HumanoidRig for Box<R> {
    fn set_expression(&mut self, channel: ExpressionChannel, weight: f32) -> bool {
        (**self).set_expression(channel, weight)
    }

    fn set_bone_rotation(&mut self, bone: HumanoidBone, rotation: Quat) -> bool {
        (**self).set_bone_rotation(bone, rotation)
    }

    fn set_body_scale(&mut self, scale: f32) -> bool {
        (**self).set_body_scale(scale)
    }
}

/// In-memory rig that records every write (headless use and tests)
#[derive(Debug, Clone, Default)]
pub struct RecordingRig {
    expressions: HashMap<ExpressionChannel, f32>,
    bones: HashMap<HumanoidBone, Quat>,
    body_scale: Option<f32>,
    /// Channels this rig does not have
    missing: HashSet<ExpressionChannel>,
    /// Number of accepted writes
    writes: u64,
}

impl RecordingRig {
    /// Rig with every expression channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Rig that lacks the given channels
    pub fn without_channels<I>(channels: I) -> Self
    where
        I: IntoIterator<Item = ExpressionChannel>,
    {
        Self {
            missing: channels.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn expression(&self, channel: ExpressionChannel) -> Option<f32> {
        self.expressions.get(&channel).copied()
    }

    pub fn bone(&self, bone: HumanoidBone) -> Option<Quat> {
        self.bones.get(&bone).copied()
    }

    pub fn body_scale(&self) -> Option<f32> {
        self.body_scale
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl HumanoidRig for RecordingRig {
    fn set_expression(&mut self, channel: ExpressionChannel, weight: f32) -> bool {
        if self.missing.contains(&channel) {
            return false;
        }
        self.expressions.insert(channel, weight);
        self.writes += 1;
        true
    }

    fn set_bone_rotation(&mut self, bone: HumanoidBone, rotation: Quat) -> bool {
        self.bones.insert(bone, rotation);
        self.writes += 1;
        true
    }

    fn set_body_scale(&mut self, scale: f32) -> bool {
        self.body_scale = Some(scale);
        self.writes += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names_roundtrip() {
        for channel in ExpressionChannel::ALL {
            assert_eq!(ExpressionChannel::from_name(channel.name()), Some(channel));
        }
        assert_eq!(ExpressionChannel::from_name("blink_l"), None);
    }

    #[test]
    fn test_missing_channel_rejected() {
        let mut rig = RecordingRig::without_channels([ExpressionChannel::Ou]);
        assert!(!rig.set_expression(ExpressionChannel::Ou, 0.5));
        assert!(rig.set_expression(ExpressionChannel::Aa, 0.5));
        assert_eq!(rig.expression(ExpressionChannel::Ou), None);
        assert_eq!(rig.writes(), 1);
    }

    #[test]
    fn test_boxed_rig_forwards() {
        let mut rig: Box<dyn HumanoidRig> = Box::new(RecordingRig::new());
        assert!(rig.set_bone_rotation(HumanoidBone::Head, Quat::identity()));
        assert!(rig.set_body_scale(1.1));
    }
}
