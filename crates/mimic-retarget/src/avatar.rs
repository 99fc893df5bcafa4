//! Avatar variants and factory
//!
//! Every avatar kind implements the same two capabilities: apply a fused
//! pose and apply a hand pose. The stored kind tag picks the
//! implementation; rigged kinds need a rig handle from the renderer.

use std::fmt;
use std::str::FromStr;

use mimic_core::{MimicError, MimicResult};
use mimic_fusion::AnimationState;
use mimic_signal::HandPair;
use serde::{Deserialize, Serialize};

use crate::{
    ArmConfig, ArmDriver, ArmPoses, CompositeAvatar, HumanoidRetargeter, HumanoidRig, PartSpec,
    PrimitiveAvatar, PrimitiveShape, RetargetConfig,
};

/// Stored avatar type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarKind {
    /// VRM humanoid
    Vrm,
    /// Generic rigged glTF model
    #[serde(alias = "glb", alias = "gltf")]
    Model,
    Sphere,
    Cube,
    Robot,
    Cat,
    Composite,
}

impl AvatarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarKind::Vrm => "vrm",
            AvatarKind::Model => "model",
            AvatarKind::Sphere => "sphere",
            AvatarKind::Cube => "cube",
            AvatarKind::Robot => "robot",
            AvatarKind::Cat => "cat",
            AvatarKind::Composite => "composite",
        }
    }

    /// Does this kind drive a skeleton?
    pub fn needs_rig(&self) -> bool {
        matches!(self, AvatarKind::Vrm | AvatarKind::Model)
    }

    /// Hand mirroring when the profile does not say.
    /// VRM avatars mirror; everything else maps hands straight through.
    pub fn default_mirror(&self) -> bool {
        matches!(self, AvatarKind::Vrm)
    }

    pub fn primitive_shape(&self) -> Option<PrimitiveShape> {
        match self {
            AvatarKind::Sphere => Some(PrimitiveShape::Sphere),
            AvatarKind::Cube => Some(PrimitiveShape::Cube),
            AvatarKind::Robot => Some(PrimitiveShape::Robot),
            AvatarKind::Cat => Some(PrimitiveShape::Cat),
            _ => None,
        }
    }
}

impl fmt::Display for AvatarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarKind {
    type Err = MimicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vrm" => Ok(AvatarKind::Vrm),
            "model" | "glb" | "gltf" => Ok(AvatarKind::Model),
            "sphere" => Ok(AvatarKind::Sphere),
            "cube" => Ok(AvatarKind::Cube),
            "robot" => Ok(AvatarKind::Robot),
            "cat" => Ok(AvatarKind::Cat),
            "composite" => Ok(AvatarKind::Composite),
            other => Err(MimicError::UnknownAvatarKind(other.to_string())),
        }
    }
}

/// Everything needed to build an avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarProfile {
    pub kind: AvatarKind,
    /// Cross-wire hands to arms; None uses the kind's default
    #[serde(default)]
    pub mirror_hands: Option<bool>,
    /// Parts for composite avatars
    #[serde(default)]
    pub parts: Vec<PartSpec>,
    #[serde(default)]
    pub arms: ArmConfig,
    #[serde(default)]
    pub retarget: RetargetConfig,
}

impl AvatarProfile {
    pub fn new(kind: AvatarKind) -> Self {
        Self {
            kind,
            mirror_hands: None,
            parts: Vec::new(),
            arms: ArmConfig::default(),
            retarget: RetargetConfig::default(),
        }
    }

    pub fn mirror_hands(&self) -> bool {
        self.mirror_hands.unwrap_or_else(|| self.kind.default_mirror())
    }
}

/// Common avatar capabilities
pub trait Avatar: Send {
    fn kind(&self) -> AvatarKind;

    /// Apply one frame of fused state
    fn apply_pose(&mut self, state: &AnimationState);

    /// Apply hand tracking (no-op for avatars without arms)
    fn apply_hand_pose(&mut self, hands: &HandPair);

    /// Are hands cross-wired to the opposite arm?
    fn mirror_hands(&self) -> bool {
        false
    }
}

/// Skeleton-driven avatar
pub struct RiggedAvatar<R> {
    kind: AvatarKind,
    rig: R,
    retargeter: HumanoidRetargeter,
    arms: ArmDriver,
    /// Leave viseme channels to another caller
    ignore_mouth: bool,
    /// Frame time of the last pose (seconds)
    secs: f32,
}

impl<R: HumanoidRig> RiggedAvatar<R> {
    pub fn new(kind: AvatarKind, rig: R, retargeter: HumanoidRetargeter, arms: ArmDriver) -> Self {
        Self {
            kind,
            rig,
            retargeter,
            arms,
            ignore_mouth: false,
            secs: 0.0,
        }
    }

    pub fn rig(&self) -> &R {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut R {
        &mut self.rig
    }

    pub fn set_ignore_mouth(&mut self, ignore: bool) {
        self.ignore_mouth = ignore;
    }

    /// Arm poses for the given hands at the last pose time
    pub fn arm_poses(&self, hands: &HandPair) -> ArmPoses {
        self.arms.drive(hands, self.secs)
    }
}

impl<R: HumanoidRig + Send> Avatar for RiggedAvatar<R> {
    fn kind(&self) -> AvatarKind {
        self.kind
    }

    fn apply_pose(&mut self, state: &AnimationState) {
        self.secs = state.time.as_secs_f32();
        self.retargeter.retarget(state, &mut self.rig, self.ignore_mouth);
    }

    fn apply_hand_pose(&mut self, hands: &HandPair) {
        let poses = self.arms.drive(hands, self.secs);
        self.arms.apply_to_rig(&poses, &mut self.rig);
    }

    fn mirror_hands(&self) -> bool {
        self.arms.mirror()
    }
}

impl Avatar for PrimitiveAvatar {
    fn kind(&self) -> AvatarKind {
        match self.shape() {
            PrimitiveShape::Sphere => AvatarKind::Sphere,
            PrimitiveShape::Cube => AvatarKind::Cube,
            PrimitiveShape::Robot => AvatarKind::Robot,
            PrimitiveShape::Cat => AvatarKind::Cat,
        }
    }

    fn apply_pose(&mut self, state: &AnimationState) {
        self.apply(state);
    }

    fn apply_hand_pose(&mut self, _hands: &HandPair) {}
}

impl Avatar for CompositeAvatar {
    fn kind(&self) -> AvatarKind {
        AvatarKind::Composite
    }

    fn apply_pose(&mut self, state: &AnimationState) {
        self.apply(state);
    }

    fn apply_hand_pose(&mut self, _hands: &HandPair) {}
}

/// Boxed rig handle supplied by the renderer
pub type RigHandle = Box<dyn HumanoidRig + Send>;

/// Build the avatar a profile describes
pub fn create_avatar(
    profile: &AvatarProfile,
    rig: Option<RigHandle>,
) -> MimicResult<Box<dyn Avatar>> {
    let kind = profile.kind;

    if kind.needs_rig() {
        let rig = rig.ok_or_else(|| MimicError::MissingRig(kind.to_string()))?;
        let arms = ArmDriver::new(profile.arms.clone(), profile.mirror_hands());
        let retargeter = HumanoidRetargeter::new(profile.retarget.clone());
        tracing::debug!(%kind, mirror = arms.mirror(), "created rigged avatar");
        return Ok(Box::new(RiggedAvatar::new(kind, rig, retargeter, arms)));
    }

    if profile.mirror_hands == Some(true) {
        tracing::debug!(%kind, "avatar has no arms, mirror flag ignored");
    }

    if let Some(shape) = kind.primitive_shape() {
        tracing::debug!(%kind, "created primitive avatar");
        return Ok(Box::new(PrimitiveAvatar::new(shape)));
    }

    tracing::debug!(parts = profile.parts.len(), "created composite avatar");
    Ok(Box::new(CompositeAvatar::new(profile.parts.iter().cloned())))
}

/// Build from a stored kind tag with default settings
pub fn create_avatar_from_tag(tag: &str, rig: Option<RigHandle>) -> MimicResult<Box<dyn Avatar>> {
    let kind: AvatarKind = tag.parse()?;
    create_avatar(&AvatarProfile::new(kind), rig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExpressionChannel, HumanoidBone, PartRole, RecordingRig};
    use mimic_signal::Handedness;

    #[test]
    fn test_factory_selects_kind() {
        for tag in ["sphere", "cube", "robot", "cat", "composite"] {
            let avatar = create_avatar_from_tag(tag, None).unwrap();
            assert_eq!(avatar.kind().as_str(), tag);
        }
        let avatar = create_avatar_from_tag("glb", Some(Box::new(RecordingRig::new()))).unwrap();
        assert_eq!(avatar.kind(), AvatarKind::Model);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = create_avatar_from_tag("hologram", None).err().unwrap();
        assert!(matches!(err, MimicError::UnknownAvatarKind(_)));
    }

    #[test]
    fn test_rigged_kind_needs_rig() {
        let err = create_avatar(&AvatarProfile::new(AvatarKind::Vrm), None).err().unwrap();
        assert!(matches!(err, MimicError::MissingRig(_)));
    }

    #[test]
    fn test_mirror_defaults_per_kind() {
        let rig = || -> Option<RigHandle> { Some(Box::new(RecordingRig::new())) };
        let vrm = create_avatar(&AvatarProfile::new(AvatarKind::Vrm), rig()).unwrap();
        assert!(vrm.mirror_hands());

        let model = create_avatar(&AvatarProfile::new(AvatarKind::Model), rig()).unwrap();
        assert!(!model.mirror_hands());

        let mut profile = AvatarProfile::new(AvatarKind::Vrm);
        profile.mirror_hands = Some(false);
        assert!(!profile.mirror_hands());
    }

    #[test]
    fn test_rigged_avatar_applies_pose_and_hands() {
        let mut avatar = RiggedAvatar::new(
            AvatarKind::Vrm,
            RecordingRig::new(),
            HumanoidRetargeter::default(),
            ArmDriver::new(ArmConfig::default(), true),
        );
        avatar.apply_pose(&AnimationState { blink_left: 1.0, ..AnimationState::default() });
        avatar.apply_hand_pose(&HandPair::default());

        assert_eq!(avatar.rig().expression(ExpressionChannel::BlinkLeft), Some(1.0));
        assert!(avatar.rig().bone(HumanoidBone::Head).is_some());
        assert!(avatar.rig().bone(HumanoidBone::UpperArm(Handedness::Right)).is_some());
    }

    #[test]
    fn test_profile_from_json() {
        let profile: AvatarProfile = serde_json::from_str(
            r#"{"kind": "composite", "parts": [{"id": "h", "role": "head"}]}"#,
        )
        .unwrap();
        assert_eq!(profile.kind, AvatarKind::Composite);
        assert_eq!(profile.parts[0].role, PartRole::Head);
        assert!(!profile.mirror_hands());
    }
}
