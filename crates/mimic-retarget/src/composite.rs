//! Composite avatars
//!
//! A composite avatar is a set of user-arranged parts. Each part carries
//! an explicit role chosen when it is created; the role alone decides
//! which channel animates it.

use mimic_core::{lerp, unit, EulerAngles, Vec3};
use mimic_fusion::AnimationState;
use serde::{Deserialize, Serialize};

/// Which animation channel applies to a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartRole {
    /// Follows head rotation
    Head,
    /// Breathes and sways
    Body,
    /// Scales with mouth openness
    Mouth,
    /// Static decoration
    #[default]
    Other,
}

/// Stored description of one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub id: String,
    #[serde(default)]
    pub role: PartRole,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

impl PartSpec {
    pub fn new(id: impl Into<String>, role: PartRole) -> Self {
        Self {
            id: id.into(),
            role,
            scale: unit_scale(),
        }
    }
}

/// One animated part
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePart {
    pub spec: PartSpec,
    /// Current rotation
    pub rotation: EulerAngles,
    /// Current scale
    pub scale: Vec3,
}

impl CompositePart {
    pub fn new(spec: PartSpec) -> Self {
        let scale = spec.scale;
        Self {
            spec,
            rotation: EulerAngles::ZERO,
            scale,
        }
    }

    pub fn role(&self) -> PartRole {
        self.spec.role
    }
}

/// Mouth Y-scale when closed, as a fraction of the base scale
const MOUTH_CLOSED_SCALE: f32 = 0.2;

/// A composite avatar
#[derive(Debug, Clone, Default)]
pub struct CompositeAvatar {
    parts: Vec<CompositePart>,
}

impl CompositeAvatar {
    pub fn new(specs: impl IntoIterator<Item = PartSpec>) -> Self {
        Self {
            parts: specs.into_iter().map(CompositePart::new).collect(),
        }
    }

    pub fn parts(&self) -> &[CompositePart] {
        &self.parts
    }

    pub fn part(&self, id: &str) -> Option<&CompositePart> {
        self.parts.iter().find(|p| p.spec.id == id)
    }

    pub fn add_part(&mut self, spec: PartSpec) {
        self.parts.push(CompositePart::new(spec));
    }

    /// Apply one frame of fused state by role
    pub fn apply(&mut self, state: &AnimationState) {
        let head = state.head_rotation.sanitized();
        let mouth = lerp(MOUTH_CLOSED_SCALE, 1.0, unit(state.mouth_open));

        for part in &mut self.parts {
            let base = part.spec.scale;
            match part.spec.role {
                PartRole::Head => part.rotation = head,
                PartRole::Body => {
                    part.scale = base * state.breath_scale;
                    part.rotation = EulerAngles::new(0.0, 0.0, state.body_sway);
                }
                PartRole::Mouth => {
                    part.scale = Vec3::new(base.x, base.y * mouth, base.z);
                }
                PartRole::Other => {}
            }
        }
    }
}
