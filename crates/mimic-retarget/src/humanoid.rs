//! Humanoid retargeting
//!
//! Maps an AnimationState onto a rig's named expression channels and head
//! bone. Rotation axes are damped independently: yaw passes through
//! almost untouched, roll is damped the most.

use mimic_core::{unit, EulerAngles, Expression, Quat};
use mimic_fusion::{AnimationState, MouthSource};
use mimic_signal::Viseme;
use serde::{Deserialize, Serialize};

use crate::{ExpressionChannel, HumanoidBone, HumanoidRig};

/// Fraction of each head axis passed to the rig (1.0 = undamped)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadDamping {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Default for HeadDamping {
    fn default() -> Self {
        Self { pitch: 0.8, yaw: 0.9, roll: 0.6 }
    }
}

impl HeadDamping {
    pub fn apply(&self, rotation: &EulerAngles) -> EulerAngles {
        EulerAngles::new(
            rotation.pitch * self.pitch,
            rotation.yaw * self.yaw,
            rotation.roll * self.roll,
        )
    }
}

/// Retargeting configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    pub head_damping: HeadDamping,
}

/// What one retarget pass wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetargetReport {
    /// Expression channels written
    pub written: usize,
    /// Expression channels the rig lacks
    pub skipped: usize,
    /// Was the head bone written?
    pub head: bool,
}

/// Drives a humanoid rig from fused state
#[derive(Debug, Clone, Default)]
pub struct HumanoidRetargeter {
    config: RetargetConfig,
}

impl HumanoidRetargeter {
    pub fn new(config: RetargetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetargetConfig {
        &self.config
    }

    /// Apply one frame. With `ignore_mouth` the viseme channels are left
    /// alone so another caller can own them.
    pub fn retarget<R>(
        &self,
        state: &AnimationState,
        rig: &mut R,
        ignore_mouth: bool,
    ) -> RetargetReport
    where
        R: HumanoidRig + ?Sized,
    {
        let mut report = RetargetReport::default();
        write_channel(rig, &mut report, ExpressionChannel::BlinkLeft, state.blink_left);
        write_channel(rig, &mut report, ExpressionChannel::BlinkRight, state.blink_right);

        if !ignore_mouth {
            for viseme in Viseme::ALL {
                let channel = ExpressionChannel::from_viseme(viseme);
                write_channel(rig, &mut report, channel, mouth_weight(state, viseme));
            }
        }

        for expression in Expression::all().iter().filter(|e| !e.is_neutral()) {
            let weight = if *expression == state.expression {
                state.expression_weight
            } else {
                0.0
            };
            let channel = ExpressionChannel::from_expression(*expression);
            write_channel(rig, &mut report, channel, weight);
        }

        let head = self.config.head_damping.apply(&state.head_rotation).sanitized();
        report.head = rig.set_bone_rotation(HumanoidBone::Head, Quat::from_euler(&head));
        rig.set_body_scale(state.breath_scale);

        report
    }
}

fn write_channel<R>(
    rig: &mut R,
    report: &mut RetargetReport,
    channel: ExpressionChannel,
    weight: f32,
) where
    R: HumanoidRig + ?Sized,
{
    if rig.set_expression(channel, unit(weight)) {
        report.written += 1;
    } else {
        tracing::trace!(channel = channel.name(), "rig lacks expression channel, skipped");
        report.skipped += 1;
    }
}

/// Weight for one viseme channel: lip-sync weights when visemes drive the
/// mouth, otherwise openness goes to "aa"
fn mouth_weight(state: &AnimationState, viseme: Viseme) -> f32 {
    match state.mouth_source {
        MouthSource::Viseme => state.visemes.get(viseme),
        _ if viseme == Viseme::Aa => state.mouth_open,
        _ => 0.0,
    }
}
