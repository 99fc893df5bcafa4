//! Expression modifiers
//!
//! A non-neutral expression nudges the continuous channels; it never
//! replaces them.

use std::f32::consts::TAU;

use mimic_core::{EulerAngles, Expression};

/// Offsets one expression applies on top of the fused channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpressionModifier {
    /// Added to head rotation (radians)
    pub head_offset: EulerAngles,
    /// Added to mouth openness while a live source drives the mouth
    pub mouth_bias: f32,
}

impl ExpressionModifier {
    /// Modifier for `expression` at ramp `weight`, animated on `secs`
    pub fn for_expression(expression: Expression, weight: f32, secs: f32) -> Self {
        let (head_offset, mouth_bias) = match expression {
            Expression::Neutral => (EulerAngles::ZERO, 0.0),
            Expression::Happy => (EulerAngles::new(-0.03, 0.0, 0.06), 0.05),
            Expression::Sad => (EulerAngles::new(0.12, 0.0, 0.0), -0.05),
            // Short repeated head-shake
            Expression::Angry => {
                (EulerAngles::new(0.05, (TAU * 2.5 * secs).sin() * 0.04, 0.0), 0.0)
            }
            Expression::Surprised => (EulerAngles::new(-0.08, 0.0, 0.0), 0.15),
            Expression::Relaxed => (
                EulerAngles::new(0.0, (TAU * 0.3 * secs).sin() * 0.03, -0.04),
                -0.03,
            ),
        };
        let weight = if weight.is_finite() { weight.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            head_offset: head_offset.scale(weight).sanitized(),
            mouth_bias: mouth_bias * weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_has_no_effect() {
        let m = ExpressionModifier::for_expression(Expression::Neutral, 1.0, 3.2);
        assert_eq!(m, ExpressionModifier::default());
    }

    #[test]
    fn test_weight_scales_offset() {
        let full = ExpressionModifier::for_expression(Expression::Sad, 1.0, 0.0);
        let half = ExpressionModifier::for_expression(Expression::Sad, 0.5, 0.0);
        assert!((half.head_offset.pitch * 2.0 - full.head_offset.pitch).abs() < 1e-6);
        let nan = ExpressionModifier::for_expression(Expression::Sad, f32::NAN, 0.0);
        assert_eq!(nan, ExpressionModifier::default());
    }

    #[test]
    fn test_angry_shakes_head() {
        let a = ExpressionModifier::for_expression(Expression::Angry, 1.0, 0.1);
        let b = ExpressionModifier::for_expression(Expression::Angry, 1.0, 0.3);
        assert!(a.head_offset.yaw > 0.0);
        assert!(b.head_offset.yaw < 0.0);
    }
}
