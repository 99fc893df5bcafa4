//! Bounded scalar helpers
//!
//! Every channel that leaves the fusion core is either a unit scalar in
//! [0, 1] or a rotation inside its sane range. These helpers are the only
//! place that decides what happens to NaN, infinities and out-of-range
//! samples: they collapse to the neutral value instead of propagating.

/// Clamp into [0, 1]; non-finite input becomes 0
#[inline]
pub fn unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Replace a non-finite value with `fallback`
#[inline]
pub fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

/// Map `v` from the window [lo, hi] onto [0, 1], clamped.
///
/// Used to turn raw detector scores (which rarely reach 0 or 1) into
/// usable channel weights. A collapsed window acts as a step at `lo`.
#[inline]
pub fn remap_unit(v: f32, lo: f32, hi: f32) -> f32 {
    let span = hi - lo;
    if !span.is_finite() || span.abs() < f32::EPSILON {
        return if unit(v) >= lo { 1.0 } else { 0.0 };
    }
    unit((v - lo) / span)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// One step of exponential smoothing toward `target`
#[inline]
pub fn smooth_toward(current: f32, target: f32, alpha: f32) -> f32 {
    current + (target - current) * alpha.clamp(0.0, 1.0)
}

/// Exponential smoothing with separate rise and fall rates
#[inline]
pub fn attack_release(current: f32, target: f32, attack: f32, release: f32) -> f32 {
    let alpha = if target > current { attack } else { release };
    smooth_toward(current, target, alpha)
}

/// Hermite smoothstep on t ∈ [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = unit(t);
    t * t * (3.0 - 2.0 * t)
}
