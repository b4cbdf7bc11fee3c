use glam::Vec3;

pub const EPSILON: f32 = 1.0e-6;

/// Distance between `a` and `b` projected onto the horizontal (XZ) plane.
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

pub fn normalize_or_default(v: Vec3, fallback: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON * EPSILON {
        return fallback;
    }
    v / len_sq.sqrt()
}

/// Rescales `v` to exactly `max_magnitude` when it is longer, keeping direction.
pub fn limit_magnitude(v: Vec3, max_magnitude: f32) -> Vec3 {
    if max_magnitude <= 0.0 {
        return Vec3::ZERO;
    }

    let mag_sq = v.length_squared();
    if mag_sq <= max_magnitude * max_magnitude {
        return v;
    }

    v * (max_magnitude / mag_sq.sqrt())
}

/// Linear interpolation of `value` from `[in_lo, in_hi]` onto `[out_lo, out_hi]`.
///
/// The input is clamped into its range first, so the result never extrapolates
/// past either output bound. A degenerate input range yields `out_lo`.
pub fn remap_clamped(value: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    if span.abs() <= EPSILON {
        return out_lo;
    }

    let t = ((value - in_lo) / span).clamp(0.0, 1.0);
    out_lo + (out_hi - out_lo) * t
}
