//! SDF operations - boolean combination and repetition

use glam::{IVec3, Vec3};

// ============================================================================
// Boolean Operations
// ============================================================================

/// Union of two distances
pub fn op_union(a: f32, b: f32) -> f32 {
    a.min(b)
}

/// Removes `a` from `b`
pub fn op_subtraction(a: f32, b: f32) -> f32 {
    (-a).max(b)
}

/// Intersection of two distances
pub fn op_intersection(a: f32, b: f32) -> f32 {
    a.max(b)
}

/// Symmetric difference: inside exactly one of the two shapes
pub fn op_xor(a: f32, b: f32) -> f32 {
    a.min(b).max(-a.max(b))
}

// ============================================================================
// Smooth Boolean Operations
// ============================================================================

/// Smooth union with a quadratic polynomial kernel of blend width `k`.
///
/// `k` must be positive. The result never exceeds `min(a, b)`.
pub fn op_smooth_union(a: f32, b: f32, k: f32) -> f32 {
    let k = k * 4.0;
    let h = (k - (a - b).abs()).max(0.0);
    a.min(b) - h * h * 0.25 / k
}

/// Smooth counterpart of [`op_subtraction`], derived from [`op_smooth_union`]
pub fn op_smooth_subtraction(a: f32, b: f32, k: f32) -> f32 {
    -op_smooth_union(a, -b, k)
}

/// Smooth counterpart of [`op_intersection`], derived from [`op_smooth_union`]
pub fn op_smooth_intersection(a: f32, b: f32, k: f32) -> f32 {
    -op_smooth_union(-a, -b, k)
}

// ============================================================================
// Repetition
// ============================================================================

/// Unlimited repetition: folds `p` into the cell around the origin.
///
/// Axes with a non-positive spacing are left untouched.
pub fn op_repetition(p: Vec3, spacing: Vec3) -> Vec3 {
    let cell = (p / spacing).round();
    fold(p, spacing, cell)
}

/// Repetition limited to `limit` copies on each side of the origin, per axis
pub fn op_limited_repetition(p: Vec3, spacing: Vec3, limit: IVec3) -> Vec3 {
    let limit = limit.abs().as_vec3();
    let cell = (p / spacing).round().clamp(-limit, limit);
    fold(p, spacing, cell)
}

fn fold(p: Vec3, spacing: Vec3, cell: Vec3) -> Vec3 {
    let folded = p - spacing * cell;
    Vec3::select(spacing.cmpgt(Vec3::ZERO), folded, p)
}
