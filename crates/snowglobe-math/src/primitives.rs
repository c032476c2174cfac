//! SDF primitive shapes
//!
//! All primitives are centered at the origin. Placement is the caller's job.

// Mathematical formulas use standard single-letter notation
#![allow(clippy::many_single_char_names)]

use crate::FAR_DISTANCE;
use crate::operations::{op_smooth_union, op_union};
use glam::{Vec2, Vec3};

/// Radius of the sphere node primitive.
pub const UNIT_SPHERE_RADIUS: f32 = 0.5;

/// Half-extent of the box node primitive.
pub const UNIT_BOX_HALF_EXTENT: f32 = 0.5;

/// Sphere of radius `r`
pub fn sd_sphere(p: Vec3, r: f32) -> f32 {
    p.length() - r
}

/// Sphere filling the centered unit cube
pub fn sd_unit_sphere(p: Vec3) -> f32 {
    sd_sphere(p, UNIT_SPHERE_RADIUS)
}

/// Axis-aligned box with the given half-extents
pub fn sd_box(p: Vec3, half_extents: Vec3) -> f32 {
    let q = p.abs() - half_extents;
    q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
}

/// Box filling the centered unit cube
pub fn sd_unit_box(p: Vec3) -> f32 {
    sd_box(p, Vec3::splat(UNIT_BOX_HALF_EXTENT))
}

/// Shape with no surface. Always [`FAR_DISTANCE`] away.
pub fn sd_empty(_p: Vec3) -> f32 {
    FAR_DISTANCE
}

/// Plane with normal `n` (expected normalized) offset by `h` from the origin
pub fn sd_plane(p: Vec3, n: Vec3, h: f32) -> f32 {
    p.dot(n) + h
}

/// Capsule around the segment `a`-`b` with radius `r`
pub fn sd_capsule(p: Vec3, a: Vec3, b: Vec3, r: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / ba.dot(ba)).clamp(0.0, 1.0);
    (pa - ba * h).length() - r
}

/// Y-aligned cylinder of radius `ra`, half-height `h` and edge rounding `rb`
pub fn sd_rounded_cylinder(p: Vec3, ra: f32, rb: f32, h: f32) -> f32 {
    let d = Vec2::new(Vec2::new(p.x, p.z).length() - ra + rb, p.y.abs() - h + rb);
    d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length() - rb
}

/// A pre-authored snowman: body, head, eyes, arms, nose and a top hat.
///
/// Modeled at 1/0.23 scale and shifted down so the whole figure sits inside
/// the centered unit cube.
pub fn sd_snowman(point: Vec3) -> f32 {
    const SCALE: f32 = 0.23;
    const ORIGIN: Vec3 = Vec3::new(0.0, -0.25, 0.0);

    let p = (point - ORIGIN) / SCALE;

    let mut r = sd_sphere(p, 1.0);
    r = op_smooth_union(r, sd_sphere(p - Vec3::new(0.0, 1.5, 0.0), 0.6), 0.1);

    // Eyes
    r = op_smooth_union(r, sd_sphere(p - Vec3::new(0.3, 1.6, 0.5), 0.1), 0.01);
    r = op_smooth_union(r, sd_sphere(p - Vec3::new(-0.3, 1.6, 0.5), 0.1), 0.01);

    // Arms
    r = op_smooth_union(
        r,
        sd_capsule(p, Vec3::ZERO, Vec3::new(1.6, 0.8, 0.0), 0.15),
        0.05,
    );
    r = op_smooth_union(
        r,
        sd_capsule(p, Vec3::ZERO, Vec3::new(-1.6, 0.8, 0.0), 0.15),
        0.05,
    );

    // Nose
    r = op_smooth_union(
        r,
        sd_capsule(p, Vec3::new(0.0, 1.4, 0.0), Vec3::new(0.0, 1.3, 0.8), 0.05),
        0.01,
    );

    // Hat brim and crown
    r = op_union(
        r,
        sd_rounded_cylinder(p - Vec3::new(0.0, 2.1, 0.0), 0.7, 0.05, 0.1),
    );
    r = op_union(
        r,
        sd_rounded_cylinder(p - Vec3::new(0.0, 2.5, 0.0), 0.4, 0.05, 0.5),
    );

    r * SCALE
}
