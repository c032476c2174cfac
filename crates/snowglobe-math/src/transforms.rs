//! Point-space deformations and symmetry folds
//!
//! These warp the query point rather than the shape, so they are applied
//! before the primitive is evaluated. None of them preserve distances
//! exactly; the results are bounds suitable for sphere tracing and
//! voxelization, not exact SDFs.

#![allow(clippy::many_single_char_names)]

use glam::{BVec3, Mat3, Vec3};

/// Anisotropic twist around the direction of `def`.
///
/// The rotation axis is `normalize(def)` and the angle grows with
/// `|def| * dot(p, axis)`, so points further along the axis are rotated more.
pub fn op_twist(p: Vec3, def: Vec3) -> Vec3 {
    let axis = def.normalize_or_zero();
    let angle = def.length() * p.dot(axis);
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    let r = Mat3::from_cols_array(&[
        c + axis.x * axis.x * t,
        axis.x * axis.y * t - axis.z * s,
        axis.x * axis.z * t + axis.y * s,
        //
        axis.y * axis.x * t + axis.z * s,
        c + axis.y * axis.y * t,
        axis.y * axis.z * t - axis.x * s,
        //
        axis.z * axis.x * t - axis.y * s,
        axis.z * axis.y * t + axis.x * s,
        c + axis.z * axis.z * t,
    ]);

    r * p
}

/// Anisotropic bend. Like [`op_twist`] but with the axis taken from the
/// `yzx` swizzle of `def` and the rotation matrix columns cycled, which
/// turns the twist into a bend across the deformation direction.
pub fn op_bend(p: Vec3, def: Vec3) -> Vec3 {
    let axis = Vec3::new(def.y, def.z, def.x).normalize_or_zero();
    let angle = def.length() * p.dot(axis);
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    let r = Mat3::from_cols_array(&[
        axis.y * axis.x * t + axis.z * s,
        c + axis.y * axis.y * t,
        axis.y * axis.z * t - axis.x * s,
        //
        axis.z * axis.x * t + axis.y * s,
        axis.z * axis.y * t + axis.x * s,
        c + axis.z * axis.z * t,
        //
        c + axis.x * axis.x * t,
        axis.x * axis.y * t - axis.z * s,
        axis.x * axis.z * t + axis.y * s,
    ]);

    let q = r * p;
    Vec3::new(q.y, q.z, q.x)
}

/// Stretches the shape by `h` along each axis: the core box `[-h, h]` is
/// collapsed onto the origin.
pub fn op_elongate(p: Vec3, h: Vec3) -> Vec3 {
    let h = h.abs();
    p - p.clamp(-h, h)
}

/// Mirrors the negative half-space onto the positive one for every axis set
/// in `axes`.
pub fn op_symmetry(p: Vec3, axes: BVec3) -> Vec3 {
    Vec3::select(axes, p.abs(), p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn zero_deformation_is_identity() {
        let p = Vec3::new(0.3, -0.2, 0.7);
        assert_vec_eq(op_twist(p, Vec3::ZERO), p);
        assert_vec_eq(op_elongate(p, Vec3::ZERO), p);
    }

    #[test]
    fn twist_preserves_length() {
        let def = Vec3::new(0.0, 3.0, 0.0);
        for p in [Vec3::new(0.4, 0.2, 0.1), Vec3::new(-0.1, 0.5, 0.3)] {
            assert_relative_eq!(op_twist(p, def).length(), p.length(), epsilon = 1e-5);
        }
    }

    #[test]
    fn twist_leaves_axis_points_fixed() {
        let def = Vec3::new(0.0, 2.0, 0.0);
        let p = Vec3::new(0.0, 0.4, 0.0);
        assert_vec_eq(op_twist(p, def), p);
    }

    #[test]
    fn twist_does_not_rotate_at_zero_height() {
        let def = Vec3::new(0.0, 5.0, 0.0);
        let p = Vec3::new(0.3, 0.0, -0.2);
        assert_vec_eq(op_twist(p, def), p);
    }

    #[test]
    fn twist_angle_scales_with_height() {
        // Angle = |def| * y = pi/2 at this height, a quarter turn about Y
        let def = Vec3::new(0.0, std::f32::consts::PI, 0.0);
        let p = Vec3::new(1.0, 0.5, 0.0);
        let q = op_twist(p, def);
        assert_relative_eq!(q.y, 0.5, epsilon = 1e-5);
        assert_relative_eq!(q.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(q.z.abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn bend_preserves_length() {
        let def = Vec3::new(1.5, 0.5, 0.0);
        for p in [Vec3::new(0.4, 0.2, 0.1), Vec3::new(-0.3, 0.1, 0.25)] {
            assert_relative_eq!(op_bend(p, def).length(), p.length(), epsilon = 1e-5);
        }
    }

    #[test]
    fn bend_with_zero_vector_is_identity() {
        let p = Vec3::new(0.1, 0.2, 0.3);
        assert_vec_eq(op_bend(p, Vec3::ZERO), p);
    }

    #[test]
    fn elongate_collapses_core() {
        let h = Vec3::new(1.0, 0.0, 0.5);
        assert_vec_eq(op_elongate(Vec3::new(0.5, 0.2, 0.2), h), Vec3::new(0.0, 0.2, 0.0));
        assert_vec_eq(op_elongate(Vec3::new(-1.5, 0.0, 0.75), h), Vec3::new(-0.5, 0.0, 0.25));
    }

    #[test]
    fn symmetry_folds_selected_axes() {
        let p = Vec3::new(-1.0, -2.0, -3.0);
        assert_vec_eq(op_symmetry(p, BVec3::new(true, false, true)), Vec3::new(1.0, -2.0, 3.0));
        assert_vec_eq(op_symmetry(p, BVec3::FALSE), p);
    }
}
