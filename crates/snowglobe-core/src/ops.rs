//! Table-driven dispatch from node selectors to the math library
//!
//! Each table is a fixed-size array of function pointers sized by the
//! selector's `COUNT` and indexed by its discriminant. Because selectors can
//! only be built from valid codes, every lookup is in range.

use glam::{IVec3, Vec3};
use snowglobe_math as math;

use crate::node::{CombineKernel, DeformationOp, NodeKind, NodeParams, RepetitionOp};

/// Primitive distance in the node's unit frame
pub type DistanceFn = fn(Vec3) -> f32;

/// Merges a node's subtree distance `a` into the accumulated distance `b`
pub type CombineFn = fn(f32, f32, f32) -> f32;

/// Folds the query point by spacing and limit
pub type RepeatFn = fn(Vec3, Vec3, IVec3) -> Vec3;

/// Warps the query point by a deformation vector
pub type DeformFn = fn(Vec3, Vec3) -> Vec3;

pub const DISTANCE_TABLE: [DistanceFn; NodeKind::COUNT] = [
    math::sd_empty,
    math::sd_unit_box,
    math::sd_unit_sphere,
    math::sd_snowman,
];

pub const COMBINE_TABLE: [CombineFn; CombineKernel::COUNT] = [
    |a, b, _| math::op_union(a, b),
    |a, b, _| math::op_subtraction(a, b),
    |a, b, _| math::op_intersection(a, b),
    math::op_smooth_union,
    math::op_smooth_subtraction,
    math::op_smooth_intersection,
];

pub const REPEAT_TABLE: [RepeatFn; RepetitionOp::COUNT] = [
    |p, _, _| p,
    math::op_limited_repetition,
    |p, spacing, _| math::op_repetition(p, spacing),
];

pub const DEFORM_TABLE: [DeformFn; DeformationOp::COUNT] = [
    |p, _| p,
    math::op_twist,
    math::op_bend,
    math::op_elongate,
];

impl NodeKind {
    /// Distance to this primitive from a point in its unit frame
    pub fn distance(self, p: Vec3) -> f32 {
        DISTANCE_TABLE[self as usize](p)
    }
}

impl CombineKernel {
    /// Merge subtree distance `a` into accumulated distance `b`
    pub fn apply(self, a: f32, b: f32, smoothness: f32) -> f32 {
        COMBINE_TABLE[self as usize](a, b, smoothness)
    }
}

impl RepetitionOp {
    pub fn apply(self, p: Vec3, spacing: Vec3, limit: IVec3) -> Vec3 {
        REPEAT_TABLE[self as usize](p, spacing, limit)
    }
}

impl DeformationOp {
    pub fn apply(self, p: Vec3, def: Vec3) -> Vec3 {
        DEFORM_TABLE[self as usize](p, def)
    }
}

/// Point-space part of a node's evaluation: deform, mirror, repeat.
///
/// The node's inverse transform is applied after this, so every repeated
/// instance shares the same pre-transform query space.
pub fn warp_point(p: Vec3, params: &NodeParams) -> Vec3 {
    let p = params.deformation.apply(p, params.deformation_vector);
    let p = math::op_symmetry(p, params.symmetry_axes());
    params.repetition.apply(p, params.spacing, params.limit)
}

/// Primitive distance for a point already in the node's (unscaled) frame,
/// rescaled back to the parent's units.
pub fn scaled_distance(kind: NodeKind, q: Vec3, params: &NodeParams) -> f32 {
    let scale = params.scale;
    (kind.distance(q / scale) - params.roundness) * scale
}
