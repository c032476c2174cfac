//! Scene nodes: shape kinds, operator selectors and editable parameters
//!
//! Every selector is a closed `#[repr(u32)]` enum whose discriminants run
//! `0..COUNT`. The host UI stores them as integer codes; [`TryFrom<u32>`]
//! is the only way back from a code, so an out-of-range code never reaches
//! the dispatch tables in [`crate::ops`].

use std::fmt;

use glam::{BVec3, IVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::error::Error;
use snowglobe_math::FAR_DISTANCE;

/// Extra room around a node's unit box
pub const BBOX_MARGIN: f32 = 0.05;

/// `op_smooth_union` only differs from `min` while `|a - b| < 4k`
const SMOOTH_UNION_REACH: f32 = 4.0;

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $code,)+
        }

        impl $name {
            /// Every variant, in code order
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Number of variants; dispatch tables are sized by this
            pub const COUNT: usize = Self::ALL.len();

            /// Integer code used by the host
            pub fn code(self) -> u32 {
                self as u32
            }

            /// Human readable name
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = Error;

            fn try_from(code: u32) -> Result<Self, Error> {
                Self::ALL
                    .get(code as usize)
                    .copied()
                    .ok_or(Error::UnknownCode { kind: $label, code })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

code_enum! {
    /// Primitive shape of a node
    NodeKind, "node kind" {
        #[default]
        Empty = 0 => "Empty",
        Box = 1 => "Box",
        Sphere = 2 => "Sphere",
        Snowman = 3 => "Snowman",
    }
}

code_enum! {
    /// How a node merges into what its parent and earlier siblings built.
    ///
    /// This is the user-facing selector; [`CombinationOp::resolve`] picks
    /// the sharp or smooth kernel from the node's smoothness.
    CombinationOp, "combination operator" {
        #[default]
        Union = 0 => "Union",
        Subtraction = 1 => "Subtraction",
        Intersection = 2 => "Intersection",
    }
}

code_enum! {
    /// Resolved combination kernel, sharp variants first
    CombineKernel, "combine kernel" {
        #[default]
        Union = 0 => "Union",
        Subtraction = 1 => "Subtraction",
        Intersection = 2 => "Intersection",
        SmoothUnion = 3 => "Smooth Union",
        SmoothSubtraction = 4 => "Smooth Subtraction",
        SmoothIntersection = 5 => "Smooth Intersection",
    }
}

code_enum! {
    /// Point folding applied before the node's transform
    RepetitionOp, "repetition operator" {
        #[default]
        None = 0 => "None",
        Limited = 1 => "Limited",
        Unlimited = 2 => "Unlimited",
    }
}

code_enum! {
    /// Point warp applied before everything else
    DeformationOp, "deformation operator" {
        #[default]
        None = 0 => "None",
        Twist = 1 => "Twist",
        Bend = 2 => "Bend",
        Elongate = 3 => "Elongate",
    }
}

impl CombinationOp {
    /// Offset from a sharp kernel code to its smooth counterpart
    const SMOOTH_OFFSET: u32 = 3;

    /// Pick the kernel: any positive smoothness selects the smooth variant.
    pub fn resolve(self, smoothness: f32) -> CombineKernel {
        let offset = if smoothness > 0.0 { Self::SMOOTH_OFFSET } else { 0 };
        CombineKernel::ALL[(self.code() + offset) as usize]
    }
}

/// User-editable parameters of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeParams {
    /// Translation relative to the parent's frame
    pub position: Vec3,
    /// Euler angles in radians, composed as `Rz * Ry * Rx`
    pub rotation: Vec3,
    /// Uniform scale
    pub scale: f32,
    /// Inflates the primitive by this much in its unit frame
    pub roundness: f32,
    pub combination: CombinationOp,
    /// Blend width; `> 0` switches to the smooth kernel
    pub smoothness: f32,
    /// Mirror flags per axis
    pub symmetry: [bool; 3],
    pub repetition: RepetitionOp,
    pub spacing: Vec3,
    /// Copies on each side of the origin for limited repetition
    pub limit: IVec3,
    pub deformation: DeformationOp,
    pub deformation_vector: Vec3,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            roundness: 0.0,
            combination: CombinationOp::Union,
            smoothness: 0.0,
            symmetry: [false; 3],
            repetition: RepetitionOp::None,
            spacing: Vec3::ONE,
            limit: IVec3::ONE,
            deformation: DeformationOp::None,
            deformation_vector: Vec3::ZERO,
        }
    }
}

impl NodeParams {
    /// Neutral parameters for a new child of a node with this scale
    pub fn inherit(parent_scale: f32) -> Self {
        Self {
            scale: parent_scale,
            ..Self::default()
        }
    }

    /// The resolved combination kernel
    pub fn kernel(&self) -> CombineKernel {
        self.combination.resolve(self.smoothness)
    }

    pub fn symmetry_axes(&self) -> BVec3 {
        BVec3::from(self.symmetry)
    }

    /// Local-to-parent transform, `T * Rz * Ry * Rx`. Scale is not part of
    /// it; the evaluator divides by scale separately.
    pub fn forward_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
    }

    /// Bounding box in the node's own frame: the unit cube scaled, plus
    /// margin and rounding.
    pub fn local_bounds(&self) -> Aabb {
        let scale = self.scale.abs();
        Aabb::unit().expand(BBOX_MARGIN + self.roundness.max(0.0)).scaled(scale)
    }

    /// How far a smooth union can grow geometry past this subtree, in the
    /// parent's units. Sharp kernels and smooth subtraction or intersection
    /// only remove material.
    pub fn blend_reach(&self) -> f32 {
        match self.kernel() {
            CombineKernel::SmoothUnion => SMOOTH_UNION_REACH * self.smoothness,
            _ => 0.0,
        }
    }

    /// Bounding box in the parent's frame, covering every repeated, mirrored
    /// and deformed instance. Undoes the point pipeline in reverse.
    pub fn bounds_in_parent(&self) -> Aabb {
        self.enclose_in_parent(self.local_bounds())
    }

    /// Map a box in this node's frame to a box in the parent's frame that
    /// covers every point the node's point pipeline sends into it, widened
    /// by the node's blend reach.
    ///
    /// Descendants live in this node's frame, so applying this for each
    /// ancestor in turn bounds them in world space.
    pub fn enclose_in_parent(&self, local: Aabb) -> Aabb {
        let mut b = local
            .expand(self.blend_reach())
            .transformed(&self.forward_transform());

        let spaced = self.spacing.cmpgt(Vec3::ZERO);
        match self.repetition {
            RepetitionOp::None => {}
            RepetitionOp::Limited => {
                let reach = self.spacing * self.limit.abs().as_vec3();
                let reach = Vec3::select(spaced, reach, Vec3::ZERO);
                b = Aabb::new(b.min - reach, b.max + reach);
            }
            RepetitionOp::Unlimited => {
                let reach = Vec3::select(spaced, Vec3::splat(FAR_DISTANCE), Vec3::ZERO);
                b = Aabb::new(b.min - reach, b.max + reach);
            }
        }

        let folded = b.min.abs().max(b.max.abs());
        let mirror = self.symmetry_axes();
        b = Aabb::new(
            Vec3::select(mirror, -folded, b.min),
            Vec3::select(mirror, folded, b.max),
        );

        match self.deformation {
            DeformationOp::None => b,
            // Twist rotates about the origin, so distance to it is kept
            DeformationOp::Twist => Aabb::cube(folded_radius(&b)),
            // Bend is only close to a rotation; the doubled radius is a loose bound
            DeformationOp::Bend => Aabb::cube(2.0 * folded_radius(&b)),
            DeformationOp::Elongate => {
                let h = self.deformation_vector.abs();
                Aabb::new(b.min - h, b.max + h)
            }
        }
    }
}

fn folded_radius(b: &Aabb) -> f32 {
    b.min.abs().max(b.max.abs()).length()
}

/// A shape contributor in the scene tree.
///
/// `t_inv` and `bbox` are derived from the parameters and are kept in sync
/// by [`crate::Scene`] on every edit.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: u32,
    pub(crate) kind: NodeKind,
    pub(crate) params: NodeParams,
    pub(crate) t_inv: Mat4,
    pub(crate) bbox: Aabb,
    pub(crate) children: Vec<crate::NodeHandle>,
}

impl Node {
    pub(crate) fn new(id: u32, kind: NodeKind, params: NodeParams) -> Self {
        Self {
            id,
            kind,
            params,
            t_inv: params.forward_transform().inverse(),
            bbox: params.bounds_in_parent(),
            children: Vec::new(),
        }
    }

    /// Unique, never reused identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn params(&self) -> &NodeParams {
        &self.params
    }

    /// Parent-to-local transform
    pub fn t_inv(&self) -> Mat4 {
        self.t_inv
    }

    /// World-space bounding box
    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    /// Children in evaluation order
    pub fn children(&self) -> &[crate::NodeHandle] {
        &self.children
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn codes_round_trip_and_reject_unknown() {
        for &kind in NodeKind::ALL {
            assert_eq!(NodeKind::try_from(kind.code()), Ok(kind));
        }
        assert_eq!(
            NodeKind::try_from(4),
            Err(Error::UnknownCode { kind: "node kind", code: 4 })
        );
        assert!(DeformationOp::try_from(DeformationOp::COUNT as u32).is_err());
    }

    #[test]
    fn counts_match_variants() {
        assert_eq!(NodeKind::COUNT, 4);
        assert_eq!(CombinationOp::COUNT, 3);
        assert_eq!(CombineKernel::COUNT, 6);
        assert_eq!(RepetitionOp::COUNT, 3);
        assert_eq!(DeformationOp::COUNT, 4);
    }

    #[test]
    fn smoothness_selects_smooth_kernel() {
        assert_eq!(CombinationOp::Union.resolve(0.0), CombineKernel::Union);
        assert_eq!(CombinationOp::Union.resolve(0.1), CombineKernel::SmoothUnion);
        assert_eq!(
            CombinationOp::Subtraction.resolve(0.02),
            CombineKernel::SmoothSubtraction
        );
        assert_eq!(
            CombinationOp::Intersection.resolve(-1.0),
            CombineKernel::Intersection
        );
        assert_eq!(
            CombinationOp::Intersection.resolve(1.0),
            CombineKernel::SmoothIntersection
        );
    }

    #[test]
    fn rotation_composes_z_then_y_then_x() {
        let params = NodeParams {
            rotation: Vec3::new(0.3, -0.4, 1.1),
            ..NodeParams::default()
        };
        let expected = Mat4::from_euler(glam::EulerRot::ZYX, 1.1, -0.4, 0.3);
        let p = Vec3::new(0.2, 0.7, -0.5);
        let a = params.forward_transform().transform_point3(p);
        let b = expected.transform_point3(p);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn local_bounds_follow_scale_and_roundness() {
        let params = NodeParams {
            scale: 2.0,
            roundness: 0.1,
            ..NodeParams::default()
        };
        let b = params.local_bounds();
        assert_relative_eq!(b.max.x, (0.5 + BBOX_MARGIN + 0.1) * 2.0, epsilon = 1e-6);
        assert_relative_eq!(b.min.y, -(0.5 + BBOX_MARGIN + 0.1) * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn plain_bounds_follow_transform() {
        let params = NodeParams {
            position: Vec3::new(1.0, 0.0, 0.0),
            ..NodeParams::default()
        };
        let b = params.bounds_in_parent();
        assert_relative_eq!(b.center().x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(b.size().x, 1.0 + 2.0 * BBOX_MARGIN, epsilon = 1e-6);
    }

    #[test]
    fn limited_repetition_widens_bounds() {
        let params = NodeParams {
            repetition: RepetitionOp::Limited,
            spacing: Vec3::new(2.0, 0.0, 1.0),
            limit: IVec3::new(3, 5, 1),
            ..NodeParams::default()
        };
        let b = params.bounds_in_parent();
        let half = 0.5 + BBOX_MARGIN;
        assert_relative_eq!(b.max.x, half + 6.0, epsilon = 1e-5);
        // Zero spacing does not repeat
        assert_relative_eq!(b.max.y, half, epsilon = 1e-5);
        assert_relative_eq!(b.min.z, -half - 1.0, epsilon = 1e-5);
    }

    #[test]
    fn symmetry_mirrors_bounds() {
        let params = NodeParams {
            position: Vec3::new(2.0, 0.0, 0.0),
            symmetry: [true, false, false],
            ..NodeParams::default()
        };
        let b = params.bounds_in_parent();
        let half = 0.5 + BBOX_MARGIN;
        assert_relative_eq!(b.min.x, -(2.0 + half), epsilon = 1e-5);
        assert_relative_eq!(b.max.x, 2.0 + half, epsilon = 1e-5);
    }

    #[test]
    fn twist_bounds_cover_rotated_instances() {
        let params = NodeParams {
            deformation: DeformationOp::Twist,
            deformation_vector: Vec3::new(0.0, 4.0, 0.0),
            ..NodeParams::default()
        };
        let b = params.bounds_in_parent();
        let corner = Vec3::splat(0.5 + BBOX_MARGIN).length();
        assert_relative_eq!(b.max.x, corner, epsilon = 1e-5);
        assert_relative_eq!(b.min.z, -corner, epsilon = 1e-5);
    }

    #[test]
    fn smooth_union_widens_bounds_by_blend_reach() {
        let sharp = NodeParams::default();
        let smooth = NodeParams {
            smoothness: 0.5,
            ..NodeParams::default()
        };
        assert_eq!(sharp.blend_reach(), 0.0);
        assert_relative_eq!(smooth.blend_reach(), 2.0, epsilon = 1e-6);
        assert_relative_eq!(
            smooth.bounds_in_parent().max.x,
            sharp.bounds_in_parent().max.x + 2.0,
            epsilon = 1e-5
        );

        // Smooth subtraction only removes material
        let carve = NodeParams {
            combination: CombinationOp::Subtraction,
            ..smooth
        };
        assert_eq!(carve.blend_reach(), 0.0);
    }

    #[test]
    fn enclose_repeats_descendant_boxes() {
        let params = NodeParams {
            repetition: RepetitionOp::Limited,
            spacing: Vec3::new(1.0, 0.0, 0.0),
            limit: IVec3::new(2, 0, 0),
            ..NodeParams::default()
        };
        let b = params.enclose_in_parent(Aabb::cube(0.25));
        assert_relative_eq!(b.min.x, -2.25, epsilon = 1e-5);
        assert_relative_eq!(b.max.x, 2.25, epsilon = 1e-5);
        assert_relative_eq!(b.max.y, 0.25, epsilon = 1e-5);
    }

    #[test]
    fn new_node_has_consistent_derived_data() {
        let params = NodeParams {
            position: Vec3::new(1.0, 0.0, 0.0),
            ..NodeParams::default()
        };
        let node = Node::new(7, NodeKind::Box, params);
        assert_eq!(node.t_inv().transform_point3(Vec3::new(1.0, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(node.to_string(), "Box #7");
    }
}
