//! Scene evaluation with an explicit, fixed-size stack
//!
//! [`map`] walks a [`FlatScene`] in post-order without recursion or heap
//! allocation, so it can run once per voxel inside a parallel loop.
//!
//! Each frame keeps the query point in its node's frame, the distance built
//! so far for its subtree, and the distance its parent had accumulated when
//! the frame was pushed. A node starts from its own primitive distance; each
//! child subtree is merged into it with the child's kernel as the child is
//! popped. The root frame is virtual: it seeds [`FAR_DISTANCE`] and has no
//! transform or primitive of its own.

use glam::Vec3;
use snowglobe_math::FAR_DISTANCE;

use crate::flatten::{FlatScene, MAX_STACK_DEPTH};
use crate::ops::{scaled_distance, warp_point};

#[derive(Debug, Clone, Copy)]
struct Frame {
    index: usize,
    point: Vec3,
    parent_value: f32,
    value: f32,
    cursor: u32,
}

impl Frame {
    const EMPTY: Self = Self {
        index: 0,
        point: Vec3::ZERO,
        parent_value: FAR_DISTANCE,
        value: FAR_DISTANCE,
        cursor: 0,
    };
}

/// Signed distance from world-space point `p` to the scene surface.
///
/// Returns [`FAR_DISTANCE`] for a scene with no shapes.
///
/// # Panics
///
/// Panics if the scene is deeper than [`MAX_STACK_DEPTH`]. [`FlatScene`]s
/// built by [`crate::flatten()`] never are.
pub fn map(p: Vec3, scene: &FlatScene) -> f32 {
    assert!(
        scene.depth() <= MAX_STACK_DEPTH,
        "scene depth {} exceeds evaluator stack of {}",
        scene.depth(),
        MAX_STACK_DEPTH
    );

    let nodes = scene.nodes();
    let mut stack = [Frame::EMPTY; MAX_STACK_DEPTH];
    stack[0].point = p;
    let mut top = 1;
    let mut result = FAR_DISTANCE;

    while top > 0 {
        let frame = &mut stack[top - 1];
        let node = &nodes[frame.index];

        if frame.cursor < node.child_count {
            // Descend into the next child
            let index = (node.first_child + frame.cursor) as usize;
            frame.cursor += 1;

            let child = &nodes[index];
            let q = child
                .t_inv
                .transform_point3(warp_point(frame.point, &child.params));
            let pushed = Frame {
                index,
                point: q,
                parent_value: frame.value,
                value: scaled_distance(child.kind, q, &child.params),
                cursor: 0,
            };

            assert!(top < MAX_STACK_DEPTH, "evaluator stack overflow");
            stack[top] = pushed;
            top += 1;
        } else {
            // All children merged: fold this subtree into the parent
            let value = if top == 1 {
                frame.value
            } else {
                node.kernel
                    .apply(frame.value, frame.parent_value, node.params.smoothness)
            };

            top -= 1;
            if top > 0 {
                stack[top - 1].value = value;
            }
            result = value;
        }
    }

    result
}

impl FlatScene {
    /// Signed distance at `p`; see [`map`]
    pub fn distance(&self, p: Vec3) -> f32 {
        map(p, self)
    }
}
