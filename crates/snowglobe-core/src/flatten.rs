//! Breadth-first flattening of the scene tree
//!
//! The evaluator walks a [`FlatScene`] instead of the arena: nodes sit in
//! breadth-first order with the root at index 0, and the children of every
//! node occupy the contiguous run `first_child..first_child + child_count`.

use std::collections::VecDeque;

use glam::Mat4;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aabb::Aabb;
use crate::error::{Error, Result};
use crate::node::{CombineKernel, NodeKind, NodeParams};
use crate::scene::Scene;

/// Evaluator stack capacity. A tree needs one frame per level, root included.
pub const MAX_STACK_DEPTH: usize = 32;

/// A node in flattened, index-addressed form
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode {
    pub id: u32,
    pub kind: NodeKind,
    pub params: NodeParams,
    /// Combination kernel resolved from the params at flatten time
    pub kernel: CombineKernel,
    pub t_inv: Mat4,
    pub bbox: Aabb,
    pub first_child: u32,
    pub child_count: u32,
}

impl FlatNode {
    /// Flat indices of this node's children
    pub fn child_range(&self) -> std::ops::Range<usize> {
        let start = self.first_child as usize;
        start..start + self.child_count as usize
    }
}

/// Per-node record for the renderer's acceleration structure.
///
/// Laid out for direct upload: two `vec3 + u32` rows.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct SceneObject {
    pub min: [f32; 3],
    pub id: u32,
    pub max: [f32; 3],
    pub kind: u32,
}

const _: () = assert!(std::mem::size_of::<SceneObject>() == 32);

impl From<&FlatNode> for SceneObject {
    fn from(node: &FlatNode) -> Self {
        Self {
            min: node.bbox.min.to_array(),
            id: node.id,
            max: node.bbox.max.to_array(),
            kind: node.kind.code(),
        }
    }
}

/// Read-only snapshot of a scene, ready for evaluation
#[derive(Debug, Clone)]
pub struct FlatScene {
    nodes: Vec<FlatNode>,
    depth: usize,
}

impl FlatScene {
    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    /// Number of nodes, root included. Never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children, i.e. there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.nodes[0].child_count == 0
    }

    pub fn root(&self) -> &FlatNode {
        &self.nodes[0]
    }

    pub fn children(&self, index: usize) -> &[FlatNode] {
        &self.nodes[self.nodes[index].child_range()]
    }

    /// Number of tree levels, root included
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bounding-box records in flat order
    pub fn objects(&self) -> Vec<SceneObject> {
        self.nodes.iter().map(SceneObject::from).collect()
    }
}

/// Flatten `scene` breadth-first.
///
/// Each child's slot is reserved when its parent is visited, so a parent's
/// `first_child` is known before any of its children are written. Fails with
/// [`Error::DepthLimitExceeded`] if the tree needs more than
/// [`MAX_STACK_DEPTH`] evaluator frames.
pub fn flatten(scene: &Scene) -> Result<FlatScene> {
    let mut nodes = Vec::with_capacity(scene.node_count());
    let mut queue = VecDeque::new();
    let mut next_slot: u32 = 1;
    let mut depth = 0;

    queue.push_back((scene.root(), 0u32, 1usize));

    while let Some((handle, slot, level)) = queue.pop_front() {
        debug_assert_eq!(slot as usize, nodes.len(), "flat slot out of order");

        if level > MAX_STACK_DEPTH {
            return Err(Error::DepthLimitExceeded {
                depth: level,
                limit: MAX_STACK_DEPTH,
            });
        }
        depth = depth.max(level);

        let node = scene.node(handle).ok_or(Error::NodeNotFound)?;
        let children = node.children();

        let first_child = next_slot;
        for &child in children {
            queue.push_back((child, next_slot, level + 1));
            next_slot += 1;
        }

        nodes.push(FlatNode {
            id: node.id(),
            kind: node.kind(),
            params: *node.params(),
            kernel: node.params().kernel(),
            t_inv: node.t_inv(),
            bbox: node.bbox(),
            first_child,
            child_count: children.len() as u32,
        });
    }

    debug!(nodes = nodes.len(), depth, "flattened scene");
    Ok(FlatScene { nodes, depth })
}

impl Scene {
    /// Breadth-first snapshot for evaluation; see [`flatten`]
    pub fn flatten(&self) -> Result<FlatScene> {
        flatten(self)
    }

    /// World-space bounding boxes, one per node, in flat order
    pub fn objects(&self) -> Result<Vec<SceneObject>> {
        Ok(self.flatten()?.objects())
    }
}
