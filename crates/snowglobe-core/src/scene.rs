//! The editable scene tree
//!
//! Nodes live in a generation-checked arena. Parents own an ordered list of
//! child handles; there are no parent links, so operations that need a
//! node's ancestry search down from the root. The root always exists, has
//! id 0 and contributes no shape of its own.

use glam::Vec3;
use slotmap::SlotMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::{CombinationOp, DeformationOp, Node, NodeKind, NodeParams, RepetitionOp};

slotmap::new_key_type! {
    /// Opaque handle to a node. Stale handles are detected, never reused.
    pub struct NodeHandle;
}

/// A rooted, ordered tree of SDF nodes plus the editing state around it
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,
    selected: Option<NodeHandle>,
    next_id: u32,
    dirty: bool,
}

impl Scene {
    /// A scene with only the root node
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(0, NodeKind::Empty, NodeParams::default()));

        Self {
            nodes,
            root,
            selected: None,
            next_id: 1,
            dirty: true,
        }
    }

    /// The startup scene: a snowman, a box with a smooth spherical bite taken
    /// out of it, and a twisted grid of small pillars.
    pub fn demo() -> Self {
        let mut scene = Self::new();

        scene.add_child_with(
            NodeKind::Snowman,
            NodeParams {
                position: Vec3::new(-0.2, 0.0, 0.0),
                scale: 0.6,
                ..NodeParams::default()
            },
        );
        scene.clear_selection();

        scene.add_child_with(
            NodeKind::Box,
            NodeParams {
                position: Vec3::new(0.25, -0.3, 0.0),
                rotation: Vec3::new(0.0, 0.4, 0.0),
                scale: 0.25,
                ..NodeParams::default()
            },
        );
        scene.add_child_with(
            NodeKind::Sphere,
            NodeParams {
                position: Vec3::new(0.0, 0.08, 0.0),
                scale: 0.3,
                combination: CombinationOp::Subtraction,
                smoothness: 0.02,
                ..NodeParams::default()
            },
        );
        scene.clear_selection();

        scene.add_child_with(
            NodeKind::Empty,
            NodeParams {
                position: Vec3::new(0.25, 0.2, 0.0),
                ..NodeParams::default()
            },
        );
        scene.add_child_with(
            NodeKind::Box,
            NodeParams {
                scale: 0.06,
                roundness: 0.1,
                smoothness: 0.01,
                repetition: RepetitionOp::Limited,
                spacing: Vec3::new(0.1, 0.0, 0.1),
                limit: glam::IVec3::new(1, 0, 1),
                deformation: DeformationOp::Twist,
                deformation_vector: Vec3::new(0.0, 8.0, 0.0),
                ..NodeParams::default()
            },
        );
        scene.clear_selection();

        scene
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// The currently selected node, if any
    pub fn selected(&self) -> Option<NodeHandle> {
        self.selected
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    /// Children of `handle` in evaluation order; empty for unknown handles
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(handle)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no shapes (the root has no children)
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Number of nodes in the subtree rooted at `handle`, itself included
    pub fn subtree_len(&self, handle: NodeHandle) -> usize {
        if !self.nodes.contains_key(handle) {
            return 0;
        }
        let mut count = 0;
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children(h));
        }
        count
    }

    /// Depth-first pre-order walk, as a tree widget would draw it.
    /// Yields `(depth, handle)` with the root at depth 0.
    pub fn walk(&self) -> Vec<(usize, NodeHandle)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0, self.root)];
        while let Some((depth, h)) = stack.pop() {
            out.push((depth, h));
            // Reverse so the first child is visited first
            stack.extend(self.children(h).iter().rev().map(|&c| (depth + 1, c)));
        }
        out
    }

    /// Find the node with the given numeric id
    pub fn find_by_id(&self, id: u32) -> Option<NodeHandle> {
        self.nodes.iter().find(|(_, n)| n.id == id).map(|(h, _)| h)
    }

    // ========================================================================
    // Dirty flag
    // ========================================================================

    /// Whether the scene changed since the host last consumed it
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Read and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn select(&mut self, handle: NodeHandle) -> Result<()> {
        if !self.nodes.contains_key(handle) {
            return Err(Error::NodeNotFound);
        }
        self.selected = Some(handle);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a node under the selection (or the root), inheriting the parent's
    /// scale. The new node becomes the selection.
    pub fn add_child(&mut self, kind: NodeKind) -> NodeHandle {
        let parent = self.selection_or_root();
        let parent_scale = self.nodes[parent].params.scale;
        self.add_child_with(kind, NodeParams::inherit(parent_scale))
    }

    /// Like [`Scene::add_child`] with explicit parameters
    pub fn add_child_with(&mut self, kind: NodeKind, params: NodeParams) -> NodeHandle {
        let parent = self.selection_or_root();
        let id = self.next_id;
        self.next_id += 1;

        let handle = self.nodes.insert(Node::new(id, kind, params));
        self.nodes[parent].children.push(handle);

        let chain = self.placement_chain(handle);
        self.refresh_subtree(handle, chain);

        self.selected = Some(handle);
        self.dirty = true;
        debug!(id, kind = %kind, "added node");
        handle
    }

    /// Remove the selected node and its subtree.
    ///
    /// Does nothing when nothing is selected or the root is selected.
    /// Returns the number of nodes removed.
    pub fn delete_selected(&mut self) -> usize {
        let Some(target) = self.selected else {
            return 0;
        };
        if target == self.root {
            return 0;
        }
        let Some(parent) = self.find_parent(target) else {
            return 0;
        };

        self.nodes[parent].children.retain(|&c| c != target);

        let id = self.nodes[target].id;
        let mut removed = 0;
        let mut stack = vec![target];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.remove(h) {
                removed += 1;
                stack.extend(node.children);
            }
        }

        self.selected = None;
        self.dirty = true;
        debug!(id, removed, "deleted subtree");
        removed
    }

    /// Select `handle` and delete it. Same no-op rules as
    /// [`Scene::delete_selected`].
    pub fn delete(&mut self, handle: NodeHandle) -> Result<usize> {
        self.select(handle)?;
        Ok(self.delete_selected())
    }

    /// Edit a node's parameters and recompute its derived data
    pub fn update_params(
        &mut self,
        handle: NodeHandle,
        edit: impl FnOnce(&mut NodeParams),
    ) -> Result<()> {
        let node = self.nodes.get_mut(handle).ok_or(Error::NodeNotFound)?;
        edit(&mut node.params);
        self.update_node_data(handle)
    }

    /// Change a node's primitive
    pub fn set_kind(&mut self, handle: NodeHandle, kind: NodeKind) -> Result<()> {
        let node = self.nodes.get_mut(handle).ok_or(Error::NodeNotFound)?;
        node.kind = kind;
        self.dirty = true;
        Ok(())
    }

    /// Recompute `t_inv` and the world-space bounding box of `handle` and
    /// every node below it. Call after any parameter edit.
    pub fn update_node_data(&mut self, handle: NodeHandle) -> Result<()> {
        if !self.nodes.contains_key(handle) {
            return Err(Error::NodeNotFound);
        }

        if handle != self.root && self.find_parent(handle).is_none() {
            return Err(Error::NodeNotFound);
        }
        let chain = self.placement_chain(handle);
        self.refresh_subtree(handle, chain);
        self.dirty = true;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn selection_or_root(&self) -> NodeHandle {
        self.selected
            .filter(|h| self.nodes.contains_key(*h))
            .unwrap_or(self.root)
    }

    /// Parent of `target`, searched from the root
    fn find_parent(&self, target: NodeHandle) -> Option<NodeHandle> {
        let mut stack = vec![self.root];
        while let Some(h) = stack.pop() {
            let children = self.children(h);
            if children.contains(&target) {
                return Some(h);
            }
            stack.extend_from_slice(children);
        }
        None
    }

    /// Ancestors of `target` from the root down, excluding `target`
    fn ancestors(&self, target: NodeHandle) -> Vec<NodeHandle> {
        let mut path = Vec::new();
        let mut current = target;
        while let Some(parent) = self.find_parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Ancestors whose placement and point warps apply to `target`, from the
    /// root down. The root's own parameters never do.
    fn placement_chain(&self, target: NodeHandle) -> Vec<NodeHandle> {
        let mut chain = self.ancestors(target);
        chain.retain(|&h| h != self.root);
        chain
    }

    /// Recompute `t_inv` and `bbox` below `handle`. `chain` is the placement
    /// chain of `handle`.
    ///
    /// Boxes are grown from the node's own frame out to world space through
    /// every ancestor, so an ancestor's repetition, symmetry, deformation and
    /// blend reach cover its descendants too.
    fn refresh_subtree(&mut self, handle: NodeHandle, chain: Vec<NodeHandle>) {
        let mut stack = vec![(handle, chain)];
        while let Some((h, chain)) = stack.pop() {
            let bbox = chain
                .iter()
                .rev()
                .fold(self.nodes[h].params.bounds_in_parent(), |b, &a| {
                    self.nodes[a].params.enclose_in_parent(b)
                });

            let node = &mut self.nodes[h];
            node.t_inv = node.params.forward_transform().inverse();
            node.bbox = bbox;

            let mut child_chain = chain;
            if h != self.root {
                child_chain.push(h);
            }
            for &c in &self.nodes[h].children {
                stack.push((c, child_chain.clone()));
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
