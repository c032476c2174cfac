//! # Snowglobe Core
//!
//! Scene graph and signed distance field evaluation.
//!
//! A [`Scene`] is an editable tree of shape nodes. Each node carries a
//! primitive, a transform, a combination operator and point-space modifiers
//! (deformation, symmetry, repetition). For evaluation the tree is flattened
//! breadth-first into a [`FlatScene`], which [`map`] walks with a fixed-size
//! stack. [`generate_dense_grid`] runs that walk for every voxel of a grid in
//! parallel.
//!
//! ## Quick Start
//!
//! ```rust
//! use snowglobe_core::prelude::*;
//!
//! let mut scene = Scene::new();
//! let body = scene.add_child(NodeKind::Box);
//! scene.update_params(body, |p| p.scale = 0.5)?;
//! scene.add_child_with(
//!     NodeKind::Sphere,
//!     NodeParams {
//!         position: Vec3::new(0.0, 0.25, 0.0),
//!         scale: 0.5,
//!         combination: CombinationOp::Subtraction,
//!         ..NodeParams::default()
//!     },
//! );
//!
//! let grid = scene.generate_dense_grid(32)?;
//! assert_eq!(grid.len(), 32 * 32 * 32);
//!
//! let objects = scene.objects()?;
//! assert_eq!(objects.len(), scene.node_count());
//! # Ok::<(), snowglobe_core::Error>(())
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: negative inside, positive outside. Empty space reads as
//!   [`FAR_DISTANCE`].
//! - **Angles**: Euler angles in radians, applied Z, then Y, then X
//! - **Grid layout**: index `z*N² + y*N + x`, sampled at voxel centers

pub mod aabb;
pub mod eval;
pub mod flatten;
pub mod grid;
pub mod node;
pub mod ops;
pub mod scene;

mod error;

pub use aabb::Aabb;
pub use error::{Error, Result};
pub use eval::map;
pub use flatten::{FlatNode, FlatScene, MAX_STACK_DEPTH, SceneObject, flatten};
pub use grid::{DenseGrid, GridConfig, generate_dense_grid};
pub use node::{
    CombinationOp, CombineKernel, DeformationOp, Node, NodeKind, NodeParams, RepetitionOp,
};
pub use scene::{NodeHandle, Scene};
pub use snowglobe_math::FAR_DISTANCE;

/// Prelude module for convenient imports
pub mod prelude {
    // Scene editing
    pub use crate::node::{
        CombinationOp, DeformationOp, Node, NodeKind, NodeParams, RepetitionOp,
    };
    pub use crate::scene::{NodeHandle, Scene};

    // Evaluation
    pub use crate::eval::map;
    pub use crate::flatten::{FlatScene, SceneObject};
    pub use crate::grid::{DenseGrid, GridConfig};

    pub use crate::aabb::Aabb;
    pub use snowglobe_math::FAR_DISTANCE;

    // Math (re-export glam)
    pub use glam::{IVec3, Mat4, Vec3};

    // Error handling
    pub use crate::{Error, Result};
}
