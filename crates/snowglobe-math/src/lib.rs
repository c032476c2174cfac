//! Snowglobe Math - distance primitives and point-space operators
//!
//! Every function here is pure and stateless. Primitives take a point in the
//! shape's local frame and return a signed distance (negative inside, zero on
//! the surface, positive outside). Operators either merge two distances or
//! warp the query point before a primitive is evaluated.
//!
//! The node-facing primitives ([`sd_unit_sphere`], [`sd_unit_box`],
//! [`sd_snowman`], [`sd_empty`]) are authored to fit the centered unit cube,
//! so a node's uniform scale maps directly to its world-space size.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use snowglobe_math::{op_smooth_union, sd_sphere};
//!
//! let a = sd_sphere(Vec3::new(0.2, 0.0, 0.0), 0.5);
//! let b = sd_sphere(Vec3::new(-0.2, 0.0, 0.0), 0.5);
//! let blended = op_smooth_union(a, b, 0.05);
//! assert!(blended <= a.min(b));
//! ```

pub mod operations;
pub mod primitives;
pub mod transforms;

pub use operations::*;
pub use primitives::*;
pub use transforms::*;

/// Distance returned by [`sd_empty`] and used as the "nothing here yet"
/// seed for accumulating combinations. Large enough to lose every union.
pub const FAR_DISTANCE: f32 = 1_000_000.0;
