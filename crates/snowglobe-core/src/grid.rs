//! Dense distance-field sampling
//!
//! Uses Rayon to evaluate every voxel of a cubic grid in parallel.

use std::time::Instant;

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use snowglobe_math::FAR_DISTANCE;

use crate::aabb::Aabb;
use crate::error::{Error, Result};
use crate::eval::map;
use crate::flatten::FlatScene;
use crate::scene::Scene;

/// Configuration for dense grid generation
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Voxels along each axis
    pub resolution: u32,
    /// Region covered by the grid; voxels sample at their centers
    pub bounds: Aabb,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            bounds: Aabb::unit(),
        }
    }
}

impl GridConfig {
    pub fn new(resolution: u32) -> Self {
        Self::default().with_resolution(resolution)
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(Error::InvalidParameter(
                "grid resolution must be at least 1".into(),
            ));
        }
        if !self.bounds.size().cmpgt(Vec3::ZERO).all() {
            return Err(Error::InvalidParameter(format!(
                "grid bounds must have positive size, got {:?}",
                self.bounds.size()
            )));
        }
        Ok(())
    }

    /// Total voxel count, `resolution³`
    pub fn voxel_count(&self) -> usize {
        let n = self.resolution as usize;
        n * n * n
    }

    /// Center of voxel `(x, y, z)`
    pub fn sample_point(&self, x: u32, y: u32, z: u32) -> Vec3 {
        let cell = Vec3::new(x as f32, y as f32, z as f32) + 0.5;
        self.bounds.min + cell / self.resolution as f32 * self.bounds.size()
    }

    /// Voxel coordinates of flat index `i`, inverse of `z*N² + y*N + x`
    pub fn coords(&self, i: usize) -> (u32, u32, u32) {
        let n = self.resolution as usize;
        let slab = n * n;
        ((i % n) as u32, ((i % slab) / n) as u32, (i / slab) as u32)
    }
}

/// A cubic grid of signed distances, x fastest, then y, then z
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseGrid {
    resolution: u32,
    values: Vec<f32>,
}

impl DenseGrid {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let n = self.resolution as usize;
        (z as usize * n + y as usize) * n + x as usize
    }

    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<f32> {
        if x >= self.resolution || y >= self.resolution || z >= self.resolution {
            return None;
        }
        self.values.get(self.index(x, y, z)).copied()
    }

    /// Raw native-endian `f32` bytes, ready for a 3D texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }
}

/// Sample `scene` at the center of every voxel described by `config`.
///
/// A scene without shapes is not evaluated; every voxel is
/// [`FAR_DISTANCE`].
pub fn generate_dense_grid(scene: &FlatScene, config: &GridConfig) -> Result<DenseGrid> {
    config.validate()?;

    let start = Instant::now();
    let total = config.voxel_count();

    let values = if scene.is_empty() {
        vec![FAR_DISTANCE; total]
    } else {
        (0..total)
            .into_par_iter()
            .map(|i| {
                let (x, y, z) = config.coords(i);
                map(config.sample_point(x, y, z), scene)
            })
            .collect()
    };

    tracing::info!(
        "Generated {}³ grid from {} nodes in {:.1?}",
        config.resolution,
        scene.len(),
        start.elapsed()
    );

    Ok(DenseGrid {
        resolution: config.resolution,
        values,
    })
}

impl FlatScene {
    pub fn to_dense_grid(&self, config: &GridConfig) -> Result<DenseGrid> {
        generate_dense_grid(self, config)
    }
}

impl Scene {
    /// Flatten once and sample an `n³` grid over the centered unit cube
    pub fn generate_dense_grid(&self, resolution: u32) -> Result<DenseGrid> {
        self.flatten()?.to_dense_grid(&GridConfig::new(resolution))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeParams};
    use approx::assert_relative_eq;

    #[test]
    fn zero_resolution_is_rejected() {
        let scene = Scene::demo();
        assert!(matches!(
            scene.generate_dense_grid(0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn flat_bounds_are_rejected() {
        let config = GridConfig::new(4).with_bounds(Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)));
        assert!(config.validate().is_err());
    }

    #[test]
    fn sample_points_are_voxel_centers() {
        let config = GridConfig::new(2);
        assert_eq!(config.sample_point(0, 0, 0), Vec3::splat(-0.25));
        assert_eq!(config.sample_point(1, 0, 1), Vec3::new(0.25, -0.25, 0.25));

        let config = GridConfig::new(4).with_bounds(Aabb::cube(2.0));
        assert_eq!(config.sample_point(3, 3, 3), Vec3::splat(1.5));
    }

    #[test]
    fn coords_invert_index() {
        let config = GridConfig::new(5);
        let grid = DenseGrid {
            resolution: 5,
            values: vec![0.0; 125],
        };
        for i in [0, 1, 4, 5, 24, 25, 63, 124] {
            let (x, y, z) = config.coords(i);
            assert_eq!(grid.index(x, y, z), i);
        }
    }

    #[test]
    fn empty_scene_fills_with_sentinel() {
        for n in [1, 2, 7] {
            let grid = Scene::new().generate_dense_grid(n).unwrap();
            assert_eq!(grid.len(), (n * n * n) as usize);
            assert!(grid.values().iter().all(|&d| d == FAR_DISTANCE));
        }
    }

    #[test]
    fn single_voxel_samples_center() {
        let mut scene = Scene::new();
        scene.add_child(NodeKind::Sphere);
        let grid = scene.generate_dense_grid(1).unwrap();
        assert_relative_eq!(grid.values()[0], -0.5, epsilon = 1e-6);
    }

    #[test]
    fn grid_matches_pointwise_evaluation() {
        let scene = Scene::demo();
        let flat = scene.flatten().unwrap();
        let config = GridConfig::new(6);
        let grid = flat.to_dense_grid(&config).unwrap();

        for z in 0..6 {
            for y in 0..6 {
                for x in 0..6 {
                    let expected = map(config.sample_point(x, y, z), &flat);
                    assert_eq!(grid.get(x, y, z), Some(expected));
                }
            }
        }
        assert_eq!(grid.get(6, 0, 0), None);
    }

    #[test]
    fn generation_is_deterministic() {
        let scene = Scene::demo();
        let a = scene.generate_dense_grid(12).unwrap();
        let b = scene.generate_dense_grid(12).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn bytes_cover_every_voxel() {
        let mut scene = Scene::new();
        scene.add_child_with(NodeKind::Box, NodeParams::default());
        let grid = scene.generate_dense_grid(3).unwrap();
        assert_eq!(grid.as_bytes().len(), 27 * 4);
    }
}
