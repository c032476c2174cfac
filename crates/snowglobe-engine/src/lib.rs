//! Snowglobe Engine - host-side runtime around the scene tree
//!
//! The Engine owns a [`Scene`] and the most recent artifacts generated from
//! it: the dense distance grid and the bounding-box list. Edits go through
//! [`Engine::scene_mut`] and set the scene's dirty flag; the host then calls
//! [`Engine::refresh`] (blocking) or [`Engine::refresh_in_background`] plus
//! [`Engine::poll`] to bring the artifacts up to date. Until a background
//! job lands, the previous artifacts stay valid.
//!
//! ## Example
//!
//! ```
//! use snowglobe_engine::{Engine, EngineConfig};
//! use snowglobe_core::NodeKind;
//!
//! let mut engine = Engine::new(EngineConfig::default().with_resolution(16));
//! engine.refresh()?;
//! assert_eq!(engine.grid().map(|g| g.len()), Some(16 * 16 * 16));
//!
//! engine.scene_mut().add_child(NodeKind::Sphere);
//! assert!(engine.refresh()?);
//! assert!(!engine.refresh()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod export;
pub mod job;

use anyhow::{Context, Result};
use glam::Vec3;
use snowglobe_core::{Aabb, DenseGrid, GridConfig, Scene, SceneObject};
use tracing::{debug, info};

pub use export::{ExportFormat, ExportOptions, ExportResult, export_grid, export_objects};
pub use job::{Generated, GridJob, JobError};

/// Configuration for artifact generation
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Voxels along each grid axis
    pub resolution: u32,
    /// Region covered by the grid
    pub bounds: Aabb,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: 100,
            bounds: Aabb::unit(),
        }
    }
}

impl EngineConfig {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn grid_config(&self) -> GridConfig {
        GridConfig::new(self.resolution).with_bounds(self.bounds)
    }
}

/// The main Snowglobe engine
///
/// Provides a unified interface for:
/// - Scene access and editing
/// - Synchronous and background regeneration
/// - Access to the last generated grid and objects
/// - Point queries against the last generated snapshot
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    scene: Scene,
    current: Option<Generated>,
    job: Option<GridJob>,
}

impl Engine {
    /// Create an engine holding the demo scene
    pub fn new(config: EngineConfig) -> Self {
        Self::with_scene(config, Scene::demo())
    }

    /// Create an engine around an existing scene
    pub fn with_scene(config: EngineConfig, scene: Scene) -> Self {
        Self {
            config,
            scene,
            current: None,
            job: None,
        }
    }

    // ========================================================================
    // Scene Access
    // ========================================================================

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access for edits. Mutations mark the scene dirty.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Replace the scene; it will be regenerated on the next refresh
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.scene.mark_dirty();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Change the grid resolution and schedule a regeneration
    pub fn set_resolution(&mut self, resolution: u32) {
        if self.config.resolution != resolution {
            self.config.resolution = resolution;
            self.scene.mark_dirty();
        }
    }

    // ========================================================================
    // Regeneration
    // ========================================================================

    /// Regenerate the grid and objects on this thread if the scene is dirty.
    ///
    /// Returns `Ok(true)` if new artifacts were installed. Any background job
    /// in flight is abandoned, since its snapshot is older. The abandoned
    /// worker is detached rather than joined: it still runs to completion on
    /// the shared rayon pool and its result is discarded.
    pub fn refresh(&mut self) -> Result<bool> {
        if !self.scene.is_dirty() {
            return Ok(false);
        }
        if self.job.take().is_some() {
            debug!("Abandoning background grid job");
        }

        let flat = self.scene.flatten().context("Failed to flatten scene")?;
        let generated = Generated::build(flat, &self.config.grid_config())
            .context("Failed to generate grid")?;

        self.install(generated);
        self.scene.clear_dirty();
        Ok(true)
    }

    /// Start regenerating on a worker thread if the scene is dirty.
    ///
    /// The tree is flattened here, so the scene may be edited while the
    /// worker runs. Only one job runs at a time: while one is in flight this
    /// does nothing and the scene stays dirty. Returns `Ok(true)` if a job
    /// was started.
    pub fn refresh_in_background(&mut self) -> Result<bool> {
        if self.job.is_some() || !self.scene.is_dirty() {
            return Ok(false);
        }

        let config = self.config.grid_config();
        config.validate()?;
        let flat = self.scene.flatten().context("Failed to flatten scene")?;

        self.job = Some(GridJob::spawn(flat, config)?);
        self.scene.clear_dirty();
        debug!("Started background grid job");
        Ok(true)
    }

    /// Install the background job's result if it has finished.
    ///
    /// Returns `Ok(true)` if new artifacts were installed. A failed job is
    /// reported once and the scene is marked dirty again.
    pub fn poll(&mut self) -> Result<bool> {
        let Some(result) = self.job.as_ref().and_then(GridJob::try_take) else {
            return Ok(false);
        };
        self.job = None;

        match result {
            Ok(generated) => {
                self.install(generated);
                Ok(true)
            }
            Err(e) => {
                self.scene.mark_dirty();
                Err(e).context("Background grid job failed")
            }
        }
    }

    /// Block until the background job (if any) has landed
    pub fn wait(&mut self) -> Result<bool> {
        let Some(job) = self.job.take() else {
            return Ok(false);
        };
        match job.wait() {
            Ok(generated) => {
                self.install(generated);
                Ok(true)
            }
            Err(e) => {
                self.scene.mark_dirty();
                Err(e).context("Background grid job failed")
            }
        }
    }

    /// Whether a background job is in flight
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    fn install(&mut self, generated: Generated) {
        info!(
            "Installed {}³ grid and {} objects",
            generated.grid.resolution(),
            generated.objects.len()
        );
        self.current = Some(generated);
    }

    // ========================================================================
    // Artifacts
    // ========================================================================

    /// The last generated grid, if any
    pub fn grid(&self) -> Option<&DenseGrid> {
        self.current.as_ref().map(|g| &g.grid)
    }

    /// The last generated bounding boxes; empty before the first refresh
    pub fn objects(&self) -> &[SceneObject] {
        self.current
            .as_ref()
            .map(|g| g.objects.as_slice())
            .unwrap_or(&[])
    }

    /// Signed distance at `p` on the last generated snapshot
    pub fn distance(&self, p: Vec3) -> Option<f32> {
        self.current.as_ref().map(|g| g.flat.distance(p))
    }

    /// Write the current grid
    pub fn export_grid(&self, options: &ExportOptions) -> Result<ExportResult> {
        let grid = self
            .grid()
            .ok_or_else(|| anyhow::anyhow!("No grid generated"))?;
        export::export_grid(grid, options)
    }

    /// Write the current bounding boxes
    pub fn export_objects(&self, options: &ExportOptions) -> Result<ExportResult> {
        if self.current.is_none() {
            anyhow::bail!("No objects generated");
        }
        export::export_objects(self.objects(), options)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use snowglobe_core::{FAR_DISTANCE, NodeKind};

    fn small() -> EngineConfig {
        EngineConfig::default().with_resolution(8)
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(small());
        assert!(engine.scene().is_dirty());
        assert!(engine.grid().is_none());
        assert!(engine.objects().is_empty());
        assert_eq!(engine.distance(Vec3::ZERO), None);
        assert_eq!(Engine::default().config().resolution, 100);
    }

    #[test]
    fn test_refresh_consumes_dirty_flag() {
        let mut engine = Engine::new(small());
        assert!(engine.refresh().unwrap());
        assert!(!engine.scene().is_dirty());
        assert!(!engine.refresh().unwrap());

        assert_eq!(engine.grid().unwrap().len(), 512);
        assert_eq!(engine.objects().len(), engine.scene().node_count());
    }

    #[test]
    fn test_distance_uses_installed_snapshot() {
        let mut engine = Engine::with_scene(small(), Scene::new());
        engine.refresh().unwrap();
        assert_eq!(engine.distance(Vec3::ZERO), Some(FAR_DISTANCE));

        // Edits are not visible until the next refresh
        engine.scene_mut().add_child(NodeKind::Sphere);
        assert_eq!(engine.distance(Vec3::ZERO), Some(FAR_DISTANCE));

        engine.refresh().unwrap();
        assert_relative_eq!(engine.distance(Vec3::ZERO).unwrap(), -0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_background_refresh() {
        let mut engine = Engine::new(small());
        assert!(engine.refresh_in_background().unwrap());
        assert!(engine.is_busy());
        assert!(!engine.scene().is_dirty());

        // A second request while busy is deferred
        engine.scene_mut().add_child(NodeKind::Box);
        assert!(!engine.refresh_in_background().unwrap());
        assert!(engine.scene().is_dirty());

        assert!(engine.wait().unwrap());
        assert!(!engine.is_busy());
        assert!(engine.grid().is_some());

        // The deferred edit is picked up by the next job
        assert!(engine.refresh_in_background().unwrap());
        let installed = loop {
            if engine.poll().unwrap() {
                break true;
            }
            std::thread::yield_now();
        };
        assert!(installed);
        assert_eq!(engine.objects().len(), engine.scene().node_count());
    }

    #[test]
    fn test_refresh_abandons_background_job() {
        let mut engine = Engine::new(small());
        engine.refresh_in_background().unwrap();
        engine.scene_mut().add_child(NodeKind::Sphere);

        assert!(engine.refresh().unwrap());
        assert!(!engine.is_busy());
        assert!(!engine.poll().unwrap());
        assert_eq!(engine.objects().len(), engine.scene().node_count());
    }

    #[test]
    fn test_invalid_resolution_keeps_previous_grid() {
        let mut engine = Engine::new(small());
        engine.refresh().unwrap();

        engine.set_resolution(0);
        assert!(engine.refresh().is_err());
        assert!(engine.refresh_in_background().is_err());
        assert!(engine.scene().is_dirty());
        assert_eq!(engine.grid().unwrap().resolution(), 8);
    }

    #[test]
    fn test_export_requires_generation() {
        let engine = Engine::new(small());
        assert!(engine.export_grid(&ExportOptions::new("unused.bin")).is_err());
        assert!(engine.export_objects(&ExportOptions::new("unused.json")).is_err());
    }
}
