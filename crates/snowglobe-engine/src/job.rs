//! Off-thread grid regeneration
//!
//! A [`GridJob`] owns a flattened snapshot and samples it on a worker
//! thread. The result is published through a shared slot so the owning
//! thread can poll for it without blocking.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use snowglobe_core::{DenseGrid, FlatScene, GridConfig, SceneObject};
use thiserror::Error;

/// Everything a regeneration produces
#[derive(Debug, Clone)]
pub struct Generated {
    pub flat: FlatScene,
    pub grid: DenseGrid,
    pub objects: Vec<SceneObject>,
}

impl Generated {
    /// Sample `flat` on the current thread
    pub fn build(flat: FlatScene, config: &GridConfig) -> snowglobe_core::Result<Self> {
        let grid = flat.to_dense_grid(config)?;
        let objects = flat.objects();
        Ok(Self {
            flat,
            grid,
            objects,
        })
    }
}

/// Errors from the worker thread
#[derive(Error, Debug)]
pub enum JobError {
    /// The worker stopped without publishing a result
    #[error("Grid worker panicked")]
    WorkerPanicked,

    /// Sampling failed on the worker
    #[error("Grid generation failed: {0}")]
    Generation(#[from] snowglobe_core::Error),
}

type Slot = Arc<Mutex<Option<Result<Generated, JobError>>>>;

/// A grid generation running on its own thread
pub struct GridJob {
    slot: Slot,
    handle: JoinHandle<()>,
}

impl GridJob {
    /// Start sampling `flat` on a new worker thread
    pub fn spawn(flat: FlatScene, config: GridConfig) -> Result<Self> {
        let slot: Slot = Arc::new(Mutex::new(None));
        let worker_slot = slot.clone();

        let handle = thread::Builder::new()
            .name("snowglobe-grid".into())
            .spawn(move || {
                let result = Generated::build(flat, &config).map_err(JobError::from);
                *worker_slot.lock() = Some(result);
            })
            .context("Failed to spawn grid worker")?;

        Ok(Self { slot, handle })
    }

    /// Whether the worker has stopped, with or without a result
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Take the result if the worker is done. Returns `None` while it is
    /// still running; the job should be dropped once this yields.
    pub fn try_take(&self) -> Option<Result<Generated, JobError>> {
        // Read before the slot: a finished worker has already published
        let finished = self.is_finished();
        if let Some(result) = self.slot.lock().take() {
            return Some(result);
        }
        finished.then_some(Err(JobError::WorkerPanicked))
    }

    /// Block until the worker is done
    pub fn wait(self) -> Result<Generated, JobError> {
        self.handle.join().map_err(|_| JobError::WorkerPanicked)?;
        self.slot.lock().take().unwrap_or(Err(JobError::WorkerPanicked))
    }
}

impl std::fmt::Debug for GridJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridJob")
            .field("finished", &self.is_finished())
            .finish()
    }
}
