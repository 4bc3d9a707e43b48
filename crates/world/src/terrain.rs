//! Terrain façade tying world coordinates to cached cells.
//!
//! The driving loop calls [`Terrain::render`] and [`Terrain::height_at`] once
//! per frame. Both resolve cells by floor division and generate misses
//! synchronously on the calling thread.

use std::sync::Arc;

use glam::Vec3;
use terracell_core::WorldSeed;
use tracing::{info, instrument, warn};

use crate::cell::{resolve_world, CellCoord, CellGenerator, TerrainCell};
use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::storage::{CellStorage, StorageStats};

/// Receives each visible cell during [`Terrain::render`].
pub trait CellVisitor {
    /// Error type surfaced to the caller of [`Terrain::render`].
    type Error;

    /// Draw (or otherwise consume) one cell placed at `origin` in world space.
    fn visit_cell(&mut self, cell: &Arc<TerrainCell>, origin: Vec3) -> Result<(), Self::Error>;
}

/// Procedural terrain with a bounded cell cache.
pub struct Terrain {
    seed: WorldSeed,
    config: TerrainConfig,
    storage: CellStorage,
}

impl Terrain {
    /// Create a terrain for `seed`.
    ///
    /// # Errors
    /// Returns [`TerrainError::InvalidConfig`] if the configuration cannot
    /// drive generation.
    pub fn new(seed: WorldSeed, config: TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        if config.cache_capacity < config.window_cells() {
            warn!(
                capacity = config.cache_capacity,
                window = config.window_cells(),
                "cache capacity is smaller than the render window; cells will be regenerated every frame"
            );
        }
        info!(
            %seed,
            cell_size = config.cell_size,
            render_distance = config.render_distance,
            capacity = config.cache_capacity,
            "terrain initialized"
        );
        let storage = CellStorage::new(
            CellGenerator::new(seed, config.clone()),
            config.cache_capacity,
        );
        Ok(Self {
            seed,
            config,
            storage,
        })
    }

    /// Seed of this terrain.
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Settings this terrain was created with.
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Underlying cell cache.
    pub fn storage(&self) -> &CellStorage {
        &self.storage
    }

    /// Cache counters.
    pub fn stats(&self) -> StorageStats {
        self.storage.stats()
    }

    /// Fetch (or generate) the cell at `(cell_x, cell_z)`.
    pub fn ensure_cell(&mut self, cell_x: i32, cell_z: i32) -> Arc<TerrainCell> {
        self.storage.ensure_cell(CellCoord::new(cell_x, cell_z))
    }

    /// Cell containing the world-space focus point.
    pub fn focus_cell(&self, focus_x: f32, focus_z: f32) -> CellCoord {
        CellCoord::from_world(focus_x, focus_z, self.config.cell_size)
    }

    /// Visit every cell within render distance of the focus point.
    ///
    /// Cells are visited X-major, then Z, each with its world origin
    /// `(cx * cell_size, 0, cz * cell_size)`. Returns the number of cells
    /// visited.
    ///
    /// # Errors
    /// Stops at and returns the first error reported by `visitor`.
    #[instrument(skip(self, visitor), level = "trace")]
    pub fn render<V: CellVisitor>(
        &mut self,
        focus_x: f32,
        focus_z: f32,
        visitor: &mut V,
    ) -> Result<usize, V::Error> {
        let focus = self.focus_cell(focus_x, focus_z);
        let mut visited = 0;
        for coord in focus.cells_in_radius(self.config.render_distance) {
            let cell = self.storage.ensure_cell(coord);
            visitor.visit_cell(&cell, coord.origin(self.config.cell_size))?;
            visited += 1;
        }
        Ok(visited)
    }

    /// Terrain height at a world position.
    ///
    /// # Errors
    /// Returns [`TerrainError::HeightOutOfRange`] only if coordinate
    /// resolution and the cell footprint disagree.
    pub fn height_at(&mut self, world_x: f32, world_z: f32) -> Result<f32, TerrainError> {
        let (coord, local_x, local_z) = resolve_world(world_x, world_z, self.config.cell_size);
        let cell = self.storage.ensure_cell(coord);
        cell.height_at_local(local_x, local_z)
    }
}
