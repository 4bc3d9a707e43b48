//! Generation and caching parameters for one terrain instance.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::height::{HeightTransform, DEFAULT_HEIGHT_OFFSET, DEFAULT_HEIGHT_SCALE};

/// Divisor applied to world coordinates before sampling noise.
pub const DEFAULT_NOISE_DIVISOR: f64 = 18.45231;

/// Largest accepted render distance, in cells.
pub const MAX_RENDER_DISTANCE: u32 = 1024;

/// Tunables shared by every cell of a terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Edge length of a cell in world units.
    pub cell_size: u32,
    /// Lattice points per world unit along each axis.
    pub resolution: u32,
    /// Radius (in cells) of the square window kept around the focus point.
    pub render_distance: u32,
    /// Maximum number of resident cells before LRU eviction kicks in.
    pub cache_capacity: usize,
    /// World coordinates are divided by this before sampling noise.
    pub noise_divisor: f64,
    /// Multiplier `K` of the height transform.
    pub height_scale: f32,
    /// Offset `C` of the height transform.
    pub height_offset: f32,
    /// Decoration placement attempts per cell.
    pub decorations_per_cell: u32,
    /// Decorations are skipped below this elevation.
    pub decoration_min_height: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cell_size: 10,
            resolution: 1,
            render_distance: 10,
            // (2 * 10 + 1)^2 = 441 cells are visible at once; keep them all resident.
            cache_capacity: 512,
            noise_divisor: DEFAULT_NOISE_DIVISOR,
            height_scale: DEFAULT_HEIGHT_SCALE,
            height_offset: DEFAULT_HEIGHT_OFFSET,
            decorations_per_cell: 2,
            decoration_min_height: 1.0,
        }
    }
}

impl TerrainConfig {
    /// Lattice quads along one cell edge.
    pub fn points_per_cell(&self) -> usize {
        (self.cell_size * self.resolution) as usize
    }

    /// Distance between neighbouring lattice points in world units.
    pub fn lattice_spacing(&self) -> f32 {
        1.0 / self.resolution as f32
    }

    /// Number of vertices in one cell mesh (two triangles per quad).
    pub fn vertices_per_cell(&self) -> usize {
        let n = self.points_per_cell();
        n * n * 6
    }

    /// Number of cells in the render window around the focus cell.
    pub fn window_cells(&self) -> usize {
        let side = 2 * self.render_distance as usize + 1;
        side * side
    }

    /// Height transform built from the configured constants.
    pub fn height_transform(&self) -> HeightTransform {
        HeightTransform::new(self.height_scale, self.height_offset)
    }

    /// Reject values that would make generation degenerate.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.cell_size == 0 {
            return Err(TerrainError::InvalidConfig("cell_size must be > 0".into()));
        }
        if self.resolution == 0 {
            return Err(TerrainError::InvalidConfig("resolution must be > 0".into()));
        }
        if self.cache_capacity == 0 {
            return Err(TerrainError::InvalidConfig(
                "cache_capacity must be > 0".into(),
            ));
        }
        if !(self.noise_divisor.is_finite() && self.noise_divisor > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "noise_divisor must be positive, got {}",
                self.noise_divisor
            )));
        }
        if self.render_distance > MAX_RENDER_DISTANCE {
            return Err(TerrainError::InvalidConfig(format!(
                "render_distance must be <= {MAX_RENDER_DISTANCE}, got {}",
                self.render_distance
            )));
        }
        if self.cell_size.checked_mul(self.resolution).is_none() {
            return Err(TerrainError::InvalidConfig(
                "cell_size * resolution overflows".into(),
            ));
        }
        Ok(())
    }
}
