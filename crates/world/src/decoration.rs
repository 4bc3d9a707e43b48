//! Decorative object scattering.
//!
//! Each cell gets a fixed number of placement attempts. An attempt picks a
//! uniform point in the cell footprint, reads the cell's own lattice and keeps
//! the placement only on dry, raised ground.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use terracell_core::{cell_domain, scoped_rng, WorldSeed};

use crate::cell::CellCoord;
use crate::config::TerrainConfig;
use crate::surface::HeightLattice;

/// Kinds of decoration the scatter pass can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Tree,
}

impl DecorationKind {
    /// Name of the model the renderer looks up for this kind.
    pub fn model_name(&self) -> &'static str {
        match self {
            DecorationKind::Tree => "tree",
        }
    }
}

/// A decorative object anchored to a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    /// What to draw.
    pub kind: DecorationKind,
    /// Base position in cell-local coordinates (y is the ground height).
    pub position: Vec3,
    /// Per-axis scale added to every model part's own scale.
    pub scale: Vec3,
    /// Rotation around the vertical axis in radians.
    pub rotation: f32,
}

impl Decoration {
    /// Create a unit-scale decoration.
    pub fn new(kind: DecorationKind, position: Vec3, rotation: f32) -> Self {
        Self {
            kind,
            position,
            scale: Vec3::ONE,
            rotation,
        }
    }

    /// Model name used for asset lookup.
    pub fn model_name(&self) -> &'static str {
        self.kind.model_name()
    }
}

/// Scatters decorations over freshly built cells.
#[derive(Debug, Clone)]
pub struct Decorator {
    seed: WorldSeed,
    attempts: u32,
    min_height: f32,
    cell_size: f32,
}

impl Decorator {
    /// Build a decorator from terrain settings.
    pub fn new(seed: WorldSeed, config: &TerrainConfig) -> Self {
        Self {
            seed,
            attempts: config.decorations_per_cell,
            min_height: config.decoration_min_height,
            cell_size: config.cell_size as f32,
        }
    }

    /// Place decorations for `coord` using the cell's own lattice.
    ///
    /// Heights come from the four-corner mean, not from re-evaluating noise.
    /// Attempts that land on low ground are dropped, not retried.
    pub fn decorate(&self, coord: CellCoord, lattice: &HeightLattice) -> Vec<Decoration> {
        let mut rng = scoped_rng(self.seed, cell_domain(coord.x, coord.z));
        let mut placed = Vec::new();

        for _ in 0..self.attempts {
            let local_x = rng.gen_range(0.0..self.cell_size);
            let local_z = rng.gen_range(0.0..self.cell_size);
            let rotation = rng.gen_range(0.0..TAU);

            let height = lattice.corner_mean(local_x, local_z);
            if height < self.min_height {
                continue;
            }

            placed.push(Decoration::new(
                DecorationKind::Tree,
                Vec3::new(local_x, height, local_z),
                rotation,
            ));
        }

        placed
    }
}
