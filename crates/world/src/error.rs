use thiserror::Error;

use crate::cell::CellCoord;

/// Errors raised by terrain queries and configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    /// A height query landed outside the footprint of the cell it was sent to.
    ///
    /// This is a coordinate-resolution bug in the caller; it is never clamped.
    #[error(
        "height query at world ({world_x}, {world_z}) is outside cell {cell} \
         (local ({local_x}, {local_z}), cell size {cell_size})"
    )]
    HeightOutOfRange {
        /// World X of the query.
        world_x: f32,
        /// World Z of the query.
        world_z: f32,
        /// Cell-local X the query resolved to.
        local_x: f32,
        /// Cell-local Z the query resolved to.
        local_z: f32,
        /// Cell that received the query.
        cell: CellCoord,
        /// Edge length of the cell in world units.
        cell_size: u32,
    },
    /// A configuration value cannot drive generation.
    #[error("invalid terrain config: {0}")]
    InvalidConfig(String),
}
