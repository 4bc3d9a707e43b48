//! Procedural terrain: gradient noise, per-cell height lattices and meshes,
//! decoration scatter and an LRU-bounded cell cache.

mod cell;
mod config;
mod decoration;
mod error;
mod height;
mod noise;
mod storage;
mod surface;
mod terrain;

pub use self::noise::*;
pub use cell::*;
pub use config::*;
pub use decoration::*;
pub use error::*;
pub use height::*;
pub use storage::*;
pub use surface::*;
pub use terrain::*;
