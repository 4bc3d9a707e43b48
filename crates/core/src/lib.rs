#![warn(missing_docs)]
//! Core primitives shared across the workspace.

use std::fmt;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seed driving every noise sample of one terrain instance.
///
/// The seed is fixed for the lifetime of a terrain: the same seed always
/// reproduces the same surface, decorations included.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorldSeed(pub u32);

impl WorldSeed {
    /// Seed used by the demo world.
    pub const DEMO: Self = Self(3284);

    /// Raw 32-bit value fed into the noise hash.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for WorldSeed {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for WorldSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame counter for the driving loop (one terrain render per frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameTick(pub u64);

impl FrameTick {
    /// First frame of any run.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` frames.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

/// Mix two signed cell coordinates into a 64-bit domain value for [`scoped_rng`].
pub fn cell_domain(cell_x: i32, cell_z: i32) -> u64 {
    let x = cell_x as u32 as u64;
    let z = cell_z as u32 as u64;
    (x << 32 | z).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Helper to derive a reproducible RNG seeded by world + domain.
pub fn scoped_rng(world_seed: WorldSeed, domain: u64) -> StdRng {
    let seed = (world_seed.0 as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93) ^ domain;
    StdRng::seed_from_u64(seed)
}
