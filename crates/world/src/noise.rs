//! Coherent gradient noise for terrain generation.
//!
//! A seeded gradient noise field: every integer lattice point carries a unit
//! gradient derived from a bit-mixing hash, and samples between lattice points
//! blend the four corner contributions with plain linear weights.

use std::f64::consts::PI;

use noise::NoiseFn;
use terracell_core::WorldSeed;

/// Half the bit width of the hash state, used as the rotation amount.
const ROTATE: u32 = u32::BITS / 2;

/// Deterministic 2D gradient noise parameterized by a seed.
///
/// Pure function of `(x, y, seed)`; holds no mutable state, so a single
/// instance can be shared freely between readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientNoise {
    seed: u32,
}

impl GradientNoise {
    /// Create a noise field for the given seed.
    pub const fn new(seed: WorldSeed) -> Self {
        Self { seed: seed.0 }
    }

    /// Seed this field was built with.
    pub fn seed(&self) -> WorldSeed {
        WorldSeed(self.seed)
    }

    /// Sample the field at `(x, y)`.
    ///
    /// Returns a value of roughly [-1.0, 1.0]; the field is zero at every
    /// integer lattice point.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let x1 = x0.wrapping_add(1);
        let y1 = y0.wrapping_add(1);

        let sx = x - f64::from(x0);
        let sy = y - f64::from(y0);

        let n0 = self.dot_grid_gradient(x0, y0, x, y);
        let n1 = self.dot_grid_gradient(x1, y0, x, y);
        let ix0 = lerp(n0, n1, sx);

        let n0 = self.dot_grid_gradient(x0, y1, x, y);
        let n1 = self.dot_grid_gradient(x1, y1, x, y);
        let ix1 = lerp(n0, n1, sx);

        lerp(ix0, ix1, sy)
    }

    /// Unit gradient vector assigned to lattice point `(ix, iy)`.
    pub fn gradient(&self, ix: i32, iy: i32) -> (f64, f64) {
        let angle = lattice_angle(ix, iy, self.seed);
        (angle.cos(), angle.sin())
    }

    fn dot_grid_gradient(&self, ix: i32, iy: i32, x: f64, y: f64) -> f64 {
        let (gx, gy) = self.gradient(ix, iy);
        let dx = x - f64::from(ix);
        let dy = y - f64::from(iy);
        dx * gx + dy * gy
    }
}

impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

/// Free-function form of [`GradientNoise::sample`].
pub fn gradient_noise(x: f64, y: f64, seed: WorldSeed) -> f64 {
    GradientNoise::new(seed).sample(x, y)
}

/// Multiply-xor-rotate hash of a lattice point, mapped to an angle in [0, 2π).
fn lattice_angle(ix: i32, iy: i32, seed: u32) -> f64 {
    let mut a = (ix as u32) ^ seed;
    let mut b = (iy as u32) ^ seed.rotate_left(ROTATE);

    a = a.wrapping_mul(3_284_157_443);
    b ^= a.rotate_left(ROTATE);
    b = b.wrapping_mul(1_911_520_717);
    a ^= b.rotate_left(ROTATE);
    a = a.wrapping_mul(2_048_419_325);

    // `a / 2^31 * π` spans [0, 2π)
    f64::from(a) * (PI / f64::from(1u32 << 31))
}

#[inline]
fn lerp(a: f64, b: f64, w: f64) -> f64 {
    a + w * (b - a)
}
