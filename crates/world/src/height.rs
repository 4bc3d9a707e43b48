//! Noise-to-elevation shaping.

use serde::{Deserialize, Serialize};

/// Default steepening factor applied to squared noise.
pub const DEFAULT_HEIGHT_SCALE: f32 = 52.0;

/// Default downward shift, leaving a band of terrain below sea level (height 0).
pub const DEFAULT_HEIGHT_OFFSET: f32 = 2.0;

/// Sea level in world units.
pub const SEA_LEVEL: f32 = 0.0;

/// Maps raw noise to world-space elevation: `n * n * scale - offset`.
///
/// Squaring folds valleys and peaks onto the same side, so the profile is
/// flat around zero noise and steep where the field saturates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightTransform {
    /// Multiplier applied to the squared noise value.
    pub scale: f32,
    /// Amount subtracted after scaling.
    pub offset: f32,
}

impl Default for HeightTransform {
    fn default() -> Self {
        Self {
            scale: DEFAULT_HEIGHT_SCALE,
            offset: DEFAULT_HEIGHT_OFFSET,
        }
    }
}

impl HeightTransform {
    /// Create a transform with explicit constants.
    pub const fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }

    /// Convert a noise sample into an elevation.
    #[inline]
    pub fn apply(&self, noise: f64) -> f32 {
        let n = noise as f32;
        n * n * self.scale - self.offset
    }

    /// Lowest elevation this transform can produce (at zero noise).
    pub fn floor(&self) -> f32 {
        -self.offset
    }
}
