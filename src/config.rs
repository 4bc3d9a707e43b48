use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use terracell_core::WorldSeed;
use terracell_world::TerrainConfig;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/terrain.toml";

/// Everything a run reads from `config/terrain.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TerracellConfig {
    pub seed: WorldSeed,
    pub terrain: TerrainConfig,
    pub flythrough: FlythroughConfig,
}

impl Default for TerracellConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::DEMO,
            terrain: TerrainConfig::default(),
            flythrough: FlythroughConfig::default(),
        }
    }
}

/// Scripted camera path used by the headless driver.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlythroughConfig {
    /// Starting (x, z) position.
    pub start: [f32; 2],
    /// Walking speed in world units per second.
    pub speed: f32,
    /// Yaw change in radians per second.
    pub turn_rate: f32,
    /// Camera height above the ground (or the water surface).
    pub eye_height: f32,
    /// Simulated seconds per frame.
    pub frame_seconds: f32,
    /// Viewport aspect ratio.
    pub aspect: f32,
}

impl Default for FlythroughConfig {
    fn default() -> Self {
        Self {
            start: [25.0, 25.0],
            speed: 5.0,
            turn_rate: 0.15,
            eye_height: 2.0,
            frame_seconds: 1.0 / 60.0,
            aspect: 600.0 / 500.0,
        }
    }
}

impl TerracellConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<TerracellConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    TerracellConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Terrain config not found at {}. Using defaults",
                        path.display()
                    );
                }
                TerracellConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
