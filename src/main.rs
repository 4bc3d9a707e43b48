//! terracell - procedural cell-based terrain
//!
//! Headless driver: flies a camera over the terrain, renders every frame into
//! the recording backend and writes event/metric artifacts.

mod config;
mod flythrough;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use config::{TerracellConfig, DEFAULT_CONFIG_PATH};
use terracell_core::WorldSeed;
use terracell_render::write_metrics_to_file;
use terracell_testkit::{
    JsonlSink, MetricsReportBuilder, MetricsSink, TestExecutionMetrics, TestResult,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "terracell", version, about = "Procedural terrain flythrough")]
struct Args {
    /// Terrain seed (overrides the config file).
    #[arg(long)]
    seed: Option<u32>,

    /// Path to the TOML configuration.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Walking speed in world units per second (overrides the config file).
    #[arg(long)]
    speed: Option<f32>,

    /// Write a JSON metrics report here.
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Write per-cell mesh metrics (triangles + hash) here.
    #[arg(long)]
    mesh_metrics: Option<PathBuf>,

    /// Write one JSONL event per frame here.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Save the effective configuration to this path before running.
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // INFO by default; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting terracell v{}", env!("CARGO_PKG_VERSION"));
    let args = Args::parse();

    let mut config = TerracellConfig::load_from_path(&args.config);
    if let Some(seed) = args.seed {
        config.seed = WorldSeed(seed);
    }
    if let Some(speed) = args.speed {
        config.flythrough.speed = speed;
    }
    if let Some(path) = &args.write_config {
        config
            .save_to_path(path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        info!(path = %path.display(), "wrote effective config");
    }

    let mut events = match &args.events {
        Some(path) => Some(JsonlSink::create(path)?),
        None => None,
    };
    let summary = flythrough::run(&config, args.frames, events.as_mut())?;

    if let Some(path) = &args.mesh_metrics {
        write_metrics_to_file(&summary.meshes, path)
            .with_context(|| format!("Failed to write mesh metrics to {}", path.display()))?;
    }
    if let Some(path) = &args.metrics {
        let result = match &summary.terrain.seam_validation {
            Some(seams) if !seams.passed() => TestResult::Fail,
            _ => TestResult::Pass,
        };
        let report = MetricsReportBuilder::new("flythrough")
            .result(result)
            .seed(config.seed.get())
            .terrain(summary.terrain.clone())
            .rendering(summary.rendering.clone())
            .execution(TestExecutionMetrics {
                duration_seconds: summary.duration_seconds,
                assertions_checked: None,
                validations_passed: None,
            })
            .build();
        MetricsSink::create(path)?
            .write(&report)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    println!(
        "frames={} cells_generated={} cells_evicted={} cache_hits={} position=({:.2}, {:.2}, {:.2})",
        summary.frames,
        summary.storage.generated,
        summary.storage.evicted,
        summary.storage.hits,
        summary.final_position.x,
        summary.final_position.y,
        summary.final_position.z,
    );
    Ok(())
}
