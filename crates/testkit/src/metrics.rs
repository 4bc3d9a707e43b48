//! Metrics collection and reporting for CI runs.
//!
//! Reports are exported as JSON so terrain generation throughput, cache
//! behaviour and draw volume can be compared between commits.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Top-level metrics report.
///
/// This is the format of the metrics.json files exported by tests and the
/// headless binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test/run identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (ISO 8601)
    pub timestamp: String,

    /// Seed the run was generated with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,

    /// Overall test result
    pub result: TestResult,

    /// Terrain generation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainMetrics>,

    /// Rendering metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering: Option<RenderMetrics>,

    /// Test execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// Run passed all validations
    Pass,
    /// Run failed
    Fail,
}

/// Terrain generation performance and cache metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerrainMetrics {
    /// Total cells generated (including regenerations after eviction)
    pub cells_generated: u64,

    /// Cells evicted from the cache
    pub cells_evicted: u64,

    /// Lookups served from the cache
    pub cache_hits: u64,

    /// Average generation time per cell (microseconds)
    pub avg_gen_time_us: f64,

    /// Min generation time (microseconds)
    pub min_gen_time_us: u128,

    /// Max generation time (microseconds)
    pub max_gen_time_us: u128,

    /// Lowest lattice height observed
    pub min_height: f32,

    /// Highest lattice height observed
    pub max_height: f32,

    /// Cell seam validation results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seam_validation: Option<SeamValidation>,
}

/// Cell boundary seam validation metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeamValidation {
    /// Total shared edges checked
    pub total_seams: usize,

    /// Seams whose shared lattice values matched exactly
    pub seams_valid: usize,

    /// Seams with at least one mismatching value
    pub seams_failed: usize,
}

impl SeamValidation {
    /// Build from a count of checked seams and how many of them differed.
    pub fn from_counts(total_seams: usize, seams_failed: usize) -> Self {
        Self {
            total_seams,
            seams_valid: total_seams.saturating_sub(seams_failed),
            seams_failed,
        }
    }

    /// True when every checked seam matched.
    pub fn passed(&self) -> bool {
        self.seams_failed == 0
    }
}

/// Rendering metrics collected from a recording backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMetrics {
    /// Frames rendered
    pub frames: u64,

    /// Cell meshes drawn across all frames
    pub cells_drawn: usize,

    /// Decoration parts drawn across all frames
    pub parts_drawn: usize,

    /// Meshes uploaded to the backend
    pub meshes_uploaded: usize,

    /// Total triangles submitted
    pub total_triangles: usize,

    /// Mesh upload cache hit rate (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit_rate: Option<f64>,
}

/// Test execution metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total duration (seconds)
    pub duration_seconds: f64,

    /// Number of assertions checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_checked: Option<usize>,

    /// Number of validations passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations_passed: Option<usize>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with test name
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                seed: None,
                result: TestResult::Pass,
                terrain: None,
                rendering: None,
                test_execution: TestExecutionMetrics::default(),
            },
        }
    }

    /// Set test result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set the terrain seed
    pub fn seed(mut self, seed: u32) -> Self {
        self.report.seed = Some(seed);
        self
    }

    /// Set terrain metrics
    pub fn terrain(mut self, metrics: TerrainMetrics) -> Self {
        self.report.terrain = Some(metrics);
        self
    }

    /// Set render metrics
    pub fn rendering(mut self, metrics: RenderMetrics) -> Self {
        self.report.rendering = Some(metrics);
        self
    }

    /// Set test execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: std::path::PathBuf,
}

impl MetricsSink {
    /// Create a new metrics sink at the specified path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { path })
    }

    /// Write metrics report to file
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
