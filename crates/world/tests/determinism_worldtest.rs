//! Determinism and cache worldtest
//!
//! Drives the terrain façade the way the frame loop does and checks that:
//! - Same seed produces identical cells in any generation order
//! - Cache hits return the same shared cell until it is evicted
//! - Evicted cells regenerate bit-identically
//! - World-space height queries agree with directly built cells

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use terracell_core::WorldSeed;
use terracell_testkit::{
    assert_json_snapshot, CellMeshMetric, MetricsReportBuilder, MetricsSink, SeamValidation,
    TerrainMetrics, TestExecutionMetrics, TestResult,
};
use terracell_world::{CellCoord, CellVisitor, Terrain, TerrainCell, TerrainConfig, TerrainError};

const WORLD_SEED: WorldSeed = WorldSeed(3284);
const CELL_RADIUS: u32 = 4; // 9×9 window

fn small_config() -> TerrainConfig {
    TerrainConfig {
        cell_size: 8,
        resolution: 1,
        render_distance: CELL_RADIUS,
        cache_capacity: 128,
        ..Default::default()
    }
}

struct Collect(Vec<(CellCoord, Vec3)>);

impl CellVisitor for Collect {
    type Error = Infallible;

    fn visit_cell(&mut self, cell: &Arc<TerrainCell>, origin: Vec3) -> Result<(), Infallible> {
        self.0.push((cell.coord(), origin));
        Ok(())
    }
}

fn mesh_metrics<'a>(cells: impl Iterator<Item = &'a TerrainCell>) -> Vec<CellMeshMetric> {
    cells
        .map(|cell| CellMeshMetric {
            cell: [cell.coord().x, cell.coord().z],
            triangles: cell.mesh().triangle_count(),
            hash: cell.mesh().hash().to_hex(),
        })
        .collect()
}

#[test]
fn determinism_worldtest() {
    let test_start = Instant::now();
    let config = small_config();

    println!("\n=== Determinism Worldtest ===");
    println!("  World seed: {}", WORLD_SEED);
    let side = CELL_RADIUS * 2 + 1;
    println!("  Cell radius: {} ({}×{} window)", CELL_RADIUS, side, side);

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 1: Sequential generation
    // ═══════════════════════════════════════════════════════════════════════

    let window = CellCoord::new(0, 0).cells_in_radius(CELL_RADIUS);
    let mut sequential = BTreeMap::new();
    let mut generation_times = Vec::new();
    for &coord in &window {
        let gen_start = Instant::now();
        let cell = TerrainCell::new(WORLD_SEED, coord, &config);
        generation_times.push(gen_start.elapsed().as_micros());
        sequential.insert(coord, cell);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 2: Reverse-order regeneration through the façade
    // ═══════════════════════════════════════════════════════════════════════

    let mut terrain = Terrain::new(WORLD_SEED, config.clone()).expect("valid config");
    let mut mismatches = 0usize;
    let mut assertions = 0usize;
    for &coord in window.iter().rev() {
        let cell = terrain.ensure_cell(coord.x, coord.z);
        let original = &sequential[&coord];
        assertions += 1;
        if cell.lattice() != original.lattice()
            || cell.mesh().hash() != original.mesh().hash()
            || cell.decorations() != original.decorations()
        {
            mismatches += 1;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 3: Seam continuity across the resident window
    // ═══════════════════════════════════════════════════════════════════════

    let seams = terrain.storage().check_seams();
    let seam_validation = SeamValidation::from_counts(seams.checked, seams.mismatched);
    println!(
        "  Seams: {}/{} shared edges match",
        seam_validation.seams_valid, seam_validation.total_seams
    );

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 4: Mesh hash snapshot
    // ═══════════════════════════════════════════════════════════════════════

    let direct_metrics = mesh_metrics(sequential.values());
    let cached_metrics = mesh_metrics(terrain.storage().iter_cells().map(|cell| &**cell));

    let stats = terrain.stats();
    let mut min_height = f32::INFINITY;
    let mut max_height = f32::NEG_INFINITY;
    for cell in sequential.values() {
        min_height = min_height.min(cell.lattice().min_height());
        max_height = max_height.max(cell.lattice().max_height());
    }
    let passed = mismatches == 0 && seam_validation.passed() && direct_metrics == cached_metrics;
    let result = if passed {
        TestResult::Pass
    } else {
        TestResult::Fail
    };
    let duration = test_start.elapsed().as_secs_f64();
    let report = MetricsReportBuilder::new("determinism_worldtest")
        .result(result)
        .seed(WORLD_SEED.get())
        .terrain(TerrainMetrics {
            cells_generated: stats.generated,
            cells_evicted: stats.evicted,
            cache_hits: stats.hits,
            avg_gen_time_us: generation_times.iter().sum::<u128>() as f64
                / generation_times.len() as f64,
            min_gen_time_us: generation_times.iter().copied().min().unwrap_or(0),
            max_gen_time_us: generation_times.iter().copied().max().unwrap_or(0),
            min_height,
            max_height,
            seam_validation: Some(seam_validation.clone()),
        })
        .execution(TestExecutionMetrics {
            duration_seconds: duration,
            assertions_checked: Some(assertions),
            validations_passed: Some(assertions - mismatches),
        })
        .build();

    let metrics_path = std::path::PathBuf::from(env!("CARGO_TARGET_TMPDIR"))
        .join("metrics/determinism_worldtest.json");
    let sink = MetricsSink::create(&metrics_path).expect("Failed to create metrics sink");
    sink.write(&report).expect("Failed to write metrics");

    println!("  Cells: {} generated, {} hits", stats.generated, stats.hits);
    println!("  Heights: [{:.2}, {:.2}]", min_height, max_height);
    println!("  Duration: {:.2}s", duration);
    println!("Metrics: {:?}", metrics_path);

    assert_eq!(mismatches, 0, "regenerated cells must match bit-for-bit");
    assert_eq!(seam_validation.total_seams, 2 * 9 * 8);
    assert_eq!(seam_validation.seams_failed, 0, "neighbouring edges must agree");
    assert_eq!(direct_metrics, cached_metrics);

    // golden lives in the source tree so it carries over between runs
    let snapshot_path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/snapshots/determinism_mesh_hashes.json");
    assert_json_snapshot(&snapshot_path, &direct_metrics).expect("stable mesh hashes");
}

#[test]
fn cell_size_eight_has_nine_by_nine_lattice() {
    let cell = TerrainCell::new(WORLD_SEED, CellCoord::new(0, 0), &small_config());
    assert_eq!(cell.lattice().side(), 9);
    assert_eq!(cell.lattice().heights().len(), 81);
    assert_eq!(cell.mesh().vertex_count(), 384);
    assert_eq!(cell.mesh().as_floats().len(), 384 * 9);
}

#[test]
fn world_height_matches_direct_cell() {
    let mut terrain = Terrain::new(WORLD_SEED, small_config()).expect("valid config");
    let via_terrain = terrain.height_at(20.0, -5.0).expect("resolvable");
    let direct = TerrainCell::new(WORLD_SEED, CellCoord::new(2, -1), &small_config());
    assert_eq!(via_terrain, direct.height_at_local(4.0, 3.0).expect("in range"));
    assert_eq!(via_terrain, direct.height_at(20.0, -5.0).expect("in range"));
}

#[test]
fn ensure_cell_is_idempotent() {
    let mut terrain = Terrain::new(WORLD_SEED, small_config()).expect("valid config");
    let first = terrain.ensure_cell(3, -2);
    let second = terrain.ensure_cell(3, -2);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(terrain.stats().generated, 1);
}

#[test]
fn capacity_two_evicts_least_recent() {
    let config = TerrainConfig {
        cache_capacity: 2,
        ..small_config()
    };
    let mut terrain = Terrain::new(WORLD_SEED, config).expect("valid config");
    let a = terrain.ensure_cell(0, 0);
    terrain.ensure_cell(1, 0);
    terrain.ensure_cell(2, 0);
    assert!(!terrain.storage().contains(CellCoord::new(0, 0)));
    assert_eq!(terrain.storage().len(), 2);

    let again = terrain.ensure_cell(0, 0);
    assert!(!Arc::ptr_eq(&a, &again));
    assert_eq!(a.lattice(), again.lattice());
    let stats = terrain.stats();
    assert_eq!(stats.generated, 4);
    assert_eq!(stats.evicted, 2);
}

#[test]
fn upper_cell_boundary_is_out_of_range() {
    let cell = TerrainCell::new(WORLD_SEED, CellCoord::new(0, 0), &small_config());
    let err = cell.height_at(8.0, 3.0).expect_err("x == cell size");
    assert!(matches!(err, TerrainError::HeightOutOfRange { .. }));
}

#[test]
fn render_window_is_x_major() {
    let mut terrain = Terrain::new(
        WORLD_SEED,
        TerrainConfig {
            render_distance: 2,
            ..small_config()
        },
    )
    .expect("valid config");
    let mut visits = Collect(Vec::new());
    let count = terrain.render(-1.0, 17.0, &mut visits).expect("infallible");
    assert_eq!(count, 25);

    let focus = CellCoord::new(-1, 2);
    let mut expected = Vec::new();
    for cx in focus.x - 2..=focus.x + 2 {
        for cz in focus.z - 2..=focus.z + 2 {
            let origin = Vec3::new(cx as f32 * 8.0, 0.0, cz as f32 * 8.0);
            expected.push((CellCoord::new(cx, cz), origin));
        }
    }
    assert_eq!(visits.0, expected);
}
