//! Headless driving loop: walks a camera over the terrain and renders every
//! frame into the recording backend.

use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec3;
use terracell_core::FrameTick;
use terracell_render::{
    collect_mesh_stats, Camera, CellMeshStat, FrameUniforms, HeadlessBackend, Mesh,
    MeshUploader, Model, ModelLibrary, TerrainRenderer, WaterPlane, CUBE_VERTEX_COUNT,
    CUBE_VERTICES, OBJECT_LAYOUT, PLANE_VERTEX_COUNT, PLANE_VERTICES, WATER_LEVEL,
};
use terracell_testkit::{EventRecord, JsonlSink, RenderMetrics, SeamValidation, TerrainMetrics};
use terracell_world::{StorageStats, Terrain};
use tracing::{debug, info, info_span};

use crate::config::{FlythroughConfig, TerracellConfig};

/// Camera state advanced once per frame.
pub struct Flythrough {
    camera: Camera,
    config: FlythroughConfig,
    frame: FrameTick,
    elapsed: f32,
}

/// Where the camera ended up after one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub frame: FrameTick,
    pub position: Vec3,
    pub ground: f32,
}

impl Flythrough {
    pub fn new(config: FlythroughConfig) -> Self {
        let [x, z] = config.start;
        Self {
            camera: Camera::new(Vec3::new(x, 0.0, z), config.aspect),
            config,
            frame: FrameTick::ZERO,
            elapsed: 0.0,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Walk forward, turn, and rest the eye above the terrain (or the water).
    pub fn step(&mut self, terrain: &mut Terrain) -> Result<FrameSample> {
        let dt = self.config.frame_seconds;
        self.camera.rotate(self.config.turn_rate * dt, 0.0);
        let forward = self.camera.forward_xz();
        self.camera.position += forward * self.config.speed * dt;

        let ground = terrain
            .height_at(self.camera.position.x, self.camera.position.z)
            .context("camera height query failed")?;
        self.camera.position.y = ground.max(WATER_LEVEL) + self.config.eye_height;

        self.elapsed += dt;
        self.frame = self.frame.advance(1);
        Ok(FrameSample {
            frame: self.frame,
            position: self.camera.position,
            ground,
        })
    }
}

/// Aggregates of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: u64,
    pub storage: StorageStats,
    pub terrain: TerrainMetrics,
    pub rendering: RenderMetrics,
    pub meshes: Vec<CellMeshStat>,
    pub final_position: Vec3,
    pub duration_seconds: f64,
}

/// Render `frames` frames of the configured flythrough headlessly.
pub fn run(
    config: &TerracellConfig,
    frames: u64,
    mut events: Option<&mut JsonlSink>,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut terrain = Terrain::new(config.seed, config.terrain.clone())?;

    let mut backend = HeadlessBackend::new();
    let cube: Rc<dyn Mesh> = Rc::new(
        backend
            .upload(&CUBE_VERTICES, CUBE_VERTEX_COUNT, &OBJECT_LAYOUT)
            .context("Failed to upload cube mesh")?,
    );
    let plane: Rc<dyn Mesh> = Rc::new(
        backend
            .upload(&PLANE_VERTICES, PLANE_VERTEX_COUNT, &OBJECT_LAYOUT)
            .context("Failed to upload water plane")?,
    );
    let mut models = ModelLibrary::new();
    models.insert(
        Model::TREE,
        Model::tree(
            cube,
            Rc::new(backend.texture("wood")),
            Rc::new(backend.texture("grass")),
        ),
    );
    let water = WaterPlane::new(plane, Rc::new(backend.shader("water")));
    let object_shader = Rc::new(backend.shader("object"));
    let ground_texture = Rc::new(backend.texture("terrain"));
    let log = backend.log();
    let mut renderer = TerrainRenderer::new(backend, object_shader, ground_texture, models);

    let mut flythrough = Flythrough::new(config.flythrough.clone());
    let mut rendering = RenderMetrics::default();
    let mut min_height = f32::INFINITY;
    let mut max_height = f32::NEG_INFINITY;
    let mut gen_times = Vec::new();

    info!(frames, seed = %config.seed, "starting flythrough");
    for _ in 0..frames {
        let before = terrain.stats().generated;
        let frame_started = Instant::now();

        let sample = flythrough.step(&mut terrain)?;
        let _span = info_span!("frame", frame = sample.frame.0).entered();
        let uniforms = FrameUniforms::from_camera(flythrough.camera(), flythrough.elapsed());
        let focus = terrain.focus_cell(sample.position.x, sample.position.z);

        log.borrow_mut().clear();
        renderer.begin_frame(&uniforms);
        let visited = terrain.render(sample.position.x, sample.position.z, &mut renderer)?;
        let stats = renderer.end_frame();
        water.render(&uniforms, focus, terrain.config());

        let generated = terrain.stats().generated - before;
        if generated > 0 {
            gen_times.push(frame_started.elapsed().as_micros() / u128::from(generated));
        }
        rendering.frames += 1;
        rendering.cells_drawn += stats.cells_drawn;
        rendering.parts_drawn += stats.parts_drawn;
        rendering.total_triangles += stats.triangles;
        min_height = min_height.min(sample.ground);
        max_height = max_height.max(sample.ground);
        debug!(
            visited,
            uploads = stats.uploads,
            draws = log.borrow().draw_count(),
            ground = sample.ground,
            "frame rendered"
        );

        if let Some(sink) = events.as_deref_mut() {
            let payload = format!(
                "focus={} pos=({:.2}, {:.2}, {:.2}) cells={} generated={}",
                focus, sample.position.x, sample.position.y, sample.position.z, visited, generated
            );
            sink.write(&EventRecord {
                frame: sample.frame,
                kind: "frame",
                payload: &payload,
            })?;
        }
    }
    if let Some(sink) = events {
        sink.flush()?;
    }

    let storage = terrain.stats();
    rendering.meshes_uploaded = log.borrow().uploaded();
    let lookups = storage.hits + storage.generated;
    if lookups > 0 {
        rendering.cache_hit_rate = Some(storage.hits as f64 / lookups as f64);
    }
    for cell in terrain.storage().iter_cells() {
        min_height = min_height.min(cell.lattice().min_height());
        max_height = max_height.max(cell.lattice().max_height());
    }
    let seams = terrain.storage().check_seams();

    let summary = RunSummary {
        frames,
        storage,
        terrain: TerrainMetrics {
            cells_generated: storage.generated,
            cells_evicted: storage.evicted,
            cache_hits: storage.hits,
            avg_gen_time_us: if gen_times.is_empty() {
                0.0
            } else {
                gen_times.iter().sum::<u128>() as f64 / gen_times.len() as f64
            },
            min_gen_time_us: gen_times.iter().copied().min().unwrap_or(0),
            max_gen_time_us: gen_times.iter().copied().max().unwrap_or(0),
            min_height,
            max_height,
            seam_validation: Some(SeamValidation::from_counts(seams.checked, seams.mismatched)),
        },
        rendering,
        meshes: collect_mesh_stats(terrain.storage()),
        final_position: flythrough.camera().position,
        duration_seconds: started.elapsed().as_secs_f64(),
    };
    info!(
        frames,
        generated = storage.generated,
        evicted = storage.evicted,
        hits = storage.hits,
        seams = seams.checked,
        seam_mismatches = seams.mismatched,
        "flythrough finished"
    );
    Ok(summary)
}
