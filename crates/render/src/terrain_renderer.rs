//! Per-frame terrain pass: cell meshes plus their decorations.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use terracell_world::{CellCoord, CellVisitor, TerrainCell};
use tracing::{debug, trace, warn};

use crate::mesh::{Mesh, MeshUploader};
use crate::model::{ModelLibrary, Texture};
use crate::shader::{names, FrameUniforms, ShaderProgram};

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Cell meshes drawn.
    pub cells_drawn: usize,
    /// Model parts drawn for decorations.
    pub parts_drawn: usize,
    /// Cell meshes uploaded this frame.
    pub uploads: usize,
    /// Cell meshes reused from earlier frames.
    pub reused: usize,
    /// Terrain triangles submitted.
    pub triangles: usize,
    /// Uploaded meshes released because their cell was dropped.
    pub released: usize,
}

struct UploadedMesh<M> {
    cell: Weak<TerrainCell>,
    mesh: M,
}

/// Draws visible cells with one object shader and a ground texture.
///
/// Uploaded meshes are keyed by cell coordinate and tied to the exact cell
/// instance they were built from; a regenerated cell gets a fresh upload.
pub struct TerrainRenderer<U: MeshUploader> {
    uploader: U,
    shader: Rc<dyn ShaderProgram>,
    ground: Rc<dyn Texture>,
    models: ModelLibrary,
    meshes: BTreeMap<CellCoord, UploadedMesh<U::Mesh>>,
    frame: FrameStats,
}

impl<U: MeshUploader> TerrainRenderer<U> {
    /// Create a renderer drawing through `uploader`.
    pub fn new(
        uploader: U,
        shader: Rc<dyn ShaderProgram>,
        ground: Rc<dyn Texture>,
        models: ModelLibrary,
    ) -> Self {
        Self {
            uploader,
            shader,
            ground,
            models,
            meshes: BTreeMap::new(),
            frame: FrameStats::default(),
        }
    }

    /// Backend used for uploads.
    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Mutable backend access, e.g. for uploading shared meshes.
    pub fn uploader_mut(&mut self) -> &mut U {
        &mut self.uploader
    }

    /// Models available to decorations.
    pub fn models(&self) -> &ModelLibrary {
        &self.models
    }

    /// Number of cell meshes currently uploaded.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Start a frame: bind the object shader, write frame uniforms, bind the
    /// ground texture.
    pub fn begin_frame(&mut self, uniforms: &FrameUniforms) {
        self.frame = FrameStats::default();
        self.shader.use_program();
        uniforms.apply(self.shader.as_ref());
        self.shader.set_matrix4(names::MODEL, &Mat4::IDENTITY);
        self.ground.bind();
    }

    /// Finish a frame, releasing meshes whose cells no longer exist.
    pub fn end_frame(&mut self) -> FrameStats {
        let before = self.meshes.len();
        self.meshes.retain(|_, uploaded| uploaded.cell.strong_count() > 0);
        self.frame.released = before - self.meshes.len();
        if self.frame.released > 0 {
            debug!(released = self.frame.released, "released meshes of dropped cells");
        }
        self.frame
    }

    fn cell_mesh(&mut self, cell: &Arc<TerrainCell>) -> Result<&U::Mesh> {
        let coord = cell.coord();
        let current = self
            .meshes
            .get(&coord)
            .is_some_and(|uploaded| std::ptr::eq(uploaded.cell.as_ptr(), Arc::as_ptr(cell)));

        if current {
            self.frame.reused += 1;
        } else {
            let surface = cell.mesh();
            let mesh = self
                .uploader
                .upload(surface.as_floats(), surface.vertex_count(), surface.layout())
                .with_context(|| format!("Failed to upload mesh of cell {coord}"))?;
            trace!(cell = %coord, vertices = surface.vertex_count(), "uploaded cell mesh");
            self.meshes.insert(
                coord,
                UploadedMesh {
                    cell: Arc::downgrade(cell),
                    mesh,
                },
            );
            self.frame.uploads += 1;
        }

        self.meshes
            .get(&coord)
            .map(|uploaded| &uploaded.mesh)
            .with_context(|| format!("mesh of cell {coord} missing after upload"))
    }

    fn draw_decorations(&mut self, cell: &TerrainCell, origin: Vec3) -> usize {
        let mut parts = 0;
        for decoration in cell.decorations() {
            let Some(model) = self.models.get(decoration.model_name()) else {
                warn!(model = decoration.model_name(), "no model registered; skipping decoration");
                continue;
            };
            parts += model.render(
                self.shader.as_ref(),
                origin + decoration.position,
                decoration.scale,
                decoration.rotation,
            );
        }
        parts
    }
}

impl<U: MeshUploader> CellVisitor for TerrainRenderer<U> {
    type Error = anyhow::Error;

    fn visit_cell(&mut self, cell: &Arc<TerrainCell>, origin: Vec3) -> Result<()> {
        let shader = Rc::clone(&self.shader);
        let ground = Rc::clone(&self.ground);
        let mesh = self.cell_mesh(cell)?;

        shader.set_matrix4(names::MODEL, &Mat4::from_translation(origin));
        ground.bind();
        mesh.render();
        let triangles = mesh.vertex_count() / 3;

        self.frame.cells_drawn += 1;
        self.frame.triangles += triangles;
        self.frame.parts_drawn += self.draw_decorations(cell, origin);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DrawCall, HeadlessBackend};
    use crate::mesh::{CUBE_VERTEX_COUNT, CUBE_VERTICES, OBJECT_LAYOUT};
    use crate::model::Model;
    use crate::shader::UniformValue;
    use terracell_core::WorldSeed;
    use terracell_world::TerrainConfig;

    fn renderer() -> TerrainRenderer<HeadlessBackend> {
        let mut backend = HeadlessBackend::new();
        let cube: Rc<dyn Mesh> = Rc::new(
            backend
                .upload(&CUBE_VERTICES, CUBE_VERTEX_COUNT, &OBJECT_LAYOUT)
                .expect("cube"),
        );
        let mut models = ModelLibrary::new();
        models.insert(
            Model::TREE,
            Model::tree(
                cube,
                Rc::new(backend.texture("wood")),
                Rc::new(backend.texture("leaves")),
            ),
        );
        let shader = Rc::new(backend.shader("object"));
        let ground = Rc::new(backend.texture("ground"));
        TerrainRenderer::new(backend, shader, ground, models)
    }

    fn cell(x: i32, z: i32) -> Arc<TerrainCell> {
        let config = TerrainConfig {
            cell_size: 8,
            ..Default::default()
        };
        Arc::new(TerrainCell::new(WorldSeed(3284), CellCoord::new(x, z), &config))
    }

    fn uniforms() -> FrameUniforms {
        FrameUniforms {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            light_position: Vec3::ZERO,
            time: 0.0,
        }
    }

    #[test]
    fn cell_is_drawn_at_its_origin() {
        let mut renderer = renderer();
        let log = renderer.uploader().log();
        let cell = cell(2, -1);
        renderer.begin_frame(&uniforms());
        log.borrow_mut().clear();

        renderer
            .visit_cell(&cell, Vec3::new(16.0, 0.0, -8.0))
            .expect("draws");
        let stats = renderer.end_frame();

        let log = log.borrow();
        assert_eq!(
            log.calls()[0],
            DrawCall::Uniform {
                shader: "object".into(),
                name: "model".into(),
                value: UniformValue::Matrix4(Mat4::from_translation(Vec3::new(16.0, 0.0, -8.0))),
            }
        );
        assert_eq!(stats.cells_drawn, 1);
        assert_eq!(stats.uploads, 1);
        assert_eq!(stats.triangles, 128);
        assert_eq!(stats.parts_drawn, cell.decorations().len() * 2);
        // one terrain draw plus two parts per decoration
        assert_eq!(log.draw_count(), 1 + stats.parts_drawn);
    }

    #[test]
    fn unchanged_cell_reuses_its_upload() {
        let mut renderer = renderer();
        let cell = cell(0, 0);
        for _ in 0..3 {
            renderer.begin_frame(&uniforms());
            renderer.visit_cell(&cell, Vec3::ZERO).expect("draws");
            renderer.end_frame();
        }
        let log = renderer.uploader().log();
        // cube + one cell mesh
        assert_eq!(log.borrow().uploaded(), 2);
        assert_eq!(renderer.cached_meshes(), 1);
    }

    #[test]
    fn regenerated_cell_is_uploaded_again() {
        let mut renderer = renderer();
        let first = cell(1, 1);
        renderer.visit_cell(&first, Vec3::ZERO).expect("draws");
        let second = cell(1, 1);
        renderer.visit_cell(&second, Vec3::ZERO).expect("draws");
        let stats = renderer.end_frame();
        assert_eq!(stats.uploads, 2);
        assert_eq!(renderer.cached_meshes(), 1);
    }

    #[test]
    fn dropped_cells_release_their_meshes() {
        let mut renderer = renderer();
        let log = renderer.uploader().log();
        let a = cell(0, 0);
        let b = cell(0, 1);
        renderer.begin_frame(&uniforms());
        renderer.visit_cell(&a, Vec3::ZERO).expect("draws");
        renderer.visit_cell(&b, Vec3::new(0.0, 0.0, 8.0)).expect("draws");
        renderer.end_frame();
        assert_eq!(log.borrow().live_meshes(), 3);

        drop(a);
        let stats = renderer.end_frame();
        assert_eq!(stats.released, 1);
        assert_eq!(renderer.cached_meshes(), 1);
        assert_eq!(log.borrow().live_meshes(), 2);
    }

    #[test]
    fn begin_frame_sets_frame_uniforms() {
        let mut renderer = renderer();
        let log = renderer.uploader().log();
        renderer.begin_frame(&FrameUniforms {
            light_position: Vec3::new(1.0, 2.0, 3.0),
            ..uniforms()
        });
        let log = log.borrow();
        assert_eq!(log.uniform_writes("projection").count(), 1);
        assert_eq!(log.uniform_writes("view").count(), 1);
        assert_eq!(
            log.uniform_writes("lightPosition").collect::<Vec<_>>(),
            vec![&UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0))]
        );
        assert_eq!(log.texture_binds().collect::<Vec<_>>(), vec!["ground"]);
    }
}
