//! Drives `Terrain::render` into the recording backend frame by frame.

use std::rc::Rc;

use glam::{Mat4, Vec3};
use terracell_core::WorldSeed;
use terracell_render::{
    Camera, FrameUniforms, HeadlessBackend, Mesh, MeshUploader, Model, ModelLibrary,
    TerrainRenderer, UniformValue, CUBE_VERTEX_COUNT, CUBE_VERTICES, OBJECT_LAYOUT,
};
use terracell_world::{Terrain, TerrainConfig};

fn setup(config: TerrainConfig) -> (Terrain, TerrainRenderer<HeadlessBackend>) {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();

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
    let terrain = Terrain::new(WorldSeed::DEMO, config).expect("valid config");
    (terrain, TerrainRenderer::new(backend, shader, ground, models))
}

fn uniforms(at: Vec3) -> FrameUniforms {
    FrameUniforms::from_camera(&Camera::new(at, 1.0), 0.0)
}

#[test]
fn one_model_upload_per_visible_cell() {
    let config = TerrainConfig {
        cell_size: 8,
        render_distance: 2,
        cache_capacity: 64,
        ..Default::default()
    };
    let (mut terrain, mut renderer) = setup(config);
    let log = renderer.uploader().log();

    renderer.begin_frame(&uniforms(Vec3::new(4.0, 3.0, 4.0)));
    log.borrow_mut().clear();
    let visited = terrain.render(4.0, 4.0, &mut renderer).expect("frame renders");
    let stats = renderer.end_frame();

    assert_eq!(visited, 25);
    assert_eq!(stats.cells_drawn, 25);
    assert_eq!(stats.uploads, 25);

    // cell draws are the only pure translations; decoration parts are scaled
    let cell_translations: Vec<Vec3> = log
        .borrow()
        .uniform_writes("model")
        .filter_map(|value| match value {
            UniformValue::Matrix4(m) if *m == Mat4::from_translation(m.w_axis.truncate()) => {
                Some(m.w_axis.truncate())
            }
            _ => None,
        })
        .collect();
    let mut expected = Vec::new();
    for cx in -2..=2 {
        for cz in -2..=2 {
            expected.push(Vec3::new(cx as f32 * 8.0, 0.0, cz as f32 * 8.0));
        }
    }
    assert_eq!(cell_translations, expected);
}

#[test]
fn steady_focus_reuses_uploads() {
    let config = TerrainConfig {
        cell_size: 8,
        render_distance: 1,
        cache_capacity: 16,
        ..Default::default()
    };
    let (mut terrain, mut renderer) = setup(config);
    for _ in 0..4 {
        renderer.begin_frame(&uniforms(Vec3::ZERO));
        terrain.render(1.0, 1.0, &mut renderer).expect("frame renders");
        renderer.end_frame();
    }
    renderer.begin_frame(&uniforms(Vec3::ZERO));
    terrain.render(1.0, 1.0, &mut renderer).expect("frame renders");
    let stats = renderer.end_frame();
    assert_eq!(stats.uploads, 0);
    assert_eq!(stats.reused, 9);
    assert_eq!(terrain.stats().generated, 9);
}

#[test]
fn evicted_cells_release_uploaded_meshes() {
    let config = TerrainConfig {
        cell_size: 8,
        render_distance: 1,
        cache_capacity: 9,
        ..Default::default()
    };
    let (mut terrain, mut renderer) = setup(config);
    let log = renderer.uploader().log();

    renderer.begin_frame(&uniforms(Vec3::ZERO));
    terrain.render(0.0, 0.0, &mut renderer).expect("frame renders");
    renderer.end_frame();
    assert_eq!(renderer.cached_meshes(), 9);

    // move far enough that the whole window is replaced
    renderer.begin_frame(&uniforms(Vec3::ZERO));
    terrain.render(400.0, 400.0, &mut renderer).expect("frame renders");
    let stats = renderer.end_frame();

    assert_eq!(terrain.stats().evicted, 9);
    assert_eq!(stats.released, 9);
    assert_eq!(renderer.cached_meshes(), 9);
    // 9 cell meshes plus the shared cube
    assert_eq!(log.borrow().live_meshes(), 10);
}
