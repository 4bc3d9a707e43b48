#![warn(missing_docs)]
//! Rendering collaborators for terrain cells: mesh/shader/texture contracts,
//! shared models, the per-frame terrain pass and a recording backend.

mod camera;
mod headless;
mod mesh;
mod model;
mod shader;
mod stats;
mod terrain_renderer;
mod water;

pub use camera::Camera;
pub use headless::{
    DrawCall, FrameLog, HeadlessBackend, HeadlessMesh, HeadlessShader, HeadlessTexture, SharedLog,
};
pub use mesh::{
    layout_stride, validate_layout, Mesh, MeshError, MeshUploader, CUBE_VERTEX_COUNT,
    CUBE_VERTICES, OBJECT_LAYOUT, PLANE_VERTEX_COUNT, PLANE_VERTICES,
};
pub use model::{Model, ModelLibrary, Part, Texture};
pub use shader::{names, FrameUniforms, ShaderProgram, UniformValue};
pub use stats::{collect_mesh_stats, stats_to_metrics, write_metrics_to_file, CellMeshStat};
pub use terrain_renderer::{FrameStats, TerrainRenderer};
pub use water::{WaterPlane, WATER_LEVEL};
