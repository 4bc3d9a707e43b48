//! Recording backend used by tests and the headless binary.
//!
//! Every collaborator call is appended to a shared [`FrameLog`] instead of
//! reaching a GPU.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use terracell_world::VertexAttribute;

use crate::mesh::{validate_layout, Mesh, MeshUploader};
use crate::model::Texture;
use crate::shader::{ShaderProgram, UniformValue};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// A program was made current.
    UseProgram {
        /// Program label.
        shader: String,
    },
    /// A uniform was written.
    Uniform {
        /// Program label.
        shader: String,
        /// Uniform name.
        name: String,
        /// Written value.
        value: UniformValue,
    },
    /// A texture was bound.
    BindTexture {
        /// Texture label.
        texture: String,
    },
    /// A mesh was drawn.
    Draw {
        /// Backend mesh id.
        mesh: usize,
        /// Vertices submitted.
        vertices: usize,
    },
}

/// Calls recorded since the last [`FrameLog::clear`], plus mesh bookkeeping.
#[derive(Debug, Default)]
pub struct FrameLog {
    calls: Vec<DrawCall>,
    uploaded: usize,
    live_meshes: usize,
}

impl FrameLog {
    /// All recorded calls in order.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Forget recorded calls; mesh counters are kept.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Meshes uploaded since the backend was created.
    pub fn uploaded(&self) -> usize {
        self.uploaded
    }

    /// Meshes uploaded and not yet dropped.
    pub fn live_meshes(&self) -> usize {
        self.live_meshes
    }

    /// Number of draw calls.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Draw { .. }))
            .count()
    }

    /// Vertices submitted across all draw calls.
    pub fn vertices_drawn(&self) -> usize {
        self.calls
            .iter()
            .map(|call| match call {
                DrawCall::Draw { vertices, .. } => *vertices,
                _ => 0,
            })
            .sum()
    }

    /// Values written to uniform `name` on any program, in order.
    pub fn uniform_writes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a UniformValue> {
        self.calls.iter().filter_map(move |call| match call {
            DrawCall::Uniform {
                name: written,
                value,
                ..
            } if written == name => Some(value),
            _ => None,
        })
    }

    /// Labels of bound textures, in order.
    pub fn texture_binds(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::BindTexture { texture } => Some(texture.as_str()),
            _ => None,
        })
    }

    fn record(&mut self, call: DrawCall) {
        self.calls.push(call);
    }
}

/// Shared handle to a [`FrameLog`].
pub type SharedLog = Rc<RefCell<FrameLog>>;

/// Backend that records instead of drawing.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    log: SharedLog,
    next_mesh: usize,
}

impl HeadlessBackend {
    /// Create a backend with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared log.
    pub fn log(&self) -> SharedLog {
        Rc::clone(&self.log)
    }

    /// A program recording under `label`.
    pub fn shader(&self, label: &str) -> HeadlessShader {
        HeadlessShader {
            label: label.to_owned(),
            log: self.log(),
        }
    }

    /// A texture recording under `label`.
    pub fn texture(&self, label: &str) -> HeadlessTexture {
        HeadlessTexture {
            label: label.to_owned(),
            log: self.log(),
        }
    }
}

impl MeshUploader for HeadlessBackend {
    type Mesh = HeadlessMesh;

    fn upload(
        &mut self,
        data: &[f32],
        vertex_count: usize,
        layout: &[VertexAttribute],
    ) -> Result<HeadlessMesh> {
        validate_layout(data, vertex_count, layout)?;
        let id = self.next_mesh;
        self.next_mesh += 1;
        {
            let mut log = self.log.borrow_mut();
            log.uploaded += 1;
            log.live_meshes += 1;
        }
        Ok(HeadlessMesh {
            id,
            vertex_count,
            log: self.log(),
        })
    }
}

/// Mesh handle of the recording backend.
#[derive(Debug)]
pub struct HeadlessMesh {
    id: usize,
    vertex_count: usize,
    log: SharedLog,
}

impl HeadlessMesh {
    /// Backend id, unique per upload.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Mesh for HeadlessMesh {
    fn render(&self) {
        self.log.borrow_mut().record(DrawCall::Draw {
            mesh: self.id,
            vertices: self.vertex_count,
        });
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

impl Drop for HeadlessMesh {
    fn drop(&mut self) {
        let mut log = self.log.borrow_mut();
        log.live_meshes = log.live_meshes.saturating_sub(1);
    }
}

/// Program handle of the recording backend.
#[derive(Debug, Clone)]
pub struct HeadlessShader {
    label: String,
    log: SharedLog,
}

impl HeadlessShader {
    fn uniform(&self, name: &str, value: UniformValue) {
        self.log.borrow_mut().record(DrawCall::Uniform {
            shader: self.label.clone(),
            name: name.to_owned(),
            value,
        });
    }
}

impl ShaderProgram for HeadlessShader {
    fn use_program(&self) {
        self.log.borrow_mut().record(DrawCall::UseProgram {
            shader: self.label.clone(),
        });
    }

    fn set_matrix4(&self, name: &str, value: &Mat4) {
        self.uniform(name, UniformValue::Matrix4(*value));
    }

    fn set_vec3(&self, name: &str, value: Vec3) {
        self.uniform(name, UniformValue::Vec3(value));
    }

    fn set_vec2(&self, name: &str, value: Vec2) {
        self.uniform(name, UniformValue::Vec2(value));
    }

    fn set_float(&self, name: &str, value: f32) {
        self.uniform(name, UniformValue::Float(value));
    }

    fn set_int(&self, name: &str, value: i32) {
        self.uniform(name, UniformValue::Int(value));
    }
}

/// Texture handle of the recording backend.
#[derive(Debug, Clone)]
pub struct HeadlessTexture {
    label: String,
    log: SharedLog,
}

impl Texture for HeadlessTexture {
    fn bind(&self) {
        self.log.borrow_mut().record(DrawCall::BindTexture {
            texture: self.label.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{CUBE_VERTEX_COUNT, CUBE_VERTICES, OBJECT_LAYOUT};

    #[test]
    fn uploads_are_validated_and_counted() {
        let mut backend = HeadlessBackend::new();
        let mesh = backend
            .upload(&CUBE_VERTICES, CUBE_VERTEX_COUNT, &OBJECT_LAYOUT)
            .expect("cube uploads");
        assert!(backend.upload(&CUBE_VERTICES, 35, &OBJECT_LAYOUT).is_err());

        let log = backend.log();
        assert_eq!(log.borrow().uploaded(), 1);
        assert_eq!(log.borrow().live_meshes(), 1);
        drop(mesh);
        assert_eq!(log.borrow().live_meshes(), 0);
    }

    #[test]
    fn calls_are_recorded_in_order() {
        let mut backend = HeadlessBackend::new();
        let shader = backend.shader("object");
        let texture = backend.texture("grass");
        let mesh = backend
            .upload(&CUBE_VERTICES, CUBE_VERTEX_COUNT, &OBJECT_LAYOUT)
            .expect("cube uploads");

        shader.use_program();
        shader.set_float("t", 1.5);
        texture.bind();
        mesh.render();

        let log = backend.log();
        let log = log.borrow();
        assert_eq!(
            log.calls(),
            &[
                DrawCall::UseProgram {
                    shader: "object".into()
                },
                DrawCall::Uniform {
                    shader: "object".into(),
                    name: "t".into(),
                    value: UniformValue::Float(1.5)
                },
                DrawCall::BindTexture {
                    texture: "grass".into()
                },
                DrawCall::Draw {
                    mesh: mesh.id(),
                    vertices: 36
                },
            ]
        );
        assert_eq!(log.draw_count(), 1);
        assert_eq!(log.vertices_drawn(), 36);
        assert_eq!(log.texture_binds().collect::<Vec<_>>(), vec!["grass"]);
    }
}
