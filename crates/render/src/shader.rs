//! Shader collaborator contract and per-frame uniforms.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::Camera;

/// A linked shader program accepting named uniforms.
///
/// Setters take `&self`: programs are shared between the terrain, model and
/// water passes and the backend owns the mutable state.
pub trait ShaderProgram {
    /// Make this program current.
    fn use_program(&self);
    /// Set a 4×4 matrix uniform.
    fn set_matrix4(&self, name: &str, value: &Mat4);
    /// Set a 3-component vector uniform.
    fn set_vec3(&self, name: &str, value: Vec3);
    /// Set a 2-component vector uniform.
    fn set_vec2(&self, name: &str, value: Vec2);
    /// Set a float uniform.
    fn set_float(&self, name: &str, value: f32);
    /// Set an integer uniform.
    fn set_int(&self, name: &str, value: i32);
}

/// A uniform write, as recorded by backends that log instead of draw.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// 4×4 matrix.
    Matrix4(Mat4),
    /// Vector of three floats.
    Vec3(Vec3),
    /// Vector of two floats.
    Vec2(Vec2),
    /// Float.
    Float(f32),
    /// Integer.
    Int(i32),
}

/// Uniform names shared by every pass.
pub mod names {
    /// Projection matrix.
    pub const PROJECTION: &str = "projection";
    /// View matrix.
    pub const VIEW: &str = "view";
    /// Per-draw model matrix.
    pub const MODEL: &str = "model";
    /// Point light position.
    pub const LIGHT_POSITION: &str = "lightPosition";
    /// Elapsed seconds, used by the water pass.
    pub const TIME: &str = "t";
}

/// Uniforms set once per frame on every program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Projection matrix.
    pub projection: Mat4,
    /// View matrix.
    pub view: Mat4,
    /// Light follows the viewer.
    pub light_position: Vec3,
    /// Seconds since the run started.
    pub time: f32,
}

impl FrameUniforms {
    /// Derive frame uniforms from a camera.
    pub fn from_camera(camera: &Camera, time: f32) -> Self {
        Self {
            projection: camera.projection_matrix(),
            view: camera.view_matrix(),
            light_position: camera.position,
            time,
        }
    }

    /// Write projection, view and light uniforms to `shader`.
    pub fn apply(&self, shader: &dyn ShaderProgram) {
        shader.set_matrix4(names::PROJECTION, &self.projection);
        shader.set_matrix4(names::VIEW, &self.view);
        shader.set_vec3(names::LIGHT_POSITION, self.light_position);
    }
}
