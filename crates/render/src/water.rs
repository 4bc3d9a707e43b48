use std::rc::Rc;

use glam::{Mat4, Vec3};
use terracell_world::{CellCoord, TerrainConfig};

use crate::mesh::Mesh;
use crate::shader::{names, FrameUniforms, ShaderProgram};

/// Water surface height, just under sea level so shorelines stay visible.
pub const WATER_LEVEL: f32 = -0.5;

/// Flat animated quad covering the visible terrain window.
pub struct WaterPlane {
    plane: Rc<dyn Mesh>,
    shader: Rc<dyn ShaderProgram>,
    level: f32,
}

impl WaterPlane {
    /// `plane` must be a unit quad on `y = 0` spanning `[0, 1]` in X and Z.
    pub fn new(plane: Rc<dyn Mesh>, shader: Rc<dyn ShaderProgram>) -> Self {
        Self {
            plane,
            shader,
            level: WATER_LEVEL,
        }
    }

    /// Height of the surface.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Model matrix stretching the unit quad over the render window around `focus`.
    pub fn transform(&self, focus: CellCoord, config: &TerrainConfig) -> Mat4 {
        let size = config.cell_size as f32;
        let reach = config.render_distance as f32 * size;
        let corner = focus.origin(config.cell_size) - Vec3::new(reach, 0.0, reach);
        let extent = 2.0 * reach + size;
        Mat4::from_translation(Vec3::new(corner.x, self.level, corner.z))
            * Mat4::from_scale(Vec3::new(extent, 1.0, extent))
    }

    /// Draw the plane with its own shader; the `"t"` uniform animates it.
    pub fn render(&self, uniforms: &FrameUniforms, focus: CellCoord, config: &TerrainConfig) {
        self.shader.use_program();
        uniforms.apply(self.shader.as_ref());
        self.shader
            .set_matrix4(names::MODEL, &self.transform(focus, config));
        self.shader.set_float(names::TIME, uniforms.time);
        self.plane.render();
    }
}
