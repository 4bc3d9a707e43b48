//! Textures, multi-part models and the shared model table.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::mesh::Mesh;
use crate::shader::{names, ShaderProgram};

/// A texture that can be bound for subsequent draws.
pub trait Texture {
    /// Bind to the active texture unit.
    fn bind(&self);
}

/// One mesh/texture pair of a model, placed relative to the model origin.
#[derive(Clone)]
pub struct Part {
    /// Geometry.
    pub mesh: Rc<dyn Mesh>,
    /// Surface texture.
    pub texture: Rc<dyn Texture>,
    /// Offset from the model origin.
    pub offset: Vec3,
    /// Per-axis scale of the mesh.
    pub scale: Vec3,
}

impl Part {
    /// Model matrix of this part for an instance at `base`.
    ///
    /// Instance scale is added to the part scale, so a unit instance draws
    /// every part one unit larger on each axis. The offset is not scaled; yaw
    /// turns the part around the instance's vertical axis.
    pub fn transform(&self, base: Vec3, scale: Vec3, yaw: f32) -> Mat4 {
        Mat4::from_translation(base)
            * Mat4::from_rotation_y(yaw)
            * Mat4::from_translation(self.offset)
            * Mat4::from_scale(self.scale + scale)
    }
}

/// An ordered list of parts drawn together.
#[derive(Clone, Default)]
pub struct Model {
    /// Parts in draw order.
    pub parts: Vec<Part>,
}

impl Model {
    /// Model named `"tree"` by decorations.
    pub const TREE: &'static str = "tree";

    /// Trunk and canopy built from a unit cube.
    pub fn tree(cube: Rc<dyn Mesh>, wood: Rc<dyn Texture>, leaves: Rc<dyn Texture>) -> Self {
        Self {
            parts: vec![
                Part {
                    mesh: Rc::clone(&cube),
                    texture: wood,
                    offset: Vec3::new(0.0, 2.5, 0.0),
                    scale: Vec3::new(0.4, 5.0, 0.4),
                },
                Part {
                    mesh: cube,
                    texture: leaves,
                    offset: Vec3::new(0.0, 6.5, 0.0),
                    scale: Vec3::splat(3.0),
                },
            ],
        }
    }

    /// Draw every part with `shader`, which must already be in use.
    ///
    /// Returns the number of parts drawn.
    pub fn render(&self, shader: &dyn ShaderProgram, base: Vec3, scale: Vec3, yaw: f32) -> usize {
        for part in &self.parts {
            shader.set_matrix4(names::MODEL, &part.transform(base, scale, yaw));
            part.texture.bind();
            part.mesh.render();
        }
        self.parts.len()
    }
}

/// Named models shared by every renderer of a run.
///
/// Built once before the first frame and read-only afterwards.
#[derive(Clone, Default)]
pub struct ModelLibrary {
    models: BTreeMap<String, Rc<Model>>,
}

impl ModelLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `model` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, model: Model) -> Rc<Model> {
        let model = Rc::new(model);
        self.models.insert(name.into(), Rc::clone(&model));
        model
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Option<&Rc<Model>> {
        self.models.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.models.keys().map(String::as_str)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true when no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
