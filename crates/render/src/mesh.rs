//! Mesh collaborator contract and shared vertex data.

use anyhow::Result;
use terracell_world::VertexAttribute;
use thiserror::Error;

/// A vertex buffer living in some rendering backend.
pub trait Mesh {
    /// Draw every vertex as a triangle list.
    fn render(&self);

    /// Number of vertices uploaded.
    fn vertex_count(&self) -> usize;
}

/// Turns flat vertex data into backend meshes.
pub trait MeshUploader {
    /// Mesh type produced by this backend.
    type Mesh: Mesh + 'static;

    /// Upload `vertex_count` interleaved vertices described by `layout`.
    fn upload(
        &mut self,
        data: &[f32],
        vertex_count: usize,
        layout: &[VertexAttribute],
    ) -> Result<Self::Mesh>;
}

/// Vertex data that does not match its declared layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// The layout has no attributes.
    #[error("vertex layout is empty")]
    EmptyLayout,
    /// Float count differs from `vertex_count * floats_per_vertex`.
    #[error("expected {expected} floats for {vertices} vertices, got {actual}")]
    LengthMismatch {
        /// Declared vertex count.
        vertices: usize,
        /// Floats implied by the layout.
        expected: usize,
        /// Floats supplied.
        actual: usize,
    },
}

/// Floats per vertex implied by `layout`.
pub fn layout_stride(layout: &[VertexAttribute]) -> usize {
    layout.iter().map(|attr| attr.elements).sum()
}

/// Check that `data` holds exactly `vertex_count` vertices of `layout`.
pub fn validate_layout(
    data: &[f32],
    vertex_count: usize,
    layout: &[VertexAttribute],
) -> Result<(), MeshError> {
    if layout.is_empty() {
        return Err(MeshError::EmptyLayout);
    }
    let expected = vertex_count * layout_stride(layout);
    if data.len() != expected {
        return Err(MeshError::LengthMismatch {
            vertices: vertex_count,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Layout of object meshes: position, normal, uv.
pub const OBJECT_LAYOUT: [VertexAttribute; 3] = [
    VertexAttribute::f32s(3),
    VertexAttribute::f32s(3),
    VertexAttribute::f32s(2),
];

/// Vertices in [`CUBE_VERTICES`].
pub const CUBE_VERTEX_COUNT: usize = 36;

/// Unit cube centred on the origin, 36 vertices in [`OBJECT_LAYOUT`].
#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 288] = [
    // +z
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0,
    -0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0,
     0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0,
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0,
    // -z
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0,
    -0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0,
     0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0,
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0,
    // +y
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 0.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 1.0,
    -0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 1.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 1.0,
     0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 0.0,
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 0.0,
    // -y
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 0.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 1.0,
    -0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 1.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 1.0,
     0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 0.0,
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 0.0,
    // +x
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 0.0,
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 1.0,
     0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 1.0,
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 1.0,
     0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 0.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 0.0,
    // -x
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 0.0,
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 1.0,
    -0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 1.0,
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 1.0,
    -0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 0.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 0.0,
];

/// Vertices in [`PLANE_VERTICES`].
pub const PLANE_VERTEX_COUNT: usize = 6;

/// Unit quad on `y = 0` spanning `[0, 1]` in X and Z, in [`OBJECT_LAYOUT`].
#[rustfmt::skip]
pub const PLANE_VERTICES: [f32; 48] = [
    0.0, 0.0, 0.0,  0.0, 1.0, 0.0,  0.0, 0.0,
    1.0, 0.0, 0.0,  0.0, 1.0, 0.0,  1.0, 0.0,
    1.0, 0.0, 1.0,  0.0, 1.0, 0.0,  1.0, 1.0,
    0.0, 0.0, 0.0,  0.0, 1.0, 0.0,  0.0, 0.0,
    0.0, 0.0, 1.0,  0.0, 1.0, 0.0,  0.0, 1.0,
    1.0, 0.0, 1.0,  0.0, 1.0, 0.0,  1.0, 1.0,
];
