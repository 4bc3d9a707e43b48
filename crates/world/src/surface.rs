//! Per-cell heightfield sampling and triangle mesh synthesis.
//!
//! A cell is sampled on a square lattice of `points_per_cell + 1` points per
//! side. The lattice is retained for height queries and turned into a flat,
//! non-indexed triangle list (two triangles per lattice quad).

use glam::Vec3;

use crate::cell::CellCoord;
use crate::config::TerrainConfig;
use crate::height::HeightTransform;
use crate::noise::GradientNoise;

/// Retained grid of sampled elevations for one cell.
///
/// Indexed as `[i][j]` with `i` along world X and `j` along world Z.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightLattice {
    side: usize,
    spacing: f32,
    heights: Vec<f32>,
}

impl HeightLattice {
    /// Build a lattice by evaluating `sample(i, j)` at every lattice point.
    pub fn from_fn<F>(points_per_cell: usize, spacing: f32, mut sample: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let side = points_per_cell + 1;
        let mut heights = Vec::with_capacity(side * side);
        for i in 0..side {
            for j in 0..side {
                heights.push(sample(i, j));
            }
        }
        Self {
            side,
            spacing,
            heights,
        }
    }

    /// Lattice points along one axis (`points_per_cell + 1`).
    pub fn side(&self) -> usize {
        self.side
    }

    /// Quads along one axis.
    pub fn quads(&self) -> usize {
        self.side - 1
    }

    /// World-unit distance between neighbouring lattice points.
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Height stored at lattice point `(i, j)`.
    ///
    /// # Panics
    /// Panics if either index is outside `[0, side)`.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.side, "lattice i out of bounds");
        assert!(j < self.side, "lattice j out of bounds");
        self.heights[i * self.side + j]
    }

    /// Raw heights in `[i][j]` row-major order.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Mean of the four lattice corners enclosing cell-local point `(local_x, local_z)`.
    ///
    /// This is deliberately not bilinear: every point inside a quad reports the
    /// same height. Callers are responsible for keeping the point inside the
    /// lattice footprint.
    pub fn corner_mean(&self, local_x: f32, local_z: f32) -> f32 {
        let (i, j) = self.enclosing_quad(local_x, local_z);
        (self.get(i, j) + self.get(i + 1, j) + self.get(i, j + 1) + self.get(i + 1, j + 1)) / 4.0
    }

    /// True bilinear interpolation of the enclosing quad, for comparison with
    /// [`HeightLattice::corner_mean`].
    pub fn bilinear(&self, local_x: f32, local_z: f32) -> f32 {
        let (i, j) = self.enclosing_quad(local_x, local_z);
        let tx = (local_x / self.spacing - i as f32).clamp(0.0, 1.0);
        let tz = (local_z / self.spacing - j as f32).clamp(0.0, 1.0);
        let near = self.get(i, j) + tx * (self.get(i + 1, j) - self.get(i, j));
        let far = self.get(i, j + 1) + tx * (self.get(i + 1, j + 1) - self.get(i, j + 1));
        near + tz * (far - near)
    }

    fn enclosing_quad(&self, local_x: f32, local_z: f32) -> (usize, usize) {
        let last = self.quads() - 1;
        let i = ((local_x / self.spacing).floor().max(0.0) as usize).min(last);
        let j = ((local_z / self.spacing).floor().max(0.0) as usize).min(last);
        (i, j)
    }

    /// Lowest sampled elevation.
    pub fn min_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Highest sampled elevation.
    pub fn max_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Mean sampled elevation.
    pub fn avg_height(&self) -> f32 {
        self.heights.iter().sum::<f32>() / self.heights.len() as f32
    }
}

/// Scalar type of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// 32-bit float.
    F32,
}

impl AttributeKind {
    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            AttributeKind::F32 => std::mem::size_of::<f32>(),
        }
    }
}

/// One entry of an interleaved vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Element count (e.g. 3 for a position).
    pub elements: usize,
    /// Element scalar type.
    pub kind: AttributeKind,
    /// Byte size of one element.
    pub type_size: usize,
}

impl VertexAttribute {
    /// Attribute made of `elements` floats.
    pub const fn f32s(elements: usize) -> Self {
        Self {
            elements,
            kind: AttributeKind::F32,
            type_size: AttributeKind::F32.size(),
        }
    }

    /// Bytes occupied by this attribute inside one vertex.
    pub const fn byte_len(&self) -> usize {
        self.elements * self.type_size
    }
}

/// Surface material picked from vertex elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Material {
    /// Below sea level.
    Sand = 0,
    /// Shoreline rock.
    Stone = 1,
    /// Low slopes.
    Dirt = 2,
    /// Everything higher.
    Grass = 3,
}

impl Material {
    /// Select a material by elevation thresholds.
    pub fn for_height(height: f32) -> Self {
        if height < 0.0 {
            Material::Sand
        } else if height < 2.0 {
            Material::Stone
        } else if height < 4.0 {
            Material::Dirt
        } else {
            Material::Grass
        }
    }

    /// Texture array layer handed to the shader.
    pub fn index(self) -> f32 {
        self as u8 as f32
    }
}

/// Interleaved vertex emitted for terrain meshes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// Position in cell-local coordinates.
    pub position: [f32; 3],
    /// Face normal (unit length, facing up).
    pub normal: [f32; 3],
    /// Per-triangle texture coordinates.
    pub uv: [f32; 2],
    /// [`Material`] index as a float.
    pub material: f32,
}

impl TerrainVertex {
    /// Attribute layout matching the field order above.
    pub const LAYOUT: [VertexAttribute; 4] = [
        VertexAttribute::f32s(3),
        VertexAttribute::f32s(3),
        VertexAttribute::f32s(2),
        VertexAttribute::f32s(1),
    ];

    /// Floats per vertex.
    pub const FLOATS: usize = 9;

    fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
            material: Material::for_height(position.y).index(),
        }
    }
}

/// Hash of a mesh's vertex bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Lowercase hex rendering for logs and metrics.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Flattened triangle list for one cell.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    vertices: Vec<TerrainVertex>,
    hash: MeshHash,
}

impl SurfaceMesh {
    /// Wrap vertices, hashing them for determinism checks.
    pub fn new(vertices: Vec<TerrainVertex>) -> Self {
        let hash = MeshHash(*blake3::hash(bytemuck::cast_slice(&vertices)).as_bytes());
        Self { vertices, hash }
    }

    /// All vertices, three per triangle.
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Vertex data as one contiguous float buffer.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Attribute layout of [`SurfaceMesh::as_floats`].
    pub fn layout(&self) -> &'static [VertexAttribute] {
        &TerrainVertex::LAYOUT
    }

    /// Stable content hash.
    pub fn hash(&self) -> MeshHash {
        self.hash
    }
}

/// Samples lattices and builds meshes for cells of one terrain.
#[derive(Debug, Clone)]
pub struct SurfaceBuilder {
    noise: GradientNoise,
    shape: HeightTransform,
    cell_size: f64,
    resolution: f64,
    points_per_cell: usize,
    spacing: f32,
    noise_divisor: f64,
}

impl SurfaceBuilder {
    /// Create a builder for the given noise field and configuration.
    pub fn new(noise: GradientNoise, config: &TerrainConfig) -> Self {
        Self {
            noise,
            shape: config.height_transform(),
            cell_size: f64::from(config.cell_size),
            resolution: f64::from(config.resolution),
            points_per_cell: config.points_per_cell(),
            spacing: config.lattice_spacing(),
            noise_divisor: config.noise_divisor,
        }
    }

    /// Elevation at an arbitrary world position, straight from the noise field.
    pub fn sample_height(&self, world_x: f64, world_z: f64) -> f32 {
        let n = self
            .noise
            .sample(world_x / self.noise_divisor, world_z / self.noise_divisor);
        self.shape.apply(n)
    }

    /// Sample the height lattice of `coord`.
    pub fn build_lattice(&self, coord: CellCoord) -> HeightLattice {
        let origin_x = f64::from(coord.x) * self.cell_size;
        let origin_z = f64::from(coord.z) * self.cell_size;
        HeightLattice::from_fn(self.points_per_cell, self.spacing, |i, j| {
            let world_x = origin_x + i as f64 / self.resolution;
            let world_z = origin_z + j as f64 / self.resolution;
            self.sample_height(world_x, world_z)
        })
    }

    /// Triangulate a lattice into cell-local vertex data.
    pub fn build_mesh(&self, lattice: &HeightLattice) -> SurfaceMesh {
        let quads = lattice.quads();
        let s = lattice.spacing();
        let mut vertices = Vec::with_capacity(quads * quads * 6);

        for i in 0..quads {
            for j in 0..quads {
                let (fi, fj) = (i as f32 * s, j as f32 * s);
                let h00 = lattice.get(i, j);
                let h10 = lattice.get(i + 1, j);
                let h01 = lattice.get(i, j + 1);
                let h11 = lattice.get(i + 1, j + 1);

                let diag = Vec3::new(s, h11 - h00, s);
                let right = Vec3::new(s, h10 - h00, 0.0);
                let up = Vec3::new(0.0, h01 - h00, s);
                let n1 = upward(diag.cross(right));
                let n2 = upward(diag.cross(up));

                let p00 = Vec3::new(fi, h00, fj);
                let p10 = Vec3::new(fi + s, h10, fj);
                let p01 = Vec3::new(fi, h01, fj + s);
                let p11 = Vec3::new(fi + s, h11, fj + s);

                vertices.extend_from_slice(&[
                    TerrainVertex::new(p00, n1, [0.0, 0.0]),
                    TerrainVertex::new(p10, n1, [1.0, 0.0]),
                    TerrainVertex::new(p11, n1, [1.0, 1.0]),
                    TerrainVertex::new(p00, n2, [0.0, 0.0]),
                    TerrainVertex::new(p01, n2, [0.0, 1.0]),
                    TerrainVertex::new(p11, n2, [1.0, 1.0]),
                ]);
            }
        }

        SurfaceMesh::new(vertices)
    }
}

/// Normalize and flip so the normal never points down.
fn upward(normal: Vec3) -> Vec3 {
    let n = normal.normalize();
    if n.y < 0.0 {
        -n
    } else {
        n
    }
}
