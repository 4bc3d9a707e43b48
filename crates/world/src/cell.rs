use std::fmt;

use glam::Vec3;
use terracell_core::WorldSeed;
use tracing::{debug, instrument};

use crate::config::TerrainConfig;
use crate::decoration::{Decoration, Decorator};
use crate::error::TerrainError;
use crate::noise::GradientNoise;
use crate::surface::{HeightLattice, SurfaceBuilder, SurfaceMesh};

/// Cell coordinate (X, Z) in cell space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

impl CellCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Cell containing a world-space point (floor division on both axes).
    pub fn from_world(world_x: f32, world_z: f32, cell_size: u32) -> Self {
        let size = f64::from(cell_size);
        Self {
            x: (f64::from(world_x) / size).floor() as i32,
            z: (f64::from(world_z) / size).floor() as i32,
        }
    }

    /// World position of the cell's minimum corner.
    pub fn origin(&self, cell_size: u32) -> Vec3 {
        let size = cell_size as f32;
        Vec3::new(self.x as f32 * size, 0.0, self.z as f32 * size)
    }

    /// Square window of cells around this one, X-major then Z.
    ///
    /// The window is clipped at the edges of the `i32` cell domain.
    pub fn cells_in_radius(&self, radius: u32) -> Vec<CellCoord> {
        let (x_lo, x_hi) = axis_span(self.x, radius);
        let (z_lo, z_hi) = axis_span(self.z, radius);
        let side = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as usize;
        let mut cells = Vec::with_capacity(side(x_lo, x_hi) * side(z_lo, z_hi));
        for x in x_lo..=x_hi {
            for z in z_lo..=z_hi {
                cells.push(CellCoord::new(x, z));
            }
        }
        cells
    }

    /// Single-integer key `x * k + z`.
    ///
    /// Only bijective while `2 * |z| < k`; storage keys on the coordinate pair
    /// itself, this is kept for logs and external tooling.
    pub fn packed_key(&self, k: i64) -> i64 {
        i64::from(self.x) * k + i64::from(self.z)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

fn axis_span(center: i32, radius: u32) -> (i32, i32) {
    let radius = i64::from(radius);
    let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    (
        clamp(i64::from(center) - radius),
        clamp(i64::from(center) + radius),
    )
}

/// Resolve a world point to its owning cell and cell-local offsets.
///
/// Local offsets are inside `[0, cell_size)`, even when float rounding would
/// push a point that sits just below a cell edge onto the edge itself. Points
/// beyond the `i32` cell domain resolve to the outermost cell with an offset
/// outside its footprint, so height queries there fail instead of aliasing.
pub fn resolve_world(world_x: f32, world_z: f32, cell_size: u32) -> (CellCoord, f32, f32) {
    let (x, local_x) = resolve_axis(world_x, cell_size);
    let (z, local_z) = resolve_axis(world_z, cell_size);
    (CellCoord::new(x, z), local_x, local_z)
}

fn resolve_axis(world: f32, cell_size: u32) -> (i32, f32) {
    let size = f64::from(cell_size);
    let floored = (f64::from(world) / size).floor();
    let cell = floored.clamp(f64::from(i32::MIN), f64::from(i32::MAX));
    let mut local = (f64::from(world) - cell * size) as f32;
    if cell != floored {
        return (cell as i32, local);
    }
    let mut cell = cell as i32;
    if local >= cell_size as f32 {
        if let Some(next) = cell.checked_add(1) {
            cell = next;
            local = (local - cell_size as f32).max(0.0);
        }
    }
    (cell, local.max(0.0))
}

/// Everything needed to build cells of one terrain.
#[derive(Debug, Clone)]
pub struct CellGenerator {
    seed: WorldSeed,
    config: TerrainConfig,
    surface: SurfaceBuilder,
    decorator: Decorator,
}

impl CellGenerator {
    /// Create a generator; `config` is assumed to be validated.
    pub fn new(seed: WorldSeed, config: TerrainConfig) -> Self {
        let surface = SurfaceBuilder::new(GradientNoise::new(seed), &config);
        let decorator = Decorator::new(seed, &config);
        Self {
            seed,
            config,
            surface,
            decorator,
        }
    }

    /// Seed shared by every generated cell.
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Settings cells are generated with.
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Surface builder used for lattices and meshes.
    pub fn surface(&self) -> &SurfaceBuilder {
        &self.surface
    }

    /// Build a complete cell at `coord`.
    #[instrument(skip(self), fields(seed = self.seed.0))]
    pub fn generate(&self, coord: CellCoord) -> TerrainCell {
        let lattice = self.surface.build_lattice(coord);
        let mesh = self.surface.build_mesh(&lattice);
        let decorations = self.decorator.decorate(coord, &lattice);
        debug!(
            vertices = mesh.vertex_count(),
            decorations = decorations.len(),
            "cell generated"
        );
        TerrainCell {
            coord,
            cell_size: self.config.cell_size,
            lattice,
            mesh,
            decorations,
        }
    }
}

/// Generated unit of terrain: height lattice, mesh and decorations.
///
/// Built once; nothing mutates a cell after construction.
#[derive(Debug, Clone)]
pub struct TerrainCell {
    coord: CellCoord,
    cell_size: u32,
    lattice: HeightLattice,
    mesh: SurfaceMesh,
    decorations: Vec<Decoration>,
}

impl TerrainCell {
    /// Generate the cell at `coord` from scratch.
    pub fn new(seed: WorldSeed, coord: CellCoord, config: &TerrainConfig) -> Self {
        CellGenerator::new(seed, config.clone()).generate(coord)
    }

    /// Cell coordinate.
    pub fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Edge length in world units.
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// World position of the cell's minimum corner.
    pub fn origin(&self) -> Vec3 {
        self.coord.origin(self.cell_size)
    }

    /// Retained height samples.
    pub fn lattice(&self) -> &HeightLattice {
        &self.lattice
    }

    /// Renderable vertex data in cell-local space.
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// Decorations placed on this cell.
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Terrain height at a world position inside this cell.
    ///
    /// # Errors
    /// Returns [`TerrainError::HeightOutOfRange`] when the point is outside the
    /// cell footprint `[origin, origin + cell_size)` on either axis.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> Result<f32, TerrainError> {
        let size = f64::from(self.cell_size);
        let local_x = (f64::from(world_x) - f64::from(self.coord.x) * size) as f32;
        let local_z = (f64::from(world_z) - f64::from(self.coord.z) * size) as f32;
        self.checked_height(world_x, world_z, local_x, local_z)
    }

    /// Terrain height at cell-local offsets in world units.
    ///
    /// # Errors
    /// Returns [`TerrainError::HeightOutOfRange`] unless both offsets are in
    /// `[0, cell_size)`.
    pub fn height_at_local(&self, local_x: f32, local_z: f32) -> Result<f32, TerrainError> {
        let origin = self.origin();
        self.checked_height(origin.x + local_x, origin.z + local_z, local_x, local_z)
    }

    /// Compare the lattice edge shared with the +X or +Z neighbour.
    ///
    /// Returns `None` when `neighbor` is not one of those two cells, otherwise
    /// whether every shared lattice value is bit-identical.
    pub fn seam_matches(&self, neighbor: &TerrainCell) -> Option<bool> {
        let dx = i64::from(neighbor.coord.x) - i64::from(self.coord.x);
        let dz = i64::from(neighbor.coord.z) - i64::from(self.coord.z);
        let side = self.lattice.side();
        let last = side - 1;
        let same = |a: f32, b: f32| a.to_bits() == b.to_bits();
        let ours = &self.lattice;
        let theirs = &neighbor.lattice;
        match (dx, dz) {
            (1, 0) | (0, 1) if theirs.side() != side => Some(false),
            (1, 0) => Some((0..side).all(|j| same(ours.get(last, j), theirs.get(0, j)))),
            (0, 1) => Some((0..side).all(|i| same(ours.get(i, last), theirs.get(i, 0)))),
            _ => None,
        }
    }

    fn checked_height(
        &self,
        world_x: f32,
        world_z: f32,
        local_x: f32,
        local_z: f32,
    ) -> Result<f32, TerrainError> {
        let footprint = 0.0..self.cell_size as f32;
        if !footprint.contains(&local_x) || !footprint.contains(&local_z) {
            return Err(TerrainError::HeightOutOfRange {
                world_x,
                world_z,
                local_x,
                local_z,
                cell: self.coord,
                cell_size: self.cell_size,
            });
        }
        Ok(self.lattice.corner_mean(local_x, local_z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cell_size: u32) -> TerrainConfig {
        TerrainConfig {
            cell_size,
            ..Default::default()
        }
    }

    #[test]
    fn from_world_uses_floor_division() {
        assert_eq!(CellCoord::from_world(20.0, -5.0, 8), CellCoord::new(2, -1));
        assert_eq!(CellCoord::from_world(0.0, 0.0, 8), CellCoord::new(0, 0));
        assert_eq!(CellCoord::from_world(-0.5, 7.99, 8), CellCoord::new(-1, 0));
        assert_eq!(CellCoord::from_world(-8.0, 8.0, 8), CellCoord::new(-1, 1));
    }

    #[test]
    fn resolve_world_reports_local_offsets() {
        let (cell, lx, lz) = resolve_world(20.0, -5.0, 8);
        assert_eq!(cell, CellCoord::new(2, -1));
        assert_eq!((lx, lz), (4.0, 3.0));
    }

    #[test]
    fn resolve_world_never_lands_on_upper_edge() {
        let (cell, lx, _) = resolve_world(-1e-30, 0.0, 8);
        assert!((0.0..8.0).contains(&lx));
        assert!(cell.x == -1 || cell.x == 0);
    }

    #[test]
    fn cells_in_radius_is_x_major() {
        let cells = CellCoord::new(0, 0).cells_in_radius(1);
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], CellCoord::new(-1, -1));
        assert_eq!(cells[1], CellCoord::new(-1, 0));
        assert_eq!(cells[8], CellCoord::new(1, 1));
    }

    #[test]
    fn cells_in_radius_clips_at_domain_edge() {
        let cells = CellCoord::new(i32::MAX, i32::MIN).cells_in_radius(1);
        assert_eq!(
            cells,
            vec![
                CellCoord::new(i32::MAX - 1, i32::MIN),
                CellCoord::new(i32::MAX - 1, i32::MIN + 1),
                CellCoord::new(i32::MAX, i32::MIN),
                CellCoord::new(i32::MAX, i32::MIN + 1),
            ]
        );
    }

    #[test]
    fn resolve_world_beyond_domain_stays_out_of_range() {
        let (cell, lx, lz) = resolve_world(1.0e12, -1.0e12, 8);
        assert_eq!(cell, CellCoord::new(i32::MAX, i32::MIN));
        assert!(lx >= 8.0);
        assert!(lz < 0.0);

        let edge = TerrainCell::new(WorldSeed(3284), CellCoord::new(i32::MAX, 0), &config(8));
        assert!(matches!(
            edge.height_at_local(lx, 1.0),
            Err(TerrainError::HeightOutOfRange { .. })
        ));
    }

    #[test]
    fn neighbouring_cells_share_edges() {
        let cfg = config(8);
        let origin = TerrainCell::new(WorldSeed(3284), CellCoord::new(-3, 7), &cfg);
        let east = TerrainCell::new(WorldSeed(3284), CellCoord::new(-2, 7), &cfg);
        let north = TerrainCell::new(WorldSeed(3284), CellCoord::new(-3, 8), &cfg);
        assert_eq!(origin.seam_matches(&east), Some(true));
        assert_eq!(origin.seam_matches(&north), Some(true));
        assert_eq!(east.seam_matches(&origin), None);
        assert_eq!(east.seam_matches(&north), None);

        // same coordinate, different seed: edges no longer line up
        let foreign = TerrainCell::new(WorldSeed(7), CellCoord::new(-2, 7), &cfg);
        assert_eq!(origin.seam_matches(&foreign), Some(false));
    }

    #[test]
    fn packed_key_matches_formula() {
        assert_eq!(CellCoord::new(3, -2).packed_key(32768), 3 * 32768 - 2);
        // collides once |z| reaches half the multiplier
        assert_eq!(
            CellCoord::new(1, -16384).packed_key(32768),
            CellCoord::new(0, 16384).packed_key(32768)
        );
    }

    #[test]
    fn height_query_matches_corner_mean() {
        let cell = TerrainCell::new(WorldSeed(3284), CellCoord::new(2, -1), &config(8));
        let lattice = cell.lattice();
        let expected =
            (lattice.get(4, 3) + lattice.get(5, 3) + lattice.get(4, 4) + lattice.get(5, 4)) / 4.0;
        assert_eq!(cell.height_at(20.0, -5.0).expect("in range"), expected);
        assert_eq!(cell.height_at_local(4.0, 3.0).expect("in range"), expected);
    }

    #[test]
    fn upper_boundary_is_rejected() {
        let cell = TerrainCell::new(WorldSeed(3284), CellCoord::new(0, 0), &config(8));
        let err = cell.height_at_local(8.0, 2.0).expect_err("x = cell size");
        match err {
            TerrainError::HeightOutOfRange { cell: c, local_x, .. } => {
                assert_eq!(c, CellCoord::new(0, 0));
                assert_eq!(local_x, 8.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(cell.height_at_local(2.0, 8.0).is_err());
        assert!(cell.height_at_local(-0.001, 2.0).is_err());
        assert!(cell.height_at(9.0, 1.0).is_err());
        assert!(cell.height_at_local(7.999, 7.999).is_ok());
    }

    #[test]
    fn error_message_names_cell_and_coordinates() {
        let cell = TerrainCell::new(WorldSeed(1), CellCoord::new(1, 1), &config(8));
        let msg = cell.height_at(0.0, 0.0).expect_err("outside").to_string();
        assert!(msg.contains("(1, 1)"), "{msg}");
        assert!(msg.contains("(0, 0)"), "{msg}");
    }

    #[test]
    fn generation_is_deterministic() {
        let a = TerrainCell::new(WorldSeed(5), CellCoord::new(-4, 9), &config(10));
        let b = TerrainCell::new(WorldSeed(5), CellCoord::new(-4, 9), &config(10));
        assert_eq!(a.lattice(), b.lattice());
        assert_eq!(a.mesh().hash(), b.mesh().hash());
        assert_eq!(a.decorations(), b.decorations());
    }
}
