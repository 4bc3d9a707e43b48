use std::path::Path;

use anyhow::Result;
use terracell_testkit::{CellMeshMetric, MeshMetricSink};
use terracell_world::{CellCoord, CellStorage, MeshHash, TerrainCell};

/// Mesh stats for one resident cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMeshStat {
    /// Cell this mesh belongs to.
    pub coord: CellCoord,
    /// Number of triangles in the cell mesh.
    pub triangles: usize,
    /// Mesh hash for determinism comparisons.
    pub hash: MeshHash,
}

impl CellMeshStat {
    /// Stats of a single cell.
    pub fn of(cell: &TerrainCell) -> Self {
        Self {
            coord: cell.coord(),
            triangles: cell.mesh().triangle_count(),
            hash: cell.mesh().hash(),
        }
    }
}

/// Stats for every resident cell in coordinate order.
pub fn collect_mesh_stats(storage: &CellStorage) -> Vec<CellMeshStat> {
    storage
        .iter_cells()
        .map(|cell| CellMeshStat::of(cell))
        .collect()
}

/// Convert stats into serializable metrics for CI artifacts.
pub fn stats_to_metrics(stats: &[CellMeshStat]) -> Vec<CellMeshMetric> {
    stats
        .iter()
        .map(|stat| CellMeshMetric {
            cell: [stat.coord.x, stat.coord.z],
            triangles: stat.triangles,
            hash: stat.hash.to_hex(),
        })
        .collect()
}

/// Write metrics to disk using the testkit sink.
pub fn write_metrics_to_file<P: AsRef<Path>>(stats: &[CellMeshStat], path: P) -> Result<()> {
    let metrics = stats_to_metrics(stats);
    let mut sink = MeshMetricSink::create(path)?;
    sink.write(&metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use terracell_core::WorldSeed;
    use terracell_world::{CellGenerator, TerrainConfig};

    use super::*;

    #[test]
    fn stats_cover_resident_cells() {
        let config = TerrainConfig {
            cell_size: 4,
            ..Default::default()
        };
        let mut storage = CellStorage::new(CellGenerator::new(WorldSeed(7), config), 4);
        storage.ensure_cell(CellCoord::new(1, 0));
        storage.ensure_cell(CellCoord::new(-1, 2));
        let stats = collect_mesh_stats(&storage);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].coord, CellCoord::new(-1, 2));
        assert_eq!(stats[0].triangles, 32);

        let metrics = stats_to_metrics(&stats);
        assert_eq!(metrics[1].cell, [1, 0]);
        assert_eq!(metrics[1].hash.len(), 64);
    }

    #[test]
    fn write_metrics_to_file_outputs_json() {
        let stats = vec![CellMeshStat {
            coord: CellCoord::new(1, -2),
            triangles: 12,
            hash: MeshHash([0; 32]),
        }];
        let path = std::env::temp_dir().join("terracell-mesh-metrics-stats.json");
        write_metrics_to_file(&stats, &path).expect("metrics write");
        let contents = fs::read_to_string(&path).expect("read metrics");
        assert!(contents.contains("\"triangles\""));
        assert!(contents.contains("\"cell\""));
        fs::remove_file(&path).ok();
    }
}
