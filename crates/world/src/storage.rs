use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::{CellCoord, CellGenerator, TerrainCell};

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Cells built from scratch.
    pub generated: u64,
    /// Cells dropped to make room.
    pub evicted: u64,
    /// Lookups served from the cache.
    pub hits: u64,
}

/// Result of comparing shared edges between resident neighbours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeamCheck {
    /// Shared edges compared.
    pub checked: usize,
    /// Edges with at least one differing lattice value.
    pub mismatched: usize,
}

/// In-memory cell arena with an LRU eviction policy.
/// Uses BTreeMap for deterministic iteration order.
pub struct CellStorage {
    generator: CellGenerator,
    cells: BTreeMap<CellCoord, Arc<TerrainCell>>,
    lru: LruCache<CellCoord, ()>,
    capacity: usize,
    stats: StorageStats,
}

impl CellStorage {
    /// Create a storage with the desired maximum cell count.
    pub fn new(generator: CellGenerator, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            generator,
            cells: BTreeMap::new(),
            lru: LruCache::new(cap),
            capacity: cap.get(),
            stats: StorageStats::default(),
        }
    }

    /// Number of resident cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true when no cells are currently stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Maximum number of resident cells.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Generation/eviction counters.
    pub fn stats(&self) -> StorageStats {
        self.stats
    }

    /// Generator used for misses.
    pub fn generator(&self) -> &CellGenerator {
        &self.generator
    }

    /// Fetch the cell at `coord`, generating it on a miss.
    ///
    /// A hit marks the cell as most recently used. The same `Arc` is returned
    /// for repeated calls until the cell is evicted.
    pub fn ensure_cell(&mut self, coord: CellCoord) -> Arc<TerrainCell> {
        if let Some(cell) = self.cells.get(&coord).cloned() {
            self.stats.hits += 1;
            self.touch(coord);
            return cell;
        }

        self.evict_if_needed();
        let cell = Arc::new(self.generator.generate(coord));
        self.stats.generated += 1;
        self.cells.insert(coord, Arc::clone(&cell));
        self.touch(coord);
        cell
    }

    /// Peek at a resident cell without touching recency.
    pub fn get(&self, coord: CellCoord) -> Option<&Arc<TerrainCell>> {
        self.cells.get(&coord)
    }

    /// Returns true if `coord` is resident.
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    /// Iterate over currently resident cell coordinates.
    pub fn iter_coords(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.keys().copied()
    }

    /// Iterate over resident cells in coordinate order.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Arc<TerrainCell>> + '_ {
        self.cells.values()
    }

    /// Compare every edge shared by two resident cells.
    pub fn check_seams(&self) -> SeamCheck {
        let mut check = SeamCheck::default();
        for (coord, cell) in &self.cells {
            let east = coord.x.checked_add(1).map(|x| CellCoord::new(x, coord.z));
            let north = coord.z.checked_add(1).map(|z| CellCoord::new(coord.x, z));
            for neighbor in [east, north].into_iter().flatten() {
                let Some(other) = self.cells.get(&neighbor) else {
                    continue;
                };
                check.checked += 1;
                if cell.seam_matches(other) != Some(true) {
                    check.mismatched += 1;
                    debug!(cell = %coord, neighbor = %neighbor, "seam mismatch");
                }
            }
        }
        check
    }

    /// Drop every resident cell.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.lru.clear();
    }

    fn touch(&mut self, coord: CellCoord) {
        self.lru.put(coord, ());
    }

    fn evict_if_needed(&mut self) {
        while self.cells.len() >= self.capacity {
            if let Some((oldest, _)) = self.lru.pop_lru() {
                self.cells.remove(&oldest);
                self.stats.evicted += 1;
                debug!(cell = %oldest, "evicted terrain cell");
            } else {
                break;
            }
        }
    }
}
