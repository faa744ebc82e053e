//! Power snapshot - occupied-cell counts per live faction

use ahash::AHashMap;
use rayon::prelude::*;

use crate::core::error::{ColorWarError, Result};
use crate::core::types::FactionId;
use crate::faction::registry::FactionRegistry;
use crate::spatial::grid::{Cell, GridState};

const PARALLEL_CHUNK: usize = 4096;

/// Cell counts for every live faction holding at least one cell
#[derive(Debug, Clone, Default)]
pub struct PowerMap {
    counts: AHashMap<FactionId, u32>,
    total_cells: usize,
}

fn count_chunk(cells: &[Cell], registry: &FactionRegistry) -> AHashMap<FactionId, u32> {
    let mut counts = AHashMap::new();
    for owner in cells.iter().filter_map(|c| c.owner) {
        if registry.contains(owner) {
            *counts.entry(owner).or_insert(0) += 1;
        }
    }
    counts
}

impl PowerMap {
    pub fn compute(grid: &GridState, registry: &FactionRegistry) -> Self {
        Self {
            counts: count_chunk(grid.cells(), registry),
            total_cells: grid.len(),
        }
    }

    /// Same as `compute`, splitting the count over rayon when the grid has
    /// at least `threshold` cells
    pub fn compute_with_threshold(
        grid: &GridState,
        registry: &FactionRegistry,
        threshold: usize,
    ) -> Self {
        if grid.len() < threshold {
            return Self::compute(grid, registry);
        }
        let counts = grid
            .cells()
            .par_chunks(PARALLEL_CHUNK)
            .map(|chunk| count_chunk(chunk, registry))
            .reduce(AHashMap::new, |mut acc, part| {
                for (id, n) in part {
                    *acc.entry(id).or_insert(0) += n;
                }
                acc
            });
        Self {
            counts,
            total_cells: grid.len(),
        }
    }

    pub fn from_counts(counts: impl IntoIterator<Item = (FactionId, u32)>, total_cells: usize) -> Self {
        Self {
            counts: counts.into_iter().filter(|(_, n)| *n > 0).collect(),
            total_cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn total_cells(&self) -> usize {
        self.total_cells
    }

    pub fn count(&self, id: FactionId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Fraction of the whole grid held by `id`
    pub fn share(&self, id: FactionId) -> f64 {
        if self.total_cells == 0 {
            return 0.0;
        }
        self.count(id) as f64 / self.total_cells as f64
    }

    /// Largest holder and its share. Ties go to the lowest id.
    pub fn dominant(&self) -> Option<(FactionId, f64)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(&id, _)| (id, self.share(id)))
    }

    /// `dominant` for operations that cannot proceed without a leader
    pub fn leader(&self) -> Result<(FactionId, f64)> {
        self.dominant().ok_or(ColorWarError::EmptyPowerMap)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FactionId, u32)> + '_ {
        self.counts.iter().map(|(&id, &n)| (id, n))
    }

    /// Holders sorted by descending count, then id
    pub fn ranked(&self) -> Vec<(FactionId, u32)> {
        let mut out: Vec<_> = self.iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}
