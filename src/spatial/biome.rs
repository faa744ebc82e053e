//! Static terrain layer
//!
//! Biomes scale spread and attack chance of cells on their coordinates.
//! The map is generated once per world and never changes afterwards.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::CellCoord;
use crate::spatial::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Biome {
    #[default]
    Plain,
    Forest,
    Lava,
    Oasis,
}

impl Biome {
    /// Placement order. An earlier kind keeps a coordinate drawn twice.
    pub const GENERATED: [Biome; 3] = [Biome::Forest, Biome::Lava, Biome::Oasis];

    pub fn multiplier(self) -> f64 {
        match self {
            Biome::Plain => 1.0,
            Biome::Forest => 0.5,
            Biome::Lava => 0.1,
            Biome::Oasis => 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomeMap {
    tiles: Grid<Biome>,
}

impl BiomeMap {
    /// A featureless map where every multiplier is 1.0
    pub fn plain(width: usize, height: usize) -> Self {
        Self {
            tiles: Grid::new(width, height),
        }
    }

    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        cells_per_kind: usize,
        rng: &mut R,
    ) -> Self {
        let mut map = Self::plain(width, height);
        if map.tiles.is_empty() {
            return map;
        }
        for biome in Biome::GENERATED {
            for _ in 0..cells_per_kind {
                let coord = map.tiles.random_coord(rng);
                if let Some(tile) = map.tiles.get_mut(coord) {
                    if *tile == Biome::Plain {
                        *tile = biome;
                    }
                }
            }
        }
        map
    }

    pub fn biome_at(&self, coord: CellCoord) -> Biome {
        self.tiles.get(coord).copied().unwrap_or_default()
    }

    #[inline]
    pub fn multiplier_at(&self, coord: CellCoord) -> f64 {
        self.biome_at(coord).multiplier()
    }

    pub fn set(&mut self, coord: CellCoord, biome: Biome) {
        self.tiles.set(coord, biome);
    }

    pub fn count(&self, biome: Biome) -> usize {
        self.tiles.cells().iter().filter(|b| **b == biome).count()
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }
}
