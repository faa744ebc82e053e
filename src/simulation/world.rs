//! World - everything a tick reads and writes

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::types::{FactionId, Tick};
use crate::faction::record::Faction;
use crate::faction::registry::FactionRegistry;
use crate::simulation::chronicle::{Chronicle, ChronicleKind};
use crate::simulation::power::PowerMap;
use crate::spatial::biome::BiomeMap;
use crate::spatial::grid::GridState;

pub struct World {
    pub grid: GridState,
    pub biomes: BiomeMap,
    pub registry: FactionRegistry,
    pub chronicle: Chronicle,
    pub config: SimulationConfig,
    pub rng: ChaCha8Rng,
    pub tick: Tick,
    /// Faction last reported as dominating the map
    pub dominator: Option<FactionId>,
}

impl World {
    /// Empty world with generated biomes and no factions
    pub fn new(config: SimulationConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (width, height) = (config.grid.width, config.grid.height);
        let biomes = BiomeMap::generate(width, height, config.grid.biome_cells_per_kind, &mut rng);
        Self {
            grid: GridState::new(width, height),
            biomes,
            registry: FactionRegistry::new(),
            chronicle: Chronicle::with_capacity(config.runtime.chronicle_capacity),
            config,
            rng,
            tick: 0,
            dominator: None,
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    pub fn power_map(&self) -> PowerMap {
        PowerMap::compute_with_threshold(
            &self.grid,
            &self.registry,
            self.config.runtime.parallel_threshold,
        )
    }

    /// Register a faction built from a freshly allocated id
    pub fn spawn_faction(&mut self, build: impl FnOnce(FactionId) -> Faction) -> FactionId {
        let id = self.registry.allocate_id();
        self.registry.insert(build(id))
    }

    /// Remove a faction and clear its cells. Returns the cells cleared.
    pub fn remove_faction(&mut self, id: FactionId) -> Option<usize> {
        self.registry.remove(id)?;
        Some(self.grid.clear_all_owned_by(id))
    }

    /// Empty every cell whose owner left the registry
    pub fn purge_dangling(&mut self) -> usize {
        let registry = &self.registry;
        self.grid.purge_dangling(|id| registry.contains(id))
    }

    /// True on every positive multiple of `interval`
    pub fn on_cadence(&self, interval: u64) -> bool {
        interval > 0 && self.tick > 0 && self.tick % interval == 0
    }

    pub fn roll(&mut self, chance: f64) -> bool {
        chance > 0.0 && self.rng.gen::<f64>() < chance
    }

    pub fn record(&mut self, kind: ChronicleKind) {
        self.chronicle.record(self.tick, kind);
    }

    pub fn faction_name(&self, id: FactionId) -> String {
        self.registry
            .get(id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CellCoord, Rgb};
    use crate::faction::record::Behavior;

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.seed = Some(1);
        config.grid.width = 8;
        config.grid.height = 8;
        config
    }

    #[test]
    fn test_new_world_is_empty() {
        let world = World::new(small_config());
        assert_eq!(world.grid.len(), 64);
        assert_eq!(world.grid.empty_count(), 64);
        assert_eq!(world.live_count(), 0);
        assert_eq!(world.tick, 0);
    }

    #[test]
    fn test_remove_faction_clears_cells() {
        let mut world = World::new(small_config());
        let id = world.spawn_faction(|id| Faction::new(id, "Doomed", Rgb::new(1, 1, 1), Behavior::Hive));
        world.grid.set_owner(CellCoord::new(2, 2), Some(id));
        world.grid.set_owner(CellCoord::new(3, 2), Some(id));

        assert_eq!(world.remove_faction(id), Some(2));
        assert_eq!(world.grid.empty_count(), 64);
        assert_eq!(world.remove_faction(id), None);
    }

    #[test]
    fn test_seeded_worlds_match() {
        let a = World::new(small_config());
        let b = World::new(small_config());
        for y in 0..8 {
            for x in 0..8 {
                let c = CellCoord::new(x, y);
                assert_eq!(a.biomes.biome_at(c), b.biomes.biome_at(c));
            }
        }
    }
}
