//! New-game world generation

use tracing::info;

use crate::core::config::SimulationConfig;
use crate::core::types::Rgb;
use crate::faction::lore::{self, FOUNDER_SYMBOLS};
use crate::faction::record::{Archetype, Behavior, Faction};
use crate::simulation::world::World;

/// Fresh world: biomes, founding factions, relations and starting territory
pub fn new_game(config: SimulationConfig) -> World {
    let mut world = World::new(config);
    populate(&mut world);
    world
}

/// Create the founding factions and scatter them over empty cells.
/// Returns the number of factions created.
pub fn populate(world: &mut World) -> usize {
    let count = world.config.factions.initial_count;
    let cells = world.config.factions.initial_cells;
    let budget = world.config.factions.placement_probe_budget;

    let mut founders = Vec::with_capacity(count);
    for i in 0..count {
        let archetype = Archetype::random(&mut world.rng);
        let color = Rgb::random(&mut world.rng);
        let behavior = Behavior::random(&mut world.rng);
        let symbol = lore::pick(&mut world.rng, &FOUNDER_SYMBOLS).to_string();
        let dna = lore::archetype_dna(archetype, &mut world.rng);
        let faction_lore = lore::random_lore(&mut world.rng);
        let capital = (!world.grid.is_empty()).then(|| world.grid.random_coord(&mut world.rng));

        let id = world.spawn_faction(|id| {
            let mut f = Faction::new(id, format!("Faction {}", i + 1), color, behavior)
                .with_personality(archetype.personality())
                .with_symbol(symbol)
                .with_dna(dna);
            f.archetype = archetype;
            f.capital = capital;
            f.lore = Some(faction_lore);
            f
        });
        founders.push((id, capital));
    }

    world.registry.backfill_relations(&mut world.rng);

    let mut placed_total = 0;
    for (id, capital) in founders {
        let mut placed = 0;
        if let Some(capital) = capital {
            if world.grid.owner_at(capital).is_none() {
                world.grid.set_owner(capital, Some(id));
                placed += 1;
            }
        }
        placed += world
            .grid
            .place_on_empty(id, cells.saturating_sub(placed), budget, &mut world.rng);
        placed_total += placed;
    }

    info!(
        factions = count,
        cells = placed_total,
        width = world.width(),
        height = world.height(),
        "New game generated"
    );
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.seed = Some(99);
        config.grid.width = 60;
        config.grid.height = 40;
        config.factions.initial_count = 20;
        config
    }

    #[test]
    fn test_new_game_populates() {
        let world = new_game(config());
        assert_eq!(world.live_count(), 20);
        for f in world.registry.iter() {
            let owned = world.grid.count_owned_by(f.id);
            assert!(owned > 0 && owned <= 30, "{} owns {}", f.name, owned);
            assert_eq!(f.relations.len(), 19);
            assert!(f.capital.is_some());
            assert!(f.dna.starts_with(f.archetype.initial()));
        }
    }

    #[test]
    fn test_founder_colors_unique() {
        let world = new_game(config());
        let mut colors: Vec<_> = world.registry.iter().map(|f| f.color).collect();
        colors.sort_by_key(|c| c.to_u32());
        colors.dedup();
        assert_eq!(colors.len(), 20);
    }
}
