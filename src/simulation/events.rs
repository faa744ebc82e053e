//! World events and disasters
//!
//! Every event is a bounded mutation of the grid or registry: either a
//! fixed number of random probes or a single pass over the cells.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::types::CellCoord;
use crate::faction::lore;
use crate::faction::record::Behavior;
use crate::simulation::chronicle::ChronicleKind;
use crate::simulation::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldEvent {
    TimeWarp,
    ForgottenReturn,
    Singularity,
    DnaCorruption,
}

impl WorldEvent {
    pub const ALL: [WorldEvent; 4] = [
        WorldEvent::TimeWarp,
        WorldEvent::ForgottenReturn,
        WorldEvent::Singularity,
        WorldEvent::DnaCorruption,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WorldEvent::TimeWarp => "Time Warp",
            WorldEvent::ForgottenReturn => "Forgotten Return",
            WorldEvent::Singularity => "Singularity",
            WorldEvent::DnaCorruption => "DNA Corruption",
        }
    }
}

impl fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disaster {
    Plague,
    Quake,
    Flare,
    Volcano,
    Storm,
    Wipeout,
}

impl Disaster {
    pub const ALL: [Disaster; 6] = [
        Disaster::Plague,
        Disaster::Quake,
        Disaster::Flare,
        Disaster::Volcano,
        Disaster::Storm,
        Disaster::Wipeout,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Disaster::Plague => "plague",
            Disaster::Quake => "quake",
            Disaster::Flare => "flare",
            Disaster::Volcano => "volcano",
            Disaster::Storm => "storm",
            Disaster::Wipeout => "wipeout",
        }
    }
}

impl fmt::Display for Disaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventReport {
    pub world_event: Option<(WorldEvent, usize)>,
    pub disaster: Option<(Disaster, usize)>,
}

/// Fire whatever the current tick schedules
pub fn process_events(world: &mut World) -> EventReport {
    let mut report = EventReport::default();
    let cfg = world.config.events.clone();

    if world.on_cadence(cfg.disaster_interval) && world.roll(cfg.disaster_chance) {
        if let Some(&disaster) = Disaster::ALL.choose(&mut world.rng) {
            report.disaster = Some((disaster, trigger_disaster(world, disaster)));
        }
    }

    if world.on_cadence(cfg.world_event_interval) {
        if let Some(&event) = WorldEvent::ALL.choose(&mut world.rng) {
            report.world_event = Some((event, trigger_world_event(world, event)));
        }
    }

    report
}

/// Apply a world event. Returns the number of cells or factions touched.
pub fn trigger_world_event(world: &mut World, event: WorldEvent) -> usize {
    let cfg = world.config.events.clone();
    let affected = match event {
        WorldEvent::TimeWarp => {
            let World { grid, rng, .. } = world;
            let mut cleared = 0;
            for cell in grid.cells_mut() {
                if !cell.is_empty() && rng.gen_bool(cfg.time_warp_chance) {
                    cell.claim(None);
                    cleared += 1;
                }
            }
            cleared
        }
        WorldEvent::ForgottenReturn => match world.registry.random_id(&mut world.rng) {
            Some(id) => world.grid.place_on_empty(
                id,
                cfg.forgotten_return_probes,
                cfg.forgotten_return_probes,
                &mut world.rng,
            ),
            None => 0,
        },
        WorldEvent::Singularity => {
            let (w, h) = (world.width(), world.height());
            let (cx, cy) = (w / 2, h / 2);
            let half = cfg.singularity_size / 2;
            let mut cleared = 0;
            for y in cy.saturating_sub(half)..(cy + half).min(h) {
                for x in cx.saturating_sub(half)..(cx + half).min(w) {
                    if let Some(cell) = world.grid.get_mut(CellCoord::new(x, y)) {
                        if !cell.is_empty() {
                            cell.claim(None);
                            cleared += 1;
                        }
                    }
                }
            }
            cleared
        }
        WorldEvent::DnaCorruption => {
            let World { registry, rng, .. } = world;
            for faction in registry.iter_mut() {
                faction.dna = lore::dna_tag('X', rng);
                faction.behavior = Behavior::random(rng);
            }
            registry.len()
        }
    };

    info!(event = %event, affected, "World event");
    world.record(ChronicleKind::WorldEvent { name: event.name().to_string(), affected });
    affected
}

/// Apply a disaster. Returns the number of cells touched.
pub fn trigger_disaster(world: &mut World, disaster: Disaster) -> usize {
    let cfg = world.config.events.clone();
    let affected = match disaster {
        Disaster::Plague => {
            let mut cleared = 0;
            for _ in 0..cfg.plague_probes {
                let coord = world.grid.random_coord(&mut world.rng);
                if world.grid.owner_at(coord).is_some() {
                    world.grid.set_owner(coord, None);
                    cleared += 1;
                }
            }
            cleared
        }
        Disaster::Quake => {
            let mut swapped = 0;
            for _ in 0..cfg.quake_probes {
                let coord = world.grid.random_coord(&mut world.rng);
                let neighbors: Vec<CellCoord> = world.grid.neighbors4(coord).collect();
                let Some(&other) = neighbors.choose(&mut world.rng) else { continue };
                let (a, b) = (world.grid.owner_at(coord), world.grid.owner_at(other));
                if a != b {
                    world.grid.set_owner(coord, b);
                    world.grid.set_owner(other, a);
                    swapped += 1;
                }
            }
            swapped
        }
        Disaster::Flare => {
            let teleporters: Vec<_> = world
                .registry
                .iter()
                .filter(|f| f.behavior == Behavior::Teleporter)
                .map(|f| f.id)
                .collect();
            teleporters
                .into_iter()
                .filter_map(|id| world.remove_faction(id))
                .sum()
        }
        Disaster::Volcano => match world.power_map().leader() {
            Ok((leader, _)) => world.grid.clear_owned_by(
                leader,
                cfg.volcano_cells,
                cfg.volcano_probes,
                &mut world.rng,
            ),
            Err(e) => {
                debug!(error = %e, "Volcano found no leader");
                0
            }
        },
        Disaster::Storm => {
            let mut eroded = 0;
            for id in world.registry.ids() {
                eroded += world.grid.clear_owned_by(
                    id,
                    cfg.storm_cells_per_faction,
                    cfg.storm_probes,
                    &mut world.rng,
                );
            }
            eroded
        }
        Disaster::Wipeout => {
            if world.live_count() > cfg.wipeout_min_factions {
                world
                    .registry
                    .random_id(&mut world.rng)
                    .and_then(|id| world.remove_faction(id))
                    .unwrap_or(0)
            } else {
                0
            }
        }
    };

    info!(disaster = %disaster, affected, "Disaster struck");
    world.record(ChronicleKind::Disaster { name: disaster.name().to_string(), affected });
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{FactionId, Rgb};
    use crate::faction::record::Faction;

    fn world(width: usize, height: usize) -> World {
        let mut config = SimulationConfig::default();
        config.seed = Some(33);
        config.grid.width = width;
        config.grid.height = height;
        config.grid.biome_cells_per_kind = 0;
        World::new(config)
    }

    fn add(world: &mut World, n: u32, behavior: Behavior) -> FactionId {
        world.spawn_faction(|id| Faction::new(id, format!("Faction {}", n), Rgb::from_u32(n), behavior))
    }

    fn fill(world: &mut World, id: FactionId) {
        for cell in world.grid.cells_mut() {
            cell.owner = Some(id);
        }
    }

    #[test]
    fn test_singularity_clears_center_square() {
        let mut w = world(40, 30);
        let a = add(&mut w, 1, Behavior::Hive);
        fill(&mut w, a);

        let cleared = trigger_world_event(&mut w, WorldEvent::Singularity);
        assert_eq!(cleared, 400);
        assert_eq!(w.grid.owner_at(CellCoord::new(20, 15)), None);
        assert_eq!(w.grid.owner_at(CellCoord::new(10, 5)), None);
        assert_eq!(w.grid.owner_at(CellCoord::new(30, 15)), Some(a));
        assert_eq!(w.grid.owner_at(CellCoord::new(9, 15)), Some(a));
    }

    #[test]
    fn test_singularity_on_small_grid_stays_in_bounds() {
        let mut w = world(6, 4);
        let a = add(&mut w, 1, Behavior::Hive);
        fill(&mut w, a);
        assert_eq!(trigger_world_event(&mut w, WorldEvent::Singularity), 24);
    }

    #[test]
    fn test_forgotten_return_only_uses_empty_cells() {
        let mut w = world(30, 30);
        let a = add(&mut w, 1, Behavior::Hive);
        let placed = trigger_world_event(&mut w, WorldEvent::ForgottenReturn);
        assert!(placed > 0 && placed <= 300);
        assert_eq!(w.grid.count_owned_by(a), placed);
    }

    #[test]
    fn test_dna_corruption_rewrites_every_tag() {
        let mut w = world(4, 4);
        add(&mut w, 1, Behavior::Hive);
        add(&mut w, 2, Behavior::Hive);
        assert_eq!(trigger_world_event(&mut w, WorldEvent::DnaCorruption), 2);
        assert!(w.registry.iter().all(|f| f.dna.starts_with("X-")));
    }

    #[test]
    fn test_flare_removes_teleporters() {
        let mut w = world(4, 4);
        let t = add(&mut w, 1, Behavior::Teleporter);
        let h = add(&mut w, 2, Behavior::Hive);
        w.grid.set_owner(CellCoord::new(0, 0), Some(t));
        w.grid.set_owner(CellCoord::new(1, 0), Some(t));
        w.grid.set_owner(CellCoord::new(2, 0), Some(h));

        assert_eq!(trigger_disaster(&mut w, Disaster::Flare), 2);
        assert!(!w.registry.contains(t));
        assert!(w.registry.contains(h));
        assert_eq!(w.grid.count_owned_by(h), 1);
    }

    #[test]
    fn test_wipeout_needs_more_than_three() {
        let mut w = world(4, 4);
        for n in 1..=3 {
            add(&mut w, n, Behavior::Hive);
        }
        trigger_disaster(&mut w, Disaster::Wipeout);
        assert_eq!(w.live_count(), 3);

        add(&mut w, 4, Behavior::Hive);
        trigger_disaster(&mut w, Disaster::Wipeout);
        assert_eq!(w.live_count(), 3);
    }

    #[test]
    fn test_storm_caps_erosion_per_faction() {
        let mut w = world(30, 30);
        let a = add(&mut w, 1, Behavior::Hive);
        fill(&mut w, a);
        let eroded = trigger_disaster(&mut w, Disaster::Storm);
        assert_eq!(eroded, 80);
        assert_eq!(w.grid.count_owned_by(a), 900 - 80);
    }

    #[test]
    fn test_quake_preserves_cell_counts() {
        let mut w = world(10, 10);
        let a = add(&mut w, 1, Behavior::Hive);
        let b = add(&mut w, 2, Behavior::Hive);
        for (i, cell) in w.grid.cells_mut().iter_mut().enumerate() {
            cell.owner = if i % 3 == 0 { Some(a) } else if i % 3 == 1 { Some(b) } else { None };
        }
        let (before_a, before_b) = (w.grid.count_owned_by(a), w.grid.count_owned_by(b));
        trigger_disaster(&mut w, Disaster::Quake);
        assert_eq!(w.grid.count_owned_by(a), before_a);
        assert_eq!(w.grid.count_owned_by(b), before_b);
    }

    #[test]
    fn test_events_follow_cadence() {
        let mut w = world(8, 8);
        w.config.events.disaster_chance = 1.0;
        add(&mut w, 1, Behavior::Hive);

        w.tick = 99;
        assert_eq!(process_events(&mut w), EventReport::default());

        w.tick = 500;
        let report = process_events(&mut w);
        assert!(report.disaster.is_some());
        assert!(report.world_event.is_some());
        assert_eq!(w.chronicle.len(), 2);
    }

    #[test]
    fn test_time_warp_rolls_every_owned_cell() {
        let mut w = world(10, 10);
        let a = add(&mut w, 1, Behavior::Hive);
        fill(&mut w, a);

        w.config.events.time_warp_chance = 0.0;
        assert_eq!(trigger_world_event(&mut w, WorldEvent::TimeWarp), 0);
        assert_eq!(w.grid.count_owned_by(a), 100);

        w.config.events.time_warp_chance = 1.0;
        assert_eq!(trigger_world_event(&mut w, WorldEvent::TimeWarp), 100);
        assert_eq!(w.grid.empty_count(), 100);
        assert!(w.chronicle.iter().any(|e| matches!(
            &e.kind,
            ChronicleKind::WorldEvent { affected: 100, .. }
        )));
    }

    #[test]
    fn test_plague_is_bounded_by_its_samples() {
        let mut w = world(30, 30);
        let a = add(&mut w, 1, Behavior::Hive);
        fill(&mut w, a);

        let cleared = trigger_disaster(&mut w, Disaster::Plague);
        assert!(cleared > 0 && cleared <= w.config.events.plague_probes);
        assert_eq!(w.grid.count_owned_by(a), 900 - cleared);

        // An empty board has nothing to infect
        let mut empty = world(30, 30);
        add(&mut empty, 1, Behavior::Hive);
        assert_eq!(trigger_disaster(&mut empty, Disaster::Plague), 0);
    }

    #[test]
    fn test_volcano_hits_only_the_leader() {
        let mut w = world(50, 50);
        let leader = add(&mut w, 1, Behavior::Hive);
        let minor = add(&mut w, 2, Behavior::Hive);
        for (i, cell) in w.grid.cells_mut().iter_mut().enumerate() {
            cell.owner = Some(if i < 2000 { leader } else { minor });
        }

        let cleared = trigger_disaster(&mut w, Disaster::Volcano);
        assert!(cleared > 0 && cleared <= w.config.events.volcano_cells);
        assert_eq!(w.grid.count_owned_by(leader), 2000 - cleared);
        assert_eq!(w.grid.count_owned_by(minor), 500);
    }

    #[test]
    fn test_volcano_without_leader_is_a_no_op() {
        let mut w = world(10, 10);
        add(&mut w, 1, Behavior::Hive);
        assert_eq!(trigger_disaster(&mut w, Disaster::Volcano), 0);
    }
}
