//! Population dynamics: auto-merge, dominance decay, culling, regeneration,
//! tie-break decay and noise injection.
//!
//! Dominance has a single canonical curve. Every `dominance.interval` ticks
//! a leader at or above `decay_threshold` is cut back to `decay_target` of
//! the grid, and never by fewer than `floor(share · decay_scale)` cells. The
//! cut is relative to grid size, so a monopoly erodes on the default board
//! as fast as on a toy one. The leader may then answer with a mutation or a
//! rebellion. Independently, a leader inside the pressure band faces
//! rebellion, mutation and a smaller clearance.

use rand::Rng;
use tracing::{debug, info};

use crate::core::types::{FactionId, Rgb};
use crate::faction::lore::{self, REGEN_SYMBOLS};
use crate::faction::record::{Behavior, Faction, Personality};
use crate::simulation::chronicle::ChronicleKind;
use crate::simulation::merge::{
    auto_merge_random_factions, mutate_faction, spawn_rebellion, MergeOutcome,
};
use crate::simulation::power::PowerMap;
use crate::simulation::world::World;

#[derive(Debug, Default, Clone)]
pub struct PopulationReport {
    pub merged: Option<MergeOutcome>,
    pub decayed: usize,
    pub rebellions: Vec<FactionId>,
    pub mutations: usize,
    pub culled: Option<FactionId>,
    pub regenerated: Vec<FactionId>,
    pub tie_break_cleared: usize,
    pub noise: bool,
}

/// `min(base + tick / ramp, max)`
pub fn auto_merge_chance(world: &World) -> f64 {
    let cfg = &world.config.population;
    (cfg.merge_base_chance + world.tick as f64 / cfg.merge_ramp_ticks).min(cfg.merge_max_chance)
}

/// Run every population policy for the current tick
pub fn apply(world: &mut World) -> PopulationReport {
    let mut report = PopulationReport::default();

    if world.live_count() >= 2 {
        let chance = auto_merge_chance(world);
        if world.roll(chance) {
            report.merged = auto_merge_random_factions(world);
        }
    }

    if world.on_cadence(world.config.dominance.interval) {
        let power = world.power_map();
        apply_dominance(world, &power, &mut report);
    }
    if world.on_cadence(world.config.population.cull_interval) {
        // Decay and rebellions above may have moved cells
        let power = world.power_map();
        report.culled = cull_weakest(world, &power).map(|(id, _)| id);
    }

    report.regenerated = regenerate(world);

    if world.on_cadence(world.config.population.tie_break_interval) {
        report.tie_break_cleared = tie_break_decay(world);
    }

    report.noise = inject_noise(world);
    report
}

/// Cells `leader` loses to decay: down to `decay_target` of the grid, and
/// at least `floor(share · decay_scale)`
pub fn decay_amount(power: &PowerMap, leader: FactionId, decay_scale: f64, decay_target: f64) -> usize {
    let owned = power.count(leader) as usize;
    let keep = (decay_target * power.total_cells() as f64).floor() as usize;
    let floor = (power.share(leader) * decay_scale).floor() as usize;
    owned.saturating_sub(keep).max(floor).min(owned)
}

/// Decay and pressure against the current leader. An empty power map means
/// there is no leader and nothing happens.
pub fn apply_dominance(world: &mut World, power: &PowerMap, report: &mut PopulationReport) {
    let (leader, share) = match power.leader() {
        Ok(leader) => leader,
        Err(e) => {
            debug!(error = %e, "Dominance check skipped");
            return;
        }
    };
    let cfg = world.config.dominance.clone();

    if share >= cfg.decay_threshold {
        let target = decay_amount(power, leader, cfg.decay_scale, cfg.decay_target);
        let cleared = world.grid.shed_owned_by(leader, target, &mut world.rng);
        report.decayed += cleared;
        info!(faction = %leader, share, cleared, "Dominance decay");
        world.record(ChronicleKind::Decay { faction: leader, share, cleared });

        if world.roll(cfg.response_chance) {
            if world.rng.gen_bool(0.5) {
                if mutate_faction(world, leader).is_ok() {
                    report.mutations += 1;
                }
            } else if let Some(outcome) = spawn_rebellion(world, leader) {
                report.rebellions.push(outcome.rebel);
            }
        }
    }

    if (cfg.pressure_min..=cfg.pressure_max).contains(&share) {
        if world.roll(cfg.pressure_rebellion_chance) {
            if let Some(outcome) = spawn_rebellion(world, leader) {
                report.rebellions.push(outcome.rebel);
            }
        }
        if world.roll(cfg.pressure_mutation_chance) && mutate_faction(world, leader).is_ok() {
            report.mutations += 1;
        }
        let mut cleared = 0;
        if world.roll(cfg.pressure_clear_chance) {
            cleared = world.grid.clear_owned_by(
                leader,
                cfg.pressure_clear_cells,
                cfg.decay_probe_budget,
                &mut world.rng,
            );
            report.decayed += cleared;
        }
        world.record(ChronicleKind::Pressure { faction: leader, share, cleared });
    }
}

/// Remove the registry faction holding the fewest cells (ties: lowest id).
/// Only runs while more than `cull_min_factions` are alive.
pub fn cull_weakest(world: &mut World, power: &PowerMap) -> Option<(FactionId, usize)> {
    if let Err(e) = power.leader() {
        debug!(error = %e, "Cull skipped");
        return None;
    }
    if world.live_count() <= world.config.population.cull_min_factions {
        return None;
    }
    let weakest = world
        .registry
        .ids()
        .into_iter()
        .min_by_key(|id| (power.count(*id), *id))?;
    let name = world.faction_name(weakest);
    let cells = world.remove_faction(weakest)?;

    info!(faction = %weakest, %name, cells, "Weakest faction culled");
    world.record(ChronicleKind::Cull { faction: weakest, cells });
    Some((weakest, cells))
}

/// Top the registry back up to the configured floor
pub fn regenerate(world: &mut World) -> Vec<FactionId> {
    let floor = world.config.factions.floor;
    let cells = world.config.factions.regen_cells;
    let budget = world.config.factions.placement_probe_budget;
    let mut spawned = Vec::new();

    while world.live_count() < floor {
        let name = format!("Regen {}", world.live_count() + 1);
        let color = Rgb::random(&mut world.rng);
        let behavior = Behavior::random(&mut world.rng);
        let personality = Personality::random(&mut world.rng, 0.5, 1.5);
        let symbol = lore::pick(&mut world.rng, &REGEN_SYMBOLS).to_string();
        let dna = lore::dna_tag('G', &mut world.rng);
        let faction_lore = lore::random_lore(&mut world.rng);

        let id = world.spawn_faction(|id| {
            let mut f = Faction::new(id, name, color, behavior)
                .with_personality(personality)
                .with_symbol(symbol)
                .with_dna(dna);
            f.lore = Some(faction_lore);
            f
        });
        world.registry.roll_relations_for(id, &mut world.rng);
        let placed = world.grid.place_on_empty(id, cells, budget, &mut world.rng);

        info!(faction = %id, placed, "Faction regenerated");
        world.record(ChronicleKind::Regeneration { faction: id, cells: placed });
        spawned.push(id);
    }
    spawned
}

/// With exactly two factions left, erode both so the stalemate can break
pub fn tie_break_decay(world: &mut World) -> usize {
    if world.live_count() != 2 {
        return 0;
    }
    let cfg = world.config.population.clone();
    let mut cleared = 0;
    for id in world.registry.ids() {
        cleared += world
            .grid
            .clear_owned_by(id, cfg.tie_break_cells, cfg.tie_break_probes, &mut world.rng);
    }
    info!(cleared, "Tie-break decay");
    world.record(ChronicleKind::TieBreak { cleared });
    cleared
}

/// Occasionally hand one random cell to a random live faction
pub fn inject_noise(world: &mut World) -> bool {
    if world.grid.is_empty() || !world.roll(world.config.population.noise_chance) {
        return false;
    }
    let Some(id) = world.registry.random_id(&mut world.rng) else {
        return false;
    };
    let coord = world.grid.random_coord(&mut world.rng);
    world.grid.set_owner(coord, Some(id));
    true
}
