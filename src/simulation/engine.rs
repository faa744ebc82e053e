//! Per-tick update rule: spread, attack and contact fusion
//!
//! Ownership is read from the grid as it stood at tick start and written
//! into a separate buffer, so a cell claimed this tick does not act until
//! the next one. Several sources may write the same destination; the last
//! write in visitation order stands. Cooldowns are the exception and are
//! updated in place, so a cell captured earlier in the tick resists a
//! second capture.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::core::config::DominanceConfig;
use crate::core::types::FactionId;
use crate::simulation::merge::fuse_on_contact;
use crate::simulation::power::PowerMap;
use crate::simulation::world::World;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    pub spreads: usize,
    pub captures: usize,
    pub fusions: usize,
}

/// Share of the grid `owner` acts with this tick.
///
/// Once one faction holds at least `snowball_threshold` of the grid its
/// share is scaled down and everyone else's is scaled up.
pub fn effective_power(
    power: &PowerMap,
    owner: FactionId,
    dominant: Option<(FactionId, f64)>,
    cfg: &DominanceConfig,
) -> f64 {
    let raw = power.share(owner);
    match dominant {
        Some((leader, ratio)) if ratio >= cfg.snowball_threshold => {
            if leader == owner {
                raw * cfg.dominant_power_factor
            } else {
                raw * cfg.underdog_power_factor
            }
        }
        _ => raw,
    }
}

/// Advance the grid one tick against a fixed power snapshot
pub fn step(world: &mut World, power: &PowerMap) -> StepStats {
    world.grid.decay_cooldowns();

    let prev = world.grid.owners();
    let mut next = prev.clone();
    let mut order: Vec<usize> = (0..prev.len()).collect();
    order.shuffle(&mut world.rng);

    let combat = world.config.combat.clone();
    let dominance = world.config.dominance.clone();
    let cap = world.config.factions.cap;
    let dominant = power.dominant();
    let mut stats = StepStats::default();

    for idx in order {
        let Some(owner) = prev[idx] else { continue };
        let Some(personality) = world.registry.get(owner).map(|f| f.personality) else {
            continue;
        };

        let coord = world.grid.coord_of(idx);
        let share = effective_power(power, owner, dominant, &dominance);
        let terrain = world.biomes.multiplier_at(coord);
        let spread_chance = (combat.spread_base
            + world.rng.gen::<f64>() * combat.spread_risk_weight * personality.risk
            + share * combat.spread_power_weight * personality.expansionism)
            * terrain;
        let attack_chance = (combat.attack_base
            + world.rng.gen::<f64>() * combat.attack_risk_weight * personality.risk
            + share * combat.attack_power_weight * personality.aggression)
            * terrain;

        for neighbor in world.grid.shuffled_neighbors4(coord, &mut world.rng) {
            let Some(ni) = world.grid.index_of(neighbor) else { continue };
            let target = prev[ni];
            let rival = target.filter(|t| *t != owner && world.registry.contains(*t));

            if let Some(rival) = rival {
                if world.registry.len() < cap && world.roll(combat.fusion_chance) {
                    if let Some(child) = fuse_on_contact(world, owner, rival) {
                        next[ni] = Some(child);
                        stats.fusions += 1;
                        continue;
                    }
                }
            }

            if target.is_none() {
                if world.rng.gen::<f64>() < spread_chance {
                    next[ni] = Some(owner);
                    stats.spreads += 1;
                }
                continue;
            }

            let Some(rival) = rival else { continue };
            let cell = world.grid.cells()[ni];
            if cell.overwrite_cooldown > 0 || cell.claim_age < combat.min_claim_age_for_attack {
                continue;
            }
            let diplomatic_modifier = 1.0 - world.registry.relation(owner, rival).max(0.0);
            let rival_share = effective_power(power, rival, dominant, &dominance);
            if share > rival_share || world.rng.gen::<f64>() < attack_chance * diplomatic_modifier {
                next[ni] = Some(owner);
                world.grid.cells_mut()[ni].overwrite_cooldown = combat.capture_cooldown;
                stats.captures += 1;
            }
        }
    }

    let World { registry, rng, .. } = world;
    for faction in registry.iter_mut() {
        faction.personality.drift(combat.personality_drift, rng);
        faction.age += 1;
    }

    world.grid.commit(&next);
    let purged = world.purge_dangling();

    debug!(
        tick = world.tick,
        spreads = stats.spreads,
        captures = stats.captures,
        fusions = stats.fusions,
        purged,
        "Engine step"
    );
    stats
}
