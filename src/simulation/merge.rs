//! Merge engine - color blending, fusion, auto-merge, rebellion and mutation

use rand::Rng;
use tracing::{debug, info};

use crate::core::error::{ColorWarError, Result};
use crate::core::types::{FactionId, Rgb};
use crate::faction::lore::{self, FUSION_SYMBOLS, REBEL_SYMBOLS};
use crate::faction::record::{Behavior, Faction, Personality};
use crate::simulation::chronicle::ChronicleKind;
use crate::simulation::world::World;

/// Per-byte floor average of two `#rrggbb` colors
pub fn blend_colors(a: &str, b: &str) -> Result<String> {
    let a: Rgb = a.parse()?;
    let b: Rgb = b.parse()?;
    Ok(a.blend(b).to_string())
}

/// Child of two parents: blended color, averaged personality, deeper tier,
/// and one parent's behavior.
fn offspring<R: Rng + ?Sized>(id: FactionId, a: &Faction, b: &Faction, rng: &mut R) -> Faction {
    let behavior = if rng.gen_bool(0.5) { a.behavior } else { b.behavior };
    let mut child = Faction::new(id, String::new(), a.color.blend(b.color), behavior)
        .with_personality(Personality::average(&a.personality, &b.personality))
        .with_tier(a.tier.max(b.tier) + 1);
    child.archetype = if rng.gen_bool(0.5) { a.archetype } else { b.archetype };
    child
}

/// Fusion step of the tick rule.
///
/// Reuses the live offspring of the same parent pair when there is one.
/// Returns the child id, or `None` when either parent is gone.
pub fn fuse_on_contact(world: &mut World, a: FactionId, b: FactionId) -> Option<FactionId> {
    if a == b || !world.registry.contains(a) || !world.registry.contains(b) {
        return None;
    }

    let child = match world.registry.by_lineage(a, b) {
        Some(existing) => existing,
        None => {
            let id = world.registry.allocate_id();
            let World { registry, rng, .. } = world;
            let mut child = {
                let fa = registry.get(a)?;
                let fb = registry.get(b)?;
                let mut child = offspring(id, fa, fb, rng);
                child.name = format!("Fusion of {} + {}", fa.name, fb.name);
                child
            };
            child.symbol = lore::pick(rng, &FUSION_SYMBOLS).to_string();
            child.dna = lore::dna_tag('F', rng);
            child.lineage = Some((a.min(b), a.max(b)));
            registry.insert(child);
            registry.roll_relations_for(id, rng);

            debug!(%a, %b, child = %id, "Contact fusion");
            world.record(ChronicleKind::Fusion { parents: (a, b), child: id });
            id
        }
    };

    for parent in [a, b] {
        if let Some(f) = world.registry.get_mut(parent) {
            f.offspring += 1;
        }
    }
    Some(child)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: FactionId,
    pub cells: usize,
}

/// Fold two factions into a new one and retire both parents
pub fn merge_factions(world: &mut World, a: FactionId, b: FactionId) -> Result<MergeOutcome> {
    if a == b {
        return Err(ColorWarError::FactionNotFound(b));
    }
    let fa = world.registry.get(a).ok_or(ColorWarError::FactionNotFound(a))?;
    let fb = world.registry.get(b).ok_or(ColorWarError::FactionNotFound(b))?;

    let id = FactionId(0);
    let mut merged = offspring(id, fa, fb, &mut world.rng);
    merged.name = format!("Merged {}-{}", lore::short_name(&fa.name), lore::short_name(&fb.name));
    merged.symbol = if world.rng.gen_bool(0.5) { fa.symbol.clone() } else { fb.symbol.clone() };
    merged.merges = fa.merges + fb.merges + 1;
    merged.capital = fa.capital.or(fb.capital);
    merged.lore = fa.lore.clone().or_else(|| fb.lore.clone());
    merged.dna = lore::dna_tag('M', &mut world.rng);

    // Parents leave first so the blend never collides with their colors
    world.registry.remove(a);
    world.registry.remove(b);
    merged.id = world.registry.allocate_id();
    let merged_id = world.registry.insert(merged);
    world.registry.roll_relations_for(merged_id, &mut world.rng);

    let cells = world.grid.reassign(&[a, b], Some(merged_id));

    info!(parents = ?(a, b), merged = %merged_id, cells, "Factions merged");
    world.record(ChronicleKind::Merge { parents: (a, b), merged: merged_id, cells });
    Ok(MergeOutcome { merged: merged_id, cells })
}

/// Merge two live factions chosen uniformly at random.
/// Needs at least two live factions.
pub fn auto_merge_random_factions(world: &mut World) -> Option<MergeOutcome> {
    let (a, b) = world.registry.random_pair(&mut world.rng)?;
    merge_factions(world, a, b).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebellionOutcome {
    pub rebel: FactionId,
    pub claimed: usize,
    pub probes: usize,
}

/// Split a rebel faction off `target`'s territory
pub fn spawn_rebellion(world: &mut World, target: FactionId) -> Option<RebellionOutcome> {
    let base = world.registry.get(target)?;
    let tier = base.tier;
    let personality = base.personality.rebel();
    let lore = base.lore.clone();
    let archetype = base.archetype;

    let name = format!("Rebellion {}", world.registry.len() + 1);
    let color = Rgb::random(&mut world.rng);
    let behavior = Behavior::random(&mut world.rng);
    let symbol = lore::pick(&mut world.rng, &REBEL_SYMBOLS).to_string();
    let dna = lore::dna_tag('R', &mut world.rng);

    let rebel = world.spawn_faction(|id| {
        let mut f = Faction::new(id, name, color, behavior)
            .with_personality(personality)
            .with_symbol(symbol)
            .with_tier(tier)
            .with_dna(dna);
        f.archetype = archetype;
        f.lore = lore;
        f
    });
    world.registry.roll_relations_for(rebel, &mut world.rng);

    let cfg = &world.config.population;
    let (max, budget, grace) = (cfg.rebellion_cells, cfg.rebellion_probe_budget, cfg.rebellion_grace);
    let (claimed, probes) = world.grid.probe_replace_with(
        Some(target),
        Some(rebel),
        max,
        budget,
        &mut world.rng,
        |cell| cell.overwrite_cooldown = grace,
    );

    info!(%target, %rebel, claimed, probes, "Rebellion spawned");
    world.record(ChronicleKind::Rebellion { target, rebel, cells: claimed });
    Some(RebellionOutcome { rebel, claimed, probes })
}

/// Re-roll behavior and personality in place. Identity and color stay.
pub fn mutate_faction(world: &mut World, id: FactionId) -> Result<()> {
    let World { registry, rng, .. } = world;
    let faction = registry.get_mut(id).ok_or(ColorWarError::FactionNotFound(id))?;
    faction.behavior = Behavior::random(rng);
    faction.personality = Personality::random(rng, 0.4, 2.0);
    faction.mark_mutated();

    debug!(faction = %id, behavior = %faction.behavior, "Faction mutated");
    world.record(ChronicleKind::Mutation { faction: id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::CellCoord;

    fn world(width: usize, height: usize) -> World {
        let mut config = SimulationConfig::default();
        config.seed = Some(21);
        config.grid.width = width;
        config.grid.height = height;
        config.grid.biome_cells_per_kind = 0;
        World::new(config)
    }

    fn add(world: &mut World, name: &str, color: Rgb) -> FactionId {
        world.spawn_faction(|id| Faction::new(id, name, color, Behavior::Aggressive))
    }

    #[test]
    fn test_blend_colors_examples() {
        assert_eq!(blend_colors("#ff0000", "#00ff00").unwrap(), "#7f7f00");
        assert_eq!(blend_colors("#123456", "#123456").unwrap(), "#123456");
        assert!(blend_colors("#ff0000", "red").is_err());
    }

    #[test]
    fn test_fusion_reuses_lineage_child() {
        let mut w = world(4, 4);
        let a = add(&mut w, "Faction 1", Rgb::new(255, 0, 0));
        let b = add(&mut w, "Faction 2", Rgb::new(0, 255, 0));

        let first = fuse_on_contact(&mut w, a, b).unwrap();
        let again = fuse_on_contact(&mut w, b, a).unwrap();
        assert_eq!(first, again);
        assert_eq!(w.live_count(), 3);

        let child = w.registry.get(first).unwrap();
        assert_eq!(child.name, "Fusion of Faction 1 + Faction 2");
        assert_eq!(child.color, Rgb::new(127, 127, 0));
        assert_eq!(child.tier, 2);
        assert_eq!(w.registry.get(a).unwrap().offspring, 2);
        assert_eq!(w.registry.get(b).unwrap().offspring, 2);
    }

    #[test]
    fn test_fusion_color_nudged_off_live_color() {
        let mut w = world(4, 4);
        let a = add(&mut w, "Faction 1", Rgb::new(255, 0, 0));
        let b = add(&mut w, "Faction 2", Rgb::new(0, 255, 0));
        let squatter = add(&mut w, "Faction 3", Rgb::new(127, 127, 0));

        let child = fuse_on_contact(&mut w, a, b).unwrap();
        assert_ne!(child, squatter);
        assert_ne!(w.registry.get(child).unwrap().color, Rgb::new(127, 127, 0));
    }

    #[test]
    fn test_merge_retires_parents() {
        let mut w = world(4, 4);
        let a = add(&mut w, "Faction 1", Rgb::new(200, 0, 0));
        let b = add(&mut w, "Faction 2", Rgb::new(0, 0, 200));
        let other = add(&mut w, "Faction 3", Rgb::new(0, 200, 0));
        w.grid.set_owner(CellCoord::new(0, 0), Some(a));
        w.grid.set_owner(CellCoord::new(1, 0), Some(b));
        w.grid.set_owner(CellCoord::new(2, 0), Some(other));

        let outcome = merge_factions(&mut w, a, b).unwrap();
        assert_eq!(outcome.cells, 2);
        assert!(!w.registry.contains(a));
        assert!(!w.registry.contains(b));
        assert_eq!(w.grid.count_owned_by(outcome.merged), 2);
        assert_eq!(w.grid.count_owned_by(other), 1);

        let merged = w.registry.get(outcome.merged).unwrap();
        assert_eq!(merged.name, "Merged 1-2");
        assert_eq!(merged.merges, 1);
        assert!(merged.relations.contains_key(&other));
        assert!(w.registry.get(other).unwrap().relations.contains_key(&outcome.merged));
    }

    #[test]
    fn test_merge_unknown_faction_errors() {
        let mut w = world(2, 2);
        let a = add(&mut w, "Faction 1", Rgb::new(1, 0, 0));
        assert!(matches!(
            merge_factions(&mut w, a, FactionId(99)),
            Err(ColorWarError::FactionNotFound(FactionId(99)))
        ));
        assert!(auto_merge_random_factions(&mut w).is_none());
    }

    #[test]
    fn test_rebellion_takes_target_cells_with_grace() {
        let mut w = world(10, 10);
        let target = add(&mut w, "Faction 1", Rgb::new(9, 9, 9));
        for cell in w.grid.cells_mut() {
            cell.owner = Some(target);
        }

        let outcome = spawn_rebellion(&mut w, target).unwrap();
        assert!(outcome.claimed > 0);
        assert!(outcome.claimed <= 100);
        assert!(outcome.probes <= 5000);
        for cell in w.grid.cells().iter().filter(|c| c.owner == Some(outcome.rebel)) {
            assert_eq!(cell.overwrite_cooldown, 8);
            assert_eq!(cell.claim_age, 0);
        }
        let rebel = w.registry.get(outcome.rebel).unwrap();
        assert_eq!(rebel.personality.risk, 2.0);
        assert!(rebel.name.starts_with("Rebellion "));
    }

    #[test]
    fn test_mutate_keeps_identity() {
        let mut w = world(2, 2);
        let id = add(&mut w, "Faction 1", Rgb::new(4, 4, 4));
        mutate_faction(&mut w, id).unwrap();
        mutate_faction(&mut w, id).unwrap();
        let f = w.registry.get(id).unwrap();
        assert_eq!(f.color, Rgb::new(4, 4, 4));
        assert_eq!(f.name, "Faction 1 (Mutated)");
        for v in [f.personality.aggression, f.personality.defense, f.personality.expansionism, f.personality.risk] {
            assert!((0.4..=2.0).contains(&v));
        }
        assert!(mutate_faction(&mut w, FactionId(77)).is_err());
    }
}
