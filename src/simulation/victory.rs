//! Victory monitor - observes domination, never halts the simulation

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::types::FactionId;
use crate::simulation::chronicle::ChronicleKind;
use crate::simulation::power::PowerMap;
use crate::simulation::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominationReport {
    pub faction: FactionId,
    pub share: f64,
}

/// Every faction holding at least `threshold` of the grid
pub fn check_victory(power: &PowerMap, threshold: f64) -> Vec<DominationReport> {
    let mut reports: Vec<_> = power
        .iter()
        .map(|(faction, _)| DominationReport { faction, share: power.share(faction) })
        .filter(|r| r.share >= threshold)
        .collect();
    reports.sort_by_key(|r| r.faction);
    reports
}

/// Check and announce. A faction is logged and chronicled when it first
/// reaches the threshold, not on every tick it stays there.
pub fn observe(world: &mut World, power: &PowerMap) -> Vec<DominationReport> {
    let reports = check_victory(power, world.config.dominance.victory_threshold);
    let current = reports.first().map(|r| r.faction);

    if let Some(report) = reports.first() {
        if world.dominator != current {
            let quote = world
                .registry
                .get(report.faction)
                .and_then(|f| f.lore.as_ref())
                .map(|l| l.victory_quote.clone())
                .unwrap_or_default();
            info!(
                faction = %report.faction,
                name = %world.faction_name(report.faction),
                share = report.share,
                %quote,
                "Faction dominates the map"
            );
            world.record(ChronicleKind::Domination { faction: report.faction, share: report.share });
        }
    }
    world.dominator = current;
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let a = FactionId(1);
        let at = PowerMap::from_counts(vec![(a, 950)], 1000);
        assert_eq!(check_victory(&at, 0.95), vec![DominationReport { faction: a, share: 0.95 }]);

        let below = PowerMap::from_counts(vec![(a, 949)], 1000);
        assert!(check_victory(&below, 0.95).is_empty());
    }

    #[test]
    fn test_empty_map_reports_nothing() {
        assert!(check_victory(&PowerMap::default(), 0.95).is_empty());
    }
}
