//! Registry of live factions keyed by stable id

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, Rgb};
use crate::faction::record::Faction;

/// Initial relations are drawn from `[-RELATION_SPREAD, RELATION_SPREAD]`
pub const RELATION_SPREAD: f64 = 0.3;

/// Relation roll rounded to two decimals
pub fn roll_relation<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let v: f64 = rng.gen_range(-RELATION_SPREAD..=RELATION_SPREAD);
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactionRegistry {
    factions: BTreeMap<FactionId, Faction>,
    next_id: u32,
}

impl FactionRegistry {
    pub fn new() -> Self {
        Self {
            factions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild from stored records, keeping their ids
    pub fn from_factions(factions: impl IntoIterator<Item = Faction>) -> Self {
        let mut registry = Self::new();
        for faction in factions {
            registry.next_id = registry.next_id.max(faction.id.0 + 1);
            registry.insert(faction);
        }
        registry
    }

    pub fn allocate_id(&mut self) -> FactionId {
        let id = FactionId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Insert a faction, nudging its color off any live faction's color
    pub fn insert(&mut self, mut faction: Faction) -> FactionId {
        let id = faction.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.factions.remove(&id);
        faction.color = self.free_color(faction.color);
        self.factions.insert(id, faction);
        id
    }

    /// First color at or after `candidate` no live faction displays
    pub fn free_color(&self, candidate: Rgb) -> Rgb {
        let mut color = candidate;
        while self.by_color(color).is_some() {
            color = color.offset(1);
        }
        color
    }

    /// Remove a faction and every relation entry pointing at it
    pub fn remove(&mut self, id: FactionId) -> Option<Faction> {
        let removed = self.factions.remove(&id)?;
        for faction in self.factions.values_mut() {
            faction.relations.remove(&id);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.factions.clear();
    }

    #[inline]
    pub fn get(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: FactionId) -> bool {
        self.factions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.factions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    pub fn ids(&self) -> Vec<FactionId> {
        self.factions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Faction> {
        self.factions.values_mut()
    }

    pub fn by_color(&self, color: Rgb) -> Option<FactionId> {
        self.factions.values().find(|f| f.color == color).map(|f| f.id)
    }

    pub fn by_lineage(&self, a: FactionId, b: FactionId) -> Option<FactionId> {
        self.factions.values().find(|f| f.has_lineage(a, b)).map(|f| f.id)
    }

    pub fn random_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<FactionId> {
        if self.factions.is_empty() {
            return None;
        }
        let n = rng.gen_range(0..self.factions.len());
        self.factions.keys().nth(n).copied()
    }

    /// Two distinct ids drawn uniformly
    pub fn random_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(FactionId, FactionId)> {
        let ids = self.ids();
        if ids.len() < 2 {
            return None;
        }
        let picked = rand::seq::index::sample(rng, ids.len(), 2);
        Some((ids[picked.index(0)], ids[picked.index(1)]))
    }

    /// Directed affinity of `from` toward `to`
    pub fn relation(&self, from: FactionId, to: FactionId) -> f64 {
        self.get(from).map(|f| f.relation_to(to)).unwrap_or(0.0)
    }

    /// Roll fresh relations between `id` and every other faction, both ways
    pub fn roll_relations_for<R: Rng + ?Sized>(&mut self, id: FactionId, rng: &mut R) {
        let others: Vec<FactionId> = self.factions.keys().copied().filter(|o| *o != id).collect();
        for other in others {
            let outgoing = roll_relation(rng);
            let incoming = roll_relation(rng);
            if let Some(f) = self.factions.get_mut(&id) {
                f.set_relation(other, outgoing);
            }
            if let Some(f) = self.factions.get_mut(&other) {
                f.set_relation(id, incoming);
            }
        }
    }

    /// Fill every missing directed relation. Returns how many were added.
    pub fn backfill_relations<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let ids = self.ids();
        let mut added = 0;
        for &from in &ids {
            for &to in &ids {
                if from == to {
                    continue;
                }
                let missing = self
                    .factions
                    .get(&from)
                    .is_some_and(|f| !f.relations.contains_key(&to));
                if missing {
                    let value = roll_relation(rng);
                    if let Some(f) = self.factions.get_mut(&from) {
                        f.set_relation(to, value);
                        added += 1;
                    }
                }
            }
        }
        added
    }
}
