//! Faction - a named actor with personality, lineage and territory

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::ColorWarError;
use crate::core::types::{CellCoord, FactionId, Rgb};

/// Behavior tag. Carried through saves and inheritance; the tick rule reads
/// it for flare targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Aggressive,
    Defensive,
    Random,
    Chaotic,
    Teleporter,
    Sapper,
    Conqueror,
    Hoarder,
    Hunter,
    Rogue,
    Mirror,
    Corruptor,
    Infiltrator,
    Leech,
    Hive,
}

impl Behavior {
    pub const ALL: [Behavior; 15] = [
        Behavior::Aggressive,
        Behavior::Defensive,
        Behavior::Random,
        Behavior::Chaotic,
        Behavior::Teleporter,
        Behavior::Sapper,
        Behavior::Conqueror,
        Behavior::Hoarder,
        Behavior::Hunter,
        Behavior::Rogue,
        Behavior::Mirror,
        Behavior::Corruptor,
        Behavior::Infiltrator,
        Behavior::Leech,
        Behavior::Hive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Aggressive => "aggressive",
            Behavior::Defensive => "defensive",
            Behavior::Random => "random",
            Behavior::Chaotic => "chaotic",
            Behavior::Teleporter => "teleporter",
            Behavior::Sapper => "sapper",
            Behavior::Conqueror => "conqueror",
            Behavior::Hoarder => "hoarder",
            Behavior::Hunter => "hunter",
            Behavior::Rogue => "rogue",
            Behavior::Mirror => "mirror",
            Behavior::Corruptor => "corruptor",
            Behavior::Infiltrator => "infiltrator",
            Behavior::Leech => "leech",
            Behavior::Hive => "hive",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = ColorWarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ColorWarError::UnknownBehavior(s.to_string()))
    }
}

/// Personality traits, each kept within `[Personality::MIN, Personality::MAX]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub aggression: f64,
    pub defense: f64,
    pub expansionism: f64,
    pub risk: f64,
}

impl Default for Personality {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Personality {
    pub const MIN: f64 = 0.3;
    pub const MAX: f64 = 2.0;

    pub const fn new(aggression: f64, defense: f64, expansionism: f64, risk: f64) -> Self {
        Self {
            aggression,
            defense,
            expansionism,
            risk,
        }
    }

    pub const fn neutral() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Every trait drawn independently from `[lo, hi]`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> Self {
        Self::new(
            rng.gen_range(lo..=hi),
            rng.gen_range(lo..=hi),
            rng.gen_range(lo..=hi),
            rng.gen_range(lo..=hi),
        )
        .clamped()
    }

    pub fn average(a: &Personality, b: &Personality) -> Self {
        Self::new(
            (a.aggression + b.aggression) / 2.0,
            (a.defense + b.defense) / 2.0,
            (a.expansionism + b.expansionism) / 2.0,
            (a.risk + b.risk) / 2.0,
        )
    }

    pub fn clamped(self) -> Self {
        let c = |v: f64| v.clamp(Self::MIN, Self::MAX);
        Self::new(c(self.aggression), c(self.defense), c(self.expansionism), c(self.risk))
    }

    /// Rebels hit harder, guard less, and take every gamble
    pub fn rebel(&self) -> Self {
        Self::new(
            (self.aggression + 0.5).min(Self::MAX),
            (self.defense - 0.2).max(Self::MIN),
            (self.expansionism + 0.3).min(Self::MAX),
            Self::MAX,
        )
    }

    /// Random walk on aggression and expansionism
    pub fn drift<R: Rng + ?Sized>(&mut self, step: f64, rng: &mut R) {
        if step <= 0.0 {
            return;
        }
        self.aggression = (self.aggression + rng.gen_range(-step..=step)).clamp(Self::MIN, Self::MAX);
        self.expansionism =
            (self.expansionism + rng.gen_range(-step..=step)).clamp(Self::MIN, Self::MAX);
    }
}

/// Starting personality presets used at world generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Archetype {
    Swarm,
    Empire,
    Rogue,
    Cult,
    #[default]
    Neutral,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Swarm,
        Archetype::Empire,
        Archetype::Rogue,
        Archetype::Cult,
        Archetype::Neutral,
    ];

    pub fn personality(self) -> Personality {
        match self {
            Archetype::Swarm => Personality::new(1.0, 0.5, 2.0, 1.5),
            Archetype::Empire => Personality::new(0.8, 2.0, 0.7, 0.6),
            Archetype::Rogue => Personality::new(1.8, 0.5, 1.2, 2.0),
            Archetype::Cult => Personality::new(0.9, 1.2, 1.0, 1.5),
            Archetype::Neutral => Personality::neutral(),
        }
    }

    /// Prefix letter of DNA tags
    pub fn initial(self) -> char {
        match self {
            Archetype::Swarm => 'S',
            Archetype::Empire => 'E',
            Archetype::Rogue => 'R',
            Archetype::Cult => 'C',
            Archetype::Neutral => 'N',
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Archetype::Neutral)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lore {
    pub motto: String,
    pub origin: String,
    pub victory_quote: String,
}

impl Default for Lore {
    fn default() -> Self {
        Self {
            motto: "Unknown".into(),
            origin: "Unknown".into(),
            victory_quote: "Unknown".into(),
        }
    }
}

/// A faction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    /// Display color; unique among live factions
    pub color: Rgb,
    pub symbol: String,
    pub behavior: Behavior,
    pub personality: Personality,
    pub archetype: Archetype,
    pub dna: String,

    /// Lineage depth, +1 per fusion or merge
    pub tier: u32,
    pub age: u64,
    pub merges: u32,
    pub offspring: u32,

    pub capital: Option<CellCoord>,
    pub lore: Option<Lore>,
    /// Unordered parent pair for contact-fusion offspring
    pub lineage: Option<(FactionId, FactionId)>,

    /// Affinity toward other factions in `[-1, 1]`, not necessarily symmetric
    pub relations: AHashMap<FactionId, f64>,
}

impl Faction {
    pub fn new(id: FactionId, name: impl Into<String>, color: Rgb, behavior: Behavior) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            symbol: "■".into(),
            behavior,
            personality: Personality::neutral(),
            archetype: Archetype::Neutral,
            dna: String::new(),
            tier: 1,
            age: 0,
            merges: 0,
            offspring: 0,
            capital: None,
            lore: None,
            lineage: None,
            relations: AHashMap::new(),
        }
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality.clamped();
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_dna(mut self, dna: impl Into<String>) -> Self {
        self.dna = dna.into();
        self
    }

    /// Affinity toward `other`; unknown pairs are neutral
    pub fn relation_to(&self, other: FactionId) -> f64 {
        self.relations.get(&other).copied().unwrap_or(0.0)
    }

    pub fn set_relation(&mut self, other: FactionId, value: f64) {
        if other != self.id {
            self.relations.insert(other, value.clamp(-1.0, 1.0));
        }
    }

    pub fn has_lineage(&self, a: FactionId, b: FactionId) -> bool {
        matches!(self.lineage, Some((x, y)) if (x, y) == (a, b) || (x, y) == (b, a))
    }

    pub const MUTATED_SUFFIX: &'static str = " (Mutated)";

    pub fn mark_mutated(&mut self) {
        if !self.name.ends_with(Self::MUTATED_SUFFIX) {
            self.name.push_str(Self::MUTATED_SUFFIX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_behavior_roundtrip() {
        for b in Behavior::ALL {
            assert_eq!(b.as_str().parse::<Behavior>().unwrap(), b);
        }
        assert_eq!("Teleporter".parse::<Behavior>().unwrap(), Behavior::Teleporter);
        assert!(matches!(
            "pacifist".parse::<Behavior>(),
            Err(ColorWarError::UnknownBehavior(_))
        ));
    }

    #[test]
    fn test_rebel_personality() {
        let base = Personality::new(1.8, 0.4, 1.9, 0.5);
        let rebel = base.rebel();
        assert_eq!(rebel.aggression, 2.0);
        assert!((rebel.defense - 0.3).abs() < 1e-9);
        assert_eq!(rebel.expansionism, 2.0);
        assert_eq!(rebel.risk, 2.0);
    }

    #[test]
    fn test_drift_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut p = Personality::new(2.0, 1.0, 0.3, 1.0);
        for _ in 0..1000 {
            p.drift(0.01, &mut rng);
            assert!((Personality::MIN..=Personality::MAX).contains(&p.aggression));
            assert!((Personality::MIN..=Personality::MAX).contains(&p.expansionism));
        }
        assert_eq!(p.defense, 1.0);
        assert_eq!(p.risk, 1.0);
    }

    #[test]
    fn test_mutated_suffix_added_once() {
        let mut f = Faction::new(FactionId(1), "Faction 1", Rgb::new(1, 2, 3), Behavior::Hive);
        f.mark_mutated();
        f.mark_mutated();
        assert_eq!(f.name, "Faction 1 (Mutated)");
    }

    #[test]
    fn test_lineage_is_unordered() {
        let mut f = Faction::new(FactionId(3), "Fusion", Rgb::default(), Behavior::Mirror);
        f.lineage = Some((FactionId(1), FactionId(2)));
        assert!(f.has_lineage(FactionId(2), FactionId(1)));
        assert!(!f.has_lineage(FactionId(1), FactionId(3)));
    }

    #[test]
    fn test_self_relation_ignored() {
        let mut f = Faction::new(FactionId(1), "Solo", Rgb::default(), Behavior::Random);
        f.set_relation(FactionId(1), 0.5);
        f.set_relation(FactionId(2), 3.0);
        assert!(f.relations.get(&FactionId(1)).is_none());
        assert_eq!(f.relation_to(FactionId(2)), 1.0);
    }
}
