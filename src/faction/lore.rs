//! Name, glyph and lore pools

use rand::seq::SliceRandom;
use rand::Rng;

use crate::faction::record::{Archetype, Lore};

pub const FOUNDER_SYMBOLS: [&str; 6] = ["■", "●", "▲", "◆", "✦", "✶"];
pub const REBEL_SYMBOLS: [&str; 4] = ["☢", "☠", "✪", "✘"];
pub const FUSION_SYMBOLS: [&str; 4] = ["❖", "✶", "⬟", "★"];
pub const REGEN_SYMBOLS: [&str; 4] = ["⬢", "⬡", "⬣", "✴"];
pub const RECOVERED_SYMBOL: &str = "❓";

const MOTTOS: [&str; 4] = ["No mercy.", "Evolve or die.", "Unity is strength.", "From ash we rise."];
const ORIGINS: [&str; 4] = ["volcanic ruin", "frozen tower", "desert tomb", "digital void"];
const VICTORY_QUOTES: [&str; 3] = [
    "We. Are. Eternal.",
    "Nothing can stop us.",
    "The world belongs to us now.",
];

pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or("?")
}

pub fn random_lore<R: Rng + ?Sized>(rng: &mut R) -> Lore {
    Lore {
        motto: pick(rng, &MOTTOS).to_string(),
        origin: pick(rng, &ORIGINS).to_string(),
        victory_quote: pick(rng, &VICTORY_QUOTES).to_string(),
    }
}

/// Lineage tag such as `S-4821`
pub fn dna_tag<R: Rng + ?Sized>(prefix: char, rng: &mut R) -> String {
    format!("{}-{}", prefix, rng.gen_range(1000..=9999))
}

pub fn archetype_dna<R: Rng + ?Sized>(archetype: Archetype, rng: &mut R) -> String {
    dna_tag(archetype.initial(), rng)
}

/// Second word of a name (`"Faction 12"` gives `"12"`), or the whole name
pub fn short_name(name: &str) -> &str {
    name.split_whitespace().nth(1).unwrap_or(name)
}
