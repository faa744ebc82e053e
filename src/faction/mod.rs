//! Faction records and the live-faction registry

pub mod lore;
pub mod record;
pub mod registry;

pub use record::{Archetype, Behavior, Faction, Lore, Personality};
pub use registry::FactionRegistry;
