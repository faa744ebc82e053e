pub mod chronicle;
pub mod engine;
pub mod events;
pub mod generation;
pub mod merge;
pub mod population;
pub mod power;
pub mod tick;
pub mod victory;
pub mod world;

pub use chronicle::{Chronicle, ChronicleEntry, ChronicleKind};
pub use generation::new_game;
pub use merge::{auto_merge_random_factions, blend_colors, mutate_faction, spawn_rebellion};
pub use power::PowerMap;
pub use tick::{run_tick, run_ticks, TickSummary};
pub use victory::{check_victory, DominationReport};
pub use world::World;
