//! Tick system - orchestrates one simulation step
//!
//! power snapshot -> engine step -> victory check -> population dynamics
//! -> world events and disasters -> purge -> advance the counter

use tracing::debug;

use crate::core::types::Tick;
use crate::simulation::engine::{self, StepStats};
use crate::simulation::events::{self, EventReport};
use crate::simulation::population::{self, PopulationReport};
use crate::simulation::victory::{self, DominationReport};
use crate::simulation::world::World;

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub tick: Tick,
    pub step: StepStats,
    pub victories: Vec<DominationReport>,
    pub population: PopulationReport,
    pub events: EventReport,
    pub live_factions: usize,
}

pub fn run_tick(world: &mut World) -> TickSummary {
    let tick = world.tick;

    let power = world.power_map();
    let step = engine::step(world, &power);
    let victories = victory::observe(world, &power);

    let population = population::apply(world);
    let events = events::process_events(world);

    let purged = world.purge_dangling();
    if purged > 0 {
        debug!(tick, purged, "Purged dangling cells");
    }

    world.tick += 1;

    TickSummary {
        tick,
        step,
        victories,
        population,
        events,
        live_factions: world.live_count(),
    }
}

/// Run `n` ticks back to back
pub fn run_ticks(world: &mut World, n: u64) {
    for _ in 0..n {
        run_tick(world);
    }
}
