//! Simulation configuration with documented constants
//!
//! Every tuning number the tick rules, population policies and event systems
//! consult lives here. Defaults reproduce the classic Color War pacing; a TOML
//! file may override any subset of fields.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ColorWarError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed RNG seed. `None` draws a fresh seed per world, which is the
    /// normal mode; tests and benches pin it.
    pub seed: Option<u64>,
    pub grid: GridConfig,
    pub factions: FactionConfig,
    pub combat: CombatConfig,
    pub dominance: DominanceConfig,
    pub population: PopulationConfig,
    pub events: EventConfig,
    pub runtime: RuntimeConfig,
}

// === GRID ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    /// Random coordinates drawn for each biome kind (forest, lava, oasis)
    pub biome_cells_per_kind: usize,
    /// Rows the terminal view aims for when the grid is sized from the screen
    pub target_cells_y: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 135,
            biome_cells_per_kind: 300,
            target_cells_y: 135,
        }
    }
}

impl GridConfig {
    /// Size the grid to fill a viewport.
    ///
    /// `reserved_px` is vertical space kept for status bars. Cells are at
    /// least 2 pixels so the grid stays legible on small screens.
    pub fn from_viewport(
        width_px: usize,
        height_px: usize,
        reserved_px: usize,
        target_cells_y: usize,
    ) -> Self {
        let cell = viewport_cell_size(height_px, reserved_px, target_cells_y);
        let usable = height_px.saturating_sub(reserved_px);
        Self {
            width: (width_px / cell).max(1),
            height: (usable / cell).max(1),
            target_cells_y,
            ..Self::default()
        }
    }

    /// `from_viewport` with this config's row target, keeping the other fields
    pub fn fitted(&self, width_px: usize, height_px: usize, reserved_px: usize) -> Self {
        let sized = Self::from_viewport(width_px, height_px, reserved_px, self.target_cells_y);
        Self {
            width: sized.width,
            height: sized.height,
            ..self.clone()
        }
    }

    pub fn total_cells(&self) -> usize {
        self.width * self.height
    }
}

/// Pixel edge length of one cell for a viewport
pub fn viewport_cell_size(height_px: usize, reserved_px: usize, target_cells_y: usize) -> usize {
    let usable = height_px.saturating_sub(reserved_px);
    (usable / target_cells_y.max(1)).max(2)
}

// === FACTIONS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionConfig {
    /// Factions created by a new game
    pub initial_count: usize,
    /// Cells each starting faction is scattered over
    pub initial_cells: usize,
    /// Contact fusion only creates factions while the registry is below this
    pub cap: usize,
    /// Regeneration tops the registry back up to this many factions
    pub floor: usize,
    /// Empty cells each regenerated faction is placed on
    pub regen_cells: usize,
    /// Probe ceiling for any "place on empty cells" operation.
    ///
    /// A full grid has no empty cells, so placement must give up rather
    /// than spin; fewer cells than requested is an accepted outcome.
    pub placement_probe_budget: usize,
}

impl Default for FactionConfig {
    fn default() -> Self {
        Self {
            initial_count: 200,
            initial_cells: 30,
            cap: 150,
            floor: 5,
            regen_cells: 30,
            placement_probe_budget: 5000,
        }
    }
}

// === COMBAT (per-tick spread/attack/fusion) ===

/// Coefficients of the spread and attack chance formulas:
///
/// `spread = spread_base + U·spread_risk_weight·risk + power·spread_power_weight·expansionism`
/// `attack = attack_base + U·attack_risk_weight·risk + power·attack_power_weight·aggression`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub spread_base: f64,
    pub spread_risk_weight: f64,
    pub spread_power_weight: f64,
    pub attack_base: f64,
    pub attack_risk_weight: f64,
    pub attack_power_weight: f64,
    /// Chance per contact that two neighbouring factions fuse
    pub fusion_chance: f64,
    /// Cells younger than this cannot be attacked
    pub min_claim_age_for_attack: u32,
    /// Capture immunity granted to a freshly captured cell
    pub capture_cooldown: u32,
    /// Half-width of the per-tick random walk on aggression/expansionism
    pub personality_drift: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            spread_base: 0.1,
            spread_risk_weight: 0.1,
            spread_power_weight: 0.3,
            attack_base: 0.05,
            attack_risk_weight: 0.1,
            attack_power_weight: 0.4,
            fusion_chance: 0.01,
            min_claim_age_for_attack: 6,
            capture_cooldown: 4,
            personality_drift: 0.01,
        }
    }
}

// === DOMINANCE ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DominanceConfig {
    /// Dominant share at which the anti-snowball correction kicks in
    pub snowball_threshold: f64,
    pub dominant_power_factor: f64,
    pub underdog_power_factor: f64,

    /// Ticks between dominance checks (decay and mid-range pressure)
    pub interval: u64,
    /// Share at or above which the dominant faction decays.
    ///
    /// A decaying leader is cut back to `decay_target` of the grid, losing
    /// at least `floor(share · decay_scale)` cells. On the default 240x135
    /// grid a monopoly drops from 100% to 45% in one check.
    pub decay_threshold: f64,
    pub decay_target: f64,
    pub decay_scale: f64,
    /// Random samples allowed for the pressure clearance
    pub decay_probe_budget: usize,
    /// Chance that a decay is followed by a mutation or a rebellion
    pub response_chance: f64,

    pub pressure_min: f64,
    pub pressure_max: f64,
    pub pressure_rebellion_chance: f64,
    pub pressure_mutation_chance: f64,
    pub pressure_clear_chance: f64,
    pub pressure_clear_cells: usize,

    /// Share at which a faction is reported as dominating the map
    pub victory_threshold: f64,
}

impl Default for DominanceConfig {
    fn default() -> Self {
        Self {
            snowball_threshold: 0.65,
            dominant_power_factor: 0.8,
            underdog_power_factor: 1.2,
            interval: 50,
            decay_threshold: 0.5,
            decay_target: 0.45,
            decay_scale: 200.0,
            decay_probe_budget: 2000,
            response_chance: 0.2,
            pressure_min: 0.35,
            pressure_max: 0.65,
            pressure_rebellion_chance: 0.6,
            pressure_mutation_chance: 0.4,
            pressure_clear_chance: 0.3,
            pressure_clear_cells: 150,
            victory_threshold: 0.95,
        }
    }
}

// === POPULATION ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub cull_interval: u64,
    /// Culling only happens while more than this many factions live
    pub cull_min_factions: usize,
    pub tie_break_interval: u64,
    pub tie_break_probes: usize,
    pub tie_break_cells: usize,
    pub noise_chance: f64,

    /// Auto-merge chance is `min(merge_base_chance + tick / merge_ramp_ticks, merge_max_chance)`
    pub merge_base_chance: f64,
    pub merge_ramp_ticks: f64,
    pub merge_max_chance: f64,

    pub rebellion_cells: usize,
    pub rebellion_probe_budget: usize,
    /// Capture immunity given to cells a rebellion takes
    pub rebellion_grace: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            cull_interval: 1000,
            cull_min_factions: 10,
            tie_break_interval: 100,
            tie_break_probes: 100,
            tie_break_cells: 100,
            noise_chance: 0.0005,
            merge_base_chance: 0.002,
            merge_ramp_ticks: 200_000.0,
            merge_max_chance: 0.08,
            rebellion_cells: 300,
            rebellion_probe_budget: 5000,
            rebellion_grace: 8,
        }
    }
}

// === EVENTS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub world_event_interval: u64,
    pub disaster_interval: u64,
    pub disaster_chance: f64,
    pub time_warp_chance: f64,
    pub forgotten_return_probes: usize,
    /// Edge length of the square the Singularity clears
    pub singularity_size: usize,
    pub plague_probes: usize,
    pub quake_probes: usize,
    pub volcano_probes: usize,
    pub volcano_cells: usize,
    pub storm_probes: usize,
    pub storm_cells_per_faction: usize,
    /// Wipeout needs strictly more live factions than this
    pub wipeout_min_factions: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            world_event_interval: 500,
            disaster_interval: 100,
            disaster_chance: 0.8,
            time_warp_chance: 0.05,
            forgotten_return_probes: 300,
            singularity_size: 20,
            plague_probes: 200,
            quake_probes: 200,
            volcano_probes: 1000,
            volcano_cells: 1000,
            storm_probes: 300,
            storm_cells_per_faction: 80,
            wipeout_min_factions: 3,
        }
    }
}

// === RUNTIME ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Sleep between simulation ticks
    pub tick_interval_ms: u64,
    /// Presentation frames per second
    pub frame_rate: u32,
    /// Entries kept in the chronicle before the oldest are dropped
    pub chronicle_capacity: usize,
    /// Minimum cell count before power maps are counted in parallel.
    ///
    /// Below this, rayon's split/merge overhead exceeds the work.
    pub parallel_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            frame_rate: 30,
            chronicle_capacity: 256,
            parallel_threshold: 100_000,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ColorWarError::InvalidConfig(msg));

        if self.grid.width == 0 || self.grid.height == 0 {
            return invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.grid.width, self.grid.height
            ));
        }

        if self.factions.floor > self.factions.cap {
            return invalid(format!(
                "faction floor ({}) must not exceed cap ({})",
                self.factions.floor, self.factions.cap
            ));
        }

        let d = &self.dominance;
        if d.pressure_min > d.pressure_max {
            return invalid(format!(
                "pressure_min ({}) must be <= pressure_max ({})",
                d.pressure_min, d.pressure_max
            ));
        }
        if d.decay_threshold > d.victory_threshold {
            return invalid(format!(
                "decay_threshold ({}) must be <= victory_threshold ({})",
                d.decay_threshold, d.victory_threshold
            ));
        }
        if !(0.0..=d.decay_threshold).contains(&d.decay_target) {
            return invalid(format!(
                "decay_target ({}) must be within [0, decay_threshold ({})]",
                d.decay_target, d.decay_threshold
            ));
        }
        if self.grid.target_cells_y == 0 {
            return invalid("target_cells_y must be positive".into());
        }
        if d.interval == 0
            || self.population.cull_interval == 0
            || self.population.tie_break_interval == 0
            || self.events.world_event_interval == 0
            || self.events.disaster_interval == 0
        {
            return invalid("cadence intervals must be positive".into());
        }

        let chances = [
            ("fusion_chance", self.combat.fusion_chance),
            ("response_chance", d.response_chance),
            ("noise_chance", self.population.noise_chance),
            ("disaster_chance", self.events.disaster_chance),
            ("time_warp_chance", self.events.time_warp_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        Ok(())
    }
}
