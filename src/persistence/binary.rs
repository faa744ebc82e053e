//! Binary snapshot codec (bincode)
//!
//! Carries full cell state and faction records including ids and relations.
//! The text save stays the canonical interchange format.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::{ColorWarError, Result};
use crate::core::types::Tick;
use crate::faction::record::Faction;
use crate::faction::registry::FactionRegistry;
use crate::persistence::LoadReport;
use crate::simulation::world::World;
use crate::spatial::grid::{Cell, GridState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub tick: Tick,
    pub cells: Vec<Cell>,
    pub factions: Vec<Faction>,
}

impl Snapshot {
    pub fn from_world(world: &World) -> Self {
        Self {
            width: world.width(),
            height: world.height(),
            tick: world.tick,
            cells: world.grid.cells().to_vec(),
            factions: world.registry.iter().cloned().collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Install into `world`, fitting the grid to the live dimensions
    pub fn restore(self, world: &mut World) -> Result<LoadReport> {
        let mut issues = Vec::new();
        let saved = GridState::from_cells(self.width, self.height, self.cells).ok_or_else(|| {
            ColorWarError::MalformedSaveRecord {
                line: 0,
                reason: format!("snapshot cell count does not match {}x{}", self.width, self.height),
            }
        })?;

        let (live_w, live_h) = (world.width(), world.height());
        let grid = if (self.width, self.height) != (live_w, live_h) {
            warn!(
                saved_w = self.width,
                saved_h = self.height,
                live_w,
                live_h,
                "Snapshot dimensions differ, fitting to live grid"
            );
            issues.push(ColorWarError::DimensionMismatch {
                saved_width: self.width,
                saved_height: self.height,
                live_width: live_w,
                live_height: live_h,
            });
            saved.resized(live_w, live_h)
        } else {
            saved
        };

        world.registry = FactionRegistry::from_factions(self.factions);
        world.grid = grid;
        world.tick = self.tick;
        world.dominator = None;
        world.purge_dangling();
        let relations_backfilled = world.registry.backfill_relations(&mut world.rng);

        Ok(LoadReport {
            factions: world.live_count(),
            recovered: Vec::new(),
            relations_backfilled,
            issues,
        })
    }
}

pub fn write_snapshot(world: &World, path: &Path) -> Result<()> {
    let bytes = Snapshot::from_world(world).to_bytes()?;
    fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Snapshot written");
    Ok(())
}

/// Restore a snapshot file. A missing file is a no-op returning `Ok(None)`.
pub fn read_snapshot(world: &mut World, path: &Path) -> Result<Option<LoadReport>> {
    if !path.exists() {
        warn!(path = %path.display(), "No snapshot file, load skipped");
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let report = Snapshot::from_bytes(&bytes)?.restore(world)?;
    info!(path = %path.display(), factions = report.factions, "Snapshot restored");
    Ok(Some(report))
}
