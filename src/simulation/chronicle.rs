//! Chronicle - bounded log of notable simulation events

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{FactionId, Tick};

/// A chronicle entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChronicleEntry {
    pub id: u64,
    pub tick: Tick,
    pub kind: ChronicleKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChronicleKind {
    // Lineage
    Fusion { parents: (FactionId, FactionId), child: FactionId },
    Merge { parents: (FactionId, FactionId), merged: FactionId, cells: usize },
    Rebellion { target: FactionId, rebel: FactionId, cells: usize },
    Mutation { faction: FactionId },

    // Population
    Regeneration { faction: FactionId, cells: usize },
    Cull { faction: FactionId, cells: usize },
    Decay { faction: FactionId, share: f64, cleared: usize },
    Pressure { faction: FactionId, share: f64, cleared: usize },
    TieBreak { cleared: usize },

    // Events
    WorldEvent { name: String, affected: usize },
    Disaster { name: String, affected: usize },

    Domination { faction: FactionId, share: f64 },
}

impl ChronicleKind {
    pub fn participants(&self) -> Vec<FactionId> {
        match self {
            ChronicleKind::Fusion { parents, child } => vec![parents.0, parents.1, *child],
            ChronicleKind::Merge { parents, merged, .. } => vec![parents.0, parents.1, *merged],
            ChronicleKind::Rebellion { target, rebel, .. } => vec![*target, *rebel],
            ChronicleKind::Mutation { faction }
            | ChronicleKind::Regeneration { faction, .. }
            | ChronicleKind::Cull { faction, .. }
            | ChronicleKind::Decay { faction, .. }
            | ChronicleKind::Pressure { faction, .. }
            | ChronicleKind::Domination { faction, .. } => vec![*faction],
            ChronicleKind::TieBreak { .. }
            | ChronicleKind::WorldEvent { .. }
            | ChronicleKind::Disaster { .. } => Vec::new(),
        }
    }

    /// One-line description for status displays
    pub fn describe(&self) -> String {
        match self {
            ChronicleKind::Fusion { parents, child } => {
                format!("{} + {} fused into {}", parents.0, parents.1, child)
            }
            ChronicleKind::Merge { parents, merged, cells } => {
                format!("{} and {} merged into {} ({} cells)", parents.0, parents.1, merged, cells)
            }
            ChronicleKind::Rebellion { target, rebel, cells } => {
                format!("{} rebelled against {} taking {} cells", rebel, target, cells)
            }
            ChronicleKind::Mutation { faction } => format!("{} mutated", faction),
            ChronicleKind::Regeneration { faction, cells } => {
                format!("{} emerged on {} cells", faction, cells)
            }
            ChronicleKind::Cull { faction, cells } => {
                format!("{} was culled ({} cells)", faction, cells)
            }
            ChronicleKind::Decay { faction, share, cleared } => {
                format!("{} decayed at {:.0}% losing {} cells", faction, share * 100.0, cleared)
            }
            ChronicleKind::Pressure { faction, share, cleared } => {
                format!("pressure on {} at {:.0}% ({} cells)", faction, share * 100.0, cleared)
            }
            ChronicleKind::TieBreak { cleared } => format!("stalemate broken, {} cells freed", cleared),
            ChronicleKind::WorldEvent { name, affected } => {
                format!("world event: {} ({} affected)", name, affected)
            }
            ChronicleKind::Disaster { name, affected } => {
                format!("disaster: {} ({} affected)", name, affected)
            }
            ChronicleKind::Domination { faction, share } => {
                format!("{} controls {:.1}% of the map", faction, share * 100.0)
            }
        }
    }
}

/// Bounded event log; the oldest entries drop once capacity is reached
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chronicle {
    entries: VecDeque<ChronicleEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for Chronicle {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl Chronicle {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            next_id: 0,
        }
    }

    pub fn record(&mut self, tick: Tick, kind: ChronicleKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ChronicleEntry { id, tick, kind });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries ever recorded, including dropped ones
    pub fn total_recorded(&self) -> u64 {
        self.next_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChronicleEntry> {
        self.entries.iter()
    }

    /// Newest `n` entries, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ChronicleEntry> {
        self.entries.iter().rev().take(n)
    }

    pub fn entries_for_tick(&self, tick: Tick) -> impl Iterator<Item = &ChronicleEntry> {
        self.entries.iter().filter(move |e| e.tick == tick)
    }

    pub fn entries_for_faction(&self, id: FactionId) -> impl Iterator<Item = &ChronicleEntry> {
        self.entries
            .iter()
            .filter(move |e| e.kind.participants().contains(&id))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
