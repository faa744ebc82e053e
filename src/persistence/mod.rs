//! Save/load codecs: the canonical text format and a binary snapshot

pub mod binary;
pub mod text;

use std::path::Path;

use crate::core::error::{ColorWarError, Result};
use crate::core::types::FactionId;
use crate::simulation::world::World;

/// Outcome of a load. Recoverable problems are collected here instead of
/// aborting the load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub factions: usize,
    /// Factions synthesized for grid colors with no record
    pub recovered: Vec<FactionId>,
    pub relations_backfilled: usize,
    pub issues: Vec<ColorWarError>,
}

impl LoadReport {
    pub fn skipped_records(&self) -> usize {
        self.issues
            .iter()
            .filter(|e| matches!(e, ColorWarError::MalformedSaveRecord { .. }))
            .count()
    }

    pub fn was_resized(&self) -> bool {
        self.issues
            .iter()
            .any(|e| matches!(e, ColorWarError::DimensionMismatch { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Text,
    Binary,
}

impl SaveFormat {
    /// `.bin` and `.snapshot` files use the binary codec, everything else text
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("snapshot") => SaveFormat::Binary,
            _ => SaveFormat::Text,
        }
    }
}

pub fn save(world: &World, path: &Path) -> Result<()> {
    match SaveFormat::from_path(path) {
        SaveFormat::Text => text::write_save(world, path),
        SaveFormat::Binary => binary::write_snapshot(world, path),
    }
}

pub fn load(world: &mut World, path: &Path) -> Result<Option<LoadReport>> {
    match SaveFormat::from_path(path) {
        SaveFormat::Text => text::load_save(world, path),
        SaveFormat::Binary => binary::read_snapshot(world, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SaveFormat::from_path(Path::new("war.bin")), SaveFormat::Binary);
        assert_eq!(SaveFormat::from_path(Path::new("war.snapshot")), SaveFormat::Binary);
        assert_eq!(SaveFormat::from_path(Path::new("war.txt")), SaveFormat::Text);
        assert_eq!(SaveFormat::from_path(Path::new("war")), SaveFormat::Text);
    }
}
