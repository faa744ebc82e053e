//! Color mapping from world state to terminal colors

use ratatui::style::Color;

use crate::core::types::{CellCoord, Rgb};
use crate::simulation::world::World;
use crate::spatial::biome::Biome;

/// Background for empty plain cells
pub const BACKGROUND: Color = Color::Rgb(18, 18, 22);

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Scale each channel by `factor` (0.0 = black, 1.0 = unchanged)
pub fn darken(rgb: Rgb, factor: f32) -> Rgb {
    let scale = |c: u8| (c as f32 * factor.clamp(0.0, 1.0)) as u8;
    Rgb::new(scale(rgb.r), scale(rgb.g), scale(rgb.b))
}

/// Faint tint so terrain stays visible under empty cells
pub fn biome_tint(biome: Biome) -> Color {
    match biome {
        Biome::Plain => BACKGROUND,
        Biome::Forest => Color::Rgb(16, 40, 20),
        Biome::Lava => Color::Rgb(52, 16, 10),
        Biome::Oasis => Color::Rgb(12, 34, 48),
    }
}

/// Owner color, or the biome tint when the cell is empty or the owner is gone
pub fn cell_color(world: &World, coord: CellCoord) -> Color {
    world
        .grid
        .owner_at(coord)
        .and_then(|id| world.registry.get(id))
        .map(|f| to_color(f.color))
        .unwrap_or_else(|| biome_tint(world.biomes.biome_at(coord)))
}
