//! Terminal frame composition
//!
//! The grid is drawn with half blocks: each terminal cell shows two grid rows,
//! the upper one as foreground and the lower one as background. Grids larger
//! than the map area are sampled at a fixed stride.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use ratatui::Frame;

use crate::core::config::GridConfig;
use crate::core::types::CellCoord;
use crate::render::colors::{cell_color, BACKGROUND};
use crate::simulation::world::World;

const HALF_BLOCK: char = '▀';
const PANEL_WIDTH: u16 = 44;
/// Below this terminal width the chronicle panel is hidden
const PANEL_MIN_TERMINAL_WIDTH: u16 = 100;
const STATUS_ROWS: u16 = 1;

/// Grid config sized to fill the map area of a `cols` x `rows` terminal.
///
/// A column counts as 2 px and a row as 4 px, so a minimum 2 px cell is
/// exactly one half block.
pub fn grid_for_terminal(grid: &GridConfig, cols: u16, rows: u16) -> GridConfig {
    let map_cols = if cols >= PANEL_MIN_TERMINAL_WIDTH {
        cols - PANEL_WIDTH
    } else {
        cols
    };
    grid.fitted(map_cols as usize * 2, rows as usize * 4, STATUS_ROWS as usize * 4)
}

/// Grid cells skipped per terminal cell so the whole grid fits in `cols` x `rows`
pub fn sample_step(grid_width: usize, grid_height: usize, cols: usize, rows: usize) -> usize {
    if cols == 0 || rows == 0 {
        return 1;
    }
    let horizontal = grid_width.div_ceil(cols);
    let vertical = grid_height.div_ceil(rows * 2);
    horizontal.max(vertical).max(1)
}

pub struct GridView<'a> {
    world: &'a World,
}

impl<'a> GridView<'a> {
    pub fn new(world: &'a World) -> Self {
        Self { world }
    }

    fn color_at(&self, x: usize, y: usize) -> Color {
        if x < self.world.width() && y < self.world.height() {
            cell_color(self.world, CellCoord::new(x, y))
        } else {
            BACKGROUND
        }
    }
}

impl Widget for GridView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 || self.world.grid.is_empty() {
            return;
        }
        let step = sample_step(
            self.world.width(),
            self.world.height(),
            area.width as usize,
            area.height as usize,
        );

        for row in 0..area.height {
            let top = row as usize * 2 * step;
            let bottom = top + step;
            for col in 0..area.width {
                let x = col as usize * step;
                buf.get_mut(area.x + col, area.y + row)
                    .set_char(HALF_BLOCK)
                    .set_fg(self.color_at(x, top))
                    .set_bg(self.color_at(x, bottom));
            }
        }
    }
}

/// One-line summary: tick, live factions, current leader and key help
pub fn status_line(world: &World, message: Option<&str>) -> String {
    let leader = match world.power_map().dominant() {
        Some((id, share)) => format!("{} {:.1}%", world.faction_name(id), share * 100.0),
        None => "none".to_string(),
    };
    let mut line = format!(
        " Tick {} | Factions {} | Leader {} | [s]ave [l]oad [n]ew [q]uit",
        world.tick,
        world.live_count(),
        leader
    );
    if let Some(message) = message {
        line.push_str(" | ");
        line.push_str(message);
    }
    line
}

/// Newest chronicle entries first, one per line
pub fn chronicle_lines(world: &World, limit: usize) -> Vec<String> {
    world
        .chronicle
        .recent(limit)
        .map(|entry| format!("[{}] {}", entry.tick, entry.kind.describe()))
        .collect()
}

/// Draw a full frame: grid, optional chronicle panel and the status bar
pub fn draw(f: &mut Frame, world: &World, message: Option<&str>) {
    let size = f.size();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_ROWS)])
        .split(size);
    let content_area = main_chunks[0];
    let status_area = main_chunks[1];

    let map_area = if size.width >= PANEL_MIN_TERMINAL_WIDTH {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(PANEL_WIDTH)])
            .split(content_area);

        let panel_area = content_chunks[1];
        let rows = panel_area.height.saturating_sub(2) as usize;
        let text = chronicle_lines(world, rows).join("\n");
        let panel = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(" Chronicle "))
            .style(Style::default().fg(Color::Gray));
        f.render_widget(panel, panel_area);
        content_chunks[0]
    } else {
        content_area
    };

    f.render_widget(GridView::new(world), map_area);

    let status = Paragraph::new(status_line(world, message))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(status, status_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Rgb;
    use crate::faction::record::{Behavior, Faction};
    use crate::simulation::chronicle::ChronicleKind;

    fn world(width: usize, height: usize) -> World {
        let mut config = SimulationConfig::default();
        config.seed = Some(3);
        config.grid.width = width;
        config.grid.height = height;
        World::new(config)
    }

    #[test]
    fn test_sample_step() {
        assert_eq!(sample_step(10, 10, 20, 20), 1);
        assert_eq!(sample_step(240, 135, 120, 40), 2);
        assert_eq!(sample_step(8, 8, 2, 1), 4);
        assert_eq!(sample_step(8, 8, 0, 0), 1);
    }

    #[test]
    fn test_grid_for_terminal_fills_map_area() {
        let grid = GridConfig::default();

        // Wide terminal: the chronicle panel takes its columns
        let wide = grid_for_terminal(&grid, 200, 50);
        assert_eq!((wide.width, wide.height), (156, 98));
        assert_eq!(sample_step(wide.width, wide.height, 156, 49), 1);

        let narrow = grid_for_terminal(&grid, 80, 24);
        assert_eq!((narrow.width, narrow.height), (80, 46));
        assert_eq!(narrow.biome_cells_per_kind, grid.biome_cells_per_kind);
    }

    #[test]
    fn test_half_block_rows() {
        let mut world = world(2, 2);
        let red = world.spawn_faction(|id| Faction::new(id, "Red", Rgb::new(255, 0, 0), Behavior::Aggressive));
        let blue = world.spawn_faction(|id| Faction::new(id, "Blue", Rgb::new(0, 0, 255), Behavior::Defensive));
        world.grid.set_owner(CellCoord::new(0, 0), Some(red));
        world.grid.set_owner(CellCoord::new(0, 1), Some(blue));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        GridView::new(&world).render(area, &mut buf);

        let cell = buf.get(0, 0);
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_large_grid_is_sampled() {
        let mut world = world(8, 8);
        let id = world.spawn_faction(|id| Faction::new(id, "Green", Rgb::new(0, 200, 0), Behavior::Hive));
        world.grid.set_owner(CellCoord::new(4, 0), Some(id));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        GridView::new(&world).render(area, &mut buf);

        assert_eq!(buf.get(1, 0).fg, Color::Rgb(0, 200, 0));
        assert_ne!(buf.get(0, 0).fg, Color::Rgb(0, 200, 0));
    }

    #[test]
    fn test_status_line_names_leader() {
        let mut world = world(4, 4);
        let id = world.spawn_faction(|id| Faction::new(id, "Solo", Rgb::new(9, 9, 9), Behavior::Hive));
        for x in 0..4 {
            world.grid.set_owner(CellCoord::new(x, 0), Some(id));
        }

        let line = status_line(&world, Some("Saved"));
        assert!(line.contains("Tick 0"));
        assert!(line.contains("Factions 1"));
        assert!(line.contains("Solo 25.0%"));
        assert!(line.ends_with("Saved"));
    }

    #[test]
    fn test_status_line_without_owners() {
        let world = world(4, 4);
        assert!(status_line(&world, None).contains("Leader none"));
    }

    #[test]
    fn test_chronicle_lines_newest_first() {
        let mut world = world(4, 4);
        world.record(ChronicleKind::TieBreak { cleared: 1 });
        world.tick = 7;
        world.record(ChronicleKind::TieBreak { cleared: 2 });

        let lines = chronicle_lines(&world, 5);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[7]"));
        assert!(lines[1].starts_with("[0]"));
    }
}
