//! Text save codec
//!
//! ```text
//! [GRID]
//! None,#ff0000,#ff0000
//! #00ff00,None,None
//! [FACTIONS]
//! #ff0000|Faction 1|aggressive|1|■|S-4821|(3, 4)|1.0|0.5|2.0|1.5
//! ```
//!
//! Cells are keyed by display color, which the registry keeps unique.
//! Faction fields are
//! `color|name|behavior|tier|symbol|dna|capital|aggression|defense|expansionism|risk`.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, multispace0, u32 as dec_u32};
use nom::combinator::{all_consuming, map, value};
use nom::sequence::{delimited, separated_pair};
use nom::{IResult, Parser};
use tracing::{info, warn};

use crate::core::error::{ColorWarError, Result};
use crate::core::types::{CellCoord, FactionId, Rgb};
use crate::faction::lore::RECOVERED_SYMBOL;
use crate::faction::record::{Behavior, Faction, Lore, Personality};
use crate::faction::registry::FactionRegistry;
use crate::persistence::LoadReport;
use crate::simulation::world::World;
use crate::spatial::grid::{Cell, GridState};

const GRID_HEADER: &str = "[GRID]";
const FACTIONS_HEADER: &str = "[FACTIONS]";
const EMPTY_CELL: &str = "None";
const FIELD_COUNT: usize = 11;

/// One `[FACTIONS]` line
#[derive(Debug, Clone, PartialEq)]
pub struct FactionRecord {
    pub color: Rgb,
    pub name: String,
    pub behavior: Behavior,
    pub tier: u32,
    pub symbol: String,
    pub dna: String,
    pub capital: Option<CellCoord>,
    pub personality: Personality,
}

impl FactionRecord {
    pub fn from_faction(faction: &Faction) -> Self {
        Self {
            color: faction.color,
            name: faction.name.clone(),
            behavior: faction.behavior,
            tier: faction.tier,
            symbol: faction.symbol.clone(),
            dna: faction.dna.clone(),
            capital: faction.capital,
            personality: faction.personality,
        }
    }

    fn into_faction(self, id: FactionId) -> Faction {
        let mut f = Faction::new(id, self.name, self.color, self.behavior)
            .with_personality(self.personality)
            .with_symbol(self.symbol)
            .with_tier(self.tier)
            .with_dna(self.dna);
        f.capital = self.capital;
        f.lore = Some(Lore::default());
        f
    }

    pub fn encode(&self) -> String {
        let capital = self
            .capital
            .map(|c| c.to_string())
            .unwrap_or_else(|| EMPTY_CELL.to_string());
        let p = &self.personality;
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.color,
            sanitize(&self.name),
            self.behavior,
            self.tier,
            sanitize(&self.symbol),
            sanitize(&self.dna),
            capital,
            p.aggression,
            p.defense,
            p.expansionism,
            p.risk
        )
    }
}

/// Field separators cannot appear inside a field
fn sanitize(field: &str) -> String {
    field.replace(['|', '\n', '\r'], "/")
}

/// Parsed save contents before they touch a world
#[derive(Debug, Clone, Default)]
pub struct SaveFile {
    pub rows: Vec<Vec<Option<Rgb>>>,
    pub factions: Vec<FactionRecord>,
}

impl SaveFile {
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

fn capital_tuple(input: &str) -> IResult<&str, CellCoord> {
    map(
        delimited(
            (char('('), multispace0),
            separated_pair(dec_u32, (multispace0, char(','), multispace0), dec_u32),
            (multispace0, char(')')),
        ),
        |(x, y)| CellCoord::new(x as usize, y as usize),
    )
    .parse(input)
}

fn capital_field(input: &str) -> IResult<&str, Option<CellCoord>> {
    alt((value(None, tag(EMPTY_CELL)), map(capital_tuple, Some))).parse(input)
}

/// Parse a capital written as `(x, y)` or `None`
pub fn parse_capital(input: &str) -> Result<Option<CellCoord>> {
    all_consuming(capital_field)
        .parse(input.trim())
        .map(|(_, capital)| capital)
        .map_err(|e| ColorWarError::MalformedSaveRecord {
            line: 0,
            reason: format!("bad capital {:?}: {}", input, e),
        })
}

fn parse_record(line: &str, line_no: usize) -> Result<FactionRecord> {
    let malformed = |reason: String| ColorWarError::MalformedSaveRecord { line: line_no, reason };

    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != FIELD_COUNT {
        return Err(malformed(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    let color: Rgb = fields[0].parse().map_err(|e: ColorWarError| malformed(e.to_string()))?;
    let behavior: Behavior = fields[2].parse().map_err(|e: ColorWarError| malformed(e.to_string()))?;
    let tier: u32 = fields[3]
        .trim()
        .parse()
        .map_err(|_| malformed(format!("bad tier {:?}", fields[3])))?;
    let capital = parse_capital(fields[6]).map_err(|e| malformed(e.to_string()))?;

    let mut traits = [0.0f64; 4];
    for (slot, raw) in traits.iter_mut().zip(&fields[7..]) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| malformed(format!("bad personality value {:?}", raw)))?;
    }
    let [aggression, defense, expansionism, risk] = traits;

    Ok(FactionRecord {
        color,
        name: fields[1].to_string(),
        behavior,
        tier,
        symbol: fields[4].to_string(),
        dna: fields[5].to_string(),
        capital,
        personality: Personality::new(aggression, defense, expansionism, risk).clamped(),
    })
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Grid,
    Factions,
}

/// Parse save text. Bad lines are skipped and returned as issues.
pub fn decode(text: &str) -> (SaveFile, Vec<ColorWarError>) {
    let mut save = SaveFile::default();
    let mut issues = Vec::new();
    let mut section = Section::Preamble;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        match line {
            GRID_HEADER => {
                section = Section::Grid;
                continue;
            }
            FACTIONS_HEADER => {
                section = Section::Factions;
                continue;
            }
            "" => continue,
            _ => {}
        }

        match section {
            Section::Preamble => issues.push(ColorWarError::MalformedSaveRecord {
                line: line_no,
                reason: "content before [GRID]".into(),
            }),
            Section::Grid => {
                let mut row = Vec::new();
                for token in line.split(',') {
                    let token = token.trim();
                    if token == EMPTY_CELL {
                        row.push(None);
                        continue;
                    }
                    match token.parse::<Rgb>() {
                        Ok(color) => row.push(Some(color)),
                        Err(e) => {
                            issues.push(ColorWarError::MalformedSaveRecord {
                                line: line_no,
                                reason: e.to_string(),
                            });
                            row.push(None);
                        }
                    }
                }
                save.rows.push(row);
            }
            Section::Factions => match parse_record(line, line_no) {
                Ok(record) => save.factions.push(record),
                Err(e) => issues.push(e),
            },
        }
    }

    (save, issues)
}

pub fn encode(world: &World) -> String {
    let mut out = String::with_capacity(world.grid.len() * 8 + world.live_count() * 64);
    out.push_str(GRID_HEADER);
    out.push('\n');
    for y in 0..world.height() {
        let row: Vec<String> = (0..world.width())
            .map(|x| {
                world
                    .grid
                    .owner_at(CellCoord::new(x, y))
                    .and_then(|id| world.registry.get(id))
                    .map(|f| f.color.to_string())
                    .unwrap_or_else(|| EMPTY_CELL.to_string())
            })
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out.push_str(FACTIONS_HEADER);
    out.push('\n');
    for faction in world.registry.iter() {
        out.push_str(&FactionRecord::from_faction(faction).encode());
        out.push('\n');
    }
    out
}

fn recovered_faction(id: FactionId, color: Rgb, behavior: Behavior) -> Faction {
    let mut f = Faction::new(id, format!("Recovered {}", color), color, behavior)
        .with_symbol(RECOVERED_SYMBOL)
        .with_dna("Unknown");
    f.lore = Some(Lore::default());
    f
}

/// Replace the world's factions and grid with a decoded save.
///
/// The grid is fitted to the live dimensions (top-left anchored). Colors
/// the grid uses without a faction record get a synthesized faction, and
/// every missing relation is rolled fresh.
pub fn apply(world: &mut World, save: SaveFile, mut issues: Vec<ColorWarError>) -> LoadReport {
    let (live_w, live_h) = (world.width(), world.height());
    let (saved_w, saved_h) = (save.width(), save.height());
    if (saved_w, saved_h) != (live_w, live_h) {
        warn!(saved_w, saved_h, live_w, live_h, "Save dimensions differ, fitting to live grid");
        issues.push(ColorWarError::DimensionMismatch {
            saved_width: saved_w,
            saved_height: saved_h,
            live_width: live_w,
            live_height: live_h,
        });
    }

    world.registry = FactionRegistry::new();
    let mut by_color: AHashMap<Rgb, FactionId> = AHashMap::new();
    for record in save.factions {
        if by_color.contains_key(&record.color) {
            issues.push(ColorWarError::MalformedSaveRecord {
                line: 0,
                reason: format!("duplicate faction color {}", record.color),
            });
            continue;
        }
        let color = record.color;
        let id = world.spawn_faction(|id| record.into_faction(id));
        by_color.insert(color, id);
    }

    let mut recovered = Vec::new();
    let mut grid = GridState::new(live_w, live_h);
    for (y, row) in save.rows.iter().enumerate().take(live_h) {
        for (x, color) in row.iter().enumerate().take(live_w) {
            let Some(color) = *color else { continue };
            let id = match by_color.get(&color) {
                Some(&id) => id,
                None => {
                    let behavior = Behavior::random(&mut world.rng);
                    let id = world.spawn_faction(|id| recovered_faction(id, color, behavior));
                    warn!(%color, faction = %id, "Grid references unknown color, faction recovered");
                    issues.push(ColorWarError::DanglingFactionReference(color.to_string()));
                    by_color.insert(color, id);
                    recovered.push(id);
                    id
                }
            };
            grid.set(CellCoord::new(x, y), Cell::owned_by(id));
        }
    }
    world.grid = grid;
    world.dominator = None;

    let relations_backfilled = world.registry.backfill_relations(&mut world.rng);

    for issue in &issues {
        if matches!(issue, ColorWarError::MalformedSaveRecord { .. }) {
            warn!(%issue, "Skipped save record");
        }
    }

    LoadReport {
        factions: world.live_count(),
        recovered,
        relations_backfilled,
        issues,
    }
}

pub fn write_save(world: &World, path: &Path) -> Result<()> {
    fs::write(path, encode(world))?;
    info!(path = %path.display(), factions = world.live_count(), "Game saved");
    Ok(())
}

/// Load a text save into `world`. A missing file leaves the world untouched
/// and returns `Ok(None)`.
pub fn load_save(world: &mut World, path: &Path) -> Result<Option<LoadReport>> {
    if !path.exists() {
        warn!(path = %path.display(), "No save file, load skipped");
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let (save, issues) = decode(&text);
    let report = apply(world, save, issues);
    info!(
        path = %path.display(),
        factions = report.factions,
        recovered = report.recovered.len(),
        issues = report.issues.len(),
        "Game loaded"
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capital() {
        assert_eq!(parse_capital("(3, 4)").unwrap(), Some(CellCoord::new(3, 4)));
        assert_eq!(parse_capital("( 10 ,7 )").unwrap(), Some(CellCoord::new(10, 7)));
        assert_eq!(parse_capital("None").unwrap(), None);
        assert!(parse_capital("(3, 4, 5)").is_err());
        assert!(parse_capital("(-1, 4)").is_err());
        assert!(parse_capital("__import__('os')").is_err());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = FactionRecord {
            color: Rgb::new(0xab, 0xcd, 0xef),
            name: "Faction 7".into(),
            behavior: Behavior::Sapper,
            tier: 3,
            symbol: "▲".into(),
            dna: "E-1234".into(),
            capital: Some(CellCoord::new(5, 9)),
            personality: Personality::new(0.8, 2.0, 0.7, 0.6),
        };
        let line = record.encode();
        assert_eq!(line, "#abcdef|Faction 7|sapper|3|▲|E-1234|(5, 9)|0.8|2|0.7|0.6");
        assert_eq!(parse_record(&line, 1).unwrap(), record);
    }

    #[test]
    fn test_pipe_in_name_is_sanitized() {
        let mut record = parse_record("#000001|A|hive|1|■||None|1|1|1|1", 1).unwrap();
        record.name = "Left|Right".into();
        let line = record.encode();
        assert_eq!(line.split('|').count(), FIELD_COUNT);
    }

    #[test]
    fn test_decode_skips_bad_lines() {
        let text = "\
[GRID]
#ff0000,None
None,#zzzzzz
[FACTIONS]
#ff0000|Faction 1|aggressive|1|■|S-1000|None|1|1|1|1
#00ff00|Broken|aggressive|1
#0000ff|Odd|pacifist|1|■|S-1000|None|1|1|1|1
";
        let (save, issues) = decode(text);
        assert_eq!(save.height(), 2);
        assert_eq!(save.width(), 2);
        assert_eq!(save.rows[1], vec![None, None]);
        assert_eq!(save.factions.len(), 1);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|e| matches!(e, ColorWarError::MalformedSaveRecord { .. })));
    }
}
