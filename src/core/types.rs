//! Core type definitions used throughout the codebase

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, From};
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::char;
use nom::combinator::{all_consuming, map_res};
use nom::{IResult, Parser};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::ColorWarError;

/// Stable identifier for factions, allocated by the registry.
///
/// Identity is independent of the display color: two factions may briefly
/// share a blended color candidate without ever sharing an id.
#[derive(
    Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display(fmt = "F{}", _0)]
pub struct FactionId(pub u32);

impl FactionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Simulation tick counter
pub type Tick = u64;

/// Bounds-checked grid coordinate. Only `Grid` hands these out for
/// neighbor walks, so arithmetic never leaves the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
}

impl CellCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Display color of a faction (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_u32(rng.gen_range(0..=0xFF_FFFF))
    }

    /// Per-channel integer average, rounding down.
    pub fn blend(self, other: Rgb) -> Rgb {
        let avg = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
        Rgb::new(avg(self.r, other.r), avg(self.g, other.g), avg(self.b, other.b))
    }

    pub fn to_u32(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub fn from_u32(value: u32) -> Self {
        Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Step through the 24-bit color space, wrapping at white.
    pub fn offset(self, step: u32) -> Rgb {
        Rgb::from_u32(self.to_u32().wrapping_add(step) & 0xFF_FFFF)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16)
    })
    .parse(input)
}

fn hex_color(input: &str) -> IResult<&str, Rgb> {
    let (input, _) = char('#').parse(input)?;
    let (input, (r, g, b)) = (hex_byte, hex_byte, hex_byte).parse(input)?;
    Ok((input, Rgb::new(r, g, b)))
}

impl FromStr for Rgb {
    type Err = ColorWarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(hex_color)
            .parse(s.trim())
            .map(|(_, rgb)| rgb)
            .map_err(|_| ColorWarError::InvalidColor(s.to_string()))
    }
}
