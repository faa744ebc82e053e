//! Spatial data structures: the ownership grid and the biome layer

pub mod biome;
pub mod grid;

pub use biome::{Biome, BiomeMap};
pub use grid::{Cell, Grid, GridState};
