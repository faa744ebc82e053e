//! Color War - territorial faction simulation on a cell grid

pub mod core;
pub mod faction;
pub mod persistence;
pub mod render;
pub mod runtime;
pub mod simulation;
pub mod spatial;
