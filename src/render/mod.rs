//! Terminal rendering of the shared world
//!
//! Read-only: nothing here mutates simulation state.

pub mod colors;
pub mod frame;

pub use frame::{draw, grid_for_terminal, GridView};
