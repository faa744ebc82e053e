pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{ColorWarError, Result};
pub use types::{CellCoord, FactionId, Rgb, Tick};
