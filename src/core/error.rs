use thiserror::Error;

use crate::core::types::FactionId;

#[derive(Error, Debug)]
pub enum ColorWarError {
    #[error("Malformed save record at line {line}: {reason}")]
    MalformedSaveRecord { line: usize, reason: String },

    #[error("Saved grid is {saved_width}x{saved_height}, live grid is {live_width}x{live_height}")]
    DimensionMismatch {
        saved_width: usize,
        saved_height: usize,
        live_width: usize,
        live_height: usize,
    },

    #[error("Grid references unknown faction color {0}")]
    DanglingFactionReference(String),

    #[error("Power map is empty")]
    EmptyPowerMap,

    #[error("Faction not found: {0}")]
    FactionNotFound(FactionId),

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Unknown behavior: {0:?}")]
    UnknownBehavior(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Snapshot codec error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ColorWarError>;
