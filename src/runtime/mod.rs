//! Runtime: background driver, shared-world access and command dispatch

pub mod command;
pub mod runner;

pub use command::{Command, CommandOutcome, FixedPathResolver, PathResolver, Session};
pub use runner::{read_world, share, write_world, SharedWorld, SimulationRunner};
