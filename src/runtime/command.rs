//! Command source and session dispatch
//!
//! A front end turns key presses (or anything else) into `Command`s; the
//! session applies them to the shared world. Paths are resolved only when a
//! save or load actually arrives.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::persistence::{self, LoadReport};
use crate::runtime::runner::{read_world, write_world, SharedWorld};
use crate::simulation::generation::new_game;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    Load,
    NewGame,
    Quit,
}

/// Chooses where saves go and loads come from
pub trait PathResolver {
    fn save_path(&mut self) -> Option<PathBuf>;
    fn load_path(&mut self) -> Option<PathBuf>;
}

/// Always the same file
#[derive(Debug, Clone)]
pub struct FixedPathResolver {
    path: PathBuf,
}

impl FixedPathResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PathResolver for FixedPathResolver {
    fn save_path(&mut self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn load_path(&mut self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

#[derive(Debug)]
pub enum CommandOutcome {
    Saved(PathBuf),
    Loaded(PathBuf, LoadReport),
    /// No path chosen, or nothing to load
    Skipped,
    NewGame,
    Quit,
}

pub struct Session<R: PathResolver> {
    world: SharedWorld,
    resolver: R,
    config: SimulationConfig,
    running: Arc<AtomicBool>,
}

impl<R: PathResolver> Session<R> {
    pub fn new(
        world: SharedWorld,
        resolver: R,
        config: SimulationConfig,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            world,
            resolver,
            config,
            running,
        }
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::Save => {
                let Some(path) = self.resolver.save_path() else {
                    return Ok(CommandOutcome::Skipped);
                };
                persistence::save(&read_world(&self.world), &path)?;
                Ok(CommandOutcome::Saved(path))
            }
            Command::Load => {
                let Some(path) = self.resolver.load_path() else {
                    return Ok(CommandOutcome::Skipped);
                };
                let report = persistence::load(&mut write_world(&self.world), &path)?;
                Ok(match report {
                    Some(report) => CommandOutcome::Loaded(path, report),
                    None => CommandOutcome::Skipped,
                })
            }
            Command::NewGame => {
                let fresh = new_game(self.config.clone());
                *write_world(&self.world) = fresh;
                info!("New game started");
                Ok(CommandOutcome::NewGame)
            }
            Command::Quit => {
                self.running.store(false, Ordering::Relaxed);
                Ok(CommandOutcome::Quit)
            }
        }
    }

    /// Dispatch, logging failures instead of returning them. Persistence
    /// errors never end the session.
    pub fn handle(&mut self, command: Command) -> Option<CommandOutcome> {
        match self.dispatch(command) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(?command, error = %e, "Command failed");
                None
            }
        }
    }
}
