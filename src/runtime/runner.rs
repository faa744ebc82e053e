//! Background simulation driver
//!
//! The world lives behind an `RwLock`. The driver holds the write lock for
//! exactly one tick, so readers see either the state before a tick or the
//! state after it. A poisoned lock is recovered rather than propagated:
//! a panicking reader must not take the simulation down with it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::simulation::tick::run_tick;
use crate::simulation::world::World;

pub type SharedWorld = Arc<RwLock<World>>;

pub fn share(world: World) -> SharedWorld {
    Arc::new(RwLock::new(world))
}

pub fn read_world(world: &SharedWorld) -> RwLockReadGuard<'_, World> {
    world.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_world(world: &SharedWorld) -> RwLockWriteGuard<'_, World> {
    world.write().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the background tick thread
pub struct SimulationRunner {
    running: Arc<AtomicBool>,
    ticks_run: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationRunner {
    /// Start ticking `world` every `interval` until stopped
    pub fn spawn(world: SharedWorld, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let ticks_run = Arc::new(AtomicU64::new(0));

        let flag = Arc::clone(&running);
        let counter = Arc::clone(&ticks_run);
        let handle = thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, "Simulation loop started");
            while flag.load(Ordering::Relaxed) {
                {
                    let mut guard = write_world(&world);
                    run_tick(&mut guard);
                }
                counter.fetch_add(1, Ordering::Relaxed);
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
            debug!(ticks = counter.load(Ordering::Relaxed), "Simulation loop exited");
        });

        Self {
            running,
            ticks_run,
            handle: Some(handle),
        }
    }

    /// Shared cancellation flag. Clearing it stops the loop within one tick.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ticks completed by this runner
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Stop and wait for the thread to exit
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            reap(handle);
        }
    }
}

/// Join the tick thread. A panic is logged, not re-raised, so shutdown
/// still restores the terminal. Returns whether the thread exited cleanly.
fn reap(handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(%reason, "Simulation thread panicked");
            false
        }
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
