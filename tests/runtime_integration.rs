//! Integration tests for the background runner and command session

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use color_war::core::config::SimulationConfig;
use color_war::runtime::{
    read_world, share, write_world, Command, CommandOutcome, FixedPathResolver, PathResolver,
    Session, SimulationRunner,
};
use color_war::simulation::generation::new_game;
use tempfile::tempdir;

fn config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.seed = Some(seed);
    config.grid.width = 24;
    config.grid.height = 16;
    config.factions.initial_count = 10;
    config.factions.initial_cells = 6;
    config
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_runner_advances_and_stops() {
    let world = share(new_game(config(1)));
    let runner = SimulationRunner::spawn(Arc::clone(&world), Duration::from_millis(1));

    assert!(wait_for(|| read_world(&world).tick >= 5));
    assert!(runner.is_running());

    runner.stop();
    assert!(!runner.is_running());
    let ticks = runner.ticks_run();
    runner.join();

    let settled = read_world(&world).tick;
    assert!(settled >= ticks);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(read_world(&world).tick, settled);
}

#[test]
fn test_reader_sees_consistent_world() {
    let world = share(new_game(config(2)));
    let runner = SimulationRunner::spawn(Arc::clone(&world), Duration::from_millis(1));

    for _ in 0..50 {
        let guard = read_world(&world);
        for (_, cell) in guard.grid.iter() {
            if let Some(owner) = cell.owner {
                assert!(guard.registry.contains(owner));
            }
        }
    }
    runner.join();
}

#[test]
fn test_poisoned_lock_is_recovered() {
    let world = share(new_game(config(3)));
    let poisoner = Arc::clone(&world);
    let _ = thread::spawn(move || {
        let _guard = write_world(&poisoner);
        panic!("reader crashed while holding the lock");
    })
    .join();
    assert!(world.is_poisoned());

    let runner = SimulationRunner::spawn(Arc::clone(&world), Duration::from_millis(1));
    assert!(wait_for(|| read_world(&world).tick >= 3));
    runner.join();
}

#[test]
fn test_session_save_load_and_new_game() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.txt");
    let world = share(new_game(config(4)));
    let runner = SimulationRunner::spawn(Arc::clone(&world), Duration::from_millis(1));
    let mut session = Session::new(
        Arc::clone(&world),
        FixedPathResolver::new(&path),
        config(4),
        runner.running_flag(),
    );

    match session.dispatch(Command::Save).unwrap() {
        CommandOutcome::Saved(saved) => assert_eq!(saved, path),
        other => panic!("expected save, got {other:?}"),
    }
    assert!(path.exists());

    match session.dispatch(Command::Load).unwrap() {
        CommandOutcome::Loaded(_, report) => assert!(report.factions > 0),
        other => panic!("expected load, got {other:?}"),
    }

    assert!(matches!(session.dispatch(Command::NewGame).unwrap(), CommandOutcome::NewGame));
    assert!(read_world(&world).live_count() > 0);

    assert!(matches!(session.dispatch(Command::Quit).unwrap(), CommandOutcome::Quit));
    assert!(!runner.is_running());
    runner.join();
}

#[test]
fn test_load_without_file_is_skipped() {
    let dir = tempdir().unwrap();
    let world = share(new_game(config(5)));
    let flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let mut session = Session::new(
        Arc::clone(&world),
        FixedPathResolver::new(dir.path().join("missing.txt")),
        config(5),
        Arc::clone(&flag),
    );

    assert!(matches!(session.handle(Command::Load), Some(CommandOutcome::Skipped)));
    assert!(flag.load(Ordering::Relaxed));
}

struct NoPaths;

impl PathResolver for NoPaths {
    fn save_path(&mut self) -> Option<std::path::PathBuf> {
        None
    }

    fn load_path(&mut self) -> Option<std::path::PathBuf> {
        None
    }
}

#[test]
fn test_cancelled_dialog_skips_command() {
    let world = share(new_game(config(6)));
    let flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let mut session = Session::new(Arc::clone(&world), NoPaths, config(6), flag);

    assert!(matches!(session.dispatch(Command::Save).unwrap(), CommandOutcome::Skipped));
    assert!(matches!(session.dispatch(Command::Load).unwrap(), CommandOutcome::Skipped));
}

#[test]
fn test_failed_save_keeps_session_alive() {
    let dir = tempdir().unwrap();
    let world = share(new_game(config(7)));
    let flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let unwritable = dir.path().join("no_such_dir").join("save.txt");
    let mut session = Session::new(
        Arc::clone(&world),
        FixedPathResolver::new(unwritable),
        config(7),
        Arc::clone(&flag),
    );

    assert!(session.handle(Command::Save).is_none());
    assert!(flag.load(Ordering::Relaxed));
}
