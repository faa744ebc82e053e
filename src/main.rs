//! Color War - Entry Point
//!
//! Runs the simulation in a terminal view, or headless for a fixed number of
//! ticks printing a JSON summary.

use std::error::Error;
use std::fs::File;
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde::Serialize;

use color_war::core::config::SimulationConfig;
use color_war::persistence;
use color_war::render;
use color_war::runtime::{
    read_world, share, Command, CommandOutcome, FixedPathResolver, Session, SimulationRunner,
};
use color_war::simulation::generation::new_game;
use color_war::simulation::tick::run_ticks;
use color_war::simulation::world::World;

const DEFAULT_SAVE: &str = "color_war_save.txt";

/// Color War - factions spreading, fusing and rebelling on a grid
#[derive(Parser, Debug)]
#[command(name = "color-war")]
#[command(about = "Territorial faction simulation with fusion, rebellion and disasters")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save file used by the save/load keys (`.bin` or `.snapshot` for binary)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Grid width in cells. Without width or height the terminal view
    /// sizes the grid to the screen.
    #[arg(long)]
    width: Option<usize>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<usize>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Run without a terminal view and print a JSON summary
    #[arg(long)]
    headless: bool,

    /// Ticks to run in headless mode
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// Log file for the terminal view
    #[arg(long, default_value = "color-war.log")]
    log_file: PathBuf,
}

#[derive(Serialize)]
struct FactionSummary {
    id: u32,
    name: String,
    color: String,
    behavior: String,
    tier: u32,
    cells: u32,
    share: f64,
}

#[derive(Serialize)]
struct RunSummary {
    tick: u64,
    live_factions: usize,
    empty_cells: usize,
    dominator: Option<String>,
    top_factions: Vec<FactionSummary>,
    recent_events: Vec<String>,
}

impl RunSummary {
    fn from_world(world: &World, top: usize) -> Self {
        let power = world.power_map();
        let top_factions = power
            .ranked()
            .into_iter()
            .take(top)
            .filter_map(|(id, cells)| {
                let faction = world.registry.get(id)?;
                Some(FactionSummary {
                    id: id.0,
                    name: faction.name.clone(),
                    color: faction.color.to_string(),
                    behavior: faction.behavior.to_string(),
                    tier: faction.tier,
                    cells,
                    share: power.share(id),
                })
            })
            .collect();

        Self {
            tick: world.tick,
            live_factions: world.live_count(),
            empty_cells: world.grid.empty_count(),
            dominator: world.dominator.map(|id| world.faction_name(id)),
            top_factions,
            recent_events: world
                .chronicle
                .recent(10)
                .map(|e| format!("[{}] {}", e.tick, e.kind.describe()))
                .collect(),
        }
    }
}

fn build_config(args: &Args) -> Result<SimulationConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(width) = args.width {
        config.grid.width = width;
    }
    if let Some(height) = args.height {
        config.grid.height = height;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = build_config(&args)?;

    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::WARN.into()),
            )
            .with_writer(std::io::stderr)
            .init();
        run_headless(&args, config)
    } else {
        // The terminal owns stdout, so logs go to a file
        let log = File::create(&args.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::INFO.into()),
            )
            .with_ansi(false)
            .with_writer(Mutex::new(log))
            .init();
        run_terminal(&args, config)
    }
}

fn run_headless(args: &Args, config: SimulationConfig) -> Result<(), Box<dyn Error>> {
    let mut world = new_game(config);
    tracing::info!(ticks = args.ticks, factions = world.live_count(), "Headless run starting");
    run_ticks(&mut world, args.ticks);

    if let Some(path) = &args.save {
        persistence::save(&world, path)?;
    }

    let summary = RunSummary::from_world(&world, 10);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_terminal(args: &Args, mut config: SimulationConfig) -> Result<(), Box<dyn Error>> {
    if args.width.is_none() && args.height.is_none() {
        let (cols, rows) = terminal::size()?;
        config.grid = render::grid_for_terminal(&config.grid, cols, rows);
        tracing::info!(
            cols,
            rows,
            width = config.grid.width,
            height = config.grid.height,
            "Grid fitted to terminal"
        );
    }
    let save_path = args.save.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE));
    let tick_interval = Duration::from_millis(config.runtime.tick_interval_ms);
    let frame_interval = Duration::from_millis(1000 / config.runtime.frame_rate.max(1) as u64);

    let world = share(new_game(config.clone()));
    let runner = SimulationRunner::spawn(Arc::clone(&world), tick_interval);
    let running = runner.running_flag();
    let mut session = Session::new(
        Arc::clone(&world),
        FixedPathResolver::new(save_path),
        config,
        Arc::clone(&running),
    );

    terminal::enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;

    let result = frame_loop(&mut terminal, &mut session, &running, frame_interval);

    runner.join();
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn frame_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session<FixedPathResolver>,
    running: &AtomicBool,
    frame_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut message: Option<String> = None;

    while running.load(Ordering::Relaxed) {
        {
            let world = read_world(session.world());
            terminal.draw(|f| render::draw(f, &world, message.as_deref()))?;
        }

        if !event::poll(frame_interval)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let command = match key.code {
            KeyCode::Char('s') => Command::Save,
            KeyCode::Char('l') => Command::Load,
            KeyCode::Char('n') => Command::NewGame,
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            _ => continue,
        };

        message = Some(match session.handle(command) {
            Some(CommandOutcome::Saved(path)) => format!("Saved to {}", path.display()),
            Some(CommandOutcome::Loaded(path, report)) => format!(
                "Loaded {} ({} factions, {} skipped)",
                path.display(),
                report.factions,
                report.skipped_records()
            ),
            Some(CommandOutcome::Skipped) => "Nothing to load".to_string(),
            Some(CommandOutcome::NewGame) => "New game".to_string(),
            Some(CommandOutcome::Quit) => break,
            None => "Command failed, see log".to_string(),
        });
    }
    Ok(())
}
