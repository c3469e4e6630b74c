mod connectivity;
mod display;
mod geometry;
mod grid;
mod input;
mod session;
mod snake;
mod walls;

use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::display::TerminalDisplay;
use crate::input::KeyboardInput;
use crate::session::{GameSession, Settings};

/// Snake in the terminal, on a board with randomly carved walls
#[derive(Parser, Debug)]
#[command(name = "coluber")]
#[command(version, about, long_about = None)]
struct Args {
    /// Board height in cells; the width is twice this
    #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(u16).range(5..=1000))]
    height: u16,

    /// Milliseconds between snake moves
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Seed for the board and food placement (default: random)
    #[arg(long)]
    seed: Option<u64>,

    /// Where log output goes
    #[arg(long, default_value = "coluber.log")]
    log_file: PathBuf,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            board_height: self.height,
            tick: Duration::from_millis(self.tick_ms),
        }
    }
}

fn main() -> Result<(), io::Error> {
    let args = Args::parse();

    // Set up logging before anything else
    WriteLogger::init(args.log_level, Config::default(), File::create(&args.log_file)?)
        .map_err(io::Error::other)?;

    info!("Starting coluber with {:?}", args);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = TerminalDisplay::new(terminal).and_then(|display| {
        GameSession::new(args.settings(), display, KeyboardInput, rng).run()
    });

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;

    match &result {
        Ok(()) => info!("Exiting"),
        Err(e) => error!("Exiting on error: {}", e),
    }
    result
}
