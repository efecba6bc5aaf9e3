#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays hexbots matches from TOML match files.

mod config;
mod report;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hexbots_core::{Event, PieceId};
use hexbots_system_scripting::{Interpreter, InterpreterConfig};
use hexbots_system_turns::Turns;
use hexbots_world::{self as world, World};

#[derive(Debug, Parser)]
#[command(name = "hexbots", version, about = "Scripted hex-board robot matches")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play the match described by a TOML match file
    Run {
        /// Path to the match file
        path: PathBuf,
        /// Overrides the match file's round limit
        #[arg(long)]
        rounds: Option<u32>,
    },
    /// Tokenize and structurally check a script without running it
    Check {
        /// Path to the script
        path: PathBuf,
    },
}

/// Entry point for the hexbots command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    match Cli::parse().command {
        Cmd::Run { path, rounds } => run(path, rounds),
        Cmd::Check { path } => check(path),
    }
}

fn run(path: PathBuf, rounds: Option<u32>) -> Result<()> {
    let loaded = config::load(&path)?;
    let max_rounds = rounds.unwrap_or(loaded.max_rounds);

    let mut world = World::new();
    let mut events = Vec::new();
    for command in loaded.setup.commands() {
        world::apply(&mut world, command, &mut events);
    }
    for event in &events {
        if let Event::PieceSpawnRejected { piece, reason } = event {
            bail!("piece `{piece}` could not be placed: {reason}");
        }
    }

    let mut turns = Turns::from_setup(&loaded.setup);
    events.clear();
    let result = turns.play(&mut world, max_rounds, &mut events);
    for event in &events {
        log::debug!("{event:?}");
    }
    log::info!(
        "{} events over {} rounds",
        events.len(),
        result.rounds_played
    );

    print!("{}", report::summary(&world, &result));
    Ok(())
}

fn check(path: PathBuf) -> Result<()> {
    let script = fs::read_to_string(&path)
        .with_context(|| format!("failed to read script at {}", path.display()))?;
    let owner = PieceId::new("check").context("invalid checker id")?;
    let interpreter = Interpreter::new(owner, InterpreterConfig::default());
    let tokens = interpreter
        .check(&script)
        .with_context(|| format!("{} is not a valid script", path.display()))?;
    println!("{}: ok ({tokens} tokens)", path.display());
    Ok(())
}
