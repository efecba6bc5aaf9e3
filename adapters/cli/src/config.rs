//! Match files describing the board, interpreter limits and the pieces taking part.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use hexbots_core::{HexCoord, PieceId, PieceKind, Team};
use hexbots_system_scripting::InterpreterConfig;
use hexbots_system_turns::{MatchSetup, PieceSetup};
use hexbots_world::{DEFAULT_BOARD_RADIUS, DEFAULT_MAILBOX_CAPACITY};
use serde::Deserialize;

const DEFAULT_MAX_ROUNDS: u32 = 100;
/// Largest board radius a match file may ask for.
const MAX_BOARD_RADIUS: u32 = 1 << 16;

/// Match description as written in a TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MatchFile {
    #[serde(default = "default_board_radius")]
    board_radius: u32,
    #[serde(default = "default_mailbox_capacity")]
    mailbox_capacity: usize,
    #[serde(default = "default_max_rounds")]
    max_rounds: u32,
    #[serde(default)]
    interpreter: InterpreterConfig,
    #[serde(default)]
    pieces: Vec<PieceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PieceEntry {
    id: String,
    team: String,
    kind: PieceKind,
    position: Position,
    #[serde(default)]
    rotation: u8,
    script: PathBuf,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Position {
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default)]
    z: i32,
}

fn default_board_radius() -> u32 {
    DEFAULT_BOARD_RADIUS
}

fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

/// A parsed match ready to be played.
#[derive(Debug)]
pub(crate) struct LoadedMatch {
    pub(crate) setup: MatchSetup,
    pub(crate) max_rounds: u32,
}

/// Reads the match file at `path` together with every script it names.
pub(crate) fn load(path: &Path) -> Result<LoadedMatch> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read match file at {}", path.display()))?;
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file = parse(&contents)
        .with_context(|| format!("failed to parse match file at {}", path.display()))?;
    file.resolve(|script| {
        let script_path = base.join(script);
        fs::read_to_string(&script_path)
            .with_context(|| format!("failed to read script at {}", script_path.display()))
    })
}

pub(crate) fn parse(contents: &str) -> Result<MatchFile> {
    toml::from_str(contents).context("invalid match toml")
}

impl MatchFile {
    /// Builds the match setup, loading scripts through `read_script`.
    pub(crate) fn resolve(
        self,
        mut read_script: impl FnMut(&Path) -> Result<String>,
    ) -> Result<LoadedMatch> {
        if self.pieces.is_empty() {
            bail!("match file declares no pieces");
        }
        if self.max_rounds == 0 {
            bail!("max_rounds must be at least 1");
        }
        if self.board_radius > MAX_BOARD_RADIUS {
            bail!(
                "board_radius {} exceeds the limit of {MAX_BOARD_RADIUS}",
                self.board_radius
            );
        }

        let mut pieces = Vec::with_capacity(self.pieces.len());
        for entry in self.pieces {
            let id = PieceId::new(entry.id.as_str())
                .with_context(|| format!("invalid piece id `{}`", entry.id))?;
            if entry.rotation > 5 {
                bail!(
                    "piece `{id}` has rotation {}; expected 0 through 5",
                    entry.rotation
                );
            }
            let script = read_script(&entry.script)
                .with_context(|| format!("failed to load the script of `{id}`"))?;
            let Position { x, y, z } = entry.position;
            if [x, y, z]
                .iter()
                .any(|component| component.unsigned_abs() > MAX_BOARD_RADIUS)
            {
                bail!("piece `{id}` is placed at ({x}, {y}, {z}), far outside any board");
            }
            pieces.push(PieceSetup {
                id,
                team: Team::new(entry.team),
                kind: entry.kind,
                position: HexCoord::new(x, y, z),
                rotation: entry.rotation,
                script,
            });
        }

        Ok(LoadedMatch {
            setup: MatchSetup {
                board_radius: self.board_radius,
                mailbox_capacity: self.mailbox_capacity,
                interpreter: self.interpreter,
                pieces,
            },
            max_rounds: self.max_rounds,
        })
    }
}
