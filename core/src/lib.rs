#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hexbots engine.
//!
//! This crate defines the message surface that connects the turn loop, the
//! authoritative world, and the scripting system. The loop submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what happened. Scripts observe the board exclusively through
//! the immutable [`BoardView`] snapshot captured when their turn begins.

pub mod hex;
pub mod piece;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hex::{HexCoord, HexDirection};
pub use piece::{
    DamageOutcome, MoveError, Piece, PieceId, PieceIdError, PieceKind, PieceStats, ShootError,
    Team,
};

/// Character separating the sender from the payload in mailbox messages.
pub const MESSAGE_SEPARATOR: char = '@';

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Resizes the hexagonal board around the origin.
    ConfigureBoard {
        /// Largest distance from the origin that still lies on the board.
        radius: u32,
    },
    /// Sets the capacity used for mailboxes created by later spawns.
    ConfigureMailboxes {
        /// Maximum number of queued messages per mailbox.
        capacity: usize,
    },
    /// Places a new piece on the board and opens its mailbox.
    SpawnPiece {
        /// Identifier of the new piece.
        id: PieceId,
        /// Team the piece fights for.
        team: Team,
        /// Template supplying the piece's stats.
        kind: PieceKind,
        /// Hex the piece starts on.
        position: HexCoord,
        /// Initial facing in sixths of a turn.
        rotation: u8,
    },
    /// Resets a piece's per-turn state and checkpoints it ahead of its script.
    BeginTurn {
        /// Piece about to act.
        piece: PieceId,
    },
    /// Applies a shot fired during the acting piece's turn.
    ResolveShot {
        /// Piece that fired.
        attacker: PieceId,
        /// Piece occupying the targeted hex.
        target: PieceId,
        /// Damage carried by the shot.
        damage: u32,
    },
    /// Commits the acting piece's turn.
    EndTurn {
        /// Piece whose turn completed.
        piece: PieceId,
    },
    /// Discards the acting piece's turn, restoring the checkpoint.
    AbortTurn {
        /// Piece whose script faulted.
        piece: PieceId,
        /// Human-readable description of the fault.
        reason: String,
    },
    /// Processes pending deaths and closes the current round.
    FinishRound,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that the board was resized.
    BoardConfigured {
        /// New board radius.
        radius: u32,
    },
    /// Confirms that a piece entered the match.
    PieceSpawned {
        /// Identifier of the new piece.
        piece: PieceId,
        /// Team the piece fights for.
        team: Team,
        /// Hex the piece starts on.
        position: HexCoord,
    },
    /// Reports that a spawn request was rejected.
    PieceSpawnRejected {
        /// Identifier carried by the rejected request.
        piece: PieceId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Announces that a piece began its turn.
    TurnStarted {
        /// Piece about to act.
        piece: PieceId,
        /// Number of turns the piece has started, this one included.
        turn: u32,
    },
    /// Reports that a piece changed hex during its turn.
    PieceMoved {
        /// Piece that moved.
        piece: PieceId,
        /// Hex occupied when the turn began.
        from: HexCoord,
        /// Hex occupied when the turn ended.
        to: HexCoord,
        /// Spaces walked during the turn.
        spaces: u32,
    },
    /// Reports a shot that hit a piece.
    ShotResolved {
        /// Piece that fired.
        attacker: PieceId,
        /// Piece that was hit.
        target: PieceId,
        /// Health removed from the target.
        damage: u32,
    },
    /// Reports that a piece reached zero health and awaits death processing.
    PieceDowned {
        /// Piece that was downed.
        piece: PieceId,
        /// Piece whose shot downed it.
        by: PieceId,
    },
    /// Confirms that a piece completed its turn normally.
    TurnEnded {
        /// Piece whose turn completed.
        piece: PieceId,
    },
    /// Reports that a piece's script faulted and its turn was discarded.
    TurnFaulted {
        /// Piece whose script faulted.
        piece: PieceId,
        /// Human-readable description of the fault.
        reason: String,
    },
    /// Confirms that a downed piece was removed from the board.
    PieceDestroyed {
        /// Piece that was removed.
        piece: PieceId,
    },
    /// Announces that a round closed.
    RoundFinished {
        /// Number of rounds completed so far.
        round: u32,
    },
    /// Announces that at most one team has pieces left.
    MatchConcluded {
        /// Surviving team, if any.
        winner: Option<Team>,
    },
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// Another piece already uses the identifier, ignoring case.
    #[error("identifier already in use")]
    DuplicateId,
    /// The requested hex lies outside the board.
    #[error("position outside the board")]
    OutOfBounds,
    /// The requested hex is already occupied.
    #[error("position already occupied")]
    Occupied,
}

/// Immutable representation of a single piece used for board queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceSnapshot {
    /// Identifier of the piece.
    pub id: PieceId,
    /// Team the piece fights for.
    pub team: Team,
    /// Template the piece was built from.
    pub kind: PieceKind,
    /// Hex the piece occupies.
    pub position: HexCoord,
    /// Current health.
    pub health: u32,
    /// Whether the piece can still act, as opposed to awaiting death processing.
    pub active: bool,
}

/// Read-only snapshot of the board captured when a turn begins.
#[derive(Clone, Debug, Default)]
pub struct BoardView {
    radius: u32,
    snapshots: Vec<PieceSnapshot>,
}

impl BoardView {
    /// Creates a new board view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(radius: u32, mut snapshots: Vec<PieceSnapshot>) -> Self {
        snapshots.sort_by(|left, right| left.id.cmp(&right.id));
        Self { radius, snapshots }
    }

    /// Largest distance from the origin that still lies on the board.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Reports whether the hex lies on the board.
    #[must_use]
    pub fn contains(&self, cell: HexCoord) -> bool {
        HexCoord::ORIGIN.distance(&cell) <= self.radius
    }

    /// Returns the piece occupying the hex, if any.
    #[must_use]
    pub fn occupant(&self, cell: HexCoord) -> Option<&PieceSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.position.same_hex(&cell))
    }

    /// Returns the snapshot of the piece with the provided identifier.
    #[must_use]
    pub fn piece(&self, id: &PieceId) -> Option<&PieceSnapshot> {
        self.snapshots.iter().find(|snapshot| &snapshot.id == id)
    }

    /// Iterator over pieces within `range` steps of `center`.
    pub fn within(
        &self,
        center: HexCoord,
        range: u32,
    ) -> impl Iterator<Item = &PieceSnapshot> + '_ {
        self.snapshots
            .iter()
            .filter(move |snapshot| center.distance(&snapshot.position) <= range)
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PieceSnapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardView, HexCoord, PieceId, PieceKind, PieceSnapshot, SpawnError, Team};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn hex_coord_round_trips_through_bincode() {
        assert_round_trip(&HexCoord::new(-4, 5, 0));
    }

    #[test]
    fn spawn_error_round_trips_through_bincode() {
        assert_round_trip(&SpawnError::Occupied);
    }

    #[test]
    fn piece_id_validation_survives_deserialisation() {
        let bytes = bincode::serialize(&String::from("bad@name")).expect("serialize");
        let restored: Result<PieceId, _> = bincode::deserialize(&bytes);
        assert!(restored.is_err());
    }

    fn snapshot(id: &str, position: HexCoord) -> PieceSnapshot {
        PieceSnapshot {
            id: PieceId::new(id).expect("valid id"),
            team: Team::new("red"),
            kind: PieceKind::Tank,
            position,
            health: 4,
            active: true,
        }
    }

    #[test]
    fn occupant_matches_equivalent_coordinates() {
        let view = BoardView::from_snapshots(5, vec![snapshot("a", HexCoord::new(4, 5, 0))]);
        let found = view.occupant(HexCoord::new(9, 0, 5)).expect("occupant");
        assert_eq!(found.id.as_str(), "a");
        assert!(view.occupant(HexCoord::ORIGIN).is_none());
    }

    #[test]
    fn board_contains_hexes_within_radius() {
        let view = BoardView::from_snapshots(2, Vec::new());
        assert!(view.contains(HexCoord::new(1, 1, 0)));
        assert!(!view.contains(HexCoord::new(3, 0, 0)));
        assert!(!view.contains(HexCoord::new(-2, 0, 2)));
        assert!(view.contains(HexCoord::new(-1, 0, 1)));
    }

    #[test]
    fn within_filters_by_distance() {
        let view = BoardView::from_snapshots(
            5,
            vec![
                snapshot("near", HexCoord::new(1, 0, 0)),
                snapshot("far", HexCoord::new(4, 0, 0)),
            ],
        );
        let ids: Vec<_> = view
            .within(HexCoord::ORIGIN, 2)
            .map(|snapshot| snapshot.id.as_str())
            .collect();
        assert_eq!(ids, vec!["near"]);
    }
}
