#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Hexbots.

use hexbots_core::{Command, Event, HexCoord, Piece, PieceId, SpawnError};
use hexbots_system_mailbox::MailboxDirectory;
pub use hexbots_system_mailbox::DEFAULT_CAPACITY as DEFAULT_MAILBOX_CAPACITY;

/// Radius of the board before the match configures one.
pub const DEFAULT_BOARD_RADIUS: u32 = 5;

/// Represents the authoritative Hexbots world state.
#[derive(Debug)]
pub struct World {
    radius: u32,
    mailbox_capacity: usize,
    pieces: Vec<Piece>,
    mailboxes: MailboxDirectory,
    round: u32,
    concluded: bool,
    checkpoint: Option<Checkpoint>,
}

/// State captured when a turn begins so that a faulted turn can be undone.
#[derive(Debug)]
struct Checkpoint {
    piece: Piece,
    mailboxes: MailboxDirectory,
}

impl World {
    /// Creates an empty world with the default board and mailbox sizes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            radius: DEFAULT_BOARD_RADIUS,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            pieces: Vec::new(),
            mailboxes: MailboxDirectory::new(),
            round: 0,
            concluded: false,
            checkpoint: None,
        }
    }

    fn piece_index(&self, id: &PieceId) -> Option<usize> {
        self.pieces.iter().position(|piece| piece.id() == id)
    }

    fn piece_mut(&mut self, id: &PieceId) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|piece| piece.id() == id)
    }

    fn is_on_board(&self, cell: HexCoord) -> bool {
        HexCoord::ORIGIN.distance(&cell) <= self.radius
    }

    fn is_occupied(&self, cell: HexCoord) -> bool {
        self.pieces
            .iter()
            .any(|piece| piece.is_alive() && piece.position().same_hex(&cell))
    }

    fn spawn(
        &mut self,
        id: PieceId,
        piece: Piece,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SpawnError> {
        if self.pieces.iter().any(|other| other.id().matches(id.as_str())) {
            return Err(SpawnError::DuplicateId);
        }
        if !self.is_on_board(piece.position()) {
            return Err(SpawnError::OutOfBounds);
        }
        if self.is_occupied(piece.position()) {
            return Err(SpawnError::Occupied);
        }
        if let Err(error) = self.mailboxes.open(id.clone(), self.mailbox_capacity) {
            log::debug!("mailbox refused for {id}: {error}");
            return Err(SpawnError::DuplicateId);
        }

        out_events.push(Event::PieceSpawned {
            piece: id,
            team: piece.team().clone(),
            position: piece.position(),
        });
        self.pieces.push(piece);
        Ok(())
    }

    fn resolve_shot(
        &mut self,
        attacker: PieceId,
        target: PieceId,
        damage: u32,
        out_events: &mut Vec<Event>,
    ) {
        let attacker_team = match self.piece_index(&attacker) {
            Some(index) => self.pieces[index].team().clone(),
            None => return,
        };
        let Some(victim) = self.piece_mut(&target) else {
            return;
        };
        if !victim.is_active() {
            return;
        }

        let outcome = victim.take_damage(damage);
        let defeated_enemy = outcome.downed && victim.team() != &attacker_team;
        out_events.push(Event::ShotResolved {
            attacker: attacker.clone(),
            target: target.clone(),
            damage: outcome.applied,
        });
        if outcome.downed {
            log::debug!("{target} downed by {attacker}");
            out_events.push(Event::PieceDowned {
                piece: target,
                by: attacker.clone(),
            });
        }

        if let Some(shooter) = self.piece_mut(&attacker) {
            shooter.record_hit(outcome.applied, defeated_enemy);
        }
    }

    fn end_turn(&mut self, id: PieceId, out_events: &mut Vec<Event>) {
        let checkpoint = self
            .checkpoint
            .take()
            .filter(|checkpoint| checkpoint.piece.id() == &id);
        let Some(piece) = self.piece_mut(&id) else {
            return;
        };
        piece.finish_turn();

        if let Some(checkpoint) = checkpoint {
            let spaces = piece
                .spaces_moved()
                .saturating_sub(checkpoint.piece.spaces_moved());
            if spaces > 0 {
                out_events.push(Event::PieceMoved {
                    piece: id.clone(),
                    from: checkpoint.piece.position(),
                    to: piece.position(),
                    spaces,
                });
            }
        }
        out_events.push(Event::TurnEnded { piece: id });
    }

    fn abort_turn(&mut self, id: PieceId, reason: String, out_events: &mut Vec<Event>) {
        let checkpoint = self
            .checkpoint
            .take()
            .filter(|checkpoint| checkpoint.piece.id() == &id);
        if let Some(Checkpoint { piece, mailboxes }) = checkpoint {
            if let Some(index) = self.piece_index(&id) {
                self.pieces[index] = piece;
                self.pieces[index].finish_turn();
            }
            self.mailboxes = mailboxes;
        } else {
            log::warn!("{id} faulted without a checkpoint to restore");
        }
        out_events.push(Event::TurnFaulted { piece: id, reason });
    }

    fn finish_round(&mut self, out_events: &mut Vec<Event>) {
        for piece in &mut self.pieces {
            if piece.process_death_flag() {
                out_events.push(Event::PieceDestroyed {
                    piece: piece.id().clone(),
                });
            }
        }

        self.round = self.round.saturating_add(1);
        out_events.push(Event::RoundFinished { round: self.round });

        if self.concluded {
            return;
        }
        let mut teams = query::living_teams(self);
        if teams.len() <= 1 {
            self.concluded = true;
            out_events.push(Event::MatchConcluded {
                winner: teams.pop(),
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBoard { radius } => {
            world.radius = radius;
            out_events.push(Event::BoardConfigured { radius });
        }
        Command::ConfigureMailboxes { capacity } => {
            world.mailbox_capacity = capacity;
        }
        Command::SpawnPiece {
            id,
            team,
            kind,
            position,
            rotation,
        } => {
            let piece = Piece::new(id.clone(), team, kind, position, rotation);
            if let Err(reason) = world.spawn(id.clone(), piece, out_events) {
                log::debug!("spawn of {id} rejected: {reason}");
                out_events.push(Event::PieceSpawnRejected { piece: id, reason });
            }
        }
        Command::BeginTurn { piece } => {
            let mailboxes = world.mailboxes.clone();
            let Some(actor) = world.piece_mut(&piece) else {
                return;
            };
            if !actor.is_active() {
                return;
            }
            actor.begin_turn();
            let turn = actor.turns_taken();
            let snapshot = actor.clone();
            world.checkpoint = Some(Checkpoint {
                piece: snapshot,
                mailboxes,
            });
            out_events.push(Event::TurnStarted { piece, turn });
        }
        Command::ResolveShot {
            attacker,
            target,
            damage,
        } => world.resolve_shot(attacker, target, damage, out_events),
        Command::EndTurn { piece } => world.end_turn(piece, out_events),
        Command::AbortTurn { piece, reason } => world.abort_turn(piece, reason, out_events),
        Command::FinishRound => world.finish_round(out_events),
    }
}

/// Mutable access to the acting piece and every mailbox during its turn.
#[derive(Debug)]
pub struct TurnScope<'w> {
    /// Piece whose turn is running.
    pub piece: &'w mut Piece,
    /// Mailboxes of every piece in the match.
    pub mailboxes: &'w mut MailboxDirectory,
}

/// Lends the acting piece and the mailbox directory to a running script.
///
/// Returns `None` when no piece carries the identifier.
pub fn turn_scope<'w>(world: &'w mut World, id: &PieceId) -> Option<TurnScope<'w>> {
    let piece = world.pieces.iter_mut().find(|piece| piece.id() == id)?;
    Some(TurnScope {
        piece,
        mailboxes: &mut world.mailboxes,
    })
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use hexbots_core::{BoardView, Piece, PieceId, PieceSnapshot, Team};
    use hexbots_system_mailbox::MailboxDirectory;

    /// Largest distance from the origin that still lies on the board.
    #[must_use]
    pub fn board_radius(world: &World) -> u32 {
        world.radius
    }

    /// Number of rounds completed so far.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.round
    }

    /// Reports whether the match has a result.
    #[must_use]
    pub fn is_concluded(world: &World) -> bool {
        world.concluded
    }

    /// Captures a read-only view of every piece still on the board.
    #[must_use]
    pub fn board_view(world: &World) -> BoardView {
        let snapshots = world
            .pieces
            .iter()
            .filter(|piece| piece.is_alive())
            .map(|piece| PieceSnapshot {
                id: piece.id().clone(),
                team: piece.team().clone(),
                kind: piece.kind(),
                position: piece.position(),
                health: piece.health(),
                active: piece.is_active(),
            })
            .collect();
        BoardView::from_snapshots(world.radius, snapshots)
    }

    /// Every piece ever spawned, destroyed ones included, in spawn order.
    #[must_use]
    pub fn pieces(world: &World) -> &[Piece] {
        &world.pieces
    }

    /// Returns the piece carrying the identifier.
    #[must_use]
    pub fn piece<'w>(world: &'w World, id: &PieceId) -> Option<&'w Piece> {
        world.pieces.iter().find(|piece| piece.id() == id)
    }

    /// Identifiers of pieces that may still act, in turn order.
    #[must_use]
    pub fn turn_order(world: &World) -> Vec<PieceId> {
        world
            .pieces
            .iter()
            .filter(|piece| piece.is_active())
            .map(|piece| piece.id().clone())
            .collect()
    }

    /// Provides read-only access to every mailbox.
    #[must_use]
    pub fn mailboxes(world: &World) -> &MailboxDirectory {
        &world.mailboxes
    }

    /// Teams that still have a piece on the board, sorted by name.
    #[must_use]
    pub fn living_teams(world: &World) -> Vec<Team> {
        let mut teams: Vec<Team> = world
            .pieces
            .iter()
            .filter(|piece| piece.is_alive())
            .map(|piece| piece.team().clone())
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }
}
