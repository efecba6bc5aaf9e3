#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round-robin turn sequencing that runs each piece's script against the world.
//!
//! Pieces act in spawn order. Each turn is bracketed by `BeginTurn` and either
//! `EndTurn` or `AbortTurn`; commands queued by a script are applied only when
//! the script finishes without a fault. Every round closes with
//! `FinishRound`, which commits pending deaths and may conclude the match.

use hexbots_core::{Command, Event, HexCoord, Piece, PieceId, PieceKind, Team};
use hexbots_system_scripting::{Interpreter, InterpreterConfig, TurnContext, TurnOutcome};
use hexbots_world::{self as world, query, World};

/// Placement and behaviour of one piece at the start of a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceSetup {
    /// Identifier of the piece.
    pub id: PieceId,
    /// Team the piece fights for.
    pub team: Team,
    /// Template supplying the piece's stats.
    pub kind: PieceKind,
    /// Hex the piece starts on.
    pub position: HexCoord,
    /// Initial facing in sixths of a turn.
    pub rotation: u8,
    /// Script text run on every one of the piece's turns.
    pub script: String,
}

/// Everything needed to start a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchSetup {
    /// Largest distance from the origin that still lies on the board.
    pub board_radius: u32,
    /// Maximum number of queued messages per mailbox.
    pub mailbox_capacity: usize,
    /// Limits applied to every script.
    pub interpreter: InterpreterConfig,
    /// Pieces in turn order.
    pub pieces: Vec<PieceSetup>,
}

impl MatchSetup {
    /// Commands that configure the board and spawn every piece.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.pieces.len() + 2);
        commands.push(Command::ConfigureBoard {
            radius: self.board_radius,
        });
        commands.push(Command::ConfigureMailboxes {
            capacity: self.mailbox_capacity,
        });
        commands.extend(self.pieces.iter().map(|piece| Command::SpawnPiece {
            id: piece.id.clone(),
            team: piece.team.clone(),
            kind: piece.kind,
            position: piece.position,
            rotation: piece.rotation,
        }));
        commands
    }
}

/// Final state reported once a match stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// Rounds played by this call.
    pub rounds_played: u32,
    /// Whether at most one team was left standing.
    pub concluded: bool,
    /// Last team standing, if exactly one remained.
    pub winner: Option<Team>,
}

#[derive(Debug)]
struct Entrant {
    interpreter: Interpreter,
    script: String,
}

/// Turn sequencing system holding one interpreter per piece.
#[derive(Debug, Default)]
pub struct Turns {
    entrants: Vec<Entrant>,
}

impl Turns {
    /// Creates a turn system with no scripts registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every piece's script from a match setup.
    #[must_use]
    pub fn from_setup(setup: &MatchSetup) -> Self {
        let mut turns = Self::new();
        for piece in &setup.pieces {
            turns.enlist(piece.id.clone(), piece.script.clone(), setup.interpreter);
        }
        turns
    }

    /// Registers the script run on `piece`'s turns, replacing an earlier one.
    pub fn enlist(&mut self, piece: PieceId, script: impl Into<String>, config: InterpreterConfig) {
        let script = script.into();
        if let Some(entrant) = self.entrant_mut(&piece) {
            entrant.script = script;
            return;
        }
        self.entrants.push(Entrant {
            interpreter: Interpreter::new(piece, config),
            script,
        });
    }

    /// Interpreter running the provided piece's script.
    #[must_use]
    pub fn interpreter(&self, piece: &PieceId) -> Option<&Interpreter> {
        self.entrants
            .iter()
            .find(|entrant| entrant.interpreter.owner() == piece)
            .map(|entrant| &entrant.interpreter)
    }

    fn entrant_mut(&mut self, piece: &PieceId) -> Option<&mut Entrant> {
        self.entrants
            .iter_mut()
            .find(|entrant| entrant.interpreter.owner() == piece)
    }

    /// Gives every active piece one turn, then closes the round.
    pub fn play_round(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        for piece in query::turn_order(world) {
            if !query::piece(world, &piece).is_some_and(Piece::is_active) {
                continue;
            }
            self.take_turn(world, piece, out_events);
        }
        world::apply(world, Command::FinishRound, out_events);
        log::debug!("round {} finished", query::round(world));
    }

    /// Plays rounds until the match concludes or `max_rounds` have passed.
    pub fn play(
        &mut self,
        world: &mut World,
        max_rounds: u32,
        out_events: &mut Vec<Event>,
    ) -> MatchResult {
        let mut rounds_played = 0;
        while rounds_played < max_rounds && !query::is_concluded(world) {
            self.play_round(world, out_events);
            rounds_played += 1;
        }

        let concluded = query::is_concluded(world);
        let mut teams = query::living_teams(world);
        let winner = if concluded && teams.len() == 1 {
            teams.pop()
        } else {
            None
        };
        MatchResult {
            rounds_played,
            concluded,
            winner,
        }
    }

    fn take_turn(&mut self, world: &mut World, piece: PieceId, out_events: &mut Vec<Event>) {
        let Some(entrant) = self.entrant_mut(&piece) else {
            log::warn!("{piece} has no script and skips its turn");
            return;
        };

        world::apply(
            world,
            Command::BeginTurn {
                piece: piece.clone(),
            },
            out_events,
        );
        let board = query::board_view(world);
        let Some(scope) = world::turn_scope(world, &piece) else {
            return;
        };

        let mut commands = Vec::new();
        let outcome = entrant.interpreter.run_turn(
            &entrant.script,
            TurnContext {
                piece: scope.piece,
                board: &board,
                mailboxes: scope.mailboxes,
            },
            &mut commands,
        );

        match outcome {
            TurnOutcome::Completed | TurnOutcome::Ended => {
                for command in commands {
                    world::apply(world, command, out_events);
                }
                world::apply(world, Command::EndTurn { piece }, out_events);
            }
            TurnOutcome::Faulted(error) => {
                log::warn!("{piece} faulted: {error}");
                world::apply(
                    world,
                    Command::AbortTurn {
                        piece,
                        reason: error.to_string(),
                    },
                    out_events,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PieceId {
        PieceId::new(name).expect("valid id")
    }

    fn setup(pieces: Vec<PieceSetup>) -> MatchSetup {
        MatchSetup {
            board_radius: 4,
            mailbox_capacity: 2,
            interpreter: InterpreterConfig::default(),
            pieces,
        }
    }

    fn piece(name: &str, team: &str, position: HexCoord, script: &str) -> PieceSetup {
        PieceSetup {
            id: id(name),
            team: Team::new(team),
            kind: PieceKind::Scout,
            position,
            rotation: 0,
            script: script.to_owned(),
        }
    }

    #[test]
    fn setup_configures_before_spawning() {
        let setup = setup(vec![piece("alpha", "red", HexCoord::ORIGIN, "")]);
        let commands = setup.commands();
        assert_eq!(commands[0], Command::ConfigureBoard { radius: 4 });
        assert_eq!(commands[1], Command::ConfigureMailboxes { capacity: 2 });
        assert!(matches!(commands[2], Command::SpawnPiece { .. }));
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn enlisting_twice_replaces_the_script() {
        let mut turns = Turns::new();
        turns.enlist(id("alpha"), "1", InterpreterConfig::default());
        turns.enlist(id("alpha"), "2", InterpreterConfig::default());
        assert_eq!(turns.entrants.len(), 1);
        assert_eq!(turns.entrants[0].script, "2");
    }

    #[test]
    fn pieces_without_scripts_skip_their_turn() {
        let setup = setup(vec![piece("alpha", "red", HexCoord::ORIGIN, "")]);
        let mut world = World::new();
        let mut events = Vec::new();
        for command in setup.commands() {
            world::apply(&mut world, command, &mut events);
        }

        let mut turns = Turns::new();
        events.clear();
        turns.play_round(&mut world, &mut events);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::TurnStarted { .. })));
        assert!(events.contains(&Event::RoundFinished { round: 1 }));
    }
}
