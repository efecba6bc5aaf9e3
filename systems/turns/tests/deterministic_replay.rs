use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use hexbots_core::{Event, HexCoord, PieceId, PieceKind, Team};
use hexbots_system_scripting::InterpreterConfig;
use hexbots_system_turns::{MatchSetup, PieceSetup, Turns};
use hexbots_world::{self as world, query, World};

#[test]
fn deterministic_replay_produces_identical_streams() {
    let first = replay(skirmish());
    let second = replay(skirmish());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::ShotResolved { .. })));
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::PieceMoved { .. })));
}

fn replay(setup: MatchSetup) -> ReplayOutcome {
    let mut world = World::new();
    let mut events = Vec::new();
    for command in setup.commands() {
        world::apply(&mut world, command, &mut events);
    }

    let mut turns = Turns::from_setup(&setup);
    let result = turns.play(&mut world, 12, &mut events);

    let pieces = query::pieces(&world)
        .iter()
        .map(|piece| PieceState {
            id: piece.id().clone(),
            position: piece.position().reduced(),
            health: piece.health(),
            alive: piece.is_alive(),
            damage_dealt: piece.damage_dealt(),
            spaces_moved: piece.spaces_moved(),
        })
        .collect();

    ReplayOutcome {
        events,
        pieces,
        rounds_played: result.rounds_played,
        winner: result.winner,
    }
}

fn skirmish() -> MatchSetup {
    let piece = |id: &str, team: &str, kind, position, rotation, script: &str| PieceSetup {
        id: PieceId::new(id).expect("valid id"),
        team: Team::new(team),
        kind,
        position,
        rotation,
        script: script.to_owned(),
    };

    MatchSetup {
        board_radius: 4,
        mailbox_capacity: 4,
        interpreter: InterpreterConfig::default(),
        pieces: vec![
            piece(
                "lookout",
                "red",
                PieceKind::Scout,
                HexCoord::new(-3, 0, 0),
                0,
                ": report 0 look dup 0 > if concat \"gunner\" send drop else drop then ; \
                 \"seen \" report 1 turn",
            ),
            piece(
                "gunner",
                "red",
                PieceKind::Sniper,
                HexCoord::new(-2, 0, 0),
                0,
                "\"lookout\" hasmessage if \"lookout\" receive drop then \
                 0 look dup 0 > if 0 shoot drop else drop 1 0 move drop then",
            ),
            piece(
                "bulwark",
                "blue",
                PieceKind::Tank,
                HexCoord::new(3, 0, 0),
                3,
                "1 0 move drop 1 look 0 > if 1 1 shoot drop then",
            ),
            piece(
                "runner",
                "blue",
                PieceKind::Scout,
                HexCoord::new(2, 0, -2),
                2,
                "0 begin 1 + dup 3 = until drop moves 0 move drop -1 turn",
            ),
        ],
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    events: Vec<Event>,
    pieces: Vec<PieceState>,
    rounds_played: u32,
    winner: Option<Team>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PieceState {
    id: PieceId,
    position: HexCoord,
    health: u32,
    alive: bool,
    damage_dealt: u32,
    spaces_moved: u32,
}
