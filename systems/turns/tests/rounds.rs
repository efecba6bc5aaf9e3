use hexbots_core::{Event, HexCoord, PieceId, PieceKind, Team};
use hexbots_system_mailbox::MailboxLookup;
use hexbots_system_scripting::InterpreterConfig;
use hexbots_system_turns::{MatchSetup, PieceSetup, Turns};
use hexbots_world::{self as world, query, World};

fn id(name: &str) -> PieceId {
    PieceId::new(name).expect("valid id")
}

fn piece(name: &str, team: &str, kind: PieceKind, position: HexCoord, script: &str) -> PieceSetup {
    PieceSetup {
        id: id(name),
        team: Team::new(team),
        kind,
        position,
        rotation: 0,
        script: script.to_owned(),
    }
}

fn start(pieces: Vec<PieceSetup>) -> (World, Turns) {
    let setup = MatchSetup {
        board_radius: 4,
        mailbox_capacity: 2,
        interpreter: InterpreterConfig::default(),
        pieces,
    };
    let mut world = World::new();
    let mut events = Vec::new();
    for command in setup.commands() {
        world::apply(&mut world, command, &mut events);
    }
    (world, Turns::from_setup(&setup))
}

#[test]
fn sniper_wins_a_duel() {
    let (mut world, mut turns) = start(vec![
        piece(
            "hunter",
            "red",
            PieceKind::Sniper,
            HexCoord::new(-2, 0, 0),
            "0 look 0 shoot drop",
        ),
        piece("target", "blue", PieceKind::Tank, HexCoord::new(2, 0, 0), ""),
    ]);
    let mut events = Vec::new();

    let result = turns.play(&mut world, 10, &mut events);

    assert_eq!(result.rounds_played, 2);
    assert!(result.concluded);
    assert_eq!(result.winner, Some(Team::new("red")));
    assert!(events.contains(&Event::PieceDowned {
        piece: id("target"),
        by: id("hunter"),
    }));
    assert!(events.contains(&Event::PieceDestroyed {
        piece: id("target"),
    }));

    let hunter = query::piece(&world, &id("hunter")).expect("hunter");
    assert_eq!(hunter.damage_dealt(), PieceKind::Tank.stats().health);
    assert_eq!(hunter.enemies_defeated(), 1);
}

#[test]
fn downed_pieces_lose_their_turn() {
    let (mut world, mut turns) = start(vec![
        piece(
            "hunter",
            "red",
            PieceKind::Sniper,
            HexCoord::new(-2, 0, 0),
            "0 look 0 shoot drop",
        ),
        piece(
            "victim",
            "blue",
            PieceKind::Scout,
            HexCoord::new(1, 0, 0),
            "1 0 move drop",
        ),
    ]);
    let mut events = Vec::new();

    turns.play_round(&mut world, &mut events);

    assert!(!events.iter().any(|event| matches!(
        event,
        Event::TurnStarted { piece, .. } if piece == &id("victim")
    )));
    let victim = query::piece(&world, &id("victim")).expect("victim");
    assert!(!victim.is_alive());
    assert!(victim.position().same_hex(&HexCoord::new(1, 0, 0)));
}

#[test]
fn faulted_turn_is_a_no_op() {
    let (mut world, mut turns) = start(vec![
        piece(
            "alpha",
            "red",
            PieceKind::Scout,
            HexCoord::ORIGIN,
            "2 0 move drop \"hi\" \"beta\" send drop nonsense",
        ),
        piece("beta", "blue", PieceKind::Scout, HexCoord::new(0, 0, 3), ""),
    ]);
    let before = query::piece(&world, &id("alpha")).cloned().expect("alpha");
    let mut events = Vec::new();

    turns.play_round(&mut world, &mut events);

    let after = query::piece(&world, &id("alpha")).expect("alpha");
    assert_eq!(after.position(), before.position());
    assert_eq!(after.spaces_moved(), 0);
    assert_eq!(after.movement(), PieceKind::Scout.stats().movement);
    assert!(query::mailboxes(&world)
        .mailbox("beta")
        .expect("mailbox")
        .is_empty());

    assert!(events.contains(&Event::TurnFaulted {
        piece: id("alpha"),
        reason: "unknown word `nonsense`".to_owned(),
    }));
    assert!(!events.contains(&Event::TurnEnded { piece: id("alpha") }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::PieceMoved { .. })));
}

#[test]
fn messages_are_visible_to_later_turns_in_the_round() {
    let (mut world, mut turns) = start(vec![
        piece(
            "alpha",
            "red",
            PieceKind::Scout,
            HexCoord::ORIGIN,
            "\"go\" \"beta\" send drop",
        ),
        piece(
            "beta",
            "red",
            PieceKind::Scout,
            HexCoord::new(0, 0, 2),
            "\"alpha\" receive \"go\" = if 1 0 move drop then",
        ),
    ]);
    let mut events = Vec::new();

    turns.play_round(&mut world, &mut events);

    assert!(events.contains(&Event::PieceMoved {
        piece: id("beta"),
        from: HexCoord::new(0, 0, 2),
        to: HexCoord::new(1, 0, 2),
        spaces: 1,
    }));
    assert!(query::mailboxes(&world)
        .mailbox("beta")
        .expect("mailbox")
        .is_empty());
}

#[test]
fn full_mailboxes_refuse_further_messages() {
    let (mut world, mut turns) = start(vec![
        piece(
            "alpha",
            "red",
            PieceKind::Scout,
            HexCoord::ORIGIN,
            "1 \"beta\" send 2 \"beta\" send 3 \"beta\" send",
        ),
        piece("beta", "red", PieceKind::Scout, HexCoord::new(0, 0, 2), ""),
    ]);
    let mut events = Vec::new();

    turns.play_round(&mut world, &mut events);

    let alpha = turns.interpreter(&id("alpha")).expect("interpreter");
    assert_eq!(
        alpha.stack(),
        &[
            hexbots_system_scripting::Value::Int(1),
            hexbots_system_scripting::Value::Int(1),
            hexbots_system_scripting::Value::Int(0),
        ]
    );
    let beta = query::mailboxes(&world).mailbox("beta").expect("mailbox");
    let payloads: Vec<&str> = beta.iter().map(|message| message.payload()).collect();
    assert_eq!(payloads, vec!["1", "2"]);
}

#[test]
fn max_rounds_bounds_an_undecided_match() {
    let (mut world, mut turns) = start(vec![
        piece("alpha", "red", PieceKind::Scout, HexCoord::ORIGIN, "1 turn"),
        piece("beta", "blue", PieceKind::Scout, HexCoord::new(0, 0, 3), ""),
    ]);
    let mut events = Vec::new();

    let result = turns.play(&mut world, 3, &mut events);

    assert_eq!(result.rounds_played, 3);
    assert!(!result.concluded);
    assert_eq!(result.winner, None);
    assert_eq!(query::round(&world), 3);
    let alpha = query::piece(&world, &id("alpha")).expect("alpha");
    assert_eq!(alpha.rotation(), 3);
    assert_eq!(alpha.turns_taken(), 3);
}
