//! Plain-text summary printed once a match stops.

use std::fmt::Write as _;

use hexbots_core::{Piece, PieceKind};
use hexbots_system_turns::MatchResult;
use hexbots_world::{query, World};

/// Renders the outcome and a per-piece stats table.
pub(crate) fn summary(world: &World, result: &MatchResult) -> String {
    let mut out = String::new();
    let outcome = match (&result.winner, result.concluded) {
        (Some(team), _) => format!("{team} wins"),
        (None, true) => "no team survived".to_owned(),
        (None, false) => "undecided".to_owned(),
    };
    let _ = writeln!(
        out,
        "{outcome} after {} rounds played",
        result.rounds_played
    );
    let _ = writeln!(
        out,
        "{:<12} {:<8} {:<7} {:<9} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "piece", "team", "kind", "status", "health", "dealt", "taken", "moved", "downed", "turns"
    );
    for piece in query::pieces(world) {
        let _ = writeln!(
            out,
            "{:<12} {:<8} {:<7} {:<9} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            piece.id().as_str(),
            piece.team().name(),
            kind_name(piece.kind()),
            status(piece),
            piece.health(),
            piece.damage_dealt(),
            piece.damage_taken(),
            piece.spaces_moved(),
            piece.enemies_defeated(),
            piece.turns_taken(),
        );
    }
    out
}

fn kind_name(kind: PieceKind) -> &'static str {
    match kind {
        PieceKind::Scout => "scout",
        PieceKind::Sniper => "sniper",
        PieceKind::Tank => "tank",
    }
}

fn status(piece: &Piece) -> &'static str {
    if !piece.is_alive() {
        "destroyed"
    } else if piece.death_flag() {
        "downed"
    } else {
        "standing"
    }
}
