//! Pieces controlled by scripts and the templates they are built from.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{HexCoord, HexDirection, MESSAGE_SEPARATOR};

/// Name that identifies a piece for messaging and bookkeeping.
///
/// Identifiers never contain whitespace or the message separator, so they can
/// be written as script tokens and embedded in mailbox messages unescaped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PieceId(String);

impl PieceId {
    /// Validates and wraps the provided name.
    pub fn new(name: impl Into<String>) -> Result<Self, PieceIdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PieceIdError::Empty);
        }
        if name.contains(MESSAGE_SEPARATOR) {
            return Err(PieceIdError::ContainsSeparator(name));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(PieceIdError::ContainsWhitespace(name));
        }
        Ok(Self(name))
    }

    /// Borrowed view of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PieceId {
    type Error = PieceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PieceId> for String {
    fn from(value: PieceId) -> Self {
        value.0
    }
}

/// Reasons a piece identifier may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PieceIdError {
    /// The identifier was empty.
    #[error("piece identifier must not be empty")]
    Empty,
    /// The identifier contained the message separator.
    #[error("piece identifier `{0}` contains the reserved `@` separator")]
    ContainsSeparator(String),
    /// The identifier contained whitespace.
    #[error("piece identifier `{0}` contains whitespace")]
    ContainsWhitespace(String),
}

/// Side a piece fights for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(String);

impl Team {
    /// Creates a team with the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the team.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Templates a piece can be built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    /// Fast, fragile piece with a short reach.
    Scout,
    /// Slow piece that hits hard from far away.
    Sniper,
    /// Sturdy close-range piece.
    Tank,
}

impl PieceKind {
    /// Static stats shared by every piece of this kind.
    #[must_use]
    pub const fn stats(self) -> PieceStats {
        match self {
            Self::Scout => PieceStats::new(1, 2, 3, 2),
            Self::Sniper => PieceStats::new(3, 2, 1, 4),
            Self::Tank => PieceStats::new(2, 4, 1, 1),
        }
    }
}

/// Static stats fixed by a piece's kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceStats {
    /// Damage dealt by a single shot.
    pub attack: u32,
    /// Health the piece starts the match with.
    pub health: u32,
    /// Spaces the piece may move per turn.
    pub movement: u32,
    /// Furthest distance a shot may travel.
    pub range: u32,
}

impl PieceStats {
    /// Creates a stat block.
    #[must_use]
    pub const fn new(attack: u32, health: u32, movement: u32, range: u32) -> Self {
        Self {
            attack,
            health,
            movement,
            range,
        }
    }
}

/// Reasons a move request may be refused by a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The piece has been destroyed or is awaiting death processing.
    #[error("piece is not active")]
    Inactive,
    /// The piece already finished its turn.
    #[error("piece already finished its turn")]
    TurnFinished,
    /// The piece lacks the movement points to cover the distance.
    #[error("requested {requested} spaces with only {available} movement left")]
    InsufficientMovement {
        /// Spaces requested by the caller.
        requested: u32,
        /// Movement points left this turn.
        available: u32,
    },
}

/// Reasons a shot may be refused by a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ShootError {
    /// The piece has been destroyed or is awaiting death processing.
    #[error("piece is not active")]
    Inactive,
    /// The piece already finished its turn.
    #[error("piece already finished its turn")]
    TurnFinished,
    /// The piece already fired this turn.
    #[error("piece already fired this turn")]
    AlreadyShot,
}

/// Outcome of applying damage to a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Health actually removed from the piece.
    pub applied: u32,
    /// Whether this hit raised the piece's death flag.
    pub downed: bool,
}

/// Mutable per-match state of a single piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    id: PieceId,
    team: Team,
    kind: PieceKind,
    stats: PieceStats,
    position: HexCoord,
    rotation: u8,
    health: u32,
    movement: u32,
    alive: bool,
    death_flag: bool,
    has_shot: bool,
    turn_finished: bool,
    damage_dealt: u32,
    damage_taken: u32,
    spaces_moved: u32,
    enemies_defeated: u32,
    turns_taken: u32,
}

impl Piece {
    /// Builds a fresh piece from its kind template.
    #[must_use]
    pub fn new(id: PieceId, team: Team, kind: PieceKind, position: HexCoord, rotation: u8) -> Self {
        let stats = kind.stats();
        Self {
            id,
            team,
            kind,
            stats,
            position,
            rotation: rotation % 6,
            health: stats.health,
            movement: stats.movement,
            alive: true,
            death_flag: false,
            has_shot: false,
            turn_finished: false,
            damage_dealt: 0,
            damage_taken: 0,
            spaces_moved: 0,
            enemies_defeated: 0,
            turns_taken: 0,
        }
    }

    /// Identifier of the piece.
    #[must_use]
    pub fn id(&self) -> &PieceId {
        &self.id
    }

    /// Team the piece belongs to.
    #[must_use]
    pub fn team(&self) -> &Team {
        &self.team
    }

    /// Template the piece was built from.
    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Static stats of the piece.
    #[must_use]
    pub const fn stats(&self) -> PieceStats {
        self.stats
    }

    /// Hex currently occupied by the piece.
    #[must_use]
    pub const fn position(&self) -> HexCoord {
        self.position
    }

    /// Facing in sixths of a turn, always within `0..=5`.
    #[must_use]
    pub const fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Absolute direction obtained by turning `relative` steps from the facing.
    #[must_use]
    pub fn heading(&self, relative: i64) -> HexDirection {
        HexDirection::from_index(i64::from(self.rotation) + relative.rem_euclid(6))
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Movement points left this turn.
    #[must_use]
    pub const fn movement(&self) -> u32 {
        self.movement
    }

    /// Whether death processing has not yet removed the piece.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the piece was downed and awaits death processing.
    #[must_use]
    pub const fn death_flag(&self) -> bool {
        self.death_flag
    }

    /// Whether the piece may still act.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.alive && !self.death_flag
    }

    /// Whether the piece fired during the current turn.
    #[must_use]
    pub const fn has_shot(&self) -> bool {
        self.has_shot
    }

    /// Whether the piece finished the current turn.
    #[must_use]
    pub const fn turn_finished(&self) -> bool {
        self.turn_finished
    }

    /// Damage this piece dealt over the match.
    #[must_use]
    pub const fn damage_dealt(&self) -> u32 {
        self.damage_dealt
    }

    /// Damage this piece received over the match.
    #[must_use]
    pub const fn damage_taken(&self) -> u32 {
        self.damage_taken
    }

    /// Spaces this piece moved over the match.
    #[must_use]
    pub const fn spaces_moved(&self) -> u32 {
        self.spaces_moved
    }

    /// Enemy pieces downed by this piece.
    #[must_use]
    pub const fn enemies_defeated(&self) -> u32 {
        self.enemies_defeated
    }

    /// Turns this piece has started.
    #[must_use]
    pub const fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    /// Resets the per-turn state ahead of a new turn.
    pub fn begin_turn(&mut self) {
        self.movement = self.stats.movement;
        self.has_shot = false;
        self.turn_finished = false;
        self.turns_taken = self.turns_taken.saturating_add(1);
    }

    /// Marks the current turn as finished.
    pub fn finish_turn(&mut self) {
        self.turn_finished = true;
    }

    /// Spends movement and relocates the piece `spaces` hexes along `direction`.
    ///
    /// Callers validate the path against the board before asking the piece to
    /// move; the piece only guards its own movement budget.
    pub fn update_move(&mut self, spaces: u32, direction: HexDirection) -> Result<(), MoveError> {
        self.ensure_can_act()?;
        if spaces > self.movement {
            return Err(MoveError::InsufficientMovement {
                requested: spaces,
                available: self.movement,
            });
        }

        let steps = i32::try_from(spaces).unwrap_or(i32::MAX);
        self.position = self.position.offset(direction, steps);
        self.movement -= spaces;
        self.spaces_moved = self.spaces_moved.saturating_add(spaces);
        Ok(())
    }

    /// Spends the turn's shot and returns the damage it carries.
    pub fn update_shoot(&mut self) -> Result<u32, ShootError> {
        self.ensure_can_act()?;
        if self.has_shot {
            return Err(ShootError::AlreadyShot);
        }
        self.has_shot = true;
        Ok(self.stats.attack)
    }

    /// Turns the facing by `steps` sixths of a full circle.
    pub fn rotate(&mut self, steps: i64) {
        self.rotation = self.heading(steps).index();
    }

    /// Removes health, raising the death flag once health reaches zero.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_active() {
            return DamageOutcome {
                applied: 0,
                downed: false,
            };
        }
        let applied = amount.min(self.health);
        self.health -= applied;
        self.damage_taken = self.damage_taken.saturating_add(applied);
        let downed = self.health == 0;
        if downed {
            self.death_flag = true;
        }
        DamageOutcome { applied, downed }
    }

    /// Credits damage this piece inflicted on another.
    pub fn record_hit(&mut self, damage: u32, defeated_enemy: bool) {
        self.damage_dealt = self.damage_dealt.saturating_add(damage);
        if defeated_enemy {
            self.enemies_defeated = self.enemies_defeated.saturating_add(1);
        }
    }

    /// Commits a pending death, returning whether the piece was removed.
    pub fn process_death_flag(&mut self) -> bool {
        if self.death_flag && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    fn ensure_can_act(&self) -> Result<(), Blocked> {
        if !self.is_active() {
            return Err(Blocked::Inactive);
        }
        if self.turn_finished {
            return Err(Blocked::TurnFinished);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum Blocked {
    Inactive,
    TurnFinished,
}

impl From<Blocked> for MoveError {
    fn from(value: Blocked) -> Self {
        match value {
            Blocked::Inactive => Self::Inactive,
            Blocked::TurnFinished => Self::TurnFinished,
        }
    }
}

impl From<Blocked> for ShootError {
    fn from(value: Blocked) -> Self {
        match value {
            Blocked::Inactive => Self::Inactive,
            Blocked::TurnFinished => Self::TurnFinished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scout() -> Piece {
        Piece::new(
            PieceId::new("scout-1").expect("valid id"),
            Team::new("red"),
            PieceKind::Scout,
            HexCoord::ORIGIN,
            0,
        )
    }

    #[test]
    fn identifiers_reject_reserved_characters() {
        assert_eq!(PieceId::new(""), Err(PieceIdError::Empty));
        assert!(matches!(
            PieceId::new("bad@id"),
            Err(PieceIdError::ContainsSeparator(_))
        ));
        assert!(matches!(
            PieceId::new("two words"),
            Err(PieceIdError::ContainsWhitespace(_))
        ));
        assert!(PieceId::new("Superman").expect("valid").matches("superMAN"));
    }

    #[test]
    fn headings_wrap_for_any_relative_turn() {
        let mut piece = scout();
        piece.rotate(5);
        assert_eq!(piece.heading(i64::MAX), HexDirection::PositiveX);
        assert_eq!(piece.heading(i64::MIN), HexDirection::NegativeX);
        piece.rotate(i64::MAX);
        assert_eq!(piece.rotation(), 0);
        assert_eq!(HexDirection::NegativeZ.rotated(i64::MAX), HexDirection::PositiveX);
    }

    #[test]
    fn movement_is_bounded_per_turn() {
        let mut piece = scout();
        piece.begin_turn();

        piece
            .update_move(2, HexDirection::PositiveX)
            .expect("first move fits");
        assert_eq!(piece.position(), HexCoord::new(2, 0, 0));
        assert_eq!(piece.movement(), 1);
        assert_eq!(
            piece.update_move(2, HexDirection::PositiveX),
            Err(MoveError::InsufficientMovement {
                requested: 2,
                available: 1,
            })
        );

        piece.begin_turn();
        assert_eq!(piece.movement(), 3);
        assert_eq!(piece.spaces_moved(), 2);
        assert_eq!(piece.turns_taken(), 2);
    }

    #[test]
    fn one_shot_per_turn() {
        let mut piece = scout();
        piece.begin_turn();
        assert_eq!(piece.update_shoot(), Ok(1));
        assert_eq!(piece.update_shoot(), Err(ShootError::AlreadyShot));
        piece.begin_turn();
        assert!(!piece.has_shot());
    }

    #[test]
    fn finished_turns_refuse_actions() {
        let mut piece = scout();
        piece.begin_turn();
        piece.finish_turn();
        assert_eq!(piece.update_shoot(), Err(ShootError::TurnFinished));
        assert_eq!(
            piece.update_move(1, HexDirection::PositiveX),
            Err(MoveError::TurnFinished)
        );
    }

    #[test]
    fn death_is_deferred_until_processed() {
        let mut piece = scout();
        let first = piece.take_damage(5);
        assert_eq!(
            first,
            DamageOutcome {
                applied: 2,
                downed: true,
            }
        );
        assert!(piece.death_flag());
        assert!(piece.is_alive());
        assert!(!piece.is_active());
        assert_eq!(piece.take_damage(1).applied, 0);

        assert!(piece.process_death_flag());
        assert!(!piece.is_alive());
        assert!(!piece.process_death_flag());
    }

    #[test]
    fn rotation_wraps_within_six_steps() {
        let mut piece = scout();
        piece.rotate(7);
        assert_eq!(piece.rotation(), 1);
        piece.rotate(-2);
        assert_eq!(piece.rotation(), 5);
        assert_eq!(piece.heading(1), HexDirection::PositiveX);
    }
}
