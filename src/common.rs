//! Common types: coordinates, roles, identifiers and errors.

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

use crate::bitboard::BitBoardError;
use crate::config::BOARD_SIZE;

/// A grid coordinate. Signed so that out-of-range input coming off the wire
/// can be represented and rejected rather than wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether the coordinate lies within `[0, BOARD_SIZE)²`.
    pub fn in_bounds(&self) -> bool {
        let size = BOARD_SIZE as i32;
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }

    pub const fn offset(&self, dx: i32, dy: i32) -> Coord {
        Coord::new(self.x + dx, self.y + dy)
    }

    /// The up to eight in-bounds cells at Chebyshev distance 1.
    pub fn neighbors8(self) -> impl Iterator<Item = Coord> {
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| self.offset(dx, dy))
            .filter(Coord::in_bounds)
    }

    /// Checkerboard colour used by the opponent's search.
    pub fn is_parity_even(&self) -> bool {
        (self.x + self.y).rem_euclid(2) == 0
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum Role {
    Player1,
    Player2,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Player1, Role::Player2];

    /// Position in per-role arrays.
    pub const fn index(self) -> usize {
        match self {
            Role::Player1 => 0,
            Role::Player2 => 1,
        }
    }

    pub const fn opponent(self) -> Role {
        match self {
            Role::Player1 => Role::Player2,
            Role::Player2 => Role::Player1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player1 => f.write_str("player1"),
            Role::Player2 => f.write_str("player2"),
        }
    }
}

/// Prefix of match ids owned by a room.
const ROOM_MATCH_PREFIX: &str = "multi_";

/// Identifier of a match. Standalone matches use eight hex digits, room
/// matches are `multi_<ROOM CODE>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(transparent))]
pub struct MatchId(String);

impl MatchId {
    pub fn standalone(n: u32) -> Self {
        MatchId(format!("{:08x}", n))
    }

    pub fn for_room(code: &str) -> Self {
        MatchId(format!("{}{}", ROOM_MATCH_PREFIX, code))
    }

    /// Room code embedded in a room match id.
    pub fn room_code(&self) -> Option<&str> {
        self.0.strip_prefix(ROOM_MATCH_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        MatchId(s.to_string())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors returned by `Board` operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Underlying bitboard error.
    BitBoard(BitBoardError),
    /// A ship must cover between one and four cells.
    InvalidShipLength { len: usize },
    /// A ship cell lies outside the board.
    OutOfBounds(Coord),
    /// The same cell was listed twice.
    DuplicateCell(Coord),
    /// Cells do not form one straight, gap-free line.
    NotStraight,
    /// Cell already belongs to another ship.
    Occupied(Coord),
    /// Cell touches another ship, diagonals included.
    Adjacent(Coord),
    /// Cell was already hit.
    AlreadyAttacked(Coord),
    /// Random fleet placement gave up after this many restarts.
    PlacementImpossible { restarts: usize },
}

impl From<BitBoardError> for BoardError {
    fn from(err: BitBoardError) -> Self {
        BoardError::BitBoard(err)
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::BitBoard(e) => write!(f, "bitboard error: {}", e),
            BoardError::InvalidShipLength { len } => {
                write!(f, "a ship must cover 1 to 4 cells, got {}", len)
            }
            BoardError::OutOfBounds(c) => write!(f, "ship leaves the board at {}", c),
            BoardError::DuplicateCell(c) => write!(f, "cell {} is listed twice", c),
            BoardError::NotStraight => write!(f, "ship cells must form a straight line"),
            BoardError::Occupied(c) => write!(f, "cell {} is already occupied", c),
            BoardError::Adjacent(c) => write!(f, "ships must not touch (at {})", c),
            BoardError::AlreadyAttacked(c) => write!(f, "cell {} was already attacked", c),
            BoardError::PlacementImpossible { restarts } => {
                write!(f, "could not place the fleet after {} restarts", restarts)
            }
        }
    }
}

/// What kind of entity a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Room,
    Match,
    Participant,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Room => f.write_str("room"),
            EntityKind::Match => f.write_str("match"),
            EntityKind::Participant => f.write_str("participant"),
        }
    }
}

/// Command-level failures. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameError {
    /// Malformed input: bad coordinates, wrong cell-list shape.
    Validation(String),
    /// Unknown room, match or participant.
    NotFound { kind: EntityKind, id: String },
    /// The command is not allowed in the current state.
    IllegalState(String),
}

impl GameError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        GameError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn illegal(msg: impl Into<String>) -> Self {
        GameError::IllegalState(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GameError::NotFound { .. })
    }
}

impl From<BoardError> for GameError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::AlreadyAttacked(_) | BoardError::PlacementImpossible { .. } => {
                GameError::IllegalState(err.to_string())
            }
            _ => GameError::Validation(err.to_string()),
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Validation(msg) => write!(f, "invalid request: {}", msg),
            GameError::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            GameError::IllegalState(msg) => write!(f, "not allowed: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GameError {}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
