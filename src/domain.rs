//! Read-only snapshots handed to participants.

use alloc::string::String;
use alloc::vec::Vec;

use crate::board::{Cell, Shot};
use crate::common::{Coord, MatchId, Role};

/// Lifecycle of a match. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum MatchStatus {
    Placement,
    Active,
    Finished,
}

/// The most recent shot fired in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LastMove {
    pub role: Role,
    pub target: Coord,
    pub hit: bool,
}

/// One shot fired by the agent during its volley.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentShot {
    pub target: Coord,
    pub shot: Shot,
}

/// Result of `attack`: the attacker's shot plus whatever the agent fired back.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackSummary {
    pub attacker: Role,
    pub target: Coord,
    pub shot: Shot,
    /// Whose turn it is after the call; `None` once the match is over.
    pub next_turn: Option<Role>,
    pub winner: Option<Role>,
    pub agent_shots: Vec<AgentShot>,
}

/// What one participant may see of a match. The opponent's intact ship cells
/// are never included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchView {
    pub match_id: MatchId,
    pub role: Role,
    pub status: MatchStatus,
    pub current_turn: Role,
    pub winner: Option<Role>,
    /// Own board, row-major, ships included.
    pub own_grid: Vec<Cell>,
    /// Opponent board, row-major, hits and misses only.
    pub opponent_grid: Vec<Cell>,
    pub opponent_sunk_ships: Vec<Vec<Coord>>,
    pub own_ship_count: usize,
    pub own_ships_remaining: usize,
    pub opponent_ships_remaining: usize,
    pub ready: Vec<Role>,
    pub last_move: Option<LastMove>,
    /// `None` while the opponent seat is still open.
    pub opponent: Option<String>,
}

impl MatchView {
    pub fn is_my_turn(&self) -> bool {
        self.status == MatchStatus::Active && self.current_turn == self.role
    }
}
