//! Lobby wrapper around a match: two slots, ready flags and activity tracking.
#![cfg(feature = "std")]

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::common::{EntityKind, GameError, MatchId, Role};
use crate::config::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use crate::domain::MatchStatus;
use crate::game::Match;
use crate::player::ParticipantId;

/// Six characters from `A-Z0-9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        RoomCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = GameError;

    /// Accepts lower case input and normalizes it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LEN || !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
            return Err(GameError::Validation(format!("malformed room code {:?}", s)));
        }
        Ok(RoomCode(code))
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Placement,
    Active,
    Finished,
}

impl From<MatchStatus> for RoomStatus {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Placement => RoomStatus::Placement,
            MatchStatus::Active => RoomStatus::Active,
            MatchStatus::Finished => RoomStatus::Finished,
        }
    }
}

/// What a ready call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Lobby flag set; still waiting for the other slot.
    Waiting,
    /// Both slots were ready, so the room created its match.
    MatchCreated(MatchId),
    /// Forwarded to the existing match, which is now in this status.
    Match(MatchStatus),
}

/// Whether the registry should drop the room after a leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LeaveOutcome {
    Retained,
    Deleted,
}

/// Snapshot of a room for its participants.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoomView {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub players: [Option<ParticipantId>; 2],
    pub ready: [bool; 2],
    pub match_id: Option<MatchId>,
}

#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    slots: [Option<ParticipantId>; 2],
    ready: [bool; 2],
    game: Option<Match>,
    last_activity: Instant,
    /// Set once the registry has dropped the room. Handles cloned before
    /// that point must not keep using it.
    closed: bool,
}

impl Room {
    pub fn new(code: RoomCode, creator: ParticipantId) -> Self {
        let now = Instant::now();
        Room {
            code,
            slots: [Some(creator), None],
            ready: [false; 2],
            game: None,
            last_activity: now,
            closed: false,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn status(&self) -> RoomStatus {
        self.game
            .as_ref()
            .map_or(RoomStatus::Waiting, |g| g.status().into())
    }

    pub fn game(&self) -> Option<&Match> {
        self.game.as_ref()
    }

    /// `None` once the room is closed.
    pub fn game_mut(&mut self) -> Option<&mut Match> {
        if self.closed {
            return None;
        }
        self.game.as_mut()
    }

    pub fn participant(&self, role: Role) -> Option<&ParticipantId> {
        self.slots[role.index()].as_ref()
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.slots.iter().flatten()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_ready(&self, role: Role) -> bool {
        self.ready[role.index()]
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Slot held by `id`.
    pub fn slot_of(&self, id: &ParticipantId) -> Result<Role, GameError> {
        Role::ALL
            .into_iter()
            .find(|r| self.participant(*r) == Some(id))
            .ok_or_else(|| GameError::not_found(EntityKind::Participant, id))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Marks the room as torn down. Every later mutation reports the room
    /// as not found.
    pub fn close(&mut self) {
        self.closed = true;
        self.game = None;
        self.ready = [false; 2];
    }

    fn ensure_open(&self) -> Result<(), GameError> {
        if self.closed {
            return Err(GameError::not_found(EntityKind::Room, &self.code));
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Idle for longer than `timeout` as of `now`.
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }

    pub fn join(&mut self, id: ParticipantId) -> Result<Role, GameError> {
        self.ensure_open()?;
        if self.game.is_some() {
            return Err(GameError::illegal("room has already started"));
        }
        if self.participants().any(|p| *p == id) {
            return Err(GameError::illegal("already in this room"));
        }
        let role = Role::ALL
            .into_iter()
            .find(|r| self.slots[r.index()].is_none())
            .ok_or_else(|| GameError::illegal("room is full"))?;
        self.slots[role.index()] = Some(id);
        self.touch();
        Ok(role)
    }

    /// Flags `id` ready. Before a match exists this is the lobby flag and
    /// creates the match once both slots are filled and flagged; afterwards
    /// it is the match's own ready step.
    pub fn set_ready(&mut self, id: &ParticipantId) -> Result<ReadyOutcome, GameError> {
        self.ensure_open()?;
        let role = self.slot_of(id)?;
        self.touch();
        if let Some(game) = self.game.as_mut() {
            return game.set_ready(role).map(ReadyOutcome::Match);
        }
        self.ready[role.index()] = true;
        match (&self.slots, self.ready) {
            ([Some(p1), Some(p2)], [true, true]) => {
                let match_id = MatchId::for_room(self.code.as_str());
                let seed = rand::rng().random();
                self.game = Some(Match::between(match_id.clone(), p1.clone(), p2.clone(), seed));
                log::info!("room {} created match {}", self.code, match_id);
                Ok(ReadyOutcome::MatchCreated(match_id))
            }
            _ => Ok(ReadyOutcome::Waiting),
        }
    }

    /// Withdraws the lobby flag of `id`. Only possible before the match exists.
    pub fn clear_ready(&mut self, id: &ParticipantId) -> Result<(), GameError> {
        self.ensure_open()?;
        let role = self.slot_of(id)?;
        if self.game.is_some() {
            return Err(GameError::illegal("readiness is locked once the match exists"));
        }
        self.ready[role.index()] = false;
        self.touch();
        Ok(())
    }

    /// Removes `id` from the room.
    ///
    /// The creator leaving a waiting room, anyone leaving during placement
    /// or battle, or the last occupant leaving tears the room down and closes
    /// it. Otherwise only the slot is freed.
    pub fn leave(&mut self, id: &ParticipantId) -> Result<LeaveOutcome, GameError> {
        self.ensure_open()?;
        let role = self.slot_of(id)?;
        let status = self.status();
        self.slots[role.index()] = None;
        self.ready[role.index()] = false;
        self.touch();

        let outcome = match (status, role) {
            (RoomStatus::Waiting, Role::Player1) | (RoomStatus::Placement | RoomStatus::Active, _) => {
                self.close();
                LeaveOutcome::Deleted
            }
            _ if self.is_empty() => {
                self.close();
                LeaveOutcome::Deleted
            }
            _ => LeaveOutcome::Retained,
        };
        log::info!("{} left room {} ({:?})", id, self.code, outcome);
        Ok(outcome)
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            code: self.code.clone(),
            status: self.status(),
            players: self.slots.clone(),
            ready: self.ready,
            match_id: self.game.as_ref().map(|g| g.id().clone()),
        }
    }
}
