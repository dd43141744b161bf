//! Wire messages between a client and the game server.
#![cfg(feature = "std")]

use crate::common::{Coord, GameError, MatchId, Role};
use crate::domain::{AttackSummary, MatchStatus, MatchView};
use crate::events::RoomEvent;
use crate::player::ParticipantId;
use crate::room::{LeaveOutcome, RoomCode, RoomView};
use crate::service::ServiceStats;

/// Protocol version; bump when message layout changes.
pub const PROTOCOL_VERSION: u8 = 1;

/// Client to server. The first frame on a connection must be `Hello`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Request {
    Hello { version: u8 },
    CreateMatch { participant: ParticipantId, vs_agent: bool },
    JoinMatch { match_id: MatchId, participant: ParticipantId },
    CreateRoom { participant: ParticipantId },
    JoinRoom { code: RoomCode, participant: ParticipantId },
    LeaveRoom { code: RoomCode, participant: ParticipantId },
    SetRoomReady { code: RoomCode, participant: ParticipantId },
    ClearRoomReady { code: RoomCode, participant: ParticipantId },
    SetMatchReady { match_id: MatchId, participant: ParticipantId },
    PlaceShip { match_id: MatchId, participant: ParticipantId, cells: Vec<Coord> },
    AutoPlace { match_id: MatchId, participant: ParticipantId },
    Attack { match_id: MatchId, participant: ParticipantId, x: i32, y: i32 },
    Surrender { match_id: MatchId, participant: ParticipantId },
    GetState { match_id: MatchId, participant: ParticipantId },
    RoomState { code: RoomCode },
    Stats,
}

/// Server to client: exactly one reply per request, plus `Event` frames
/// pushed at any time for rooms the connection has entered.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Reply {
    Hello { version: u8 },
    MatchCreated(MatchId),
    Joined(Role),
    RoomCreated(RoomCode),
    Room(RoomView),
    Left(LeaveOutcome),
    Status(MatchStatus),
    ShipCount(usize),
    Placed(Vec<Coord>),
    Attack(AttackSummary),
    Winner(Role),
    State(MatchView),
    Stats(ServiceStats),
    Event(RoomEvent),
    Error(GameError),
}
