//! Room events and the sinks they are published through.
#![cfg(feature = "std")]

use tokio::sync::broadcast;

use crate::common::{MatchId, Role};
use crate::domain::AttackSummary;
use crate::player::ParticipantId;
use crate::room::RoomCode;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FinishReason {
    AllShipsSunk,
    Surrender,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Event {
    PlayerJoined {
        participant: ParticipantId,
        role: Role,
    },
    ReadyChanged {
        participant: ParticipantId,
        ready: bool,
    },
    PlacementStarted {
        match_id: MatchId,
    },
    /// One side locked its fleet.
    PlacementComplete {
        role: Role,
    },
    BattleStarted {
        match_id: MatchId,
        first_turn: Role,
    },
    MoveResult(AttackSummary),
    GameFinished {
        winner: Role,
        reason: FinishReason,
    },
    PlayerLeft {
        participant: ParticipantId,
        room_deleted: bool,
    },
    /// The room was evicted for inactivity.
    RoomClosed,
}

impl Event {
    /// Last event a room will ever publish.
    pub fn ends_room(&self) -> bool {
        matches!(
            self,
            Event::RoomClosed
                | Event::PlayerLeft {
                    room_deleted: true,
                    ..
                }
        )
    }
}

/// An event tagged with the room it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoomEvent {
    pub room: RoomCode,
    pub event: Event,
}

/// Receives every room event the service produces.
pub trait EventSink: Send + Sync {
    fn publish(&self, room: &RoomCode, event: Event);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _room: &RoomCode, _event: Event) {}
}

/// Fans events out to any number of subscribers over a tokio broadcast
/// channel. Publishing never blocks; slow subscribers lag.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<RoomEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        BroadcastSink { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, room: &RoomCode, event: Event) {
        log::debug!("room {}: {:?}", room, event);
        // No subscribers is fine.
        let _ = self.tx.send(RoomEvent {
            room: room.clone(),
            event,
        });
    }
}
