//! Client proxy for the game server.
#![cfg(feature = "std")]

use std::collections::VecDeque;

use tokio::net::ToSocketAddrs;

use crate::common::{Coord, MatchId, Role};
use crate::domain::{AttackSummary, MatchStatus, MatchView};
use crate::events::RoomEvent;
use crate::player::ParticipantId;
use crate::protocol::{Reply, Request, PROTOCOL_VERSION};
use crate::room::{LeaveOutcome, RoomCode, RoomView};
use crate::service::ServiceStats;
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;

/// Converts a reply into the expected variant. A `Reply::Error` comes back as
/// the `GameError` itself so callers can downcast it.
macro_rules! expect_reply {
    ($reply:expr, $variant:ident) => {
        match $reply {
            Reply::$variant(value) => Ok(value),
            Reply::Error(e) => Err(anyhow::Error::new(e)),
            other => Err(anyhow::anyhow!(
                "unexpected reply, wanted {}: {:?}",
                stringify!($variant),
                other
            )),
        }
    };
}

pub struct GameClient {
    transport: TcpTransport<Request, Reply>,
    events: VecDeque<RoomEvent>,
}

impl GameClient {
    /// Connects and performs the version handshake.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let mut transport: TcpTransport<Request, Reply> = TcpTransport::connect(addr).await?;
        transport
            .send(Request::Hello {
                version: PROTOCOL_VERSION,
            })
            .await?;
        match transport.recv().await? {
            Reply::Hello { version } if version == PROTOCOL_VERSION => {}
            Reply::Hello { version } => {
                return Err(anyhow::anyhow!(
                    "Protocol version mismatch: expected {}, got {}",
                    PROTOCOL_VERSION,
                    version
                ))
            }
            Reply::Error(e) => return Err(anyhow::Error::new(e)),
            other => return Err(anyhow::anyhow!("Expected Hello, got {:?}", other)),
        }
        Ok(GameClient {
            transport,
            events: VecDeque::new(),
        })
    }

    /// Sends `request` and waits for its reply, queueing any events that
    /// arrive first.
    pub async fn call(&mut self, request: Request) -> anyhow::Result<Reply> {
        self.transport.send(request).await?;
        loop {
            match self.transport.recv().await? {
                Reply::Event(event) => self.events.push_back(event),
                reply => return Ok(reply),
            }
        }
    }

    /// Next pushed room event, waiting for one if none is queued.
    pub async fn next_event(&mut self) -> anyhow::Result<RoomEvent> {
        if let Some(event) = self.events.pop_front() {
            return Ok(event);
        }
        loop {
            match self.transport.recv().await? {
                Reply::Event(event) => return Ok(event),
                other => log::warn!("dropping unsolicited reply {:?}", other),
            }
        }
    }

    /// Events received so far without waiting.
    pub fn drain_events(&mut self) -> Vec<RoomEvent> {
        self.events.drain(..).collect()
    }

    pub async fn create_match(
        &mut self,
        participant: &ParticipantId,
        vs_agent: bool,
    ) -> anyhow::Result<MatchId> {
        let reply = self
            .call(Request::CreateMatch {
                participant: participant.clone(),
                vs_agent,
            })
            .await?;
        expect_reply!(reply, MatchCreated)
    }

    pub async fn join_match(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
    ) -> anyhow::Result<Role> {
        let reply = self
            .call(Request::JoinMatch {
                match_id: match_id.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Joined)
    }

    pub async fn create_room(&mut self, participant: &ParticipantId) -> anyhow::Result<RoomCode> {
        let reply = self
            .call(Request::CreateRoom {
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, RoomCreated)
    }

    pub async fn join_room(
        &mut self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> anyhow::Result<RoomView> {
        let reply = self
            .call(Request::JoinRoom {
                code: code.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Room)
    }

    pub async fn leave_room(
        &mut self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> anyhow::Result<LeaveOutcome> {
        let reply = self
            .call(Request::LeaveRoom {
                code: code.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Left)
    }

    pub async fn set_room_ready(
        &mut self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> anyhow::Result<RoomView> {
        let reply = self
            .call(Request::SetRoomReady {
                code: code.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Room)
    }

    pub async fn clear_room_ready(
        &mut self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> anyhow::Result<RoomView> {
        let reply = self
            .call(Request::ClearRoomReady {
                code: code.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Room)
    }

    pub async fn set_match_ready(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
    ) -> anyhow::Result<MatchStatus> {
        let reply = self
            .call(Request::SetMatchReady {
                match_id: match_id.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Status)
    }

    pub async fn place_ship(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
        cells: Vec<Coord>,
    ) -> anyhow::Result<usize> {
        let reply = self
            .call(Request::PlaceShip {
                match_id: match_id.clone(),
                participant: participant.clone(),
                cells,
            })
            .await?;
        expect_reply!(reply, ShipCount)
    }

    pub async fn auto_place(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
    ) -> anyhow::Result<Vec<Coord>> {
        let reply = self
            .call(Request::AutoPlace {
                match_id: match_id.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Placed)
    }

    pub async fn attack(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
        x: i32,
        y: i32,
    ) -> anyhow::Result<AttackSummary> {
        let reply = self
            .call(Request::Attack {
                match_id: match_id.clone(),
                participant: participant.clone(),
                x,
                y,
            })
            .await?;
        expect_reply!(reply, Attack)
    }

    pub async fn surrender(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
    ) -> anyhow::Result<Role> {
        let reply = self
            .call(Request::Surrender {
                match_id: match_id.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, Winner)
    }

    pub async fn get_state(
        &mut self,
        match_id: &MatchId,
        participant: &ParticipantId,
    ) -> anyhow::Result<MatchView> {
        let reply = self
            .call(Request::GetState {
                match_id: match_id.clone(),
                participant: participant.clone(),
            })
            .await?;
        expect_reply!(reply, State)
    }

    pub async fn room_state(&mut self, code: &RoomCode) -> anyhow::Result<RoomView> {
        let reply = self.call(Request::RoomState { code: code.clone() }).await?;
        expect_reply!(reply, Room)
    }

    pub async fn stats(&mut self) -> anyhow::Result<ServiceStats> {
        let reply = self.call(Request::Stats).await?;
        expect_reply!(reply, Stats)
    }
}
