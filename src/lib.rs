#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod ai;
mod bitboard;
mod board;
mod common;
mod config;
pub mod domain;
mod game;
mod player;
mod ship;
pub mod sim;

#[cfg(feature = "std")]
pub mod client;
#[cfg(feature = "std")]
pub mod events;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
pub mod room;
#[cfg(feature = "std")]
pub mod server;
#[cfg(feature = "std")]
pub mod service;
#[cfg(feature = "std")]
pub mod transport;

pub use ai::{Direction, OpponentAgent};
pub use bitboard::{BitBoard, BitBoardError};
pub use board::*;
pub use common::*;
pub use config::*;
pub use domain::*;
pub use game::Match;
pub use player::{Participant, ParticipantId};
pub use ship::{Orientation, Ship, ShipClass};
pub use sim::{simulate, SimReport};

#[cfg(feature = "std")]
pub use client::GameClient;
#[cfg(feature = "std")]
pub use events::{BroadcastSink, Event, EventSink, FinishReason, NullSink, RoomEvent};
#[cfg(feature = "std")]
pub use logging::{init_logging, LOG_ENV};
#[cfg(feature = "std")]
pub use protocol::{Reply, Request, PROTOCOL_VERSION};
#[cfg(feature = "std")]
pub use registry::{RoomRegistry, SharedRoom};
#[cfg(feature = "std")]
pub use room::{LeaveOutcome, ReadyOutcome, Room, RoomCode, RoomStatus, RoomView};
#[cfg(feature = "std")]
pub use service::{GameService, ServiceStats};
#[cfg(feature = "std")]
pub use transport::tcp::TcpTransport;
