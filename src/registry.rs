//! Process-wide store of live rooms keyed by code.
#![cfg(feature = "std")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::time::{Duration, Instant};

use crate::common::{EntityKind, GameError};
use crate::player::ParticipantId;
use crate::room::{LeaveOutcome, Room, RoomCode};

pub type SharedRoom = Arc<Mutex<Room>>;

/// Locks a room, recovering it if a previous holder panicked.
pub fn lock_room(room: &SharedRoom) -> MutexGuard<'_, Room> {
    room.lock().unwrap_or_else(|poisoned| {
        log::error!("recovering poisoned room lock");
        poisoned.into_inner()
    })
}

/// Rooms by code. The map lock is always taken before any room lock and
/// never held while waiting on one.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomCode, SharedRoom>>,
    idle_timeout: Duration,
}

impl RoomRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        RoomRegistry {
            rooms: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<RoomCode, SharedRoom>> {
        self.rooms.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<RoomCode, SharedRoom>> {
        self.rooms.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Opens a room for `creator` under a fresh code.
    pub fn create_room(&self, creator: ParticipantId) -> RoomCode {
        let mut rng = rand::rng();
        let mut rooms = self.write_map();
        let code = loop {
            let code = RoomCode::generate(&mut rng);
            if !rooms.contains_key(&code) {
                break code;
            }
            log::debug!("room code {} collided, regenerating", code);
        };
        log::info!("{} created room {}", creator, code);
        rooms.insert(code.clone(), Arc::new(Mutex::new(Room::new(code.clone(), creator))));
        code
    }

    pub fn get_room(&self, code: &RoomCode) -> Option<SharedRoom> {
        self.read_map().get(code).cloned()
    }

    /// Like `get_room`, with absence reported as `NotFound`.
    pub fn room(&self, code: &RoomCode) -> Result<SharedRoom, GameError> {
        self.get_room(code)
            .ok_or_else(|| GameError::not_found(EntityKind::Room, code))
    }

    /// Removes `participant` from the room, dropping the room when it asks
    /// to be deleted or ends up empty.
    pub fn leave_room(
        &self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> Result<LeaveOutcome, GameError> {
        let shared = self.room(code)?;
        // The room closes itself under its own lock, so a handle cloned
        // before the removal below cannot act on it any more.
        let outcome = lock_room(&shared).leave(participant)?;
        if outcome == LeaveOutcome::Deleted {
            let mut rooms = self.write_map();
            if rooms.get(code).is_some_and(|r| Arc::ptr_eq(r, &shared)) {
                rooms.remove(code);
                log::info!("room {} removed", code);
            }
        }
        Ok(outcome)
    }

    /// Evicts rooms idle past the timeout. Rooms locked by a running command
    /// are in use and skipped.
    pub fn cleanup_inactive(&self) -> Vec<RoomCode> {
        self.cleanup_inactive_at(Instant::now())
    }

    pub fn cleanup_inactive_at(&self, now: Instant) -> Vec<RoomCode> {
        let mut rooms = self.write_map();
        let idle: Vec<RoomCode> = rooms
            .iter()
            .filter(|(_, shared)| {
                let mut room = match shared.try_lock() {
                    Ok(room) => room,
                    Err(TryLockError::Poisoned(p)) => p.into_inner(),
                    Err(TryLockError::WouldBlock) => return false,
                };
                let idle = room.is_idle(now, self.idle_timeout);
                if idle {
                    room.close();
                }
                idle
            })
            .map(|(code, _)| code.clone())
            .collect();
        for code in &idle {
            rooms.remove(code);
            log::info!("evicted idle room {}", code);
        }
        idle
    }

    /// Room currently holding `participant`, if any.
    pub fn room_for_participant(&self, participant: &ParticipantId) -> Option<RoomCode> {
        let rooms: Vec<(RoomCode, SharedRoom)> = self
            .read_map()
            .iter()
            .map(|(c, r)| (c.clone(), r.clone()))
            .collect();
        rooms.into_iter().find_map(|(code, shared)| {
            let present = lock_room(&shared).participants().any(|p| p == participant);
            present.then_some(code)
        })
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        RoomRegistry::new(Duration::from_secs(crate::config::DEFAULT_IDLE_TIMEOUT_SECS))
    }
}
