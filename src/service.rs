//! Command surface over rooms and standalone matches.
#![cfg(feature = "std")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::time::Instant;

use rand::Rng;

use crate::common::{Coord, EntityKind, GameError, MatchId, Role};
use crate::config::ServiceConfig;
use crate::domain::{AttackSummary, MatchStatus, MatchView};
use crate::events::{Event, EventSink, FinishReason, NullSink};
use crate::game::Match;
use crate::player::{Participant, ParticipantId};
use crate::registry::{lock_room, RoomRegistry};
use crate::room::{LeaveOutcome, ReadyOutcome, RoomCode, RoomStatus, RoomView};

/// A match that lives outside any room, typically against the agent.
#[derive(Debug)]
struct StandaloneMatch {
    game: Match,
    last_activity: Instant,
}

type SharedMatch = Arc<Mutex<StandaloneMatch>>;

fn lock_match(shared: &SharedMatch) -> MutexGuard<'_, StandaloneMatch> {
    shared.lock().unwrap_or_else(|poisoned| {
        log::error!("recovering poisoned match lock");
        poisoned.into_inner()
    })
}

/// Counts reported by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServiceStats {
    pub rooms: usize,
    pub standalone_matches: usize,
}

/// Publishes to the room a match belongs to; silent for standalone matches.
struct Emitter<'a> {
    sink: &'a dyn EventSink,
    room: Option<&'a RoomCode>,
}

impl Emitter<'_> {
    fn emit(&self, event: Event) {
        if let Some(room) = self.room {
            self.sink.publish(room, event);
        }
    }
}

fn logged<T>(op: &str, result: Result<T, GameError>) -> Result<T, GameError> {
    if let Err(e) = &result {
        log::debug!("{} rejected: {}", op, e);
    }
    result
}

/// Owns every room and standalone match. Share it behind an `Arc`.
pub struct GameService {
    rooms: RoomRegistry,
    matches: RwLock<HashMap<MatchId, SharedMatch>>,
    sink: Arc<dyn EventSink>,
    config: ServiceConfig,
}

impl Default for GameService {
    fn default() -> Self {
        GameService::new(ServiceConfig::default(), Arc::new(NullSink))
    }
}

impl GameService {
    pub fn new(config: ServiceConfig, sink: Arc<dyn EventSink>) -> Self {
        GameService {
            rooms: RoomRegistry::new(config.idle_timeout),
            matches: RwLock::new(HashMap::new()),
            sink,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.rooms
    }

    fn standalone(&self, id: &MatchId) -> Result<SharedMatch, GameError> {
        self.matches
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| GameError::not_found(EntityKind::Match, id))
    }

    /// Locks whatever owns match `id`, resolves the caller's role and runs
    /// `f` on the match under that lock.
    fn with_match<T>(
        &self,
        id: &MatchId,
        participant: &ParticipantId,
        f: impl FnOnce(&mut Match, Role, &Emitter<'_>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        if let Some(code) = id.room_code() {
            let code: RoomCode = code
                .parse()
                .map_err(|_| GameError::not_found(EntityKind::Match, id))?;
            let shared = self
                .rooms
                .get_room(&code)
                .ok_or_else(|| GameError::not_found(EntityKind::Match, id))?;
            let mut room = lock_room(&shared);
            room.touch();
            let game = room
                .game_mut()
                .ok_or_else(|| GameError::not_found(EntityKind::Match, id))?;
            let role = game.role_of(participant)?;
            let emitter = Emitter {
                sink: self.sink.as_ref(),
                room: Some(&code),
            };
            return f(game, role, &emitter);
        }

        let shared = self.standalone(id)?;
        let mut entry = lock_match(&shared);
        entry.last_activity = Instant::now();
        let role = entry.game.role_of(participant)?;
        let emitter = Emitter {
            sink: self.sink.as_ref(),
            room: None,
        };
        f(&mut entry.game, role, &emitter)
    }

    /// Starts a standalone match. Against the agent it is seated and ready at
    /// once; otherwise the second seat waits for `join_match`.
    pub fn create_match(
        &self,
        participant: ParticipantId,
        vs_agent: bool,
    ) -> Result<MatchId, GameError> {
        let mut rng = rand::rng();
        let mut matches = self.matches.write().unwrap_or_else(|p| p.into_inner());
        let id = loop {
            let id = MatchId::standalone(rng.random());
            if !matches.contains_key(&id) {
                break id;
            }
        };
        let seed = rng.random();
        let game = if vs_agent {
            Match::against_agent(id.clone(), participant.clone(), seed)?
        } else {
            Match::new(id.clone(), Participant::Human(participant.clone()), seed)
        };
        matches.insert(
            id.clone(),
            Arc::new(Mutex::new(StandaloneMatch {
                game,
                last_activity: Instant::now(),
            })),
        );
        log::info!("{} created match {} (agent: {})", participant, id, vs_agent);
        Ok(id)
    }

    /// Takes the open seat of a standalone match.
    pub fn join_match(&self, id: &MatchId, participant: ParticipantId) -> Result<Role, GameError> {
        if id.room_code().is_some() {
            return Err(GameError::illegal("room matches are joined through their room"));
        }
        let shared = logged("join_match", self.standalone(id))?;
        let mut entry = lock_match(&shared);
        entry.last_activity = Instant::now();
        logged("join_match", entry.game.join(Participant::Human(participant)))
    }

    pub fn create_room(&self, participant: ParticipantId) -> RoomCode {
        self.rooms.create_room(participant)
    }

    pub fn join_room(&self, code: &RoomCode, participant: ParticipantId) -> Result<RoomView, GameError> {
        let shared = logged("join_room", self.rooms.room(code))?;
        let mut room = lock_room(&shared);
        let role = logged("join_room", room.join(participant.clone()))?;
        self.sink.publish(code, Event::PlayerJoined { participant, role });
        Ok(room.view())
    }

    pub fn leave_room(
        &self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> Result<LeaveOutcome, GameError> {
        let outcome = logged("leave_room", self.rooms.leave_room(code, participant))?;
        self.sink.publish(
            code,
            Event::PlayerLeft {
                participant: participant.clone(),
                room_deleted: outcome == LeaveOutcome::Deleted,
            },
        );
        Ok(outcome)
    }

    /// Ready in the lobby, or in the room's match once it exists.
    pub fn set_room_ready(
        &self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> Result<RoomView, GameError> {
        let shared = logged("set_room_ready", self.rooms.room(code))?;
        let mut room = lock_room(&shared);
        let role = logged("set_room_ready", room.slot_of(participant))?;
        let before = room.status();
        let was_ready = room.game().is_some_and(|g| g.is_ready(role));
        match logged("set_room_ready", room.set_ready(participant))? {
            ReadyOutcome::Waiting => self.sink.publish(
                code,
                Event::ReadyChanged {
                    participant: participant.clone(),
                    ready: true,
                },
            ),
            ReadyOutcome::MatchCreated(match_id) => {
                self.sink.publish(
                    code,
                    Event::ReadyChanged {
                        participant: participant.clone(),
                        ready: true,
                    },
                );
                self.sink.publish(code, Event::PlacementStarted { match_id });
            }
            ReadyOutcome::Match(status) => {
                if !was_ready {
                    self.sink.publish(code, Event::PlacementComplete { role });
                }
                if before == RoomStatus::Placement && status == MatchStatus::Active {
                    if let Some(game) = room.game() {
                        self.sink.publish(
                            code,
                            Event::BattleStarted {
                                match_id: game.id().clone(),
                                first_turn: game.current_turn(),
                            },
                        );
                    }
                }
            }
        }
        Ok(room.view())
    }

    /// Withdraws a lobby ready flag.
    pub fn clear_room_ready(
        &self,
        code: &RoomCode,
        participant: &ParticipantId,
    ) -> Result<RoomView, GameError> {
        let shared = logged("clear_room_ready", self.rooms.room(code))?;
        let mut room = lock_room(&shared);
        logged("clear_room_ready", room.clear_ready(participant))?;
        self.sink.publish(
            code,
            Event::ReadyChanged {
                participant: participant.clone(),
                ready: false,
            },
        );
        Ok(room.view())
    }

    pub fn set_match_ready(
        &self,
        id: &MatchId,
        participant: &ParticipantId,
    ) -> Result<MatchStatus, GameError> {
        logged(
            "set_match_ready",
            self.with_match(id, participant, |game, role, events| {
                let was_ready = game.is_ready(role);
                let before = game.status();
                let status = game.set_ready(role)?;
                if !was_ready {
                    events.emit(Event::PlacementComplete { role });
                }
                if before == MatchStatus::Placement && status == MatchStatus::Active {
                    events.emit(Event::BattleStarted {
                        match_id: game.id().clone(),
                        first_turn: game.current_turn(),
                    });
                }
                Ok(status)
            }),
        )
    }

    /// Places one ship and returns the caller's ship count.
    pub fn place_ship(
        &self,
        id: &MatchId,
        participant: &ParticipantId,
        cells: &[Coord],
    ) -> Result<usize, GameError> {
        logged(
            "place_ship",
            self.with_match(id, participant, |game, role, _| game.place_ship(role, cells)),
        )
    }

    pub fn auto_place(&self, id: &MatchId, participant: &ParticipantId) -> Result<Vec<Coord>, GameError> {
        logged(
            "auto_place",
            self.with_match(id, participant, |game, role, _| game.auto_place(role)),
        )
    }

    pub fn attack(
        &self,
        id: &MatchId,
        participant: &ParticipantId,
        x: i32,
        y: i32,
    ) -> Result<AttackSummary, GameError> {
        logged(
            "attack",
            self.with_match(id, participant, |game, role, events| {
                let summary = game.attack(role, Coord::new(x, y))?;
                events.emit(Event::MoveResult(summary.clone()));
                if let Some(winner) = summary.winner {
                    events.emit(Event::GameFinished {
                        winner,
                        reason: FinishReason::AllShipsSunk,
                    });
                }
                Ok(summary)
            }),
        )
    }

    /// Concedes; returns the winner.
    pub fn surrender(&self, id: &MatchId, participant: &ParticipantId) -> Result<Role, GameError> {
        logged(
            "surrender",
            self.with_match(id, participant, |game, role, events| {
                let winner = game.surrender(role)?;
                events.emit(Event::GameFinished {
                    winner,
                    reason: FinishReason::Surrender,
                });
                Ok(winner)
            }),
        )
    }

    pub fn get_state(&self, id: &MatchId, participant: &ParticipantId) -> Result<MatchView, GameError> {
        self.with_match(id, participant, |game, role, _| Ok(game.view(role)))
    }

    pub fn room_state(&self, code: &RoomCode) -> Result<RoomView, GameError> {
        let shared = self.rooms.room(code)?;
        let mut room = lock_room(&shared);
        room.touch();
        Ok(room.view())
    }

    /// Evicts idle rooms and standalone matches, returning how many went.
    /// Each evicted room gets a final `RoomClosed` event.
    pub fn cleanup_inactive(&self) -> usize {
        self.cleanup_inactive_at(Instant::now())
    }

    pub fn cleanup_inactive_at(&self, now: Instant) -> usize {
        let evicted = self.rooms.cleanup_inactive_at(now);
        for code in &evicted {
            self.sink.publish(code, Event::RoomClosed);
        }
        let rooms = evicted.len();

        let timeout = self.config.idle_timeout;
        let mut matches = self.matches.write().unwrap_or_else(|p| p.into_inner());
        let before = matches.len();
        matches.retain(|id, shared| {
            let idle = match shared.try_lock() {
                Ok(entry) => now.saturating_duration_since(entry.last_activity) > timeout,
                Err(TryLockError::Poisoned(p)) => {
                    now.saturating_duration_since(p.into_inner().last_activity) > timeout
                }
                Err(TryLockError::WouldBlock) => false,
            };
            if idle {
                log::info!("evicted idle match {}", id);
            }
            !idle
        });
        rooms + (before - matches.len())
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            rooms: self.rooms.len(),
            standalone_matches: self.matches.read().unwrap_or_else(|p| p.into_inner()).len(),
        }
    }
}
