use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use seabattle::{
    Coord, EntityKind, Event, EventSink, FinishReason, GameError, GameService, LeaveOutcome,
    MatchId, MatchStatus, ParticipantId, Role, RoomCode, RoomEvent, RoomStatus, ServiceConfig,
    Shot,
};

/// Keeps every published event for inspection.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RoomEvent>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .drain(..)
            .map(|e| e.event)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, room: &RoomCode, event: Event) {
        self.events.lock().unwrap().push(RoomEvent {
            room: room.clone(),
            event,
        });
    }
}

fn pid(s: &str) -> ParticipantId {
    ParticipantId::from(s)
}

fn service() -> (GameService, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (
        GameService::new(ServiceConfig::default(), sink.clone()),
        sink,
    )
}

/// Room with alice and bob whose match is in placement.
fn room_in_placement(service: &GameService) -> (RoomCode, MatchId) {
    let code = service.create_room(pid("alice"));
    service.join_room(&code, pid("bob")).unwrap();
    service.set_room_ready(&code, &pid("alice")).unwrap();
    let view = service.set_room_ready(&code, &pid("bob")).unwrap();
    (code, view.match_id.unwrap())
}

#[test]
fn room_game_publishes_the_full_event_sequence() {
    let (service, sink) = service();
    let code = service.create_room(pid("alice"));
    service.join_room(&code, pid("bob")).unwrap();
    service.set_room_ready(&code, &pid("alice")).unwrap();
    let view = service.set_room_ready(&code, &pid("bob")).unwrap();
    assert_eq!(view.status, RoomStatus::Placement);
    let match_id = view.match_id.unwrap();
    assert_eq!(match_id, MatchId::for_room(code.as_str()));

    assert_eq!(
        sink.take(),
        vec![
            Event::PlayerJoined {
                participant: pid("bob"),
                role: Role::Player2,
            },
            Event::ReadyChanged {
                participant: pid("alice"),
                ready: true,
            },
            Event::ReadyChanged {
                participant: pid("bob"),
                ready: true,
            },
            Event::PlacementStarted {
                match_id: match_id.clone(),
            },
        ]
    );

    let bob_cells = service.auto_place(&match_id, &pid("bob")).unwrap();
    service.auto_place(&match_id, &pid("alice")).unwrap();
    assert_eq!(
        service.set_match_ready(&match_id, &pid("alice")).unwrap(),
        MatchStatus::Placement
    );
    // Match ready through the room entry point.
    let view = service.set_room_ready(&code, &pid("bob")).unwrap();
    assert_eq!(view.status, RoomStatus::Active);
    assert_eq!(
        sink.take(),
        vec![
            Event::PlacementComplete { role: Role::Player1 },
            Event::PlacementComplete { role: Role::Player2 },
            Event::BattleStarted {
                match_id: match_id.clone(),
                first_turn: Role::Player1,
            },
        ]
    );

    // Alice knows where bob's ships are; she never misses.
    let mut last = None;
    for c in &bob_cells {
        last = Some(service.attack(&match_id, &pid("alice"), c.x, c.y).unwrap());
    }
    let summary = last.unwrap();
    assert_eq!(summary.winner, Some(Role::Player1));

    let events = sink.take();
    assert_eq!(events.len(), bob_cells.len() + 1);
    assert!(events[..bob_cells.len()]
        .iter()
        .all(|e| matches!(e, Event::MoveResult(s) if s.shot.is_hit())));
    assert_eq!(
        events.last(),
        Some(&Event::GameFinished {
            winner: Role::Player1,
            reason: FinishReason::AllShipsSunk,
        })
    );
    assert_eq!(service.room_state(&code).unwrap().status, RoomStatus::Finished);
}

#[test]
fn surrender_and_leave_are_published() {
    let (service, sink) = service();
    let (code, match_id) = room_in_placement(&service);
    for p in ["alice", "bob"] {
        service.auto_place(&match_id, &pid(p)).unwrap();
        service.set_match_ready(&match_id, &pid(p)).unwrap();
    }
    sink.take();

    assert_eq!(service.surrender(&match_id, &pid("bob")).unwrap(), Role::Player1);
    assert_eq!(
        service.leave_room(&code, &pid("alice")).unwrap(),
        LeaveOutcome::Retained
    );
    assert_eq!(
        service.leave_room(&code, &pid("bob")).unwrap(),
        LeaveOutcome::Deleted
    );
    assert_eq!(
        sink.take(),
        vec![
            Event::GameFinished {
                winner: Role::Player1,
                reason: FinishReason::Surrender,
            },
            Event::PlayerLeft {
                participant: pid("alice"),
                room_deleted: false,
            },
            Event::PlayerLeft {
                participant: pid("bob"),
                room_deleted: true,
            },
        ]
    );
    assert!(service.room_state(&code).unwrap_err().is_not_found());
    assert!(service
        .get_state(&match_id, &pid("alice"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn leaving_mid_battle_deletes_room_and_match() {
    let (service, _sink) = service();
    let (code, match_id) = room_in_placement(&service);
    assert_eq!(
        service.leave_room(&code, &pid("bob")).unwrap(),
        LeaveOutcome::Deleted
    );
    assert_eq!(service.stats().rooms, 0);
    assert!(service
        .auto_place(&match_id, &pid("alice"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn clearing_ready_is_published() {
    let (service, sink) = service();
    let code = service.create_room(pid("alice"));
    service.set_room_ready(&code, &pid("alice")).unwrap();
    let view = service.clear_room_ready(&code, &pid("alice")).unwrap();
    assert_eq!(view.ready, [false, false]);
    assert_eq!(
        sink.take().last(),
        Some(&Event::ReadyChanged {
            participant: pid("alice"),
            ready: false,
        })
    );
}

#[test]
fn agent_match_plays_without_events() {
    let (service, sink) = service();
    let id = service.create_match(pid("alice"), true).unwrap();
    assert!(id.room_code().is_none());

    let state = service.get_state(&id, &pid("alice")).unwrap();
    assert_eq!(state.status, MatchStatus::Placement);
    assert_eq!(state.ready, vec![Role::Player2]);
    assert_eq!(state.opponent.as_deref(), Some("agent"));

    service.auto_place(&id, &pid("alice")).unwrap();
    assert_eq!(
        service.set_match_ready(&id, &pid("alice")).unwrap(),
        MatchStatus::Active
    );

    let mut fired = 0;
    'outer: for y in 0..10 {
        for x in 0..10 {
            let summary = service.attack(&id, &pid("alice"), x, y).unwrap();
            fired += 1;
            if summary.winner.is_some() {
                break 'outer;
            }
        }
    }
    let state = service.get_state(&id, &pid("alice")).unwrap();
    assert_eq!(state.status, MatchStatus::Finished);
    assert!(fired <= 100);
    assert!(sink.take().is_empty());
}

#[test]
fn open_match_is_joined_by_id() {
    let (service, _sink) = service();
    let id = service.create_match(pid("alice"), false).unwrap();
    assert_eq!(service.join_match(&id, pid("bob")).unwrap(), Role::Player2);
    assert!(matches!(
        service.join_match(&id, pid("carol")),
        Err(GameError::IllegalState(_))
    ));
    let view = service.get_state(&id, &pid("bob")).unwrap();
    assert_eq!(view.role, Role::Player2);
    assert_eq!(service.stats().standalone_matches, 1);
}

#[test]
fn room_matches_cannot_be_joined_by_id() {
    let (service, _sink) = service();
    let (_code, match_id) = room_in_placement(&service);
    assert!(service.join_match(&match_id, pid("carol")).is_err());
}

#[test]
fn unknown_ids_are_not_found() {
    let (service, _sink) = service();
    let missing = MatchId::standalone(0xdead);
    match service.attack(&missing, &pid("alice"), 0, 0) {
        Err(GameError::NotFound { kind, .. }) => assert_eq!(kind, EntityKind::Match),
        other => panic!("expected NotFound, got {:?}", other),
    }
    let bad_room = MatchId::from("multi_ZZZZZZ");
    assert!(service
        .get_state(&bad_room, &pid("alice"))
        .unwrap_err()
        .is_not_found());
    let code: RoomCode = "ZZZZZZ".parse().unwrap();
    assert!(service
        .join_room(&code, pid("alice"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn outsiders_cannot_act_on_a_match() {
    let (service, _sink) = service();
    let (_code, match_id) = room_in_placement(&service);
    match service.auto_place(&match_id, &pid("mallory")) {
        Err(GameError::NotFound { kind, .. }) => assert_eq!(kind, EntityKind::Participant),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn manual_placement_through_the_service() {
    let (service, _sink) = service();
    let id = service.create_match(pid("alice"), true).unwrap();
    let cells = vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)];
    assert_eq!(service.place_ship(&id, &pid("alice"), &cells).unwrap(), 1);
    assert!(matches!(
        service.place_ship(&id, &pid("alice"), &[Coord::new(3, 1)]),
        Err(GameError::Validation(_))
    ));
    assert!(matches!(
        service.set_match_ready(&id, &pid("alice")),
        Err(GameError::IllegalState(_))
    ));
}

#[test]
fn invalid_coordinates_are_reported_not_rejected() {
    let (service, _sink) = service();
    let id = service.create_match(pid("alice"), true).unwrap();
    service.auto_place(&id, &pid("alice")).unwrap();
    service.set_match_ready(&id, &pid("alice")).unwrap();
    let summary = service.attack(&id, &pid("alice"), -1, 4).unwrap();
    assert_eq!(summary.shot, Shot::Invalid);
    assert_eq!(summary.next_turn, Some(Role::Player1));
}

#[test]
fn cleanup_evicts_idle_rooms_and_matches() {
    let config = ServiceConfig {
        idle_timeout: Duration::from_secs(300),
        ..ServiceConfig::default()
    };
    let service = GameService::new(config, Arc::new(seabattle::NullSink));
    service.create_room(pid("alice"));
    service.create_match(pid("bob"), true).unwrap();
    let now = Instant::now();
    assert_eq!(service.cleanup_inactive_at(now), 0);
    assert_eq!(service.cleanup_inactive_at(now + Duration::from_secs(301)), 2);
    assert_eq!(service.stats().rooms, 0);
    assert_eq!(service.stats().standalone_matches, 0);
}

#[test]
fn rooms_progress_independently_across_threads() {
    let service = GameService::default();
    std::thread::scope(|s| {
        for t in 0..8 {
            let service = &service;
            s.spawn(move || {
                let a = pid(&format!("a{}", t));
                let b = pid(&format!("b{}", t));
                let code = service.create_room(a.clone());
                service.join_room(&code, b.clone()).unwrap();
                service.set_room_ready(&code, &a).unwrap();
                let id = service.set_room_ready(&code, &b).unwrap().match_id.unwrap();
                for p in [&a, &b] {
                    service.auto_place(&id, p).unwrap();
                    service.set_match_ready(&id, p).unwrap();
                }
                let mut turn = [&a, &b];
                let mut targets = [0usize; 2];
                loop {
                    let state = service.get_state(&id, turn[0]).unwrap();
                    if state.status == MatchStatus::Finished {
                        break;
                    }
                    if !state.is_my_turn() {
                        turn.swap(0, 1);
                        continue;
                    }
                    let side = state.role.index();
                    let n = targets[side] as i32;
                    targets[side] += 1;
                    service.attack(&id, turn[0], n % 10, n / 10).unwrap();
                }
                assert_eq!(
                    service.room_state(&code).unwrap().status,
                    RoomStatus::Finished
                );
            });
        }
    });
    assert_eq!(service.stats().rooms, 8);
}

#[test]
fn racing_attacks_on_one_turn_land_once() {
    let (service, sink) = service();
    let (_code, match_id) = room_in_placement(&service);
    let bob_cells = service.auto_place(&match_id, &pid("bob")).unwrap();
    service.auto_place(&match_id, &pid("alice")).unwrap();
    for p in ["alice", "bob"] {
        service.set_match_ready(&match_id, &pid(p)).unwrap();
    }
    sink.take();

    // Two misses for player1: whichever lands first passes the turn.
    let water: Vec<Coord> = (0..100)
        .map(|i| Coord::new(i % 10, i / 10))
        .filter(|c| !bob_cells.contains(c))
        .take(2)
        .collect();
    let barrier = std::sync::Barrier::new(2);
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = water
            .iter()
            .map(|c| {
                let (service, barrier, match_id) = (&service, &barrier, &match_id);
                s.spawn(move || {
                    barrier.wait();
                    service.attack(match_id, &pid("alice"), c.x, c.y)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(GameError::IllegalState(_)))));
    let moves: Vec<Event> = sink
        .take()
        .into_iter()
        .filter(|e| matches!(e, Event::MoveResult(_)))
        .collect();
    assert_eq!(moves.len(), 1);
    let state = service.get_state(&match_id, &pid("alice")).unwrap();
    assert_eq!(state.current_turn, Role::Player2);
}

#[test]
fn eviction_publishes_room_closed() {
    let (service, sink) = service();
    let code = service.create_room(pid("alice"));
    assert_eq!(
        service.cleanup_inactive_at(Instant::now() + Duration::from_secs(301)),
        1
    );
    assert_eq!(
        sink.events.lock().unwrap().last(),
        Some(&RoomEvent {
            room: code,
            event: Event::RoomClosed,
        })
    );
    assert!(Event::RoomClosed.ends_room());
}

#[test]
fn room_state_counts_as_activity() {
    let (service, _sink) = service();
    let code = service.create_room(pid("alice"));
    let shared = service.registry().room(&code).unwrap();
    let earlier = Instant::now() - Duration::from_secs(10);
    seabattle::registry::lock_room(&shared).touch_at(earlier);

    service.room_state(&code).unwrap();
    assert!(seabattle::registry::lock_room(&shared).last_activity() > earlier);
}
