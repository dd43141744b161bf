//! TCP front end: one task per connection, room events pushed to every
//! connection that entered the room.
#![cfg(feature = "std")]

use std::collections::HashSet;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};

use crate::common::GameError;
use crate::config::ServiceConfig;
use crate::events::{BroadcastSink, RoomEvent};
use crate::protocol::{Reply, Request, PROTOCOL_VERSION};
use crate::room::RoomCode;
use crate::service::GameService;
use crate::transport::framing::{read_frame, write_frame, MAX_FRAME_SIZE};
use crate::transport::tcp::{TcpTransport, DEFAULT_TIMEOUT};
use crate::transport::Transport;

/// Binds `bind` and serves until the listener fails.
pub async fn run(bind: &str, config: ServiceConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    log::info!("listening on {}", listener.local_addr()?);
    let sink = BroadcastSink::new(config.event_capacity);
    let service = Arc::new(GameService::new(config, Arc::new(sink.clone())));
    serve(listener, service, sink).await
}

/// Accepts connections on `listener`. `sink` must be the sink `service`
/// publishes to.
pub async fn serve(
    listener: TcpListener,
    service: Arc<GameService>,
    sink: BroadcastSink,
) -> anyhow::Result<()> {
    let sweeper = tokio::spawn(cleanup_loop(service.clone()));
    let result = accept_loop(listener, service, sink).await;
    sweeper.abort();
    result
}

async fn accept_loop(
    listener: TcpListener,
    service: Arc<GameService>,
    sink: BroadcastSink,
) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        log::debug!("connection from {}", addr);
        let service = service.clone();
        let events = sink.subscribe();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, service, events).await {
                log::debug!("connection {} closed: {}", addr, e);
            }
        });
    }
}

async fn cleanup_loop(service: Arc<GameService>) {
    let period = service.config().cleanup_interval.max(Duration::from_millis(10));
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let evicted = service.cleanup_inactive();
        if evicted > 0 {
            log::info!("cleanup evicted {} idle rooms/matches", evicted);
        }
    }
}

async fn handshake(stream: TcpStream) -> anyhow::Result<TcpStream> {
    let mut transport: TcpTransport<Reply, Request> = TcpTransport::new(stream);
    match transport.recv().await? {
        Request::Hello { version } if version == PROTOCOL_VERSION => {
            transport
                .send(Reply::Hello {
                    version: PROTOCOL_VERSION,
                })
                .await?;
            Ok(transport.into_inner())
        }
        Request::Hello { version } => {
            let msg = format!(
                "Protocol version mismatch: expected {}, got {}",
                PROTOCOL_VERSION, version
            );
            transport
                .send(Reply::Error(GameError::Validation(msg.clone())))
                .await?;
            Err(anyhow::anyhow!(msg))
        }
        _ => {
            transport
                .send(Reply::Error(GameError::illegal("expected Hello")))
                .await?;
            Err(anyhow::anyhow!("Expected Hello"))
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    service: Arc<GameService>,
    mut events: broadcast::Receiver<RoomEvent>,
) -> anyhow::Result<()> {
    let stream = handshake(stream).await?;
    let (mut reader, mut writer) = stream.into_split();

    let (tx, mut requests) = mpsc::channel::<Request>(16);
    let reader_task = tokio::spawn(async move {
        loop {
            match read_frame::<_, Request>(&mut reader, MAX_FRAME_SIZE).await {
                Ok(request) => {
                    if tx.send(request).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("reader stopped: {}", e);
                    break;
                }
            }
        }
    });

    let mut rooms: HashSet<RoomCode> = HashSet::new();
    let result = loop {
        let outgoing = tokio::select! {
            request = requests.recv() => match request {
                Some(request) => dispatch(&service, request, &mut rooms),
                None => break Ok(()),
            },
            event = events.recv() => match event {
                Ok(event) if rooms.contains(&event.room) => {
                    if event.event.ends_room() {
                        rooms.remove(&event.room);
                    }
                    Reply::Event(event)
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("connection lagged, {} events dropped", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break Ok(()),
            },
        };
        let write = write_frame(&mut writer, &outgoing, MAX_FRAME_SIZE);
        match timeout(DEFAULT_TIMEOUT, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => break Err(e),
            Err(_) => break Err(anyhow::anyhow!("Send timeout after {:?}", DEFAULT_TIMEOUT)),
        }
    };
    reader_task.abort();
    result
}

fn reply<T>(result: Result<T, GameError>, wrap: impl FnOnce(T) -> Reply) -> Reply {
    match result {
        Ok(value) => wrap(value),
        Err(e) => Reply::Error(e),
    }
}

/// Runs one request against the service. Rooms the connection creates or
/// joins are added to `rooms` so their events reach it; leaving removes them.
fn dispatch(service: &GameService, request: Request, rooms: &mut HashSet<RoomCode>) -> Reply {
    match request {
        Request::Hello { .. } => Reply::Error(GameError::illegal("handshake already completed")),
        Request::CreateMatch {
            participant,
            vs_agent,
        } => reply(service.create_match(participant, vs_agent), Reply::MatchCreated),
        Request::JoinMatch {
            match_id,
            participant,
        } => reply(service.join_match(&match_id, participant), Reply::Joined),
        Request::CreateRoom { participant } => {
            let code = service.create_room(participant);
            rooms.insert(code.clone());
            Reply::RoomCreated(code)
        }
        Request::JoinRoom { code, participant } => {
            let result = service.join_room(&code, participant);
            if result.is_ok() {
                rooms.insert(code);
            }
            reply(result, Reply::Room)
        }
        Request::LeaveRoom { code, participant } => {
            let result = service.leave_room(&code, &participant);
            if result.is_ok() {
                rooms.remove(&code);
            }
            reply(result, Reply::Left)
        }
        Request::SetRoomReady { code, participant } => {
            reply(service.set_room_ready(&code, &participant), Reply::Room)
        }
        Request::ClearRoomReady { code, participant } => {
            reply(service.clear_room_ready(&code, &participant), Reply::Room)
        }
        Request::SetMatchReady {
            match_id,
            participant,
        } => reply(service.set_match_ready(&match_id, &participant), Reply::Status),
        Request::PlaceShip {
            match_id,
            participant,
            cells,
        } => reply(
            service.place_ship(&match_id, &participant, &cells),
            Reply::ShipCount,
        ),
        Request::AutoPlace {
            match_id,
            participant,
        } => reply(service.auto_place(&match_id, &participant), Reply::Placed),
        Request::Attack {
            match_id,
            participant,
            x,
            y,
        } => reply(service.attack(&match_id, &participant, x, y), Reply::Attack),
        Request::Surrender {
            match_id,
            participant,
        } => reply(service.surrender(&match_id, &participant), Reply::Winner),
        Request::GetState {
            match_id,
            participant,
        } => reply(service.get_state(&match_id, &participant), Reply::State),
        Request::RoomState { code } => reply(service.room_state(&code), Reply::Room),
        Request::Stats => Reply::Stats(service.stats()),
    }
}
