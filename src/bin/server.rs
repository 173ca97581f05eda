use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use squid_sim::constants::{OUTBOUND_QUEUE, SERVER_TICK_MS};
use squid_sim::error::SimError;
use squid_sim::games::catalog;
use squid_sim::logging::{now_ms, Level, LogContext};
use squid_sim::runner::{run_to_completion, Playback};
use squid_sim::server_protocol::{parse_client_message, ParsedClientMessage};
use squid_sim::server_utils::{
    default_seed_from, frame_interval_ms, normalize_fps, parse_game, parse_port, parse_seed,
};
use squid_sim::types::GameKind;
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

struct Session {
    playback: Playback,
    fps: u32,
    paused: bool,
    next_due_ms: u64,
}

struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
    session: Option<Session>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    default_seed: u64,
}

impl ServerState {
    fn new(default_seed: u64) -> Self {
        Self {
            clients: HashMap::new(),
            default_seed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    seed: Option<String>,
}

#[tokio::main]
async fn main() {
    let port = parse_port(std::env::var("PORT").ok().as_deref());
    let default_seed = default_seed_from(std::env::var("SIM_DEFAULT_SEED").ok().as_deref());

    let state = Arc::new(Mutex::new(ServerState::new(default_seed)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/games", get(games_handler))
        .route("/api/games/{game}/summary", get(game_summary_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found. set STATIC_DIR to serve a viewer.");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            eprintln!("[server] failed to bind {bind_addr}: {error}");
            std::process::exit(1);
        }
    };

    println!("[server] listening on :{port} (default seed {default_seed})");
    if let Err(error) = axum::serve(listener, app).await {
        eprintln!("[server] runtime failed: {error}");
        std::process::exit(1);
    }
}

fn resolve_static_dir() -> Option<PathBuf> {
    let raw = std::env::var("STATIC_DIR").ok()?;
    let path = PathBuf::from(raw);
    path.join("index.html").is_file().then_some(path)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn games_handler(State(state): State<SharedState>) -> Response {
    let default_seed = state.lock().await.default_seed;
    match catalog(default_seed) {
        Ok(games) => Json(json!({ "games": games })).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &error),
    }
}

async fn game_summary_handler(
    State(state): State<SharedState>,
    Path(game): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let kind = match parse_game(&game) {
        Ok(kind) => kind,
        Err(error) => return error_response(StatusCode::NOT_FOUND, &error),
    };
    let default_seed = state.lock().await.default_seed;
    let seed = parse_seed(query.seed.as_deref()).unwrap_or(default_seed);
    match run_summary(kind, seed) {
        Ok(body) => Json(body).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &error),
    }
}

fn run_summary(kind: GameKind, seed: u64) -> Result<Value, SimError> {
    let mut playback = Playback::new(kind, seed)?;
    let report = run_to_completion(&mut playback, |_| Ok(()))?;
    Ok(json!({
        "game": kind,
        "seed": seed,
        "frames": report.frames,
        "summary": report.summary,
        "anomalies": report.anomalies,
    }))
}

fn error_response(status: StatusCode, error: &SimError) -> Response {
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(
            client_id.clone(),
            ClientContext {
                tx: tx.clone(),
                session: None,
            },
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
    }
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Play { game, seed, fps } => {
            let seed = seed.unwrap_or(guard.default_seed);
            if let Err(error) = start_session(&mut guard, client_id, game, seed, fps, now_ms()) {
                send_to_client(
                    &mut guard,
                    client_id,
                    &error_message(&error.to_string()),
                    QueuePolicy::DisconnectOnFull,
                );
            }
        }
        ParsedClientMessage::Pause => {
            if !set_paused(&mut guard, client_id, true, now_ms()) {
                send_to_client(
                    &mut guard,
                    client_id,
                    &error_message("no active playback"),
                    QueuePolicy::DisconnectOnFull,
                );
            }
        }
        ParsedClientMessage::Resume => {
            if !set_paused(&mut guard, client_id, false, now_ms()) {
                send_to_client(
                    &mut guard,
                    client_id,
                    &error_message("no active playback"),
                    QueuePolicy::DisconnectOnFull,
                );
            }
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn start_session(
    state: &mut ServerState,
    client_id: &str,
    game: GameKind,
    seed: u64,
    fps: Option<i64>,
    now: u64,
) -> Result<(), SimError> {
    let Some(client) = state.clients.get_mut(client_id) else {
        return Ok(());
    };
    let playback = Playback::new(game, seed)?;
    let fps = normalize_fps(fps, playback.sim().fps());
    println!("[server] {client_id} playing {} seed={seed} fps={fps}", game.key());
    client.session = Some(Session {
        playback,
        fps,
        paused: false,
        next_due_ms: now,
    });
    Ok(())
}

fn set_paused(state: &mut ServerState, client_id: &str, paused: bool, now: u64) -> bool {
    let Some(session) = state
        .clients
        .get_mut(client_id)
        .and_then(|client| client.session.as_mut())
    else {
        return false;
    };
    if session.paused && !paused {
        session.next_due_ms = now;
    }
    session.paused = paused;
    true
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(SERVER_TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_sessions(&mut guard, now_ms());
        }
    });
}

fn tick_sessions(state: &mut ServerState, now: u64) {
    let client_ids: Vec<String> = state.clients.keys().cloned().collect();
    for client_id in client_ids {
        for (message, policy) in advance_session(state, &client_id, now) {
            send_to_client(state, &client_id, &message, policy);
        }
    }
}

fn advance_session(state: &mut ServerState, client_id: &str, now: u64) -> Vec<(Value, QueuePolicy)> {
    let Some(client) = state.clients.get_mut(client_id) else {
        return Vec::new();
    };
    let Some(session) = client.session.as_mut() else {
        return Vec::new();
    };
    if session.paused || now < session.next_due_ms {
        return Vec::new();
    }

    let interval = frame_interval_ms(session.fps);
    session.next_due_ms = (session.next_due_ms + interval).max(now);

    let mut messages = Vec::new();
    match session.playback.advance() {
        Ok(Some((snapshot, anomalies))) => {
            messages.push((
                json!({
                    "type": "frame",
                    "snapshot": snapshot,
                    "anomalies": anomalies,
                }),
                QueuePolicy::DropOnFull,
            ));
        }
        Ok(None) => {}
        Err(error) => {
            client.session = None;
            messages.push((error_message(&error.to_string()), QueuePolicy::DisconnectOnFull));
            return messages;
        }
    }

    if session.playback.is_done() {
        let summary = session.playback.summary();
        LogContext::new(client_id)
            .for_game(session.playback.kind(), session.playback.seed())
            .emit(
                Level::Info,
                "session_finished",
                Some(session.playback.next_frame().saturating_sub(1)),
                json!({
                    "finished": summary.finished,
                    "failed": summary.failed,
                    "active": summary.active,
                }),
            );
        messages.push((
            json!({
                "type": "finished",
                "game": session.playback.kind(),
                "seed": session.playback.seed(),
                "summary": summary,
            }),
            QueuePolicy::DisconnectOnFull,
        ));
        client.session = None;
    }
    messages
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id);
    }
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    println!("[server] {client_id} disconnected: outbound queue full");
    let _ = context.tx.try_send(OutboundMessage::Close {
        code: 1013,
        reason: "outbound queue full".to_string(),
    });
}

fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &error_message(message),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_client(capacity: usize) -> (ServerState, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let mut state = ServerState::new(42);
        state.clients.insert(
            "client_1".to_string(),
            ClientContext { tx, session: None },
        );
        (state, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(outbound) = rx.try_recv() {
            if let OutboundMessage::Text(text) = outbound {
                messages.push(serde_json::from_str(&text).expect("outbound is json"));
            }
        }
        messages
    }

    #[test]
    fn session_streams_every_frame_then_finishes() {
        let (mut state, mut rx) = state_with_client(256);
        start_session(&mut state, "client_1", GameKind::TugOfWar, 42, Some(30), 0)
            .expect("session starts");

        let mut now = 0;
        for _ in 0..200 {
            tick_sessions(&mut state, now);
            now += 40;
        }
        let messages = drain(&mut rx);
        let frames: Vec<&Value> = messages.iter().filter(|m| m["type"] == "frame").collect();
        assert_eq!(frames.len(), 64);
        assert_eq!(frames[0]["snapshot"]["frame"], 0);
        assert_eq!(frames[63]["snapshot"]["frame"], 63);
        let last = messages.last().expect("finished message");
        assert_eq!(last["type"], "finished");
        assert_eq!(last["summary"]["finished"], 40);
        assert!(state.clients["client_1"].session.is_none());
    }

    #[test]
    fn frames_wait_for_the_interval() {
        let (mut state, mut rx) = state_with_client(256);
        start_session(&mut state, "client_1", GameKind::Dalgona, 42, Some(4), 1_000)
            .expect("session starts");
        tick_sessions(&mut state, 1_000);
        tick_sessions(&mut state, 1_100);
        tick_sessions(&mut state, 1_249);
        assert_eq!(drain(&mut rx).len(), 1);
        tick_sessions(&mut state, 1_250);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn paused_sessions_do_not_advance() {
        let (mut state, mut rx) = state_with_client(256);
        start_session(&mut state, "client_1", GameKind::Marbles, 1, None, 0)
            .expect("session starts");
        assert!(set_paused(&mut state, "client_1", true, 0));
        tick_sessions(&mut state, 10_000);
        assert!(drain(&mut rx).is_empty());

        assert!(set_paused(&mut state, "client_1", false, 20_000));
        tick_sessions(&mut state, 20_000);
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["snapshot"]["frame"], 0);
    }

    #[test]
    fn pause_without_session_is_rejected() {
        let (mut state, _rx) = state_with_client(4);
        assert!(!set_paused(&mut state, "client_1", true, 0));
        assert!(!set_paused(&mut state, "missing", true, 0));
    }

    #[test]
    fn full_queue_drops_frames_but_disconnects_on_finish() {
        let (mut state, _rx) = state_with_client(1);
        start_session(&mut state, "client_1", GameKind::GlassBridge, 42, Some(30), 0)
            .expect("session starts");
        let mut now = 0;
        for _ in 0..5 {
            tick_sessions(&mut state, now);
            now += 40;
        }
        assert!(state.clients.contains_key("client_1"));

        send_to_client(
            &mut state,
            "client_1",
            &error_message("queue full"),
            QueuePolicy::DisconnectOnFull,
        );
        assert!(!state.clients.contains_key("client_1"));
    }

    #[test]
    fn run_summary_reports_final_counts() {
        let body = run_summary(GameKind::RedLight, 42).expect("summary builds");
        assert_eq!(body["game"], "red_light");
        assert_eq!(body["summary"]["finished"], 201);
        assert_eq!(body["summary"]["failed"], 255);
        assert_eq!(body["anomalies"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn make_id_is_unique() {
        assert_ne!(make_id("client"), make_id("client"));
    }
}
