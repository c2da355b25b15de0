//! WebSocket handler — bidirectional event relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client events → decode + dispatch
//! - Broadcast events from board peers → forward to client
//! - Keepalive ping tick → probe the connection
//!
//! Dispatch mutates state through the services and returns any events bound
//! for the sender (the join snapshot); fan-out to peers happens inside
//! dispatch so the relay loop never blocks on other members.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → client joins a board via `join-board`, gets a snapshot
//! 2. Moves arrive → clamp + commit + async persist + broadcast to peers
//! 3. Close, error, or missed liveness → session parted, presence updated

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use frames::{ClientEvent, ServerEvent, decode_client_event, encode_event};

use crate::services;
use crate::state::AppState;

const PING_INTERVAL_SECS: u64 = 20;
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast events from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(CLIENT_CHANNEL_CAPACITY);

    info!(%client_id, "ws: client connected");

    // At most one joined board per session.
    let mut current_board: Option<String> = None;

    let mut ping = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
    ping.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let sender_events =
                            dispatch_event(&state, &mut current_board, client_id, &client_tx, text.as_str()).await;
                        for event in sender_events {
                            if send_event(&mut socket, &event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Pong(_) => {
                        if let Some(board_id) = &current_board {
                            services::board::touch_session(&state, board_id, client_id).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    // The connection is gone; its presence must go with it.
    if let Some(board_id) = current_board {
        services::board::part_board(&state, &board_id, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// Decode and process one inbound text frame, returning events bound for
/// the sender. Peer fan-out happens in here; malformed frames are logged
/// and dropped.
pub(crate) async fn dispatch_event(
    state: &AppState,
    current_board: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) -> Vec<ServerEvent> {
    let event = match decode_client_event(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound event");
            return vec![];
        }
    };

    if let Some(board_id) = current_board.as_deref() {
        services::board::touch_session(state, board_id, client_id).await;
    }

    match event {
        ClientEvent::JoinBoard { board_id } => {
            // A session holds one room at most, so switching boards parts
            // the old one. Re-joining the current board is a resync: the
            // membership is simply re-registered and a fresh snapshot sent.
            if let Some(old_board) = current_board.take()
                && old_board != board_id
            {
                services::board::part_board(state, &old_board, client_id).await;
            }

            info!(%client_id, %board_id, "ws: join board");
            let snapshot =
                services::board::join_board(state, &board_id, client_id, client_tx.clone()).await;
            *current_board = Some(board_id);
            vec![ServerEvent::Snapshot(snapshot)]
        }
        ClientEvent::LeaveBoard { board_id } => {
            if current_board.as_deref() == Some(board_id.as_str()) {
                *current_board = None;
            }
            services::board::part_board(state, &board_id, client_id).await;
            vec![]
        }
        ClientEvent::CardMoved { card_id, x, y, board_id } => {
            // Unknown board or card: silent no-op, expected under races
            // with concurrent deletes.
            let Some((x, y)) = services::card::apply_move(state, &board_id, card_id, x, y).await
            else {
                return vec![];
            };

            services::persistence::persist_move_fire_and_forget(state, card_id, x, y);
            services::board::broadcast(
                state,
                &board_id,
                &ServerEvent::CardUpdated { card_id, x, y },
                Some(client_id),
            )
            .await;
            vec![]
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match encode_event(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to encode outbound event");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
