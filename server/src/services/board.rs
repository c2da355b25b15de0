//! Board service — rooms, presence, and event fan-out.
//!
//! DESIGN
//! ======
//! A board room materializes on first join. The snapshot returned from
//! `join_board` is the ground truth for late joiners; nothing waits on a
//! delta. Presence is the live client count and is re-broadcast after every
//! membership change. Cards outlive sessions: a board entry is evicted only
//! once it has neither clients nor cards, so a sole client's reconnect
//! snapshot still carries the full set. Cards leave memory by explicit
//! delete, nothing else.
//!
//! ERROR HANDLING
//! ==============
//! Leaving a room you are not in, or broadcasting into an empty or unknown
//! room, is a no-op. A member whose channel is full is skipped rather than
//! awaited; convergence after a dropped event is the reconnect snapshot's
//! job, not the broadcaster's.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use frames::{Card, ServerEvent};

use crate::state::{AppState, BoardState, SessionInfo, env_parse};

const DEFAULT_SESSION_IDLE_SECS: u64 = 60;

// =============================================================================
// JOIN / PART
// =============================================================================

/// Join a board room, materializing it if this is the first live session.
/// Returns the full current card snapshot (possibly empty) and broadcasts
/// the new presence count to every member, the joiner included.
pub async fn join_board(
    state: &AppState,
    board_id: &str,
    client_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
) -> Vec<Card> {
    let (snapshot, count) = {
        let mut boards = state.boards.write().await;
        let board_state = boards
            .entry(board_id.to_owned())
            .or_insert_with(|| BoardState::new(state.default_bounds));

        board_state.clients.insert(client_id, tx);
        board_state.sessions.insert(client_id, SessionInfo::now());

        let snapshot: Vec<Card> = board_state.cards.values().cloned().collect();
        (snapshot, board_state.clients.len())
    };

    info!(%board_id, %client_id, clients = count, "client joined board");
    broadcast_user_count(state, board_id, count).await;
    snapshot
}

/// Leave a board room. A no-op if the session was not a member. Broadcasts
/// the decremented presence count. The board entry is dropped only when the
/// last session leaves a board that also holds no cards; a board with cards
/// stays resident so the next join's snapshot is intact.
pub async fn part_board(state: &AppState, board_id: &str, client_id: Uuid) {
    let remaining = {
        let mut boards = state.boards.write().await;
        let Some(board_state) = boards.get_mut(board_id) else {
            return;
        };
        if board_state.clients.remove(&client_id).is_none() {
            return;
        }
        board_state.sessions.remove(&client_id);

        let remaining = board_state.clients.len();
        if remaining == 0 && board_state.cards.is_empty() {
            boards.remove(board_id);
            info!(%board_id, "evicted empty board from memory");
        }
        remaining
    };

    info!(%board_id, %client_id, remaining, "client left board");
    if remaining > 0 {
        broadcast_user_count(state, board_id, remaining).await;
    }
}

/// Refresh a session's last-seen timestamp. Unknown sessions are ignored.
pub async fn touch_session(state: &AppState, board_id: &str, client_id: Uuid) {
    let mut boards = state.boards.write().await;
    if let Some(board_state) = boards.get_mut(board_id)
        && let Some(session) = board_state.sessions.get_mut(&client_id)
    {
        session.last_seen = Instant::now();
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast an event to all clients in a board, optionally excluding one.
/// An empty or unknown room is a no-op.
pub async fn broadcast(state: &AppState, board_id: &str, event: &ServerEvent, exclude: Option<Uuid>) {
    let boards = state.boards.read().await;
    let Some(board_state) = boards.get(board_id) else {
        return;
    };

    for (client_id, tx) in &board_state.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(event.clone());
    }
}

async fn broadcast_user_count(state: &AppState, board_id: &str, count: usize) {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    broadcast(state, board_id, &ServerEvent::UserCount(count), None).await;
}

// =============================================================================
// LIVENESS
// =============================================================================

/// Spawn the background liveness sweep. Sessions whose last-seen timestamp
/// exceeds `SESSION_IDLE_SECS` are parted as if they had sent `leave-board`,
/// so a connection that died without one cannot leak presence.
pub fn spawn_liveness_sweep(state: AppState) -> JoinHandle<()> {
    let idle = Duration::from_secs(env_parse("SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS));
    info!(idle_secs = idle.as_secs(), "session liveness sweep configured");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(idle / 2);
        loop {
            interval.tick().await;
            sweep_idle_sessions(&state, idle).await;
        }
    })
}

/// Evict every session idle longer than `idle`. Returns how many were evicted.
pub async fn sweep_idle_sessions(state: &AppState, idle: Duration) -> usize {
    let now = Instant::now();
    let stale: Vec<(String, Uuid)> = {
        let boards = state.boards.read().await;
        boards
            .iter()
            .flat_map(|(board_id, board_state)| {
                board_state
                    .sessions
                    .iter()
                    .filter(|(_, session)| now.duration_since(session.last_seen) > idle)
                    .map(|(client_id, _)| (board_id.clone(), *client_id))
            })
            .collect()
    };

    for (board_id, client_id) in &stale {
        info!(%board_id, %client_id, "evicting idle session");
        part_board(state, board_id, *client_id).await;
    }
    stale.len()
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
