//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the persistence collaborator and a map of live board states.
//! Each board is one owned unit: its card map, connected clients, and
//! session bookkeeping live behind the single `RwLock`, so the guarded
//! handle is the only writer for a board's cards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use frames::{Bounds, Card, ServerEvent};

use crate::services::persistence::PositionStore;

const DEFAULT_BOARD_WIDTH: f64 = 1600.0;
const DEFAULT_BOARD_HEIGHT: f64 = 1200.0;

/// Parse an environment variable, falling back to a default.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Board bounds from `BOARD_WIDTH` / `BOARD_HEIGHT`, applied to boards
/// materialized after startup.
#[must_use]
pub fn bounds_from_env() -> Bounds {
    Bounds::new(
        env_parse("BOARD_WIDTH", DEFAULT_BOARD_WIDTH),
        env_parse("BOARD_HEIGHT", DEFAULT_BOARD_HEIGHT),
    )
}

// =============================================================================
// SESSION
// =============================================================================

/// Per-session bookkeeping. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct SessionInfo {
    /// Last time the session sent anything; drives liveness eviction.
    pub last_seen: Instant,
}

impl SessionInfo {
    #[must_use]
    pub fn now() -> Self {
        Self { last_seen: Instant::now() }
    }
}

// =============================================================================
// BOARD STATE
// =============================================================================

/// Per-board live state. Resident while any client is connected or any
/// card exists; durable storage is the external collaborator's concern.
pub struct BoardState {
    /// Authoritative cards keyed by card ID.
    pub cards: HashMap<Uuid, Card>,
    /// Connected clients: `client_id` -> sender for outgoing events.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerEvent>>,
    /// Session bookkeeping, keyed like `clients`.
    pub sessions: HashMap<Uuid, SessionInfo>,
    /// Clamp rectangle for every committed position.
    pub bounds: Bounds,
    /// Next stacking order to allocate.
    pub next_z: i32,
}

impl BoardState {
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            cards: HashMap::new(),
            clients: HashMap::new(),
            sessions: HashMap::new(),
            bounds,
            next_z: 0,
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<RwLock<HashMap<String, BoardState>>>,
    /// Optional persistence collaborator. `None` if `PERSIST_BASE_URL`
    /// is not configured; moves then live only in memory.
    pub store: Option<Arc<dyn PositionStore>>,
    /// Bounds applied to boards created on first join.
    pub default_bounds: Bounds,
}

impl AppState {
    #[must_use]
    pub fn new(store: Option<Arc<dyn PositionStore>>, default_bounds: Bounds) -> Self {
        Self {
            boards: Arc::new(RwLock::new(HashMap::new())),
            store,
            default_bounds,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
