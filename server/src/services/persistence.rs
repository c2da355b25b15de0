//! Persistence collaborator — best-effort position writes over HTTP.
//!
//! DESIGN
//! ======
//! Durable storage is delegated to an external collaborator reached via
//! `POST <base>/update-card-position`. Calls are fire-and-forget: spawned
//! off the event path, unordered relative to each other, and never awaited
//! by a broadcast. A failed write is logged and dropped — the in-memory
//! value stays authoritative, because live broadcast state, not durable
//! storage, is the correctness target. A rapid burst of moves may persist
//! out of order; only the final in-memory position matters.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("collaborator returned status {0}")]
    Status(u16),
    #[error("collaborator rejected position update for card {0}")]
    Rejected(Uuid),
}

/// Seam for the external position store, so tests can substitute a mock
/// and the server can run with persistence disabled.
#[async_trait::async_trait]
pub trait PositionStore: Send + Sync {
    /// Persist one card position. Best-effort; the caller never retries.
    async fn update_card_position(&self, card_id: Uuid, x: f64, y: f64) -> Result<(), PersistError>;
}

// =============================================================================
// HTTP STORE
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCardPosition {
    card_id: Uuid,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct PersistAck {
    success: bool,
}

/// Position store backed by the collaborator's HTTP API.
pub struct HttpPositionStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPositionStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Build from `PERSIST_BASE_URL`. `None` if unset: the engine then runs
    /// with in-memory state only.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("PERSIST_BASE_URL").ok().map(Self::new)
    }
}

#[async_trait::async_trait]
impl PositionStore for HttpPositionStore {
    async fn update_card_position(&self, card_id: Uuid, x: f64, y: f64) -> Result<(), PersistError> {
        let url = format!("{}/update-card-position", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&UpdateCardPosition { card_id, x, y })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersistError::Status(status.as_u16()));
        }

        let ack: PersistAck = response.json().await?;
        if !ack.success {
            return Err(PersistError::Rejected(card_id));
        }
        Ok(())
    }
}

// =============================================================================
// FIRE AND FORGET
// =============================================================================

/// Spawn a fire-and-forget task to persist one move. Failure is logged only;
/// the in-memory position is never reverted.
pub fn persist_move_fire_and_forget(state: &AppState, card_id: Uuid, x: f64, y: f64) {
    let Some(store) = state.store.clone() else {
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = store.update_card_position(card_id, x, y).await {
            warn!(%card_id, error = %e, "position persist failed");
        }
    });
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
