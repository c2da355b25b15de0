//! Card REST routes — create and delete.
//!
//! Cards are created and removed by explicit actions outside the drag
//! gesture (the board page posts them), so they ride REST rather than the
//! realtime socket. Both mutations broadcast to the board room so every
//! live client updates synchronously.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use frames::{Card, ServerEvent};

use crate::services;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardBody {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// `POST /api/boards/:board_id/cards` — create one card and broadcast
/// `new-card` to the room.
pub async fn create_card(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Json(body): Json<CreateCardBody>,
) -> Result<(StatusCode, Json<Card>), StatusCode> {
    let title = body.title.unwrap_or_else(|| "Untitled".to_owned());
    let content = body.content.unwrap_or_else(|| serde_json::json!({}));

    let card = services::card::create_card(
        &state,
        &board_id,
        &title,
        content,
        body.x.unwrap_or(0.0),
        body.y.unwrap_or(0.0),
    )
    .await
    .ok_or(StatusCode::NOT_FOUND)?;

    services::board::broadcast(&state, &board_id, &ServerEvent::NewCard(card.clone()), None).await;
    Ok((StatusCode::CREATED, Json(card)))
}

/// `DELETE /api/boards/:board_id/cards/:card_id` — remove one card.
/// Idempotent: deleting an absent card still returns 204.
pub async fn remove_card(
    State(state): State<AppState>,
    Path((board_id, card_id)): Path<(String, Uuid)>,
) -> StatusCode {
    let removed = services::card::remove_card(&state, &board_id, card_id).await;
    if removed {
        services::board::broadcast(&state, &board_id, &ServerEvent::CardRemoved { card_id }, None)
            .await;
    }
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[path = "cards_test.rs"]
mod tests;
