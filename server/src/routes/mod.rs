//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The sync engine exposes one WebSocket endpoint for board-scoped realtime
//! events and a small REST surface for card creation/deletion (mutations
//! that originate outside a drag gesture). Everything else — auth, admin
//! panels, asset uploads — belongs to the surrounding application, not this
//! subsystem.

pub mod cards;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route(
            "/api/boards/{board_id}/cards",
            axum::routing::post(cards::create_card),
        )
        .route(
            "/api/boards/{board_id}/cards/{card_id}",
            axum::routing::delete(cards::remove_card),
        )
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
