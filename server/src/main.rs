use std::sync::Arc;

use server::services::persistence::HttpPositionStore;
use server::{routes, services, state};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    // Persistence collaborator (non-fatal: moves stay in memory if unset).
    let store = match HttpPositionStore::from_env() {
        Some(store) => {
            tracing::info!("position persistence collaborator configured");
            Some(Arc::new(store) as Arc<dyn services::persistence::PositionStore>)
        }
        None => {
            tracing::warn!("PERSIST_BASE_URL not set — positions are in-memory only");
            None
        }
    };

    let app_state = state::AppState::new(store, state::bounds_from_env());

    // Evict sessions whose connections died without a leave-board.
    let _liveness = services::board::spawn_liveness_sweep(app_state.clone());

    let app = routes::app(app_state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "cloudboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
