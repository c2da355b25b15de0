//! CloudBoard client agent — local board view, drag handling, and the
//! network runtime that keeps them synced with the session gateway.
//!
//! The sync and drag logic is headless: [`sync::SyncAgent`] owns the
//! rendered card set and consumes pointer input and server events as plain
//! values, so any frontend (or a test) can drive it. [`net::BoardClient`]
//! is the tokio-tungstenite runtime that wires an agent to a live server.

pub mod drag;
pub mod net;
pub mod rate_limit;
pub mod sync;
