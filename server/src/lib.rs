//! CloudBoard sync server — session gateway and board state store.
//!
//! Exposed as a library so integration tests (and the board client's test
//! harness) can assemble the router and drive it in-process.

pub mod routes;
pub mod services;
pub mod state;
