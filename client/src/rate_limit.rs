//! Outbound move gate.
//!
//! DESIGN
//! ======
//! Pointer-move events fire far faster than is useful to transmit. Local
//! rendering is never throttled; this gate caps only the outbound
//! `card-moved` rate during a drag. The default 33ms interval tracks a
//! 30fps send cadence. The release move bypasses the gate entirely — the
//! final position is always sent.

use std::time::{Duration, Instant};

const DEFAULT_MOVE_SEND_INTERVAL_MS: u64 = 33;

/// Minimum-interval gate for outbound position messages.
#[derive(Debug, Clone, Copy)]
pub struct MoveGate {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl MoveGate {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_sent: None }
    }

    /// Gate configured from `MOVE_SEND_INTERVAL_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        let ms = std::env::var("MOVE_SEND_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MOVE_SEND_INTERVAL_MS);
        Self::new(Duration::from_millis(ms))
    }

    /// Whether a send is allowed at `now`; records the send if so.
    pub fn allow(&mut self, now: Instant) -> bool {
        match self.last_sent {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_sent = Some(now);
                true
            }
        }
    }

    /// Forget the last send, so the next gesture starts with an open gate.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

impl Default for MoveGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MOVE_SEND_INTERVAL_MS))
    }
}
