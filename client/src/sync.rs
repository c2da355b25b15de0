//! Client sync agent — the locally rendered card set for one board.
//!
//! DESIGN
//! ======
//! The agent owns the rendered cards and reconciles two inputs:
//!
//! - Local pointer input, applied optimistically at full input rate. The
//!   server confirms nothing per-move; a locally in-progress drag always
//!   wins on this client.
//! - Remote broadcasts, applied in arrival order (transport-level
//!   last-writer-wins, no merge). An update for a card held by a local
//!   drag is discarded — the drag's release will overwrite it anyway.
//!
//! Convergence after lost messages is not this agent's job: every join
//! reply carries a full snapshot, and [`SyncAgent::apply`] replaces the
//! local set wholesale when one arrives.

use std::collections::HashMap;
use std::time::Instant;

use uuid::Uuid;

use frames::{Bounds, Card, ClientEvent, ServerEvent};

use crate::drag::{DragState, Point};
use crate::rate_limit::MoveGate;

pub struct SyncAgent {
    board_id: String,
    bounds: Bounds,
    cards: HashMap<Uuid, Card>,
    drag: DragState,
    gate: MoveGate,
    user_count: u32,
}

impl SyncAgent {
    #[must_use]
    pub fn new(board_id: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            board_id: board_id.into(),
            bounds,
            cards: HashMap::new(),
            drag: DragState::Idle,
            gate: MoveGate::default(),
            user_count: 0,
        }
    }

    #[must_use]
    pub fn with_gate(mut self, gate: MoveGate) -> Self {
        self.gate = gate;
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    #[must_use]
    pub fn card(&self, card_id: Uuid) -> Option<&Card> {
        self.cards.get(&card_id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn user_count(&self) -> u32 {
        self.user_count
    }

    #[must_use]
    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    // =========================================================================
    // REMOTE EVENTS
    // =========================================================================

    /// Apply one server event to the rendered set.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Snapshot(cards) => {
                // Ground truth replaces everything we cached.
                self.cards = cards.into_iter().map(|card| (card.id, card)).collect();
                if let Some(txn) = self.drag.transaction()
                    && !self.cards.contains_key(&txn.card_id)
                {
                    self.drag = DragState::Idle;
                }
            }
            ServerEvent::CardUpdated { card_id, x, y } => {
                // A local in-progress drag wins; the incoming update is
                // discarded, not deferred.
                if self.drag.is_dragging(card_id) {
                    return;
                }
                if let Some(card) = self.cards.get_mut(&card_id) {
                    card.x = x;
                    card.y = y;
                }
            }
            ServerEvent::NewCard(card) => {
                self.cards.insert(card.id, card);
            }
            ServerEvent::CardRemoved { card_id } => {
                self.cards.remove(&card_id);
                if self.drag.is_dragging(card_id) {
                    self.drag = DragState::Idle;
                }
            }
            ServerEvent::UserCount(count) => {
                self.user_count = count;
            }
        }
    }

    // =========================================================================
    // POINTER INPUT
    // =========================================================================

    /// Pointer-down on a card's drag handle. Returns false for unknown
    /// cards (e.g. removed out from under the pointer).
    pub fn press(&mut self, card_id: Uuid, pointer_id: i32, pointer: Point) -> bool {
        let Some(card) = self.cards.get(&card_id) else {
            return false;
        };
        let card_pos = Point::new(card.x, card.y);
        self.drag.press(card_id, pointer_id, pointer, card_pos);
        self.gate.reset();
        true
    }

    /// Pointer-move while dragging. The local position updates at full
    /// input rate; the returned `card-moved`, when present, passed the
    /// outbound gate and should be sent.
    pub fn movement(&mut self, pointer: Point, now: Instant) -> Option<ClientEvent> {
        let txn = *self.drag.transaction()?;
        let (x, y) = txn.candidate(pointer, self.bounds);

        if let Some(card) = self.cards.get_mut(&txn.card_id) {
            card.x = x;
            card.y = y;
        }

        if !self.gate.allow(now) {
            return None;
        }
        Some(self.move_event(txn.card_id, x, y))
    }

    /// Pointer-up, pointer-leave, or pointer-cancel: all end the gesture
    /// identically. The final clamped position is applied locally and
    /// always returned for sending — the authoritative move bypasses the
    /// gate so peers see the result promptly.
    pub fn release(&mut self, pointer: Point) -> Option<ClientEvent> {
        let txn = self.drag.release()?;
        self.gate.reset();

        let (x, y) = txn.candidate(pointer, self.bounds);
        if let Some(card) = self.cards.get_mut(&txn.card_id) {
            card.x = x;
            card.y = y;
        }
        Some(self.move_event(txn.card_id, x, y))
    }

    fn move_event(&self, card_id: Uuid, x: f64, y: f64) -> ClientEvent {
        ClientEvent::CardMoved { card_id, x, y, board_id: self.board_id.clone() }
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
