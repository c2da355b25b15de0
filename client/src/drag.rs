//! Drag interaction state machine.
//!
//! DESIGN
//! ======
//! A drag is a tagged state, `Idle` or `Dragging(DragTransaction)`, never a
//! boolean flag: one session cannot hold two transactions, and a stale
//! transaction is implicitly replaced when a new press arrives. The
//! transaction records the pointer-to-card offset captured at press time so
//! the card does not jump under the cursor.
//!
//! Pointer-up, pointer-leave, and pointer-cancel all end the gesture the
//! same way; a drag must never get stuck because the pointer left the board.

use uuid::Uuid;

use frames::Bounds;

/// A pointer position in board-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Ephemeral state for one click-to-release gesture. Lives only while the
/// pointer is down; never persisted, never sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTransaction {
    /// The card being dragged.
    pub card_id: Uuid,
    /// Originating pointer, so a second pointer cannot hijack the gesture.
    pub pointer_id: i32,
    /// Pointer-to-card offset captured at press time.
    pub offset: Point,
}

impl DragTransaction {
    /// Candidate card position for a pointer location, clamped to bounds.
    #[must_use]
    pub fn candidate(&self, pointer: Point, bounds: Bounds) -> (f64, f64) {
        bounds.clamp(pointer.x - self.offset.x, pointer.y - self.offset.y)
    }
}

/// The drag lifecycle: `Idle -> Dragging -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragTransaction),
}

impl DragState {
    /// Begin a gesture. Any in-flight transaction is cancelled and replaced.
    pub fn press(&mut self, card_id: Uuid, pointer_id: i32, pointer: Point, card_pos: Point) {
        *self = Self::Dragging(DragTransaction {
            card_id,
            pointer_id,
            offset: Point::new(pointer.x - card_pos.x, pointer.y - card_pos.y),
        });
    }

    /// End the gesture, returning the finished transaction if one was live.
    pub fn release(&mut self) -> Option<DragTransaction> {
        match std::mem::take(self) {
            Self::Dragging(txn) => Some(txn),
            Self::Idle => None,
        }
    }

    /// The transaction, if a drag is in progress.
    #[must_use]
    pub fn transaction(&self) -> Option<&DragTransaction> {
        match self {
            Self::Dragging(txn) => Some(txn),
            Self::Idle => None,
        }
    }

    /// Whether `card_id` is held by an in-progress local drag.
    #[must_use]
    pub fn is_dragging(&self, card_id: Uuid) -> bool {
        matches!(self, Self::Dragging(txn) if txn.card_id == card_id)
    }
}

#[cfg(test)]
#[path = "drag_test.rs"]
mod tests;
