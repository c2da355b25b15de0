//! Card service — authoritative in-memory mutations.
//!
//! DESIGN
//! ======
//! All card mutation happens under the board's guarded state, so the map
//! has a single serialized writer per board. Every committed position is
//! clamped to the board's bounds; out-of-range input is corrected, never
//! rejected. Unknown board or card ids are silent no-ops — expected under
//! concurrent delete/move races.

use serde_json::Value;
use uuid::Uuid;

use frames::Card;

use crate::state::AppState;

// =============================================================================
// CREATE
// =============================================================================

/// Create a card on a live board. Allocates the id and stacking order,
/// clamps the position, and returns the stored card for broadcast.
/// Returns `None` if the board has no live room.
pub async fn create_card(
    state: &AppState,
    board_id: &str,
    title: &str,
    content: Value,
    x: f64,
    y: f64,
) -> Option<Card> {
    let mut boards = state.boards.write().await;
    let board = boards.get_mut(board_id)?;

    let (x, y) = board.bounds.clamp(x, y);
    let card = Card {
        id: Uuid::new_v4(),
        board_id: board_id.to_owned(),
        x,
        y,
        title: title.to_owned(),
        content,
        z_index: board.next_z,
    };
    board.next_z += 1;

    let stored = card.clone();
    board.cards.insert(card.id, card);
    Some(stored)
}

// =============================================================================
// MOVE
// =============================================================================

/// Apply an authoritative move. Clamps to the board's bounds and overwrites
/// the map entry, returning the clamped position the caller should broadcast
/// and persist. Unknown board or card is a silent no-op.
pub async fn apply_move(
    state: &AppState,
    board_id: &str,
    card_id: Uuid,
    x: f64,
    y: f64,
) -> Option<(f64, f64)> {
    let mut boards = state.boards.write().await;
    let board = boards.get_mut(board_id)?;
    let (x, y) = board.bounds.clamp(x, y);

    let card = board.cards.get_mut(&card_id)?;
    card.x = x;
    card.y = y;
    Some((x, y))
}

// =============================================================================
// REMOVE
// =============================================================================

/// Remove a card. Idempotent: removing an absent id (or from an unknown
/// board) returns `false` without error.
pub async fn remove_card(state: &AppState, board_id: &str, card_id: Uuid) -> bool {
    let mut boards = state.boards.write().await;
    let Some(board) = boards.get_mut(board_id) else {
        return false;
    };
    board.cards.remove(&card_id).is_some()
}

#[cfg(test)]
#[path = "card_test.rs"]
mod tests;
