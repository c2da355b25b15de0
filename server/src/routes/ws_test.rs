use super::*;
use crate::services::persistence::{PersistError, PositionStore};
use crate::state::test_helpers;
use frames::Card;
use std::sync::{Arc, Mutex};
use tokio::time::timeout;

struct FailingStore {
    calls: Mutex<u32>,
}

#[async_trait::async_trait]
impl PositionStore for FailingStore {
    async fn update_card_position(&self, card_id: Uuid, _x: f64, _y: f64) -> Result<(), PersistError> {
        *self.calls.lock().unwrap() += 1;
        Err(PersistError::Rejected(card_id))
    }
}

async fn recv_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("event receive timed out")
        .expect("channel closed")
}

async fn assert_no_event(rx: &mut mpsc::Receiver<ServerEvent>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no event"
    );
}

/// A simulated session: dispatches inbound text the way the relay loop does.
struct TestSession {
    client_id: Uuid,
    current_board: Option<String>,
    tx: mpsc::Sender<ServerEvent>,
    rx: mpsc::Receiver<ServerEvent>,
}

impl TestSession {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(32);
        Self { client_id: Uuid::new_v4(), current_board: None, tx, rx }
    }

    async fn send(&mut self, state: &AppState, event: &ClientEvent) -> Vec<ServerEvent> {
        dispatch_event(
            state,
            &mut self.current_board,
            self.client_id,
            &self.tx,
            &encode_event(event).unwrap(),
        )
        .await
    }

    async fn join(&mut self, state: &AppState, board_id: &str) -> Vec<Card> {
        let replies = self
            .send(state, &ClientEvent::JoinBoard { board_id: board_id.to_owned() })
            .await;
        match replies.as_slice() {
            [ServerEvent::Snapshot(cards)] => cards.clone(),
            other => panic!("expected snapshot reply, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn join_replies_with_snapshot() {
    let state = test_helpers::test_app_state();
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut session = TestSession::new();
    let snapshot = session.join(&state, "b1").await;

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, card.id);
    assert_eq!(session.current_board.as_deref(), Some("b1"));
}

#[tokio::test]
async fn card_moved_broadcasts_to_peers_not_origin() {
    let state = test_helpers::test_app_state();
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut mover = TestSession::new();
    let mut peer = TestSession::new();
    mover.join(&state, "b1").await;
    peer.join(&state, "b1").await;

    // Drain presence events from the joins.
    recv_event(&mut mover.rx).await;
    recv_event(&mut mover.rx).await;
    recv_event(&mut peer.rx).await;

    let replies = mover
        .send(
            &state,
            &ClientEvent::CardMoved { card_id: card.id, x: 50.0, y: 60.0, board_id: "b1".into() },
        )
        .await;
    assert!(replies.is_empty());

    let event = recv_event(&mut peer.rx).await;
    assert_eq!(event, ServerEvent::CardUpdated { card_id: card.id, x: 50.0, y: 60.0 });
    assert_no_event(&mut mover.rx).await;
}

#[tokio::test]
async fn card_moved_is_clamped_before_broadcast() {
    let state = test_helpers::test_app_state();
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut mover = TestSession::new();
    let mut peer = TestSession::new();
    mover.join(&state, "b1").await;
    peer.join(&state, "b1").await;
    recv_event(&mut peer.rx).await;

    mover
        .send(
            &state,
            &ClientEvent::CardMoved { card_id: card.id, x: -50.0, y: 99999.0, board_id: "b1".into() },
        )
        .await;

    let event = recv_event(&mut peer.rx).await;
    assert_eq!(event, ServerEvent::CardUpdated { card_id: card.id, x: 0.0, y: 400.0 });
}

#[tokio::test]
async fn card_moved_for_removed_card_is_silent() {
    let state = test_helpers::test_app_state();
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut mover = TestSession::new();
    let mut peer = TestSession::new();
    mover.join(&state, "b1").await;
    peer.join(&state, "b1").await;
    recv_event(&mut peer.rx).await;

    services::card::remove_card(&state, "b1", card.id).await;

    let replies = mover
        .send(
            &state,
            &ClientEvent::CardMoved { card_id: card.id, x: 10.0, y: 10.0, board_id: "b1".into() },
        )
        .await;
    assert!(replies.is_empty());
    assert_no_event(&mut peer.rx).await;
}

#[tokio::test]
async fn persistence_failure_never_reverts_memory() {
    let store = Arc::new(FailingStore { calls: Mutex::new(0) });
    let state = test_helpers::test_app_state_with_store(store.clone());
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut mover = TestSession::new();
    mover.join(&state, "b1").await;
    mover
        .send(
            &state,
            &ClientEvent::CardMoved { card_id: card.id, x: 77.0, y: 88.0, board_id: "b1".into() },
        )
        .await;

    // Let the fire-and-forget task run and fail.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*store.calls.lock().unwrap(), 1);

    let boards = state.boards.read().await;
    let stored = boards.get("b1").unwrap().cards.get(&card.id).unwrap();
    assert!((stored.x - 77.0).abs() < f64::EPSILON);
    assert!((stored.y - 88.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn invalid_json_is_dropped() {
    let state = test_helpers::test_app_state();
    let mut current_board = None;
    let (tx, _rx) = mpsc::channel(8);

    let replies = dispatch_event(&state, &mut current_board, Uuid::new_v4(), &tx, "{not json").await;
    assert!(replies.is_empty());
    assert!(current_board.is_none());
}

#[tokio::test]
async fn sole_client_rejoin_snapshot_retains_cards() {
    let state = test_helpers::test_app_state();
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut session = TestSession::new();
    assert_eq!(session.join(&state, "b1").await.len(), 1);

    // Resync on the live connection: same board, fresh snapshot, same cards.
    let snapshot = session.join(&state, "b1").await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, card.id);
    assert_eq!(session.current_board.as_deref(), Some("b1"));
}

#[tokio::test]
async fn sole_client_reconnect_snapshot_retains_cards() {
    let state = test_helpers::test_app_state();
    let card = test_helpers::dummy_card("b1");
    test_helpers::seed_board_with_cards(&state, "b1", vec![card.clone()]).await;

    let mut first = TestSession::new();
    assert_eq!(first.join(&state, "b1").await.len(), 1);
    services::board::part_board(&state, "b1", first.client_id).await;

    let mut second = TestSession::new();
    let snapshot = second.join(&state, "b1").await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, card.id);
}

#[tokio::test]
async fn joining_a_second_board_parts_the_first() {
    let state = test_helpers::test_app_state();
    let mut session = TestSession::new();

    session.join(&state, "b1").await;
    session.join(&state, "b2").await;

    assert_eq!(session.current_board.as_deref(), Some("b2"));
    let boards = state.boards.read().await;
    assert!(!boards.contains_key("b1"), "b1 should be evicted after part");
    assert!(boards.contains_key("b2"));
}

#[tokio::test]
async fn leave_board_clears_membership() {
    let state = test_helpers::test_app_state();
    let mut session = TestSession::new();
    session.join(&state, "b1").await;

    let replies = session
        .send(&state, &ClientEvent::LeaveBoard { board_id: "b1".into() })
        .await;
    assert!(replies.is_empty());
    assert!(session.current_board.is_none());
    assert!(!state.boards.read().await.contains_key("b1"));
}

/// The canonical two-client sequence: A joins an empty board, creates a
/// card, B joins and snapshots it, A drags and releases, B sees the update.
#[tokio::test]
async fn two_client_create_and_drag_scenario() {
    let state = test_helpers::test_app_state();

    let mut a = TestSession::new();
    let snapshot = a.join(&state, "b1").await;
    assert!(snapshot.is_empty());

    let card = services::card::create_card(
        &state,
        "b1",
        "c1",
        serde_json::json!({}),
        10.0,
        10.0,
    )
    .await
    .unwrap();
    services::board::broadcast(&state, "b1", &ServerEvent::NewCard(card.clone()), None).await;

    let mut b = TestSession::new();
    let snapshot = b.join(&state, "b1").await;
    assert_eq!(snapshot.len(), 1);
    assert!((snapshot[0].x - 10.0).abs() < f64::EPSILON);
    assert!((snapshot[0].y - 10.0).abs() < f64::EPSILON);

    // Drain join/new-card noise from B's channel.
    while timeout(Duration::from_millis(50), b.rx.recv()).await.is_ok() {}

    a.send(
        &state,
        &ClientEvent::CardMoved { card_id: card.id, x: 50.0, y: 60.0, board_id: "b1".into() },
    )
    .await;

    let event = recv_event(&mut b.rx).await;
    assert_eq!(event, ServerEvent::CardUpdated { card_id: card.id, x: 50.0, y: 60.0 });
}
