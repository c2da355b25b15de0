//! Connection runtime — wires a [`SyncAgent`] to a live session gateway.
//!
//! DESIGN
//! ======
//! One task owns the socket and pumps it both ways: inbound text frames are
//! decoded and applied to the shared agent, outbound client events arrive
//! over a channel. Callers interact with the agent through a lock and with
//! the wire through [`BoardClient::send`]; nothing here blocks on a peer.
//!
//! Reconnection is deliberately dumb: connect again and let the join
//! snapshot replace the local set wholesale. That single path is what
//! guarantees convergence after any number of missed broadcasts.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;

use frames::{Bounds, ClientEvent, decode_server_event, encode_event};

use crate::rate_limit::MoveGate;
use crate::sync::SyncAgent;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Codec(#[from] frames::CodecError),
    #[error("connection closed")]
    Closed,
}

/// A connected board client: shared sync agent plus the socket pump task.
pub struct BoardClient {
    agent: Arc<Mutex<SyncAgent>>,
    outbound: mpsc::Sender<Message>,
    pump: JoinHandle<()>,
}

impl BoardClient {
    /// Connect to the gateway, join `board_id`, and start pumping events
    /// into a fresh agent. The join snapshot arrives asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the websocket handshake or the initial
    /// `join-board` send fails.
    pub async fn connect(url: &str, board_id: &str, bounds: Bounds) -> Result<Self, NetError> {
        let (socket, _) = connect_async(url).await?;
        let (mut write, mut read) = socket.split();

        // The runtime owns agent construction, so the send cadence comes
        // from MOVE_SEND_INTERVAL_MS here rather than per call site.
        let agent = Arc::new(Mutex::new(
            SyncAgent::new(board_id, bounds).with_gate(MoveGate::from_env()),
        ));
        let (outbound, mut outbound_rx) = mpsc::channel::<Message>(64);

        let join = encode_event(&ClientEvent::JoinBoard { board_id: board_id.to_owned() })?;
        write.send(Message::Text(join.into())).await?;

        let pump_agent = agent.clone();
        let pump_outbound = outbound.clone();
        let pump = tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = read.next() => {
                        let Some(Ok(msg)) = msg else { break };
                        match msg {
                            Message::Text(text) => match decode_server_event(text.as_str()) {
                                Ok(event) => pump_agent.lock().await.apply(event),
                                Err(e) => warn!(error = %e, "dropping undecodable server event"),
                            },
                            Message::Ping(payload) => {
                                // Answer gateway liveness probes promptly.
                                let _ = pump_outbound.try_send(Message::Pong(payload));
                            }
                            Message::Close(_) => break,
                            _ => {}
                        }
                    }
                    Some(msg) = outbound_rx.recv() => {
                        if write.send(msg).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self { agent, outbound, pump })
    }

    /// Send one client event to the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Codec`] if the event cannot be encoded, or
    /// [`NetError::Closed`] if the pump task has shut down.
    pub async fn send(&self, event: &ClientEvent) -> Result<(), NetError> {
        let text = encode_event(event)?;
        self.outbound
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| NetError::Closed)
    }

    /// Re-send `join-board` on the live connection. The server replies with
    /// a fresh snapshot that replaces the local set wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Closed`] if the pump task has shut down.
    pub async fn rejoin(&self) -> Result<(), NetError> {
        let board_id = self.agent.lock().await.board_id().to_owned();
        self.send(&ClientEvent::JoinBoard { board_id }).await
    }

    /// Best-effort unsubscribe before dropping the connection.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Closed`] if the pump task has shut down.
    pub async fn leave(&self) -> Result<(), NetError> {
        let board_id = self.agent.lock().await.board_id().to_owned();
        self.send(&ClientEvent::LeaveBoard { board_id }).await
    }

    /// Run a closure against the shared agent.
    pub async fn with_agent<R>(&self, f: impl FnOnce(&mut SyncAgent) -> R) -> R {
        let mut agent = self.agent.lock().await;
        f(&mut agent)
    }
}

impl Drop for BoardClient {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
