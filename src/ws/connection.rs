//! WebSocket connection adapter.
//!
//! Runs the read/write loop for a single connection, feeding inbound text
//! frames to the protocol engine and draining the connection's outbound
//! queue into the socket. Cleanup of the connection's sessions runs on
//! every exit path.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::engine::{ConnectionHandle, ProtocolEngine};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them to the engine.
/// - Forwards queued outbound messages (events, acknowledgements) to the
///   client in order.
///
/// When the loop exits — close frame, stream end, or send failure — every
/// watch session the connection owns is released.
pub async fn run_connection(socket: WebSocket, engine: Arc<ProtocolEngine>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (conn, mut outbound_rx) = ConnectionHandle::new(engine.queue_capacity());
    tracing::debug!(connection = %conn.id(), "ws connection opened");

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        engine.handle_message(&conn, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Outbound message queued by the engine or a session pump
            out = outbound_rx.recv() => {
                match out {
                    Some(message) => {
                        let json = serde_json::to_string(&message).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    // Unreachable while `conn` holds a sender; guards the loop anyway.
                    None => break,
                }
            }
        }
    }

    engine.handle_disconnect(conn.id()).await;
    tracing::debug!(connection = %conn.id(), "ws connection closed");
}
