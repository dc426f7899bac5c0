//! Watch-session protocol engine.
//!
//! Turns decoded client commands into registry operations and filesystem
//! change records into outbound wire messages. The engine is written
//! against a minimal outbound capability — each connection is a
//! [`ConnectionHandle`] wrapping an mpsc sender — so the WebSocket
//! transport stays a thin adapter and the engine is testable without a
//! socket.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{ClientCommand, ServerMessage};
use crate::domain::{ConnectionId, SessionRegistry, WatchId, WatchSession};
use crate::error::WatchgateError;
use crate::watcher::FsEventSource;

/// Outbound capability of one client connection.
///
/// Cloneable handle pairing the connection's identity with the sending
/// side of its outbound message queue. The transport adapter drains the
/// matching receiver into the socket, so everything pushed here reaches
/// the peer in order.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    /// Creates a handle for a new connection together with the receiver
    /// the transport adapter drains into the socket.
    #[must_use]
    pub fn new(queue_capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (outbound, rx) = mpsc::channel(queue_capacity);
        (
            Self {
                id: ConnectionId::new(),
                outbound,
            },
            rx,
        )
    }

    /// Returns the connection's identity.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns a clone of the outbound sender, for per-session pumps.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<ServerMessage> {
        self.outbound.clone()
    }

    /// Queues a message for delivery to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`WatchgateError::ConnectionClosed`] when the transport
    /// adapter has gone away.
    pub async fn send(&self, message: ServerMessage) -> Result<(), WatchgateError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| WatchgateError::ConnectionClosed)
    }
}

/// The watch-session protocol engine.
///
/// One instance per process, shared by every connection. Owns the session
/// registry and the fixed watch root.
#[derive(Debug)]
pub struct ProtocolEngine {
    registry: Arc<SessionRegistry>,
    watch_root: PathBuf,
    queue_capacity: usize,
}

impl ProtocolEngine {
    /// Creates the engine for the given registry and watch root.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, watch_root: PathBuf, queue_capacity: usize) -> Self {
        Self {
            registry,
            watch_root,
            queue_capacity,
        }
    }

    /// Returns the per-connection outbound queue capacity.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Decodes one inbound text frame and dispatches it.
    ///
    /// Unparseable frames and unknown actions are logged and otherwise
    /// ignored; the connection stays open either way.
    pub async fn handle_message(&self, conn: &ConnectionHandle, text: &str) {
        match serde_json::from_str::<ClientCommand>(text) {
            Ok(ClientCommand::Start) => {
                if let Err(err) = self.handle_start(conn).await {
                    tracing::warn!(connection = %conn.id(), error = %err, "start command failed");
                    let _ = conn.send(ServerMessage::watch_error(err.to_string())).await;
                }
            }
            Ok(ClientCommand::Stop { payload }) => {
                self.handle_stop(conn, payload.watch_id).await;
            }
            Err(err) => {
                let err = WatchgateError::MalformedMessage(err.to_string());
                tracing::warn!(connection = %conn.id(), error = %err, "ignoring client message");
            }
        }
    }

    /// Opens a new watch session for `conn`.
    ///
    /// Generates a fresh id, subscribes a new filesystem event source at
    /// the watch root, registers the session, and starts the pump that
    /// tags every change record with the id and queues it on `conn`. The
    /// session is enumerable in the registry before this returns. No
    /// message is sent to the client on success; the id first reaches the
    /// peer inside a `watch-data` frame.
    ///
    /// # Errors
    ///
    /// [`WatchgateError::WatchRootMissing`] when the watch root does not
    /// exist, [`WatchgateError::Subscription`] when the OS watch cannot be
    /// installed. No session is created on failure.
    pub async fn handle_start(&self, conn: &ConnectionHandle) -> Result<WatchId, WatchgateError> {
        if !self.watch_root.exists() {
            return Err(WatchgateError::WatchRootMissing(self.watch_root.clone()));
        }

        let watch_id = WatchId::new();
        let (tx, mut rx) = mpsc::channel(self.queue_capacity);
        let source = FsEventSource::subscribe(&self.watch_root, tx, self.queue_capacity)?;

        let outbound = conn.sender();
        let pump = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if outbound
                    .send(ServerMessage::watch_data(watch_id, record))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        let session = WatchSession::new(
            watch_id,
            self.watch_root.clone(),
            source,
            pump,
            conn.id(),
        );
        self.registry.insert(session).await?;

        tracing::info!(
            %watch_id,
            connection = %conn.id(),
            root = %self.watch_root.display(),
            "watch session started"
        );
        Ok(watch_id)
    }

    /// Stops the session with the given id.
    ///
    /// Unknown or already-stopped ids are a silent no-op. For a live
    /// session: removes it from the registry, awaits unsubscription, and
    /// queues exactly one `watch-stop` acknowledgement on `conn`. Once the
    /// acknowledgement is queued, no further `watch-data` for that id can
    /// follow it.
    pub async fn handle_stop(&self, conn: &ConnectionHandle, watch_id: WatchId) {
        let Some(session) = self.registry.remove(watch_id).await else {
            tracing::debug!(%watch_id, "stop for unknown watch session ignored");
            return;
        };
        session.release().await;

        if conn.send(ServerMessage::watch_stop(watch_id)).await.is_err() {
            tracing::debug!(%watch_id, "connection closed before stop acknowledgement");
        }
        tracing::info!(%watch_id, connection = %conn.id(), "watch session stopped");
    }

    /// Releases every session owned by a closed connection.
    ///
    /// Called by the transport adapter after the read/write loop exits, on
    /// every exit path, so a client disconnect never leaks watches.
    pub async fn handle_disconnect(&self, connection: ConnectionId) {
        let sessions = self.registry.remove_all_for(connection).await;
        if sessions.is_empty() {
            return;
        }
        tracing::info!(
            %connection,
            count = sessions.len(),
            "releasing watch sessions on disconnect"
        );
        for session in sessions {
            session.release().await;
        }
    }

    /// Drains the registry and releases every remaining session.
    ///
    /// Called once at process shutdown, before the listeners are released.
    pub async fn shutdown(&self) {
        let sessions = self.registry.drain().await;
        if sessions.is_empty() {
            return;
        }
        tracing::info!(count = sessions.len(), "releasing watch sessions on shutdown");
        for session in sessions {
            session.release().await;
        }
    }
}
