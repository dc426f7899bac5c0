//! Watch session aggregate and connection identity.
//!
//! A [`WatchSession`] ties a session id to the filesystem event source it
//! exclusively owns and to the connection that created it. The session is
//! the unit of teardown: releasing it stops event delivery and frees the
//! OS watch resources.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::WatchId;
use crate::watcher::FsEventSource;

/// Identifies one WebSocket connection for the lifetime of the process.
///
/// Used to scope cleanup: when a connection closes, every session it owns
/// is removed and unsubscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One active filesystem watch requested by a client.
///
/// Stored in the [`super::SessionRegistry`] keyed by `id`. The `source`
/// field exclusively owns the running filesystem watch; no two sessions
/// ever share a source, even when they watch the identical root.
#[derive(Debug)]
pub struct WatchSession {
    /// Unique session identifier (immutable after creation, never reused).
    pub id: WatchId,

    /// Absolute path being watched (fixed per process).
    pub root: PathBuf,

    /// Exclusively owned handle to the running filesystem event source.
    pub source: FsEventSource,

    /// Task forwarding tagged change records to the owning connection.
    pub pump: JoinHandle<()>,

    /// The connection that created this session.
    pub owner: ConnectionId,

    /// ISO-8601 creation timestamp (immutable after creation).
    pub started_at: DateTime<Utc>,
}

impl WatchSession {
    /// Creates a new `WatchSession` with the given source and owner.
    #[must_use]
    pub fn new(
        id: WatchId,
        root: PathBuf,
        source: FsEventSource,
        pump: JoinHandle<()>,
        owner: ConnectionId,
    ) -> Self {
        Self {
            id,
            root,
            source,
            pump,
            owner,
            started_at: Utc::now(),
        }
    }

    /// Tears the session down: unsubscribes the filesystem event source,
    /// then stops the forwarding pump.
    ///
    /// After this returns, no further change record for this session can
    /// be pushed to the owning connection. Messages already queued on the
    /// connection may still be delivered.
    pub async fn release(self) {
        let Self { source, pump, .. } = self;
        source.unsubscribe().await;
        pump.abort();
        let _ = pump.await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn connection_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn connection_id_display_is_uuid_format() {
        let id = ConnectionId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }
}
