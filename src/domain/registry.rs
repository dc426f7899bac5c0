//! Concurrent watch-session storage.
//!
//! [`SessionRegistry`] stores every active session in a
//! `RwLock<HashMap<WatchId, WatchSession>>`. Removal operations hand the
//! owned [`WatchSession`] back to the caller, so unsubscription always
//! follows removal: an id present in the map always points at a live,
//! subscribed source, and a removed id can never be observed again.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::session::{ConnectionId, WatchSession};
use super::watch_id::WatchId;
use crate::error::WatchgateError;

/// Central store for all active watch sessions, shared across connections.
///
/// # Concurrency
///
/// The map is the single shared mutable structure in the daemon. The
/// `RwLock` serializes `insert` / `remove` / `remove_all_for` / `drain`
/// against each other; event delivery never takes the lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<WatchId, WatchSession>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new session keyed by its id.
    ///
    /// # Errors
    ///
    /// Returns [`WatchgateError::SessionExists`] if a session with the same
    /// id is already present (cannot happen with v4 id generation).
    pub async fn insert(&self, session: WatchSession) -> Result<WatchId, WatchgateError> {
        let id = session.id;
        let mut map = self.sessions.write().await;
        if map.contains_key(&id) {
            return Err(WatchgateError::SessionExists(id));
        }
        map.insert(id, session);
        Ok(id)
    }

    /// Returns `true` if a session with the given id is active.
    pub async fn contains(&self, id: WatchId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Removes a session, returning it for teardown, or `None` if the id
    /// is absent (stopping an unknown session is a no-op, not an error).
    pub async fn remove(&self, id: WatchId) -> Option<WatchSession> {
        self.sessions.write().await.remove(&id)
    }

    /// Removes every session owned by the given connection, returning them
    /// for teardown. Used when a connection closes so that a disconnect
    /// never leaks watches.
    pub async fn remove_all_for(&self, owner: ConnectionId) -> Vec<WatchSession> {
        let mut map = self.sessions.write().await;
        let ids: Vec<WatchId> = map
            .iter()
            .filter(|(_, session)| session.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter().filter_map(|id| map.remove(&id)).collect()
    }

    /// Removes and returns every session. Used at process shutdown so each
    /// remaining source can be unsubscribed before exit.
    pub async fn drain(&self) -> Vec<WatchSession> {
        let mut map = self.sessions.write().await;
        map.drain().map(|(_, session)| session).collect()
    }

    /// Returns the number of active sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is active.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::watcher::FsEventSource;
    use tokio::sync::mpsc;

    async fn make_session(owner: ConnectionId, root: &std::path::Path) -> WatchSession {
        let (tx, _rx) = mpsc::channel(8);
        let Ok(source) = FsEventSource::subscribe(root, tx, 8) else {
            panic!("subscribe failed on existing directory");
        };
        let pump = tokio::spawn(async {});
        WatchSession::new(WatchId::new(), root.to_path_buf(), source, pump, owner)
    }

    #[tokio::test]
    async fn insert_and_contains() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let registry = SessionRegistry::new();
        let session = make_session(ConnectionId::new(), dir.path()).await;
        let id = session.id;

        let inserted = registry.insert(session).await;
        assert!(inserted.is_ok());
        assert!(registry.contains(id).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn insert_duplicate_id_fails() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let registry = SessionRegistry::new();
        let first = make_session(ConnectionId::new(), dir.path()).await;
        let id = first.id;
        let mut second = make_session(ConnectionId::new(), dir.path()).await;
        second.id = id;

        let _ = registry.insert(first).await;
        let result = registry.insert(second).await;
        assert!(matches!(result, Err(WatchgateError::SessionExists(_))));
    }

    #[tokio::test]
    async fn remove_returns_session() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let registry = SessionRegistry::new();
        let session = make_session(ConnectionId::new(), dir.path()).await;
        let id = session.id;
        let _ = registry.insert(session).await;

        let removed = registry.remove(id).await;
        assert!(removed.is_some());
        assert!(!registry.contains(id).await);

        if let Some(session) = removed {
            session.release().await;
        }
    }

    #[tokio::test]
    async fn remove_absent_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.remove(WatchId::new()).await.is_none());
    }

    #[tokio::test]
    async fn remove_all_for_scopes_to_owner() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let registry = SessionRegistry::new();
        let owner_a = ConnectionId::new();
        let owner_b = ConnectionId::new();

        let _ = registry.insert(make_session(owner_a, dir.path()).await).await;
        let _ = registry.insert(make_session(owner_a, dir.path()).await).await;
        let kept = make_session(owner_b, dir.path()).await;
        let kept_id = kept.id;
        let _ = registry.insert(kept).await;

        let removed = registry.remove_all_for(owner_a).await;
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len().await, 1);
        assert!(registry.contains(kept_id).await);

        for session in removed {
            session.release().await;
        }
    }

    #[tokio::test]
    async fn drain_empties_the_registry() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let registry = SessionRegistry::new();
        let _ = registry
            .insert(make_session(ConnectionId::new(), dir.path()).await)
            .await;
        let _ = registry
            .insert(make_session(ConnectionId::new(), dir.path()).await)
            .await;

        let drained = registry.drain().await;
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty().await);

        for session in drained {
            session.release().await;
        }
    }
}
