//! Filesystem event source backed by the `notify` crate.
//!
//! [`FsEventSource`] installs a recursive OS-level watch on a directory and
//! forwards every change as a [`ChangeRecord`] into a caller-provided
//! channel. The `notify` callback runs on the watcher's own thread, so
//! records cross into the async world via `blocking_send`.

use std::fmt;
use std::path::{Path, PathBuf};

use notify::{EventKind, RecursiveMode, Watcher, recommended_watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::WatchgateError;

/// Coarse classification of a filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A file or directory was created.
    Created,
    /// A file or directory was modified (content or metadata).
    Modified,
    /// A file or directory was removed.
    Removed,
    /// Any other change reported by the OS backend.
    Other,
}

/// One filesystem change: the affected path and what happened to it.
///
/// This is the opaque payload of a `watch-data` wire message; the protocol
/// engine forwards it verbatim and never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// What happened.
    pub action: ChangeKind,
    /// The affected path.
    pub path: PathBuf,
}

impl ChangeRecord {
    /// Expands a raw `notify` event into one record per affected path.
    fn from_event(event: &notify::Event) -> Vec<Self> {
        let action = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            _ => ChangeKind::Other,
        };
        event
            .paths
            .iter()
            .map(|path| Self {
                action,
                path: path.clone(),
            })
            .collect()
    }
}

/// A running OS-level filesystem watch on one directory tree.
///
/// Exclusively owned by a single watch session. Dropping or
/// [`unsubscribing`](FsEventSource::unsubscribe) the source stops event
/// delivery and frees the OS watch resources.
pub struct FsEventSource {
    watcher: notify::RecommendedWatcher,
    forward: JoinHandle<()>,
}

impl FsEventSource {
    /// Installs a recursive watch on `root` and starts forwarding change
    /// records into `sink`.
    ///
    /// `capacity` bounds the internal channel between the watcher thread
    /// and the async forwarding task.
    ///
    /// # Errors
    ///
    /// Returns [`WatchgateError::Subscription`] when the OS watch cannot be
    /// installed (missing path, watch limit reached). Nothing is installed
    /// on failure.
    pub fn subscribe(
        root: &Path,
        sink: mpsc::Sender<ChangeRecord>,
        capacity: usize,
    ) -> Result<Self, WatchgateError> {
        let (tx, mut rx) = mpsc::channel::<notify::Result<notify::Event>>(capacity);

        let mut watcher = recommended_watcher(move |event| {
            // The callback runs on the notify thread, not the runtime.
            let _ = tx.blocking_send(event);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let forward = tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                match result {
                    Ok(event) => {
                        for record in ChangeRecord::from_event(&event) {
                            if sink.send(record).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "filesystem watch backend error");
                    }
                }
            }
        });

        Ok(Self { watcher, forward })
    }

    /// Stops the OS watch and the forwarding task.
    ///
    /// Suspends until the forwarding task has terminated; afterwards no
    /// further record can reach the sink from this source.
    pub async fn unsubscribe(self) {
        let Self { watcher, forward } = self;
        drop(watcher);
        forward.abort();
        let _ = forward.await;
    }
}

impl fmt::Debug for FsEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsEventSource").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn subscribe_missing_root_fails() {
        let (tx, _rx) = mpsc::channel(8);
        let result = FsEventSource::subscribe(Path::new("/nonexistent/watchgate-test"), tx, 8);
        assert!(matches!(result, Err(WatchgateError::Subscription(_))));
    }

    #[tokio::test]
    async fn file_creation_is_reported() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let (tx, mut rx) = mpsc::channel(8);
        let Ok(source) = FsEventSource::subscribe(dir.path(), tx, 8) else {
            panic!("subscribe failed");
        };

        let file = dir.path().join("hello.txt");
        let Ok(()) = std::fs::write(&file, b"hi") else {
            panic!("write failed");
        };

        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        let Ok(Some(record)) = received else {
            panic!("no change record within timeout");
        };
        assert_eq!(record.path, file);
        assert!(matches!(
            record.action,
            ChangeKind::Created | ChangeKind::Modified
        ));

        source.unsubscribe().await;
    }

    #[tokio::test]
    async fn unsubscribe_closes_the_sink() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let (tx, mut rx) = mpsc::channel(8);
        let Ok(source) = FsEventSource::subscribe(dir.path(), tx, 8) else {
            panic!("subscribe failed");
        };

        source.unsubscribe().await;

        // All senders are gone once the forward task stops; the drained
        // channel must end rather than block.
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok());
    }

    #[test]
    fn change_record_expands_multi_path_events() {
        let event = notify::Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(PathBuf::from("/a"))
            .add_path(PathBuf::from("/b"));
        let records = ChangeRecord::from_event(&event);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.action == ChangeKind::Created));
    }

    #[test]
    fn change_record_serializes_action_lowercase() {
        let record = ChangeRecord {
            action: ChangeKind::Removed,
            path: PathBuf::from("/tmp/x"),
        };
        let Ok(json) = serde_json::to_value(&record) else {
            panic!("serialization failed");
        };
        assert_eq!(json["action"], "removed");
        assert_eq!(json["path"], "/tmp/x");
    }
}
