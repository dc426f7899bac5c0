//! Daemon error taxonomy.
//!
//! [`WatchgateError`] is the central error type. Recoverable variants
//! (subscription failures, malformed client messages) are reported and leave
//! the process running; [`WatchgateError::Bind`] is fatal and carries the
//! port that could not be bound.

use std::path::PathBuf;

use crate::domain::WatchId;

/// Server-side error enum.
///
/// No variant ever propagates from one watch session or connection into
/// another; the per-session isolation of the registry is the enforcement
/// mechanism.
#[derive(Debug, thiserror::Error)]
pub enum WatchgateError {
    /// The configured watch root does not exist. Fatal to the watch
    /// capability only: every `start` is rejected, the listeners stay up.
    #[error("watch root does not exist: {}", .0.display())]
    WatchRootMissing(PathBuf),

    /// OS-level watch setup failed for a `start` command. Recoverable;
    /// reported to the requesting connection, no session is created.
    #[error("failed to subscribe filesystem watch: {0}")]
    Subscription(String),

    /// A client message could not be decoded or named an unknown action.
    /// Logged; the connection stays open.
    #[error("malformed client message: {0}")]
    MalformedMessage(String),

    /// A listener port could not be bound. Fatal to the process.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        /// The port that failed to bind.
        port: u16,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Registry insert collision (should never happen with UUID v4 ids).
    #[error("watch session {0} already registered")]
    SessionExists(WatchId),

    /// The connection's outbound queue is closed; the peer is gone.
    #[error("connection outbound queue closed")]
    ConnectionClosed,
}

impl From<notify::Error> for WatchgateError {
    fn from(err: notify::Error) -> Self {
        Self::Subscription(err.to_string())
    }
}
