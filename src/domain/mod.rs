//! Domain layer: session identity and the session registry.
//!
//! This module contains the server-side domain model: the watch-session
//! identifier, the session aggregate owning its filesystem event source,
//! and the registry tracking every active session per process.

pub mod registry;
pub mod session;
pub mod watch_id;

pub use registry::SessionRegistry;
pub use session::{ConnectionId, WatchSession};
pub use watch_id::WatchId;
