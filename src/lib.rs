//! # watchgate
//!
//! Local daemon that serves a directory over HTTP while streaming
//! filesystem change events for that directory over a WebSocket session
//! protocol.
//!
//! Clients open a WebSocket connection and issue `start`/`stop` commands.
//! Each `start` creates an independent watch session with its own id;
//! change events are pushed back to the owning connection tagged with
//! that id, so one connection can multiplex any number of sessions.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── Static files + health (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── ProtocolEngine (ws/engine)
//!     │
//!     ├── SessionRegistry (domain/)
//!     └── FsEventSource (watcher/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod watcher;
pub mod ws;
