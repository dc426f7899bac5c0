//! WebSocket layer: the watch-session protocol.
//!
//! The endpoint at `/watch` accepts `start`/`stop` commands and pushes
//! filesystem change events back to the originating connection, tagged by
//! session id.

pub mod connection;
pub mod engine;
pub mod handler;
pub mod messages;
