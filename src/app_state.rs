//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::ws::engine::ProtocolEngine;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Protocol engine coordinating watch sessions across connections.
    pub engine: Arc<ProtocolEngine>,
}
