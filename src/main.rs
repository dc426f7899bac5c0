//! watchgate daemon entry point.
//!
//! Starts two Axum servers — one for static files and health, one for the
//! WebSocket watch protocol — and coordinates graceful shutdown between
//! them and the active watch sessions.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use watchgate::api;
use watchgate::app_state::AppState;
use watchgate::config::DaemonConfig;
use watchgate::domain::SessionRegistry;
use watchgate::error::WatchgateError;
use watchgate::ws::engine::ProtocolEngine;
use watchgate::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = DaemonConfig::from_env(std::env::args().nth(1))?;
    tracing::info!(
        root = %config.watch_root.display(),
        static_port = config.static_port,
        socket_port = config.socket_port,
        "starting watchgate"
    );

    if !config.watch_root.exists() {
        // Both listeners still come up; start commands report the error
        // per connection until the directory appears.
        let err = WatchgateError::WatchRootMissing(config.watch_root.clone());
        tracing::error!(error = %err, "watch root unavailable at startup");
    }

    // Build domain layer
    let registry = Arc::new(SessionRegistry::new());
    let engine = Arc::new(ProtocolEngine::new(
        registry,
        config.watch_root.clone(),
        config.event_queue_capacity,
    ));

    let app_state = AppState {
        engine: Arc::clone(&engine),
    };

    // WebSocket router
    let socket_app = Router::new()
        .route("/watch", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Static file + health router
    let static_app = api::build_router(&config.watch_root)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let static_listener = bind(config.static_port).await?;
    let socket_listener = bind(config.socket_port).await?;
    tracing::info!(port = config.static_port, "static server listening");
    tracing::info!(port = config.socket_port, "socket server listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    let static_server = tokio::spawn(serve(static_listener, static_app, shutdown_rx.clone()));
    let socket_server = tokio::spawn(serve(socket_listener, socket_app, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // Release every watch session before the listeners go away so no
    // OS watch outlives the protocol that owns it.
    engine.shutdown().await;
    let _ = shutdown_tx.send(());

    let drain = async {
        let _ = static_server.await;
        let _ = socket_server.await;
    };
    if tokio::time::timeout(Duration::from_secs(5), drain).await.is_err() {
        tracing::warn!("listeners did not drain in time, exiting anyway");
    }

    tracing::info!("watchgate stopped");
    Ok(())
}

/// Binds a listener on all interfaces at `port`.
async fn bind(port: u16) -> Result<TcpListener, WatchgateError> {
    TcpListener::bind(("0.0.0.0", port)).await.map_err(|source| {
        let err = WatchgateError::Bind { port, source };
        tracing::error!(error = %err, "cannot bind listener");
        err
    })
}

/// Runs one Axum server until the shutdown channel fires.
async fn serve(listener: TcpListener, app: Router, mut shutdown: tokio::sync::watch::Receiver<()>) {
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown.changed().await;
    });
    if let Err(err) = graceful.await {
        tracing::error!(error = %err, "server exited with error");
    }
}
