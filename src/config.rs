//! Daemon configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The watch root may also be supplied
//! as the first CLI argument, which wins over the environment.

use std::path::PathBuf;

use anyhow::Context;

/// Top-level daemon configuration.
///
/// Loaded once at startup via [`DaemonConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory served over HTTP and watched for changes. Always absolute.
    pub watch_root: PathBuf,

    /// Port for the static file server.
    pub static_port: u16,

    /// Port for the WebSocket endpoint.
    pub socket_port: u16,

    /// Per-connection outbound queue depth.
    pub event_queue_capacity: usize,
}

impl DaemonConfig {
    /// Loads configuration from the environment, with `watch_arg` (the
    /// first CLI argument, if any) taking precedence for the watch root.
    ///
    /// Relative watch roots are resolved against the current working
    /// directory so later `chdir`-free path checks stay stable.
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable is set but unparseable,
    /// or when the current working directory cannot be determined.
    pub fn from_env(watch_arg: Option<String>) -> anyhow::Result<Self> {
        // Load .env if present; ignore if missing
        dotenvy::dotenv().ok();

        let raw_root = watch_arg
            .or_else(|| std::env::var("WATCH_PATH").ok())
            .unwrap_or_else(|| ".".to_string());
        let watch_root = PathBuf::from(raw_root);
        let watch_root = if watch_root.is_absolute() {
            watch_root
        } else {
            std::env::current_dir()
                .context("cannot resolve current working directory")?
                .join(watch_root)
        };

        Ok(Self {
            watch_root,
            static_port: parse_env("STATIC_PORT", 8080)?,
            socket_port: parse_env("SOCKET_PORT", 8090)?,
            event_queue_capacity: parse_env("EVENT_QUEUE_CAPACITY", 1024)?,
        })
    }
}

/// Reads an environment variable and parses it, falling back to `default`
/// when the variable is unset.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
