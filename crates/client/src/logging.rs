//! File logging for a client session.
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::ClientConfig;

/// Platform-specific log directory
///
/// - macOS: `~/Library/Caches/ghostfleet/logs`
/// - Linux: `~/.cache/ghostfleet/logs` (or `$XDG_CACHE_HOME/ghostfleet/logs`)
/// - Windows: `%LOCALAPPDATA%\ghostfleet\logs`
/// - Fallback: `/tmp/ghostfleet/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ghostfleet")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/ghostfleet"))
        .join("logs")
}

/// Installs a file-only subscriber; the prompt owns the terminal.
///
/// The returned guard flushes the writer when dropped, so keep it alive for
/// the whole session.
pub fn setup_logging(config: &ClientConfig) -> Result<WorkerGuard> {
    let session_id = config.session_id.clone().unwrap_or_else(|| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        format!("session_{timestamp}")
    });

    let session_log_dir = config.log_dir.clone().unwrap_or_else(log_dir).join(&session_id);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!(session = %session_id, "logging initialized");
    tracing::info!("Log file: {}/client.log", session_log_dir.display());

    Ok(guard)
}
