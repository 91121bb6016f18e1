//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use game_core::BoardDimensions;
use runtime::RuntimeConfig;

/// Configuration required to bootstrap a local match.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub runtime: RuntimeConfig,
    pub board: Option<BoardDimensions>,
    /// Artificial delay of the in-memory ledger, to watch predictions settle.
    pub ledger_latency: Option<Duration>,
    pub session_id: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `GHOSTFLEET_BOARD_ROWS` / `GHOSTFLEET_BOARD_COLS` - Board size (default: 7x7)
    /// - `GHOSTFLEET_LEDGER_LATENCY_MS` - Submission latency of the local ledger
    /// - `GHOSTFLEET_SESSION_ID` - Session identifier for log files (default: timestamp)
    /// - `GHOSTFLEET_LOG_DIR` - Directory for log files (default: platform cache dir)
    /// - everything [`RuntimeConfig::from_env`] reads
    pub fn from_env() -> Self {
        let mut config = Self {
            runtime: RuntimeConfig::from_env(),
            ..Self::default()
        };

        if let (Some(rows), Some(cols)) = (
            read_env::<u32>("GHOSTFLEET_BOARD_ROWS"),
            read_env::<u32>("GHOSTFLEET_BOARD_COLS"),
        ) {
            config.board = Some(BoardDimensions::new(rows.max(3), cols.max(3)));
        }

        config.ledger_latency = read_env::<u64>("GHOSTFLEET_LEDGER_LATENCY_MS").map(Duration::from_millis);
        config.session_id = env::var("GHOSTFLEET_SESSION_ID").ok();
        config.log_dir = env::var("GHOSTFLEET_LOG_DIR").ok().map(PathBuf::from);

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
