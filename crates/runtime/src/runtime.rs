//! High-level runtime orchestrator.
//!
//! The runtime owns the match worker, wires up command/event channels, and
//! exposes a builder-based API for clients to join a match.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{GameLedger, MatchId, WitnessProver};
use game_core::PlayerId;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::api::{MatchHandle, Result, RuntimeError};
use crate::events::{EventBus, MatchEvent, Topic};
use crate::reconcile::Match;
use crate::workers::{Command, MatchWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// How often the worker fetches the confirmed state from the ledger.
    pub poll_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            command_buffer_size: 32,
            poll_interval: Duration::from_millis(2_000),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `GHOSTFLEET_EVENT_BUFFER`
    /// - `GHOSTFLEET_COMMAND_BUFFER`
    /// - `GHOSTFLEET_POLL_INTERVAL_MS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("GHOSTFLEET_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>("GHOSTFLEET_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        if let Some(millis) = read_env::<u64>("GHOSTFLEET_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(millis.max(1));
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// Runtime of one joined match
///
/// Design: the runtime owns the worker and coordinates shutdown.
/// [`MatchHandle`] provides a cloneable façade for clients.
pub struct MatchRuntime {
    handle: MatchHandle,
    worker_handle: JoinHandle<()>,
}

impl MatchRuntime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> MatchHandle {
        self.handle.clone()
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<MatchEvent> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker stops once every outstanding [`MatchHandle`] is dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`MatchRuntime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    ledger: Option<Arc<dyn GameLedger>>,
    prover: Option<Arc<dyn WitnessProver>>,
    match_id: MatchId,
    viewer: PlayerId,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            ledger: None,
            prover: None,
            match_id: MatchId(0),
            viewer: PlayerId::default(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required ledger access
    pub fn ledger(mut self, ledger: Arc<dyn GameLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set required proof-witness collaborator
    pub fn prover(mut self, prover: Arc<dyn WitnessProver>) -> Self {
        self.prover = Some(prover);
        self
    }

    /// Match to join and the local player's address
    pub fn join(mut self, match_id: MatchId, viewer: PlayerId) -> Self {
        self.match_id = match_id;
        self.viewer = viewer;
        self
    }

    /// Fetch the first confirmed snapshot and start the worker
    pub async fn build(self) -> Result<MatchRuntime> {
        let ledger = self.ledger.ok_or(RuntimeError::MissingLedger)?;
        let prover = self.prover.ok_or(RuntimeError::MissingProver)?;

        // Subscribe before fetching so no notification falls in between.
        let ledger_rx = ledger.subscribe(self.match_id)?;
        let snapshot = ledger.fetch_confirmed_state(self.match_id, &self.viewer).await?;
        let game = Match::new(snapshot);

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = MatchHandle::new(command_tx, event_bus.clone());

        let worker = MatchWorker::new(
            game,
            ledger,
            prover,
            command_rx,
            ledger_rx,
            event_bus,
            self.config.poll_interval,
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(MatchRuntime { handle, worker_handle })
    }
}
