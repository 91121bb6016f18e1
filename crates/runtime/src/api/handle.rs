//! Cloneable façade for issuing commands to a match worker.
//!
//! [`MatchHandle`] hides channel plumbing and offers async helpers for
//! submitting intents, reading both snapshots, or streaming events from
//! specific topics.
use std::collections::HashMap;

use game_core::{Cell, Discrepancy, GameAction, GameState, Intent, PieceId, PieceType};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{EventBus, MatchEvent, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with a running match
#[derive(Clone)]
pub struct MatchHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl MatchHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Validate an intent against the predicted snapshot, append it as a
    /// prediction and submit it. Returns the predicted log entry.
    pub async fn submit_intent(&self, intent: Intent) -> Result<GameAction> {
        self.request(|reply| Command::Intent { intent, reply }).await?
    }

    pub async fn summon(&self, piece_type: PieceType, cell: Cell) -> Result<GameAction> {
        self.submit_intent(Intent::Summon { piece_type, cell }).await
    }

    pub async fn move_piece(&self, piece_id: PieceId, to: Cell) -> Result<GameAction> {
        self.submit_intent(Intent::Move { piece_id, to }).await
    }

    pub async fn attack(&self, attacker_id: PieceId, target_id: PieceId) -> Result<GameAction> {
        self.submit_intent(Intent::Attack {
            attacker_id,
            target_id,
        })
        .await
    }

    pub async fn end_turn(&self) -> Result<GameAction> {
        self.submit_intent(Intent::EndTurn).await
    }

    /// Fetch the confirmed state from the ledger now and reconcile with it.
    pub async fn refresh(&self) -> Result<()> {
        self.request(|reply| Command::Refresh { reply }).await?
    }

    /// Snapshot made of confirmed actions only
    pub async fn confirmed_state(&self) -> Result<GameState> {
        self.request(|reply| Command::QueryConfirmed { reply }).await
    }

    /// Snapshot including every pending prediction
    pub async fn latest_state(&self) -> Result<GameState> {
        self.request(|reply| Command::QueryLatest { reply }).await
    }

    /// Action log entries above the last adopted confirmed snapshot
    pub async fn actions(&self) -> Result<Vec<GameAction>> {
        self.request(|reply| Command::QueryActions { reply }).await
    }

    pub async fn discrepancies(&self) -> Result<Vec<Discrepancy>> {
        self.request(|reply| Command::QueryDiscrepancies { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::State` - confirmed state advanced, rewound or resynced
    /// - `Topic::Action` - predictions and rollbacks
    /// - `Topic::Fault` - consistency faults
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<MatchEvent> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<MatchEvent>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
