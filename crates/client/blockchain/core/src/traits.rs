//! Ledger abstraction traits.
//!
//! This module defines a layered ledger abstraction:
//! - Layer 1: LedgerReader, LedgerNotifier, TransactionSubmitter, WitnessProver
//! - Layer 2: GameLedger (composite trait)

use async_trait::async_trait;
use game_core::PlayerId;
use tokio::sync::broadcast;

use crate::types::{ConfirmedSnapshot, LedgerEvent, MatchId, ProofBlob, Submission, TxOutcome, WitnessRequest};

// ============================================================================
// Error Types
// ============================================================================

/// Ledger access errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("{player} is not seated in {match_id}")]
    NotAPlayer { match_id: MatchId, player: PlayerId },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Backend-specific error: {0}")]
    BackendError(String),
}

/// Proof generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProverError {
    #[error("Invalid witness: {0}")]
    InvalidWitness(String),

    #[error("Prover backend error: {0}")]
    BackendError(String),
}

// ============================================================================
// Layer 1: Game Domain Traits
// ============================================================================

/// Read access to confirmed match state.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch the canonical confirmed snapshot of a match as `viewer` sees it.
    async fn fetch_confirmed_state(
        &self,
        match_id: MatchId,
        viewer: &PlayerId,
    ) -> Result<ConfirmedSnapshot, LedgerError>;
}

/// Push notifications for confirmed actions.
pub trait LedgerNotifier: Send + Sync {
    /// Subscribe to confirmed-action notifications of a match.
    fn subscribe(&self, match_id: MatchId) -> Result<broadcast::Receiver<LedgerEvent>, LedgerError>;
}

/// Transaction submission.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit an action and wait for the ledger's verdict.
    ///
    /// `Err` means the outcome is unknown (transport failure); callers treat
    /// it like [`TxOutcome::Failed`].
    async fn submit(&self, submission: Submission) -> Result<TxOutcome, LedgerError>;
}

/// Proof-witness collaborator for hidden-piece actions.
#[async_trait]
pub trait WitnessProver: Send + Sync {
    async fn prove(&self, request: WitnessRequest) -> Result<ProofBlob, ProverError>;
}

// ============================================================================
// Layer 2: Composite Trait
// ============================================================================

/// Everything the runtime needs from a ledger.
pub trait GameLedger: LedgerReader + LedgerNotifier + TransactionSubmitter + Send + Sync {
    /// Get the ledger name (e.g., "Sui", "InMemory").
    fn name(&self) -> &str;

    /// Get the network name (e.g., "mainnet", "testnet", "local").
    fn network(&self) -> &str;
}
