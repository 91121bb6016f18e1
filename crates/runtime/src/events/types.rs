//! Event types published by the match worker.

use game_core::{GameAction, GameState, SequenceNumber};
use serde::{Deserialize, Serialize};

use super::Topic;

/// Why a prediction was taken back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackCause {
    /// The ledger included the transaction and rejected it.
    Reverted { reason: String },
    /// The transaction never made it on-chain.
    Failed { reason: String },
}

impl RollbackCause {
    pub fn reason(&self) -> &str {
        match self {
            RollbackCause::Reverted { reason } | RollbackCause::Failed { reason } => reason,
        }
    }
}

/// Reconciliation outcomes, each carrying the predicted snapshot after it.
///
/// The `state` of every variant is what the player should see: confirmed
/// history with pending predictions folded on top. Ledger truth alone is
/// available through `MatchHandle::confirmed_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// The confirmed sequence number moved forward. `state` still includes
    /// predictions above the new confirmed sequence number.
    StateAdvanced {
        state: Box<GameState>,
        actions: Vec<GameAction>,
    },

    /// The ledger went back to an earlier sequence number. No prediction
    /// survives, so `state` is the confirmed view of the new history.
    StateRewinded {
        state: Box<GameState>,
        actions: Vec<GameAction>,
    },

    /// A local intent was accepted and is on its way to the ledger.
    ActionPredicted {
        action: GameAction,
        state: Box<GameState>,
    },

    /// A prediction was removed after its submission did not go through.
    ActionRolledBack {
        action: GameAction,
        cause: RollbackCause,
        state: Box<GameState>,
    },

    /// Held history contradicts the ledger; waiting for a resync.
    ConsistencyFault {
        sequence_number: SequenceNumber,
        detail: String,
    },

    /// History was rebuilt from a fresh confirmed snapshot.
    Resynced { state: Box<GameState> },
}

impl MatchEvent {
    pub fn topic(&self) -> Topic {
        match self {
            MatchEvent::StateAdvanced { .. } | MatchEvent::StateRewinded { .. } | MatchEvent::Resynced { .. } => {
                Topic::State
            }
            MatchEvent::ActionPredicted { .. } | MatchEvent::ActionRolledBack { .. } => Topic::Action,
            MatchEvent::ConsistencyFault { .. } => Topic::Fault,
        }
    }

    /// Predicted snapshot carried by the event, if any.
    pub fn state(&self) -> Option<&GameState> {
        match self {
            MatchEvent::StateAdvanced { state, .. }
            | MatchEvent::StateRewinded { state, .. }
            | MatchEvent::ActionPredicted { state, .. }
            | MatchEvent::ActionRolledBack { state, .. }
            | MatchEvent::Resynced { state } => Some(state),
            MatchEvent::ConsistencyFault { .. } => None,
        }
    }
}
