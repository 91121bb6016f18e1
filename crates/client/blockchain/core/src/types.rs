//! Common types for ledger interactions.

use std::fmt;

use game_core::{
    ActionKind, AttackAction, BoardDimensions, Cell, EndTurnAction, GameAction, GameState, MoveAction, Salt,
    SequenceNumber, SummonAction, WitnessKind, WitnessPlan,
};
use serde::{Deserialize, Serialize};

/// Ledger identifier of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// Generic transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Vec<u8>);

impl TransactionId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Canonical confirmed state of a match, as seen by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedSnapshot {
    pub match_id: MatchId,
    pub state: GameState,
}

impl ConfirmedSnapshot {
    pub fn sequence_number(&self) -> SequenceNumber {
        self.state.sequence_number
    }
}

/// Opaque proof attached to a hidden-piece action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBlob(pub Vec<u8>);

impl ProofBlob {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inputs handed to the proof-witness collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessRequest {
    pub kind: WitnessKind,
    pub from: Cell,
    pub to: Cell,
    pub salts: Vec<Salt>,
    pub distance: u32,
    pub dimensions: BoardDimensions,
}

impl From<WitnessPlan> for WitnessRequest {
    fn from(plan: WitnessPlan) -> Self {
        Self {
            kind: plan.kind,
            from: plan.from,
            to: plan.to,
            salts: plan.salts,
            distance: plan.distance,
            dimensions: plan.dimensions,
        }
    }
}

/// A predicted action on its way to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub match_id: MatchId,
    /// Provisional sequence number the client predicted for this action.
    pub sequence_number: SequenceNumber,
    pub action: ActionKind,
    pub proof: Option<ProofBlob>,
}

/// Final word of the ledger on a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    /// Included; the ledger assigned `sequence_number`.
    Confirmed {
        transaction_id: TransactionId,
        sequence_number: SequenceNumber,
    },
    /// Included but rejected by the game contract.
    Reverted { reason: String },
    /// Never made it on-chain.
    Failed { reason: String },
}

impl TxOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxOutcome::Confirmed { .. })
    }
}

/// Confirmed-action notification pushed by the ledger.
///
/// Each variant carries the same payload as the matching [`GameAction`]
/// variant, stripped of anything only the acting player knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    DidSummon {
        match_id: MatchId,
        sequence_number: SequenceNumber,
        action: SummonAction,
    },
    DidMove {
        match_id: MatchId,
        sequence_number: SequenceNumber,
        action: MoveAction,
    },
    DidAttack {
        match_id: MatchId,
        sequence_number: SequenceNumber,
        action: AttackAction,
    },
    DidEndTurn {
        match_id: MatchId,
        sequence_number: SequenceNumber,
        action: EndTurnAction,
    },
}

impl LedgerEvent {
    pub fn new(match_id: MatchId, sequence_number: SequenceNumber, kind: ActionKind) -> Self {
        match kind {
            ActionKind::Summon(action) => LedgerEvent::DidSummon {
                match_id,
                sequence_number,
                action,
            },
            ActionKind::Move(action) => LedgerEvent::DidMove {
                match_id,
                sequence_number,
                action,
            },
            ActionKind::Attack(action) => LedgerEvent::DidAttack {
                match_id,
                sequence_number,
                action,
            },
            ActionKind::EndTurn(action) => LedgerEvent::DidEndTurn {
                match_id,
                sequence_number,
                action,
            },
        }
    }

    pub fn match_id(&self) -> MatchId {
        match self {
            LedgerEvent::DidSummon { match_id, .. }
            | LedgerEvent::DidMove { match_id, .. }
            | LedgerEvent::DidAttack { match_id, .. }
            | LedgerEvent::DidEndTurn { match_id, .. } => *match_id,
        }
    }

    pub fn sequence_number(&self) -> SequenceNumber {
        match self {
            LedgerEvent::DidSummon { sequence_number, .. }
            | LedgerEvent::DidMove { sequence_number, .. }
            | LedgerEvent::DidAttack { sequence_number, .. }
            | LedgerEvent::DidEndTurn { sequence_number, .. } => *sequence_number,
        }
    }

    /// Confirmed log entry mirroring this notification.
    pub fn into_action(self) -> GameAction {
        match self {
            LedgerEvent::DidSummon {
                sequence_number,
                action,
                ..
            } => GameAction::confirmed(sequence_number, ActionKind::Summon(action)),
            LedgerEvent::DidMove {
                sequence_number,
                action,
                ..
            } => GameAction::confirmed(sequence_number, ActionKind::Move(action)),
            LedgerEvent::DidAttack {
                sequence_number,
                action,
                ..
            } => GameAction::confirmed(sequence_number, ActionKind::Attack(action)),
            LedgerEvent::DidEndTurn {
                sequence_number,
                action,
                ..
            } => GameAction::confirmed(sequence_number, ActionKind::EndTurn(action)),
        }
    }
}
