//! Action domain.
//!
//! A [`GameAction`] is one entry of the match history: summon, move, attack
//! or end-turn, tagged with its sequence number and with whether it mirrors a
//! ledger event or an optimistic local prediction. Each variant implements
//! [`ActionTransition`] so the engine can drive it through the same
//! pre-validate, apply, post-validate pipeline.
//!
//! # Module Structure
//!
//! - `summon`: piece creation and mana spending
//! - `movement`: relocation along a path
//! - `attack`: damage, retaliation and reveals
//! - `end_turn`: mover flip and mana refill
pub mod attack;
pub mod end_turn;
pub mod movement;
pub mod summon;

pub use attack::{AttackAction, AttackError, AttackOutcome, HpPair, resolve_attack};
pub use end_turn::{EndTurnAction, EndTurnError};
pub use movement::{MoveAction, MoveError};
pub use summon::{SummonAction, SummonError};

use crate::state::{GameState, PieceId, PlayerId};

/// Position of an action in the match history. Assigned by the ledger for
/// confirmed actions and provisionally by the client for predictions.
pub type SequenceNumber = u64;

/// Where an entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Provenance {
    /// Mirrors an event the ledger has finalized.
    Confirmed,
    /// Optimistic local prediction awaiting confirmation.
    Predicted,
}

/// Defines how a concrete action variant mutates game state.
///
/// Implementors surface pre- and post-conditions through the validation
/// hooks. All hooks are deterministic and side-effect free outside of the
/// state handed to `apply`.
pub trait ActionTransition {
    type Error;
    type Result;

    /// Player on whose behalf the action runs, if it can be known up front.
    fn actor(&self, state: &GameState) -> Option<PlayerId>;

    /// Validates pre-conditions using the state **before** mutation.
    fn pre_validate(&self, _state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Applies the action by mutating the game state directly.
    fn apply(&self, state: &mut GameState, provenance: Provenance) -> Result<Self::Result, Self::Error>;

    /// Validates post-conditions using the state **after** mutation.
    fn post_validate(&self, _state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Variant-specific payload of a [`GameAction`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Summon(SummonAction),
    Move(MoveAction),
    Attack(AttackAction),
    EndTurn(EndTurnAction),
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Summon(_) => "summon",
            ActionKind::Move(_) => "move",
            ActionKind::Attack(_) => "attack",
            ActionKind::EndTurn(_) => "end_turn",
        }
    }

    /// Pieces this action refers to.
    pub fn pieces(&self) -> Vec<PieceId> {
        match self {
            ActionKind::Summon(action) => vec![action.piece_id],
            ActionKind::Move(action) => vec![action.piece_id],
            ActionKind::Attack(action) => vec![action.attacker_id, action.target_id],
            ActionKind::EndTurn(_) => Vec::new(),
        }
    }

    /// Fills private fields this payload lacks from `local`, provided both
    /// describe the same public action.
    ///
    /// Ledger notifications omit what only the acting player knows (hidden
    /// cells, salts). When a confirmed entry replaces the matching prediction
    /// those details are carried over so the owner keeps its own knowledge.
    pub fn absorb_local_detail(&mut self, local: &ActionKind) {
        match (self, local) {
            (ActionKind::Summon(ours), ActionKind::Summon(theirs))
                if ours.piece_id == theirs.piece_id && ours.piece_type == theirs.piece_type =>
            {
                ours.cell = ours.cell.or(theirs.cell);
                ours.salt = ours.salt.or(theirs.salt);
            }
            (ActionKind::Move(ours), ActionKind::Move(theirs)) if ours.piece_id == theirs.piece_id => {
                if ours.path.is_empty() {
                    ours.path = theirs.path.clone();
                }
                ours.salt = ours.salt.or(theirs.salt);
            }
            (ActionKind::Attack(ours), ActionKind::Attack(theirs))
                if ours.attacker_id == theirs.attacker_id && ours.target_id == theirs.target_id =>
            {
                ours.attacker_cell = ours.attacker_cell.or(theirs.attacker_cell);
                ours.target_cell = ours.target_cell.or(theirs.target_cell);
            }
            _ => {}
        }
    }
}

/// One entry of the match history.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameAction {
    pub sequence_number: SequenceNumber,
    /// True for optimistic local predictions, false for ledger-confirmed entries.
    pub from_local_data: bool,
    pub kind: ActionKind,
}

impl GameAction {
    pub fn confirmed(sequence_number: SequenceNumber, kind: ActionKind) -> Self {
        Self {
            sequence_number,
            from_local_data: false,
            kind,
        }
    }

    pub fn predicted(sequence_number: SequenceNumber, kind: ActionKind) -> Self {
        Self {
            sequence_number,
            from_local_data: true,
            kind,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        !self.from_local_data
    }

    pub fn provenance(&self) -> Provenance {
        if self.from_local_data {
            Provenance::Predicted
        } else {
            Provenance::Confirmed
        }
    }

    /// Copies private detail from a prediction occupying the same slot.
    pub fn absorb_local_detail(&mut self, local: &GameAction) {
        self.kind.absorb_local_detail(&local.kind);
    }
}

impl From<SummonAction> for ActionKind {
    fn from(action: SummonAction) -> Self {
        ActionKind::Summon(action)
    }
}

impl From<MoveAction> for ActionKind {
    fn from(action: MoveAction) -> Self {
        ActionKind::Move(action)
    }
}

impl From<AttackAction> for ActionKind {
    fn from(action: AttackAction) -> Self {
        ActionKind::Attack(action)
    }
}

impl From<EndTurnAction> for ActionKind {
    fn from(action: EndTurnAction) -> Self {
        ActionKind::EndTurn(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::state::{PieceType, Salt};

    #[test]
    fn confirmed_summon_absorbs_hidden_cell_and_salt() {
        let player = PlayerId::repeat_byte(1);
        let local = ActionKind::Summon(SummonAction {
            player,
            piece_id: PieceId(3),
            piece_type: PieceType::Submarine,
            cell: Some(Cell::new(3, 1)),
            salt: Some(Salt(77)),
        });
        let mut ledger = ActionKind::Summon(SummonAction {
            player,
            piece_id: PieceId(3),
            piece_type: PieceType::Submarine,
            cell: None,
            salt: None,
        });
        ledger.absorb_local_detail(&local);
        assert_eq!(ledger, local);
    }

    #[test]
    fn mismatched_actions_absorb_nothing() {
        let mut ledger = ActionKind::Move(MoveAction {
            piece_id: PieceId(4),
            path: Vec::new(),
            salt: None,
        });
        let before = ledger.clone();
        ledger.absorb_local_detail(&ActionKind::Move(MoveAction {
            piece_id: PieceId(5),
            path: vec![Cell::new(1, 1)],
            salt: Some(Salt(1)),
        }));
        assert_eq!(ledger, before);
    }
}
