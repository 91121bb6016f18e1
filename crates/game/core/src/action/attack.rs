use crate::action::{ActionTransition, Provenance};
use crate::board::{Cell, taxicab};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{GameState, PieceId, PieceStats, PieceType, PlayerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackError {
    #[error("match is not in progress")]
    MatchNotActive,

    #[error("piece {0} not found")]
    PieceNotFound(PieceId),

    #[error("piece {0} is dead")]
    PieceDead(PieceId),

    #[error("attacker {piece} does not belong to the mover")]
    NotYourPiece { piece: PieceId },

    #[error("piece {target} belongs to the attacker's owner")]
    FriendlyTarget { target: PieceId },

    #[error("{0} is not in the catalog")]
    UnknownPieceType(PieceType),

    #[error("attack {attacker} -> {target} has no known positions and no reported outcome")]
    Unresolvable { attacker: PieceId, target: PieceId },
}

impl GameError for AttackError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unresolvable { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MatchNotActive => "ATTACK_MATCH_NOT_ACTIVE",
            Self::PieceNotFound(_) => "ATTACK_PIECE_NOT_FOUND",
            Self::PieceDead(_) => "ATTACK_PIECE_DEAD",
            Self::NotYourPiece { .. } => "ATTACK_NOT_YOUR_PIECE",
            Self::FriendlyTarget { .. } => "ATTACK_FRIENDLY_TARGET",
            Self::UnknownPieceType(_) => "ATTACK_UNKNOWN_PIECE_TYPE",
            Self::Unresolvable { .. } => "ATTACK_UNRESOLVABLE",
        }
    }
}

/// Hit points of both sides of an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HpPair {
    pub attacker: u32,
    pub target: u32,
}

impl HpPair {
    pub const fn new(attacker: u32, target: u32) -> Self {
        Self { attacker, target }
    }
}

/// `attacker_id` attacks `target_id`.
///
/// Ledger notifications carry the before/after hit points; cells are set
/// when the attack disclosed a hidden piece's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackAction {
    pub attacker_id: PieceId,
    pub target_id: PieceId,
    pub attacker_cell: Option<Cell>,
    pub target_cell: Option<Cell>,
    pub hp_before: Option<HpPair>,
    pub hp_after: Option<HpPair>,
}

impl AttackAction {
    pub fn new(attacker_id: PieceId, target_id: PieceId) -> Self {
        Self {
            attacker_id,
            target_id,
            attacker_cell: None,
            target_cell: None,
            hp_before: None,
            hp_after: None,
        }
    }

    pub fn with_outcome(mut self, before: HpPair, after: HpPair) -> Self {
        self.hp_before = Some(before);
        self.hp_after = Some(after);
        self
    }

    pub fn with_cells(mut self, attacker_cell: Option<Cell>, target_cell: Option<Cell>) -> Self {
        self.attacker_cell = attacker_cell;
        self.target_cell = target_cell;
        self
    }
}

/// Hit points after an attack, as computed locally and as applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackOutcome {
    /// Local resolution; `None` when a position involved is unknown.
    pub computed: Option<HpPair>,
    pub applied: HpPair,
}

impl AttackOutcome {
    /// True when a ledger-reported result overrode a different local one.
    pub fn was_adjusted(&self) -> bool {
        self.computed.is_some_and(|computed| computed != self.applied)
    }
}

/// Resolves one attack exchange.
///
/// The attacker's power is applied to the target first, then the target
/// retaliates if `distance` lies within its own attack range (even when the
/// first hit killed it), and finally a kamikaze attacker is forced to zero.
pub fn resolve_attack(attacker: &PieceStats, target: &PieceStats, before: HpPair, distance: u32) -> HpPair {
    let target_hp = before.target.saturating_sub(attacker.attack);
    let mut attacker_hp = before.attacker;
    if target.in_attack_range(distance) {
        attacker_hp = attacker_hp.saturating_sub(target.attack);
    }
    if attacker.kamikaze {
        attacker_hp = 0;
    }
    HpPair::new(attacker_hp, target_hp)
}

impl ActionTransition for AttackAction {
    type Error = AttackError;
    type Result = AttackOutcome;

    fn actor(&self, state: &GameState) -> Option<PlayerId> {
        state.piece(self.attacker_id).map(|piece| piece.owner)
    }

    fn pre_validate(&self, state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        let mover = state.mover_address().ok_or(AttackError::MatchNotActive)?;
        let attacker = state
            .piece(self.attacker_id)
            .ok_or(AttackError::PieceNotFound(self.attacker_id))?;
        let target = state
            .piece(self.target_id)
            .ok_or(AttackError::PieceNotFound(self.target_id))?;

        if !attacker.is_alive() {
            return Err(AttackError::PieceDead(self.attacker_id));
        }
        if !target.is_alive() {
            return Err(AttackError::PieceDead(self.target_id));
        }
        if attacker.owner != mover {
            return Err(AttackError::NotYourPiece { piece: self.attacker_id });
        }
        if target.owner == attacker.owner {
            return Err(AttackError::FriendlyTarget { target: self.target_id });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, provenance: Provenance) -> Result<Self::Result, Self::Error> {
        for (id, cell) in [(self.attacker_id, self.attacker_cell), (self.target_id, self.target_cell)] {
            if let (Some(cell), Some(piece)) = (cell, state.piece_mut(id)) {
                piece.reveal_at(cell);
            }
        }

        let attacker = state
            .piece(self.attacker_id)
            .ok_or(AttackError::PieceNotFound(self.attacker_id))?;
        let target = state
            .piece(self.target_id)
            .ok_or(AttackError::PieceNotFound(self.target_id))?;
        let attacker_stats = state
            .stats_of(attacker)
            .ok_or(AttackError::UnknownPieceType(attacker.piece_type))?;
        let target_stats = state
            .stats_of(target)
            .ok_or(AttackError::UnknownPieceType(target.piece_type))?;

        let before = HpPair::new(attacker.hp, target.hp);
        let computed = match (attacker.location(), target.location()) {
            (Some(from), Some(to)) => Some(resolve_attack(attacker_stats, target_stats, before, taxicab(from, to))),
            _ => None,
        };
        let reported = match provenance {
            Provenance::Confirmed => self.hp_after,
            Provenance::Predicted => None,
        };
        let applied = reported.or(computed).ok_or(AttackError::Unresolvable {
            attacker: self.attacker_id,
            target: self.target_id,
        })?;

        let turn = state.turn_number;
        if let Some(attacker) = state.piece_mut(self.attacker_id) {
            attacker.hp = applied.attacker;
            attacker.last_attack_turn = turn;
        }
        if let Some(target) = state.piece_mut(self.target_id) {
            target.hp = applied.target;
        }
        state.check_completion();

        Ok(AttackOutcome { computed, applied })
    }
}
