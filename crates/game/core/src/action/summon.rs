use crate::action::{ActionTransition, Provenance};
use crate::board::Cell;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{GameState, HiddenPlacement, Piece, PieceId, PieceType, PlayerId, Salt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SummonError {
    #[error("match is not in progress")]
    MatchNotActive,

    #[error("{player} is not the mover")]
    NotYourTurn { player: PlayerId },

    #[error("piece {0} already exists")]
    DuplicatePiece(PieceId),

    #[error("{0} is not in the catalog")]
    UnknownPieceType(PieceType),

    #[error("summon costs {required} mana but only {available} is available")]
    InsufficientMana { required: u32, available: u32 },

    #[error("cell {cell} is out of bounds")]
    OutOfBounds { cell: Cell },

    #[error("cell {cell} is occupied")]
    CellOccupied { cell: Cell },

    #[error("visible {piece_type} summoned without a cell")]
    MissingCell { piece_type: PieceType },
}

impl GameError for SummonError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientMana { .. } | Self::CellOccupied { .. } => ErrorSeverity::Recoverable,
            Self::DuplicatePiece(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MatchNotActive => "SUMMON_MATCH_NOT_ACTIVE",
            Self::NotYourTurn { .. } => "SUMMON_NOT_YOUR_TURN",
            Self::DuplicatePiece(_) => "SUMMON_DUPLICATE_PIECE",
            Self::UnknownPieceType(_) => "SUMMON_UNKNOWN_PIECE_TYPE",
            Self::InsufficientMana { .. } => "SUMMON_INSUFFICIENT_MANA",
            Self::OutOfBounds { .. } => "SUMMON_OUT_OF_BOUNDS",
            Self::CellOccupied { .. } => "SUMMON_CELL_OCCUPIED",
            Self::MissingCell { .. } => "SUMMON_MISSING_CELL",
        }
    }
}

/// Creates a new piece for `player`, paying its cost in mana.
///
/// `cell` and `salt` are absent when an opponent summons a hidden piece; the
/// owner's own prediction carries both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonAction {
    pub player: PlayerId,
    pub piece_id: PieceId,
    pub piece_type: PieceType,
    pub cell: Option<Cell>,
    pub salt: Option<Salt>,
}

impl SummonAction {
    pub fn new(player: PlayerId, piece_id: PieceId, piece_type: PieceType, cell: Cell) -> Self {
        Self {
            player,
            piece_id,
            piece_type,
            cell: Some(cell),
            salt: None,
        }
    }

    pub fn with_salt(mut self, salt: Salt) -> Self {
        self.salt = Some(salt);
        self
    }
}

impl ActionTransition for SummonAction {
    type Error = SummonError;
    type Result = PieceId;

    fn actor(&self, _state: &GameState) -> Option<PlayerId> {
        Some(self.player)
    }

    fn pre_validate(&self, state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        let mover = state.mover().ok_or(SummonError::MatchNotActive)?;
        if state.player(mover).address != self.player {
            return Err(SummonError::NotYourTurn { player: self.player });
        }
        if state.piece(self.piece_id).is_some() {
            return Err(SummonError::DuplicatePiece(self.piece_id));
        }

        let stats = state
            .config
            .catalog
            .stats(self.piece_type)
            .ok_or(SummonError::UnknownPieceType(self.piece_type))?;
        let available = state.mana_of(mover);
        if available < stats.cost {
            return Err(SummonError::InsufficientMana {
                required: stats.cost,
                available,
            });
        }

        match self.cell {
            Some(cell) => {
                if !state.config.dimensions.contains(cell) {
                    return Err(SummonError::OutOfBounds { cell });
                }
                if state.visible_piece_at(cell).is_some() {
                    return Err(SummonError::CellOccupied { cell });
                }
            }
            None if !stats.hidden => {
                return Err(SummonError::MissingCell {
                    piece_type: self.piece_type,
                });
            }
            None => {}
        }

        Ok(())
    }

    fn apply(&self, state: &mut GameState, _provenance: Provenance) -> Result<Self::Result, Self::Error> {
        let mover = state.mover().ok_or(SummonError::MatchNotActive)?;
        let stats = *state
            .config
            .catalog
            .stats(self.piece_type)
            .ok_or(SummonError::UnknownPieceType(self.piece_type))?;

        let piece = if stats.hidden {
            let placement = match (self.cell, self.salt) {
                (Some(cell), Some(salt)) if state.viewer == self.player => HiddenPlacement::Known { cell, salt },
                _ => HiddenPlacement::Unknown,
            };
            Piece::hidden(self.piece_id, self.player, self.piece_type, stats.max_hp, placement)
        } else {
            let cell = self.cell.ok_or(SummonError::MissingCell {
                piece_type: self.piece_type,
            })?;
            Piece::visible(self.piece_id, self.player, self.piece_type, stats.max_hp, cell)
        };

        let pool = &mut state.player_mut(mover).mana;
        *pool = pool.saturating_sub(stats.cost);
        state.insert_piece(piece);
        Ok(self.piece_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::state::{Placement, Seat};

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    fn state_with_mana(mana: u32) -> GameState {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.player_mut(Seat::One).mana = mana;
        state
    }

    #[test]
    fn summon_spends_mana_and_places_piece() {
        let mut state = state_with_mana(3);
        let action = SummonAction::new(P1, PieceId(3), PieceType::Cruiser, Cell::new(2, 0));
        action.pre_validate(&state, Provenance::Predicted).unwrap();
        action.apply(&mut state, Provenance::Predicted).unwrap();
        assert_eq!(state.mana_of(Seat::One), 1);
        assert_eq!(state.piece(PieceId(3)).unwrap().location(), Some(Cell::new(2, 0)));
    }

    #[test]
    fn summon_without_enough_mana_is_rejected() {
        let state = state_with_mana(1);
        let action = SummonAction::new(P1, PieceId(3), PieceType::Cruiser, Cell::new(2, 0));
        assert_eq!(
            action.pre_validate(&state, Provenance::Confirmed),
            Err(SummonError::InsufficientMana {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn summon_onto_visible_piece_is_rejected() {
        let state = state_with_mana(8);
        let action = SummonAction::new(P1, PieceId(3), PieceType::Cruiser, Cell::new(3, 0));
        assert_eq!(
            action.pre_validate(&state, Provenance::Confirmed),
            Err(SummonError::CellOccupied { cell: Cell::new(3, 0) })
        );
    }

    #[test]
    fn opponent_hidden_summon_stays_unknown() {
        let mut state = state_with_mana(0);
        state.status = crate::state::MatchStatus::P2ToMove;
        state.player_mut(Seat::Two).mana = 4;
        let action = SummonAction {
            player: P2,
            piece_id: PieceId(3),
            piece_type: PieceType::Submarine,
            cell: None,
            salt: None,
        };
        action.pre_validate(&state, Provenance::Confirmed).unwrap();
        action.apply(&mut state, Provenance::Confirmed).unwrap();
        assert_eq!(
            state.piece(PieceId(3)).unwrap().placement,
            Placement::Hidden(HiddenPlacement::Unknown)
        );
        assert_eq!(state.mana_of(Seat::Two), 0);
    }
}
