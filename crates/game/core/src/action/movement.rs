use crate::action::{ActionTransition, Provenance};
use crate::board::Cell;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{GameState, HiddenPlacement, PieceId, Placement, PlayerId, Salt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveError {
    #[error("match is not in progress")]
    MatchNotActive,

    #[error("piece {0} not found")]
    PieceNotFound(PieceId),

    #[error("piece {0} is dead")]
    PieceDead(PieceId),

    #[error("piece {piece} does not belong to the mover")]
    NotYourPiece { piece: PieceId },

    #[error("visible piece {piece} moved without a path")]
    EmptyPath { piece: PieceId },

    #[error("destination {cell} is out of bounds")]
    OutOfBounds { cell: Cell },

    #[error("destination {cell} is occupied")]
    Occupied { cell: Cell },
}

impl GameError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Occupied { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MatchNotActive => "MOVE_MATCH_NOT_ACTIVE",
            Self::PieceNotFound(_) => "MOVE_PIECE_NOT_FOUND",
            Self::PieceDead(_) => "MOVE_PIECE_DEAD",
            Self::NotYourPiece { .. } => "MOVE_NOT_YOUR_PIECE",
            Self::EmptyPath { .. } => "MOVE_EMPTY_PATH",
            Self::OutOfBounds { .. } => "MOVE_OUT_OF_BOUNDS",
            Self::Occupied { .. } => "MOVE_OCCUPIED",
        }
    }
}

/// Relocates a piece to the last cell of `path`.
///
/// `path` excludes the origin. It is empty for an opponent's hidden move, and
/// `salt` is the fresh commitment salt only the owner knows.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveAction {
    pub piece_id: PieceId,
    pub path: Vec<Cell>,
    pub salt: Option<Salt>,
}

impl MoveAction {
    pub fn new(piece_id: PieceId, path: Vec<Cell>) -> Self {
        Self {
            piece_id,
            path,
            salt: None,
        }
    }

    pub fn with_salt(mut self, salt: Salt) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn destination(&self) -> Option<Cell> {
        self.path.last().copied()
    }
}

impl ActionTransition for MoveAction {
    type Error = MoveError;
    type Result = ();

    fn actor(&self, state: &GameState) -> Option<PlayerId> {
        state.piece(self.piece_id).map(|piece| piece.owner)
    }

    fn pre_validate(&self, state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        let mover = state.mover_address().ok_or(MoveError::MatchNotActive)?;
        let piece = state
            .piece(self.piece_id)
            .ok_or(MoveError::PieceNotFound(self.piece_id))?;
        if !piece.is_alive() {
            return Err(MoveError::PieceDead(self.piece_id));
        }
        if piece.owner != mover {
            return Err(MoveError::NotYourPiece { piece: self.piece_id });
        }

        match self.destination() {
            Some(cell) => {
                if !state.config.dimensions.contains(cell) {
                    return Err(MoveError::OutOfBounds { cell });
                }
                if state
                    .visible_piece_at(cell)
                    .is_some_and(|other| other.id != self.piece_id)
                {
                    return Err(MoveError::Occupied { cell });
                }
            }
            None if !piece.is_hidden() => {
                return Err(MoveError::EmptyPath { piece: self.piece_id });
            }
            None => {}
        }

        Ok(())
    }

    fn apply(&self, state: &mut GameState, _provenance: Provenance) -> Result<Self::Result, Self::Error> {
        let viewer = state.viewer;
        let turn = state.turn_number;
        let piece = state
            .piece_mut(self.piece_id)
            .ok_or(MoveError::PieceNotFound(self.piece_id))?;

        piece.placement = match (piece.placement, self.destination()) {
            (Placement::Visible(_), Some(cell)) => Placement::Visible(cell),
            (Placement::Visible(_), None) => return Err(MoveError::EmptyPath { piece: self.piece_id }),
            (Placement::Hidden(known), Some(cell)) if piece.owner == viewer => {
                let salt = match known {
                    HiddenPlacement::Known { salt, .. } => self.salt.or(Some(salt)),
                    _ => self.salt,
                };
                match salt {
                    Some(salt) => Placement::Hidden(HiddenPlacement::Known { cell, salt }),
                    None => Placement::Hidden(HiddenPlacement::Unknown),
                }
            }
            // A hidden piece that moved out of sight is no longer where anyone
            // last saw it.
            (Placement::Hidden(_), _) => Placement::Hidden(HiddenPlacement::Unknown),
        };
        piece.last_move_turn = turn;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::state::{MatchStatus, Piece, PieceType};

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    fn state() -> GameState {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.insert_piece(Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(2, 0)));
        state.insert_piece(Piece::hidden(
            PieceId(4),
            P1,
            PieceType::Submarine,
            1,
            HiddenPlacement::Known {
                cell: Cell::new(4, 0),
                salt: Salt(10),
            },
        ));
        state
    }

    #[test]
    fn visible_move_lands_on_path_end_and_stamps_turn() {
        let mut state = state();
        let action = MoveAction::new(PieceId(3), vec![Cell::new(2, 1), Cell::new(2, 2)]);
        action.pre_validate(&state, Provenance::Confirmed).unwrap();
        action.apply(&mut state, Provenance::Confirmed).unwrap();
        let piece = state.piece(PieceId(3)).unwrap();
        assert_eq!(piece.location(), Some(Cell::new(2, 2)));
        assert_eq!(piece.last_move_turn, 1);
    }

    #[test]
    fn own_hidden_move_rolls_salt() {
        let mut state = state();
        let action = MoveAction::new(PieceId(4), vec![Cell::new(5, 0)]).with_salt(Salt(11));
        action.apply(&mut state, Provenance::Predicted).unwrap();
        assert_eq!(
            state.piece(PieceId(4)).unwrap().placement,
            Placement::Hidden(HiddenPlacement::Known {
                cell: Cell::new(5, 0),
                salt: Salt(11)
            })
        );
    }

    #[test]
    fn opponent_hidden_move_forgets_revealed_location() {
        let mut state = state();
        state.status = MatchStatus::P2ToMove;
        state.insert_piece(Piece::hidden(
            PieceId(5),
            P2,
            PieceType::Submarine,
            1,
            HiddenPlacement::Revealed { cell: Cell::new(1, 5) },
        ));
        let action = MoveAction::new(PieceId(5), Vec::new());
        action.pre_validate(&state, Provenance::Confirmed).unwrap();
        action.apply(&mut state, Provenance::Confirmed).unwrap();
        assert_eq!(state.piece(PieceId(5)).unwrap().location(), None);
    }

    #[test]
    fn moving_onto_visible_piece_is_rejected() {
        let state = state();
        let action = MoveAction::new(PieceId(3), vec![Cell::new(3, 0)]);
        assert_eq!(
            action.pre_validate(&state, Provenance::Confirmed),
            Err(MoveError::Occupied { cell: Cell::new(3, 0) })
        );
    }

    #[test]
    fn opponent_cannot_move_my_piece() {
        let mut state = state();
        state.status = MatchStatus::P2ToMove;
        let action = MoveAction::new(PieceId(3), vec![Cell::new(2, 1)]);
        assert_eq!(
            action.pre_validate(&state, Provenance::Confirmed),
            Err(MoveError::NotYourPiece { piece: PieceId(3) })
        );
    }
}
