//! Player-facing legality.
//!
//! The engine applies whatever the ledger finalized; this module decides what
//! the local player may *attempt*. Every check runs against a snapshot the
//! caller picks, normally the predicted one, so intents can be chained before
//! anything confirms.
mod intent;
mod targets;

pub use intent::{Intent, IntentError, PlannedAction, WitnessKind, WitnessPlan, validate_intent};
pub use targets::{legal_attacks, legal_moves};

use crate::state::{GameState, Piece};

/// Whether `piece` attacked during the current turn.
///
/// Reports true whenever it is not the owner's turn, so an opponent's piece
/// never looks actionable.
pub fn has_attacked(state: &GameState, piece: &Piece) -> bool {
    if !state.is_turn_of(&piece.owner) {
        return true;
    }
    piece.last_attack_turn == state.turn_number
}

/// Whether `piece` moved this turn without attacking yet.
///
/// Reports true whenever it is not the owner's turn.
pub fn has_moved(state: &GameState, piece: &Piece) -> bool {
    if !state.is_turn_of(&piece.owner) {
        return true;
    }
    piece.last_move_turn == state.turn_number && !has_attacked(state, piece)
}

pub fn can_move(state: &GameState, piece: &Piece) -> bool {
    piece.is_alive()
        && !has_moved(state, piece)
        && !has_attacked(state, piece)
        && state.stats_of(piece).is_some_and(|stats| stats.move_range > 0)
}

pub fn can_attack(state: &GameState, piece: &Piece) -> bool {
    piece.is_alive() && !has_attacked(state, piece)
}

/// Whether `piece` has anything left to do this turn.
pub fn can_act(state: &GameState, piece: &Piece) -> bool {
    can_move(state, piece) || can_attack(state, piece)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::config::GameConfig;
    use crate::state::{PieceId, PieceType, PlayerId};

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    fn state_with(piece: Piece) -> GameState {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.turn_number = 3;
        state.insert_piece(piece);
        state
    }

    #[test]
    fn fresh_piece_can_move_and_attack() {
        let state = state_with(Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(2, 0)));
        let piece = state.piece(PieceId(3)).unwrap();
        assert!(!has_moved(&state, piece));
        assert!(!has_attacked(&state, piece));
        assert!(can_move(&state, piece));
        assert!(can_act(&state, piece));
    }

    #[test]
    fn moved_piece_can_still_attack() {
        let mut piece = Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(2, 0));
        piece.last_move_turn = 3;
        let state = state_with(piece);
        let piece = state.piece(PieceId(3)).unwrap();
        assert!(has_moved(&state, piece));
        assert!(!can_move(&state, piece));
        assert!(can_attack(&state, piece));
    }

    #[test]
    fn attacked_piece_is_spent() {
        let mut piece = Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(2, 0));
        piece.last_move_turn = 3;
        piece.last_attack_turn = 3;
        let state = state_with(piece);
        let piece = state.piece(PieceId(3)).unwrap();
        assert!(has_attacked(&state, piece));
        assert!(!has_moved(&state, piece));
        assert!(!can_act(&state, piece));
    }

    #[test]
    fn opponent_pieces_always_look_spent() {
        let state = state_with(Piece::visible(PieceId(3), P2, PieceType::Cruiser, 3, Cell::new(2, 6)));
        let piece = state.piece(PieceId(3)).unwrap();
        assert!(has_moved(&state, piece));
        assert!(has_attacked(&state, piece));
        assert!(!can_act(&state, piece));
    }

    #[test]
    fn motherships_never_move() {
        let state = GameState::opening(GameConfig::default(), P1, P1, P2);
        let mothership = state.piece(PieceId(1)).unwrap();
        assert!(!can_move(&state, mothership));
        assert!(can_attack(&state, mothership));
    }
}
