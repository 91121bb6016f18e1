use crate::board::{Cell, Obstacles, Path, find_path, taxicab};
use crate::state::{GameState, PieceId};

use super::{can_attack, can_move};

/// Every destination `piece_id` can reach this turn, with the path to each,
/// in row-major order of the destination.
pub fn legal_moves(state: &GameState, piece_id: PieceId) -> Vec<(Cell, Path)> {
    let Some(piece) = state.piece(piece_id) else {
        return Vec::new();
    };
    let (Some(from), Some(stats)) = (piece.location(), state.stats_of(piece)) else {
        return Vec::new();
    };
    if !can_move(state, piece) {
        return Vec::new();
    }

    let obstacles = Obstacles::for_mover(state, piece);
    let dimensions = state.config.dimensions;
    dimensions
        .cells()
        .filter(|cell| *cell != from && taxicab(from, *cell) <= stats.move_range)
        .filter_map(|cell| find_path(from, cell, dimensions, &obstacles, stats.move_range).map(|path| (cell, path)))
        .collect()
}

/// Enemy pieces `piece_id` can attack right now, ordered by id.
///
/// Only targets whose location the snapshot knows are offered.
pub fn legal_attacks(state: &GameState, piece_id: PieceId) -> Vec<PieceId> {
    let Some(attacker) = state.piece(piece_id) else {
        return Vec::new();
    };
    let (Some(from), Some(stats)) = (attacker.location(), state.stats_of(attacker)) else {
        return Vec::new();
    };
    if !can_attack(state, attacker) {
        return Vec::new();
    }

    state
        .alive_pieces()
        .filter(|target| target.owner != attacker.owner)
        .filter(|target| {
            target
                .location()
                .is_some_and(|to| stats.in_attack_range(taxicab(from, to)))
        })
        .map(|target| target.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::state::{HiddenPlacement, Piece, PieceType, PlayerId, Salt};

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    #[test]
    fn legal_moves_skip_occupied_cells() {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.insert_piece(Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(2, 0)));
        let destinations: Vec<Cell> = legal_moves(&state, PieceId(3)).into_iter().map(|(cell, _)| cell).collect();
        assert_eq!(
            destinations,
            vec![
                Cell::new(0, 0),
                Cell::new(1, 0),
                Cell::new(1, 1),
                Cell::new(2, 1),
                Cell::new(2, 2),
                Cell::new(3, 1),
            ]
        );
    }

    #[test]
    fn own_hidden_submarine_does_not_block_a_cruiser() {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.insert_piece(Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(3, 1)));
        state.insert_piece(Piece::hidden(
            PieceId(4),
            P1,
            PieceType::Submarine,
            1,
            HiddenPlacement::Known {
                cell: Cell::new(3, 2),
                salt: Salt(7),
            },
        ));

        let moves = legal_moves(&state, PieceId(3));
        let onto = moves.iter().find(|(cell, _)| *cell == Cell::new(3, 2));
        let through = moves.iter().find(|(cell, _)| *cell == Cell::new(3, 3));
        assert!(onto.is_some());
        assert_eq!(through.map(|(_, path)| path.cells()), Some(&[Cell::new(3, 2), Cell::new(3, 3)][..]));
    }

    #[test]
    fn legal_attacks_ignore_unknown_hidden_enemies() {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.insert_piece(Piece::visible(PieceId(3), P1, PieceType::Corvette, 4, Cell::new(3, 4)));
        state.insert_piece(Piece::hidden(PieceId(4), P2, PieceType::Submarine, 1, HiddenPlacement::Unknown));
        state.insert_piece(Piece::hidden(
            PieceId(5),
            P2,
            PieceType::Submarine,
            1,
            HiddenPlacement::Revealed { cell: Cell::new(2, 4) },
        ));
        assert_eq!(legal_attacks(&state, PieceId(3)), vec![PieceId(2), PieceId(5)]);
    }

    #[test]
    fn opponent_pieces_have_no_legal_actions() {
        let state = GameState::opening(GameConfig::default(), P1, P1, P2);
        assert!(legal_attacks(&state, PieceId(2)).is_empty());
        assert!(legal_moves(&state, PieceId(2)).is_empty());
    }
}
