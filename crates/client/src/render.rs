//! Plain-text rendering of a player's view.
use std::fmt::Write;

use game_core::{Cell, Discrepancy, DiscrepancyKind, GameAction, GameState, MatchStatus, PieceType, Seat};

/// Board letter of a unit class; upper case for the viewer's own pieces.
fn glyph(piece_type: PieceType) -> char {
    match piece_type {
        PieceType::Mothership => 'M',
        PieceType::Cruiser => 'C',
        PieceType::Frigate => 'F',
        PieceType::Corvette => 'V',
        PieceType::Submarine => 'S',
        PieceType::Warship => 'W',
    }
}

pub fn render_board(state: &GameState) -> String {
    let mut out = String::new();
    let dims = state.config.dimensions;

    let _ = writeln!(out, "{}", status_line(state));
    out.push_str("   ");
    for col in 0..dims.cols {
        let _ = write!(out, "{col:>2}");
    }
    out.push('\n');

    for row in 0..dims.rows as i32 {
        let _ = write!(out, "{row:>2} ");
        for col in 0..dims.cols as i32 {
            let symbol = state
                .piece_at(Cell::new(row, col))
                .map(|piece| {
                    let letter = glyph(piece.piece_type);
                    if piece.owner == state.viewer {
                        letter
                    } else {
                        letter.to_ascii_lowercase()
                    }
                })
                .unwrap_or('.');
            let _ = write!(out, " {symbol}");
        }
        out.push('\n');
    }

    let unseen = state
        .alive_pieces()
        .filter(|piece| piece.location().is_none())
        .count();
    if unseen > 0 {
        let _ = writeln!(out, "{unseen} enemy unit(s) hidden");
    }

    for piece in state.alive_pieces().filter(|piece| piece.owner == state.viewer) {
        let location = piece
            .location()
            .map(|cell| cell.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            out,
            "  {} {} at {} hp {}",
            piece.id, piece.piece_type, location, piece.hp
        );
    }
    out
}

fn status_line(state: &GameState) -> String {
    let mana = format!("mana {}/{}", state.mana_of(Seat::One), state.mana_of(Seat::Two));
    match state.status {
        MatchStatus::Complete => match state.winner() {
            Some(seat) => format!("seq {} | match over, {seat} wins", state.sequence_number),
            None => format!("seq {} | match over", state.sequence_number),
        },
        MatchStatus::WaitingForPlayers => format!("seq {} | waiting for players", state.sequence_number),
        status => {
            let mover = status.mover().map(|seat| seat.to_string()).unwrap_or_default();
            format!(
                "seq {} | turn {} | {mover} to move | {mana}",
                state.sequence_number, state.turn_number
            )
        }
    }
}

pub fn render_history(actions: &[GameAction], discrepancies: &[Discrepancy]) -> String {
    let mut out = String::new();
    if actions.is_empty() {
        out.push_str("no actions held since the confirmed snapshot\n");
    }
    for action in actions {
        let provenance = if action.is_confirmed() { "confirmed" } else { "predicted" };
        let pieces: Vec<String> = action.kind.pieces().iter().map(|id| id.to_string()).collect();
        let _ = writeln!(
            out,
            "  {:>3} {:<9} {:<9} {}",
            action.sequence_number,
            action.kind.as_str(),
            provenance,
            pieces.join(" -> ")
        );
    }
    for discrepancy in discrepancies {
        let detail = match &discrepancy.kind {
            DiscrepancyKind::Skipped(error) => format!("skipped: {error}"),
            DiscrepancyKind::OutcomeAdjusted { .. } => "outcome adjusted".to_string(),
        };
        let _ = writeln!(out, "  ! {:>3} {detail}", discrepancy.sequence_number);
    }
    out
}
