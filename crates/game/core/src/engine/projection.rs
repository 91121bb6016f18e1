use crate::action::{GameAction, HpPair, SequenceNumber};
use crate::state::GameState;

use super::{ActionOutcome, ExecuteError, GameEngine};

/// Something the replay could not take at face value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Discrepancy {
    pub sequence_number: SequenceNumber,
    pub kind: DiscrepancyKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiscrepancyKind {
    /// The entry could not be applied and was left out of the snapshot.
    Skipped(ExecuteError),
    /// The ledger reported different attack hit points than local resolution.
    OutcomeAdjusted { computed: HpPair, reported: HpPair },
}

/// Snapshot produced by a replay, with everything it had to skip or adjust.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub state: GameState,
    pub discrepancies: Vec<Discrepancy>,
}

/// Folds `entries` over `base` in the order given.
///
/// With `confirmed_only` set, predicted entries are ignored, which yields the
/// confirmed snapshot; otherwise every entry is folded, which yields the
/// predicted one. Entries at or below the base's sequence number are already
/// part of it and are passed over.
///
/// Replay never fails. A confirmed entry that cannot be applied still
/// consumes its sequence number, because the ledger did; a predicted one
/// does not, so predictions stacked on top of it are skipped as well.
pub fn project<'a>(
    base: &GameState,
    entries: impl IntoIterator<Item = &'a GameAction>,
    confirmed_only: bool,
) -> Projection {
    let mut state = base.clone();
    let mut discrepancies = Vec::new();

    for action in entries {
        if confirmed_only && action.from_local_data {
            continue;
        }
        if action.sequence_number <= state.sequence_number {
            continue;
        }

        match GameEngine::new(&mut state).execute(action) {
            Ok(ActionOutcome::Attacked(outcome)) if outcome.was_adjusted() => {
                if let Some(computed) = outcome.computed {
                    discrepancies.push(Discrepancy {
                        sequence_number: action.sequence_number,
                        kind: DiscrepancyKind::OutcomeAdjusted {
                            computed,
                            reported: outcome.applied,
                        },
                    });
                }
            }
            Ok(_) => {}
            Err(error) => {
                if action.is_confirmed() {
                    state.sequence_number = action.sequence_number;
                }
                discrepancies.push(Discrepancy {
                    sequence_number: action.sequence_number,
                    kind: DiscrepancyKind::Skipped(error),
                });
            }
        }
    }

    Projection { state, discrepancies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, AttackAction, EndTurnAction, MoveAction, SummonAction};
    use crate::board::Cell;
    use crate::config::GameConfig;
    use crate::state::{PieceId, PieceType, PlayerId, Seat};

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    fn base() -> GameState {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        state.player_mut(Seat::One).mana = 8;
        state
    }

    fn history() -> Vec<GameAction> {
        vec![
            GameAction::confirmed(
                1,
                ActionKind::Summon(SummonAction::new(P1, PieceId(3), PieceType::Corvette, Cell::new(2, 0))),
            ),
            GameAction::confirmed(
                2,
                ActionKind::Move(MoveAction::new(
                    PieceId(3),
                    vec![Cell::new(2, 1), Cell::new(2, 2), Cell::new(2, 3)],
                )),
            ),
            GameAction::confirmed(3, ActionKind::EndTurn(EndTurnAction::new(P1, 1))),
            GameAction::predicted(
                4,
                ActionKind::Summon(SummonAction::new(P2, PieceId(4), PieceType::Cruiser, Cell::new(3, 5))),
            ),
        ]
    }

    #[test]
    fn replay_is_deterministic() {
        let base = base();
        let history = history();
        let first = project(&base, &history, false);
        let second = project(&base, &history, false);
        assert_eq!(first, second);
        assert!(first.discrepancies.is_empty());
        assert_eq!(first.state.sequence_number, 4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn replay_roots_match() {
        let base = base();
        let history = history();
        let first = project(&base, &history, true).state.state_root().unwrap();
        let second = project(&base, &history, true).state.state_root().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn confirmed_only_ignores_predictions() {
        let projection = project(&base(), &history(), true);
        assert_eq!(projection.state.sequence_number, 3);
        assert!(projection.state.piece(PieceId(4)).is_none());
        assert_eq!(projection.state.piece(PieceId(3)).unwrap().location(), Some(Cell::new(2, 3)));
    }

    #[test]
    fn malformed_confirmed_entry_is_skipped_but_consumes_its_slot() {
        let mut history = history();
        history[1] = GameAction::confirmed(2, ActionKind::Move(MoveAction::new(PieceId(99), vec![Cell::new(0, 0)])));
        let projection = project(&base(), &history, false);
        assert_eq!(projection.discrepancies.len(), 1);
        assert_eq!(projection.discrepancies[0].sequence_number, 2);
        assert!(matches!(projection.discrepancies[0].kind, DiscrepancyKind::Skipped(_)));
        // Later entries still apply on top.
        assert_eq!(projection.state.sequence_number, 4);
        assert!(projection.state.piece(PieceId(4)).is_some());
    }

    #[test]
    fn predictions_after_a_gap_are_skipped() {
        let mut history = history();
        history.push(GameAction::predicted(
            6,
            ActionKind::EndTurn(EndTurnAction::new(P2, 2)),
        ));
        let projection = project(&base(), &history, false);
        assert_eq!(projection.state.sequence_number, 4);
        assert_eq!(
            projection.discrepancies,
            vec![Discrepancy {
                sequence_number: 6,
                kind: DiscrepancyKind::Skipped(ExecuteError::SequenceGap { found: 6, current: 4 }),
            }]
        );
    }

    #[test]
    fn reported_attack_outcome_is_recorded_when_it_differs() {
        let mut base = base();
        base.insert_piece(crate::state::Piece::visible(
            PieceId(3),
            P1,
            PieceType::Cruiser,
            3,
            Cell::new(3, 4),
        ));
        base.insert_piece(crate::state::Piece::visible(
            PieceId(4),
            P2,
            PieceType::Cruiser,
            3,
            Cell::new(3, 5),
        ));
        let attack = AttackAction::new(PieceId(3), PieceId(4)).with_outcome(HpPair::new(3, 3), HpPair::new(3, 0));
        let projection = project(&base, &[GameAction::confirmed(1, ActionKind::Attack(attack))], true);
        assert_eq!(
            projection.discrepancies[0].kind,
            DiscrepancyKind::OutcomeAdjusted {
                computed: HpPair::new(1, 1),
                reported: HpPair::new(3, 0),
            }
        );
        assert_eq!(projection.state.piece(PieceId(4)).unwrap().hp, 0);
    }
}
