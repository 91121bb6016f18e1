//! Action execution pipeline and history replay.
//!
//! The [`GameEngine`] is the authoritative reducer for [`GameState`]: every
//! action goes through pre_validate, apply, post_validate and either lands
//! completely or leaves the state untouched. [`project`] folds a run of log
//! entries over a base snapshot with the same engine and never fails; entries
//! that cannot be applied are skipped and reported as [`Discrepancy`] values.

mod errors;
mod projection;
mod transition;

pub use errors::{ExecuteError, TransitionPhase, TransitionPhaseError};
pub use projection::{Discrepancy, DiscrepancyKind, Projection, project};

use crate::action::{AttackOutcome, GameAction};
use crate::state::{GameState, PieceId};

/// Variant-specific result of a successfully executed action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionOutcome {
    Summoned(PieceId),
    Moved,
    Attacked(AttackOutcome),
    TurnEnded,
}

/// Applies actions to a borrowed snapshot.
pub struct GameEngine<'a> {
    state: &'a mut GameState,
}

impl<'a> GameEngine<'a> {
    pub fn new(state: &'a mut GameState) -> Self {
        Self { state }
    }

    /// Executes one action on top of the snapshot.
    ///
    /// The action must carry the sequence number right after the snapshot's.
    /// On success the snapshot's sequence number advances to the action's; on
    /// failure the snapshot is restored exactly as it was.
    pub fn execute(&mut self, action: &GameAction) -> Result<ActionOutcome, ExecuteError> {
        let current = self.state.sequence_number;
        if action.sequence_number <= current {
            return Err(ExecuteError::AlreadyApplied {
                found: action.sequence_number,
                current,
            });
        }
        if action.sequence_number != current + 1 {
            return Err(ExecuteError::SequenceGap {
                found: action.sequence_number,
                current,
            });
        }

        let before = self.state.clone();
        match transition::execute_transition(&action.kind, self.state, action.provenance()) {
            Ok(outcome) => {
                self.state.sequence_number = action.sequence_number;
                Ok(outcome)
            }
            Err(error) => {
                *self.state = before;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, EndTurnAction, MoveAction, MoveError};
    use crate::board::Cell;
    use crate::config::GameConfig;
    use crate::state::PlayerId;

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    #[test]
    fn execute_advances_sequence_number() {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        let action = GameAction::confirmed(1, ActionKind::EndTurn(EndTurnAction::new(P1, 1)));
        let outcome = GameEngine::new(&mut state).execute(&action).unwrap();
        assert_eq!(outcome, ActionOutcome::TurnEnded);
        assert_eq!(state.sequence_number, 1);
    }

    #[test]
    fn failed_execution_leaves_state_untouched() {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        let before = state.clone();
        // Motherships cannot be moved onto the opposing mothership.
        let action = GameAction::confirmed(1, ActionKind::Move(MoveAction::new(PieceId(1), vec![Cell::new(3, 6)])));
        let error = GameEngine::new(&mut state).execute(&action).unwrap_err();
        assert_eq!(
            error,
            ExecuteError::Move(TransitionPhaseError::new(
                TransitionPhase::PreValidate,
                MoveError::Occupied { cell: Cell::new(3, 6) }
            ))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn execute_rejects_gaps_and_replays() {
        let mut state = GameState::opening(GameConfig::default(), P1, P1, P2);
        let end_turn = ActionKind::EndTurn(EndTurnAction::new(P1, 1));
        assert_eq!(
            GameEngine::new(&mut state).execute(&GameAction::confirmed(3, end_turn.clone())),
            Err(ExecuteError::SequenceGap { found: 3, current: 0 })
        );
        state.sequence_number = 5;
        assert_eq!(
            GameEngine::new(&mut state).execute(&GameAction::confirmed(5, end_turn)),
            Err(ExecuteError::AlreadyApplied { found: 5, current: 5 })
        );
    }
}
