//! Action transition dispatch.

use crate::action::{ActionKind, ActionTransition, Provenance};
use crate::state::GameState;

use super::ActionOutcome;
use super::errors::{ExecuteError, TransitionPhase, TransitionPhaseError};

/// Runs a transition through pre_validate, apply and post_validate.
#[inline]
fn drive_transition<T>(
    transition: &T,
    state: &mut GameState,
    provenance: Provenance,
) -> Result<T::Result, TransitionPhaseError<T::Error>>
where
    T: ActionTransition,
{
    transition
        .pre_validate(state, provenance)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    let result = transition
        .apply(state, provenance)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(state, provenance)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))?;

    Ok(result)
}

/// Routes each action variant to its transition.
pub(super) fn execute_transition(
    kind: &ActionKind,
    state: &mut GameState,
    provenance: Provenance,
) -> Result<ActionOutcome, ExecuteError> {
    match kind {
        ActionKind::Summon(transition) => {
            let piece = drive_transition(transition, state, provenance).map_err(ExecuteError::Summon)?;
            Ok(ActionOutcome::Summoned(piece))
        }
        ActionKind::Move(transition) => {
            drive_transition(transition, state, provenance).map_err(ExecuteError::Move)?;
            Ok(ActionOutcome::Moved)
        }
        ActionKind::Attack(transition) => {
            let outcome = drive_transition(transition, state, provenance).map_err(ExecuteError::Attack)?;
            Ok(ActionOutcome::Attacked(outcome))
        }
        ActionKind::EndTurn(transition) => {
            drive_transition(transition, state, provenance).map_err(ExecuteError::EndTurn)?;
            Ok(ActionOutcome::TurnEnded)
        }
    }
}
