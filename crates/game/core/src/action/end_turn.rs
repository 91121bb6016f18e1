use crate::action::{ActionTransition, Provenance};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{GameState, MatchStatus, PlayerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndTurnError {
    #[error("match is not in progress")]
    MatchNotActive,

    #[error("{player} is not the mover")]
    NotYourTurn { player: PlayerId },

    #[error("turn {claimed} ended but the match is on turn {current}")]
    TurnMismatch { claimed: u32, current: u32 },
}

impl GameError for EndTurnError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MatchNotActive => "END_TURN_MATCH_NOT_ACTIVE",
            Self::NotYourTurn { .. } => "END_TURN_NOT_YOUR_TURN",
            Self::TurnMismatch { .. } => "END_TURN_TURN_MISMATCH",
        }
    }
}

/// Hands the turn to the other seat and refills its mana.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndTurnAction {
    pub player: PlayerId,
    /// Turn being ended.
    pub turn_number: u32,
}

impl EndTurnAction {
    pub fn new(player: PlayerId, turn_number: u32) -> Self {
        Self { player, turn_number }
    }
}

impl ActionTransition for EndTurnAction {
    type Error = EndTurnError;
    type Result = ();

    fn actor(&self, _state: &GameState) -> Option<PlayerId> {
        Some(self.player)
    }

    fn pre_validate(&self, state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        let mover = state.mover_address().ok_or(EndTurnError::MatchNotActive)?;
        if mover != self.player {
            return Err(EndTurnError::NotYourTurn { player: self.player });
        }
        if self.turn_number != state.turn_number {
            return Err(EndTurnError::TurnMismatch {
                claimed: self.turn_number,
                current: state.turn_number,
            });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _provenance: Provenance) -> Result<Self::Result, Self::Error> {
        let next = state.mover().ok_or(EndTurnError::MatchNotActive)?.other();
        state.turn_number += 1;
        state.status = MatchStatus::to_move(next);
        state.player_mut(next).mana = state.config.mana_for_turn(state.turn_number);
        Ok(())
    }

    fn post_validate(&self, state: &GameState, _provenance: Provenance) -> Result<(), Self::Error> {
        match state.mover_address() {
            Some(mover) if mover != self.player => Ok(()),
            _ => Err(EndTurnError::NotYourTurn { player: self.player }),
        }
    }
}
