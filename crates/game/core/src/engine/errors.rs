//! Error types for the action execution pipeline.

use crate::action::{ActionTransition, AttackAction, EndTurnAction, MoveAction, SequenceNumber, SummonAction};
use crate::error::{ErrorSeverity, GameError};

/// Identifies which stage of the transition pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post_validate",
        }
    }
}

/// Associates a transition phase with the underlying error.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionPhaseError<E> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TransitionPhaseError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.phase.as_str(), self.error)
    }
}

impl<E: std::fmt::Display + std::fmt::Debug> std::error::Error for TransitionPhaseError<E> {}

/// Errors surfaced while executing an action through the game engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecuteError {
    #[error("summon action failed: {0}")]
    Summon(TransitionPhaseError<<SummonAction as ActionTransition>::Error>),

    #[error("move action failed: {0}")]
    Move(TransitionPhaseError<<MoveAction as ActionTransition>::Error>),

    #[error("attack action failed: {0}")]
    Attack(TransitionPhaseError<<AttackAction as ActionTransition>::Error>),

    #[error("end turn action failed: {0}")]
    EndTurn(TransitionPhaseError<<EndTurnAction as ActionTransition>::Error>),

    #[error("action {found} is already covered by state at {current}")]
    AlreadyApplied {
        found: SequenceNumber,
        current: SequenceNumber,
    },

    #[error("action {found} does not follow state at {current}")]
    SequenceGap {
        found: SequenceNumber,
        current: SequenceNumber,
    },
}

impl ExecuteError {
    /// Wrapped action error, if any.
    fn inner(&self) -> Option<&dyn GameError> {
        match self {
            Self::Summon(err) => Some(&err.error),
            Self::Move(err) => Some(&err.error),
            Self::Attack(err) => Some(&err.error),
            Self::EndTurn(err) => Some(&err.error),
            Self::AlreadyApplied { .. } | Self::SequenceGap { .. } => None,
        }
    }
}

impl GameError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        self.inner().map_or(ErrorSeverity::Internal, |err| err.severity())
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyApplied { .. } => "EXECUTE_ALREADY_APPLIED",
            Self::SequenceGap { .. } => "EXECUTE_SEQUENCE_GAP",
            _ => self.inner().map_or("EXECUTE", |err| err.error_code()),
        }
    }
}
