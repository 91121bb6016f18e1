//! Deterministic match rules and data types shared across clients.
//!
//! `game-core` defines the canonical rules of a two-player fleet match with
//! hidden units: board geometry and pathfinding, pieces and their
//! visibility, the four actions, the engine that applies them, and the
//! legality checks behind local intents. It performs no I/O; the runtime
//! crate wraps it with history reconciliation and ledger access.
//!
//! All state mutation flows through [`engine::GameEngine`], and history
//! replay through [`engine::project`].
pub mod action;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod state;

pub use action::{
    ActionKind, ActionTransition, AttackAction, AttackError, AttackOutcome, EndTurnAction, EndTurnError,
    GameAction, HpPair, MoveAction, MoveError, Provenance, SequenceNumber, SummonAction, SummonError,
    resolve_attack,
};
pub use board::{BoardDimensions, Cell, Obstacles, Path, find_path, taxicab};
pub use config::GameConfig;
pub use engine::{
    ActionOutcome, Discrepancy, DiscrepancyKind, ExecuteError, GameEngine, Projection, TransitionPhase,
    TransitionPhaseError, project,
};
pub use error::{ErrorSeverity, GameError};
pub use rules::{
    Intent, IntentError, PlannedAction, WitnessKind, WitnessPlan, can_act, can_attack, can_move, has_attacked,
    has_moved, legal_attacks, legal_moves, validate_intent,
};
pub use state::{
    Commitment, GameState, HiddenPlacement, MatchStatus, Piece, PieceCatalog, PieceId, PieceStats, PieceType,
    Placement, PlayerId, PlayerState, Salt, Seat,
};
