//! Turning a player's intent into a concrete, proof-ready action.

use crate::action::{ActionKind, AttackAction, EndTurnAction, HpPair, MoveAction, SummonAction, resolve_attack};
use crate::board::{BoardDimensions, Cell, Obstacles, find_path, taxicab};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{GameState, PieceId, PieceType, PlayerId, Salt};

use super::{has_attacked, has_moved};

/// What the local player asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Intent {
    Summon { piece_type: PieceType, cell: Cell },
    Move { piece_id: PieceId, to: Cell },
    Attack { attacker_id: PieceId, target_id: PieceId },
    EndTurn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntentError {
    #[error("match is not in progress")]
    MatchNotActive,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("piece {0} not found")]
    PieceNotFound(PieceId),

    #[error("piece {0} is not yours")]
    NotOwner(PieceId),

    #[error("piece {0} is dead")]
    PieceDead(PieceId),

    #[error("piece {0} already moved this turn")]
    AlreadyMoved(PieceId),

    #[error("piece {0} already attacked this turn")]
    AlreadyAttacked(PieceId),

    #[error("piece {0} cannot move")]
    CannotMove(PieceId),

    #[error("location of piece {0} is unknown")]
    LocationUnknown(PieceId),

    #[error("no path to {to} within range")]
    NoPath { to: Cell },

    #[error("target at distance {distance} is outside range {min}..={max}")]
    OutOfRange { distance: u32, min: u32, max: u32 },

    #[error("piece {0} is on your side")]
    FriendlyTarget(PieceId),

    #[error("summon costs {required} mana but only {available} is available")]
    InsufficientMana { required: u32, available: u32 },

    #[error("cell {0} is out of bounds")]
    OutOfBounds(Cell),

    #[error("cell {0} is occupied")]
    CellOccupied(Cell),

    #[error("you have no mothership")]
    NoMothership,

    #[error("cell is {distance} away from the mothership, at most {max} allowed")]
    TooFarFromMothership { distance: u32, max: u32 },

    #[error("{0} is not in the catalog")]
    UnknownPieceType(PieceType),
}

impl GameError for IntentError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PieceNotFound(_) | Self::NotOwner(_) | Self::UnknownPieceType(_) | Self::OutOfBounds(_) => {
                ErrorSeverity::Validation
            }
            Self::LocationUnknown(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MatchNotActive => "INTENT_MATCH_NOT_ACTIVE",
            Self::NotYourTurn => "INTENT_NOT_YOUR_TURN",
            Self::PieceNotFound(_) => "INTENT_PIECE_NOT_FOUND",
            Self::NotOwner(_) => "INTENT_NOT_OWNER",
            Self::PieceDead(_) => "INTENT_PIECE_DEAD",
            Self::AlreadyMoved(_) => "INTENT_ALREADY_MOVED",
            Self::AlreadyAttacked(_) => "INTENT_ALREADY_ATTACKED",
            Self::CannotMove(_) => "INTENT_CANNOT_MOVE",
            Self::LocationUnknown(_) => "INTENT_LOCATION_UNKNOWN",
            Self::NoPath { .. } => "INTENT_NO_PATH",
            Self::OutOfRange { .. } => "INTENT_OUT_OF_RANGE",
            Self::FriendlyTarget(_) => "INTENT_FRIENDLY_TARGET",
            Self::InsufficientMana { .. } => "INTENT_INSUFFICIENT_MANA",
            Self::OutOfBounds(_) => "INTENT_OUT_OF_BOUNDS",
            Self::CellOccupied(_) => "INTENT_CELL_OCCUPIED",
            Self::NoMothership => "INTENT_NO_MOTHERSHIP",
            Self::TooFarFromMothership { .. } => "INTENT_TOO_FAR_FROM_MOTHERSHIP",
            Self::UnknownPieceType(_) => "INTENT_UNKNOWN_PIECE_TYPE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WitnessKind {
    Summon,
    Move,
    Attack,
}

/// Public and private inputs a hidden-piece proof needs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WitnessPlan {
    pub kind: WitnessKind,
    pub from: Cell,
    pub to: Cell,
    /// Commitment salts in proof order: the current one first, then the new one.
    pub salts: Vec<Salt>,
    pub distance: u32,
    pub dimensions: BoardDimensions,
}

/// A legal intent, ready to be appended as a prediction and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannedAction {
    pub kind: ActionKind,
    /// Present when a hidden piece is involved and a proof must accompany the
    /// submission.
    pub witness: Option<WitnessPlan>,
}

/// Checks `intent` for `viewer` against `state` and plans the resulting action.
///
/// `fresh_salt` is consumed only when a hidden piece gets a new commitment.
pub fn validate_intent(
    state: &GameState,
    viewer: &PlayerId,
    intent: &Intent,
    fresh_salt: Salt,
) -> Result<PlannedAction, IntentError> {
    if !state.status.is_active() {
        return Err(IntentError::MatchNotActive);
    }
    if !state.is_turn_of(viewer) {
        return Err(IntentError::NotYourTurn);
    }

    match *intent {
        Intent::Summon { piece_type, cell } => plan_summon(state, viewer, piece_type, cell, fresh_salt),
        Intent::Move { piece_id, to } => plan_move(state, viewer, piece_id, to, fresh_salt),
        Intent::Attack {
            attacker_id,
            target_id,
        } => plan_attack(state, viewer, attacker_id, target_id),
        Intent::EndTurn => Ok(PlannedAction {
            kind: ActionKind::EndTurn(EndTurnAction::new(*viewer, state.turn_number)),
            witness: None,
        }),
    }
}

fn plan_summon(
    state: &GameState,
    viewer: &PlayerId,
    piece_type: PieceType,
    cell: Cell,
    fresh_salt: Salt,
) -> Result<PlannedAction, IntentError> {
    let stats = state
        .config
        .catalog
        .stats(piece_type)
        .ok_or(IntentError::UnknownPieceType(piece_type))?;
    let available = state
        .seat_of(viewer)
        .map_or(0, |seat| state.mana_of(seat));
    if available < stats.cost {
        return Err(IntentError::InsufficientMana {
            required: stats.cost,
            available,
        });
    }
    if !state.config.dimensions.contains(cell) {
        return Err(IntentError::OutOfBounds(cell));
    }
    if state.piece_at(cell).is_some() {
        return Err(IntentError::CellOccupied(cell));
    }

    let mothership = state.mothership_of(viewer).ok_or(IntentError::NoMothership)?;
    let origin = mothership
        .location()
        .ok_or(IntentError::LocationUnknown(mothership.id))?;
    let distance = taxicab(origin, cell);
    if distance > state.config.summon_range {
        return Err(IntentError::TooFarFromMothership {
            distance,
            max: state.config.summon_range,
        });
    }

    let summon = SummonAction::new(*viewer, state.next_piece_id(), piece_type, cell);
    if !stats.hidden {
        return Ok(PlannedAction {
            kind: ActionKind::Summon(summon),
            witness: None,
        });
    }
    Ok(PlannedAction {
        kind: ActionKind::Summon(summon.with_salt(fresh_salt)),
        witness: Some(WitnessPlan {
            kind: WitnessKind::Summon,
            from: origin,
            to: cell,
            salts: vec![fresh_salt],
            distance,
            dimensions: state.config.dimensions,
        }),
    })
}

fn plan_move(
    state: &GameState,
    viewer: &PlayerId,
    piece_id: PieceId,
    to: Cell,
    fresh_salt: Salt,
) -> Result<PlannedAction, IntentError> {
    let piece = state.piece(piece_id).ok_or(IntentError::PieceNotFound(piece_id))?;
    if piece.owner != *viewer {
        return Err(IntentError::NotOwner(piece_id));
    }
    if !piece.is_alive() {
        return Err(IntentError::PieceDead(piece_id));
    }
    if has_attacked(state, piece) {
        return Err(IntentError::AlreadyAttacked(piece_id));
    }
    if has_moved(state, piece) {
        return Err(IntentError::AlreadyMoved(piece_id));
    }
    let stats = state
        .stats_of(piece)
        .ok_or(IntentError::UnknownPieceType(piece.piece_type))?;
    if stats.move_range == 0 {
        return Err(IntentError::CannotMove(piece_id));
    }
    let from = piece.location().ok_or(IntentError::LocationUnknown(piece_id))?;
    if !state.config.dimensions.contains(to) {
        return Err(IntentError::OutOfBounds(to));
    }

    let obstacles = Obstacles::for_mover(state, piece);
    let path = find_path(from, to, state.config.dimensions, &obstacles, stats.move_range)
        .filter(|path| !path.is_empty())
        .ok_or(IntentError::NoPath { to })?;
    let distance = path.distance();
    let movement = MoveAction::new(piece_id, path.into_cells());

    if !piece.is_hidden() {
        return Ok(PlannedAction {
            kind: ActionKind::Move(movement),
            witness: None,
        });
    }
    let current = piece.salt().ok_or(IntentError::LocationUnknown(piece_id))?;
    Ok(PlannedAction {
        kind: ActionKind::Move(movement.with_salt(fresh_salt)),
        witness: Some(WitnessPlan {
            kind: WitnessKind::Move,
            from,
            to,
            salts: vec![current, fresh_salt],
            distance,
            dimensions: state.config.dimensions,
        }),
    })
}

fn plan_attack(
    state: &GameState,
    viewer: &PlayerId,
    attacker_id: PieceId,
    target_id: PieceId,
) -> Result<PlannedAction, IntentError> {
    let attacker = state
        .piece(attacker_id)
        .ok_or(IntentError::PieceNotFound(attacker_id))?;
    if attacker.owner != *viewer {
        return Err(IntentError::NotOwner(attacker_id));
    }
    if !attacker.is_alive() {
        return Err(IntentError::PieceDead(attacker_id));
    }
    if has_attacked(state, attacker) {
        return Err(IntentError::AlreadyAttacked(attacker_id));
    }

    let target = state.piece(target_id).ok_or(IntentError::PieceNotFound(target_id))?;
    if target.owner == *viewer {
        return Err(IntentError::FriendlyTarget(target_id));
    }
    if !target.is_alive() {
        return Err(IntentError::PieceDead(target_id));
    }

    let from = attacker
        .location()
        .ok_or(IntentError::LocationUnknown(attacker_id))?;
    let to = target.location().ok_or(IntentError::LocationUnknown(target_id))?;
    let attacker_stats = state
        .stats_of(attacker)
        .ok_or(IntentError::UnknownPieceType(attacker.piece_type))?;
    let target_stats = state
        .stats_of(target)
        .ok_or(IntentError::UnknownPieceType(target.piece_type))?;
    let distance = taxicab(from, to);
    if !attacker_stats.in_attack_range(distance) {
        return Err(IntentError::OutOfRange {
            distance,
            min: attacker_stats.attack_min_range,
            max: attacker_stats.attack_max_range,
        });
    }

    let before = HpPair::new(attacker.hp, target.hp);
    let after = resolve_attack(attacker_stats, target_stats, before, distance);
    let attack = AttackAction::new(attacker_id, target_id)
        .with_cells(
            attacker.is_hidden().then_some(from),
            target.is_hidden().then_some(to),
        )
        .with_outcome(before, after);

    let witness = attacker.salt().map(|salt| WitnessPlan {
        kind: WitnessKind::Attack,
        from,
        to,
        salts: vec![salt],
        distance,
        dimensions: state.config.dimensions,
    });
    Ok(PlannedAction {
        kind: ActionKind::Attack(attack),
        witness,
    })
}
