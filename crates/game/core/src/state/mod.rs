//! Match snapshot representation.
//!
//! A [`GameState`] is always one player's view of the match: hidden pieces
//! are stored as that viewer knows them. Runtime layers clone or query this
//! state but mutate it exclusively through the engine.
pub mod piece;

use std::collections::BTreeMap;

pub use piece::{
    Commitment, HiddenPlacement, Piece, PieceCatalog, PieceId, PieceStats, PieceType, Placement,
    PlayerId, Salt,
};

use crate::action::SequenceNumber;
use crate::board::Cell;
use crate::config::GameConfig;

/// One of the two seats at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Seat {
    #[strum(serialize = "player 1")]
    One,
    #[strum(serialize = "player 2")]
    Two,
}

impl Seat {
    pub const fn other(self) -> Seat {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Seat::One => 0,
            Seat::Two => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchStatus {
    #[default]
    WaitingForPlayers,
    P1ToMove,
    P2ToMove,
    Complete,
}

impl MatchStatus {
    /// Seat whose turn it is, if the match is in progress.
    pub const fn mover(self) -> Option<Seat> {
        match self {
            MatchStatus::P1ToMove => Some(Seat::One),
            MatchStatus::P2ToMove => Some(Seat::Two),
            MatchStatus::WaitingForPlayers | MatchStatus::Complete => None,
        }
    }

    pub const fn to_move(seat: Seat) -> Self {
        match seat {
            Seat::One => MatchStatus::P1ToMove,
            Seat::Two => MatchStatus::P2ToMove,
        }
    }

    pub const fn is_active(self) -> bool {
        self.mover().is_some()
    }
}

/// Per-player bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    pub address: PlayerId,
    pub mana: u32,
}

impl PlayerState {
    pub const fn new(address: PlayerId, mana: u32) -> Self {
        Self { address, mana }
    }
}

/// Canonical snapshot of a match as seen by [`GameState::viewer`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    /// Sequence number of the last applied action; 0 before any action.
    pub sequence_number: SequenceNumber,
    pub turn_number: u32,
    pub status: MatchStatus,
    /// Player whose knowledge this snapshot encodes.
    pub viewer: PlayerId,
    pub players: [PlayerState; 2],
    pub config: GameConfig,
    /// All pieces ever summoned, dead ones included, ordered by id.
    pub pieces: BTreeMap<PieceId, Piece>,
}

impl GameState {
    /// Creates an empty match waiting for players.
    pub fn new(config: GameConfig, viewer: PlayerId, players: [PlayerState; 2]) -> Self {
        Self {
            sequence_number: 0,
            turn_number: 0,
            status: MatchStatus::WaitingForPlayers,
            viewer,
            players,
            config,
            pieces: BTreeMap::new(),
        }
    }

    /// Standard opening: one mothership per seat on opposite edges, player 1
    /// to move on turn 1.
    pub fn opening(config: GameConfig, viewer: PlayerId, player1: PlayerId, player2: PlayerId) -> Self {
        let rows = config.dimensions.rows as i32;
        let last_col = config.dimensions.cols as i32 - 1;
        let hp = config
            .catalog
            .stats(PieceType::Mothership)
            .map(|stats| stats.max_hp)
            .unwrap_or(1);

        let mut state = Self::new(
            config,
            viewer,
            [PlayerState::new(player1, 0), PlayerState::new(player2, 0)],
        );
        state.insert_piece(Piece::visible(PieceId(1), player1, PieceType::Mothership, hp, Cell::new(rows / 2, 0)));
        state.insert_piece(Piece::visible(
            PieceId(2),
            player2,
            PieceType::Mothership,
            hp,
            Cell::new(rows / 2, last_col),
        ));
        state.turn_number = 1;
        state.status = MatchStatus::P1ToMove;
        state.players[Seat::One.index()].mana = state.config.mana_for_turn(1);
        state
    }

    /// Same match, re-keyed to another viewer's knowledge.
    ///
    /// Hidden pieces not owned by the new viewer lose their location unless
    /// it was revealed; the new viewer's own hidden pieces keep whatever
    /// location this snapshot holds.
    pub fn view_for(&self, viewer: PlayerId) -> Self {
        let mut view = self.clone();
        view.viewer = viewer;
        for piece in view.pieces.values_mut() {
            if piece.owner != viewer && matches!(piece.placement, Placement::Hidden(HiddenPlacement::Known { .. })) {
                piece.placement = Placement::Hidden(HiddenPlacement::Unknown);
            }
        }
        view
    }

    pub fn insert_piece(&mut self, piece: Piece) {
        self.pieces.insert(piece.id, piece);
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(&id)
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(&id)
    }

    pub fn alive_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values().filter(|piece| piece.is_alive())
    }

    /// Alive piece occupying `cell` as far as this snapshot knows.
    pub fn piece_at(&self, cell: Cell) -> Option<&Piece> {
        self.alive_pieces().find(|piece| piece.location() == Some(cell))
    }

    /// Alive visible piece occupying `cell`. Only these are public knowledge.
    pub fn visible_piece_at(&self, cell: Cell) -> Option<&Piece> {
        self.alive_pieces()
            .find(|piece| matches!(piece.placement, Placement::Visible(at) if at == cell))
    }

    pub fn stats_of(&self, piece: &Piece) -> Option<&PieceStats> {
        self.config.catalog.stats(piece.piece_type)
    }

    /// Next free piece id (one past the largest ever used).
    pub fn next_piece_id(&self) -> PieceId {
        PieceId(self.pieces.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    pub fn player(&self, seat: Seat) -> &PlayerState {
        &self.players[seat.index()]
    }

    pub fn player_mut(&mut self, seat: Seat) -> &mut PlayerState {
        &mut self.players[seat.index()]
    }

    pub fn seat_of(&self, address: &PlayerId) -> Option<Seat> {
        [Seat::One, Seat::Two]
            .into_iter()
            .find(|seat| self.player(*seat).address == *address)
    }

    pub fn mover(&self) -> Option<Seat> {
        self.status.mover()
    }

    pub fn mover_address(&self) -> Option<PlayerId> {
        self.mover().map(|seat| self.player(seat).address)
    }

    pub fn is_turn_of(&self, address: &PlayerId) -> bool {
        self.mover_address().as_ref() == Some(address)
    }

    pub fn mana_of(&self, seat: Seat) -> u32 {
        self.player(seat).mana
    }

    /// Alive mothership of `owner`, if any.
    pub fn mothership_of(&self, owner: &PlayerId) -> Option<&Piece> {
        self.alive_pieces()
            .find(|piece| piece.owner == *owner && piece.piece_type == PieceType::Mothership)
    }

    /// Winner of a completed match: the seat whose mothership survived.
    pub fn winner(&self) -> Option<Seat> {
        if self.status != MatchStatus::Complete {
            return None;
        }
        let survivors: Vec<Seat> = [Seat::One, Seat::Two]
            .into_iter()
            .filter(|seat| self.mothership_of(&self.player(*seat).address).is_some())
            .collect();
        match survivors.as_slice() {
            [seat] => Some(*seat),
            _ => None,
        }
    }

    /// Completes the match once a seat has lost its last mothership.
    pub(crate) fn check_completion(&mut self) {
        if !self.status.is_active() {
            return;
        }
        let lost = [Seat::One, Seat::Two].into_iter().any(|seat| {
            let address = self.player(seat).address;
            let fielded = self
                .pieces
                .values()
                .any(|piece| piece.owner == address && piece.piece_type == PieceType::Mothership);
            fielded && self.mothership_of(&address).is_none()
        });
        if lost {
            self.status = MatchStatus::Complete;
        }
    }

    /// SHA-256 of the canonical bincode encoding.
    ///
    /// Two snapshots with equal roots are bit-identical, which is how replay
    /// determinism is checked across processes.
    #[cfg(feature = "serde")]
    pub fn state_root(&self) -> Result<[u8; 32], bincode::Error> {
        use sha2::{Digest, Sha256};

        let bytes = bincode::serialize(self)?;
        Ok(Sha256::digest(&bytes).into())
    }
}
