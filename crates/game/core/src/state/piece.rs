//! Pieces, their static stats, and visibility rules.
//!
//! A piece is either visible (both players see where it is) or hidden. A
//! hidden piece's [`HiddenPlacement`] depends on whose snapshot it lives in:
//! the owner holds the location plus the commitment salt, the opponent holds
//! nothing until a reveal, and only the location afterwards.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use strum::IntoEnumIterator;

use crate::board::Cell;

/// Stable identifier of a piece for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ledger account of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub [u8; 20]);

impl PlayerId {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address made of one repeated byte; handy for fixtures and local matches.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for PlayerId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Unit classes. Static stats live in the [`PieceCatalog`] shipped with the
/// match configuration.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceType {
    Mothership,
    Cruiser,
    Frigate,
    Corvette,
    Submarine,
    Warship,
}

/// Static stats of a unit class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceStats {
    pub cost: u32,
    pub move_range: u32,
    pub attack_min_range: u32,
    pub attack_max_range: u32,
    pub max_hp: u32,
    pub attack: u32,
    /// The attacker dies when it attacks.
    pub kamikaze: bool,
    /// Location is committed on-chain instead of published.
    pub hidden: bool,
}

impl PieceStats {
    /// Returns true if `distance` lies within the inclusive attack range.
    pub fn in_attack_range(&self, distance: u32) -> bool {
        self.attack_min_range <= distance && distance <= self.attack_max_range
    }
}

/// Stat table per unit class.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceCatalog(BTreeMap<PieceType, PieceStats>);

impl PieceCatalog {
    pub fn new(entries: impl IntoIterator<Item = (PieceType, PieceStats)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Default fleet used by local matches and fixtures.
    pub fn standard() -> Self {
        Self::new(PieceType::iter().map(|kind| (kind, standard_stats(kind))))
    }

    pub fn stats(&self, kind: PieceType) -> Option<&PieceStats> {
        self.0.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PieceType, &PieceStats)> {
        self.0.iter()
    }
}

impl Default for PieceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

const fn standard_stats(kind: PieceType) -> PieceStats {
    let (cost, move_range, min, max, hp, attack, kamikaze, hidden) = match kind {
        PieceType::Mothership => (0, 0, 1, 2, 20, 2, false, false),
        PieceType::Cruiser => (2, 2, 1, 1, 3, 2, false, false),
        PieceType::Frigate => (3, 1, 2, 3, 2, 3, false, false),
        PieceType::Corvette => (4, 3, 1, 2, 4, 2, false, false),
        PieceType::Submarine => (4, 2, 1, 1, 1, 5, true, true),
        PieceType::Warship => (5, 1, 1, 2, 6, 3, false, false),
    };
    PieceStats {
        cost,
        move_range,
        attack_min_range: min,
        attack_max_range: max,
        max_hp: hp,
        attack,
        kamikaze,
        hidden,
    }
}

/// Commitment entropy known only to a hidden piece's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Salt(pub u128);

/// Binding commitment to a hidden piece's cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    /// SHA-256 over `row || col || salt`, all big-endian.
    pub fn compute(cell: Cell, salt: Salt) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(cell.row.to_be_bytes());
        hasher.update(cell.col.to_be_bytes());
        hasher.update(salt.0.to_be_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// What this snapshot knows about a hidden piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HiddenPlacement {
    /// Owner's view: location and the salt behind the on-chain commitment.
    Known { cell: Cell, salt: Salt },
    /// Location disclosed by a reveal; the salt stays private.
    Revealed { cell: Cell },
    /// Nothing but the existence of the piece.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placement {
    Visible(Cell),
    Hidden(HiddenPlacement),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pub id: PieceId,
    pub owner: PlayerId,
    pub piece_type: PieceType,
    /// Dead at zero. Dead pieces stay in the state for history.
    pub hp: u32,
    /// Turn of the last move; 0 if never moved.
    pub last_move_turn: u32,
    /// Turn of the last attack; 0 if never attacked.
    pub last_attack_turn: u32,
    pub placement: Placement,
}

impl Piece {
    pub fn visible(id: PieceId, owner: PlayerId, piece_type: PieceType, hp: u32, cell: Cell) -> Self {
        Self {
            id,
            owner,
            piece_type,
            hp,
            last_move_turn: 0,
            last_attack_turn: 0,
            placement: Placement::Visible(cell),
        }
    }

    pub fn hidden(
        id: PieceId,
        owner: PlayerId,
        piece_type: PieceType,
        hp: u32,
        placement: HiddenPlacement,
    ) -> Self {
        Self {
            id,
            owner,
            piece_type,
            hp,
            last_move_turn: 0,
            last_attack_turn: 0,
            placement: Placement::Hidden(placement),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.placement, Placement::Hidden(_))
    }

    /// Location as far as this snapshot knows.
    pub fn location(&self) -> Option<Cell> {
        match self.placement {
            Placement::Visible(cell)
            | Placement::Hidden(HiddenPlacement::Known { cell, .. })
            | Placement::Hidden(HiddenPlacement::Revealed { cell }) => Some(cell),
            Placement::Hidden(HiddenPlacement::Unknown) => None,
        }
    }

    /// Salt of an owner-held hidden piece.
    pub fn salt(&self) -> Option<Salt> {
        match self.placement {
            Placement::Hidden(HiddenPlacement::Known { salt, .. }) => Some(salt),
            _ => None,
        }
    }

    /// Current commitment of an owner-held hidden piece.
    pub fn commitment(&self) -> Option<Commitment> {
        match self.placement {
            Placement::Hidden(HiddenPlacement::Known { cell, salt }) => Some(Commitment::compute(cell, salt)),
            _ => None,
        }
    }

    /// Whether `viewer` knows this piece's location.
    ///
    /// Visible pieces are known to everyone. A hidden piece is always known
    /// to its owner and known to the opponent only after a reveal.
    pub fn is_known_to(&self, viewer: &PlayerId) -> bool {
        match self.placement {
            Placement::Visible(_) => true,
            Placement::Hidden(_) if self.owner == *viewer => true,
            Placement::Hidden(HiddenPlacement::Revealed { .. }) => true,
            Placement::Hidden(_) => false,
        }
    }

    /// Marks an opponent's hidden piece as located at `cell`. Owner-held and
    /// visible placements are left untouched.
    pub(crate) fn reveal_at(&mut self, cell: Cell) {
        if let Placement::Hidden(HiddenPlacement::Unknown | HiddenPlacement::Revealed { .. }) = self.placement {
            self.placement = Placement::Hidden(HiddenPlacement::Revealed { cell });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: PlayerId = PlayerId::repeat_byte(1);
    const THEM: PlayerId = PlayerId::repeat_byte(2);

    #[test]
    fn visible_pieces_are_known_to_everyone() {
        let piece = Piece::visible(PieceId(1), ME, PieceType::Cruiser, 3, Cell::new(2, 2));
        assert!(!piece.is_hidden());
        assert!(piece.is_known_to(&ME));
        assert!(piece.is_known_to(&THEM));
        assert_eq!(piece.location(), Some(Cell::new(2, 2)));
    }

    #[test]
    fn hidden_piece_is_known_to_owner_only_until_revealed() {
        let mut theirs = Piece::hidden(PieceId(4), THEM, PieceType::Submarine, 1, HiddenPlacement::Unknown);
        assert!(theirs.is_hidden());
        assert!(!theirs.is_known_to(&ME));
        assert!(theirs.is_known_to(&THEM));
        assert_eq!(theirs.location(), None);

        theirs.reveal_at(Cell::new(3, 3));
        assert!(theirs.is_known_to(&ME));
        assert_eq!(theirs.location(), Some(Cell::new(3, 3)));
        assert_eq!(theirs.salt(), None);
    }

    #[test]
    fn owner_view_carries_salt_and_commitment() {
        let salt = Salt(42);
        let cell = Cell::new(1, 4);
        let mine = Piece::hidden(
            PieceId(5),
            ME,
            PieceType::Submarine,
            1,
            HiddenPlacement::Known { cell, salt },
        );
        assert_eq!(mine.salt(), Some(salt));
        assert_eq!(mine.commitment(), Some(Commitment::compute(cell, salt)));
        assert_ne!(Commitment::compute(cell, Salt(43)), Commitment::compute(cell, salt));
    }

    #[test]
    fn piece_types_parse_case_insensitively() {
        assert_eq!("submarine".parse::<PieceType>().ok(), Some(PieceType::Submarine));
        assert_eq!("Cruiser".parse::<PieceType>().ok(), Some(PieceType::Cruiser));
        assert_eq!(PieceType::Warship.to_string(), "warship");
    }

    #[test]
    fn player_ids_round_trip_through_hex() {
        let id = PlayerId::repeat_byte(0xab);
        let parsed: PlayerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn standard_catalog_covers_every_class() {
        let catalog = PieceCatalog::standard();
        for kind in PieceType::iter() {
            assert!(catalog.stats(kind).is_some(), "{kind}");
        }
        let sub = catalog.stats(PieceType::Submarine).unwrap();
        assert!(sub.hidden && sub.kamikaze);
    }
}
