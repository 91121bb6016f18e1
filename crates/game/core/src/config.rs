use crate::board::BoardDimensions;
use crate::state::PieceCatalog;

/// Rule constants of a match.
///
/// Published by the ledger together with the match, so every snapshot carries
/// its own copy and replay never depends on process-wide settings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub dimensions: BoardDimensions,
    /// Upper bound of the mana refill at the start of a turn.
    pub mana_ceiling: u32,
    /// Maximum taxicab distance between a summoned piece and its mothership.
    pub summon_range: u32,
    pub catalog: PieceCatalog,
}

impl GameConfig {
    pub const DEFAULT_ROWS: u32 = 7;
    pub const DEFAULT_COLS: u32 = 7;
    pub const DEFAULT_MANA_CEILING: u32 = 8;
    pub const DEFAULT_SUMMON_RANGE: u32 = 1;

    pub fn new() -> Self {
        Self {
            dimensions: BoardDimensions::new(Self::DEFAULT_ROWS, Self::DEFAULT_COLS),
            mana_ceiling: Self::DEFAULT_MANA_CEILING,
            summon_range: Self::DEFAULT_SUMMON_RANGE,
            catalog: PieceCatalog::standard(),
        }
    }

    pub fn with_dimensions(mut self, rows: u32, cols: u32) -> Self {
        self.dimensions = BoardDimensions::new(rows, cols);
        self
    }

    pub fn with_mana_ceiling(mut self, mana_ceiling: u32) -> Self {
        self.mana_ceiling = mana_ceiling;
        self
    }

    pub fn with_catalog(mut self, catalog: PieceCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Mana refilled for the mover at the start of `turn_number`.
    pub fn mana_for_turn(&self, turn_number: u32) -> u32 {
        turn_number.min(self.mana_ceiling)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
