//! Board geometry shared by every rule in the crate.
//!
//! Cells are addressed as `(row, col)` pairs. Coordinates are signed so that
//! neighbour arithmetic never wraps; [`BoardDimensions::contains`] is the only
//! authority on whether a cell exists.
pub mod path;

use std::fmt;

pub use path::{Obstacles, Path, find_path};

/// Discrete board position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Taxicab (L1) distance between two cells.
    pub fn distance_to(self, other: Cell) -> u32 {
        taxicab(self, other)
    }

    pub(crate) fn offset(self, d_row: i32, d_col: i32) -> Cell {
        Cell::new(self.row + d_row, self.col + d_col)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Taxicab distance. Used as the admissible lower bound of every path search
/// and as the public distance input of attack and summon proofs.
pub fn taxicab(a: Cell, b: Cell) -> u32 {
    a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
}

/// Board size in rows and columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardDimensions {
    pub rows: u32,
    pub cols: u32,
}

impl BoardDimensions {
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Returns true if the cell lies in `[0, rows) × [0, cols)`.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.col >= 0 && (cell.row as u32) < self.rows && (cell.col as u32) < self.cols
    }

    /// Number of cells on the board.
    pub fn area(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Row-major index of an in-bounds cell.
    pub(crate) fn index_of(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.row as usize * self.cols as usize + cell.col as usize)
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows as i32).flat_map(move |row| (0..self.cols as i32).map(move |col| Cell::new(row, col)))
    }
}

impl fmt::Display for BoardDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
