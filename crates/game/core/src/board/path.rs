//! Range-limited, obstacle-aware shortest-path search.
//!
//! The same search backs UI legality previews and the public `distance`
//! input of hidden-move proofs, so it must be reproducible across clients:
//! neighbours are always expanded in row-major order (up, left, right, down)
//! and the frontier is FIFO, which fixes the winner among equal-length paths.
use std::collections::{BTreeSet, VecDeque};

use super::{BoardDimensions, Cell, taxicab};
use crate::state::{GameState, Piece, Placement};

/// Neighbour offsets in row-major expansion order.
const NEIGHBOURS: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Cells that cannot be entered during a search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Obstacles {
    blocked: BTreeSet<Cell>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            blocked: cells.into_iter().collect(),
        }
    }

    /// Obstacles seen by `mover` in the given snapshot.
    ///
    /// Only visible, alive pieces other than the mover block. Hidden pieces
    /// never do, whoever owns them and whether or not they were revealed, so
    /// every client derives the same obstacle set from public state.
    pub fn for_mover(state: &GameState, mover: &Piece) -> Self {
        let blocked = state
            .pieces
            .values()
            .filter(|piece| piece.id != mover.id && piece.is_alive())
            .filter_map(|piece| match piece.placement {
                Placement::Visible(cell) => Some(cell),
                Placement::Hidden(_) => None,
            })
            .collect();
        Self { blocked }
    }

    pub fn insert(&mut self, cell: Cell) {
        self.blocked.insert(cell);
    }

    pub fn blocks(&self, cell: Cell) -> bool {
        self.blocked.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

/// Ordered steps of a move, excluding the origin and ending at the destination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path(Vec<Cell>);

impl Path {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    /// Number of unit steps, which is the proof's distance input.
    pub fn distance(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn destination(&self) -> Option<Cell> {
        self.0.last().copied()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Finds the shortest 4-connected path from `from` to `to` of at most
/// `max_distance` steps.
///
/// Returns `None` when either endpoint is off the board, when `to` is an
/// obstacle, or when no path within range exists. A request whose taxicab
/// distance already exceeds the range fails without searching, even if a
/// longer detour would be unobstructed.
pub fn find_path(
    from: Cell,
    to: Cell,
    dimensions: BoardDimensions,
    obstacles: &Obstacles,
    max_distance: u32,
) -> Option<Path> {
    if !dimensions.contains(from) || !dimensions.contains(to) || obstacles.blocks(to) {
        return None;
    }
    if taxicab(from, to) > max_distance {
        return None;
    }
    if from == to {
        return Some(Path::default());
    }

    let mut parents: Vec<Option<Cell>> = vec![None; dimensions.area()];
    let mut visited = vec![false; dimensions.area()];
    visited[dimensions.index_of(from)?] = true;

    let mut frontier = VecDeque::from([(from, 0u32)]);
    while let Some((cell, depth)) = frontier.pop_front() {
        for (d_row, d_col) in NEIGHBOURS {
            let next = cell.offset(d_row, d_col);
            let Some(index) = dimensions.index_of(next) else {
                continue;
            };
            if visited[index] || obstacles.blocks(next) {
                continue;
            }
            // Prune anything that cannot reach the target within range.
            if depth + 1 + taxicab(next, to) > max_distance {
                continue;
            }
            visited[index] = true;
            parents[index] = Some(cell);
            if next == to {
                return Some(reconstruct(from, to, dimensions, &parents));
            }
            frontier.push_back((next, depth + 1));
        }
    }

    None
}

fn reconstruct(from: Cell, to: Cell, dimensions: BoardDimensions, parents: &[Option<Cell>]) -> Path {
    let mut cells = vec![to];
    let mut cursor = to;
    while let Some(parent) = dimensions.index_of(cursor).and_then(|index| parents[index]) {
        if parent == from {
            break;
        }
        cells.push(parent);
        cursor = parent;
    }
    cells.reverse();
    Path(cells)
}
