// grid.rs - Grid types for the sparse Game of Life engine

use std::fmt;

use serde::Deserialize;

/// A cell address, 0-indexed as (row, column).
///
/// Signed so that off-board input such as `(-1, 0)` can be represented and
/// rejected rather than wrapping into a valid index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub const fn offset(self, (dr, dc): (i32, i32)) -> Self {
        Self {
            row: self.row.saturating_add(dr),
            col: self.col.saturating_add(dc),
        }
    }
}

impl From<(i32, i32)> for Coord {
    fn from((row, col): (i32, i32)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// The 8-neighborhood, in the order the neighbor scan visits it
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, 1), (1, 0), (0, -1), (-1, 0),
    (1, 1), (-1, 1), (1, -1), (-1, -1),
];

/// Which neighbors of a cell are considered to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Standard finite board: `0 <= row, col < size`.
    #[default]
    Clipped,
    /// Strict `0 < row, col < size`. Row 0 and column 0 are never counted as
    /// neighbors nor registered for evaluation, so edge cells on the top and
    /// left are undercounted while the bottom and right edges behave normally.
    Legacy,
}

impl EdgePolicy {
    /// Whether `coord` may take part in a neighbor count on a board of `size`.
    pub const fn admits(self, coord: Coord, size: i32) -> bool {
        match self {
            Self::Clipped => in_board(coord, size),
            Self::Legacy => coord.row > 0 && coord.row < size && coord.col > 0 && coord.col < size,
        }
    }
}

pub const fn in_board(coord: Coord, size: i32) -> bool {
    coord.row >= 0 && coord.row < size && coord.col >= 0 && coord.col < size
}

/// The admitted 8-neighbors of `coord`.
pub fn neighbors(coord: Coord, size: i32, policy: EdgePolicy) -> impl Iterator<Item = Coord> {
    NEIGHBOR_OFFSETS
        .into_iter()
        .map(move |offset| coord.offset(offset))
        .filter(move |&n| policy.admits(n, size))
}

/// Fixed-size N x N matrix of alive flags, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: i32,
    cells: Vec<bool>,
}

impl Grid {
    /// All-dead grid. `size` is validated by the engine before it gets here.
    pub(crate) fn new(size: i32) -> Self {
        let side = usize::try_from(size).unwrap_or(0);
        Self {
            size,
            cells: vec![false; side * side],
        }
    }

    pub const fn size(&self) -> i32 {
        self.size
    }

    pub const fn contains(&self, coord: Coord) -> bool {
        in_board(coord, self.size)
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.row).ok()?;
        let col = usize::try_from(coord.col).ok()?;
        let side = usize::try_from(self.size).ok()?;
        Some(row * side + col)
    }

    /// Off-board coordinates read as dead.
    pub fn is_alive(&self, coord: Coord) -> bool {
        self.index(coord)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    pub(crate) fn set(&mut self, coord: Coord, alive: bool) {
        if let Some(cell) = self.index(coord).and_then(|i| self.cells.get_mut(i)) {
            *cell = alive;
        }
    }

    pub fn live_neighbors(&self, coord: Coord, policy: EdgePolicy) -> u8 {
        let mut count = 0;
        for n in neighbors(coord, self.size, policy) {
            if self.is_alive(n) { count += 1; }
        }
        count
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }
}
