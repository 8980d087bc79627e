use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actions::Direction;
use crate::error::{MazeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Wall,
    Start,
    Goal,
}

impl Cell {
    /// Legacy numeric code: 0 empty, 1 wall, 2 start, 3 goal.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Wall => 1,
            Cell::Start => 2,
            Cell::Goal => 3,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Wall => '#',
            Cell::Start => 'S',
            Cell::Goal => 'G',
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Cell::Wall)
    }
}

/// Grid coordinate. Row 0 is the top row; north is `row - 1`.
/// Serializes as a `[row, col]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (usize, usize) {
    fn from(p: Position) -> Self {
        (p.row, p.col)
    }
}

/// Immutable cell grid plus the derived goal set.
///
/// Built once per environment and shared read-only by every episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    goals: Vec<Position>,
}

impl GridModel {
    /// Wraps a row-major cell buffer. Fails if the buffer does not match the
    /// dimensions or holds no goal cell.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(MazeError::Configuration(format!(
                "grid dimensions must be positive, got {rows}x{cols}"
            )));
        }
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            MazeError::Configuration(format!("grid {rows}x{cols} has too many cells"))
        })?;
        if cells.len() != expected {
            return Err(MazeError::Configuration(format!(
                "expected {expected} cells for a {rows}x{cols} grid, got {}",
                cells.len()
            )));
        }

        let goals: Vec<Position> = cells
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Cell::Goal))
            .map(|(i, _)| Position::new(i / cols, i % cols))
            .collect();
        if goals.is_empty() {
            return Err(MazeError::Configuration(
                "grid contains no goal cell".to_string(),
            ));
        }

        Ok(Self {
            rows,
            cols,
            cells,
            goals,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn goal_cells(&self) -> &[Position] {
        &self.goals
    }

    pub fn in_bounds(&self, p: Position) -> bool {
        p.row < self.rows && p.col < self.cols
    }

    pub fn cell(&self, p: Position) -> Option<Cell> {
        if self.in_bounds(p) {
            Some(self.cells[self.idx(p)])
        } else {
            None
        }
    }

    /// Neighbor of `p` in direction `dir`, or `None` when it leaves the grid.
    pub fn offset(&self, p: Position, dir: Direction) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = p.row.checked_add_signed(dr)?;
        let col = p.col.checked_add_signed(dc)?;
        let next = Position::new(row, col);
        self.in_bounds(next).then_some(next)
    }

    /// Manhattan distance to the nearest goal cell.
    pub fn distance_to_goal(&self, p: Position) -> usize {
        self.goals
            .iter()
            .map(|g| g.manhattan(p))
            .min()
            .unwrap_or(usize::MAX)
    }

    /// Copy of the cells as one `Vec` per row.
    pub fn cell_rows(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(self.cols).map(|r| r.to_vec()).collect()
    }

    fn idx(&self, p: Position) -> usize {
        p.row * self.cols + p.col
    }
}
