use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MazeError, Result};
use crate::grid::{Cell, GridModel, Position};

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLS: usize = 7;

/// Interior dividers of the default layout, as (row, col).
pub const DEFAULT_OBSTACLES: [(usize, usize); 6] =
    [(2, 3), (3, 1), (4, 3), (6, 2), (6, 3), (7, 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MazeKind {
    /// Bordered grid with start row, goal row and the fixed obstacle pattern.
    #[default]
    Default,
    /// Randomized layout. No generator exists; building it fails.
    Random,
}

impl MazeKind {
    pub fn name(self) -> &'static str {
        match self {
            MazeKind::Default => "default",
            MazeKind::Random => "random",
        }
    }

    pub fn from_random_flag(random: bool) -> Self {
        if random {
            MazeKind::Random
        } else {
            MazeKind::Default
        }
    }
}

impl fmt::Display for MazeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MazeBuilder {
    rows: usize,
    cols: usize,
    kind: MazeKind,
}

impl Default for MazeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl MazeBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            kind: MazeKind::Default,
        }
    }

    pub fn kind(mut self, kind: MazeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn build(self) -> Result<GridModel> {
        match self.kind {
            MazeKind::Default => default_layout(self.rows, self.cols),
            MazeKind::Random => Err(MazeError::UnsupportedMazeKind(MazeKind::Random)),
        }
    }
}

/// Fixed agent start for a grid of `rows` rows: second-to-last row, first interior column.
pub fn agent_start(rows: usize) -> Position {
    Position::new(rows.saturating_sub(2), 1)
}

fn default_layout(rows: usize, cols: usize) -> Result<GridModel> {
    // Border, start row (rows-2) and goal row (1) must be distinct rows,
    // and at least one interior column must exist.
    if rows < 4 || cols < 3 {
        return Err(MazeError::Configuration(format!(
            "grid {rows}x{cols} is too small; need at least 4x3 for border, start and goal rows"
        )));
    }

    let len = rows.checked_mul(cols).ok_or_else(|| {
        MazeError::Configuration(format!("grid {rows}x{cols} has too many cells"))
    })?;
    let mut cells = vec![Cell::Empty; len];
    let mut set = |r: usize, c: usize, cell: Cell| cells[r * cols + c] = cell;

    for c in 0..cols {
        set(0, c, Cell::Wall);
        set(rows - 1, c, Cell::Wall);
    }
    for r in 0..rows {
        set(r, 0, Cell::Wall);
        set(r, cols - 1, Cell::Wall);
    }
    for c in 1..cols - 1 {
        set(rows - 2, c, Cell::Start);
        set(1, c, Cell::Goal);
    }
    for &(r, c) in DEFAULT_OBSTACLES.iter() {
        // Smaller grids keep only the dividers that fall inside the interior.
        if r >= 1 && r + 1 < rows && c >= 1 && c + 1 < cols {
            set(r, c, Cell::Wall);
        }
    }

    GridModel::from_cells(rows, cols, cells)
}
