use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MazeError;
use crate::grid::{GridModel, Position};

/// A cardinal move. Index order is fixed: N=0, E=1, S=2, W=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn from_index(i: i64) -> Result<Self, MazeError> {
        match i {
            0 => Ok(Direction::North),
            1 => Ok(Direction::East),
            2 => Ok(Direction::South),
            3 => Ok(Direction::West),
            _ => Err(MazeError::InvalidAction(i.to_string())),
        }
    }

    /// (row, col) delta.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::East => "E",
            Direction::South => "S",
            Direction::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" | "up" => Ok(Direction::North),
            "e" | "east" | "right" => Ok(Direction::East),
            "s" | "south" | "down" => Ok(Direction::South),
            "w" | "west" | "left" => Ok(Direction::West),
            other => match other.parse::<i64>() {
                Ok(i) => Direction::from_index(i),
                Err(_) => Err(MazeError::InvalidAction(s.to_string())),
            },
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = MazeError;

    fn try_from(i: i64) -> Result<Self, Self::Error> {
        Direction::from_index(i)
    }
}

impl TryFrom<usize> for Direction {
    type Error = MazeError;

    fn try_from(i: usize) -> Result<Self, Self::Error> {
        i64::try_from(i)
            .map_err(|_| MazeError::InvalidAction(i.to_string()))
            .and_then(Direction::from_index)
    }
}

/// Legality bits for the four moves, bit `i` set when `Direction::ALL[i]` is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionMask(u8);

impl ActionMask {
    pub const NONE: ActionMask = ActionMask(0);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_legal(self, dir: Direction) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn legal_directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.is_legal(*d))
    }

    /// One 0/1 entry per direction, in index order.
    pub fn to_vec(self) -> Vec<u8> {
        Direction::ALL
            .iter()
            .map(|d| u8::from(self.is_legal(*d)))
            .collect()
    }

    fn set(&mut self, dir: Direction) {
        self.0 |= 1 << dir.index();
    }
}

/// Legal moves from `position`: destination in bounds and not a wall.
///
/// A position that is itself out of bounds or a wall has no legal moves.
pub fn legal_moves(position: Position, grid: &GridModel) -> ActionMask {
    match grid.cell(position) {
        Some(cell) if !cell.is_wall() => {}
        _ => return ActionMask::NONE,
    }

    let mut mask = ActionMask::NONE;
    for dir in Direction::ALL {
        let open = grid
            .offset(position, dir)
            .and_then(|p| grid.cell(p))
            .is_some_and(|c| !c.is_wall());
        if open {
            mask.set(dir);
        }
    }
    mask
}
