//! OpenMaze: a discrete grid-world reinforcement-learning environment.
//!
//! A fixed maze (`maze`) produces an immutable `GridModel`; the `OpenMaze`
//! engine moves an agent over it and scores each move with one of several
//! `RewardPolicy` variants.

#[path = "core/actions.rs"]
pub mod actions;

#[path = "core/engine.rs"]
pub mod engine;

#[path = "core/episode.rs"]
pub mod episode;

#[path = "core/grid.rs"]
pub mod grid;

#[path = "core/maze.rs"]
pub mod maze;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/reward.rs"]
pub mod reward;

pub mod config;
pub mod error;
pub mod render;
pub mod runner;
pub mod stats;

pub use actions::{legal_moves, ActionMask, Direction};
pub use config::{EnvConfig, RewardConfig};
pub use engine::{Info, ObservationBounds, OpenMaze, Phase, Transition};
pub use error::{MazeError, Result};
pub use grid::{Cell, GridModel, Position};
pub use maze::{MazeBuilder, MazeKind};
pub use reward::{CycleRewards, RewardPolicy, UrgencyCurve, UrgencyFn};
