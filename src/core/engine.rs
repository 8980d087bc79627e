//! The transition engine: one configurable state machine for every reward policy.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::actions::{self, ActionMask, Direction};
use crate::episode::EpisodeState;
use crate::error::{MazeError, Result};
use crate::grid::{Cell, GridModel, Position};
use crate::maze::agent_start;
use crate::render::{render_ascii, EnvSnapshot, RenderMode, Rendered, Renderer};
use crate::reward::RewardPolicy;

/// Open side channel returned with every transition. The engine leaves it empty.
pub type Info = serde_json::Map<String, serde_json::Value>;

/// Box-style descriptor of the observation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservationBounds {
    pub low: usize,
    pub high: usize,
    pub shape: (usize, usize),
}

impl ObservationBounds {
    pub fn contains(&self, p: Position) -> bool {
        (self.low..=self.high).contains(&p.row) && (self.low..=self.high).contains(&p.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Reset, no step taken yet.
    Ready,
    Running,
    /// A step returned `done`; only `reset` is accepted.
    Terminated,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub position: Position,
    pub reward: f64,
    pub done: bool,
    pub info: Info,
}

pub struct OpenMaze {
    grid: Arc<GridModel>,
    policy: RewardPolicy,
    start: Position,
    initial_distance: usize,
    step_reward: f64,
    state: EpisodeState,
    phase: Phase,
    renderer: Option<Box<dyn Renderer>>,
}

impl fmt::Debug for OpenMaze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenMaze")
            .field("rows", &self.grid.rows())
            .field("cols", &self.grid.cols())
            .field("policy", &self.policy)
            .field("phase", &self.phase)
            .field("position", &self.state.agent_position)
            .field("has_renderer", &self.renderer.is_some())
            .finish()
    }
}

impl OpenMaze {
    /// Builds an engine over `grid`. The agent always starts at
    /// `(rows - 2, 1)`, which must be an open, non-goal cell.
    pub fn new(grid: Arc<GridModel>, policy: RewardPolicy) -> Result<Self> {
        let start = agent_start(grid.rows());
        match grid.cell(start) {
            Some(Cell::Empty) | Some(Cell::Start) => {}
            other => {
                return Err(MazeError::Configuration(format!(
                    "agent start {start} must be an open non-goal cell, found {other:?}"
                )))
            }
        }
        if let RewardPolicy::Cycle(c) = &policy {
            if c.cycle_window == 0 {
                return Err(MazeError::Configuration(
                    "cycle_window must be at least 1".to_string(),
                ));
            }
        }

        let initial_distance = grid.distance_to_goal(start);
        let step_reward = policy.step_reward(initial_distance);
        let state = Self::fresh_state(&policy, start, initial_distance);

        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            policy = policy.name(),
            %start,
            initial_distance,
            "maze environment constructed"
        );

        Ok(Self {
            grid,
            policy,
            start,
            initial_distance,
            step_reward,
            state,
            phase: Phase::Ready,
            renderer: None,
        })
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn set_renderer(&mut self, renderer: Option<Box<dyn Renderer>>) {
        self.renderer = renderer;
    }

    pub fn grid(&self) -> &Arc<GridModel> {
        &self.grid
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> Position {
        self.state.agent_position
    }

    pub fn start_position(&self) -> Position {
        self.start
    }

    pub fn initial_distance(&self) -> usize {
        self.initial_distance
    }

    pub fn step_reward(&self) -> f64 {
        self.step_reward
    }

    pub fn reward_range(&self) -> (f64, f64) {
        self.policy.reward_range(self.step_reward)
    }

    /// Observation bounds: each coordinate lies in `0..=max(rows, cols)`.
    pub fn observation_bounds(&self) -> ObservationBounds {
        ObservationBounds {
            low: 0,
            high: self.grid.rows().max(self.grid.cols()),
            shape: (self.grid.rows(), self.grid.cols()),
        }
    }

    /// Starts a new episode and returns the start position.
    pub fn reset(&mut self) -> Position {
        self.state = Self::fresh_state(&self.policy, self.start, self.initial_distance);
        self.phase = Phase::Ready;
        debug!(start = %self.start, "episode reset");
        self.start
    }

    pub fn legal_moves(&self, position: Position) -> ActionMask {
        actions::legal_moves(position, &self.grid)
    }

    /// Legal moves from the agent's current cell.
    pub fn legal_actions(&self) -> ActionMask {
        self.legal_moves(self.state.agent_position)
    }

    /// Applies an untyped action index (0..=3).
    pub fn step_index(&mut self, action: i64) -> Result<Transition> {
        let dir = Direction::from_index(action).inspect_err(|e| warn!("{e}"))?;
        self.step(dir)
    }

    /// Applies an action given by name (`N`, `east`, `2`, ...).
    pub fn step_str(&mut self, action: &str) -> Result<Transition> {
        let dir = action
            .parse::<Direction>()
            .inspect_err(|e| warn!("{e}"))?;
        self.step(dir)
    }

    pub fn step(&mut self, dir: Direction) -> Result<Transition> {
        if self.phase == Phase::Terminated {
            warn!("step called after episode terminated");
            return Err(MazeError::InvalidState(self.phase));
        }
        self.phase = Phase::Running;

        let from = self.state.agent_position;
        let dest = match self.grid.offset(from, dir) {
            Some(dest) => dest,
            None => {
                debug!(%dir, %from, "move leaves the grid");
                return Ok(self.no_op());
            }
        };

        let transition = match self.grid.cell(dest) {
            Some(Cell::Goal) => self.arrive(dest),
            Some(Cell::Wall) | None => {
                debug!(%dir, %from, %dest, "move blocked by wall");
                return Ok(self.no_op());
            }
            Some(Cell::Empty) | Some(Cell::Start) => self.advance(dest),
        };

        debug!(
            %dir,
            %from,
            to = %transition.position,
            reward = transition.reward,
            done = transition.done,
            steps = self.state.step_count,
            "step"
        );
        Ok(transition)
    }

    pub fn render(&mut self, mode: RenderMode<'_>) -> Result<Rendered> {
        let position = self.state.agent_position;
        match mode {
            RenderMode::Human => {
                let renderer = self.renderer.as_mut().ok_or(MazeError::NoRenderer)?;
                renderer.update_agent(position);
                renderer.redraw(&self.grid)?;
                Ok(Rendered::Drawn)
            }
            RenderMode::Text => Ok(Rendered::Text(render_ascii(&self.grid, position))),
            RenderMode::Position => Ok(Rendered::Position(position)),
            RenderMode::Callback(f) => {
                f(position);
                Ok(Rendered::Delivered)
            }
        }
    }

    pub fn snapshot(&self) -> EnvSnapshot {
        EnvSnapshot {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            cells: self.grid.cell_rows(),
            agent: self.state.agent_position,
            phase: self.phase,
            step_count: self.state.step_count,
        }
    }

    fn fresh_state(policy: &RewardPolicy, start: Position, distance: usize) -> EpisodeState {
        let mut state = EpisodeState::new(start, distance, policy.cycle_window());
        policy.on_reset(&mut state);
        state
    }

    fn no_op(&self) -> Transition {
        Transition {
            position: self.state.agent_position,
            reward: 0.0,
            done: false,
            info: Info::new(),
        }
    }

    fn arrive(&mut self, goal: Position) -> Transition {
        let reward = self.policy.completion_reward(&self.state, self.step_reward);

        self.state.record_distance(0);
        self.state.last_distance = 0;
        self.state.step_count += 1;
        self.state.agent_position = goal;
        self.phase = Phase::Terminated;

        Transition {
            position: goal,
            reward,
            done: true,
            info: Info::new(),
        }
    }

    fn advance(&mut self, dest: Position) -> Transition {
        let distance = self.grid.distance_to_goal(dest);
        let reward = self
            .policy
            .shape(&self.state, dest, distance, self.step_reward);
        let repeated = self.state.is_recent(dest);

        let state = &mut self.state;
        state.record_distance(distance);
        state.last_distance = distance;
        state.push_recent(dest);
        state.all_visited.insert(dest);
        if repeated {
            state.cycle_count += 1;
        }
        state.step_count += 1;
        if let Some(pending) = self.policy.next_pending(state.step_count) {
            state.pending_reward = pending;
        }
        state.agent_position = dest;

        let done = self.policy.should_terminate(&self.state);
        if done {
            info!(
                cycles = self.state.cycle_count,
                steps = self.state.step_count,
                "episode ended on cycle limit"
            );
            self.phase = Phase::Terminated;
        }

        Transition {
            position: dest,
            reward,
            done,
            info: Info::new(),
        }
    }
}
