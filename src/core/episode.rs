use hashbrown::HashSet;
use serde::Serialize;
use std::collections::VecDeque;

use crate::grid::Position;

/// Mutable bookkeeping for one episode. Replaced wholesale on reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeState {
    pub agent_position: Position,
    /// Accepted moves this episode. Rejected moves never count.
    pub step_count: u64,
    pub best_distance: usize,
    pub last_distance: usize,
    pub recent_positions: VecDeque<Position>,
    pub all_visited: HashSet<Position>,
    pub cycle_count: u64,
    /// Urgency value the next improving move (or goal arrival) pays.
    pub pending_reward: f64,
    cycle_window: usize,
}

impl EpisodeState {
    pub fn new(start: Position, start_distance: usize, cycle_window: usize) -> Self {
        let cycle_window = cycle_window.max(1);
        Self {
            agent_position: start,
            step_count: 0,
            best_distance: start_distance,
            last_distance: start_distance,
            recent_positions: VecDeque::with_capacity(cycle_window),
            all_visited: HashSet::new(),
            cycle_count: 0,
            pending_reward: 0.0,
            cycle_window,
        }
    }

    pub fn cycle_window(&self) -> usize {
        self.cycle_window
    }

    /// Lowers `best_distance` if `distance` improves on it. Returns whether it did.
    pub fn record_distance(&mut self, distance: usize) -> bool {
        if distance < self.best_distance {
            self.best_distance = distance;
            true
        } else {
            false
        }
    }

    pub fn is_recent(&self, p: Position) -> bool {
        self.recent_positions.contains(&p)
    }

    pub fn was_visited(&self, p: Position) -> bool {
        self.all_visited.contains(&p)
    }

    /// Appends to the trailing window, evicting the oldest entry when full.
    pub fn push_recent(&mut self, p: Position) {
        if self.recent_positions.len() == self.cycle_window {
            self.recent_positions.pop_front();
        }
        self.recent_positions.push_back(p);
    }
}
