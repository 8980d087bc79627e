//! Reward shaping and termination policies.
//!
//! Every policy shares the same movement rules; they differ only in what a
//! legal non-terminal move pays, what reaching the goal pays, and whether an
//! extra condition can end the episode early.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::episode::EpisodeState;
use crate::grid::Position;

/// Caller-supplied mapping from elapsed step count to a reward magnitude.
pub type UrgencyFn = Arc<dyn Fn(u64) -> f64 + Send + Sync>;

pub const DEFAULT_COMPLETION_REWARD: f64 = 1.0;
pub const DEFAULT_BACKTRACK_PENALTY_RATIO: f64 = 0.1;
pub const DEFAULT_CYCLE_WINDOW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleRewards {
    pub unvisited_state_reward: f64,
    pub visited_state_reward: f64,
    pub completion_bonus_reward: f64,
    /// Capacity of the trailing window used for cycle detection.
    pub cycle_window: usize,
    /// `None` never ends the episode on cycles.
    pub allowed_cycle_count: Option<u64>,
}

impl Default for CycleRewards {
    fn default() -> Self {
        Self {
            unvisited_state_reward: 0.0,
            visited_state_reward: 0.0,
            completion_bonus_reward: 1.0,
            cycle_window: DEFAULT_CYCLE_WINDOW,
            allowed_cycle_count: None,
        }
    }
}

#[derive(Clone)]
pub enum RewardPolicy {
    /// Pays `completion_reward / initial_distance` on every new best distance-to-goal.
    DistanceShaped { completion_reward: f64 },
    /// Distance shaping plus a penalty of `penalty_ratio * step_reward` for
    /// moves that increase distance relative to the previous move.
    NoBacktrack {
        completion_reward: f64,
        penalty_ratio: f64,
    },
    /// Novelty shaping with early termination on repeated cycles.
    Cycle(CycleRewards),
    /// Distance improvements and the goal pay the urgency value computed on
    /// the previous step.
    UrgencyDecay { urgency: UrgencyFn },
}

impl fmt::Debug for RewardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardPolicy::DistanceShaped { completion_reward } => f
                .debug_struct("DistanceShaped")
                .field("completion_reward", completion_reward)
                .finish(),
            RewardPolicy::NoBacktrack {
                completion_reward,
                penalty_ratio,
            } => f
                .debug_struct("NoBacktrack")
                .field("completion_reward", completion_reward)
                .field("penalty_ratio", penalty_ratio)
                .finish(),
            RewardPolicy::Cycle(c) => f.debug_tuple("Cycle").field(c).finish(),
            RewardPolicy::UrgencyDecay { .. } => f
                .debug_struct("UrgencyDecay")
                .finish_non_exhaustive(),
        }
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        RewardPolicy::DistanceShaped {
            completion_reward: DEFAULT_COMPLETION_REWARD,
        }
    }
}

impl RewardPolicy {
    pub fn no_backtrack() -> Self {
        RewardPolicy::NoBacktrack {
            completion_reward: DEFAULT_COMPLETION_REWARD,
            penalty_ratio: DEFAULT_BACKTRACK_PENALTY_RATIO,
        }
    }

    pub fn urgency<F>(f: F) -> Self
    where
        F: Fn(u64) -> f64 + Send + Sync + 'static,
    {
        RewardPolicy::UrgencyDecay {
            urgency: Arc::new(f),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RewardPolicy::DistanceShaped { .. } => "distance_shaped",
            RewardPolicy::NoBacktrack { .. } => "no_backtrack",
            RewardPolicy::Cycle(_) => "cycle",
            RewardPolicy::UrgencyDecay { .. } => "urgency_decay",
        }
    }

    pub fn cycle_window(&self) -> usize {
        match self {
            RewardPolicy::Cycle(c) => c.cycle_window,
            _ => DEFAULT_CYCLE_WINDOW,
        }
    }

    /// Per-improvement reward for the distance-shaped variants.
    pub fn step_reward(&self, initial_distance: usize) -> f64 {
        let completion = match self {
            RewardPolicy::DistanceShaped { completion_reward }
            | RewardPolicy::NoBacktrack {
                completion_reward, ..
            } => *completion_reward,
            RewardPolicy::Cycle(_) | RewardPolicy::UrgencyDecay { .. } => return 0.0,
        };
        if initial_distance == 0 {
            completion
        } else {
            completion / initial_distance as f64
        }
    }

    /// Primes per-episode policy state on reset.
    pub fn on_reset(&self, state: &mut EpisodeState) {
        if let RewardPolicy::UrgencyDecay { urgency } = self {
            state.pending_reward = urgency(0);
        }
    }

    /// Reward for arriving on a goal cell, evaluated before bookkeeping.
    pub fn completion_reward(&self, state: &EpisodeState, step_reward: f64) -> f64 {
        match self {
            RewardPolicy::DistanceShaped { .. } | RewardPolicy::NoBacktrack { .. } => step_reward,
            RewardPolicy::Cycle(c) => c.completion_bonus_reward,
            RewardPolicy::UrgencyDecay { .. } => state.pending_reward,
        }
    }

    /// Reward for a legal, non-goal move onto `destination`, which is
    /// `distance` from the nearest goal. Reads only pre-update state.
    pub fn shape(
        &self,
        state: &EpisodeState,
        destination: Position,
        distance: usize,
        step_reward: f64,
    ) -> f64 {
        match self {
            RewardPolicy::DistanceShaped { .. } => {
                if distance < state.best_distance {
                    step_reward
                } else {
                    0.0
                }
            }
            RewardPolicy::NoBacktrack { penalty_ratio, .. } => {
                if distance < state.best_distance {
                    step_reward
                } else if distance > state.last_distance {
                    -penalty_ratio * step_reward
                } else {
                    0.0
                }
            }
            RewardPolicy::Cycle(c) => {
                if state.was_visited(destination) {
                    c.visited_state_reward
                } else {
                    c.unvisited_state_reward
                }
            }
            RewardPolicy::UrgencyDecay { .. } => {
                if distance < state.best_distance {
                    state.pending_reward
                } else {
                    0.0
                }
            }
        }
    }

    /// Urgency value to carry into the next step, given the post-update step count.
    pub fn next_pending(&self, step_count: u64) -> Option<f64> {
        match self {
            RewardPolicy::UrgencyDecay { urgency } => Some(urgency(step_count)),
            _ => None,
        }
    }

    /// Extra termination condition, checked against post-update state.
    pub fn should_terminate(&self, state: &EpisodeState) -> bool {
        match self {
            RewardPolicy::Cycle(c) => c
                .allowed_cycle_count
                .is_some_and(|allowed| state.cycle_count > allowed),
            _ => false,
        }
    }

    /// Bounds on a single step's reward. Urgency bounds depend on the
    /// caller's function and are reported as unbounded.
    pub fn reward_range(&self, step_reward: f64) -> (f64, f64) {
        match self {
            RewardPolicy::DistanceShaped { .. } => (0.0, step_reward),
            RewardPolicy::NoBacktrack { penalty_ratio, .. } => {
                ((-penalty_ratio * step_reward).min(0.0), step_reward)
            }
            RewardPolicy::Cycle(c) => {
                let low = c
                    .visited_state_reward
                    .min(c.unvisited_state_reward)
                    .min(0.0);
                let high = c
                    .completion_bonus_reward
                    .max(c.visited_state_reward)
                    .max(c.unvisited_state_reward)
                    .max(0.0);
                (low, high)
            }
            RewardPolicy::UrgencyDecay { .. } => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

/// Built-in urgency curves usable from configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum UrgencyCurve {
    Constant {
        value: f64,
    },
    /// `max(initial - decay * steps, floor)`
    Linear { initial: f64, decay: f64, floor: f64 },
    /// `max(initial * rate^steps, floor)`
    Exponential { initial: f64, rate: f64, floor: f64 },
}

impl Default for UrgencyCurve {
    fn default() -> Self {
        UrgencyCurve::Linear {
            initial: 1.0,
            decay: 0.01,
            floor: 0.0,
        }
    }
}

impl UrgencyCurve {
    pub fn eval(&self, steps: u64) -> f64 {
        match *self {
            UrgencyCurve::Constant { value } => value,
            UrgencyCurve::Linear {
                initial,
                decay,
                floor,
            } => (initial - decay * steps as f64).max(floor),
            UrgencyCurve::Exponential {
                initial,
                rate,
                floor,
            } => {
                let exp = i32::try_from(steps).unwrap_or(i32::MAX);
                (initial * rate.powi(exp)).max(floor)
            }
        }
    }

    pub fn into_fn(self) -> UrgencyFn {
        Arc::new(move |steps| self.eval(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(best: usize, last: usize) -> EpisodeState {
        let mut s = EpisodeState::new(Position::new(8, 1), best, 2);
        s.last_distance = last;
        s
    }

    #[test]
    fn distance_shaping_pays_only_on_improvement() {
        let p = RewardPolicy::default();
        let step = p.step_reward(7);
        assert!((step - 1.0 / 7.0).abs() < 1e-12);

        let s = state(5, 5);
        let here = Position::new(4, 1);
        assert_eq!(p.shape(&s, here, 4, step), step);
        assert_eq!(p.shape(&s, here, 5, step), 0.0);
        assert_eq!(p.shape(&s, here, 6, step), 0.0);
        assert_eq!(p.completion_reward(&s, step), step);
    }

    #[test]
    fn no_backtrack_penalizes_moving_away() {
        let p = RewardPolicy::no_backtrack();
        let step = p.step_reward(7);
        let s = state(4, 5);
        let here = Position::new(5, 1);
        assert_eq!(p.shape(&s, here, 3, step), step);
        assert_eq!(p.shape(&s, here, 5, step), 0.0);
        assert!((p.shape(&s, here, 6, step) + 0.1 * step).abs() < 1e-12);
    }

    #[test]
    fn cycle_rewards_novelty() {
        let p = RewardPolicy::Cycle(CycleRewards {
            unvisited_state_reward: 0.5,
            visited_state_reward: -0.25,
            ..CycleRewards::default()
        });
        let mut s = state(7, 7);
        let cell = Position::new(7, 1);
        assert_eq!(p.shape(&s, cell, 6, 0.0), 0.5);
        s.all_visited.insert(cell);
        assert_eq!(p.shape(&s, cell, 6, 0.0), -0.25);
        assert_eq!(p.completion_reward(&s, 0.0), 1.0);
        assert_eq!(p.reward_range(0.0), (-0.25, 1.0));
    }

    #[test]
    fn cycle_termination_is_strictly_greater() {
        let p = RewardPolicy::Cycle(CycleRewards {
            allowed_cycle_count: Some(2),
            ..CycleRewards::default()
        });
        let mut s = state(7, 7);
        s.cycle_count = 2;
        assert!(!p.should_terminate(&s));
        s.cycle_count = 3;
        assert!(p.should_terminate(&s));

        let unbounded = RewardPolicy::Cycle(CycleRewards::default());
        s.cycle_count = u64::MAX;
        assert!(!unbounded.should_terminate(&s));
    }

    #[test]
    fn urgency_pays_pending_value() {
        let p = RewardPolicy::urgency(|n| 10.0 - n as f64);
        let mut s = state(7, 7);
        p.on_reset(&mut s);
        assert_eq!(s.pending_reward, 10.0);
        assert_eq!(p.shape(&s, Position::new(7, 1), 6, 0.0), 10.0);
        assert_eq!(p.shape(&s, Position::new(8, 2), 7, 0.0), 0.0);
        assert_eq!(p.next_pending(3), Some(7.0));
        assert_eq!(p.completion_reward(&s, 0.0), 10.0);
    }

    #[test]
    fn curves_respect_floor() {
        let lin = UrgencyCurve::Linear {
            initial: 1.0,
            decay: 0.25,
            floor: 0.1,
        };
        assert_eq!(lin.eval(0), 1.0);
        assert_eq!(lin.eval(2), 0.5);
        assert_eq!(lin.eval(100), 0.1);

        let exp = UrgencyCurve::Exponential {
            initial: 8.0,
            rate: 0.5,
            floor: 0.0,
        };
        assert_eq!(exp.into_fn()(3), 1.0);
    }

    #[test]
    fn debug_hides_urgency_closure() {
        let p = RewardPolicy::urgency(|_| 1.0);
        assert_eq!(format!("{p:?}"), "UrgencyDecay { .. }");
    }
}
