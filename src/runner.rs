//! Host-side episode loop: sample actions, step until done or the step cap.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{OpenMaze, Transition};
use crate::error::Result;
use crate::grid::Cell;
use crate::prng::Prng;

/// Episode cap used when the host does not set one.
pub const DEFAULT_MAX_EPISODE_STEPS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSampling {
    /// Sample only among legal moves.
    #[default]
    Masked,
    /// Sample all four moves; illegal ones become no-op steps.
    Uniform,
}

#[derive(Debug, Clone, Copy)]
pub struct RolloutOptions {
    pub max_steps: u64,
    pub sampling: ActionSampling,
}

impl Default for RolloutOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_EPISODE_STEPS,
            sampling: ActionSampling::Masked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeEnd {
    ReachedGoal,
    CycleLimit,
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeOutcome {
    pub end: EpisodeEnd,
    /// Step calls made, rejected moves included.
    pub steps: u64,
    pub total_reward: f64,
}

/// Resets `env` and runs one episode with random actions from `rng`.
///
/// `on_step` sees the engine after every transition (for rendering or logging).
pub fn rollout<F>(
    env: &mut OpenMaze,
    rng: &mut Prng,
    opts: &RolloutOptions,
    mut on_step: F,
) -> Result<EpisodeOutcome>
where
    F: FnMut(&mut OpenMaze, &Transition) -> Result<()>,
{
    env.reset();
    let mut steps = 0u64;
    let mut total_reward = 0.0;

    while steps < opts.max_steps {
        let dir = match opts.sampling {
            ActionSampling::Uniform => rng.any_direction(),
            ActionSampling::Masked => match rng.legal_direction(env.legal_actions()) {
                Some(d) => d,
                None => {
                    warn!(position = %env.position(), "agent has no legal move");
                    break;
                }
            },
        };

        let t = env.step(dir)?;
        steps += 1;
        total_reward += t.reward;
        on_step(&mut *env, &t)?;

        if t.done {
            let end = match env.grid().cell(t.position) {
                Some(Cell::Goal) => EpisodeEnd::ReachedGoal,
                _ => EpisodeEnd::CycleLimit,
            };
            debug!(?end, steps, total_reward, "episode finished");
            return Ok(EpisodeOutcome {
                end,
                steps,
                total_reward,
            });
        }
    }

    debug!(steps, total_reward, "episode truncated");
    Ok(EpisodeOutcome {
        end: EpisodeEnd::Truncated,
        steps,
        total_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::MazeBuilder;
    use crate::reward::{CycleRewards, RewardPolicy};
    use std::sync::Arc;

    fn env(policy: RewardPolicy) -> OpenMaze {
        let grid = Arc::new(MazeBuilder::default().build().unwrap());
        OpenMaze::new(grid, policy).unwrap()
    }

    #[test]
    fn random_walk_eventually_reaches_goal() {
        let mut e = env(RewardPolicy::default());
        let mut rng = Prng::new(11);
        let opts = RolloutOptions {
            max_steps: 100_000,
            ..RolloutOptions::default()
        };
        let out = rollout(&mut e, &mut rng, &opts, |_, _| Ok(())).unwrap();
        assert_eq!(out.end, EpisodeEnd::ReachedGoal);
        assert!(out.steps >= 7);
        assert!(out.total_reward > 0.0);
    }

    #[test]
    fn cap_truncates_episode() {
        let mut e = env(RewardPolicy::default());
        let mut rng = Prng::new(5);
        let opts = RolloutOptions {
            max_steps: 3,
            sampling: ActionSampling::Uniform,
        };
        let mut seen = 0;
        let out = rollout(&mut e, &mut rng, &opts, |_, _| {
            seen += 1;
            Ok(())
        })
        .unwrap();
        // Goal is at least seven moves away.
        assert_eq!(out.end, EpisodeEnd::Truncated);
        assert_eq!(out.steps, 3);
        assert_eq!(seen, 3);
    }

    #[test]
    fn zero_tolerance_cycle_policy_stops_early() {
        let mut e = env(RewardPolicy::Cycle(CycleRewards {
            cycle_window: 4,
            allowed_cycle_count: Some(0),
            ..CycleRewards::default()
        }));
        let mut rng = Prng::new(99);
        let out = rollout(&mut e, &mut rng, &RolloutOptions::default(), |_, _| Ok(())).unwrap();
        assert_ne!(out.end, EpisodeEnd::Truncated);
    }

    #[test]
    fn rollout_resets_before_running() {
        let mut e = env(RewardPolicy::default());
        let mut rng = Prng::new(1);
        let opts = RolloutOptions {
            max_steps: 100_000,
            ..RolloutOptions::default()
        };
        rollout(&mut e, &mut rng, &opts, |_, _| Ok(())).unwrap();
        // A finished episode would reject further steps without the reset.
        let again = rollout(&mut e, &mut rng, &opts, |_, _| Ok(()));
        assert!(again.is_ok());
    }
}
