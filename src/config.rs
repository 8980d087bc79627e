//! Environment construction parameters, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::engine::OpenMaze;
use crate::error::{MazeError, Result};
use crate::grid::GridModel;
use crate::maze::{MazeBuilder, MazeKind, DEFAULT_COLS, DEFAULT_ROWS};
use crate::reward::{
    CycleRewards, RewardPolicy, UrgencyCurve, DEFAULT_BACKTRACK_PENALTY_RATIO,
    DEFAULT_COMPLETION_REWARD, DEFAULT_CYCLE_WINDOW,
};

fn default_completion_reward() -> f64 {
    DEFAULT_COMPLETION_REWARD
}

fn default_penalty_ratio() -> f64 {
    DEFAULT_BACKTRACK_PENALTY_RATIO
}

fn default_completion_bonus_reward() -> f64 {
    1.0
}

fn default_cycle_window() -> usize {
    DEFAULT_CYCLE_WINDOW
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardConfig {
    DistanceShaped {
        #[serde(default = "default_completion_reward")]
        completion_reward: f64,
    },
    NoBacktrack {
        #[serde(default = "default_completion_reward")]
        completion_reward: f64,
        #[serde(default = "default_penalty_ratio")]
        penalty_ratio: f64,
    },
    Cycle {
        #[serde(default)]
        unvisited_state_reward: f64,
        #[serde(default)]
        visited_state_reward: f64,
        #[serde(default = "default_completion_bonus_reward")]
        completion_bonus_reward: f64,
        #[serde(default = "default_cycle_window")]
        cycle_window: usize,
        /// Omitted or null means unbounded.
        #[serde(default)]
        allowed_cycle_count: Option<u64>,
    },
    UrgencyDecay {
        #[serde(default)]
        urgency: UrgencyCurve,
    },
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig::DistanceShaped {
            completion_reward: DEFAULT_COMPLETION_REWARD,
        }
    }
}

impl RewardConfig {
    pub fn to_policy(&self) -> RewardPolicy {
        match *self {
            RewardConfig::DistanceShaped { completion_reward } => {
                RewardPolicy::DistanceShaped { completion_reward }
            }
            RewardConfig::NoBacktrack {
                completion_reward,
                penalty_ratio,
            } => RewardPolicy::NoBacktrack {
                completion_reward,
                penalty_ratio,
            },
            RewardConfig::Cycle {
                unvisited_state_reward,
                visited_state_reward,
                completion_bonus_reward,
                cycle_window,
                allowed_cycle_count,
            } => RewardPolicy::Cycle(CycleRewards {
                unvisited_state_reward,
                visited_state_reward,
                completion_bonus_reward,
                cycle_window,
                allowed_cycle_count,
            }),
            RewardConfig::UrgencyDecay { urgency } => RewardPolicy::UrgencyDecay {
                urgency: urgency.into_fn(),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let finite = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(MazeError::Configuration(format!("{name} must be finite, got {v}")))
            }
        };
        match *self {
            RewardConfig::DistanceShaped { completion_reward } => {
                finite("completion_reward", completion_reward)
            }
            RewardConfig::NoBacktrack {
                completion_reward,
                penalty_ratio,
            } => {
                finite("completion_reward", completion_reward)?;
                finite("penalty_ratio", penalty_ratio)?;
                if penalty_ratio < 0.0 {
                    return Err(MazeError::Configuration(format!(
                        "penalty_ratio must be non-negative, got {penalty_ratio}"
                    )));
                }
                Ok(())
            }
            RewardConfig::Cycle {
                unvisited_state_reward,
                visited_state_reward,
                completion_bonus_reward,
                cycle_window,
                ..
            } => {
                finite("unvisited_state_reward", unvisited_state_reward)?;
                finite("visited_state_reward", visited_state_reward)?;
                finite("completion_bonus_reward", completion_bonus_reward)?;
                if cycle_window == 0 {
                    return Err(MazeError::Configuration(
                        "cycle_window must be at least 1".to_string(),
                    ));
                }
                Ok(())
            }
            RewardConfig::UrgencyDecay { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfig {
    /// `[rows, cols]`
    pub size: (usize, usize),
    /// Request a randomized layout. Not supported; building fails.
    pub random: bool,
    pub reward: RewardConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            size: (DEFAULT_ROWS, DEFAULT_COLS),
            random: false,
            reward: RewardConfig::default(),
        }
    }
}

impl EnvConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: EnvConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.reward.validate()
    }

    pub fn maze_kind(&self) -> MazeKind {
        MazeKind::from_random_flag(self.random)
    }

    pub fn build_grid(&self) -> Result<GridModel> {
        let (rows, cols) = self.size;
        MazeBuilder::new(rows, cols).kind(self.maze_kind()).build()
    }

    pub fn build(&self) -> Result<OpenMaze> {
        self.validate()?;
        self.build_with_policy(self.reward.to_policy())
    }

    /// Uses this config's layout with a caller-built policy, e.g. a custom urgency function.
    pub fn build_with_policy(&self, policy: RewardPolicy) -> Result<OpenMaze> {
        let grid = self.build_grid()?;
        OpenMaze::new(Arc::new(grid), policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    #[test]
    fn empty_object_is_default() {
        let cfg = EnvConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, EnvConfig::default());
        assert_eq!(cfg.size, (10, 7));
        assert!(!cfg.random);
    }

    #[test]
    fn cycle_config_fills_defaults() {
        let cfg = EnvConfig::from_json_str(
            r#"{ "reward": { "kind": "cycle", "visited_state_reward": -0.1 } }"#,
        )
        .unwrap();
        assert_eq!(
            cfg.reward,
            RewardConfig::Cycle {
                unvisited_state_reward: 0.0,
                visited_state_reward: -0.1,
                completion_bonus_reward: 1.0,
                cycle_window: 2,
                allowed_cycle_count: None,
            }
        );
    }

    #[test]
    fn zero_cycle_window_is_rejected() {
        let err = EnvConfig::from_json_str(
            r#"{ "reward": { "kind": "cycle", "cycle_window": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MazeError::Configuration(_)));
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let err = EnvConfig::from_json_str(r#"{ "sise": [3, 3] }"#).unwrap_err();
        assert!(matches!(err, MazeError::ConfigParse(_)));
    }

    #[test]
    fn oversized_grid_fails_to_build() {
        let cfg = EnvConfig::from_json_str(r#"{ "size": [4294967296, 4294967296] }"#).unwrap();
        assert!(matches!(cfg.build(), Err(MazeError::Configuration(_))));
    }

    #[test]
    fn random_layout_fails_to_build() {
        let cfg = EnvConfig::from_json_str(r#"{ "random": true }"#).unwrap();
        assert!(matches!(
            cfg.build(),
            Err(MazeError::UnsupportedMazeKind(MazeKind::Random))
        ));
    }

    #[test]
    fn urgency_curve_parses_and_builds() {
        let cfg = EnvConfig::from_json_str(
            r#"{
                "size": [10, 7],
                "reward": {
                    "kind": "urgency_decay",
                    "urgency": { "curve": "linear", "initial": 2.0, "decay": 0.5, "floor": 0.0 }
                }
            }"#,
        )
        .unwrap();
        let env = cfg.build().unwrap();
        assert_eq!(env.state().pending_reward, 2.0);
    }

    #[test]
    fn caller_policy_overrides_reward_config() {
        let cfg = EnvConfig {
            size: (8, 6),
            ..EnvConfig::default()
        };
        let env = cfg
            .build_with_policy(RewardPolicy::urgency(|n| 1.0 / (n + 1) as f64))
            .unwrap();
        assert_eq!(env.policy().name(), "urgency_decay");
        assert_eq!(env.start_position(), Position::new(6, 1));
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = EnvConfig {
            reward: RewardConfig::NoBacktrack {
                completion_reward: 2.0,
                penalty_ratio: 0.25,
            },
            ..EnvConfig::default()
        };
        let text = cfg.to_json_pretty().unwrap();
        assert!(text.contains("\"no_backtrack\""));
        assert_eq!(EnvConfig::from_json_str(&text).unwrap(), cfg);
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("openmaze-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "size": [6, 5] }"#).unwrap();
        let cfg = EnvConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg.size, (6, 5));

        let missing = EnvConfig::load(path.with_extension("missing"));
        assert!(matches!(missing, Err(MazeError::Io(_))));
    }
}
