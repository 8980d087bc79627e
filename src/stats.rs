use serde::Serialize;

use crate::runner::{EpisodeEnd, EpisodeOutcome};

const RECENT_CAPACITY: usize = 200;

/// Aggregate results over many rollouts.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeStats {
    pub episodes: u32,
    pub reached_goal: u32,
    pub cycle_limited: u32,
    pub truncated: u32,
    pub total_steps: u64,
    pub total_reward: f64,
    pub best_return: Option<f64>,
    #[serde(skip)]
    recent: Vec<bool>,
}

impl EpisodeStats {
    pub fn new() -> Self {
        Self {
            episodes: 0,
            reached_goal: 0,
            cycle_limited: 0,
            truncated: 0,
            total_steps: 0,
            total_reward: 0.0,
            best_return: None,
            recent: Vec::with_capacity(RECENT_CAPACITY),
        }
    }

    pub fn record(&mut self, outcome: &EpisodeOutcome) {
        self.episodes += 1;
        match outcome.end {
            EpisodeEnd::ReachedGoal => self.reached_goal += 1,
            EpisodeEnd::CycleLimit => self.cycle_limited += 1,
            EpisodeEnd::Truncated => self.truncated += 1,
        }
        self.total_steps += outcome.steps;
        self.total_reward += outcome.total_reward;
        self.best_return = Some(match self.best_return {
            Some(b) => b.max(outcome.total_reward),
            None => outcome.total_reward,
        });

        self.recent.push(outcome.end == EpisodeEnd::ReachedGoal);
        if self.recent.len() > RECENT_CAPACITY {
            self.recent.remove(0);
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.reached_goal as f64 / self.episodes as f64
        }
    }

    pub fn mean_return(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_reward / self.episodes as f64
        }
    }

    pub fn mean_steps(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_steps as f64 / self.episodes as f64
        }
    }

    /// Success rate over the last 100 episodes (fewer if not yet run).
    pub fn last_100_rate(&self) -> f64 {
        let start = self.recent.len().saturating_sub(100);
        let slice = &self.recent[start..];
        if slice.is_empty() {
            return 0.0;
        }
        slice.iter().filter(|&&x| x).count() as f64 / slice.len() as f64
    }
}

impl Default for EpisodeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(end: EpisodeEnd, steps: u64, total_reward: f64) -> EpisodeOutcome {
        EpisodeOutcome {
            end,
            steps,
            total_reward,
        }
    }

    #[test]
    fn empty_stats_are_zero() {
        let s = EpisodeStats::new();
        assert_eq!(s.success_rate(), 0.0);
        assert_eq!(s.mean_return(), 0.0);
        assert_eq!(s.last_100_rate(), 0.0);
        assert_eq!(s.best_return, None);
    }

    #[test]
    fn records_each_outcome_kind() {
        let mut s = EpisodeStats::new();
        s.record(&outcome(EpisodeEnd::ReachedGoal, 10, 1.0));
        s.record(&outcome(EpisodeEnd::CycleLimit, 4, -0.5));
        s.record(&outcome(EpisodeEnd::Truncated, 1000, 0.5));
        s.record(&outcome(EpisodeEnd::ReachedGoal, 14, 2.0));

        assert_eq!(s.episodes, 4);
        assert_eq!(s.reached_goal, 2);
        assert_eq!(s.cycle_limited, 1);
        assert_eq!(s.truncated, 1);
        assert_eq!(s.success_rate(), 0.5);
        assert_eq!(s.mean_return(), 0.75);
        assert_eq!(s.mean_steps(), 257.0);
        assert_eq!(s.best_return, Some(2.0));
    }

    #[test]
    fn last_100_window_slides() {
        let mut s = EpisodeStats::new();
        for _ in 0..150 {
            s.record(&outcome(EpisodeEnd::Truncated, 1, 0.0));
        }
        for _ in 0..100 {
            s.record(&outcome(EpisodeEnd::ReachedGoal, 1, 1.0));
        }
        assert_eq!(s.last_100_rate(), 1.0);
        assert_eq!(s.success_rate(), 0.4);
    }
}
