//! Per-episode return and length history.

use serde::{Deserialize, Serialize};

/// Window used for the rolling averages reported each episode.
pub const AVERAGE_WINDOW: usize = 100;

/// Returns and step counts of every finished training episode.
///
/// Kept in full so it can be persisted with a checkpoint and training
/// resumed with the same rolling statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeHistory {
    /// Undiscounted return of each episode.
    pub total_rewards: Vec<f64>,
    /// Environment steps of each episode.
    pub total_steps: Vec<usize>,
}

impl EpisodeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished episode.
    pub fn record(&mut self, episode_return: f64, episode_steps: usize) {
        self.total_rewards.push(episode_return);
        self.total_steps.push(episode_steps);
    }

    /// Number of recorded episodes.
    pub fn episodes(&self) -> usize {
        self.total_rewards.len()
    }

    /// Mean return over the last `window` episodes (0 when empty).
    pub fn avg_return(&self, window: usize) -> f64 {
        tail_mean(self.total_rewards.iter().copied(), self.total_rewards.len(), window)
    }

    /// Mean episode length over the last `window` episodes (0 when empty).
    pub fn avg_steps(&self, window: usize) -> f64 {
        tail_mean(
            self.total_steps.iter().map(|&s| s as f64),
            self.total_steps.len(),
            window,
        )
    }

    /// Sum of all recorded episode lengths.
    pub fn env_steps(&self) -> usize {
        self.total_steps.iter().sum()
    }
}

fn tail_mean(values: impl Iterator<Item = f64>, len: usize, window: usize) -> f64 {
    let n = len.min(window);
    if n == 0 {
        return 0.0;
    }
    values.skip(len - n).sum::<f64>() / n as f64
}
