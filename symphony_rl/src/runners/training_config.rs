//! Configuration for the single-environment episode driver.

use crate::error::{Result, SymphonyError};

/// Buffer size step used to scale the between-episode update count.
pub const BETWEEN_EPISODE_STEP: usize = 5000;

/// Store size above which large fixed counts (>= 100) start scaling.
pub const LARGE_COUNT_THRESHOLD: usize = 350_000;

/// Counts at or above this use [`LARGE_COUNT_THRESHOLD`].
pub const LARGE_COUNT: usize = 100;

/// Configuration for [`TrainingLoop`](super::TrainingLoop).
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingLoopConfig {
    // Schedule
    /// Transitions collected before learning starts
    pub explore_time: usize,
    /// Updates run before every episode once learning
    pub train_between_episodes: usize,
    /// Never scale `train_between_episodes` with store size
    pub train_between_episodes_const: bool,
    /// Updates run after every environment step once learning
    pub train_per_step: usize,
    /// Updates run once, when learning starts
    pub warmup_training_steps: usize,
    /// Re-draw actor weights every episode until learning starts
    pub reinit_actor_during_exploration: bool,

    // Episodes
    /// Random steps at the start of every episode (not stored)
    pub random_start_steps: usize,
    /// Random start action magnitude as a fraction of max_action
    pub random_start_scale: f32,
    /// Max stored steps per training episode
    pub limit_step: usize,
    /// Total training episodes
    pub num_episodes: usize,
    /// Added to every environment reward before storing
    pub reward_offset: f32,

    // Evaluation
    /// First episode eligible for evaluation
    pub start_test: usize,
    /// Episodes between evaluations
    pub eval_interval: usize,
    /// Episodes per evaluation (0 disables)
    pub eval_episodes: usize,
    /// Max steps per evaluation episode
    pub limit_eval: usize,

    // Persistence
    /// Episodes between checkpoints
    pub save_interval: usize,
}

impl Default for TrainingLoopConfig {
    fn default() -> Self {
        Self {
            explore_time: 5000,
            train_between_episodes: 15,
            train_between_episodes_const: false,
            train_per_step: 3,
            warmup_training_steps: 128,
            reinit_actor_during_exploration: true,

            random_start_steps: 2,
            random_start_scale: 0.3,
            limit_step: 2000,
            num_episodes: 10_000_000,
            reward_offset: 1.0,

            start_test: 250,
            eval_interval: 50,
            eval_episodes: 10,
            limit_eval: 2000,

            save_interval: 5,
        }
    }
}

impl TrainingLoopConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explore_time(mut self, explore_time: usize) -> Self {
        self.explore_time = explore_time;
        self
    }

    /// Set the between-episode update count; `constant` disables scaling.
    pub fn with_train_between_episodes(mut self, count: usize, constant: bool) -> Self {
        self.train_between_episodes = count;
        self.train_between_episodes_const = constant;
        self
    }

    pub fn with_train_per_step(mut self, count: usize) -> Self {
        self.train_per_step = count;
        self
    }

    pub fn with_warmup_training_steps(mut self, count: usize) -> Self {
        self.warmup_training_steps = count;
        self
    }

    pub fn with_reinit_actor_during_exploration(mut self, enabled: bool) -> Self {
        self.reinit_actor_during_exploration = enabled;
        self
    }

    /// Set the random start length and magnitude.
    pub fn with_random_start(mut self, steps: usize, scale: f32) -> Self {
        self.random_start_steps = steps;
        self.random_start_scale = scale;
        self
    }

    pub fn with_limit_step(mut self, limit_step: usize) -> Self {
        self.limit_step = limit_step;
        self
    }

    pub fn with_num_episodes(mut self, num_episodes: usize) -> Self {
        self.num_episodes = num_episodes;
        self
    }

    pub fn with_reward_offset(mut self, reward_offset: f32) -> Self {
        self.reward_offset = reward_offset;
        self
    }

    /// Set when, how often and how long to evaluate.
    pub fn with_evaluation(
        mut self,
        start_test: usize,
        eval_interval: usize,
        eval_episodes: usize,
        limit_eval: usize,
    ) -> Self {
        self.start_test = start_test;
        self.eval_interval = eval_interval;
        self.eval_episodes = eval_episodes;
        self.limit_eval = limit_eval;
        self
    }

    pub fn with_save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    /// Updates to run before an episode, given the transitions added so far.
    ///
    /// Small counts grow to `total_added / 5000` once the store holds
    /// `5000 · count` transitions; counts of 100 or more switch to
    /// `total_added / 5000` from 350k transitions on.
    pub fn train_between_episodes_for(&self, total_added: usize) -> usize {
        let init = self.train_between_episodes;
        if self.train_between_episodes_const {
            return init;
        }
        let threshold = if init >= LARGE_COUNT {
            LARGE_COUNT_THRESHOLD
        } else {
            BETWEEN_EPISODE_STEP * init
        };
        if total_added >= threshold {
            total_added / BETWEEN_EPISODE_STEP
        } else {
            init
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.limit_step == 0 {
            return Err(SymphonyError::invalid_config("limit_step", "must be > 0"));
        }
        if self.eval_interval == 0 {
            return Err(SymphonyError::invalid_config("eval_interval", "must be > 0"));
        }
        if self.save_interval == 0 {
            return Err(SymphonyError::invalid_config("save_interval", "must be > 0"));
        }
        if !self.random_start_scale.is_finite() || self.random_start_scale < 0.0 {
            return Err(SymphonyError::invalid_config(
                "random_start_scale",
                "must be finite and >= 0",
            ));
        }
        if !self.reward_offset.is_finite() {
            return Err(SymphonyError::invalid_config("reward_offset", "must be finite"));
        }
        Ok(())
    }
}
