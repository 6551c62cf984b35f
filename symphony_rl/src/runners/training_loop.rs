//! Single-environment episode driver for Symphony.
//!
//! # Episode
//!
//! ```text
//! reset env
//! if exploring:  re-draw actor weights
//! random start:  a few uniformly random steps, not stored
//! if learning:   train_between_episodes updates
//! loop up to limit_step:
//!     first time total_added >= explore_time: start learning, warmup updates
//!     a = noisy action; step env
//!     store (s, a, r + reward_offset, s', terminal)
//!     if learning: train_per_step updates
//! record return, log, checkpoint, evaluate
//! ```

use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algorithms::symphony::Symphony;
use crate::buffers::ExperienceStore;
use crate::checkpoint::Checkpointer;
use crate::core::Transition;
use crate::environment::ContinuousEnv;
use crate::error::{Result, SymphonyError};
use crate::metrics::{EpisodeHistory, EpisodeSnapshot, MetricsLogger, AVERAGE_WINDOW};

use super::training_config::TrainingLoopConfig;

/// Outcome of [`TrainingLoop::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Episodes recorded in the history, including resumed ones.
    pub episodes: usize,
    /// Transitions added to the store.
    pub total_added: usize,
    /// Mean return over the last 100 training episodes.
    pub avg_return_100: f64,
    /// Mean return of the most recent evaluation, if any ran.
    pub last_evaluation: Option<f64>,
}

/// Drives a [`Symphony`] agent and its [`ExperienceStore`] through episodes
/// of a [`ContinuousEnv`].
pub struct TrainingLoop<B: AutodiffBackend> {
    config: TrainingLoopConfig,
    agent: Symphony<B>,
    store: ExperienceStore,
    history: EpisodeHistory,
    checkpointer: Option<Checkpointer>,
    learning: bool,
    rng: StdRng,
    last_evaluation: Option<f64>,
}

impl<B: AutodiffBackend> TrainingLoop<B> {
    /// Create a driver around a fresh or restored agent and store.
    pub fn new(config: TrainingLoopConfig, agent: Symphony<B>, store: ExperienceStore) -> Result<Self> {
        config.validate()?;
        let rng = match agent.config().seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(2)),
            None => StdRng::from_entropy(),
        };
        let learning = store.total_added() >= config.explore_time.max(1);
        Ok(Self {
            config,
            agent,
            store,
            history: EpisodeHistory::new(),
            checkpointer: None,
            learning,
            rng,
            last_evaluation: None,
        })
    }

    /// Save every `save_interval` episodes once learning has started.
    pub fn with_checkpointer(mut self, checkpointer: Checkpointer) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Load the attached checkpoint, if there is one.
    ///
    /// Returns `false` when no checkpointer is attached or nothing has been
    /// saved yet. Training continues from the next episode after the saved
    /// history. Learning resumes immediately if it had started before the
    /// save, even when the store was not persisted.
    pub fn resume(&mut self) -> Result<bool> {
        let Some(checkpointer) = self.checkpointer.as_ref() else {
            return Ok(false);
        };
        if !checkpointer.exists() {
            log::warn!(
                "No checkpoint in {}, starting from scratch",
                checkpointer.config().checkpoint_dir.display()
            );
            return Ok(false);
        }
        let progress = checkpointer.load(&mut self.agent, &mut self.store)?;
        self.history = progress.history;
        self.learning =
            progress.learning || self.store.total_added() >= self.config.explore_time.max(1);
        Ok(true)
    }

    /// Train for the configured number of episodes.
    ///
    /// `eval_env` is only used for noiseless evaluation episodes.
    pub fn run<E, T, L>(&mut self, env: &mut E, eval_env: &mut T, logger: &mut L) -> Result<TrainingSummary>
    where
        E: ContinuousEnv + ?Sized,
        T: ContinuousEnv + ?Sized,
        L: MetricsLogger + ?Sized,
    {
        self.check_env(env)?;
        self.check_env(eval_env)?;

        let start_episode = self.history.episodes();
        log::info!(
            "Training episodes {}..{} (explore_time={}, learning={})",
            start_episode,
            self.config.num_episodes,
            self.config.explore_time,
            self.learning
        );

        for episode in start_episode..self.config.num_episodes {
            let snapshot = self.run_episode(episode, env)?;
            logger.log(&snapshot);

            if self.learning {
                if episode % self.config.save_interval == 0 {
                    if let Some(checkpointer) = self.checkpointer.as_ref() {
                        checkpointer.save(&self.agent, &self.store, &self.history, self.learning)?;
                    }
                }
                if episode >= self.config.start_test
                    && episode % self.config.eval_interval == 0
                    && self.config.eval_episodes > 0
                {
                    self.evaluate(eval_env, self.config.eval_episodes)?;
                }
            }
        }
        logger.flush();

        Ok(TrainingSummary {
            episodes: self.history.episodes(),
            total_added: self.store.total_added(),
            avg_return_100: self.history.avg_return(AVERAGE_WINDOW),
            last_evaluation: self.last_evaluation,
        })
    }

    /// Play and learn from one training episode.
    pub fn run_episode<E: ContinuousEnv + ?Sized>(&mut self, episode: usize, env: &mut E) -> Result<EpisodeSnapshot> {
        let mut state = env.reset();
        let mut episode_return = 0.0f64;

        let between = self.config.train_between_episodes_for(self.store.total_added());
        if !self.learning
            && self.store.total_added() < self.config.explore_time
            && self.config.reinit_actor_during_exploration
        {
            self.agent.reinitialize_actor();
        }

        // Same small random action repeated; counted in the return only.
        if self.config.random_start_steps > 0 {
            let action = self.random_start_action();
            for _ in 0..self.config.random_start_steps {
                let step = env.step(&action);
                episode_return += f64::from(step.reward);
                if step.done() {
                    state = env.reset();
                    break;
                }
                state = step.next_state;
            }
        }

        if self.learning {
            self.train_steps(between)?;
        }

        let mut episode_steps = 0;
        for _ in 0..self.config.limit_step {
            episode_steps += 1;

            if !self.learning && self.store.total_added() >= self.config.explore_time.max(1) {
                log::info!(
                    "Started training after {} transitions ({} warmup updates)",
                    self.store.total_added(),
                    self.config.warmup_training_steps
                );
                self.learning = true;
                self.train_steps(self.config.warmup_training_steps)?;
            }

            let action = self.agent.select_action(&state)?;
            let step = env.step(&action);
            episode_return += f64::from(step.reward);

            let done = step.done();
            self.store.add(&Transition::new(
                state,
                action,
                step.reward + self.config.reward_offset,
                step.next_state.clone(),
                step.terminal,
            ))?;
            if self.learning {
                self.train_steps(self.config.train_per_step)?;
            }

            state = step.next_state;
            if done {
                break;
            }
        }

        self.history.record(episode_return, episode_steps);
        log::debug!(
            "Ep {}: return={:.2} steps={} total={}",
            episode,
            episode_return,
            episode_steps,
            self.store.total_added()
        );

        Ok(EpisodeSnapshot::new(episode, episode_steps, self.store.total_added(), episode_return)
            .with_averages(
                self.history.avg_return(AVERAGE_WINDOW),
                self.history.avg_steps(AVERAGE_WINDOW),
            )
            .with_learner(self.agent.q_old_policy(), self.agent.exploration().eps()))
    }

    /// Run noiseless episodes without storing or learning.
    ///
    /// Returns the return of every episode.
    pub fn evaluate<E: ContinuousEnv + ?Sized>(&mut self, env: &mut E, episodes: usize) -> Result<Vec<f64>> {
        let mut returns = Vec::with_capacity(episodes);
        for trial in 0..episodes {
            let mut state = env.reset();
            let mut episode_return = 0.0f64;
            let mut steps = 0;
            for _ in 0..self.config.limit_eval {
                steps += 1;
                let action = self.agent.select_action_mean(&state)?;
                let step = env.step(&action);
                episode_return += f64::from(step.reward);
                let done = step.done();
                state = step.next_state;
                if done {
                    break;
                }
            }
            returns.push(episode_return);
            log::info!(
                "Validation trial {}: return={:.2}, average={:.2}, steps={}",
                trial,
                episode_return,
                returns.iter().sum::<f64>() / returns.len() as f64,
                steps
            );
        }

        if !returns.is_empty() {
            self.last_evaluation = Some(returns.iter().sum::<f64>() / returns.len() as f64);
        }
        Ok(returns)
    }

    /// `count` learner updates on freshly sampled batches.
    ///
    /// No-op while the store is empty, e.g. after resuming without a
    /// persisted store.
    fn train_steps(&mut self, count: usize) -> Result<()> {
        if self.store.is_empty() {
            return Ok(());
        }
        for _ in 0..count {
            let batch = self.store.sample::<B>(self.agent.device())?;
            self.agent.train(batch)?;
        }
        Ok(())
    }

    fn random_start_action(&mut self) -> Vec<f32> {
        let scale = self.config.random_start_scale;
        self.agent
            .actor()
            .max_action()
            .iter()
            .map(|&m| scale * m * self.rng.gen_range(-1.0f32..=1.0))
            .collect()
    }

    fn check_env<E: ContinuousEnv + ?Sized>(&self, env: &E) -> Result<()> {
        let config = self.agent.config();
        if env.state_dim() != config.state_dim {
            return Err(SymphonyError::DimensionMismatch {
                what: "environment state_dim",
                expected: config.state_dim,
                actual: env.state_dim(),
            });
        }
        if env.action_dim() != config.action_dim {
            return Err(SymphonyError::DimensionMismatch {
                what: "environment action_dim",
                expected: config.action_dim,
                actual: env.action_dim(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &TrainingLoopConfig {
        &self.config
    }

    pub fn agent(&self) -> &Symphony<B> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Symphony<B> {
        &mut self.agent
    }

    pub fn store(&self) -> &ExperienceStore {
        &self.store
    }

    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    /// Whether the exploration-only phase is over.
    pub fn is_learning(&self) -> bool {
        self.learning
    }

    /// Give back the agent and store.
    pub fn into_parts(self) -> (Symphony<B>, ExperienceStore, EpisodeHistory) {
        (self.agent, self.store, self.history)
    }
}
