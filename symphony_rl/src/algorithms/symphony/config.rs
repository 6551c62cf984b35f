//! Symphony agent configuration.

use serde::{Deserialize, Serialize};

use crate::environment::ContinuousEnv;
use crate::error::{Result, SymphonyError};

/// Configuration for the Symphony agent and its experience store.
///
/// Everything here is fixed at construction time. Use
/// [`SymphonyConfig::new`] with the environment dimensions and adjust the
/// rest with the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymphonyConfig {
    // ========================================================================
    // Dimensions
    // ========================================================================
    /// Observation size.
    pub state_dim: usize,

    /// Action size.
    pub action_dim: usize,

    /// Width of every Fourier-series block.
    pub hidden_dim: usize,

    /// Per-dimension action magnitude. Actions live in `[-max, max]`.
    pub max_action: Vec<f32>,

    // ========================================================================
    // Exploration
    // ========================================================================
    /// Peak noise coefficient of the cosine exploration schedule.
    pub explore_noise: f64,

    // ========================================================================
    // Experience Store
    // ========================================================================
    /// Maximum number of stored transitions (ring buffer).
    pub capacity: usize,

    /// Recency skew of sampling weights, `w = tanh(fade · (n/idx)^2)`.
    pub fade_factor: f64,

    /// Movement reward coefficient applied on insertion.
    pub stall_penalty: f64,

    // ========================================================================
    // Learning
    // ========================================================================
    /// Discount factor.
    pub gamma: f32,

    /// Target critic EMA rate.
    pub ema_rate: f32,

    /// Actor learning rate.
    pub actor_lr: f64,

    /// Critic ensemble learning rate.
    pub critic_lr: f64,

    /// Gradient norm clip. None = no clipping.
    pub max_grad_norm: Option<f32>,

    /// Seed for the experience store sampler. None = seeded from entropy.
    pub seed: Option<u64>,
}

impl SymphonyConfig {
    /// Configuration with default hyperparameters for the given dimensions.
    ///
    /// `max_action` defaults to 1.0 on every dimension.
    pub fn new(state_dim: usize, action_dim: usize) -> Self {
        Self {
            state_dim,
            action_dim,
            hidden_dim: 256,
            max_action: vec![1.0; action_dim],
            explore_noise: 0.2,
            capacity: 500_000,
            fade_factor: 3.0,
            stall_penalty: 0.03,
            gamma: 0.99,
            ema_rate: 0.003,
            actor_lr: 3e-4,
            critic_lr: 7e-4,
            max_grad_norm: None,
            seed: None,
        }
    }

    /// Small networks and store for unit tests and smoke runs.
    pub fn tiny(state_dim: usize, action_dim: usize) -> Self {
        Self::new(state_dim, action_dim)
            .with_hidden_dim(16)
            .with_capacity(1_000)
            .with_seed(0)
    }

    /// Dimensions and action bounds taken from an environment.
    ///
    /// Unbounded action spaces get a unit bound per dimension.
    pub fn for_env<E: ContinuousEnv + ?Sized>(env: &E) -> Self {
        let config = Self::new(env.state_dim(), env.action_dim());
        match env.action_high() {
            Some(high) => config.with_max_action(high),
            None => config,
        }
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    /// Set the per-dimension action bound.
    pub fn with_max_action(mut self, max_action: Vec<f32>) -> Self {
        self.max_action = max_action;
        self
    }

    /// Set one bound for every action dimension.
    pub fn with_uniform_max_action(mut self, max_action: f32) -> Self {
        self.max_action = vec![max_action; self.action_dim];
        self
    }

    pub fn with_explore_noise(mut self, explore_noise: f64) -> Self {
        self.explore_noise = explore_noise;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_fade_factor(mut self, fade_factor: f64) -> Self {
        self.fade_factor = fade_factor;
        self
    }

    pub fn with_stall_penalty(mut self, stall_penalty: f64) -> Self {
        self.stall_penalty = stall_penalty;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_ema_rate(mut self, ema_rate: f32) -> Self {
        self.ema_rate = ema_rate;
        self
    }

    /// Set actor and critic learning rates.
    pub fn with_learning_rates(mut self, actor_lr: f64, critic_lr: f64) -> Self {
        self.actor_lr = actor_lr;
        self.critic_lr = critic_lr;
        self
    }

    pub fn with_max_grad_norm(mut self, max_grad_norm: Option<f32>) -> Self {
        self.max_grad_norm = max_grad_norm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Mean of the per-dimension action bound.
    ///
    /// The exploration schedule is driven by this single scalar.
    pub fn max_action_mean(&self) -> f32 {
        if self.max_action.is_empty() {
            return 0.0;
        }
        self.max_action.iter().sum::<f32>() / self.max_action.len() as f32
    }

    /// Reject configurations the agent cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.state_dim == 0 {
            return Err(SymphonyError::invalid_config("state_dim", "must be > 0"));
        }
        if self.action_dim == 0 {
            return Err(SymphonyError::invalid_config("action_dim", "must be > 0"));
        }
        if self.hidden_dim == 0 {
            return Err(SymphonyError::invalid_config("hidden_dim", "must be > 0"));
        }
        if self.max_action.len() != self.action_dim {
            return Err(SymphonyError::DimensionMismatch {
                what: "max_action",
                expected: self.action_dim,
                actual: self.max_action.len(),
            });
        }
        if self.max_action.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err(SymphonyError::invalid_config(
                "max_action",
                "every bound must be finite and > 0",
            ));
        }
        if !self.explore_noise.is_finite() || self.explore_noise < 0.0 {
            return Err(SymphonyError::invalid_config("explore_noise", "must be >= 0"));
        }
        if self.capacity == 0 {
            return Err(SymphonyError::invalid_config("capacity", "must be > 0"));
        }
        if !self.fade_factor.is_finite() || self.fade_factor <= 0.0 {
            return Err(SymphonyError::invalid_config("fade_factor", "must be > 0"));
        }
        if !self.stall_penalty.is_finite() {
            return Err(SymphonyError::invalid_config("stall_penalty", "must be finite"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(SymphonyError::invalid_config(
                "gamma",
                format!("must be in [0, 1], got {}", self.gamma),
            ));
        }
        if !(0.0..=1.0).contains(&self.ema_rate) {
            return Err(SymphonyError::invalid_config(
                "ema_rate",
                format!("must be in [0, 1], got {}", self.ema_rate),
            ));
        }
        if self.actor_lr <= 0.0 || self.critic_lr <= 0.0 {
            return Err(SymphonyError::invalid_config("learning_rate", "must be > 0"));
        }
        if let Some(norm) = self.max_grad_norm {
            if norm <= 0.0 {
                return Err(SymphonyError::invalid_config("max_grad_norm", "must be > 0"));
            }
        }
        Ok(())
    }
}
