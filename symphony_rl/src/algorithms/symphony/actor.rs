//! Deterministic policy with a self-annealing exploration schedule.
//!
//! The policy network maps a state to `max_action · tanh(FourierSeries(s))`.
//! Exploration noise is added on the host when acting in the environment;
//! the learner only ever queries the noiseless (mean) action.
//!
//! # Exploration schedule
//!
//! The noise scale follows a cosine over an artificial phase clock that
//! advances by a fixed step on every exploring call:
//!
//! ```text
//! eps   = explore_noise · max_action · (cos(phase) + 1)
//! lim   = 2.5 · eps
//! phase = phase + 3e-5
//! ```
//!
//! Once `eps` drops below 0.07 the schedule freezes; once it is below 1e-4
//! exploration is switched off for good.

use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SymphonyError};
use crate::nn::{FourierSeries, FourierSeriesConfig};

use super::config::SymphonyConfig;

/// Initial noise scale.
pub const INITIAL_EPS: f64 = 1.0;
/// Below this scale the schedule stops advancing.
pub const FREEZE_EPS: f64 = 0.07;
/// Below this scale exploration is disabled permanently.
pub const DISABLE_EPS: f64 = 1e-4;
/// Clamp bound relative to `eps`.
pub const LIMIT_RATIO: f64 = 2.5;
/// Phase advance per exploring call.
pub const PHASE_STEP: f64 = 3e-5;

// ============================================================================
// Exploration schedule
// ============================================================================

/// Exploration noise state owned by the policy.
///
/// Persists across episodes; only [`ExplorationNoise::advance`] mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationNoise {
    eps: f64,
    lim: f64,
    phase: f64,
    coefficient: f64,
    max_action: f64,
}

impl ExplorationNoise {
    /// Fresh schedule: `eps = 1`, `phase = 0`.
    pub fn new(coefficient: f64, max_action: f64) -> Self {
        Self {
            eps: INITIAL_EPS,
            lim: LIMIT_RATIO * INITIAL_EPS,
            phase: 0.0,
            coefficient,
            max_action,
        }
    }

    /// Advance the schedule by one exploring call.
    ///
    /// Returns `false` once exploration is permanently disabled.
    pub fn advance(&mut self) -> bool {
        if self.eps < DISABLE_EPS {
            return false;
        }
        if self.eps >= FREEZE_EPS {
            self.eps = self.coefficient * self.max_action * (self.phase.cos() + 1.0);
            self.lim = LIMIT_RATIO * self.eps;
            self.phase += PHASE_STEP;
        }
        true
    }

    /// Current noise scale.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Current noise clamp bound.
    pub fn lim(&self) -> f64 {
        self.lim
    }

    /// Current phase clock value.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Whether the schedule has reached its terminal state.
    pub fn is_disabled(&self) -> bool {
        self.eps < DISABLE_EPS
    }

    /// Enabled at all: a zero coefficient skips the schedule entirely.
    pub fn is_enabled(&self) -> bool {
        self.coefficient > 0.0
    }

    /// Move the phase clock, e.g. when resuming a run.
    ///
    /// While the schedule is still annealing, `eps` is reset to its initial
    /// value so the next call recomputes it from the restored phase. A frozen
    /// or disabled schedule keeps its `eps` and `lim`.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase;
        if self.eps >= FREEZE_EPS {
            self.eps = INITIAL_EPS;
            self.lim = LIMIT_RATIO * INITIAL_EPS;
        }
    }
}

// ============================================================================
// Policy network
// ============================================================================

/// Policy body: `tanh(FourierSeries(state))`, a unit-scale action.
#[derive(Module, Debug)]
pub struct PolicyNet<B: Backend> {
    body: FourierSeries<B>,
}

impl<B: Backend> PolicyNet<B> {
    /// Fresh network for the configured dimensions.
    pub fn new(config: &SymphonyConfig, device: &B::Device) -> Self {
        Self {
            body: FourierSeriesConfig::new(config.state_dim, config.hidden_dim, config.action_dim)
                .init(device),
        }
    }

    /// Same network with freshly drawn Linear weights.
    pub fn redraw_weights(self) -> Self {
        Self {
            body: self.body.redraw_weights(),
        }
    }

    /// Unit-scale action in `(-1, 1)`, shape [batch, action_dim].
    pub fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        self.body.forward(state).tanh()
    }
}

/// Scale a unit action by the per-dimension bound.
fn scale<B: Backend>(unit: Tensor<B, 2>, max_action: &[f32]) -> Tensor<B, 2> {
    let device = unit.device();
    let bound = Tensor::<B, 1>::from_data(
        TensorData::new(max_action.to_vec(), [max_action.len()]),
        &device,
    );
    unit * bound.unsqueeze_dim(0)
}

/// Actor: policy weights, action bounds and exploration state.
#[derive(Debug)]
pub struct PolicyNetwork<B: AutodiffBackend> {
    net: PolicyNet<B>,
    max_action: Vec<f32>,
    noise: ExplorationNoise,
    rng: StdRng,
    state_dim: usize,
}

impl<B: AutodiffBackend> PolicyNetwork<B> {
    /// Build a policy from the agent configuration.
    pub fn new(config: &SymphonyConfig, device: &B::Device) -> Self {
        let rng = match config.seed {
            // Offset so the policy noise stream differs from the sampler's.
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            net: PolicyNet::new(config, device),
            max_action: config.max_action.clone(),
            noise: ExplorationNoise::new(config.explore_noise, f64::from(config.max_action_mean())),
            rng,
            state_dim: config.state_dim,
        }
    }

    /// Noiseless action `max_action · tanh(net(state))`, differentiable.
    pub fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        scale(self.net.forward(state), &self.max_action)
    }

    /// Noiseless action for one state, evaluated without gradient tracking.
    pub fn act_mean(&self, state: &[f32], device: &B::Device) -> Result<Vec<f32>> {
        if state.len() != self.state_dim {
            return Err(SymphonyError::DimensionMismatch {
                what: "state",
                expected: self.state_dim,
                actual: state.len(),
            });
        }
        let net = self.net.valid();
        let input = Tensor::<B::InnerBackend, 2>::from_data(
            TensorData::new(state.to_vec(), [1, self.state_dim]),
            device,
        );
        let action = scale(net.forward(input), &self.max_action);
        action
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| SymphonyError::Tensor(format!("{e:?}")))
    }

    /// Exploring action for one state.
    ///
    /// Advances the exploration schedule once, perturbs the mean action with
    /// clamped Gaussian noise and clamps the result to the action bounds.
    pub fn act(&mut self, state: &[f32], device: &B::Device) -> Result<Vec<f32>> {
        let mut action = self.act_mean(state, device)?;

        if self.noise.is_enabled() && self.noise.advance() {
            let eps = self.noise.eps();
            let lim = self.noise.lim();
            for a in action.iter_mut() {
                let z: f64 = StandardNormal.sample(&mut self.rng);
                *a += (eps * z).clamp(-lim, lim) as f32;
            }
        }

        for (a, &bound) in action.iter_mut().zip(&self.max_action) {
            *a = a.clamp(-bound, bound);
        }
        Ok(action)
    }

    /// Re-draw the policy weights; exploration state is kept.
    pub fn reinitialize(&mut self) {
        self.net = self.net.clone().redraw_weights();
    }

    /// Network weights.
    pub fn net(&self) -> &PolicyNet<B> {
        &self.net
    }

    /// Replace the network weights (optimizer step, checkpoint load).
    pub fn set_net(&mut self, net: PolicyNet<B>) {
        self.net = net;
    }

    /// Per-dimension action bound.
    pub fn max_action(&self) -> &[f32] {
        &self.max_action
    }

    pub fn noise(&self) -> &ExplorationNoise {
        &self.noise
    }

    pub fn noise_mut(&mut self) -> &mut ExplorationNoise {
        &mut self.noise
    }
}
