//! Symphony learner: one gradient step over a sampled batch.
//!
//! # Training step
//!
//! ```text
//! 1. target  <- (1 - rate) * target + rate * critic
//! 2. y        = r + (1 - done) * gamma * min_k target_k(s', actor(s'))
//! 3. critic   : minimize  sum_k ReHE(y - Q_k(s, a))
//! 4. actor    : minimize  ReHaE(-(min_k Q_k(s, actor(s)) - q_old_policy))
//!    q_old_policy <- mean(min_k Q_k(s, actor(s)))
//! ```
//!
//! The critic always updates before the actor, and the target ensemble is
//! smoothed before it is used, so targets lag the online critic by one
//! update.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::grad_clipping::GradientClippingConfig;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::algorithms::losses::{rehae, rehe};
use crate::buffers::SampledBatch;
use crate::core::polyak_update;
use crate::error::{Result, SymphonyError};

use super::actor::{ExplorationNoise, PolicyNet, PolicyNetwork};
use super::config::SymphonyConfig;
use super::critic::CriticEnsemble;

type ActorOptimizer<B> = OptimizerAdaptor<Adam, PolicyNet<B>, B>;
type CriticOptimizer<B> = OptimizerAdaptor<Adam, CriticEnsemble<B>, B>;

/// Adam with the epsilon used throughout, plus optional norm clipping.
fn adam<B, M>(max_grad_norm: Option<f32>) -> OptimizerAdaptor<Adam, M, B>
where
    B: AutodiffBackend,
    M: burn::module::AutodiffModule<B>,
{
    AdamConfig::new()
        .with_epsilon(1e-5)
        .with_grad_clipping(max_grad_norm.map(GradientClippingConfig::Norm))
        .init()
}

fn scalar<B: Backend>(tensor: &Tensor<B, 1>) -> f32 {
    tensor.clone().into_scalar().elem::<f32>()
}

/// Deterministic actor, triple critic ensemble and their target copy.
pub struct Symphony<B: AutodiffBackend> {
    config: SymphonyConfig,
    device: B::Device,

    actor: PolicyNetwork<B>,
    critic: CriticEnsemble<B>,
    critic_target: CriticEnsemble<B>,

    actor_optimizer: ActorOptimizer<B>,
    critic_optimizer: CriticOptimizer<B>,

    q_old_policy: f32,
}

impl<B: AutodiffBackend> Symphony<B> {
    /// Build a fresh agent. The target ensemble starts as a copy of the
    /// online one.
    pub fn new(config: SymphonyConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;

        let actor = PolicyNetwork::new(&config, device);
        let critic = CriticEnsemble::new(&config, device);
        let critic_target = critic.clone();

        log::info!(
            "Symphony agent: state_dim={}, action_dim={}, hidden_dim={}, max_action={:?}",
            config.state_dim,
            config.action_dim,
            config.hidden_dim,
            config.max_action
        );

        Ok(Self {
            actor_optimizer: adam(config.max_grad_norm),
            critic_optimizer: adam(config.max_grad_norm),
            config,
            device: device.clone(),
            actor,
            critic,
            critic_target,
            q_old_policy: 0.0,
        })
    }

    // ========================================================================
    // Acting
    // ========================================================================

    /// Exploring action for one state.
    ///
    /// Advances the exploration schedule; no gradients are tracked.
    pub fn select_action(&mut self, state: &[f32]) -> Result<Vec<f32>> {
        self.actor.act(state, &self.device)
    }

    /// Noiseless action for one state, used for evaluation.
    pub fn select_action_mean(&self, state: &[f32]) -> Result<Vec<f32>> {
        self.actor.act_mean(state, &self.device)
    }

    // ========================================================================
    // Learning
    // ========================================================================

    /// One full training step: critic update, then actor update.
    ///
    /// Returns the updated `q_old_policy` baseline.
    pub fn train(&mut self, batch: SampledBatch<B>) -> Result<f32> {
        let critic_loss = self.critic_update(
            batch.states.clone(),
            batch.actions,
            batch.rewards,
            batch.next_states,
            batch.dones,
        )?;
        let actor_loss = self.actor_update(batch.states)?;

        log::debug!(
            "train: critic_loss={:.5} actor_loss={:.5} q_old_policy={:.4}",
            critic_loss,
            actor_loss,
            self.q_old_policy
        );
        Ok(self.q_old_policy)
    }

    /// Smooth the target ensemble, then fit every online head to the
    /// bootstrapped target. Returns the summed critic loss.
    pub fn critic_update(
        &mut self,
        states: Tensor<B, 2>,
        actions: Tensor<B, 2>,
        rewards: Tensor<B, 2>,
        next_states: Tensor<B, 2>,
        dones: Tensor<B, 2>,
    ) -> Result<f32> {
        let target = self.critic_target.clone();
        self.critic_target = polyak_update::<B, _>(&self.critic, target, self.config.ema_rate);

        let y = self.bootstrap_targets(rewards, next_states, dones);

        let mut loss = Tensor::<B, 1>::zeros([1], &self.device);
        for q in self.critic.forward(states, actions) {
            loss = loss + rehe(y.clone() - q);
        }

        let value = scalar(&loss);
        if !value.is_finite() {
            return Err(SymphonyError::NonFiniteLoss { stage: "critic", value });
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.critic);
        self.critic = self
            .critic_optimizer
            .step(self.config.critic_lr, self.critic.clone(), grads);

        Ok(value)
    }

    /// `y = r + (1 - done) * gamma * min_k target_k(s', actor(s'))`, detached.
    ///
    /// The next action is the noiseless policy output.
    pub fn bootstrap_targets(
        &self,
        rewards: Tensor<B, 2>,
        next_states: Tensor<B, 2>,
        dones: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let next_actions = self.actor.forward(next_states.clone()).detach();
        let q_next = self.critic_target.forward_united(next_states, next_actions);
        let not_done = dones.neg().add_scalar(1.0);
        (rewards + not_done * q_next.mul_scalar(self.config.gamma)).detach()
    }

    /// Push the policy toward higher united Q, relative to the running
    /// baseline. Returns the actor loss.
    pub fn actor_update(&mut self, states: Tensor<B, 2>) -> Result<f32> {
        let actions = self.actor.forward(states.clone());
        let q_new = self.critic.forward_united(states, actions);

        let advantage = q_new.clone().sub_scalar(self.q_old_policy);
        let loss = rehae(advantage.neg());

        let value = scalar(&loss);
        if !value.is_finite() {
            return Err(SymphonyError::NonFiniteLoss { stage: "actor", value });
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, self.actor.net());
        let net = self
            .actor_optimizer
            .step(self.config.actor_lr, self.actor.net().clone(), grads);
        self.actor.set_net(net);

        self.q_old_policy = scalar(&q_new.detach().mean());
        Ok(value)
    }

    /// Re-draw the actor's Linear weights. The optimizer state and the
    /// exploration schedule are kept.
    pub fn reinitialize_actor(&mut self) {
        self.actor.reinitialize();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SymphonyConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Running baseline of the actor loss.
    pub fn q_old_policy(&self) -> f32 {
        self.q_old_policy
    }

    pub fn set_q_old_policy(&mut self, value: f32) {
        self.q_old_policy = value;
    }

    /// Exploration phase clock.
    pub fn phase(&self) -> f64 {
        self.actor.noise().phase()
    }

    /// Restore the exploration phase clock.
    pub fn set_phase(&mut self, phase: f64) {
        self.actor.noise_mut().set_phase(phase);
    }

    /// Full exploration state.
    pub fn exploration(&self) -> &ExplorationNoise {
        self.actor.noise()
    }

    pub fn set_exploration(&mut self, noise: ExplorationNoise) {
        *self.actor.noise_mut() = noise;
    }

    pub fn actor(&self) -> &PolicyNetwork<B> {
        &self.actor
    }

    pub fn critic(&self) -> &CriticEnsemble<B> {
        &self.critic
    }

    pub fn critic_target(&self) -> &CriticEnsemble<B> {
        &self.critic_target
    }

    /// Replace the policy weights (checkpoint load).
    pub fn set_actor_net(&mut self, net: PolicyNet<B>) {
        self.actor.set_net(net);
    }

    /// Replace the online critic weights (checkpoint load).
    pub fn set_critic(&mut self, critic: CriticEnsemble<B>) {
        self.critic = critic;
    }

    /// Replace the target critic weights (checkpoint load).
    pub fn set_critic_target(&mut self, critic_target: CriticEnsemble<B>) {
        self.critic_target = critic_target;
    }
}
