//! Fixed-capacity experience store with fading-memory sampling.
//!
//! Transitions are kept in flat parallel arrays and overwrite the oldest
//! slot once the store is full. Sampling is with replacement from a
//! categorical distribution that strongly prefers recent insertions:
//!
//! ```text
//! w(n) = tanh(fade · (n / idx)^2)      n = insertion ordinal, idx = total added
//! ```
//!
//! Rewards are shaped on insertion with a stall penalty that pays for
//! movement in state space and punishes standing still:
//!
//! ```text
//! delta  = mean(|s' - s|)
//! reward += stall · (delta - ln(max(1 / (delta + 1e-6), 1e-3)))
//! ```

use burn::prelude::*;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::core::Transition;
use crate::error::{Result, SymphonyError};

/// Smallest batch ever drawn.
pub const MIN_BATCH_SIZE: usize = 128;
/// Largest batch ever drawn.
pub const MAX_BATCH_SIZE: usize = 2048;
/// One extra sample per this many stored transitions.
pub const BATCH_GROWTH_DIVISOR: usize = 500;

/// Batch size for a store that has seen `total_added` transitions.
///
/// `clamp(total_added / 500, 128, 2048)`.
pub fn batch_size_for(total_added: usize) -> usize {
    (total_added / BATCH_GROWTH_DIVISOR).clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
}

/// Reward added for a mean absolute state change of `delta`.
pub fn stall_adjustment(stall_penalty: f64, delta: f64) -> f64 {
    let log_term = (1.0 / (delta + 1e-6)).max(1e-3).ln();
    stall_penalty * (delta - log_term)
}

// ============================================================================
// Sampled batch
// ============================================================================

/// Batched tensors drawn from the store.
#[derive(Debug, Clone)]
pub struct SampledBatch<B: Backend> {
    /// [batch, state_dim]
    pub states: Tensor<B, 2>,
    /// [batch, action_dim]
    pub actions: Tensor<B, 2>,
    /// [batch, 1], already stall-shaped
    pub rewards: Tensor<B, 2>,
    /// [batch, state_dim]
    pub next_states: Tensor<B, 2>,
    /// [batch, 1], 1.0 for terminal transitions
    pub dones: Tensor<B, 2>,
}

impl<B: Backend> SampledBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.states.dims()[0]
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Raw store contents, for persistence.
///
/// Arrays are in slot order; `idx` is the total number ever added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSnapshot {
    pub state_dim: usize,
    pub action_dim: usize,
    pub capacity: usize,
    pub idx: usize,
    pub states: Vec<f32>,
    pub actions: Vec<f32>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<f32>,
    pub dones: Vec<f32>,
}

// ============================================================================
// Experience store
// ============================================================================

/// Ring buffer of transitions with recency-weighted sampling.
#[derive(Debug, Clone)]
pub struct ExperienceStore {
    state_dim: usize,
    action_dim: usize,
    capacity: usize,
    fade_factor: f64,
    stall_penalty: f64,

    states: Vec<f32>,
    actions: Vec<f32>,
    rewards: Vec<f32>,
    next_states: Vec<f32>,
    dones: Vec<f32>,

    /// Total transitions ever added. Never wraps.
    idx: usize,
    rng: StdRng,
}

impl ExperienceStore {
    /// Create an empty store.
    pub fn new(
        state_dim: usize,
        action_dim: usize,
        capacity: usize,
        fade_factor: f64,
        stall_penalty: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(SymphonyError::invalid_config("capacity", "must be > 0"));
        }
        if state_dim == 0 || action_dim == 0 {
            return Err(SymphonyError::invalid_config(
                "dimensions",
                "state_dim and action_dim must be > 0",
            ));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        // Grow lazily: large capacities should not allocate up front.
        let reserve = capacity.min(4096);
        Ok(Self {
            state_dim,
            action_dim,
            capacity,
            fade_factor,
            stall_penalty,
            states: Vec::with_capacity(reserve * state_dim),
            actions: Vec::with_capacity(reserve * action_dim),
            rewards: Vec::with_capacity(reserve),
            next_states: Vec::with_capacity(reserve * state_dim),
            dones: Vec::with_capacity(reserve),
            idx: 0,
            rng,
        })
    }

    /// Store built from an agent configuration.
    pub fn from_config(config: &crate::algorithms::symphony::SymphonyConfig) -> Result<Self> {
        Self::new(
            config.state_dim,
            config.action_dim,
            config.capacity,
            config.fade_factor,
            config.stall_penalty,
            config.seed,
        )
    }

    /// Shape the reward and store the transition.
    ///
    /// Rejects malformed or non-finite transitions. Once full, the oldest
    /// slot is overwritten.
    pub fn add(&mut self, transition: &Transition) -> Result<()> {
        transition.validate(self.state_dim, self.action_dim)?;

        let delta = transition.activity();
        let shaped = transition.reward as f64 + stall_adjustment(self.stall_penalty, delta);
        if !shaped.is_finite() {
            return Err(SymphonyError::NonFiniteInput { what: "shaped reward" });
        }

        let slot = self.idx % self.capacity;
        if self.idx < self.capacity {
            self.states.extend_from_slice(&transition.state);
            self.actions.extend_from_slice(&transition.action);
            self.rewards.push(shaped as f32);
            self.next_states.extend_from_slice(&transition.next_state);
            self.dones.push(transition.done_mask());
        } else {
            let (s, a) = (self.state_dim, self.action_dim);
            self.states[slot * s..(slot + 1) * s].copy_from_slice(&transition.state);
            self.actions[slot * a..(slot + 1) * a].copy_from_slice(&transition.action);
            self.rewards[slot] = shaped as f32;
            self.next_states[slot * s..(slot + 1) * s].copy_from_slice(&transition.next_state);
            self.dones[slot] = transition.done_mask();
        }
        self.idx += 1;
        Ok(())
    }

    /// Number of valid slots, `min(total_added, capacity)`.
    pub fn len(&self) -> usize {
        self.idx.min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.idx == 0
    }

    /// Total transitions ever added (the write cursor).
    pub fn total_added(&self) -> usize {
        self.idx
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Batch size the next [`sample`](Self::sample) will draw.
    pub fn batch_size(&self) -> usize {
        batch_size_for(self.idx)
    }

    /// Insertion ordinal of the transition currently held in `slot`.
    fn ordinal(&self, slot: usize) -> usize {
        if self.idx <= self.capacity {
            slot
        } else {
            let write_pos = self.idx % self.capacity;
            self.idx - self.capacity + (slot + self.capacity - write_pos) % self.capacity
        }
    }

    /// Normalized sampling probability of every valid slot.
    ///
    /// All zero weights (a single stored transition) fall back to uniform.
    pub fn sampling_weights(&self) -> Vec<f64> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        let total = self.idx as f64;
        let mut weights: Vec<f64> = (0..len)
            .map(|slot| {
                let x = self.ordinal(slot) as f64 / total;
                (self.fade_factor * x * x).tanh()
            })
            .collect();

        let sum: f64 = weights.iter().sum();
        if sum > 0.0 && sum.is_finite() {
            weights.iter_mut().for_each(|w| *w /= sum);
        } else {
            weights.iter_mut().for_each(|w| *w = 1.0 / len as f64);
        }
        weights
    }

    /// Draw `n` slots with replacement according to the sampling weights.
    pub fn sample_slots(&mut self, n: usize) -> Result<Vec<usize>> {
        if self.is_empty() {
            return Err(SymphonyError::EmptyBuffer);
        }
        let weights = self.sampling_weights();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| SymphonyError::Tensor(format!("invalid sampling weights: {e}")))?;
        Ok((0..n).map(|_| dist.sample(&mut self.rng)).collect())
    }

    /// Draw a batch of [`batch_size`](Self::batch_size) transitions.
    pub fn sample<B: Backend>(&mut self, device: &B::Device) -> Result<SampledBatch<B>> {
        let batch = self.batch_size();
        let slots = self.sample_slots(batch)?;

        let (s, a) = (self.state_dim, self.action_dim);
        let mut states = Vec::with_capacity(batch * s);
        let mut actions = Vec::with_capacity(batch * a);
        let mut rewards = Vec::with_capacity(batch);
        let mut next_states = Vec::with_capacity(batch * s);
        let mut dones = Vec::with_capacity(batch);

        for &slot in &slots {
            states.extend_from_slice(&self.states[slot * s..(slot + 1) * s]);
            actions.extend_from_slice(&self.actions[slot * a..(slot + 1) * a]);
            rewards.push(self.rewards[slot]);
            next_states.extend_from_slice(&self.next_states[slot * s..(slot + 1) * s]);
            dones.push(self.dones[slot]);
        }

        Ok(SampledBatch {
            states: Tensor::from_data(TensorData::new(states, [batch, s]), device),
            actions: Tensor::from_data(TensorData::new(actions, [batch, a]), device),
            rewards: Tensor::from_data(TensorData::new(rewards, [batch, 1]), device),
            next_states: Tensor::from_data(TensorData::new(next_states, [batch, s]), device),
            dones: Tensor::from_data(TensorData::new(dones, [batch, 1]), device),
        })
    }

    /// Stored transition in `slot`, with its shaped reward.
    pub fn get(&self, slot: usize) -> Option<Transition> {
        if slot >= self.len() {
            return None;
        }
        let (s, a) = (self.state_dim, self.action_dim);
        Some(Transition::new(
            self.states[slot * s..(slot + 1) * s].to_vec(),
            self.actions[slot * a..(slot + 1) * a].to_vec(),
            self.rewards[slot],
            self.next_states[slot * s..(slot + 1) * s].to_vec(),
            self.dones[slot] > 0.5,
        ))
    }

    /// Copy out the raw contents.
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            state_dim: self.state_dim,
            action_dim: self.action_dim,
            capacity: self.capacity,
            idx: self.idx,
            states: self.states.clone(),
            actions: self.actions.clone(),
            rewards: self.rewards.clone(),
            next_states: self.next_states.clone(),
            dones: self.dones.clone(),
        }
    }

    /// Replace the contents with a snapshot taken from a store of the same
    /// shape and capacity.
    pub fn restore(&mut self, snapshot: BufferSnapshot) -> Result<()> {
        if snapshot.state_dim != self.state_dim {
            return Err(SymphonyError::DimensionMismatch {
                what: "snapshot state_dim",
                expected: self.state_dim,
                actual: snapshot.state_dim,
            });
        }
        if snapshot.action_dim != self.action_dim {
            return Err(SymphonyError::DimensionMismatch {
                what: "snapshot action_dim",
                expected: self.action_dim,
                actual: snapshot.action_dim,
            });
        }
        if snapshot.capacity != self.capacity {
            return Err(SymphonyError::DimensionMismatch {
                what: "snapshot capacity",
                expected: self.capacity,
                actual: snapshot.capacity,
            });
        }
        let len = snapshot.idx.min(snapshot.capacity);
        let consistent = snapshot.rewards.len() == len
            && snapshot.dones.len() == len
            && snapshot.states.len() == len * self.state_dim
            && snapshot.next_states.len() == len * self.state_dim
            && snapshot.actions.len() == len * self.action_dim;
        if !consistent {
            return Err(SymphonyError::DimensionMismatch {
                what: "snapshot arrays",
                expected: len,
                actual: snapshot.rewards.len(),
            });
        }

        self.states = snapshot.states;
        self.actions = snapshot.actions;
        self.rewards = snapshot.rewards;
        self.next_states = snapshot.next_states;
        self.dones = snapshot.dones;
        self.idx = snapshot.idx;
        Ok(())
    }
}
