//! Transition value type.
//!
//! A transition is immutable once it enters the experience store. Only the
//! terminal flag is kept: truncation (time limit) must not zero the
//! bootstrap term, so it never reaches the learner.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SymphonyError};

/// One environment step `(s, a, r, s', done)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State observation before the action.
    pub state: Vec<f32>,
    /// Continuous action taken.
    pub action: Vec<f32>,
    /// Raw reward from the environment (before stall shaping).
    pub reward: f32,
    /// State observation after the action.
    pub next_state: Vec<f32>,
    /// Episode terminated (goal reached, failure).
    pub terminal: bool,
}

impl Transition {
    /// Create a new transition.
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        next_state: Vec<f32>,
        terminal: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            terminal,
        }
    }

    /// Terminal flag as the `0.0 / 1.0` mask used in the bootstrap target.
    pub fn done_mask(&self) -> f32 {
        if self.terminal {
            1.0
        } else {
            0.0
        }
    }

    /// Mean absolute state change `mean(|s' - s|)`.
    ///
    /// This is the activity magnitude the stall penalty is computed from.
    pub fn activity(&self) -> f64 {
        if self.state.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .state
            .iter()
            .zip(&self.next_state)
            .map(|(&s, &n)| (n as f64 - s as f64).abs())
            .sum();
        sum / self.state.len() as f64
    }

    /// Check shapes against the agent dimensions and reject non-finite values.
    pub fn validate(&self, state_dim: usize, action_dim: usize) -> Result<()> {
        check_len("state", state_dim, self.state.len())?;
        check_len("next_state", state_dim, self.next_state.len())?;
        check_len("action", action_dim, self.action.len())?;

        if !self.state.iter().all(|v| v.is_finite()) {
            return Err(SymphonyError::NonFiniteInput { what: "state" });
        }
        if !self.next_state.iter().all(|v| v.is_finite()) {
            return Err(SymphonyError::NonFiniteInput { what: "next_state" });
        }
        if !self.action.iter().all(|v| v.is_finite()) {
            return Err(SymphonyError::NonFiniteInput { what: "action" });
        }
        if !self.reward.is_finite() {
            return Err(SymphonyError::NonFiniteInput { what: "reward" });
        }
        Ok(())
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SymphonyError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
