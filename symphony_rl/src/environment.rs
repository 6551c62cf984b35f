//! Environment collaborator.
//!
//! The learner only needs `reset`/`step` and the space dimensions. A
//! single-instance Pendulum swing-up task is bundled for tests and demos.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep {
    /// Observation after the step.
    pub next_state: Vec<f32>,
    /// Reward for the step.
    pub reward: f32,
    /// Episode ended in a terminal state (goal/failure).
    pub terminal: bool,
    /// Episode ended due to a time limit.
    pub truncated: bool,
}

impl EnvStep {
    /// Episode is over for either reason.
    pub fn done(&self) -> bool {
        self.terminal || self.truncated
    }
}

/// Single continuous-control environment.
pub trait ContinuousEnv {
    /// Observation size.
    fn state_dim(&self) -> usize;

    /// Action size.
    fn action_dim(&self) -> usize;

    /// Per-dimension action bound, if the action space is bounded.
    fn action_high(&self) -> Option<Vec<f32>>;

    /// Start a new episode and return the first observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Apply an action.
    fn step(&mut self, action: &[f32]) -> EnvStep;
}

// ============================================================================
// Pendulum
// ============================================================================

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const G: f32 = 10.0;
const M: f32 = 1.0;
const L: f32 = 1.0;
const MAX_STEPS: u32 = 200;

/// Wrap an angle into `[-pi, pi)`.
fn angle_normalize(x: f32) -> f32 {
    use std::f32::consts::PI;
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// Inverted pendulum swing-up.
///
/// Observation `[cos θ, sin θ, θ̇]`, torque in `[-2, 2]`. There is no
/// terminal state; episodes truncate after `max_steps`.
#[derive(Debug, Clone)]
pub struct Pendulum {
    theta: f32,
    theta_dot: f32,
    ticks: u32,
    max_steps: u32,
    rng: StdRng,
}

impl Pendulum {
    /// Pendulum with the standard 200-step limit.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            theta: 0.0,
            theta_dot: 0.0,
            ticks: 0,
            max_steps: MAX_STEPS,
            rng,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn observation(&self) -> Vec<f32> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }
}

impl ContinuousEnv for Pendulum {
    fn state_dim(&self) -> usize {
        3
    }

    fn action_dim(&self) -> usize {
        1
    }

    fn action_high(&self) -> Option<Vec<f32>> {
        Some(vec![MAX_TORQUE])
    }

    fn reset(&mut self) -> Vec<f32> {
        use std::f32::consts::PI;
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        self.ticks = 0;
        self.observation()
    }

    fn step(&mut self, action: &[f32]) -> EnvStep {
        let torque = action.first().copied().unwrap_or(0.0).clamp(-MAX_TORQUE, MAX_TORQUE);
        let (theta, theta_dot) = (self.theta, self.theta_dot);

        // Cost is evaluated on the pre-step state.
        let cost = angle_normalize(theta).powi(2)
            + 0.1 * theta_dot * theta_dot
            + 0.001 * torque * torque;

        let new_theta_dot = (theta_dot
            + (3.0 * G / (2.0 * L) * theta.sin() + 3.0 / (M * L * L) * torque) * DT)
            .clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = angle_normalize(theta + new_theta_dot * DT);
        self.theta_dot = new_theta_dot;
        self.ticks += 1;

        EnvStep {
            next_state: self.observation(),
            reward: -cost,
            terminal: false,
            truncated: self.ticks >= self.max_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_seeded() {
        let mut a = Pendulum::new(Some(3));
        let mut b = Pendulum::new(Some(3));
        assert_eq!(a.reset(), b.reset());
    }

    #[test]
    fn test_observation_is_on_unit_circle() {
        let mut env = Pendulum::new(Some(0));
        let obs = env.reset();
        assert_eq!(obs.len(), env.state_dim());
        assert!((obs[0] * obs[0] + obs[1] * obs[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_truncates_at_max_steps() {
        let mut env = Pendulum::new(Some(0)).with_max_steps(5);
        env.reset();
        for i in 1..=5 {
            let step = env.step(&[0.0]);
            assert!(!step.terminal);
            assert_eq!(step.truncated, i == 5);
        }
    }

    #[test]
    fn test_reward_is_non_positive_and_bounded() {
        let mut env = Pendulum::new(Some(1));
        env.reset();
        for _ in 0..200 {
            let step = env.step(&[10.0]);
            assert!(step.reward <= 0.0);
            // pi^2 + 0.1 * 8^2 + 0.001 * 2^2
            assert!(step.reward >= -16.3);
            assert!(step.next_state[2].abs() <= MAX_SPEED);
        }
    }

    #[test]
    fn test_upright_rest_is_free() {
        let mut env = Pendulum::new(Some(0));
        env.reset();
        env.theta = 0.0;
        env.theta_dot = 0.0;
        let step = env.step(&[0.0]);
        assert_eq!(step.reward, 0.0);
        assert_eq!(step.next_state, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_angle_normalize() {
        use std::f32::consts::PI;
        assert!((angle_normalize(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((angle_normalize(0.5) - 0.5).abs() < 1e-6);
        assert!((angle_normalize(-0.5) + 0.5).abs() < 1e-6);
    }
}
