//! Symphony: deterministic actor-critic with a triple critic ensemble.
//!
//! - [`config`]: agent and experience-store hyperparameters
//! - [`actor`]: policy network and its exploration schedule
//! - [`critic`]: three-head critic ensemble
//! - [`agent`]: the learner orchestrating one training step

pub mod actor;
pub mod agent;
pub mod config;
pub mod critic;

pub use actor::{ExplorationNoise, PolicyNet, PolicyNetwork};
pub use agent::Symphony;
pub use config::SymphonyConfig;
pub use critic::{CriticEnsemble, NUM_HEADS};
