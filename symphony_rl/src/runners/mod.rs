//! Runner for single-environment Symphony training.
//!
//! - [`TrainingLoop`]: episode driver owning the agent, the experience store
//!   and the episode history
//! - [`TrainingLoopConfig`]: exploration, update and evaluation schedule
//!
//! # Terminal vs Truncated
//!
//! Both end an episode, but only a terminal step is stored as `done`, so
//! time-limit cut-offs still bootstrap from the next state.

pub mod training_config;
pub mod training_loop;

#[cfg(test)]
pub mod tests;

pub use training_config::TrainingLoopConfig;
pub use training_loop::{TrainingLoop, TrainingSummary};
