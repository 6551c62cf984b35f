//! Algorithm components.
//!
//! - `losses`: robust ReHE / ReHaE reductions
//! - `symphony`: the Symphony actor-critic learner

pub mod losses;
pub mod symphony;

pub use losses::{rehae, rehe};
pub use symphony::{
    CriticEnsemble, ExplorationNoise, PolicyNet, PolicyNetwork, Symphony, SymphonyConfig,
};
