//! # Symphony: Off-Policy Actor-Critic for Continuous Control
//!
//! Deterministic policy, triple critic ensemble and fading-memory replay,
//! trained on a single environment instance with burn.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          TrainingLoop                              │
//! ├───────────────────────────────────────────────────────────────────┤
//! │   ┌──────────────┐  action   ┌──────────────────┐                  │
//! │   │ PolicyNetwork│ ────────▶ │  ContinuousEnv   │                  │
//! │   │ + exploration│           └────────┬─────────┘                  │
//! │   └──────▲───────┘                    │ (s, a, r+1, s', terminal)  │
//! │          │                            ▼                            │
//! │          │ actor update     ┌──────────────────┐                  │
//! │   ┌──────┴───────┐  batch   │ ExperienceStore  │                  │
//! │   │  Symphony    │ ◀─────── │ fading memory    │                  │
//! │   │  learner     │          │ stall shaping    │                  │
//! │   └──────┬───────┘          └──────────────────┘                  │
//! │          │ critic update                                           │
//! │   ┌──────▼───────┐   EMA    ┌──────────────────┐                  │
//! │   │CriticEnsemble│ ───────▶ │  critic_target   │                  │
//! │   │   (3 heads)  │          │                  │                  │
//! │   └──────────────┘          └──────────────────┘                  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn::backend::{Autodiff, NdArray};
//! use symphony_rl::{
//!     ConsoleLogger, ExperienceStore, Pendulum, Symphony, SymphonyConfig,
//!     TrainingLoop, TrainingLoopConfig,
//! };
//!
//! type B = Autodiff<NdArray<f32>>;
//!
//! let mut env = Pendulum::new(Some(0));
//! let mut eval_env = Pendulum::new(Some(1));
//! let config = SymphonyConfig::for_env(&env).with_seed(0);
//!
//! let agent = Symphony::<B>::new(config.clone(), &Default::default())?;
//! let store = ExperienceStore::from_config(&config)?;
//! let mut runner = TrainingLoop::new(TrainingLoopConfig::new().with_num_episodes(200), agent, store)?;
//! runner.run(&mut env, &mut eval_env, &mut ConsoleLogger::new(1))?;
//! ```

pub mod core;
pub mod nn;
pub mod algorithms;
pub mod buffers;
pub mod environment;
pub mod runners;
pub mod checkpoint;
pub mod metrics;
pub mod error;

// Re-export commonly used types
pub use crate::core::{polyak_update, Transition};
pub use nn::{FourierSeries, FourierSeriesConfig};
pub use algorithms::{
    rehae, rehe, CriticEnsemble, ExplorationNoise, PolicyNet, PolicyNetwork, Symphony,
    SymphonyConfig,
};
pub use buffers::{batch_size_for, stall_adjustment, BufferSnapshot, ExperienceStore, SampledBatch};
pub use environment::{ContinuousEnv, EnvStep, Pendulum};
pub use runners::{TrainingLoop, TrainingLoopConfig, TrainingSummary};
pub use checkpoint::{
    CheckpointError, Checkpointer, CheckpointerConfig, TrainingProgress, TrainingSnapshot,
};
pub use metrics::{
    CSVLogger, ConsoleLogger, EpisodeHistory, EpisodeSnapshot, MetricsLogger, MultiLogger,
    NullLogger,
};
pub use error::{Result, SymphonyError};
