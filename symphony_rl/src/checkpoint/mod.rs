//! Learner checkpointing.
//!
//! Saves and restores everything needed to resume training.
//!
//! ## Layout
//!
//! ```text
//! <checkpoint_dir>/
//!   actor.bin           policy weights (BinFileRecorder, full precision)
//!   critic.bin          online critic ensemble
//!   critic_target.bin   target critic ensemble
//!   snapshot.json       exploration state, q_old_policy, learning flag,
//!                       store, history
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use symphony_rl::checkpoint::{Checkpointer, CheckpointerConfig};
//!
//! let checkpointer = Checkpointer::new(CheckpointerConfig::new("./checkpoints"))?;
//!
//! // In training loop:
//! checkpointer.save(&agent, &store, &history, learning)?;
//!
//! // Resume training:
//! let progress = checkpointer.load(&mut agent, &mut store)?;
//! ```

pub mod checkpointer;

pub use checkpointer::{
    Checkpointer,
    CheckpointerConfig,
    CheckpointError,
    TrainingProgress,
    TrainingSnapshot,
};
