//! Error types for the Symphony learner.
//!
//! The core has no recoverable-error taxonomy: every variant here means the
//! current training step (or the whole run) should stop. Numeric degeneracy
//! is surfaced as an error instead of silently propagating NaNs.

use thiserror::Error;

use crate::checkpoint::CheckpointError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SymphonyError>;

/// Errors raised by the learner, the experience store and the training loop.
#[derive(Debug, Error)]
pub enum SymphonyError {
    /// A configuration value is out of its valid range.
    #[error("invalid config: {param} {message}")]
    InvalidConfig {
        /// Offending parameter name.
        param: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A vector did not have the length the agent was built for.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which input was malformed.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A transition carried a NaN or infinite value.
    #[error("non-finite value in {what}")]
    NonFiniteInput {
        /// Which field was non-finite.
        what: &'static str,
    },

    /// Sampling was requested before any transition was stored.
    #[error("experience store is empty")]
    EmptyBuffer,

    /// A loss evaluated to NaN or infinity.
    #[error("non-finite {stage} loss: {value}")]
    NonFiniteLoss {
        /// `"critic"` or `"actor"`.
        stage: &'static str,
        /// The offending value.
        value: f32,
    },

    /// Tensor data could not be read back to the host.
    #[error("tensor read-back failed: {0}")]
    Tensor(String),

    /// Persistence collaborator failure.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl SymphonyError {
    pub(crate) fn invalid_config(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            param,
            message: message.into(),
        }
    }
}
