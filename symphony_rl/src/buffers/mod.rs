//! Experience storage for off-policy training.
//!
//! - `ExperienceStore`: fixed-capacity ring buffer with fading-memory
//!   (recency-weighted) sampling and stall-penalty reward shaping

pub mod replay_buffer;

pub use replay_buffer::{
    batch_size_for, stall_adjustment, BufferSnapshot, ExperienceStore, SampledBatch,
};

#[cfg(test)]
mod tests;
