//! Core value types and module utilities shared by the learner.

pub mod target_network;
pub mod transition;

pub use target_network::polyak_update;
pub use transition::Transition;
