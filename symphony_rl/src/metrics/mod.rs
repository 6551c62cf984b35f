//! Training metrics and logging.
//!
//! ## History
//!
//! - [`EpisodeHistory`]: Per-episode returns and lengths, persisted with checkpoints
//!
//! ## Loggers
//!
//! - [`ConsoleLogger`]: Tabular console output
//! - [`CSVLogger`]: CSV file logging for analysis
//! - [`MultiLogger`]: Combine multiple loggers
//! - [`NullLogger`]: Discard everything

pub mod training_metrics;
pub mod logger;

pub use training_metrics::{EpisodeHistory, AVERAGE_WINDOW};
pub use logger::{
    EpisodeSnapshot,
    MetricsLogger,
    ConsoleLogger,
    CSVLogger,
    MultiLogger,
    NullLogger,
};
