//! Neural network building blocks.
//!
//! - [`fourier`]: Fourier-series feature network shared by actor and critics

pub mod fourier;

pub use fourier::{FourierSeries, FourierSeriesConfig};
