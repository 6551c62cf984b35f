//! Fourier-series feature network.
//!
//! A small feed-forward block with a periodic activation:
//!
//! ```text
//! Linear(d_in, h) -> LayerNorm(h) -> Linear(h, h) -> sin -> LeakyReLU(0.1) -> Linear(h, d_out)
//! ```
//!
//! The sine layer lets the network fit oscillatory value landscapes with
//! few units, and LayerNorm ahead of it keeps the phase arguments in range.
//! Both the actor and every critic head are built from this block.

use burn::module::Param;
use burn::nn::{Initializer, LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::leaky_relu;

/// Negative slope of the leaky rectifier after the sine layer.
pub const LEAKY_SLOPE: f64 = 0.1;

/// Configuration for [`FourierSeries`].
#[derive(Debug, Clone)]
pub struct FourierSeriesConfig {
    /// Number of input features.
    pub d_input: usize,
    /// Width of the hidden layers.
    pub d_hidden: usize,
    /// Number of output features.
    pub d_output: usize,
}

impl FourierSeriesConfig {
    /// Create a new configuration.
    pub fn new(d_input: usize, d_hidden: usize, d_output: usize) -> Self {
        Self {
            d_input,
            d_hidden,
            d_output,
        }
    }

    /// Initialize the network with fresh weights.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FourierSeries<B> {
        FourierSeries {
            input: LinearConfig::new(self.d_input, self.d_hidden).init(device),
            norm: LayerNormConfig::new(self.d_hidden).init(device),
            hidden: LinearConfig::new(self.d_hidden, self.d_hidden).init(device),
            output: LinearConfig::new(self.d_hidden, self.d_output).init(device),
        }
    }
}

/// Linear -> LayerNorm -> Linear -> sin -> LeakyReLU -> Linear.
#[derive(Module, Debug)]
pub struct FourierSeries<B: Backend> {
    input: Linear<B>,
    norm: LayerNorm<B>,
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> FourierSeries<B> {
    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - Tensor of shape [batch_size, d_input]
    ///
    /// # Returns
    /// Tensor of shape [batch_size, d_output]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.input.forward(x);
        let x = self.norm.forward(x);
        let x = self.hidden.forward(x).sin();
        let x = leaky_relu(x, LEAKY_SLOPE);
        self.output.forward(x)
    }

    /// Re-draw every Linear weight matrix from Xavier-uniform.
    ///
    /// Biases, LayerNorm and parameter ids are kept, so optimizer state
    /// stays attached to the same parameters.
    pub fn redraw_weights(self) -> Self {
        Self {
            input: redraw_linear(self.input),
            norm: self.norm,
            hidden: redraw_linear(self.hidden),
            output: redraw_linear(self.output),
        }
    }

    /// Zero the output layer so the block returns `value` for every input.
    #[cfg(test)]
    pub(crate) fn into_constant(mut self, value: f32) -> Self {
        let weight = self.output.weight.val();
        let device = weight.device();
        let [d_hidden, d_output] = weight.dims();
        self.output.weight = Param::from_tensor(Tensor::zeros([d_hidden, d_output], &device));
        self.output.bias = Some(Param::from_tensor(Tensor::full([d_output], value, &device)));
        self
    }
}

fn redraw_linear<B: Backend>(mut linear: Linear<B>) -> Linear<B> {
    let weight = linear.weight.val();
    let device = weight.device();
    let [d_input, d_output] = weight.dims();
    let fresh = Initializer::XavierUniform { gain: 1.0 }
        .init_with::<B, 2, _>([d_input, d_output], Some(d_input), Some(d_output), &device)
        .val();
    linear.weight = Param::initialized(linear.weight.id.clone(), fresh.require_grad());
    linear
}
