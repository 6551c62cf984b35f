//! Critic ensemble: three independent Q heads over `(state, action)`.

use burn::prelude::*;

use crate::nn::{FourierSeries, FourierSeriesConfig};

use super::config::SymphonyConfig;

/// Number of Q heads in the ensemble.
pub const NUM_HEADS: usize = 3;

/// Three independently initialized Q estimators of identical architecture.
///
/// The united query takes the element-wise minimum across heads, a
/// pessimistic estimate that counters overestimation bias.
#[derive(Module, Debug)]
pub struct CriticEnsemble<B: Backend> {
    heads: Vec<FourierSeries<B>>,
}

impl<B: Backend> CriticEnsemble<B> {
    /// Fresh ensemble for the configured dimensions.
    pub fn new(config: &SymphonyConfig, device: &B::Device) -> Self {
        let head = FourierSeriesConfig::new(config.state_dim + config.action_dim, config.hidden_dim, 1);
        Self {
            heads: (0..NUM_HEADS).map(|_| head.init(device)).collect(),
        }
    }

    /// Q value of every head, each of shape [batch, 1].
    pub fn forward(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> Vec<Tensor<B, 2>> {
        let x = Tensor::cat(vec![state, action], 1);
        self.heads.iter().map(|head| head.forward(x.clone())).collect()
    }

    /// Element-wise minimum over heads, shape [batch, 1].
    pub fn forward_united(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = Tensor::cat(vec![state, action], 1);
        // `new` always builds NUM_HEADS heads.
        let mut united = self.heads[0].forward(x.clone());
        for head in &self.heads[1..] {
            united = united.min_pair(head.forward(x.clone()));
        }
        united
    }

    pub fn num_heads(&self) -> usize {
        self.heads.len()
    }

    /// Ensemble whose every head returns `value`.
    #[cfg(test)]
    pub(crate) fn into_constant(self, value: f32) -> Self {
        Self {
            heads: self.heads.into_iter().map(|h| h.into_constant(value)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_united_is_elementwise_min() {
        let device = Default::default();
        let config = SymphonyConfig::tiny(3, 2);
        let critic = CriticEnsemble::<TestBackend>::new(&config, &device);

        let state = Tensor::<TestBackend, 2>::random(
            [5, 3],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let action = Tensor::<TestBackend, 2>::zeros([5, 2], &device);

        let heads: Vec<Vec<f32>> = critic
            .forward(state.clone(), action.clone())
            .into_iter()
            .map(|q| q.into_data().to_vec::<f32>().unwrap())
            .collect();
        let united = critic
            .forward_united(state, action)
            .into_data()
            .to_vec::<f32>()
            .unwrap();

        assert_eq!(heads.len(), NUM_HEADS);
        for (i, u) in united.iter().enumerate() {
            let expected = heads.iter().map(|h| h[i]).fold(f32::INFINITY, f32::min);
            assert_eq!(*u, expected);
        }
    }

    #[test]
    fn test_heads_are_independent() {
        let device = Default::default();
        let critic = CriticEnsemble::<TestBackend>::new(&SymphonyConfig::tiny(2, 1), &device);

        let state = Tensor::<TestBackend, 2>::ones([1, 2], &device);
        let action = Tensor::<TestBackend, 2>::ones([1, 1], &device);
        let qs: Vec<f32> = critic
            .forward(state, action)
            .into_iter()
            .map(|q| q.into_scalar())
            .collect();
        assert!(qs[0] != qs[1] || qs[1] != qs[2]);
    }
}
