//! Slow-moving target copies of a module.
//!
//! The target critic trails the online critic via an exponential moving
//! average of the parameters:
//!
//! ```text
//! θ_target = (1 - rate) * θ_target + rate * θ_online
//! ```
//!
//! The update walks both modules with a [`ModuleMapper`], so any two modules
//! of the same architecture can be blended, including ensembles whose
//! parameter ids differ.

use burn::module::{Module, ModuleMapper, Param};
use burn::prelude::*;

/// Flattened copy of one parameter, in traversal order.
struct FlattenedParam<B: Backend> {
    tensor: Tensor<B, 1>,
}

/// Collects every float parameter of a module.
///
/// Traversal order is deterministic for a fixed architecture, which is what
/// lets parameters be matched between two independently built modules.
struct ParamExtractor<B: Backend> {
    params: Vec<FlattenedParam<B>>,
}

impl<B: Backend> ModuleMapper<B> for ParamExtractor<B> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        let val = param.val();
        let numel: usize = val.dims().iter().product();
        self.params.push(FlattenedParam {
            tensor: val.reshape([numel]),
        });
        param
    }
}

/// Blends target parameters toward the extracted online ones.
struct PolyakMapper<B: Backend> {
    online_params: Vec<FlattenedParam<B>>,
    rate: f32,
    index: usize,
}

impl<B: Backend> ModuleMapper<B> for PolyakMapper<B> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        let target_val = param.val();
        let shape = target_val.dims();
        let numel: usize = shape.iter().product();

        let idx = self.index;
        self.index += 1;

        match self.online_params.get(idx) {
            Some(online) => {
                let blended = target_val.reshape([numel]).mul_scalar(1.0 - self.rate)
                    + online.tensor.clone().mul_scalar(self.rate);
                // Target weights never receive gradients; cutting the graph
                // here keeps successive updates from chaining autodiff nodes.
                Param::initialized(param.id.clone(), blended.reshape(shape).detach())
            }
            // Architectures differ: leave the parameter untouched.
            None => param,
        }
    }
}

/// Move `target` toward `online` by `rate` and return the updated target.
///
/// `rate = 0` returns the target unchanged; `rate = 1` returns a copy of the
/// online module.
pub fn polyak_update<B, M>(online: &M, target: M, rate: f32) -> M
where
    B: Backend,
    M: Module<B>,
{
    if rate <= 0.0 {
        return target;
    }
    if rate >= 1.0 {
        return online.clone();
    }

    let mut extractor = ParamExtractor { params: Vec::new() };
    let _ = online.clone().map(&mut extractor);

    let mut mapper = PolyakMapper {
        online_params: extractor.params,
        rate,
        index: 0,
    };
    target.map(&mut mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Initializer, LinearConfig};

    type TestBackend = NdArray<f32>;

    fn weights(linear: &burn::nn::Linear<TestBackend>) -> Vec<f32> {
        linear.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_rate_zero_returns_target() {
        let device = Default::default();
        let online = LinearConfig::new(4, 4).init::<TestBackend>(&device);
        let target = LinearConfig::new(4, 4).init::<TestBackend>(&device);
        let before = weights(&target);

        let updated = polyak_update::<TestBackend, _>(&online, target, 0.0);
        assert_eq!(weights(&updated), before);
    }

    #[test]
    fn test_rate_one_returns_online() {
        let device = Default::default();
        let online = LinearConfig::new(4, 4).init::<TestBackend>(&device);
        let target = LinearConfig::new(4, 4).init::<TestBackend>(&device);

        let updated = polyak_update::<TestBackend, _>(&online, target, 1.0);
        assert_eq!(weights(&updated), weights(&online));
    }

    #[test]
    fn test_ones_toward_zeros_moves_by_rate() {
        let device = Default::default();
        let online = LinearConfig::new(3, 2)
            .with_initializer(Initializer::Ones)
            .init::<TestBackend>(&device);
        let target = LinearConfig::new(3, 2)
            .with_initializer(Initializer::Zeros)
            .init::<TestBackend>(&device);

        let updated = polyak_update::<TestBackend, _>(&online, target, 0.003);
        for w in weights(&updated) {
            assert!((w - 0.003).abs() < 1e-7, "expected 0.003, got {w}");
        }
        let bias = updated
            .bias
            .as_ref()
            .unwrap()
            .val()
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        for b in bias {
            assert!((b - 0.003).abs() < 1e-7);
        }
    }

    #[test]
    fn test_interpolation_matches_formula() {
        let device = Default::default();
        let online = LinearConfig::new(8, 4).init::<TestBackend>(&device);
        let target = LinearConfig::new(8, 4).init::<TestBackend>(&device);
        let o = weights(&online);
        let t = weights(&target);

        let rate = 0.3f32;
        let updated = polyak_update::<TestBackend, _>(&online, target, rate);
        for ((u, o), t) in weights(&updated).iter().zip(&o).zip(&t) {
            let expected = (1.0 - rate) * t + rate * o;
            assert!((u - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_repeated_updates_converge() {
        let device = Default::default();
        let online = LinearConfig::new(2, 2)
            .with_initializer(Initializer::Ones)
            .init::<TestBackend>(&device);
        let mut target = LinearConfig::new(2, 2)
            .with_initializer(Initializer::Zeros)
            .init::<TestBackend>(&device);

        for _ in 0..2000 {
            target = polyak_update::<TestBackend, _>(&online, target, 0.01);
        }
        for w in weights(&target) {
            assert!((w - 1.0).abs() < 1e-3);
        }
    }
}
