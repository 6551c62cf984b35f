//! Robust scalar reductions used in place of mean-squared error.
//!
//! Both losses saturate to linear growth for large errors, so a handful of
//! outlier rewards cannot dominate a gradient step:
//!
//! ```text
//! ReHE(E)  = a · tanh(a),    a = mean(|E|)
//! ReHaE(E) = |m| · tanh(m),  m = mean(E)
//! ```
//!
//! ReHE is the symmetric critic loss. ReHaE keeps the sign of the mean
//! error, so minimizing it keeps pushing the mean below zero; the actor uses
//! it on the negative advantage to keep climbing the value estimate.

use burn::prelude::*;

/// Rectified Huber error: `a · tanh(a)` with `a = mean(|error|)`.
///
/// Returns a single-element tensor. Always non-negative.
pub fn rehe<B: Backend, const D: usize>(error: Tensor<B, D>) -> Tensor<B, 1> {
    let a = error.abs().mean();
    a.clone() * a.tanh()
}

/// Rectified Huber asymmetric error: `|m| · tanh(m)` with `m = mean(error)`.
///
/// Returns a single-element tensor carrying the sign of `m`.
pub fn rehae<B: Backend, const D: usize>(error: Tensor<B, D>) -> Tensor<B, 1> {
    let m = error.mean();
    m.clone().abs() * m.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use proptest::prelude::*;

    type TestBackend = NdArray<f32>;

    fn tensor(values: &[f32]) -> Tensor<TestBackend, 1> {
        Tensor::from_data(
            TensorData::new(values.to_vec(), [values.len()]),
            &Default::default(),
        )
    }

    #[test]
    fn test_rehe_known_value() {
        // mean(|E|) = 2, loss = 2 * tanh(2)
        let loss = rehe(tensor(&[1.0, -3.0])).into_scalar();
        assert!((loss - 2.0 * 2.0f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_rehae_known_value() {
        // mean(E) = -1, loss = 1 * tanh(-1)
        let loss = rehae(tensor(&[1.0, -3.0])).into_scalar();
        assert!((loss - (-1.0f32).tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_zero_error_gives_zero_loss() {
        assert_eq!(rehe(tensor(&[0.0, 0.0, 0.0])).into_scalar(), 0.0);
        assert_eq!(rehae(tensor(&[0.0, 0.0, 0.0])).into_scalar(), 0.0);
        // Signed errors that cancel out.
        assert_eq!(rehae(tensor(&[2.0, -2.0])).into_scalar(), 0.0);
    }

    #[test]
    fn test_rehe_on_two_dimensional_batch() {
        let device = Default::default();
        let e = Tensor::<TestBackend, 2>::from_floats([[0.5], [-0.5]], &device);
        let loss = rehe(e).into_scalar();
        assert!((loss - 0.5 * 0.5f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_rehe_is_differentiable_at_zero() {
        type AD = Autodiff<TestBackend>;
        let device = Default::default();
        let e = Tensor::<AD, 1>::from_floats([0.0, 0.0], &device).require_grad();
        let loss = rehe(e.clone());
        let grads = loss.backward();
        let grad = e.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();
        assert!(grad.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_growth_is_at_most_linear() {
        let big = rehe(tensor(&[1e6])).into_scalar();
        assert!(big <= 1e6 + 1.0);
    }

    proptest! {
        /// ReHE is non-negative and symmetric under E -> -E.
        #[test]
        fn prop_rehe_non_negative_and_symmetric(
            values in prop::collection::vec(-100.0f32..100.0, 1..64),
        ) {
            let negated: Vec<f32> = values.iter().map(|v| -v).collect();
            let pos = rehe(tensor(&values)).into_scalar();
            let neg = rehe(tensor(&negated)).into_scalar();

            prop_assert!(pos >= 0.0);
            prop_assert!((pos - neg).abs() <= 1e-4 * pos.max(1.0));
        }

        /// ReHaE is odd: its magnitude is sign independent and its sign
        /// follows the mean error.
        #[test]
        fn prop_rehae_is_odd(
            values in prop::collection::vec(-100.0f32..100.0, 1..64),
        ) {
            let negated: Vec<f32> = values.iter().map(|v| -v).collect();
            let pos = rehae(tensor(&values)).into_scalar();
            let neg = rehae(tensor(&negated)).into_scalar();

            prop_assert!((pos + neg).abs() <= 1e-4 * pos.abs().max(1.0));

            let mean = values.iter().sum::<f32>() / values.len() as f32;
            if mean.abs() > 1e-3 {
                prop_assert_eq!(pos.signum(), mean.signum());
            }
        }

        /// |ReHaE(E)| never exceeds ReHE(E).
        #[test]
        fn prop_rehae_bounded_by_rehe(
            values in prop::collection::vec(-100.0f32..100.0, 1..64),
        ) {
            let sym = rehe(tensor(&values)).into_scalar();
            let asym = rehae(tensor(&values)).into_scalar();
            prop_assert!(asym.abs() <= sym + 1e-4);
        }
    }
}
