//! Linear outcome classifier.
//!
//! A single dense layer over the same features the MLP sees. Kept in the
//! ensemble for its different inductive bias, not its accuracy.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Multinomial logistic regression emitting raw logits [batch, 3].
#[derive(Module, Debug)]
pub struct SoftmaxRegression<B: Backend> {
    output: Linear<B>,
}

impl<B: Backend> SoftmaxRegression<B> {
    pub fn new(device: &B::Device, input_dim: usize) -> Self {
        SoftmaxRegression {
            output: LinearConfig::new(input_dim, 3).init(device),
        }
    }

    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.output.forward(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = SoftmaxRegression::<TestBackend>::new(&device, 27);

        let features = Tensor::random(
            [2, 27],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        assert_eq!(model.forward(features).dims(), [2, 3]);
    }
}
