//! Nonlinear outcome classifier.
//!
//! Architecture: Input → Hidden1(128) → ReLU → Dropout
//!                     → Hidden2(64)  → ReLU → Dropout
//!                     → logits(3)

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration for the MLP classifier.
#[derive(Debug, Clone)]
pub struct OutcomeNetConfig {
    /// Input dimension (feature vector length).
    pub input_dim: usize,
    pub hidden_dims: [usize; 2],
    pub dropout: f64,
}

impl OutcomeNetConfig {
    pub fn new(input_dim: usize) -> Self {
        OutcomeNetConfig {
            input_dim,
            hidden_dims: [128, 64],
            dropout: 0.5,
        }
    }
}

/// Two-hidden-layer MLP emitting raw outcome logits [batch, 3].
/// Softmax (with temperature) is applied by the caller.
#[derive(Module, Debug)]
pub struct OutcomeNet<B: Backend> {
    hidden1: Linear<B>,
    drop1: Dropout,
    hidden2: Linear<B>,
    drop2: Dropout,
    output: Linear<B>,
}

impl<B: Backend> OutcomeNet<B> {
    pub fn new(device: &B::Device, config: &OutcomeNetConfig) -> Self {
        let [h1, h2] = config.hidden_dims;
        OutcomeNet {
            hidden1: LinearConfig::new(config.input_dim, h1).init(device),
            drop1: DropoutConfig::new(config.dropout).init(),
            hidden2: LinearConfig::new(h1, h2).init(device),
            drop2: DropoutConfig::new(config.dropout).init(),
            output: LinearConfig::new(h2, 3).init(device),
        }
    }

    /// Forward pass: [batch, input_dim] → [batch, 3] logits.
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.drop1.forward(relu(self.hidden1.forward(features)));
        let x = self.drop2.forward(relu(self.hidden2.forward(x)));
        self.output.forward(x)
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
        let model = OutcomeNet::<TestBackend>::new(&device, &OutcomeNetConfig::new(27));

        let features = Tensor::random(
            [4, 27],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let logits = model.forward(features);
        assert_eq!(logits.dims(), [4, 3]);
    }

    #[test]
    fn test_inference_is_deterministic() {
        // Dropout must be inert on a non-autodiff backend.
        let device = Default::default();
        let model = OutcomeNet::<TestBackend>::new(&device, &OutcomeNetConfig::new(10));

        let features = Tensor::random(
            [1, 10],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let first = model.forward(features.clone()).into_data();
        let second = model.forward(features).into_data();
        assert_eq!(
            first.as_slice::<f32>().unwrap(),
            second.as_slice::<f32>().unwrap()
        );
    }
}
