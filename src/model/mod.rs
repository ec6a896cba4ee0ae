//! Classifier architectures for outcome prediction.

pub mod linear;
pub mod mlp;

pub use linear::SoftmaxRegression;
pub use mlp::{OutcomeNet, OutcomeNetConfig};
