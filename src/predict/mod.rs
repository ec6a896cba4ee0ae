//! Ensemble inference for single fixtures.

pub mod inference;

pub use inference::{blend, softmax_with_temperature, PredictionReport, Predictor};
