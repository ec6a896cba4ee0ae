//! Classifier fitting.
//!
//! A plain manual training loop: full-precision Adam on mini-batches with
//! a chronological validation holdout. Both ensemble classifiers go
//! through the same loop; only the model and the early-stopping policy
//! differ.

use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::activation::log_softmax;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};

use crate::training::metrics::{EpochMetrics, TrainingHistory};
use crate::{EngineError, Result};

/// Hyperparameters for one fit run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// L2 penalty applied through the optimizer.
    pub weight_decay: f32,
    /// Fraction of examples held out (chronologically last) for validation.
    pub validation_fraction: f32,
    /// Stop after this many epochs without validation improvement.
    pub early_stopping_patience: Option<usize>,
    /// Return the best-validation snapshot instead of the final weights.
    pub restore_best: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            epochs: 50,
            batch_size: 32,
            learning_rate: 1e-4,
            weight_decay: 1e-4,
            validation_fraction: 0.1,
            early_stopping_patience: None,
            restore_best: false,
        }
    }
}

impl FitConfig {
    /// Settings used for the MLP: early stopping with best-model restore.
    pub fn with_early_stopping(patience: usize) -> Self {
        FitConfig {
            early_stopping_patience: Some(patience),
            restore_best: true,
            ..FitConfig::default()
        }
    }
}

struct Batch<B: Backend> {
    x: Tensor<B, 2>,
    y: Tensor<B, 2>,
    targets: Vec<usize>,
}

fn rows_to_tensor<B: Backend>(rows: &[Vec<f32>], device: &B::Device) -> Tensor<B, 2> {
    let dim = rows.first().map(|r| r.len()).unwrap_or(0);
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows.len(), dim])
}

fn labels_to_tensor<B: Backend>(labels: &[[f32; 3]], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = labels.iter().flatten().copied().collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([labels.len(), 3])
}

fn argmax3(row: &[f32]) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if row[i] > row[best] {
            best = i;
        }
    }
    best
}

fn count_correct(logits: &[f32], targets: &[usize]) -> usize {
    logits
        .chunks_exact(3)
        .zip(targets.iter())
        .filter(|(row, target)| argmax3(row) == **target)
        .count()
}

/// Categorical cross-entropy over one-hot targets.
fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    (targets * log_probs).sum_dim(1).mean().neg()
}

fn make_batches<B: Backend>(
    features: &[Vec<f32>],
    labels: &[[f32; 3]],
    batch_size: usize,
    device: &B::Device,
) -> Vec<Batch<B>> {
    features
        .chunks(batch_size)
        .zip(labels.chunks(batch_size))
        .map(|(x, y)| Batch {
            x: rows_to_tensor(x, device),
            y: labels_to_tensor(y, device),
            targets: y.iter().map(|l| argmax3(l)).collect(),
        })
        .collect()
}

/// Fit one classifier on the assembled examples.
///
/// `forward` maps the model and a feature batch to raw logits, so the same
/// loop serves any architecture. `on_epoch` fires once per finished epoch
/// for progress reporting.
pub fn fit<B, M, F, P>(
    mut model: M,
    forward: F,
    features: &[Vec<f32>],
    labels: &[[f32; 3]],
    config: &FitConfig,
    device: &B::Device,
    mut on_epoch: P,
) -> Result<(M, TrainingHistory)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Clone,
    F: Fn(&M, Tensor<B, 2>) -> Tensor<B, 2>,
    P: FnMut(usize, usize),
{
    let n = features.len();
    if n < 2 || labels.len() != n {
        return Err(EngineError::EmptyTrainingSet);
    }

    // Chronological holdout: the newest examples validate.
    let val_len = ((n as f32 * config.validation_fraction) as usize).max(1);
    let train_len = n - val_len;
    let batches = make_batches::<B>(
        &features[..train_len],
        &labels[..train_len],
        config.batch_size.min(train_len).max(1),
        device,
    );
    let val = make_batches::<B>(&features[train_len..], &labels[train_len..], val_len, device);

    let mut optimizer = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay.into())))
        .init();

    let mut history = TrainingHistory::new();
    let mut best_model = model.clone();

    log::info!(
        "fitting on {} examples ({} validation) for up to {} epochs",
        n,
        val_len,
        config.epochs
    );

    for epoch in 0..config.epochs {
        let mut train_metrics = EpochMetrics::new();
        for batch in &batches {
            let logits = forward(&model, batch.x.clone());
            let loss = cross_entropy(logits.clone(), batch.y.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();

            let logits_data = logits.into_data();
            let correct = count_correct(logits_data.as_slice().unwrap_or(&[]), &batch.targets);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            train_metrics.update(loss_val, correct, batch.targets.len());
        }

        let mut val_metrics = EpochMetrics::new();
        for batch in &val {
            let logits = forward(&model, batch.x.clone());
            let loss = cross_entropy(logits.clone(), batch.y.clone());
            let loss_val: f32 = loss.into_scalar().elem();
            let logits_data = logits.into_data();
            let correct = count_correct(logits_data.as_slice().unwrap_or(&[]), &batch.targets);
            val_metrics.update(loss_val, correct, batch.targets.len());
        }

        history.record_epoch(epoch, &train_metrics, &val_metrics);
        if history.best_epoch == epoch {
            best_model = model.clone();
        }

        log::debug!(
            "epoch {}/{}: train {} | val {}",
            epoch + 1,
            config.epochs,
            train_metrics,
            val_metrics
        );
        on_epoch(epoch + 1, config.epochs);

        if let Some(patience) = config.early_stopping_patience {
            if history.should_early_stop(patience) {
                log::info!(
                    "early stopping at epoch {} (best was epoch {})",
                    epoch + 1,
                    history.best_epoch + 1
                );
                break;
            }
        }
    }

    let chosen = if config.restore_best { best_model } else { model };
    Ok((chosen, history))
}
