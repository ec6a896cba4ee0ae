//! Training metrics and epoch history.

use std::fmt;

/// Metrics accumulated over one epoch.
#[derive(Debug, Clone, Default)]
pub struct EpochMetrics {
    pub loss_sum: f64,
    pub batch_count: usize,
    pub correct: usize,
    pub examples: usize,
}

impl EpochMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, loss: f32, correct: usize, batch_size: usize) {
        self.loss_sum += loss as f64;
        self.batch_count += 1;
        self.correct += correct;
        self.examples += batch_size;
    }

    pub fn avg_loss(&self) -> f64 {
        if self.batch_count == 0 {
            0.0
        } else {
            self.loss_sum / self.batch_count as f64
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.examples == 0 {
            0.0
        } else {
            self.correct as f64 / self.examples as f64
        }
    }
}

impl fmt::Display for EpochMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss: {:.4} | acc: {:.1}%",
            self.avg_loss(),
            self.accuracy() * 100.0
        )
    }
}

/// Per-epoch loss/accuracy curves and the best-validation bookkeeping
/// driving early stopping.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_losses: Vec<f64>,
    pub val_losses: Vec<f64>,
    pub train_accuracies: Vec<f64>,
    pub val_accuracies: Vec<f64>,
    pub best_val_loss: f64,
    pub best_epoch: usize,
}

impl TrainingHistory {
    pub fn new() -> Self {
        TrainingHistory {
            best_val_loss: f64::INFINITY,
            ..Default::default()
        }
    }

    pub fn record_epoch(&mut self, epoch: usize, train: &EpochMetrics, val: &EpochMetrics) {
        self.train_losses.push(train.avg_loss());
        self.val_losses.push(val.avg_loss());
        self.train_accuracies.push(train.accuracy());
        self.val_accuracies.push(val.accuracy());

        if val.avg_loss() < self.best_val_loss {
            self.best_val_loss = val.avg_loss();
            self.best_epoch = epoch;
        }
    }

    /// True once validation loss has not improved for `patience` epochs.
    pub fn should_early_stop(&self, patience: usize) -> bool {
        if self.val_losses.len() <= patience {
            return false;
        }
        let current_epoch = self.val_losses.len() - 1;
        current_epoch - self.best_epoch >= patience
    }

    pub fn epochs_run(&self) -> usize {
        self.val_losses.len()
    }
}
