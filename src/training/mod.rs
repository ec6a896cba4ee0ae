//! Training-set assembly and classifier fitting.

pub mod dataset;
pub mod metrics;
pub mod trainer;

pub use dataset::{assemble_training_set, TrainingSet};
pub use metrics::{EpochMetrics, TrainingHistory};
pub use trainer::{fit, FitConfig};
