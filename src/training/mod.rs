//! Training module
//!
//! Full-batch cross-entropy training with Adam and evaluation helpers.

mod trainer;

pub use trainer::{evaluate, Evaluation, Trainer, TrainingConfig, TrainingHistory, TrainingPhase};
