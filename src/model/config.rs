//! Model configuration
//!
//! Hyperparameters of the traffic classifier.

use serde::{Deserialize, Serialize};

use crate::data::TrafficLabel;
use crate::error::{Error, Result};

/// Configuration for the location sequence classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of distinct tokens, taken from the vocabulary
    pub vocab_size: usize,
    /// Number of encoding channels K
    pub num_channels: usize,
    /// Model hidden dimension
    pub d_model: usize,
    /// Number of attention heads
    pub n_heads: usize,
    /// Number of encoder layers
    pub n_layers: usize,
    /// Feed-forward network dimension
    pub d_ff: usize,
    /// Dropout probability
    pub dropout: f64,
    /// Number of output classes
    pub num_classes: usize,
    /// Random seed for weight initialization
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            vocab_size: 0,
            num_channels: 4,
            d_model: 32,
            n_heads: 2,
            n_layers: 1,
            d_ff: 64,
            dropout: 0.0,
            num_classes: TrafficLabel::NUM_CLASSES,
            seed: 42,
        }
    }
}

impl ClassifierConfig {
    /// Copy with the vocabulary and channel sizes of a concrete batch
    pub fn for_data(&self, vocab_size: usize, num_channels: usize) -> Self {
        Self {
            vocab_size,
            num_channels,
            ..self.clone()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("vocab_size", self.vocab_size),
            ("num_channels", self.num_channels),
            ("d_model", self.d_model),
            ("n_heads", self.n_heads),
            ("n_layers", self.n_layers),
            ("d_ff", self.d_ff),
            ("num_classes", self.num_classes),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(Error::Config(format!("{} must be positive", name)));
        }
        if self.d_model % self.n_heads != 0 {
            return Err(Error::Config(format!(
                "d_model ({}) must be divisible by n_heads ({})",
                self.d_model, self.n_heads
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::Config(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// Get the dimension per attention head
    pub fn head_dim(&self) -> usize {
        self.d_model / self.n_heads
    }
}
