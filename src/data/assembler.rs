//! Batch assembly
//!
//! Stacks K per-channel token sequences of length N into an `[N, K]` matrix.

use burn::prelude::*;
use burn::tensor::TensorData;
use ndarray::Array2;

use crate::error::{Error, Result};

/// Assembles channel sequences into a token matrix
#[derive(Debug, Clone, Copy)]
pub struct BatchAssembler {
    num_channels: usize,
}

impl BatchAssembler {
    pub fn new(num_channels: usize) -> Self {
        Self { num_channels }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Build the `[N, K]` token matrix, row i holding location i's K tokens
    pub fn assemble(&self, channels: &[Vec<usize>]) -> Result<Array2<usize>> {
        if channels.len() != self.num_channels {
            return Err(Error::ShapeMismatch(format!(
                "expected {} channels, got {}",
                self.num_channels,
                channels.len()
            )));
        }

        let n = channels.first().map(Vec::len).unwrap_or(0);
        if n == 0 {
            return Err(Error::ShapeMismatch("channels hold no locations".to_string()));
        }
        if let Some((k, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != n) {
            return Err(Error::ShapeMismatch(format!(
                "channel {} has {} tokens, channel 0 has {}",
                k,
                ch.len(),
                n
            )));
        }

        Ok(Array2::from_shape_fn((n, self.num_channels), |(i, k)| {
            channels[k][i]
        }))
    }
}

/// Convert a token matrix to an integer tensor of the same shape
pub fn to_int_tensor<B: Backend>(tokens: &Array2<usize>, device: &B::Device) -> Tensor<B, 2, Int> {
    let (n, k) = tokens.dim();
    let values: Vec<i64> = tokens.iter().map(|&t| t as i64).collect();
    Tensor::from_data(TensorData::new(values, [n, k]), device)
}
