//! Encoded location dataset
//!
//! Encodes every location under every configured channel once, then turns the
//! dataset into an `[N, K]` token batch through a shared vocabulary.

use burn::prelude::*;
use burn::tensor::TensorData;
use ndarray::Array2;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};

use super::assembler::{to_int_tensor, BatchAssembler};
use super::sample::{LabeledLocation, LocationSample};
use super::vocabulary::TokenVocabulary;
use crate::encoding::{encode_all, SchemeSpec};
use crate::error::{Error, Result};

/// Locations encoded under a fixed list of channels
#[derive(Debug, Clone)]
pub struct LocationDataset {
    specs: Vec<SchemeSpec>,
    samples: Vec<LocationSample>,
}

/// Token matrix and labels ready for the model
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBatch {
    /// `[N, K]` token indices
    pub tokens: Array2<usize>,
    /// Class index per row
    pub labels: Vec<usize>,
}

impl LocationDataset {
    /// Encode `locations` under each spec, in channel order
    pub fn build(locations: Vec<LabeledLocation>, specs: &[SchemeSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::EmptyInput("no encoding channels configured".to_string()));
        }
        if locations.is_empty() {
            return Err(Error::EmptyInput("no locations to encode".to_string()));
        }

        let samples = locations
            .into_iter()
            .map(|location| {
                let encodings = encode_all(&location.coordinate, specs)?;
                debug!(
                    "{}: {}",
                    location.name,
                    encodings
                        .iter()
                        .map(|e| e.namespaced_token())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                Ok(LocationSample {
                    name: location.name,
                    coordinate: location.coordinate,
                    encodings,
                    label: location.label,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Encoded {} locations under {} channels",
            samples.len(),
            specs.len()
        );
        Ok(Self {
            specs: specs.to_vec(),
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_channels(&self) -> usize {
        self.specs.len()
    }

    pub fn specs(&self) -> &[SchemeSpec] {
        &self.specs
    }

    pub fn samples(&self) -> &[LocationSample] {
        &self.samples
    }

    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.label.index()).collect()
    }

    /// Reorder samples with a seeded shuffle
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.samples.shuffle(&mut rng);
    }

    /// Per-channel code strings, channel-major
    pub fn channel_codes(&self, namespace_tokens: bool) -> Vec<Vec<String>> {
        (0..self.num_channels())
            .map(|k| {
                self.samples
                    .iter()
                    .map(|s| {
                        if namespace_tokens {
                            s.encodings[k].namespaced_token()
                        } else {
                            s.encodings[k].token()
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Tokenize every channel through `vocab` and assemble `[N, K]`
    pub fn to_batch(&self, vocab: &mut TokenVocabulary, namespace_tokens: bool) -> Result<TokenBatch> {
        let channels = self
            .channel_codes(namespace_tokens)
            .iter()
            .map(|codes| vocab.tokenize(codes))
            .collect::<Result<Vec<_>>>()?;

        let tokens = BatchAssembler::new(self.num_channels()).assemble(&channels)?;
        info!(
            "Assembled token batch {:?}, vocabulary size {}",
            tokens.dim(),
            vocab.len()
        );
        Ok(TokenBatch {
            tokens,
            labels: self.labels(),
        })
    }
}

impl TokenBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Token tensor `[N, K]` and label tensor `[N]`
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> (Tensor<B, 2, Int>, Tensor<B, 1, Int>) {
        let tokens = to_int_tensor::<B>(&self.tokens, device);
        let labels: Vec<i64> = self.labels.iter().map(|&l| l as i64).collect();
        let labels = Tensor::from_data(TensorData::new(labels, [self.labels.len()]), device);
        (tokens, labels)
    }
}
