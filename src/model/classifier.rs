//! Location sequence classifier
//!
//! Treats the K encodings of one location as a length-K token sequence:
//!
//! ```text
//! tokens [N, K] -> token + channel embedding [N, K, D]
//!               -> encoder [N, K, D]
//!               -> mean over K [N, D]
//!               -> linear head [N, C]
//! ```

use std::sync::{Mutex, PoisonError};

use burn::{
    module::Module,
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::ElementConversion,
};
use tracing::debug;

use super::config::ClassifierConfig;
use super::encoder::Encoder;
use crate::error::{Error, Result};

static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Transformer encoder classifier over encoding-channel tokens
#[derive(Module, Debug)]
pub struct TrafficClassifier<B: Backend> {
    /// Token index -> d_model
    token_embedding: Embedding<B>,
    /// Learned per-channel embedding, so the model knows which scheme a token came from
    channel_embedding: Embedding<B>,
    encoder: Encoder<B>,
    /// Pooled representation -> class logits
    head: Linear<B>,
    vocab_size: usize,
    num_channels: usize,
    num_classes: usize,
}

impl<B: Backend> TrafficClassifier<B> {
    /// Create a new classifier from configuration
    ///
    /// `config.seed` seeds the backend's process-global RNG right before the
    /// weights are drawn. Construction holds a process-wide lock, so models built
    /// from the same config on concurrent threads get the same weights. Code that
    /// draws from the backend RNG outside this constructor (e.g. `Tensor::random`)
    /// at the same time can still shift them.
    pub fn new(config: &ClassifierConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;

        let model = {
            let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            B::seed(config.seed);
            Self {
                token_embedding: EmbeddingConfig::new(config.vocab_size, config.d_model).init(device),
                channel_embedding: EmbeddingConfig::new(config.num_channels, config.d_model)
                    .init(device),
                encoder: Encoder::new(config, device),
                head: LinearConfig::new(config.d_model, config.num_classes).init(device),
                vocab_size: config.vocab_size,
                num_channels: config.num_channels,
                num_classes: config.num_classes,
            }
        };
        debug!(
            "Built classifier: vocab={}, channels={}, parameters={}",
            config.vocab_size,
            config.num_channels,
            model.num_parameters()
        );
        Ok(model)
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `tokens` - Token indices of shape [N, K]
    ///
    /// # Returns
    /// * Logits of shape [N, num_classes]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Result<Tensor<B, 2>> {
        let [n, k] = tokens.dims();
        if n == 0 || k != self.num_channels {
            return Err(Error::InvalidInputShape {
                expected: vec![n.max(1), self.num_channels],
                actual: vec![n, k],
            });
        }
        self.check_token_range(&tokens)?;

        let device = tokens.device();
        let x = self.token_embedding.forward(tokens);
        let [_, _, d_model] = x.dims();

        let channels = Tensor::<B, 1, Int>::arange(0..k as i64, &device).reshape([1, k]);
        let channels = self.channel_embedding.forward(channels).expand([n, k, d_model]);

        let x = self.encoder.forward(x + channels);
        let pooled = x.mean_dim(1).reshape([n, d_model]);

        Ok(self.head.forward(pooled))
    }

    /// Most likely class per row
    pub fn predict(&self, tokens: Tensor<B, 2, Int>) -> Result<Vec<usize>> {
        let logits = self.forward(tokens)?;
        argmax_classes(logits)
    }

    /// Total number of trainable scalars
    pub fn num_parameters(&self) -> usize {
        self.num_params()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn check_token_range(&self, tokens: &Tensor<B, 2, Int>) -> Result<()> {
        let max = tokens.clone().max().into_scalar().elem::<i64>();
        let min = tokens.clone().min().into_scalar().elem::<i64>();
        if min < 0 {
            return Err(Error::TensorData(format!("negative token index {}", min)));
        }
        if max as usize >= self.vocab_size {
            return Err(Error::UnknownToken(max as usize));
        }
        Ok(())
    }
}

/// Row-wise argmax of `[N, C]` logits
pub fn argmax_classes<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<usize>> {
    logits
        .argmax(1)
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map(|v| v.into_iter().map(|c| c as usize).collect())
        .map_err(|e| Error::TensorData(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn config() -> ClassifierConfig {
        ClassifierConfig::default().for_data(20, 4)
    }

    fn tokens(values: Vec<i64>, n: usize, k: usize) -> Tensor<TestBackend, 2, Int> {
        Tensor::from_data(TensorData::new(values, [n, k]), &Default::default())
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = TrafficClassifier::<TestBackend>::new(&config(), &device).unwrap();

        let logits = model.forward(tokens((0..20).collect(), 5, 4)).unwrap();
        assert_eq!(logits.dims(), [5, 3]);
    }

    #[test]
    fn test_identical_rows_identical_logits() {
        let device = Default::default();
        let model = TrafficClassifier::<TestBackend>::new(&config(), &device).unwrap();

        let logits = model
            .forward(tokens(vec![1, 5, 9, 13, 1, 5, 9, 13], 2, 4))
            .unwrap();
        let first = logits.clone().slice([0..1, 0..3]);
        let second = logits.slice([1..2, 0..3]);

        first.into_data().assert_approx_eq(&second.into_data(), 5);
    }

    #[test]
    fn test_wrong_channel_count() {
        let device = Default::default();
        let model = TrafficClassifier::<TestBackend>::new(&config(), &device).unwrap();

        let result = model.forward(tokens(vec![0, 1, 2], 1, 3));
        assert!(matches!(result, Err(Error::InvalidInputShape { .. })));
    }

    #[test]
    fn test_out_of_vocabulary_token() {
        let device = Default::default();
        let model = TrafficClassifier::<TestBackend>::new(&config(), &device).unwrap();

        let result = model.forward(tokens(vec![0, 1, 2, 20], 1, 4));
        assert!(matches!(result, Err(Error::UnknownToken(20))));
    }

    #[test]
    fn test_predict_in_class_range() {
        let device = Default::default();
        let model = TrafficClassifier::<TestBackend>::new(&config(), &device).unwrap();

        let predictions = model.predict(tokens((0..20).collect(), 5, 4)).unwrap();
        assert_eq!(predictions.len(), 5);
        assert!(predictions.iter().all(|&p| p < 3));
    }

    #[test]
    fn test_invalid_config() {
        let device = Default::default();
        let bad = ClassifierConfig::default();
        assert!(TrafficClassifier::<TestBackend>::new(&bad, &device).is_err());
    }

    #[test]
    fn test_num_parameters() {
        let device = Default::default();
        let model = TrafficClassifier::<TestBackend>::new(&config(), &device).unwrap();

        // embeddings 20*32 + 4*32, head 32*3 + 3, encoder weights on top
        assert!(model.num_parameters() > 20 * 32 + 4 * 32 + 32 * 3 + 3);
    }
}
