//! Transformer encoder
//!
//! Pre-norm encoder layers over the K channel positions: self-attention, then a
//! GELU expand/contract block, each added back onto its input.

use burn::{
    module::Module,
    nn::{Dropout, DropoutConfig, Gelu, LayerNorm, LayerNormConfig, Linear, LinearConfig},
    prelude::*,
};

use super::attention::MultiHeadAttention;
use super::config::ClassifierConfig;

/// Single pre-norm encoder layer
#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    attention: MultiHeadAttention<B>,
    attention_norm: LayerNorm<B>,
    /// d_model -> d_ff
    expand: Linear<B>,
    /// d_ff -> d_model
    contract: Linear<B>,
    activation: Gelu,
    mlp_norm: LayerNorm<B>,
    dropout: Dropout,
}

impl<B: Backend> EncoderLayer<B> {
    pub fn new(config: &ClassifierConfig, device: &B::Device) -> Self {
        Self {
            attention: MultiHeadAttention::new(device, config.d_model, config.n_heads, config.dropout),
            attention_norm: LayerNormConfig::new(config.d_model).init(device),
            expand: LinearConfig::new(config.d_model, config.d_ff).init(device),
            contract: LinearConfig::new(config.d_ff, config.d_model).init(device),
            activation: Gelu::new(),
            mlp_norm: LayerNormConfig::new(config.d_model).init(device),
            dropout: DropoutConfig::new(config.dropout).init(),
        }
    }

    /// `[N, K, D]` -> `[N, K, D]`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attended = self.attention.forward(self.attention_norm.forward(x.clone()));
        let x = x + self.dropout.forward(attended);

        let hidden = self.activation.forward(self.expand.forward(self.mlp_norm.forward(x.clone())));
        let mixed = self.contract.forward(self.dropout.forward(hidden));
        x + self.dropout.forward(mixed)
    }
}

/// Stack of encoder layers followed by a final layer norm
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    layers: Vec<EncoderLayer<B>>,
    final_norm: LayerNorm<B>,
}

impl<B: Backend> Encoder<B> {
    pub fn new(config: &ClassifierConfig, device: &B::Device) -> Self {
        Self {
            layers: (0..config.n_layers)
                .map(|_| EncoderLayer::new(config, device))
                .collect(),
            final_norm: LayerNormConfig::new(config.d_model).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.layers.iter().fold(x, |x, layer| layer.forward(x));
        self.final_norm.forward(x)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}
