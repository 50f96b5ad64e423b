//! Multi-head self-attention across encoding channels
//!
//! Every channel attends to every other channel of the same location; the
//! sequence is short (one token per scheme), so attention is dense.

use burn::{
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

/// Dense multi-head self-attention
#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    /// Query projection
    query: Linear<B>,
    /// Key projection
    key: Linear<B>,
    /// Value projection
    value: Linear<B>,
    /// Output projection
    output: Linear<B>,
    dropout: Dropout,
    n_heads: usize,
    head_dim: usize,
}

impl<B: Backend> MultiHeadAttention<B> {
    pub fn new(device: &B::Device, d_model: usize, n_heads: usize, dropout: f64) -> Self {
        Self {
            query: LinearConfig::new(d_model, d_model).init(device),
            key: LinearConfig::new(d_model, d_model).init(device),
            value: LinearConfig::new(d_model, d_model).init(device),
            output: LinearConfig::new(d_model, d_model).init(device),
            dropout: DropoutConfig::new(dropout).init(),
            n_heads,
            head_dim: d_model / n_heads,
        }
    }

    /// `[batch, channels, d_model] -> [batch, channels, d_model]`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, _d_model] = x.dims();

        let q = self.split_heads(self.query.forward(x.clone()), batch_size, seq_len);
        let k = self.split_heads(self.key.forward(x.clone()), batch_size, seq_len);
        let v = self.split_heads(self.value.forward(x), batch_size, seq_len);

        // Q @ K^T / sqrt(head_dim)
        let scale = (self.head_dim as f32).sqrt();
        let scores = q.matmul(k.swap_dims(2, 3)) / scale;

        let weights = softmax(scores, 3);
        let weights = self.dropout.forward(weights);

        let context = weights
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, self.n_heads * self.head_dim]);

        self.output.forward(context)
    }

    // [batch, seq, d_model] -> [batch, heads, seq, head_dim]
    fn split_heads(&self, x: Tensor<B, 3>, batch_size: usize, seq_len: usize) -> Tensor<B, 4> {
        x.reshape([batch_size, seq_len, self.n_heads, self.head_dim])
            .swap_dims(1, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_attention_shape() {
        let device = Default::default();
        let attention = MultiHeadAttention::<TestBackend>::new(&device, 32, 4, 0.0);

        let x = Tensor::random([5, 4, 32], Distribution::Normal(0.0, 1.0), &device);
        let output = attention.forward(x);

        assert_eq!(output.dims(), [5, 4, 32]);
    }

    #[test]
    fn test_rows_are_independent() {
        let device = Default::default();
        let attention = MultiHeadAttention::<TestBackend>::new(&device, 16, 2, 0.0);

        let row = Tensor::<TestBackend, 3>::random([1, 3, 16], Distribution::Normal(0.0, 1.0), &device);
        let other = Tensor::<TestBackend, 3>::random([1, 3, 16], Distribution::Normal(0.0, 1.0), &device);
        let batch = Tensor::cat(vec![row.clone(), other], 0);

        let alone = attention.forward(row);
        let together = attention.forward(batch).slice([0..1, 0..3, 0..16]);

        alone
            .into_data()
            .assert_approx_eq(&together.into_data(), 4);
    }
}
