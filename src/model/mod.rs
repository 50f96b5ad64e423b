//! Model module
//!
//! Transformer encoder classifier over location encoding tokens:
//! - `config`: hyperparameters
//! - `attention`: multi-head self-attention across channels
//! - `encoder`: pre-norm encoder layers
//! - `classifier`: embeddings, pooling and the classification head

mod attention;
mod classifier;
mod config;
mod encoder;

pub use attention::MultiHeadAttention;
pub use classifier::{argmax_classes, TrafficClassifier};
pub use config::ClassifierConfig;
pub use encoder::{Encoder, EncoderLayer};
