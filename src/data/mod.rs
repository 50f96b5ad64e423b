//! Data module
//!
//! This module provides:
//! - Labeled location sources (built-in demo cities, CSV files)
//! - The shared token vocabulary
//! - Batch assembly into `[N, K]` token matrices

mod assembler;
mod dataset;
mod sample;
mod vocabulary;

pub use assembler::{to_int_tensor, BatchAssembler};
pub use dataset::{LocationDataset, TokenBatch};
pub use sample::{CsvSource, DemoSource, LabeledLocation, LocationSample, SampleSource, TrafficLabel};
pub use vocabulary::{tokenize, TokenVocabulary};
