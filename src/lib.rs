//! # Location Encodings for a Transformer Traffic Classifier
//!
//! Encodes latitude/longitude with several geospatial schemes, maps the codes
//! into one token space and trains a small Transformer encoder to classify
//! traffic density per location.
//!
//! ## Modules
//!
//! - `encoding`: Geohash, H3, Plus Codes, UTM and EPSG reprojection
//! - `data`: labeled locations, the token vocabulary and batch assembly
//! - `model`: Transformer encoder classifier (burn)
//! - `training`: full-batch training loop and evaluation
//! - `pipeline`: end-to-end encode-and-train flow
//! - `utils`: configuration and logging
//!
//! ## Example
//!
//! ```no_run
//! use burn::backend::{Autodiff, NdArray};
//! use geo_encoding_transformer::{Config, DemoSource, TrafficPipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let device = Default::default();
//!     let report = TrafficPipeline::new(Config::default())
//!         .run::<Autodiff<NdArray>>(&DemoSource, &device)?;
//!
//!     println!("predictions: {:?}", report.predictions());
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod encoding;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod training;
pub mod utils;

// Re-export main types for convenience
pub use data::{
    tokenize, BatchAssembler, CsvSource, DemoSource, LabeledLocation, LocationDataset, SampleSource,
    TokenBatch, TokenVocabulary, TrafficLabel,
};
pub use encoding::{
    decode, encode, encode_all, transform, Coordinate, Crs, DecodedLocation, EncodedLocation,
    EncodingScheme, LocationCode, SchemeSpec,
};
pub use error::{Error, Result};
pub use model::{ClassifierConfig, TrafficClassifier};
pub use pipeline::{PipelineReport, TrafficPipeline};
pub use training::{evaluate, Evaluation, Trainer, TrainingConfig, TrainingHistory, TrainingPhase};
pub use utils::{setup_logging, Config};
