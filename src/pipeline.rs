//! End-to-end pipeline
//!
//! load -> encode -> tokenize -> assemble -> build classifier -> train -> predict

use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};
use tracing::info;

use crate::data::{LocationDataset, SampleSource, TokenVocabulary};
use crate::error::Result;
use crate::model::{ClassifierConfig, TrafficClassifier};
use crate::training::{evaluate, Evaluation, Trainer, TrainingHistory};
use crate::utils::Config;

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Location names, in batch row order
    pub names: Vec<String>,
    pub labels: Vec<usize>,
    pub vocabulary: TokenVocabulary,
    /// Model configuration after sizing to the data
    pub model_config: ClassifierConfig,
    pub history: TrainingHistory,
    /// Evaluation of the trained model on the training batch
    pub evaluation: Evaluation,
}

impl PipelineReport {
    pub fn predictions(&self) -> &[usize] {
        &self.evaluation.predictions
    }

    /// Every location predicted correctly
    pub fn is_fit(&self) -> bool {
        self.evaluation.predictions == self.labels
    }
}

/// Runs the whole encode-and-train flow from one configuration
#[derive(Debug, Clone)]
pub struct TrafficPipeline {
    config: Config,
}

impl TrafficPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run<B: AutodiffBackend>(
        &self,
        source: &dyn SampleSource,
        device: &B::Device,
    ) -> Result<PipelineReport> {
        let specs = self.config.encoding.specs()?;
        let mut trainer = Trainer::new(self.config.training.clone())?;

        info!("Loading locations from {}", source.describe());
        let dataset = LocationDataset::build(source.load()?, &specs)?;

        let mut vocabulary = TokenVocabulary::new();
        let batch = dataset.to_batch(&mut vocabulary, self.config.encoding.namespace_tokens)?;
        let (tokens, labels) = batch.to_tensors::<B>(device);

        let model_config = self
            .config
            .model
            .for_data(vocabulary.len(), dataset.num_channels());
        let model = TrafficClassifier::<B>::new(&model_config, device)?;

        let (model, history) = trainer.train(model, tokens.clone(), labels.clone())?;

        let model = model.valid();
        let evaluation = evaluate(&model, tokens.inner(), labels.inner())?;
        info!(
            "Final loss {:.4}, accuracy {:.2}, predictions {:?}",
            evaluation.loss, evaluation.accuracy, evaluation.predictions
        );

        Ok(PipelineReport {
            names: dataset.samples().iter().map(|s| s.name.clone()).collect(),
            labels: batch.labels,
            vocabulary,
            model_config,
            history,
            evaluation,
        })
    }
}
