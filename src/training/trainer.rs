//! Full-batch training loop
//!
//! One epoch is one pass over the whole token batch:
//! forward, cross-entropy loss, backward, Adam update.

use burn::{
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation::log_softmax, backend::AutodiffBackend, ElementConversion},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{argmax_classes, TrafficClassifier};

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Log progress every this many epochs
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            learning_rate: 0.01,
            log_every: 1,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be positive".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Where the trainer is within an epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    Initialized,
    Forward,
    Loss,
    Backward,
    Update,
    Trained,
}

/// Per-epoch loss and accuracy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub losses: Vec<f32>,
    pub accuracies: Vec<f32>,
}

impl TrainingHistory {
    pub fn epochs(&self) -> usize {
        self.losses.len()
    }

    pub fn initial_loss(&self) -> Option<f32> {
        self.losses.first().copied()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.losses.last().copied()
    }

    pub fn final_accuracy(&self) -> Option<f32> {
        self.accuracies.last().copied()
    }

    /// Last loss is below the first
    pub fn is_improving(&self) -> bool {
        match (self.initial_loss(), self.final_loss()) {
            (Some(first), Some(last)) => self.losses.len() > 1 && last < first,
            _ => false,
        }
    }
}

/// Loss, accuracy and predictions on a labeled batch
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
    pub predictions: Vec<usize>,
}

/// Drives the model through `epochs` full-batch updates
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    phase: TrainingPhase,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: TrainingPhase::Initialized,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    /// Train on the whole batch and return the updated model
    pub fn train<B: AutodiffBackend>(
        &mut self,
        model: TrafficClassifier<B>,
        tokens: Tensor<B, 2, Int>,
        labels: Tensor<B, 1, Int>,
    ) -> Result<(TrafficClassifier<B>, TrainingHistory)> {
        self.phase = TrainingPhase::Initialized;
        check_labels(&model, &tokens, &labels)?;

        let [n, k] = tokens.dims();
        info!(
            "Starting training for {} epochs on {} samples x {} channels ({} parameters)",
            self.config.epochs,
            n,
            k,
            model.num_parameters()
        );

        let mut model = model;
        let mut optimizer = AdamConfig::new().init::<B, TrafficClassifier<B>>();
        let mut history = TrainingHistory::default();

        for epoch in 0..self.config.epochs {
            self.enter(TrainingPhase::Forward, epoch);
            let logits = model.forward(tokens.clone())?;

            self.enter(TrainingPhase::Loss, epoch);
            let loss = cross_entropy(logits.clone(), labels.clone());
            let loss_value = ensure_finite(epoch, loss.clone().into_scalar().elem::<f32>())?;
            let accuracy = accuracy(logits, labels.clone());

            self.enter(TrainingPhase::Backward, epoch);
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);

            self.enter(TrainingPhase::Update, epoch);
            model = optimizer.step(self.config.learning_rate, model, grads);

            history.losses.push(loss_value);
            history.accuracies.push(accuracy);

            if self.config.log_every > 0 && (epoch + 1) % self.config.log_every == 0 {
                info!(
                    "Epoch {}/{}: loss={:.4}, acc={:.4}",
                    epoch + 1,
                    self.config.epochs,
                    loss_value,
                    accuracy
                );
            }
        }

        self.phase = TrainingPhase::Trained;
        info!(
            "Training completed. Loss {:.4} -> {:.4}",
            history.initial_loss().unwrap_or(f32::NAN),
            history.final_loss().unwrap_or(f32::NAN)
        );

        Ok((model, history))
    }

    fn enter(&mut self, phase: TrainingPhase, epoch: usize) {
        self.phase = phase;
        debug!("Epoch {}: {:?}", epoch, phase);
    }
}

/// Loss, accuracy and predictions without updating the model
pub fn evaluate<B: Backend>(
    model: &TrafficClassifier<B>,
    tokens: Tensor<B, 2, Int>,
    labels: Tensor<B, 1, Int>,
) -> Result<Evaluation> {
    check_labels(model, &tokens, &labels)?;

    let logits = model.forward(tokens)?;
    let loss = cross_entropy(logits.clone(), labels.clone())
        .into_scalar()
        .elem::<f32>();
    let accuracy = accuracy(logits.clone(), labels);
    let predictions = argmax_classes(logits)?;

    Ok(Evaluation {
        loss,
        accuracy,
        predictions,
    })
}

fn ensure_finite(epoch: usize, loss: f32) -> Result<f32> {
    if loss.is_finite() {
        return Ok(loss);
    }
    warn!("Loss diverged at epoch {}: {}", epoch, loss);
    Err(Error::NumericalDivergence { epoch, loss })
}

/// Mean negative log-likelihood of the true classes
fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    let selected = log_probs.gather(1, labels.unsqueeze_dim(1)).squeeze::<1>(1);
    selected.neg().mean()
}

fn accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f32 {
    let n = labels.dims()[0];
    let correct = logits
        .argmax(1)
        .squeeze::<1>(1)
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as f32 / n as f32
}

fn check_labels<B: Backend>(
    model: &TrafficClassifier<B>,
    tokens: &Tensor<B, 2, Int>,
    labels: &Tensor<B, 1, Int>,
) -> Result<()> {
    let [n, _] = tokens.dims();
    let [m] = labels.dims();
    if n != m {
        return Err(Error::ShapeMismatch(format!(
            "{} token rows but {} labels",
            n, m
        )));
    }
    if m == 0 {
        return Err(Error::EmptyInput("no labels".to_string()));
    }
    let max = labels.clone().max().into_scalar().elem::<i64>();
    let min = labels.clone().min().into_scalar().elem::<i64>();
    if min < 0 || max as usize >= model.num_classes() {
        return Err(Error::Config(format!(
            "labels must be in 0..{}, got {}..={}",
            model.num_classes(),
            min,
            max
        )));
    }
    Ok(())
}
