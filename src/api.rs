//! High-level API for multiclass SVM training
//!
//! Wraps a linear SVM learner, a strategy chosen by [`StrategyConfig`], and
//! the multiclass machine behind a small builder.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rsvm_multiclass::api::MulticlassSVM;
//! use rsvm_multiclass::data::MulticlassDataset;
//! use rsvm_multiclass::strategy::StrategyConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![-1.0, -1.0]];
//! let data = MulticlassDataset::from_dense(&rows, &[0, 1, 2])?;
//!
//! let model = MulticlassSVM::new()
//!     .with_c(1.0)
//!     .with_strategy(StrategyConfig::OneVsOne)
//!     .train(&data)?;
//!
//! println!("Accuracy: {:.2}%", model.evaluate(&data)? * 100.0);
//! model.save("model.json")?;
//! # Ok(())
//! # }
//! ```

use crate::core::{Dataset, MulticlassError, Prediction, Result, SparseVector};
use crate::machine::{MulticlassMachine, TrainingConfig};
use crate::optimizer::{LinearModel, LinearSvm};
use crate::persistence::SerializableMachine;
use crate::solver::SvmLoss;
use crate::strategy::{Ecoc, Strategy, StrategyConfig};
use std::path::Path;

/// High-level multiclass SVM interface with builder pattern
#[derive(Debug, Clone, Default)]
pub struct MulticlassSVM {
    learner: LinearSvm,
    strategy: StrategyConfig,
    training: TrainingConfig,
}

impl MulticlassSVM {
    /// One-vs-Rest over a linear SVM with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.learner = self.learner.with_c(c);
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.learner = self.learner.with_epsilon(epsilon);
        self
    }

    /// Set maximum number of solver passes per sub-machine
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.learner = self.learner.with_max_iterations(max_iterations);
        self
    }

    pub fn with_loss(mut self, loss: SvmLoss) -> Self {
        self.learner = self.learner.with_loss(loss);
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    /// Fit sub-machines on a dedicated pool of this many threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.training.threads = Some(threads);
        self
    }

    /// Replace the binary learner wholesale
    pub fn with_learner(mut self, learner: LinearSvm) -> Self {
        self.learner = learner;
        self
    }

    fn validate(&self) -> Result<()> {
        let c = self.learner.config().c;
        if !(c > 0.0 && c.is_finite()) {
            return Err(MulticlassError::InvalidParameter(format!(
                "C must be positive, got: {c}"
            )));
        }
        if self.learner.config().epsilon < 0.0 {
            return Err(MulticlassError::InvalidParameter(
                "epsilon must not be negative".to_string(),
            ));
        }
        if self.training.threads == Some(0) {
            return Err(MulticlassError::InvalidParameter(
                "thread count must be positive".to_string(),
            ));
        }
        self.strategy.validate()
    }

    /// Train on a dataset
    pub fn train<D: Dataset + ?Sized>(self, dataset: &D) -> Result<TrainedModel> {
        self.validate()?;
        let strategy = self.strategy.build()?;
        let mut machine =
            MulticlassMachine::new(self.learner, strategy).with_config(self.training);
        machine.train(dataset)?;
        Ok(TrainedModel { machine })
    }
}

/// Trained multiclass model with high-level prediction interface
pub struct TrainedModel<S: Strategy = Box<dyn Strategy>> {
    machine: MulticlassMachine<LinearSvm, S>,
}

impl TrainedModel<Ecoc> {
    /// Load a model written by [`TrainedModel::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let saved: SerializableMachine<LinearSvm, LinearModel> =
            SerializableMachine::load_from_file(path)?;
        Ok(Self {
            machine: saved.into_machine()?,
        })
    }
}

impl<S: Strategy> TrainedModel<S> {
    /// Predict the class of a single sample
    pub fn predict(&self, features: &SparseVector) -> Result<usize> {
        self.machine.predict(features)
    }

    /// Predict with sub-machine outputs and per-class costs
    pub fn predict_detailed(&self, features: &SparseVector) -> Result<Prediction> {
        self.machine.predict_detailed(features)
    }

    /// Predict multiple samples
    pub fn predict_batch(&self, samples: &[SparseVector]) -> Result<Vec<usize>> {
        self.machine.predict_batch(samples)
    }

    /// Predict from dataset
    pub fn predict_dataset<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<Vec<usize>> {
        self.machine.predict_dataset(dataset)
    }

    /// Evaluate accuracy on a dataset
    pub fn evaluate<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<f64> {
        Ok(self.evaluate_detailed(dataset)?.accuracy())
    }

    /// Confusion matrix and per-class metrics on a dataset
    pub fn evaluate_detailed<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<EvaluationMetrics> {
        let predictions = self.predict_dataset(dataset)?;
        let labels = dataset.labels();
        let n_classes = labels
            .iter()
            .chain(&predictions)
            .map(|&c| c + 1)
            .max()
            .unwrap_or(0)
            .max(self.machine.n_classes().unwrap_or(0));
        Ok(EvaluationMetrics::from_predictions(
            n_classes,
            &labels,
            &predictions,
        ))
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        let matrix = self.machine.coding_matrix();
        ModelInfo {
            strategy: self.machine.strategy().name().to_string(),
            n_classes: matrix.map_or(0, |m| m.n_classes()),
            n_submachines: self.machine.submachines().len(),
            min_column_distance: matrix.map_or(0.0, |m| m.min_column_distance()),
            training_sizes: self
                .machine
                .submachines()
                .iter()
                .map(|s| s.n_samples())
                .collect(),
        }
    }

    /// Save the model as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        SerializableMachine::from_machine(&self.machine)?.save_to_file(path)
    }

    /// Get the underlying multiclass machine
    pub fn inner(&self) -> &MulticlassMachine<LinearSvm, S> {
        &self.machine
    }
}

/// Multiclass evaluation metrics built from a confusion matrix
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// `confusion[actual][predicted]`
    pub confusion: Vec<Vec<usize>>,
}

impl EvaluationMetrics {
    pub fn from_predictions(n_classes: usize, labels: &[usize], predictions: &[usize]) -> Self {
        let mut confusion = vec![vec![0; n_classes]; n_classes];
        for (&actual, &predicted) in labels.iter().zip(predictions) {
            confusion[actual][predicted] += 1;
        }
        Self { confusion }
    }

    pub fn n_classes(&self) -> usize {
        self.confusion.len()
    }

    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes()).map(|c| self.confusion[c][c]).sum();
        correct as f64 / total as f64
    }

    /// TP / (TP + FP) for `class`
    pub fn precision(&self, class: usize) -> f64 {
        let predicted: usize = self.confusion.iter().map(|row| row[class]).sum();
        ratio(self.confusion[class][class], predicted)
    }

    /// TP / (TP + FN) for `class`
    pub fn recall(&self, class: usize) -> f64 {
        let actual: usize = self.confusion[class].iter().sum();
        ratio(self.confusion[class][class], actual)
    }

    pub fn f1_score(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Unweighted mean of the per-class F1 scores
    pub fn macro_f1(&self) -> f64 {
        if self.n_classes() == 0 {
            return 0.0;
        }
        (0..self.n_classes()).map(|c| self.f1_score(c)).sum::<f64>() / self.n_classes() as f64
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub strategy: String,
    pub n_classes: usize,
    pub n_submachines: usize,
    /// Smallest generalized Hamming distance between class codewords
    pub min_column_distance: f64,
    /// Samples seen by each sub-machine, by row
    pub training_sizes: Vec<usize>,
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;
    use crate::core::Sample;
    use crate::data::MulticlassDataset;

    /// One-vs-Rest with default parameters
    pub fn train_one_vs_rest<D: Dataset + ?Sized>(dataset: &D) -> Result<TrainedModel> {
        MulticlassSVM::new().train(dataset)
    }

    /// One-vs-One with majority voting
    pub fn train_one_vs_one<D: Dataset + ?Sized>(dataset: &D) -> Result<TrainedModel> {
        MulticlassSVM::new()
            .with_strategy(StrategyConfig::OneVsOne)
            .train(dataset)
    }

    /// Hold-out validation: train on the first `train_ratio` of the samples
    pub fn simple_validation<D: Dataset + ?Sized>(
        dataset: &D,
        train_ratio: f64,
        strategy: StrategyConfig,
    ) -> Result<f64> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            return Err(MulticlassError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }

        let n = dataset.len();
        let train_size = (n as f64 * train_ratio) as usize;
        if train_size == 0 || train_size == n {
            return Err(MulticlassError::InvalidParameter(format!(
                "Train ratio {train_ratio} leaves an empty split of {n} samples"
            )));
        }

        // Sequential split keeps results reproducible
        let train = MulticlassDataset::new(
            (0..train_size)
                .map(|i| Sample::new(dataset.features(i).clone(), dataset.label(i)))
                .collect(),
        )?;
        let model = MulticlassSVM::new().with_strategy(strategy).train(&train)?;

        let correct = (train_size..n)
            .filter(|&i| {
                model
                    .predict(dataset.features(i))
                    .is_ok_and(|class| class == dataset.label(i))
            })
            .count();

        Ok(correct as f64 / (n - train_size) as f64)
    }
}
