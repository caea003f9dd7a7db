//! Multiclass machine: trains one binary learner per coding row and decodes
//! their combined output.
//!
//! Rows are independent, so their learners are fitted in parallel with
//! rayon. They share read-only borrows of the dataset, labels and coding
//! matrix, and the sub-machine vector is assembled only after every row has
//! finished.

use crate::coding::CodingMatrix;
use crate::core::{
    BinaryClassifier, BinaryModel, Dataset, MulticlassError, Prediction, Result, SparseVector,
};
use crate::strategy::{Partition, Strategy};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a [`MulticlassMachine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Uninitialized,
    Training,
    Trained,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::Uninitialized => "uninitialized",
            MachineState::Training => "training",
            MachineState::Trained => "trained",
        };
        f.write_str(name)
    }
}

/// Trained binary model bound to one coding row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submachine<M> {
    /// Coding matrix row this model answers for
    pub row: usize,
    /// Samples colored +1 during training
    pub n_positive: usize,
    /// Samples colored -1 during training
    pub n_negative: usize,
    /// The trained model
    pub model: M,
}

impl<M> Submachine<M> {
    /// Number of samples the model was trained on
    pub fn n_samples(&self) -> usize {
        self.n_positive + self.n_negative
    }
}

/// Training options that do not affect the learned model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Worker threads for row fitting; `None` uses rayon's global pool
    pub threads: Option<usize>,
}

/// One-shot multiclass machine over a binary learner `C` and strategy `S`
pub struct MulticlassMachine<C: BinaryClassifier, S: Strategy> {
    classifier: C,
    strategy: S,
    config: TrainingConfig,
    state: MachineState,
    matrix: Option<CodingMatrix>,
    submachines: Vec<Submachine<C::Model>>,
}

impl<C: BinaryClassifier, S: Strategy> MulticlassMachine<C, S> {
    /// Create an untrained machine
    pub fn new(classifier: C, strategy: S) -> Self {
        Self {
            classifier,
            strategy,
            config: TrainingConfig::default(),
            state: MachineState::Uninitialized,
            matrix: None,
            submachines: Vec::new(),
        }
    }

    /// Fit rows on a dedicated pool of `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads);
        self
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Reassemble a trained machine from saved parts
    pub(crate) fn from_trained_parts(
        classifier: C,
        strategy: S,
        matrix: CodingMatrix,
        submachines: Vec<Submachine<C::Model>>,
    ) -> Result<Self> {
        if submachines.len() != matrix.n_rows() {
            return Err(MulticlassError::InvalidParameter(format!(
                "{} sub-machines for a coding matrix with {} rows",
                submachines.len(),
                matrix.n_rows()
            )));
        }
        if let Some((position, misplaced)) =
            submachines.iter().enumerate().find(|(r, s)| s.row != *r)
        {
            return Err(MulticlassError::InvalidParameter(format!(
                "sub-machine at position {position} is bound to row {}",
                misplaced.row
            )));
        }

        Ok(Self {
            classifier,
            strategy,
            config: TrainingConfig::default(),
            state: MachineState::Trained,
            matrix: Some(matrix),
            submachines,
        })
    }

    /// Train one sub-machine per coding row.
    ///
    /// Either every row trains and the machine becomes `Trained`, or the
    /// machine is left `Uninitialized` with nothing usable inside.
    pub fn train<D: Dataset + ?Sized>(&mut self, dataset: &D) -> Result<()> {
        if self.state != MachineState::Uninitialized {
            return Err(MulticlassError::InvalidState {
                operation: "train",
                state: self.state,
            });
        }

        self.state = MachineState::Training;
        match self.fit(dataset) {
            Ok((matrix, submachines)) => {
                self.matrix = Some(matrix);
                self.submachines = submachines;
                self.state = MachineState::Trained;
                Ok(())
            }
            Err(e) => {
                self.state = MachineState::Uninitialized;
                Err(e)
            }
        }
    }

    fn fit<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
    ) -> Result<(CodingMatrix, Vec<Submachine<C::Model>>)> {
        if dataset.is_empty() {
            return Err(MulticlassError::EmptyDataset);
        }

        let labels = dataset.labels();
        let n_classes = crate::data::class_count(&labels)?;
        let matrix = self.strategy.coding_matrix(n_classes)?;
        if matrix.n_classes() != n_classes {
            return Err(MulticlassError::Configuration(format!(
                "strategy produced {} class columns for {} classes",
                matrix.n_classes(),
                n_classes
            )));
        }

        info!(
            "Training {} sub-machines ({} strategy, {} classes, {} samples)",
            matrix.n_rows(),
            self.strategy.name(),
            n_classes,
            dataset.len()
        );

        let partitions: Vec<Partition> = (0..matrix.n_rows())
            .map(|row| self.strategy.partition(&matrix, row, &labels))
            .collect();
        for (row, partition) in partitions.iter().enumerate() {
            check_partition(row, partition)?;
        }

        let results = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        MulticlassError::Configuration(format!("cannot build thread pool: {e}"))
                    })?;
                pool.install(|| self.fit_rows(dataset, &partitions))
            }
            None => self.fit_rows(dataset, &partitions),
        };

        // Collecting in row order surfaces the lowest failing row.
        let submachines = results.into_iter().collect::<Result<Vec<_>>>()?;

        info!("Training completed: {} sub-machines", submachines.len());
        Ok((matrix, submachines))
    }

    fn fit_rows<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        partitions: &[Partition],
    ) -> Vec<Result<Submachine<C::Model>>> {
        partitions
            .par_iter()
            .enumerate()
            .map(|(row, partition)| {
                let features: Vec<&SparseVector> = partition
                    .indices
                    .iter()
                    .map(|&i| dataset.features(i))
                    .collect();

                let model = self
                    .classifier
                    .fit(&features, &partition.targets)
                    .map_err(|source| MulticlassError::SubmachineTraining { row, source })?;

                debug!(
                    "row {}: trained on {} samples ({} positive)",
                    row,
                    partition.len(),
                    partition.n_positive()
                );

                Ok(Submachine {
                    row,
                    n_positive: partition.n_positive(),
                    n_negative: partition.n_negative(),
                    model,
                })
            })
            .collect()
    }

    fn trained(&self, operation: &'static str) -> Result<&CodingMatrix> {
        match (&self.matrix, self.state) {
            (Some(matrix), MachineState::Trained) => Ok(matrix),
            _ => Err(MulticlassError::InvalidState {
                operation,
                state: self.state,
            }),
        }
    }

    /// Scores of every sub-machine for one sample
    pub fn outputs(&self, features: &SparseVector) -> Result<Vec<f64>> {
        self.trained("predict")?;
        Ok(self.scores(features))
    }

    fn scores(&self, features: &SparseVector) -> Vec<f64> {
        self.submachines
            .iter()
            .map(|s| s.model.score(features))
            .collect()
    }

    /// Predict the class of one sample
    pub fn predict(&self, features: &SparseVector) -> Result<usize> {
        let matrix = self.trained("predict")?;
        Ok(self.strategy.decode(&self.scores(features), matrix))
    }

    /// Predict with the prediction vector and per-class costs attached
    pub fn predict_detailed(&self, features: &SparseVector) -> Result<Prediction> {
        let matrix = self.trained("predict")?;
        let outputs = self.scores(features);
        let costs = self.strategy.decoder().costs(&outputs, matrix);
        let class = self.strategy.decode(&outputs, matrix);
        Ok(Prediction::new(class, outputs, costs))
    }

    /// Predict many samples in parallel; output order follows input order
    pub fn predict_batch(&self, samples: &[SparseVector]) -> Result<Vec<usize>> {
        let matrix = self.trained("predict")?;
        Ok(samples
            .par_iter()
            .map(|x| self.strategy.decode(&self.scores(x), matrix))
            .collect())
    }

    /// Predict every sample of a dataset
    pub fn predict_dataset<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<Vec<usize>> {
        let matrix = self.trained("predict")?;
        Ok((0..dataset.len())
            .into_par_iter()
            .map(|i| self.strategy.decode(&self.scores(dataset.features(i)), matrix))
            .collect())
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn is_trained(&self) -> bool {
        self.state == MachineState::Trained
    }

    /// Coding matrix, available once trained
    pub fn coding_matrix(&self) -> Option<&CodingMatrix> {
        self.matrix.as_ref()
    }

    /// Number of classes, available once trained
    pub fn n_classes(&self) -> Option<usize> {
        self.matrix.as_ref().map(CodingMatrix::n_classes)
    }

    /// Trained sub-machines indexed by row
    pub fn submachines(&self) -> &[Submachine<C::Model>] {
        &self.submachines
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

fn check_partition(row: usize, partition: &Partition) -> Result<()> {
    let reason = if partition.is_empty() {
        "no samples selected"
    } else if partition.n_positive() == 0 {
        "no positive samples"
    } else if partition.n_negative() == 0 {
        "no negative samples"
    } else {
        return Ok(());
    };

    Err(MulticlassError::DegenerateSubproblem {
        row,
        reason: reason.to_string(),
    })
}
