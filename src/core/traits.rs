//! Core traits: the dataset provider and the binary learner seam

use crate::core::{BinaryTrainingError, Result, SparseVector};
use crate::data::class_count;

/// Dataset abstraction: indexable (features, label) pairs
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Feature vector of sample `i`
    ///
    /// # Panics
    /// Panics if i >= len()
    fn features(&self, i: usize) -> &SparseVector;

    /// Class label of sample `i`
    ///
    /// # Panics
    /// Panics if i >= len()
    fn label(&self, i: usize) -> usize;

    /// Get all labels in sample order
    fn labels(&self) -> Vec<usize> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }

    /// Number of classes, validating that labels are contiguous from 0
    fn num_classes(&self) -> Result<usize> {
        class_count(&self.labels())
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A learner for binary problems with targets in {+1, -1}.
///
/// The multiclass machine clones nothing: every row calls `fit` on the same
/// learner, possibly from several threads at once.
pub trait BinaryClassifier: Send + Sync {
    /// The trained model produced by `fit`
    type Model: BinaryModel;

    /// Fit a fresh model on the given features and ±1 targets
    fn fit(
        &self,
        features: &[&SparseVector],
        targets: &[f64],
    ) -> std::result::Result<Self::Model, BinaryTrainingError>;
}

/// A trained binary model
pub trait BinaryModel: Send + Sync {
    /// Signed score: the sign is the decision, the magnitude the confidence
    fn score(&self, features: &SparseVector) -> f64;
}

/// Shared validation for learners that accept ±1 targets.
pub(crate) fn check_binary_input(
    features: &[&SparseVector],
    targets: &[f64],
) -> std::result::Result<(), BinaryTrainingError> {
    if features.is_empty() {
        return Err(BinaryTrainingError::InvalidInput(
            "no training samples".to_string(),
        ));
    }
    if features.len() != targets.len() {
        return Err(BinaryTrainingError::InvalidInput(format!(
            "{} feature vectors but {} targets",
            features.len(),
            targets.len()
        )));
    }
    if let Some(&t) = targets.iter().find(|&&t| t != 1.0 && t != -1.0) {
        return Err(BinaryTrainingError::InvalidInput(format!(
            "target must be -1 or +1, got {t}"
        )));
    }
    if let Some(i) = features.iter().position(|x| !x.is_finite()) {
        return Err(BinaryTrainingError::InvalidInput(format!(
            "sample {i} has non-finite feature values"
        )));
    }
    Ok(())
}
