//! In-memory datasets and label validation
//!
//! The engine consumes any [`Dataset`]; loading features from disk is left to
//! the caller. [`MulticlassDataset`] is the plain `Vec<Sample>` provider.

use crate::core::{Dataset, MulticlassError, Result, Sample, SparseVector};

/// Count classes in a label slice.
///
/// Labels must cover `0..K` without gaps and K must be at least 2.
pub fn class_count(labels: &[usize]) -> Result<usize> {
    if labels.is_empty() {
        return Err(MulticlassError::EmptyDataset);
    }

    let max = labels.iter().copied().max().unwrap_or(0);
    if max >= labels.len() {
        return Err(MulticlassError::Configuration(format!(
            "label {max} cannot be contiguous over {} samples",
            labels.len()
        )));
    }

    let k = max + 1;
    let mut seen = vec![false; k];
    for &label in labels {
        seen[label] = true;
    }

    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(MulticlassError::Configuration(format!(
            "labels must be contiguous from 0, but class {missing} of 0..{k} has no samples"
        )));
    }
    if k < 2 {
        return Err(MulticlassError::Configuration(format!(
            "at least 2 classes are required, found {k}"
        )));
    }

    Ok(k)
}

/// Dataset held entirely in memory
#[derive(Debug, Clone)]
pub struct MulticlassDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl MulticlassDataset {
    /// Wrap a vector of samples
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(MulticlassError::EmptyDataset);
        }

        let dimensions = samples
            .iter()
            .map(|s| s.features.dim())
            .max()
            .unwrap_or(0);

        Ok(Self {
            samples,
            dimensions,
        })
    }

    /// Build from dense feature rows and a parallel label slice
    pub fn from_dense(rows: &[Vec<f64>], labels: &[usize]) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(MulticlassError::InvalidDataset(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let samples = rows
            .iter()
            .zip(labels)
            .map(|(row, &label)| Sample::new(SparseVector::from_dense(row), label))
            .collect();

        let mut dataset = Self::new(samples)?;
        dataset.dimensions = dataset
            .dimensions
            .max(rows.iter().map(Vec::len).max().unwrap_or(0));
        Ok(dataset)
    }

    /// Borrow the underlying samples
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Feature vectors in sample order
    pub fn feature_vectors(&self) -> Vec<SparseVector> {
        self.samples.iter().map(|s| s.features.clone()).collect()
    }

    /// Split into the first `n` samples and the rest
    pub fn split_at(&self, n: usize) -> Result<(Self, Self)> {
        let n = n.min(self.samples.len());
        let (head, tail) = self.samples.split_at(n);
        Ok((Self::new(head.to_vec())?, Self::new(tail.to_vec())?))
    }
}

impl Dataset for MulticlassDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn features(&self, i: usize) -> &SparseVector {
        &self.samples[i].features
    }

    fn label(&self, i: usize) -> usize {
        self.samples[i].label
    }
}
