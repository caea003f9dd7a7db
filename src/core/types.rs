//! Core type definitions for multiclass reduction

use serde::{Deserialize, Serialize};

/// Multiclass prediction: decoded class plus the evidence behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class index in [0, K)
    pub class: usize,
    /// Raw sub-machine scores, one per coding matrix row
    pub outputs: Vec<f64>,
    /// Decoding cost per class (lower is closer)
    pub costs: Vec<f64>,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(class: usize, outputs: Vec<f64>, costs: Vec<f64>) -> Self {
        Self {
            class,
            outputs,
            costs,
        }
    }

    /// Gap between the runner-up cost and the winning cost.
    ///
    /// Zero when two classes tie or when there is a single class.
    pub fn confidence(&self) -> f64 {
        let best = self.costs.get(self.class).copied().unwrap_or(0.0);
        self.costs
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != self.class)
            .map(|(_, &c)| c - best)
            .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
            .unwrap_or(0.0)
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build from a dense row, dropping exact zeros
    pub fn from_dense(values: &[f64]) -> Self {
        let (indices, values) = values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with another sparse vector.
    ///
    /// Both index lists are sorted, so this is a single merge pass.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        let (mut i, mut j) = (0, 0);

        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Equal => {
                    result += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }

        result
    }

    /// Dot product with a dense weight vector; indices past its end count as zero
    pub fn dot_dense(&self, weights: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .filter(|&(&idx, _)| idx < weights.len())
            .map(|(&idx, &v)| weights[idx] * v)
            .sum()
    }

    /// Squared Euclidean distance ||x - y||²
    pub fn squared_distance(&self, other: &SparseVector) -> f64 {
        (self.norm_squared() + other.norm_squared() - 2.0 * self.dot(other)).max(0.0)
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Largest index plus one (0 for the empty vector)
    pub fn dim(&self) -> usize {
        self.indices.last().map_or(0, |&idx| idx + 1)
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// True when every stored value is finite
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Training sample with features and a class label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class index in [0, K)
    pub label: usize,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: usize) -> Self {
        Self { features, label }
    }
}
