//! Multiclass reduction strategies
//!
//! A strategy decides how a K-class problem splits into binary
//! sub-problems: it produces the coding matrix, selects and colors the
//! training samples for each row, and decodes sub-machine outputs back into
//! a class. Strategies are stateless and shared read-only between threads.

pub mod config;
pub mod ecoc;
pub mod ovo;
pub mod ovr;

pub use self::config::*;
pub use self::ecoc::*;
pub use self::ovo::*;
pub use self::ovr::*;

use crate::coding::CodingMatrix;
use crate::core::Result;
use crate::decoder::Decoder;

/// Training samples selected for one row, with their binary targets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    /// Indices into the dataset, in dataset order
    pub indices: Vec<usize>,
    /// +1.0 or -1.0 for each selected sample
    pub targets: Vec<f64>,
}

impl Partition {
    /// Color samples by the row's entries: nonzero entries select the sample
    /// and give its target.
    pub fn from_row(row: &[i8], labels: &[usize]) -> Self {
        let mut partition = Self::default();
        for (i, &label) in labels.iter().enumerate() {
            match row[label] {
                0 => {}
                code => {
                    partition.indices.push(i);
                    partition.targets.push(f64::from(code));
                }
            }
        }
        partition
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn n_positive(&self) -> usize {
        self.targets.iter().filter(|&&t| t > 0.0).count()
    }

    pub fn n_negative(&self) -> usize {
        self.targets.iter().filter(|&&t| t < 0.0).count()
    }
}

/// Decomposition of a multiclass problem into binary ones
pub trait Strategy: Send + Sync {
    /// Coding matrix for `n_classes` classes
    fn coding_matrix(&self, n_classes: usize) -> Result<CodingMatrix>;

    /// Samples and ±1 targets for `row`
    fn partition(&self, matrix: &CodingMatrix, row: usize, labels: &[usize]) -> Partition {
        Partition::from_row(matrix.row(row), labels)
    }

    /// Decoding rule applied at prediction time
    fn decoder(&self) -> Decoder;

    /// Map a prediction vector to a class
    fn decode(&self, outputs: &[f64], matrix: &CodingMatrix) -> usize {
        self.decoder().decode(outputs, matrix)
    }

    /// Short identifier used in logs and saved models
    fn name(&self) -> &str;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn coding_matrix(&self, n_classes: usize) -> Result<CodingMatrix> {
        (**self).coding_matrix(n_classes)
    }

    fn partition(&self, matrix: &CodingMatrix, row: usize, labels: &[usize]) -> Partition {
        (**self).partition(matrix, row, labels)
    }

    fn decoder(&self) -> Decoder {
        (**self).decoder()
    }

    fn decode(&self, outputs: &[f64], matrix: &CodingMatrix) -> usize {
        (**self).decode(outputs, matrix)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
