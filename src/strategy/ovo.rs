//! One-vs-One: one row per unordered class pair

use crate::coding::CodingMatrix;
use crate::core::Result;
use crate::decoder::Decoder;
use crate::strategy::{Partition, Strategy};

#[derive(Debug, Clone, Copy)]
pub struct OneVsOne {
    decoder: Decoder,
}

impl Default for OneVsOne {
    fn default() -> Self {
        Self {
            decoder: Decoder::Voting,
        }
    }
}

impl OneVsOne {
    /// One-vs-One with majority voting
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(decoder: Decoder) -> Self {
        Self { decoder }
    }

    /// Class pair (i, j), i < j, handled by `row` for `n_classes` classes
    pub fn pair_for_row(row: usize, n_classes: usize) -> Option<(usize, usize)> {
        let mut remaining = row;
        for i in 0..n_classes {
            let width = n_classes - i - 1;
            if remaining < width {
                return Some((i, i + 1 + remaining));
            }
            remaining -= width;
        }
        None
    }
}

impl Strategy for OneVsOne {
    fn coding_matrix(&self, n_classes: usize) -> Result<CodingMatrix> {
        CodingMatrix::one_vs_one(n_classes)
    }

    /// Only the row's two classes take part: the first is positive
    fn partition(&self, matrix: &CodingMatrix, row: usize, labels: &[usize]) -> Partition {
        let Some((first, second)) = Self::pair_for_row(row, matrix.n_classes()) else {
            return Partition::default();
        };

        let mut partition = Partition::default();
        for (i, &label) in labels.iter().enumerate() {
            if label == first || label == second {
                partition.indices.push(i);
                partition
                    .targets
                    .push(if label == first { 1.0 } else { -1.0 });
            }
        }
        partition
    }

    fn decoder(&self) -> Decoder {
        self.decoder
    }

    fn name(&self) -> &str {
        "one-vs-one"
    }
}
