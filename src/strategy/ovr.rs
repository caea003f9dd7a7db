//! One-vs-Rest: one row per class, that class against all others

use crate::coding::CodingMatrix;
use crate::core::Result;
use crate::decoder::Decoder;
use crate::strategy::{Partition, Strategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct OneVsRest {
    decoder: Decoder,
}

impl OneVsRest {
    /// One-vs-Rest decoded with the hinge loss
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(decoder: Decoder) -> Self {
        Self { decoder }
    }
}

impl Strategy for OneVsRest {
    fn coding_matrix(&self, n_classes: usize) -> Result<CodingMatrix> {
        CodingMatrix::one_vs_rest(n_classes)
    }

    /// Every sample takes part; class `row` is positive
    fn partition(&self, _matrix: &CodingMatrix, row: usize, labels: &[usize]) -> Partition {
        Partition {
            indices: (0..labels.len()).collect(),
            targets: labels
                .iter()
                .map(|&label| if label == row { 1.0 } else { -1.0 })
                .collect(),
        }
    }

    fn decoder(&self) -> Decoder {
        self.decoder
    }

    fn name(&self) -> &str {
        "one-vs-rest"
    }
}
