//! Error-correcting output codes
//!
//! The coding matrix comes from an [`Encoder`] or is supplied directly. Rows
//! select the classes with nonzero entries and color them by sign.

use crate::coding::CodingMatrix;
use crate::core::{MulticlassError, Result};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::strategy::Strategy;
use std::fmt;

enum CodeSource {
    Encoder(Box<dyn Encoder>),
    Fixed(CodingMatrix),
}

pub struct Ecoc {
    code: CodeSource,
    decoder: Decoder,
}

impl Ecoc {
    /// Generate the code with `encoder`, decode with the hinge loss
    pub fn with_encoder<E: Encoder + 'static>(encoder: E) -> Self {
        Self {
            code: CodeSource::Encoder(Box::new(encoder)),
            decoder: Decoder::default(),
        }
    }

    /// Use a fixed, already validated coding matrix
    pub fn with_matrix(matrix: CodingMatrix) -> Self {
        Self {
            code: CodeSource::Fixed(matrix),
            decoder: Decoder::default(),
        }
    }

    /// Validate user-supplied rows and use them as the code
    pub fn from_rows(rows: Vec<Vec<i8>>) -> Result<Self> {
        Ok(Self::with_matrix(CodingMatrix::new(rows)?))
    }

    pub fn decoded_with(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// The fixed matrix, if one was supplied
    pub fn fixed_matrix(&self) -> Option<&CodingMatrix> {
        match &self.code {
            CodeSource::Fixed(matrix) => Some(matrix),
            CodeSource::Encoder(_) => None,
        }
    }
}

impl Strategy for Ecoc {
    fn coding_matrix(&self, n_classes: usize) -> Result<CodingMatrix> {
        let matrix = match &self.code {
            CodeSource::Encoder(encoder) => encoder.generate(n_classes)?,
            CodeSource::Fixed(matrix) => matrix.clone(),
        };

        if matrix.n_classes() != n_classes {
            return Err(MulticlassError::Configuration(format!(
                "coding matrix has {} class columns but the data has {} classes",
                matrix.n_classes(),
                n_classes
            )));
        }
        Ok(matrix)
    }

    fn decoder(&self) -> Decoder {
        self.decoder
    }

    fn name(&self) -> &str {
        match &self.code {
            CodeSource::Encoder(encoder) => encoder.name(),
            CodeSource::Fixed(_) => "ecoc-fixed",
        }
    }
}

impl fmt::Debug for Ecoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecoc")
            .field("code", &self.name())
            .field("decoder", &self.decoder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{OneVsOneEncoder, RandomDenseEncoder};
    use crate::strategy::{OneVsOne, Partition};

    #[test]
    fn test_fixed_matrix_validated() {
        let err = Ecoc::from_rows(vec![vec![1, -1, 1], vec![-1, -1, -1]]).unwrap_err();
        assert!(matches!(err, MulticlassError::Configuration(_)));
    }

    #[test]
    fn test_fixed_matrix_class_mismatch() {
        let ecoc = Ecoc::with_matrix(CodingMatrix::one_vs_rest(3).unwrap());
        assert!(ecoc.coding_matrix(3).is_ok());
        assert!(matches!(
            ecoc.coding_matrix(4),
            Err(MulticlassError::Configuration(_))
        ));
    }

    #[test]
    fn test_ovo_mimic_partitions_match_one_vs_one() {
        let ecoc = Ecoc::with_encoder(OneVsOneEncoder);
        let ovo = OneVsOne::new();
        let m = ecoc.coding_matrix(4).unwrap();
        let labels = [3, 2, 1, 0, 0, 1, 2, 3];

        for r in 0..m.n_rows() {
            assert_eq!(
                ecoc.partition(&m, r, &labels),
                ovo.partition(&m, r, &labels)
            );
        }
    }

    #[test]
    fn test_sparse_row_partition() {
        let ecoc = Ecoc::from_rows(vec![vec![1, 0, -1, -1], vec![0, 1, -1, 1]]).unwrap();
        let m = ecoc.coding_matrix(4).unwrap();
        let p = ecoc.partition(&m, 1, &[0, 1, 2, 3]);
        assert_eq!(
            p,
            Partition {
                indices: vec![1, 2, 3],
                targets: vec![1.0, -1.0, 1.0],
            }
        );
    }

    #[test]
    fn test_encoder_name_and_decoder() {
        let ecoc = Ecoc::with_encoder(RandomDenseEncoder::new(5).with_max_trials(10))
            .decoded_with(Decoder::Hamming);
        assert_eq!(ecoc.name(), "random-dense");
        assert_eq!(ecoc.decoder(), Decoder::Hamming);
        assert!(ecoc.fixed_matrix().is_none());
    }
}
