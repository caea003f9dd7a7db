//! Decoding of sub-machine outputs into a class
//!
//! Every decoder assigns each class a cost computed from the prediction
//! vector and that class's code word, then picks the cheapest class. Rows in
//! which a class is excluded (entry 0) never contribute to its cost, and
//! ties go to the lowest class index.

use crate::coding::CodingMatrix;
use serde::{Deserialize, Serialize};

/// Margin loss applied to `score * code` in loss-based decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LossFunction {
    /// max(0, 1 - z)
    #[default]
    Hinge,
    /// exp(-z)
    Exponential,
}

impl LossFunction {
    /// Evaluate the loss at margin `z`
    pub fn loss(&self, z: f64) -> f64 {
        match self {
            LossFunction::Hinge => (1.0 - z).max(0.0),
            LossFunction::Exponential => (-z).exp(),
        }
    }
}

/// Decoding rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decoder {
    /// Count of rows whose binarised output disagrees with the code
    Hamming,
    /// Sum of margin losses over participating rows
    Loss(LossFunction),
    /// Each row votes for the classes on the side its output picked
    Voting,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::Loss(LossFunction::Hinge)
    }
}

impl Decoder {
    /// Loss-based decoding with the hinge loss
    pub fn margin_loss() -> Self {
        Decoder::Loss(LossFunction::Hinge)
    }

    /// Per-class decoding cost; lower is better.
    ///
    /// # Panics
    /// Panics if `outputs.len()` differs from the matrix row count
    pub fn costs(&self, outputs: &[f64], matrix: &CodingMatrix) -> Vec<f64> {
        assert_eq!(
            outputs.len(),
            matrix.n_rows(),
            "prediction vector length must equal the number of coding rows"
        );

        let mut costs = vec![0.0; matrix.n_classes()];
        for (r, &score) in outputs.iter().enumerate() {
            let side = binarise(score);
            for (k, &code) in matrix.row(r).iter().enumerate() {
                if code == 0 {
                    continue;
                }
                let code = f64::from(code);
                costs[k] += match self {
                    Decoder::Hamming => {
                        if side != code {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    Decoder::Loss(loss) => loss.loss(score * code),
                    Decoder::Voting => {
                        if side == code {
                            -1.0
                        } else {
                            0.0
                        }
                    }
                };
            }
        }
        costs
    }

    /// Index of the cheapest class
    pub fn decode(&self, outputs: &[f64], matrix: &CodingMatrix) -> usize {
        argmin(&self.costs(outputs, matrix))
    }
}

/// Sign of a score, with 0 counted as positive
fn binarise(score: f64) -> f64 {
    if score >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// First index of the minimum value
pub(crate) fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn code_as_outputs(matrix: &CodingMatrix, class: usize) -> Vec<f64> {
        matrix.column(class).into_iter().map(f64::from).collect()
    }

    #[test]
    fn test_exact_code_decodes_to_its_class() {
        let matrices = vec![
            CodingMatrix::one_vs_rest(5).unwrap(),
            CodingMatrix::one_vs_one(4).unwrap(),
            CodingMatrix::new(vec![
                vec![1, -1, 1, -1],
                vec![1, 1, -1, -1],
                vec![1, -1, -1, 1],
            ])
            .unwrap(),
        ];

        for m in &matrices {
            for k in 0..m.n_classes() {
                let outputs = code_as_outputs(m, k);
                assert_eq!(Decoder::margin_loss().decode(&outputs, m), k);
                assert_eq!(Decoder::Loss(LossFunction::Exponential).decode(&outputs, m), k);
                assert_eq!(Decoder::Hamming.decode(&outputs, m), k);
            }
        }
    }

    #[test]
    fn test_shadowed_class_wins_ties_on_zero_entries() {
        let m = CodingMatrix::new(vec![vec![1, 1, -1], vec![0, -1, 1]]).unwrap();
        let outputs = code_as_outputs(&m, 1);

        let costs = Decoder::margin_loss().costs(&outputs, &m);
        assert_relative_eq!(costs[0], 0.0);
        assert_relative_eq!(costs[1], 0.0);
        assert_eq!(Decoder::margin_loss().decode(&outputs, &m), 0);
    }

    #[test]
    fn test_hinge_costs() {
        let m = CodingMatrix::one_vs_rest(3).unwrap();
        let costs = Decoder::margin_loss().costs(&[0.5, -2.0, -0.5], &m);
        // class 0: hinge(0.5) + hinge(2.0) + hinge(0.5) = 0.5 + 0 + 0.5
        assert_relative_eq!(costs[0], 1.0);
        // class 1: hinge(-0.5) + hinge(-2.0) + hinge(0.5) = 1.5 + 3 + 0.5
        assert_relative_eq!(costs[1], 5.0);
        // class 2: hinge(-0.5) + hinge(2.0) + hinge(-0.5) = 1.5 + 0 + 1.5
        assert_relative_eq!(costs[2], 3.0);
    }

    #[test]
    fn test_excluded_rows_do_not_count() {
        let m = CodingMatrix::one_vs_one(3).unwrap();
        // rows: (0,1), (0,2), (1,2)
        let costs = Decoder::Hamming.costs(&[1.0, 1.0, -1.0], &m);
        assert_eq!(costs, vec![0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_voting_one_vs_one() {
        let m = CodingMatrix::one_vs_one(4).unwrap();
        // (0,1)->1, (0,2)->2, (0,3)->0, (1,2)->2, (1,3)->3, (2,3)->2
        let outputs = [-0.3, -1.0, 0.8, -0.1, -2.0, 0.4];
        let costs = Decoder::Voting.costs(&outputs, &m);
        assert_eq!(costs, vec![-1.0, -1.0, -3.0, -1.0]);
        assert_eq!(Decoder::Voting.decode(&outputs, &m), 2);
    }

    #[test]
    fn test_ties_pick_lowest_class() {
        let m = CodingMatrix::one_vs_one(3).unwrap();
        // (0,1)->0, (0,2)->2, (1,2)->1: one vote each
        let outputs = [1.0, -1.0, 1.0];
        assert_eq!(Decoder::Voting.decode(&outputs, &m), 0);
        assert_eq!(Decoder::Hamming.decode(&outputs, &m), 0);
    }

    #[test]
    fn test_zero_score_counts_as_positive() {
        let m = CodingMatrix::one_vs_one(2).unwrap();
        assert_eq!(Decoder::Voting.decode(&[0.0], &m), 0);
        assert_eq!(Decoder::Hamming.decode(&[0.0], &m), 0);
    }

    #[test]
    fn test_argmin() {
        assert_eq!(argmin(&[3.0, 1.0, 1.0, 2.0]), 1);
        assert_eq!(argmin(&[0.0]), 0);
    }

    #[test]
    #[should_panic(expected = "prediction vector length")]
    fn test_length_mismatch_panics() {
        let m = CodingMatrix::one_vs_rest(3).unwrap();
        Decoder::Hamming.decode(&[1.0], &m);
    }
}
