//! Random ECOC encoders
//!
//! Both encoders run the same local search: draw `max_trials` random
//! candidate matrices and keep the one whose closest pair of class codes is
//! furthest apart. Rows lacking a +1 or a -1 are redrawn on the spot, so
//! every candidate already satisfies row validity. A row that stays invalid
//! after [`MAX_ROW_REDRAWS`] draws fails the search.

use crate::coding::{check_class_count, min_half_units, CodingMatrix};
use crate::core::{MulticlassError, Result};
use crate::encoder::Encoder;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Candidates drawn per `generate` call unless configured otherwise
pub const DEFAULT_MAX_TRIALS: usize = 10_000;

/// Attempts at drawing one row with both a +1 and a -1 before giving up
const MAX_ROW_REDRAWS: usize = 1_000;

/// Dense random codes: every entry is ±1.
///
/// Default code length is `ceil(10 ln K)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomDenseEncoder {
    code_length: Option<usize>,
    max_trials: usize,
    seed: u64,
}

impl RandomDenseEncoder {
    pub fn new(seed: u64) -> Self {
        Self {
            code_length: None,
            max_trials: DEFAULT_MAX_TRIALS,
            seed,
        }
    }

    /// Fix the number of rows instead of deriving it from K
    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = Some(code_length);
        self
    }

    /// Number of candidate matrices to draw
    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Code length used for `n_classes`
    pub fn code_length_for(&self, n_classes: usize) -> Result<usize> {
        resolve_code_length(self.code_length, 10.0, n_classes)
    }
}

impl Encoder for RandomDenseEncoder {
    fn generate(&self, n_classes: usize) -> Result<CodingMatrix> {
        check_class_count(n_classes)?;
        let n_rows = self.code_length_for(n_classes)?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        search(
            n_rows,
            n_classes,
            self.max_trials,
            &mut rng,
            |rng: &mut StdRng| if rng.gen_bool(0.5) { 1 } else { -1 },
        )
    }

    fn name(&self) -> &'static str {
        "random-dense"
    }
}

/// Sparse random codes: entries are 0 with `zero_probability`, otherwise ±1
/// with equal odds.
///
/// Default code length is `ceil(15 ln K)`. Candidates in which some class is
/// excluded from every row are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomSparseEncoder {
    code_length: Option<usize>,
    max_trials: usize,
    seed: u64,
    zero_probability: f64,
}

impl RandomSparseEncoder {
    pub fn new(seed: u64) -> Self {
        Self {
            code_length: None,
            max_trials: DEFAULT_MAX_TRIALS,
            seed,
            zero_probability: 0.5,
        }
    }

    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = Some(code_length);
        self
    }

    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Probability that a class is left out of a row, in [0, 1)
    pub fn with_zero_probability(mut self, zero_probability: f64) -> Self {
        self.zero_probability = zero_probability;
        self
    }

    pub fn code_length_for(&self, n_classes: usize) -> Result<usize> {
        resolve_code_length(self.code_length, 15.0, n_classes)
    }
}

impl Encoder for RandomSparseEncoder {
    fn generate(&self, n_classes: usize) -> Result<CodingMatrix> {
        check_class_count(n_classes)?;
        if !(0.0..1.0).contains(&self.zero_probability) {
            return Err(MulticlassError::Configuration(format!(
                "zero probability must be in [0, 1), got {}",
                self.zero_probability
            )));
        }

        let n_rows = self.code_length_for(n_classes)?;
        let p_zero = self.zero_probability;
        let p_positive = p_zero + (1.0 - p_zero) / 2.0;
        let mut rng = StdRng::seed_from_u64(self.seed);

        search(n_rows, n_classes, self.max_trials, &mut rng, |rng: &mut StdRng| {
            let u: f64 = rng.gen();
            if u < p_zero {
                0
            } else if u < p_positive {
                1
            } else {
                -1
            }
        })
    }

    fn name(&self) -> &'static str {
        "random-sparse"
    }
}

fn resolve_code_length(configured: Option<usize>, factor: f64, n_classes: usize) -> Result<usize> {
    match configured {
        Some(0) => Err(MulticlassError::Configuration(
            "code length must be positive".to_string(),
        )),
        Some(n) => Ok(n),
        None => Ok(((factor * (n_classes as f64).ln()).ceil() as usize).max(1)),
    }
}

/// Keep the candidate maximising the minimum pairwise column distance.
///
/// The first candidate reaching the best distance wins, which keeps the
/// result a function of the seed alone.
fn search<F>(
    n_rows: usize,
    n_classes: usize,
    max_trials: usize,
    rng: &mut StdRng,
    mut draw: F,
) -> Result<CodingMatrix>
where
    F: FnMut(&mut StdRng) -> i8,
{
    if max_trials == 0 {
        return Err(MulticlassError::Configuration(
            "at least one trial is required".to_string(),
        ));
    }

    let mut best: Option<(u32, CodingMatrix)> = None;
    let mut codes = vec![0i8; n_rows * n_classes];

    for _ in 0..max_trials {
        for row in codes.chunks_mut(n_classes) {
            let mut valid = false;
            for _ in 0..MAX_ROW_REDRAWS {
                for cell in row.iter_mut() {
                    *cell = draw(rng);
                }
                if row.contains(&1) && row.contains(&-1) {
                    valid = true;
                    break;
                }
            }
            if !valid {
                return Err(MulticlassError::Configuration(format!(
                    "no row with both a +1 and a -1 over {n_classes} classes \
                     in {MAX_ROW_REDRAWS} draws; lower the zero probability"
                )));
            }
        }

        let candidate = CodingMatrix::from_codes_unchecked(n_rows, n_classes, codes.clone());
        let has_empty_column =
            (0..n_classes).any(|k| (0..n_rows).all(|r| candidate.get(r, k) == 0));
        if has_empty_column {
            continue;
        }

        let distance = min_half_units(&candidate);
        if best.as_ref().map_or(true, |(d, _)| distance > *d) {
            best = Some((distance, candidate));
        }
    }

    let (distance, matrix) = best.ok_or_else(|| {
        MulticlassError::Configuration(format!(
            "no valid {n_rows}x{n_classes} code found in {max_trials} trials"
        ))
    })?;

    debug!(
        "selected {}x{} code with minimum column distance {}",
        n_rows,
        n_classes,
        distance as f64 / 2.0
    );

    // Re-run full validation so redundant rows are reported.
    CodingMatrix::new(matrix.to_rows())
}
