//! Ternary coding matrices
//!
//! A coding matrix has one row per binary sub-problem and one column per
//! class. Entry `+1` puts the class on the positive side of that row's
//! problem, `-1` on the negative side and `0` leaves it out.

use crate::core::{MulticlassError, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Validated L x K matrix over {-1, 0, +1}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i8>>", into = "Vec<Vec<i8>>")]
pub struct CodingMatrix {
    n_rows: usize,
    n_classes: usize,
    /// Row-major entries
    codes: Vec<i8>,
}

impl CodingMatrix {
    /// Build from rows, rejecting any matrix that cannot define a valid
    /// set of binary problems.
    pub fn new(rows: Vec<Vec<i8>>) -> Result<Self> {
        let n_rows = rows.len();
        if n_rows == 0 {
            return Err(MulticlassError::Configuration(
                "coding matrix must have at least one row".to_string(),
            ));
        }

        let n_classes = rows[0].len();
        if n_classes < 2 {
            return Err(MulticlassError::Configuration(format!(
                "coding matrix needs at least 2 class columns, got {n_classes}"
            )));
        }

        let mut codes = Vec::with_capacity(n_rows * n_classes);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != n_classes {
                return Err(MulticlassError::Configuration(format!(
                    "row {r} has {} entries, expected {n_classes}",
                    row.len()
                )));
            }
            if let Some(&bad) = row.iter().find(|&&c| !(-1..=1).contains(&c)) {
                return Err(MulticlassError::Configuration(format!(
                    "row {r} contains {bad}; entries must be -1, 0 or +1"
                )));
            }
            if !row.contains(&1) || !row.contains(&-1) {
                return Err(MulticlassError::Configuration(format!(
                    "row {r} must contain both a +1 and a -1 entry"
                )));
            }
            codes.extend(row);
        }

        let matrix = Self {
            n_rows,
            n_classes,
            codes,
        };

        if let Some(k) = (0..n_classes).find(|&k| matrix.column_iter(k).all(|c| c == 0)) {
            return Err(MulticlassError::Configuration(format!(
                "class {k} is excluded from every row and can never be predicted"
            )));
        }

        for (a, b) in matrix.redundant_row_pairs() {
            warn!("coding matrix rows {a} and {b} are identical or negations of each other");
        }
        for (a, b) in matrix.shadowed_class_pairs() {
            warn!(
                "class {a} agrees with class {b} on every row it takes part in; \
                 an exact code for class {b} may decode to class {a}"
            );
        }

        Ok(matrix)
    }

    /// K x K matrix with +1 on the diagonal and -1 elsewhere
    pub fn one_vs_rest(n_classes: usize) -> Result<Self> {
        check_class_count(n_classes)?;
        let rows = (0..n_classes)
            .map(|r| {
                (0..n_classes)
                    .map(|k| if k == r { 1 } else { -1 })
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    /// One row per unordered pair (i, j), i < j, ordered by i then j
    pub fn one_vs_one(n_classes: usize) -> Result<Self> {
        check_class_count(n_classes)?;
        let mut rows = Vec::with_capacity(n_classes * (n_classes - 1) / 2);
        for i in 0..n_classes {
            for j in (i + 1)..n_classes {
                let mut row = vec![0; n_classes];
                row[i] = 1;
                row[j] = -1;
                rows.push(row);
            }
        }
        Self::new(rows)
    }

    /// Number of rows (code length L)
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of class columns (K)
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Entry for (row, class)
    pub fn get(&self, row: usize, class: usize) -> i8 {
        assert!(class < self.n_classes, "class {class} out of range");
        self.codes[row * self.n_classes + class]
    }

    /// Coloring of one row
    pub fn row(&self, row: usize) -> &[i8] {
        let start = row * self.n_classes;
        &self.codes[start..start + self.n_classes]
    }

    /// Code word of one class
    pub fn column(&self, class: usize) -> Vec<i8> {
        self.column_iter(class).collect()
    }

    fn column_iter(&self, class: usize) -> impl Iterator<Item = i8> + '_ {
        (0..self.n_rows).map(move |r| self.get(r, class))
    }

    /// Whether the matrix contains any excluded (zero) entry
    pub fn is_sparse(&self) -> bool {
        self.codes.contains(&0)
    }

    /// Generalised Hamming distance between two class codes.
    ///
    /// Each row contributes `(1 - a * b) / 2`: 0 for agreement, 1 for
    /// disagreement and 1/2 when either class is excluded.
    pub fn column_distance(&self, a: usize, b: usize) -> f64 {
        half_units_between(self, a, b) as f64 / 2.0
    }

    /// Smallest distance between any two class codes
    pub fn min_column_distance(&self) -> f64 {
        min_half_units(self) as f64 / 2.0
    }

    /// Row pairs that are identical or exact negations of each other
    pub fn redundant_row_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for a in 0..self.n_rows {
            for b in (a + 1)..self.n_rows {
                let (ra, rb) = (self.row(a), self.row(b));
                let same = ra == rb;
                let negated = ra.iter().zip(rb).all(|(&x, &y)| x == -y);
                if same || negated {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    /// Class pairs `(a, b)` where the code of `a` matches the code of `b`
    /// on every row in which `a` is non-zero.
    ///
    /// Decoders skip zero entries, so such a class costs no more than `b`
    /// on `b`'s own code word.
    pub fn shadowed_class_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for a in 0..self.n_classes {
            for b in (0..self.n_classes).filter(|&b| b != a) {
                let shadows = (0..self.n_rows)
                    .map(|r| (self.get(r, a), self.get(r, b)))
                    .all(|(ca, cb)| ca == 0 || ca == cb);
                if shadows {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    /// Rows as nested vectors
    pub fn to_rows(&self) -> Vec<Vec<i8>> {
        (0..self.n_rows).map(|r| self.row(r).to_vec()).collect()
    }

    /// Build without validation; callers guarantee every invariant.
    pub(crate) fn from_codes_unchecked(n_rows: usize, n_classes: usize, codes: Vec<i8>) -> Self {
        debug_assert_eq!(codes.len(), n_rows * n_classes);
        Self {
            n_rows,
            n_classes,
            codes,
        }
    }
}

/// Twice the generalised Hamming distance, kept integral for exact comparisons
pub(crate) fn half_units_between(matrix: &CodingMatrix, a: usize, b: usize) -> u32 {
    (0..matrix.n_rows())
        .map(|r| (1 - i32::from(matrix.get(r, a)) * i32::from(matrix.get(r, b))) as u32)
        .sum()
}

pub(crate) fn min_half_units(matrix: &CodingMatrix) -> u32 {
    let k = matrix.n_classes();
    let mut best = u32::MAX;
    for a in 0..k {
        for b in (a + 1)..k {
            best = best.min(half_units_between(matrix, a, b));
        }
    }
    best
}

pub(crate) fn check_class_count(n_classes: usize) -> Result<()> {
    if n_classes < 2 {
        return Err(MulticlassError::Configuration(format!(
            "at least 2 classes are required, got {n_classes}"
        )));
    }
    Ok(())
}

impl TryFrom<Vec<Vec<i8>>> for CodingMatrix {
    type Error = MulticlassError;

    fn try_from(rows: Vec<Vec<i8>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<CodingMatrix> for Vec<Vec<i8>> {
    fn from(matrix: CodingMatrix) -> Self {
        matrix.to_rows()
    }
}
