//! Sequential Minimal Optimization (SMO) solver
//!
//! Solves the soft-margin SVM dual
//!
//! ```text
//! max  Σ αᵢ - ½ Σᵢⱼ αᵢ αⱼ yᵢ yⱼ K(xᵢ, xⱼ)
//! s.t. 0 <= αᵢ <= C,  Σ αᵢ yᵢ = 0
//! ```
//!
//! by repeatedly optimizing a pair of multipliers in closed form (Platt's
//! two-loop heuristic). The decision function is f(x) = Σ αᵢ yᵢ K(xᵢ, x) + b.

use crate::cache::KernelCache;
use crate::core::SparseVector;
use crate::kernel::Kernel;
use log::trace;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Multipliers closer than this to a bound are snapped onto it
const BOUND_EPS: f64 = 1e-12;

/// SMO solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub tolerance: f64,
    /// Minimum relative change of an alpha for a step to count
    pub epsilon: f64,
    /// Maximum number of passes over the training set
    pub max_iterations: usize,
    /// Kernel row cache size in bytes
    pub cache_size: usize,
}

impl Default for SmoConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-3,
            epsilon: 1e-3,
            max_iterations: 10_000,
            cache_size: 100_000_000, // 100MB
        }
    }
}

/// Outcome of one SMO run
#[derive(Debug, Clone)]
pub struct SmoSolution {
    /// Lagrange multipliers, one per training sample
    pub alpha: Vec<f64>,
    /// Bias term b
    pub bias: f64,
    /// Passes over the data that were performed
    pub iterations: usize,
    /// False when the pass limit was hit before the KKT conditions held
    pub converged: bool,
}

impl SmoSolution {
    /// Indices of samples with a nonzero multiplier
    pub fn support_indices(&self) -> Vec<usize> {
        self.alpha
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a > 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// SMO solver over a borrowed binary problem
pub struct SmoSolver<'a, K: Kernel> {
    kernel: &'a K,
    features: &'a [&'a SparseVector],
    targets: &'a [f64],
    config: &'a SmoConfig,
    alpha: Vec<f64>,
    errors: Vec<f64>,
    bias: f64,
    cache: KernelCache,
}

impl<'a, K: Kernel> SmoSolver<'a, K> {
    /// Targets must be ±1 and as long as `features`
    pub fn new(
        kernel: &'a K,
        features: &'a [&'a SparseVector],
        targets: &'a [f64],
        config: &'a SmoConfig,
    ) -> Self {
        let n = features.len();
        Self {
            kernel,
            features,
            targets,
            config,
            alpha: vec![0.0; n],
            // With every alpha at zero f(x) = 0, so E_i = -y_i
            errors: targets.iter().map(|&y| -y).collect(),
            bias: 0.0,
            cache: KernelCache::with_memory_limit(config.cache_size, n),
        }
    }

    /// Run the two-loop heuristic until no multiplier changes
    pub fn solve(mut self) -> SmoSolution {
        let n = self.features.len();
        let mut iterations = 0;
        let mut changed = 0;
        let mut examine_all = true;
        let mut converged = true;

        while changed > 0 || examine_all {
            if iterations >= self.config.max_iterations {
                converged = false;
                break;
            }

            changed = 0;
            for i in 0..n {
                if (examine_all || self.is_free(i)) && self.examine(i) {
                    changed += 1;
                }
            }

            if examine_all {
                examine_all = false;
            } else if changed == 0 {
                examine_all = true;
            }
            iterations += 1;
        }

        let stats = self.cache.stats();
        trace!(
            "SMO finished after {} passes (cache hits {}, misses {})",
            iterations,
            stats.hits,
            stats.misses
        );

        SmoSolution {
            alpha: self.alpha,
            bias: self.bias,
            iterations,
            converged,
        }
    }

    fn is_free(&self, i: usize) -> bool {
        self.alpha[i] > 0.0 && self.alpha[i] < self.config.c
    }

    fn kernel_row(&mut self, i: usize) -> Rc<[f64]> {
        let (kernel, features) = (self.kernel, self.features);
        self.cache.row(i, || {
            features
                .iter()
                .map(|x| kernel.compute(features[i], x))
                .collect()
        })
    }

    /// Try to make progress on `i2` if it violates the KKT conditions
    fn examine(&mut self, i2: usize) -> bool {
        let n = self.features.len();
        let (y2, a2, e2) = (self.targets[i2], self.alpha[i2], self.errors[i2]);
        let r2 = e2 * y2;
        let tol = self.config.tolerance;

        if !((r2 < -tol && a2 < self.config.c) || (r2 > tol && a2 > 0.0)) {
            return false;
        }

        // Second choice: the free multiplier with the largest |E1 - E2|
        let partner = (0..n)
            .filter(|&i| i != i2 && self.is_free(i))
            .max_by(|&a, &b| {
                let da = (self.errors[a] - e2).abs();
                let db = (self.errors[b] - e2).abs();
                da.total_cmp(&db)
            });
        if let Some(i1) = partner {
            if self.take_step(i1, i2) {
                return true;
            }
        }

        // Fall back to every free multiplier, then to everything
        for offset in 1..n {
            let i1 = (i2 + offset) % n;
            if self.is_free(i1) && self.take_step(i1, i2) {
                return true;
            }
        }
        for offset in 1..n {
            if self.take_step((i2 + offset) % n, i2) {
                return true;
            }
        }
        false
    }

    /// Jointly optimize alpha[i1] and alpha[i2]
    fn take_step(&mut self, i1: usize, i2: usize) -> bool {
        if i1 == i2 {
            return false;
        }

        let c = self.config.c;
        let (y1, y2) = (self.targets[i1], self.targets[i2]);
        let (a1, a2) = (self.alpha[i1], self.alpha[i2]);
        let (e1, e2) = (self.errors[i1], self.errors[i2]);

        let (low, high) = if y1 != y2 {
            ((a2 - a1).max(0.0), (c + a2 - a1).min(c))
        } else {
            ((a1 + a2 - c).max(0.0), (a1 + a2).min(c))
        };
        if low >= high {
            return false;
        }

        let row1 = self.kernel_row(i1);
        let row2 = self.kernel_row(i2);
        let (k11, k12, k22) = (row1[i1], row1[i2], row2[i2]);

        // Non-positive curvature gives no progress along the constraint line
        let eta = k11 + k22 - 2.0 * k12;
        if eta <= BOUND_EPS {
            return false;
        }

        let a2_new = (a2 + y2 * (e1 - e2) / eta).clamp(low, high);
        let eps = self.config.epsilon;
        if (a2_new - a2).abs() < eps * (a2_new + a2 + eps) {
            return false;
        }

        let mut a1_new = a1 + y1 * y2 * (a2 - a2_new);
        if a1_new < BOUND_EPS {
            a1_new = 0.0;
        } else if a1_new > c - BOUND_EPS {
            a1_new = c;
        }

        let d1 = y1 * (a1_new - a1);
        let d2 = y2 * (a2_new - a2);
        let b1 = self.bias - e1 - d1 * k11 - d2 * k12;
        let b2 = self.bias - e2 - d1 * k12 - d2 * k22;
        let bias = if a1_new > 0.0 && a1_new < c {
            b1
        } else if a2_new > 0.0 && a2_new < c {
            b2
        } else {
            (b1 + b2) / 2.0
        };
        let db = bias - self.bias;

        for (i, e) in self.errors.iter_mut().enumerate() {
            *e += d1 * row1[i] + d2 * row2[i] + db;
        }
        self.alpha[i1] = a1_new;
        self.alpha[i2] = a2_new;
        self.bias = bias;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{LinearKernel, RBFKernel};

    fn decision<K: Kernel>(
        kernel: &K,
        features: &[&SparseVector],
        targets: &[f64],
        solution: &SmoSolution,
        x: &SparseVector,
    ) -> f64 {
        features
            .iter()
            .zip(targets)
            .zip(&solution.alpha)
            .map(|((sv, &y), &a)| a * y * kernel.compute(sv, x))
            .sum::<f64>()
            + solution.bias
    }

    #[test]
    fn test_separable_points() {
        let points = [
            SparseVector::from_dense(&[2.0, 2.0]),
            SparseVector::from_dense(&[3.0, 1.5]),
            SparseVector::from_dense(&[-2.0, -1.0]),
            SparseVector::from_dense(&[-1.5, -2.5]),
        ];
        let features: Vec<&SparseVector> = points.iter().collect();
        let targets = [1.0, 1.0, -1.0, -1.0];
        let config = SmoConfig::default();
        let kernel = LinearKernel::new();

        let solution = SmoSolver::new(&kernel, &features, &targets, &config).solve();

        assert!(solution.converged);
        for (x, &y) in features.iter().zip(&targets) {
            assert!(decision(&kernel, &features, &targets, &solution, x) * y > 0.0);
        }

        // Equality constraint Σ αᵢ yᵢ = 0
        let balance: f64 = solution.alpha.iter().zip(&targets).map(|(a, y)| a * y).sum();
        assert!(balance.abs() < 1e-9);
        assert!(solution.alpha.iter().all(|&a| (0.0..=config.c).contains(&a)));
        assert!(!solution.support_indices().is_empty());
    }

    #[test]
    fn test_xor_with_rbf() {
        let points = [
            SparseVector::from_dense(&[1.0, 1.0]),
            SparseVector::from_dense(&[-1.0, -1.0]),
            SparseVector::from_dense(&[1.0, -1.0]),
            SparseVector::from_dense(&[-1.0, 1.0]),
        ];
        let features: Vec<&SparseVector> = points.iter().collect();
        let targets = [1.0, 1.0, -1.0, -1.0];
        let config = SmoConfig {
            c: 10.0,
            ..SmoConfig::default()
        };
        let kernel = RBFKernel::new(1.0);

        let solution = SmoSolver::new(&kernel, &features, &targets, &config).solve();

        for (x, &y) in features.iter().zip(&targets) {
            assert!(decision(&kernel, &features, &targets, &solution, x) * y > 0.0);
        }
    }

    #[test]
    fn test_iteration_limit() {
        let points = [
            SparseVector::from_dense(&[1.0]),
            SparseVector::from_dense(&[-1.0]),
        ];
        let features: Vec<&SparseVector> = points.iter().collect();
        let targets = [1.0, -1.0];
        let config = SmoConfig {
            max_iterations: 0,
            ..SmoConfig::default()
        };

        let solution = SmoSolver::new(&LinearKernel, &features, &targets, &config).solve();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 0);
        assert!(solution.alpha.iter().all(|&a| a == 0.0));
    }
}
