//! Binary SVM learners
//!
//! These tie the solvers to the [`BinaryClassifier`] seam used by the
//! multiclass machine: [`LinearSvm`] runs dual coordinate descent on the raw
//! features, [`KernelSvm`] runs SMO with any [`Kernel`].

use crate::core::traits::check_binary_input;
use crate::core::{BinaryClassifier, BinaryModel, BinaryTrainingError, SparseVector};
use crate::kernel::Kernel;
use crate::solver::{solve_dcd, DcdConfig, SmoConfig, SmoSolver, SvmLoss};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

type FitResult<T> = std::result::Result<T, BinaryTrainingError>;

fn check_c(c: f64) -> FitResult<()> {
    if c > 0.0 && c.is_finite() {
        Ok(())
    } else {
        Err(BinaryTrainingError::InvalidInput(format!(
            "C must be positive and finite, got {c}"
        )))
    }
}

/// Either fail or log, depending on how strict the learner is
fn on_nonconvergence(strict: bool, iterations: usize, n_samples: usize) -> FitResult<()> {
    if strict {
        return Err(BinaryTrainingError::NonConvergence { iterations });
    }
    warn!(
        "solver stopped at the iteration limit ({}) on {} samples, model may be suboptimal",
        iterations, n_samples
    );
    Ok(())
}

/// Linear SVM trained by dual coordinate descent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LinearSvm {
    config: DcdConfig,
    /// Report hitting the iteration limit as an error instead of a warning
    fail_on_nonconvergence: bool,
}

impl LinearSvm {
    /// Create a learner with C = 1, squared hinge loss and a unit bias feature
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn with_loss(mut self, loss: SvmLoss) -> Self {
        self.config.loss = loss;
        self
    }

    /// Value of the constant bias feature; 0 trains without a bias
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.config.bias = bias;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Turn iteration-limit stops into training errors
    pub fn strict(mut self) -> Self {
        self.fail_on_nonconvergence = true;
        self
    }

    pub fn config(&self) -> &DcdConfig {
        &self.config
    }
}

impl BinaryClassifier for LinearSvm {
    type Model = LinearModel;

    fn fit(&self, features: &[&SparseVector], targets: &[f64]) -> FitResult<LinearModel> {
        check_binary_input(features, targets)?;
        check_c(self.config.c)?;

        let solution = solve_dcd(features, targets, &self.config);
        debug!(
            "linear SVM on {} samples: {} passes, converged: {}",
            features.len(),
            solution.iterations,
            solution.converged
        );
        if !solution.converged {
            on_nonconvergence(
                self.fail_on_nonconvergence,
                solution.iterations,
                features.len(),
            )?;
        }

        Ok(LinearModel {
            weights: solution.weights,
            bias: solution.bias,
        })
    }
}

/// A trained linear decision function f(x) = w·x + b
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl BinaryModel for LinearModel {
    fn score(&self, features: &SparseVector) -> f64 {
        features.dot_dense(&self.weights) + self.bias
    }
}

/// Kernel SVM trained by SMO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSvm<K> {
    kernel: K,
    config: SmoConfig,
    fail_on_nonconvergence: bool,
}

impl<K: Kernel + Clone> KernelSvm<K> {
    /// Create a learner with the default SMO configuration
    pub fn new(kernel: K) -> Self {
        Self::with_config(kernel, SmoConfig::default())
    }

    pub fn with_config(kernel: K, config: SmoConfig) -> Self {
        Self {
            kernel,
            config,
            fail_on_nonconvergence: false,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Kernel row cache budget per sub-problem, in bytes
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = bytes;
        self
    }

    pub fn strict(mut self) -> Self {
        self.fail_on_nonconvergence = true;
        self
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn config(&self) -> &SmoConfig {
        &self.config
    }
}

impl<K: Kernel + Clone> BinaryClassifier for KernelSvm<K> {
    type Model = TrainedSvm<K>;

    fn fit(&self, features: &[&SparseVector], targets: &[f64]) -> FitResult<TrainedSvm<K>> {
        check_binary_input(features, targets)?;
        check_c(self.config.c)?;

        let solution = SmoSolver::new(&self.kernel, features, targets, &self.config).solve();
        if !solution.converged {
            on_nonconvergence(
                self.fail_on_nonconvergence,
                solution.iterations,
                features.len(),
            )?;
        }

        let support_indices = solution.support_indices();
        debug!(
            "{} kernel SVM on {} samples: {} support vectors after {} passes",
            self.kernel.name(),
            features.len(),
            support_indices.len(),
            solution.iterations
        );

        Ok(TrainedSvm {
            kernel: self.kernel.clone(),
            support_vectors: support_indices
                .iter()
                .map(|&i| features[i].clone())
                .collect(),
            coefficients: support_indices
                .iter()
                .map(|&i| solution.alpha[i] * targets[i])
                .collect(),
            bias: solution.bias,
            support_indices,
        })
    }
}

/// A trained kernel SVM: f(x) = Σ cᵢ K(svᵢ, x) + b with cᵢ = αᵢ yᵢ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedSvm<K> {
    kernel: K,
    support_vectors: Vec<SparseVector>,
    coefficients: Vec<f64>,
    bias: f64,
    /// Positions of the support vectors within the sub-problem
    support_indices: Vec<usize>,
}

impl<K: Kernel> TrainedSvm<K> {
    pub fn decision_function(&self, features: &SparseVector) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.coefficients)
            .map(|(sv, &coef)| coef * self.kernel.compute(sv, features))
            .sum::<f64>()
            + self.bias
    }

    pub fn support_vectors(&self) -> &[SparseVector] {
        &self.support_vectors
    }

    /// Signed dual coefficients αᵢ yᵢ, one per support vector
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

impl<K: Kernel> BinaryModel for TrainedSvm<K> {
    fn score(&self, features: &SparseVector) -> f64 {
        self.decision_function(features)
    }
}
