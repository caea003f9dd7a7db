//! Kernel trait definition

use crate::core::SparseVector;

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Kernels are shared read-only by every sub-machine trained in parallel.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Short identifier used in training log output
    fn name(&self) -> &'static str;
}
