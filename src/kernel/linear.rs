//! Linear kernel implementation

use crate::core::SparseVector;
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// Linear kernel: K(x, y) = x^T * y
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        x.dot(y)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
