//! Polynomial kernel: K(x, y) = (γ * <x, y> + r)^d

use crate::core::SparseVector;
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolynomialKernel {
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: u32,
}

impl PolynomialKernel {
    /// # Panics
    /// Panics if degree is zero or gamma is not positive
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Self {
        assert!(degree > 0, "Polynomial degree must be positive");
        assert!(gamma > 0.0, "Gamma must be positive");

        Self {
            gamma,
            coef0,
            degree,
        }
    }

    /// (γ * <x,y> + 1)²
    pub fn quadratic(gamma: f64) -> Self {
        Self::new(2, gamma, 1.0)
    }
}

impl Default for PolynomialKernel {
    fn default() -> Self {
        Self::new(3, 1.0, 1.0)
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * x.dot(y) + self.coef0).powi(self.degree as i32)
    }

    fn name(&self) -> &'static str {
        "polynomial"
    }
}
