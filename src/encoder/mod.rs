//! Coding matrix generators
//!
//! An [`Encoder`] turns a class count into a [`CodingMatrix`]. Code length
//! and seed are encoder fields, so `generate` is a pure function of the
//! encoder's configuration and K.

pub mod random;

pub use self::random::*;

use crate::coding::CodingMatrix;
use crate::core::Result;

/// Produces coding matrices for a given number of classes
pub trait Encoder: Send + Sync {
    /// Generate an L x K coding matrix
    fn generate(&self, n_classes: usize) -> Result<CodingMatrix>;

    /// Short identifier used in logs and saved models
    fn name(&self) -> &'static str;
}

/// Encoder mirroring the One-vs-Rest matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct OneVsRestEncoder;

impl Encoder for OneVsRestEncoder {
    fn generate(&self, n_classes: usize) -> Result<CodingMatrix> {
        CodingMatrix::one_vs_rest(n_classes)
    }

    fn name(&self) -> &'static str {
        "ovr"
    }
}

/// Encoder mirroring the One-vs-One matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct OneVsOneEncoder;

impl Encoder for OneVsOneEncoder {
    fn generate(&self, n_classes: usize) -> Result<CodingMatrix> {
        CodingMatrix::one_vs_one(n_classes)
    }

    fn name(&self) -> &'static str {
        "ovo"
    }
}
