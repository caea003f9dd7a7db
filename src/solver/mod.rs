//! Binary SVM solvers
//!
//! - [`smo`]: Sequential Minimal Optimization for kernel SVMs
//! - [`dcd`]: dual coordinate descent for linear SVMs

pub mod dcd;
pub mod smo;

pub use self::dcd::*;
pub use self::smo::*;
