//! Multiclass classification by reduction to binary Support Vector Machines
//!
//! A [`CodingMatrix`] assigns every class a codeword over {+1, 0, -1}. One
//! binary learner is trained per matrix row on the classes that row colors,
//! and a [`Decoder`] maps the learners' combined scores back to a class.
//! One-vs-Rest, One-vs-One and error-correcting output codes (ECOC) are all
//! expressed this way.
//!
//! ```rust,no_run
//! use rsvm_multiclass::{MulticlassMachine, LinearSvm, OneVsOne, MulticlassDataset};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![-1.0, -1.0]];
//! let data = MulticlassDataset::from_dense(&rows, &[0, 1, 2])?;
//!
//! let mut machine = MulticlassMachine::new(LinearSvm::new(), OneVsOne::new());
//! machine.train(&data)?;
//! let class = machine.predict(&data.samples()[0].features)?;
//! println!("predicted class {class}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod coding;
pub mod core;
pub mod data;
pub mod decoder;
pub mod encoder;
pub mod kernel;
pub mod machine;
pub mod optimizer;
pub mod persistence;
pub mod solver;
pub mod strategy;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, ModelInfo, MulticlassSVM, TrainedModel};
pub use crate::coding::CodingMatrix;
pub use crate::core::error::*;
pub use crate::core::traits::{BinaryClassifier, BinaryModel, Dataset};
pub use crate::core::types::*;
pub use crate::data::MulticlassDataset;
pub use crate::decoder::{Decoder, LossFunction};
pub use crate::encoder::{
    Encoder, OneVsOneEncoder, OneVsRestEncoder, RandomDenseEncoder, RandomSparseEncoder,
};
pub use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel};
pub use crate::machine::{MachineState, MulticlassMachine, Submachine, TrainingConfig};
pub use crate::optimizer::{KernelSvm, LinearModel, LinearSvm, TrainedSvm};
pub use crate::persistence::SerializableMachine;
pub use crate::solver::SvmLoss;
pub use crate::strategy::{Ecoc, EncoderConfig, OneVsOne, OneVsRest, Strategy, StrategyConfig};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
