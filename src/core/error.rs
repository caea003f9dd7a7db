//! Error types for multiclass reduction

use crate::machine::MachineState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MulticlassError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Degenerate sub-problem at row {row}: {reason}")]
    DegenerateSubproblem { row: usize, reason: String },

    #[error("Sub-machine training failed at row {row}: {source}")]
    SubmachineTraining {
        row: usize,
        #[source]
        source: BinaryTrainingError,
    },

    #[error("Invalid state: cannot {operation} while machine is {state}")]
    InvalidState {
        operation: &'static str,
        state: MachineState,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Failures reported by a binary learner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BinaryTrainingError {
    #[error("solver did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, MulticlassError>;
