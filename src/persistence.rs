//! Saving and loading trained multiclass machines
//!
//! A saved machine is a JSON document holding the binary learner, the coding
//! matrix, the decoder and every sub-machine. Loading rebuilds it around a
//! fixed-matrix [`Ecoc`] strategy, which decodes exactly like the strategy it
//! was trained with.

use crate::coding::CodingMatrix;
use crate::core::{BinaryClassifier, MulticlassError, Result};
use crate::decoder::Decoder;
use crate::machine::{MulticlassMachine, Submachine};
use crate::strategy::{Ecoc, Strategy};
use chrono::{DateTime, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Name of the strategy the machine was trained with
    pub strategy: String,
    pub n_rows: usize,
    pub n_classes: usize,
}

/// Serializable representation of a trained multiclass machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableMachine<C, M> {
    pub metadata: ModelMetadata,
    /// The binary learner, kept so the loaded machine reports its settings
    pub classifier: C,
    pub matrix: CodingMatrix,
    pub decoder: Decoder,
    pub submachines: Vec<Submachine<M>>,
}

impl<C, M> SerializableMachine<C, M>
where
    C: BinaryClassifier<Model = M> + Clone,
    M: Clone,
{
    /// Snapshot a trained machine
    pub fn from_machine<S: Strategy>(machine: &MulticlassMachine<C, S>) -> Result<Self> {
        let matrix = machine
            .coding_matrix()
            .ok_or(MulticlassError::InvalidState {
                operation: "save",
                state: machine.state(),
            })?;

        Ok(Self {
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: Utc::now(),
                strategy: machine.strategy().name().to_string(),
                n_rows: matrix.n_rows(),
                n_classes: matrix.n_classes(),
            },
            classifier: machine.classifier().clone(),
            matrix: matrix.clone(),
            decoder: machine.strategy().decoder(),
            submachines: machine.submachines().to_vec(),
        })
    }

    /// Rebuild a trained machine that predicts like the saved one
    pub fn into_machine(self) -> Result<MulticlassMachine<C, Ecoc>> {
        if self.matrix.n_rows() != self.metadata.n_rows
            || self.matrix.n_classes() != self.metadata.n_classes
        {
            return Err(MulticlassError::SerializationError(format!(
                "metadata describes a {}x{} code but the matrix is {}x{}",
                self.metadata.n_rows,
                self.metadata.n_classes,
                self.matrix.n_rows(),
                self.matrix.n_classes()
            )));
        }

        let strategy = Ecoc::with_matrix(self.matrix.clone()).decoded_with(self.decoder);
        MulticlassMachine::from_trained_parts(
            self.classifier,
            strategy,
            self.matrix,
            self.submachines,
        )
    }
}

impl<C, M> SerializableMachine<C, M>
where
    C: Serialize + DeserializeOwned,
    M: Serialize + DeserializeOwned,
{
    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| MulticlassError::SerializationError(e.to_string()))?;
        info!("Saved {}-row model to {}", self.matrix.n_rows(), path.display());
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map_err(|e| MulticlassError::SerializationError(e.to_string()))
    }

    /// Print model summary
    pub fn print_summary(&self) {
        println!("=== Multiclass Model Summary ===");
        println!("Strategy: {}", self.metadata.strategy);
        println!("Classes: {}", self.metadata.n_classes);
        println!("Sub-machines: {}", self.submachines.len());
        println!("Decoder: {:?}", self.decoder);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at.to_rfc3339());
        for sub in &self.submachines {
            println!(
                "  row {:>3}: {} positive, {} negative",
                sub.row, sub.n_positive, sub.n_negative
            );
        }
    }
}
