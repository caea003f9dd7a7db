//! Serializable strategy configuration

use crate::core::{MulticlassError, Result};
use crate::decoder::Decoder;
use crate::encoder::{
    OneVsOneEncoder, OneVsRestEncoder, RandomDenseEncoder, RandomSparseEncoder,
    DEFAULT_MAX_TRIALS,
};
use crate::strategy::{Ecoc, OneVsOne, OneVsRest, Strategy};
use serde::{Deserialize, Serialize};

/// Which code generator an ECOC strategy uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncoderConfig {
    RandomDense {
        code_length: Option<usize>,
        #[serde(default = "default_max_trials")]
        max_trials: usize,
        #[serde(default)]
        seed: u64,
    },
    RandomSparse {
        code_length: Option<usize>,
        #[serde(default = "default_max_trials")]
        max_trials: usize,
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_zero_probability")]
        zero_probability: f64,
    },
    OneVsRestMimic,
    OneVsOneMimic,
}

fn default_max_trials() -> usize {
    DEFAULT_MAX_TRIALS
}

fn default_zero_probability() -> f64 {
    0.5
}

/// Strategy selection as plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyConfig {
    #[default]
    OneVsRest,
    OneVsOne,
    Ecoc {
        encoder: EncoderConfig,
        /// Falls back to hinge-loss decoding
        decoder: Option<Decoder>,
    },
}

impl StrategyConfig {
    /// Check parameter ranges without generating anything
    pub fn validate(&self) -> Result<()> {
        let StrategyConfig::Ecoc { encoder, .. } = self else {
            return Ok(());
        };

        let (code_length, max_trials) = match encoder {
            EncoderConfig::RandomDense {
                code_length,
                max_trials,
                ..
            } => (*code_length, *max_trials),
            EncoderConfig::RandomSparse {
                code_length,
                max_trials,
                zero_probability,
                ..
            } => {
                if !(0.0..1.0).contains(zero_probability) {
                    return Err(MulticlassError::Configuration(format!(
                        "zero probability must be in [0, 1), got {zero_probability}"
                    )));
                }
                (*code_length, *max_trials)
            }
            EncoderConfig::OneVsRestMimic | EncoderConfig::OneVsOneMimic => return Ok(()),
        };

        if code_length == Some(0) {
            return Err(MulticlassError::Configuration(
                "code length must be positive".to_string(),
            ));
        }
        if max_trials == 0 {
            return Err(MulticlassError::Configuration(
                "at least one trial is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and instantiate the strategy
    pub fn build(&self) -> Result<Box<dyn Strategy>> {
        self.validate()?;

        let strategy: Box<dyn Strategy> = match self {
            StrategyConfig::OneVsRest => Box::new(OneVsRest::new()),
            StrategyConfig::OneVsOne => Box::new(OneVsOne::new()),
            StrategyConfig::Ecoc { encoder, decoder } => {
                let ecoc = match encoder.clone() {
                    EncoderConfig::RandomDense {
                        code_length,
                        max_trials,
                        seed,
                    } => {
                        let mut e = RandomDenseEncoder::new(seed).with_max_trials(max_trials);
                        if let Some(n) = code_length {
                            e = e.with_code_length(n);
                        }
                        Ecoc::with_encoder(e)
                    }
                    EncoderConfig::RandomSparse {
                        code_length,
                        max_trials,
                        seed,
                        zero_probability,
                    } => {
                        let mut e = RandomSparseEncoder::new(seed)
                            .with_max_trials(max_trials)
                            .with_zero_probability(zero_probability);
                        if let Some(n) = code_length {
                            e = e.with_code_length(n);
                        }
                        Ecoc::with_encoder(e)
                    }
                    EncoderConfig::OneVsRestMimic => Ecoc::with_encoder(OneVsRestEncoder),
                    EncoderConfig::OneVsOneMimic => Ecoc::with_encoder(OneVsOneEncoder),
                };
                Box::new(ecoc.decoded_with(decoder.unwrap_or_default()))
            }
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_variants() {
        let ovr = StrategyConfig::OneVsRest.build().unwrap();
        assert_eq!(ovr.name(), "one-vs-rest");
        assert_eq!(ovr.coding_matrix(4).unwrap().n_rows(), 4);

        let ovo = StrategyConfig::OneVsOne.build().unwrap();
        assert_eq!(ovo.coding_matrix(4).unwrap().n_rows(), 6);

        let ecoc = StrategyConfig::Ecoc {
            encoder: EncoderConfig::RandomDense {
                code_length: Some(9),
                max_trials: 20,
                seed: 11,
            },
            decoder: Some(Decoder::Hamming),
        }
        .build()
        .unwrap();
        assert_eq!(ecoc.coding_matrix(4).unwrap().n_rows(), 9);
        assert_eq!(ecoc.decoder(), Decoder::Hamming);
    }

    #[test]
    fn test_rejects_zero_code_length() {
        let config = StrategyConfig::Ecoc {
            encoder: EncoderConfig::RandomSparse {
                code_length: Some(0),
                max_trials: 10,
                seed: 0,
                zero_probability: 0.5,
            },
            decoder: None,
        };
        assert!(matches!(
            config.build(),
            Err(MulticlassError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_bad_zero_probability() {
        let config = StrategyConfig::Ecoc {
            encoder: EncoderConfig::RandomSparse {
                code_length: None,
                max_trials: 10,
                seed: 0,
                zero_probability: -0.1,
            },
            decoder: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_configuration() {
        let json = r#"{
            "strategy": "ecoc",
            "encoder": { "type": "random_dense", "code_length": 12, "seed": 3 },
            "decoder": { "Loss": "Exponential" }
        }"#;
        let config: StrategyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            StrategyConfig::Ecoc {
                encoder: EncoderConfig::RandomDense {
                    code_length: Some(12),
                    max_trials: DEFAULT_MAX_TRIALS,
                    seed: 3,
                },
                decoder: Some(Decoder::Loss(crate::decoder::LossFunction::Exponential)),
            }
        );

        let ovo: StrategyConfig = serde_json::from_str(r#"{"strategy":"one_vs_one"}"#).unwrap();
        assert_eq!(ovo, StrategyConfig::OneVsOne);
    }
}
