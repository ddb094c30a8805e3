use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tabml_core::{MlError, MlResult};

use crate::trainer::TrainerConfig;

/// Everything one experiment run needs besides its pipeline shape.
///
/// Each program supplies its own defaults; a JSON document can override
/// any subset of the fields with [`ExperimentConfig::with_overrides`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub path: PathBuf,
    pub delimiter: char,
    pub has_header: bool,
    pub test_fraction: f64,
    pub folds: usize,
    pub seed: Option<u64>,
    pub trainer: TrainerConfig,
}

impl ExperimentConfig {
    pub fn new(path: impl Into<PathBuf>, trainer: TrainerConfig) -> Self {
        ExperimentConfig {
            path: path.into(),
            delimiter: ',',
            has_header: true,
            test_fraction: 0.2,
            folds: 5,
            seed: Some(42),
            trainer,
        }
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> MlResult<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(MlError::InvalidConfig(format!(
                "delimiter {:?} is not a single-byte character",
                self.delimiter
            )))
        }
    }

    /// Replace the fields present in `overrides` (a JSON object) and keep
    /// the rest. A `trainer` override replaces the whole trainer section.
    pub fn with_overrides(&self, overrides: &str) -> MlResult<Self> {
        let patch: serde_json::Value =
            serde_json::from_str(overrides).map_err(|e| MlError::Serialization(e.to_string()))?;
        let patch = match patch {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(MlError::InvalidConfig(format!(
                    "config overrides must be a JSON object, got {}",
                    other
                )))
            }
        };

        let mut merged = serde_json::to_value(self).map_err(|e| MlError::Serialization(e.to_string()))?;
        if let serde_json::Value::Object(base) = &mut merged {
            for (key, value) in patch {
                if !base.contains_key(&key) {
                    return Err(MlError::InvalidConfig(format!("unknown config field '{}'", key)));
                }
                base.insert(key, value);
            }
        }
        let config: ExperimentConfig =
            serde_json::from_value(merged).map_err(|e| MlError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MlResult<()> {
        self.delimiter_byte()?;
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(MlError::InvalidConfig(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.folds < 2 {
            return Err(MlError::InvalidConfig(format!(
                "folds must be at least 2, got {}",
                self.folds
            )));
        }
        Ok(())
    }
}
