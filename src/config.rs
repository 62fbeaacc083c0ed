//! Pipeline configuration shared by the three step binaries.
//!
//! The processing platform mounts fixed directories into each step container;
//! those paths are the defaults here. Deployment-side values (execution role,
//! capture destination, control-plane endpoint) have no sensible default and
//! must be provided by a config file before the deploy step can run.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A required deployment value is absent.
    #[error("Missing required config value: {0}")]
    MissingValue(&'static str),
}

/// Recognized configuration options for all pipeline steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory containing the raw input CSV.
    pub input_dir: PathBuf,
    /// Directory receiving `train.csv`.
    pub output_dir_train: PathBuf,
    /// Directory receiving `validation.csv`.
    pub output_dir_validation: PathBuf,
    /// Directory receiving `test.csv`.
    pub output_dir_test: PathBuf,
    /// Directory containing `model.tar.gz`.
    pub model_dir: PathBuf,
    /// Directory receiving `evaluation.json`.
    pub evaluation_dir: PathBuf,
    /// Directory the model archive is extracted into.
    pub work_dir: PathBuf,
    /// Execution role ARN attached to created model resources.
    pub execution_role_arn: String,
    /// Storage URI receiving captured endpoint request/response data.
    pub capture_destination_uri: String,
    /// Base URL of the hosting control plane.
    pub control_plane_endpoint: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("/opt/ml/processing/input"),
            output_dir_train: PathBuf::from("/opt/ml/processing/train"),
            output_dir_validation: PathBuf::from("/opt/ml/processing/validation"),
            output_dir_test: PathBuf::from("/opt/ml/processing/test"),
            model_dir: PathBuf::from("/opt/ml/processing/model"),
            evaluation_dir: PathBuf::from("/opt/ml/processing/evaluation"),
            work_dir: PathBuf::from("."),
            execution_role_arn: String::new(),
            capture_destination_uri: String::new(),
            control_plane_endpoint: String::new(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the given config file, or fall back to platform defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
