//! Configuration models for flexion.
//!
//! Every tunable lives here: endpoint and storage targets, training
//! hyperparameters, output location. All sections are optional in the TOML
//! file; omitted fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for flexion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Classification endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Object storage configuration (training data uploads)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Training hyperparameters
    #[serde(default)]
    pub training: TrainingConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote classification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the inference service
    #[serde(default = "default_endpoint_base_url")]
    pub base_url: String,

    /// Endpoint name (path segment in the invocation URL)
    #[serde(default = "default_endpoint_name")]
    pub name: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum invocation attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base unit for exponential backoff, in seconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    /// Bearer token (optional, can be omitted for local endpoints)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the bearer token
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_endpoint_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_endpoint_name() -> String {
    "flex-classifier".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_endpoint_base_url(),
            name: default_endpoint_name(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base(),
            api_key: None,
            api_key_env: None,
        }
    }
}

/// S3-style object storage for raw training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage service
    #[serde(default = "default_storage_base_url")]
    pub base_url: String,

    /// Bucket receiving training data
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum upload attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base unit for exponential backoff, in seconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    /// Bearer token (optional, can be omitted for local storage)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the bearer token
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_storage_base_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_bucket() -> String {
    "flex-sensor-data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_storage_base_url(),
            bucket: default_bucket(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base(),
            api_key: None,
            api_key_env: None,
        }
    }
}

/// Training hyperparameters.
///
/// Defaults mirror the production model: 100 bagged trees, depth 10,
/// at least 5 samples per split, 80/20 train/test, 5-fold CV, seed 42.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for the test partition
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Number of cross-validation folds
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Number of trees in the ensemble
    #[serde(default = "default_trees")]
    pub trees: usize,

    /// Maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Minimum samples required to split a node
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// RNG seed for splits, folds and bootstrap sampling
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_cv_folds() -> usize {
    5
}

fn default_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    10
}

fn default_min_samples_split() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: default_test_ratio(),
            cv_folds: default_cv_folds(),
            trees: default_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            seed: default_seed(),
        }
    }
}

impl TrainingConfig {
    /// Range-check the hyperparameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.cv_folds < 2 {
            return Err(ConfigError::Invalid(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.trees == 0 {
            return Err(ConfigError::Invalid("trees must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        Ok(())
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the model artifact
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Sanity-check the loaded configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.training.validate()?;
        resolve_token("endpoint", &self.endpoint.api_key, &self.endpoint.api_key_env)?;
        resolve_token("storage", &self.storage.api_key, &self.storage.api_key_env)?;
        Ok(())
    }
}

/// Resolve a bearer token from config value or named environment variable.
///
/// Returns `Ok(None)` when no token is configured at all, which is valid for
/// local unauthenticated services. A configured env var that is unset is an
/// error: the operator asked for auth and it cannot be satisfied.
pub fn resolve_token(
    section: &str,
    api_key: &Option<String>,
    api_key_env: &Option<String>,
) -> Result<Option<String>, ConfigError> {
    if let Some(key) = api_key {
        return Ok(Some(key.clone()));
    }

    if let Some(env_var) = api_key_env {
        return match std::env::var(env_var) {
            Ok(key) => Ok(Some(key)),
            Err(_) => Err(ConfigError::MissingApiKey {
                section: section.to_string(),
                env_var: env_var.clone(),
            }),
        };
    }

    Ok(None)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key for [{section}]: set {env_var} env var or api_key in config")]
    MissingApiKey { section: String, env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
