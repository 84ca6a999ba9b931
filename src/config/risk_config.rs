//! Scorer configuration support
//!
//! Loads configuration from `profile-risk.toml` in the working directory
//! (or an explicit path), then applies the environment override.
//!
//! # Configuration Format
//!
//! ```toml
//! # profile-risk.toml
//!
//! [model]
//! path = "risk_model.json"   # artifact location, relative to the working dir
//! n_estimators = 100
//! max_samples = 256
//! contamination = 0.3
//! seed = 42
//! ```
//!
//! Priority for the artifact path: `--model` flag, then
//! `PROFILE_RISK_MODEL`, then the file, then the default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::classifier::TrainConfig;

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "profile-risk.toml";

/// Environment variable overriding the artifact path
pub const MODEL_PATH_ENV: &str = "PROFILE_RISK_MODEL";

/// Default artifact file, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "risk_model.json";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub model: ModelConfig,
}

/// Where the model lives and how to train it when it is missing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,

    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    #[serde(default = "default_contamination")]
    pub contamination: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            n_estimators: default_n_estimators(),
            max_samples: default_max_samples(),
            contamination: default_contamination(),
            seed: default_seed(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_n_estimators() -> usize {
    TrainConfig::default().n_estimators
}

fn default_max_samples() -> usize {
    TrainConfig::default().max_samples
}

fn default_contamination() -> f64 {
    TrainConfig::default().contamination
}

fn default_seed() -> u64 {
    TrainConfig::default().seed
}

impl ModelConfig {
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            n_estimators: self.n_estimators,
            max_samples: self.max_samples,
            contamination: self.contamination,
            seed: self.seed,
        }
    }
}

impl RiskConfig {
    /// Replace the artifact path when an override is present and non-empty
    pub fn apply_model_override(&mut self, path: Option<&Path>) {
        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            debug!("Model path overridden to {}", path.display());
            self.model.path = path.to_path_buf();
        }
    }

    /// Apply `PROFILE_RISK_MODEL` if set
    pub fn apply_env(&mut self) {
        let value = std::env::var_os(MODEL_PATH_ENV).map(PathBuf::from);
        self.apply_model_override(value.as_deref());
    }
}

/// Load configuration from an explicit file. Errors are returned, not
/// swallowed: the caller asked for this file.
pub fn load_config_file(path: &Path) -> anyhow::Result<RiskConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: RiskConfig = toml::from_str(&content)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load `profile-risk.toml` from `dir`, falling back to defaults when it
/// is missing or unreadable
pub fn load_risk_config(dir: &Path) -> RiskConfig {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        match load_config_file(&path) {
            Ok(config) => return config,
            Err(e) => warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    debug!("No config found, using defaults");
    RiskConfig::default()
}
