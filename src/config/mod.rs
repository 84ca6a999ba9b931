//! Configuration module for profile-risk
//!
//! This module handles:
//! - Scorer configuration (profile-risk.toml)
//! - Model artifact location and training parameters
//! - Environment overrides

mod risk_config;

pub use risk_config::{
    load_config_file, load_risk_config, ModelConfig, RiskConfig, CONFIG_FILE_NAME,
    DEFAULT_MODEL_PATH, MODEL_PATH_ENV,
};
