//! Feature extraction and anomaly model for profile risk
//!
//! Architecture: profile signals → 5 fixed features → isolation forest →
//! rectified anomaly signal.
//!
//! The forest is fitted once on a tiny synthetic dataset (see
//! [`bootstrap`]) and persisted as JSON; every later run loads it.

pub mod bootstrap;
pub mod features;
pub mod isolation_forest;
pub mod model;
pub mod train;

pub use bootstrap::{bootstrap_dataset, BOOTSTRAP_VERSION};
pub use features::{FeatureExtractor, FeatureName, FeatureVector, FEATURE_COUNT};
pub use isolation_forest::IsolationForest;
pub use model::{AnomalyModel, AnomalyScorer, ModelProvider};
pub use train::{load_or_train, train, train_and_save, ModelArtifact, ModelSource, TrainConfig};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from training, loading or saving the anomaly model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to access model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model was trained on features {found:?} but this build extracts {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("need at least 2 training rows, got {0}")]
    InsufficientData(usize),

    #[error("failed to serialize model: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
