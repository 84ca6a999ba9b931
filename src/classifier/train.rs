//! Training and persistence for the anomaly model
//!
//! The model is fitted once on the bootstrap dataset and written to a
//! single JSON artifact. Later runs load that artifact instead of
//! retraining. A present-but-unreadable artifact is an error, never a
//! reason to silently retrain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::bootstrap::{bootstrap_dataset, BOOTSTRAP_VERSION};
use super::features::FeatureName;
use super::isolation_forest::IsolationForest;
use super::{ModelError, ModelResult};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Rows drawn (without replacement) per tree; capped at the dataset size
    pub max_samples: usize,
    /// Expected outlier fraction, sets the decision boundary
    pub contamination: f64,
    /// RNG seed, fixed so training is reproducible
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.3,
            seed: 42,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidConfig("n_estimators must be at least 1".into()));
        }
        if self.max_samples < 2 {
            return Err(ModelError::InvalidConfig("max_samples must be at least 2".into()));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ModelError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

/// How a model came to be in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// Read from an existing artifact
    Loaded,
    /// Fitted in this process and written to disk
    Trained,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Loaded => write!(f, "loaded"),
            ModelSource::Trained => write!(f, "trained"),
        }
    }
}

/// The persisted model plus the metadata needed to trust it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature names in the positional order the forest was fitted on
    pub schema: Vec<String>,
    pub bootstrap_version: u32,
    pub trained_at: DateTime<Utc>,
    pub config: TrainConfig,
    pub forest: IsolationForest,
}

impl ModelArtifact {
    /// Read an artifact and check it against the compiled feature schema
    pub fn load(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&content).map_err(|source| ModelError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact as pretty JSON, creating parent directories.
    ///
    /// The JSON goes to a sibling temp file that is then renamed over
    /// `path`, so readers see either the old artifact or the new one,
    /// never a partial write.
    pub fn save(&self, path: &Path) -> ModelResult<()> {
        let io_err = |source: std::io::Error| ModelError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(ModelError::Serialize)?;

        let tmp_file = temp_path(path);
        if let Err(source) = std::fs::write(&tmp_file, content)
            .and_then(|()| std::fs::rename(&tmp_file, path))
        {
            let _ = std::fs::remove_file(&tmp_file);
            return Err(io_err(source));
        }
        Ok(())
    }

    fn validate(&self) -> ModelResult<()> {
        let expected = FeatureName::schema();
        if self.schema != expected {
            return Err(ModelError::SchemaMismatch {
                expected,
                found: self.schema.clone(),
            });
        }
        if self.bootstrap_version != BOOTSTRAP_VERSION {
            tracing::warn!(
                "model was trained on bootstrap v{}, current is v{}; delete the artifact to retrain",
                self.bootstrap_version,
                BOOTSTRAP_VERSION
            );
        }
        self.forest.validate()
    }
}

/// Fit a fresh model on the bootstrap dataset
pub fn train(config: &TrainConfig) -> ModelResult<ModelArtifact> {
    let data = bootstrap_dataset();
    tracing::info!(
        "Training anomaly model on {} bootstrap rows (v{}), {} trees, contamination {}",
        data.len(),
        BOOTSTRAP_VERSION,
        config.n_estimators,
        config.contamination
    );

    let forest = IsolationForest::fit(&data, config)?;

    Ok(ModelArtifact {
        schema: FeatureName::schema(),
        bootstrap_version: BOOTSTRAP_VERSION,
        trained_at: Utc::now(),
        config: config.clone(),
        forest,
    })
}

/// Unique per process and per save, so concurrent writers never share
/// a temp file
fn temp_path(path: &Path) -> PathBuf {
    static SAVES: AtomicU64 = AtomicU64::new(0);
    let n = SAVES.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.tmp", std::process::id(), n));
    path.with_file_name(name)
}

/// Fit a fresh model and persist it at `path`, overwriting any artifact
pub fn train_and_save(path: &Path, config: &TrainConfig) -> ModelResult<ModelArtifact> {
    let artifact = train(config)?;
    artifact.save(path)?;
    tracing::info!("Model saved to {}", path.display());
    Ok(artifact)
}

/// Load the artifact at `path`, training and saving one if it is absent
pub fn load_or_train(path: &Path, config: &TrainConfig) -> ModelResult<(ModelArtifact, ModelSource)> {
    match std::fs::metadata(path) {
        Ok(_) => {
            let artifact = ModelArtifact::load(path)?;
            tracing::info!("Loaded anomaly model from {}", path.display());
            Ok((artifact, ModelSource::Loaded))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No model at {}, training", path.display());
            let artifact = train_and_save(path, config)?;
            Ok((artifact, ModelSource::Trained))
        }
        Err(source) => Err(ModelError::Io {
            path: PathBuf::from(path),
            source,
        }),
    }
}
