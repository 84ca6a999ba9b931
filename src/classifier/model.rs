//! Anomaly scoring on top of the trained model
//!
//! `ModelProvider` owns the load-or-train step and runs it at most once;
//! `AnomalyScorer` turns the model's decision function into a
//! non-negative risk signal.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::features::FeatureVector;
use super::train::{load_or_train, ModelArtifact, ModelSource, TrainConfig};
use super::ModelResult;

/// Anything that can place a feature vector relative to a learned
/// boundary. Negative = outlier, positive = inlier.
pub trait AnomalyModel: Send + Sync {
    fn decision_function(&self, features: &FeatureVector) -> f64;
}

impl AnomalyModel for ModelArtifact {
    fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.forest.decision_function(features)
    }
}

/// Lazily loads (or trains) the model exactly once and hands out shared
/// read-only references to it.
///
/// Concurrent first calls to [`ModelProvider::get`] serialize on the
/// internal lock, so only one of them ever trains or writes the artifact.
pub struct ModelProvider {
    path: PathBuf,
    config: TrainConfig,
    slot: Mutex<Option<(Arc<ModelArtifact>, ModelSource)>>,
}

impl ModelProvider {
    pub fn new(path: impl Into<PathBuf>, config: TrainConfig) -> Self {
        Self {
            path: path.into(),
            config,
            slot: Mutex::new(None),
        }
    }

    /// Wrap an artifact that is already in memory; nothing is read or
    /// written on disk.
    pub fn preloaded(path: impl Into<PathBuf>, artifact: ModelArtifact) -> Self {
        let config = artifact.config.clone();
        Self {
            path: path.into(),
            config,
            slot: Mutex::new(Some((Arc::new(artifact), ModelSource::Loaded))),
        }
    }

    /// The model, loading or training it on first use
    pub fn get(&self) -> ModelResult<Arc<ModelArtifact>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((model, _)) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let (artifact, source) = load_or_train(&self.path, &self.config)?;
        let model = Arc::new(artifact);
        *slot = Some((Arc::clone(&model), source));
        Ok(model)
    }

    /// How the model was obtained, once it has been
    pub fn source(&self) -> Option<ModelSource> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, source)| *source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }
}

impl std::fmt::Debug for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProvider")
            .field("path", &self.path)
            .field("source", &self.source())
            .finish()
    }
}

/// Rectified anomaly signal: 0 for inliers, growing with outlier-ness
#[derive(Clone)]
pub struct AnomalyScorer {
    model: Arc<dyn AnomalyModel>,
}

impl AnomalyScorer {
    pub fn new(model: Arc<dyn AnomalyModel>) -> Self {
        Self { model }
    }

    /// Build a scorer over the provider's model, loading it if needed
    pub fn from_provider(provider: &ModelProvider) -> ModelResult<Self> {
        let model: Arc<dyn AnomalyModel> = provider.get()?;
        Ok(Self::new(model))
    }

    /// Raw model output, before rectification
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.model.decision_function(features)
    }

    /// `max(0, -decision_function)`. Unbounded above.
    pub fn score(&self, features: &FeatureVector) -> f64 {
        let signal = -self.decision_function(features);
        // NaN never compares greater, so it rectifies to zero too
        if signal > 0.0 {
            signal
        } else {
            0.0
        }
    }
}

impl std::fmt::Debug for AnomalyScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyScorer").finish_non_exhaustive()
    }
}
