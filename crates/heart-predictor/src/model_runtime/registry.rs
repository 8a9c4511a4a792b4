//! Model Registry
//!
//! Maps each supported identifier to its artifact on disk and memoizes the
//! deserialized predictor for the lifetime of the process. Concurrent first
//! use of one identifier performs a single load; different identifiers load
//! independently.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Serialize, Serializer};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::pipeline::Pipeline;
use super::runtime_trait::Predictor;
use crate::metrics;

/// The fixed set of servable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelId {
    LogReg,
    DecisionTree,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::LogReg, ModelId::DecisionTree];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::LogReg => "log_reg",
            ModelId::DecisionTree => "decision_tree",
        }
    }

    pub fn artifact_file_name(&self) -> &'static str {
        match self {
            ModelId::LogReg => "log_reg_pipeline.json",
            ModelId::DecisionTree => "decision_tree_pipeline.json",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownModel(s.to_string()))
    }
}

impl Serialize for ModelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unsupported model '{0}'")]
    UnknownModel(String),
    #[error("Model artifact not found at {}. Train and export models first.", .0.display())]
    ArtifactMissing(PathBuf),
    #[error("Model artifact at {} could not be loaded: {reason}", .path.display())]
    ArtifactInvalid { path: PathBuf, reason: String },
}

/// Turns an artifact file into a predictor.
#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    async fn load(&self, model: ModelId, path: &Path) -> Result<Arc<dyn Predictor>, RegistryError>;
}

/// Loads JSON pipeline artifacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineLoader;

#[async_trait]
impl ArtifactLoader for PipelineLoader {
    async fn load(&self, model: ModelId, path: &Path) -> Result<Arc<dyn Predictor>, RegistryError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RegistryError::ArtifactMissing(path.to_path_buf()),
            _ => RegistryError::ArtifactInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let pipeline = tokio::task::spawn_blocking(move || Pipeline::from_slice(&bytes))
            .await
            .map_err(|e| RegistryError::ArtifactInvalid {
                path: path.to_path_buf(),
                reason: format!("decoder task failed: {}", e),
            })?
            .map_err(|e| RegistryError::ArtifactInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!("Decoded pipeline '{}' for model {}", pipeline.name(), model);
        Ok(Arc::new(pipeline))
    }
}

type Slot = Arc<OnceCell<Arc<dyn Predictor>>>;

/// Process-scoped registry of loaded models.
pub struct ModelRegistry {
    models_dir: PathBuf,
    loader: Arc<dyn ArtifactLoader>,
    slots: DashMap<ModelId, Slot>,
    loads: AtomicUsize,
}

impl ModelRegistry {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(models_dir, Arc::new(PipelineLoader))
    }

    pub fn with_loader(models_dir: impl Into<PathBuf>, loader: Arc<dyn ArtifactLoader>) -> Self {
        Self {
            models_dir: models_dir.into(),
            loader,
            slots: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn artifact_path(&self, model: ModelId) -> PathBuf {
        self.models_dir.join(model.artifact_file_name())
    }

    /// Fail with `ArtifactMissing` unless the artifact file exists.
    pub async fn ensure_artifact(&self, identifier: &str) -> Result<(), RegistryError> {
        let model: ModelId = identifier.parse()?;
        self.ensure_artifact_for(model).await
    }

    async fn ensure_artifact_for(&self, model: ModelId) -> Result<(), RegistryError> {
        if self.artifact_exists(model).await {
            Ok(())
        } else {
            Err(RegistryError::ArtifactMissing(self.artifact_path(model)))
        }
    }

    async fn artifact_exists(&self, model: ModelId) -> bool {
        // An unreadable directory counts as missing.
        tokio::fs::try_exists(self.artifact_path(model)).await.unwrap_or(false)
    }

    /// Return the predictor for `identifier`, loading it on first use.
    ///
    /// Later calls return the same `Arc`. A failed load is not cached.
    pub async fn load(&self, identifier: &str) -> Result<Arc<dyn Predictor>, RegistryError> {
        let model: ModelId = identifier.parse()?;
        // Clone the slot out so the map shard is not held across the await.
        let slot: Slot = self.slots.entry(model).or_default().clone();

        let predictor = slot
            .get_or_try_init(|| async {
                self.ensure_artifact_for(model).await?;
                let path = self.artifact_path(model);
                info!("Loading model '{}' from {}", model, path.display());

                let predictor = self.loader.load(model, &path).await.map_err(|e| {
                    warn!("Failed to load model '{}': {}", model, e);
                    e
                })?;

                self.loads.fetch_add(1, Ordering::SeqCst);
                metrics::inc_model_load(model.as_str());
                let meta = predictor.metadata();
                info!(
                    "✅ Model '{}' ready: {} ({} columns, {} encoded features)",
                    model, meta.estimator, meta.input_columns, meta.encoded_features
                );
                Ok::<_, RegistryError>(predictor)
            })
            .await?;

        Ok(Arc::clone(predictor))
    }

    /// Artifact presence for every supported model. Never loads anything.
    pub async fn artifact_status(&self) -> BTreeMap<ModelId, bool> {
        let mut status = BTreeMap::new();
        for model in ModelId::ALL {
            status.insert(model, self.artifact_exists(model).await);
        }
        status
    }

    pub fn is_loaded(&self, model: ModelId) -> bool {
        self.slots
            .get(&model)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Completed deserializations since the registry was built.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_round_trip() {
        for model in ModelId::ALL {
            assert_eq!(model.as_str().parse::<ModelId>().unwrap(), model);
        }
        assert_eq!(
            "LOG_REG".parse::<ModelId>(),
            Err(RegistryError::UnknownModel("LOG_REG".to_string()))
        );
    }

    #[test]
    fn test_model_id_serializes_as_identifier() {
        let status: BTreeMap<ModelId, bool> = [(ModelId::LogReg, true), (ModelId::DecisionTree, false)].into();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({"log_reg": true, "decision_tree": false}));
    }

    #[tokio::test]
    async fn test_ensure_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path());
        let err = registry.ensure_artifact("log_reg").await.unwrap_err();
        assert_eq!(err, RegistryError::ArtifactMissing(dir.path().join("log_reg_pipeline.json")));
        assert!(err.to_string().contains("Train and export models first"));
    }

    #[tokio::test]
    async fn test_ensure_artifact_unknown() {
        let registry = ModelRegistry::new("models");
        assert!(matches!(
            registry.ensure_artifact("random_forest").await,
            Err(RegistryError::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn test_load_unknown_model() {
        let registry = ModelRegistry::new("models");
        assert!(matches!(
            registry.load("svm").await,
            Err(RegistryError::UnknownModel(name)) if name == "svm"
        ));
        assert_eq!(registry.load_count(), 0);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path());
        assert!(matches!(
            registry.load("decision_tree").await,
            Err(RegistryError::ArtifactMissing(_))
        ));
        assert!(!registry.is_loaded(ModelId::DecisionTree));
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log_reg_pipeline.json"), b"{\"name\": 3}").unwrap();
        let registry = ModelRegistry::new(dir.path());
        assert!(matches!(
            registry.load("log_reg").await,
            Err(RegistryError::ArtifactInvalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_artifact_status_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path());
        let status = registry.artifact_status().await;
        assert_eq!(status.get(&ModelId::LogReg), Some(&false));
        assert_eq!(status.get(&ModelId::DecisionTree), Some(&false));
    }

    #[tokio::test]
    async fn test_artifact_status_tracks_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("decision_tree_pipeline.json"), b"{}").unwrap();
        let registry = ModelRegistry::new(dir.path());

        let status = registry.artifact_status().await;
        assert_eq!(status.get(&ModelId::LogReg), Some(&false));
        assert_eq!(status.get(&ModelId::DecisionTree), Some(&true));
        assert!(registry.ensure_artifact("decision_tree").await.is_ok());
        assert!(!registry.is_loaded(ModelId::DecisionTree));
    }
}
