//!
//! In-process predictors and the registry that owns them.
//!
//! Architecture:
//! - `runtime_trait`: the `Predictor` seam and the row layout it consumes
//! - `pipeline`: fitted preprocessing + estimator artifacts decoded from JSON
//! - `registry`: identifier → artifact path mapping with at-most-once loading
pub mod runtime_trait;
pub mod pipeline;
pub mod registry;
pub use runtime_trait::{FeatureFrame, FeatureValue, InferenceError, Predictor, PredictorMetadata};
pub use pipeline::{ArtifactError, ColumnTransform, Estimator, Pipeline, PipelineArtifact, Preprocessor, TreeNode};
pub use registry::{ArtifactLoader, ModelId, ModelRegistry, PipelineLoader, RegistryError};
