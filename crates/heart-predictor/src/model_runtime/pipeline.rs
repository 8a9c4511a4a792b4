//! Fitted preprocessing + estimator pipelines.
//!
//! An artifact is a JSON document produced by the training side. It carries
//! the column transforms (standard scaling for numeric columns, one-hot
//! encoding for categorical ones) and a binary estimator, either a logistic
//! regression or a decision tree.

use serde::{Deserialize, Serialize};

use super::runtime_trait::{FeatureFrame, FeatureValue, InferenceError, Predictor, PredictorMetadata};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("malformed artifact: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Serialized form of a fitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub name: String,
    pub classes: Vec<i64>,
    pub preprocessor: Preprocessor,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub columns: Vec<ColumnTransform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnTransform {
    /// `(x - mean) / scale`
    Numeric { name: String, mean: f64, scale: f64 },
    /// One indicator per category; an unseen category encodes to all zeros.
    Categorical { name: String, categories: Vec<String> },
}

impl ColumnTransform {
    pub fn name(&self) -> &str {
        match self {
            ColumnTransform::Numeric { name, .. } | ColumnTransform::Categorical { name, .. } => name,
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnTransform::Numeric { .. } => 1,
            ColumnTransform::Categorical { categories, .. } => categories.len(),
        }
    }

    fn encode(&self, value: &FeatureValue, out: &mut Vec<f64>) -> Result<(), InferenceError> {
        match (self, value) {
            (ColumnTransform::Numeric { mean, scale, .. }, FeatureValue::Number(x)) => {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                out.push((x - mean) / scale);
                Ok(())
            }
            (ColumnTransform::Categorical { categories, .. }, FeatureValue::Category(c)) => {
                out.extend(categories.iter().map(|cat| if cat == c { 1.0 } else { 0.0 }));
                Ok(())
            }
            (ColumnTransform::Numeric { name, .. }, other) => Err(InferenceError::ColumnType {
                column: name.clone(),
                expected: "numeric",
                actual: other.kind(),
            }),
            (ColumnTransform::Categorical { name, .. }, other) => Err(InferenceError::ColumnType {
                column: name.clone(),
                expected: "categorical",
                actual: other.kind(),
            }),
        }
    }
}

impl Preprocessor {
    /// Encode every row of `frame` into a dense feature vector.
    pub fn transform(&self, frame: &FeatureFrame) -> Result<Vec<Vec<f64>>, InferenceError> {
        let mut indices = Vec::with_capacity(self.columns.len());
        let mut missing = Vec::new();
        for column in &self.columns {
            match frame.column_index(column.name()) {
                Some(idx) => indices.push(idx),
                None => missing.push(column.name().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(InferenceError::MissingColumn(missing.join(", ")));
        }

        let width = self.output_width();
        frame
            .rows()
            .iter()
            .map(|row| -> Result<Vec<f64>, InferenceError> {
                let mut encoded = Vec::with_capacity(width);
                for (column, &idx) in self.columns.iter().zip(&indices) {
                    let value = row.get(idx).ok_or_else(|| {
                        InferenceError::Internal(format!("row is shorter than column '{}'", column.name()))
                    })?;
                    column.encode(value, &mut encoded)?;
                }
                Ok(encoded)
            })
            .collect()
    }

    pub fn output_width(&self) -> usize {
        self.columns.iter().map(ColumnTransform::width).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
    DecisionTree { nodes: Vec<TreeNode> },
}

/// A decision tree node. Leaves have `left == right == -1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    pub left: i64,
    pub right: i64,
    /// Per-class weights at this node.
    pub value: Vec<f64>,
}

impl TreeNode {
    fn is_leaf(&self) -> bool {
        self.left < 0 && self.right < 0
    }
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::LogisticRegression { .. } => "logistic_regression",
            Estimator::DecisionTree { .. } => "decision_tree",
        }
    }

    /// Probability of `[class 0, class 1]` for one encoded row.
    fn probabilities(&self, x: &[f64]) -> Result<[f64; 2], InferenceError> {
        match self {
            Estimator::LogisticRegression { coefficients, intercept } => {
                if coefficients.len() != x.len() {
                    return Err(InferenceError::ShapeMismatch {
                        expected: coefficients.len(),
                        actual: x.len(),
                    });
                }
                let z: f64 = coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + intercept;
                let p1 = 1.0 / (1.0 + (-z).exp());
                Ok([1.0 - p1, p1])
            }
            Estimator::DecisionTree { nodes } => {
                let leaf = descend(nodes, x)?;
                normalize(&leaf.value)
            }
        }
    }
}

fn descend<'a>(nodes: &'a [TreeNode], x: &[f64]) -> Result<&'a TreeNode, InferenceError> {
    let mut idx = 0usize;
    // A well-formed tree reaches a leaf in fewer steps than it has nodes.
    for _ in 0..=nodes.len() {
        let node = nodes
            .get(idx)
            .ok_or_else(|| InferenceError::Internal(format!("tree node {} does not exist", idx)))?;
        if node.is_leaf() {
            return Ok(node);
        }
        let value = x.get(node.feature).ok_or(InferenceError::ShapeMismatch {
            expected: node.feature + 1,
            actual: x.len(),
        })?;
        let next = if *value <= node.threshold { node.left } else { node.right };
        idx = usize::try_from(next)
            .map_err(|_| InferenceError::Internal(format!("tree node {} has a dangling child", idx)))?;
    }
    Err(InferenceError::Internal("tree traversal did not reach a leaf".to_string()))
}

fn normalize(weights: &[f64]) -> Result<[f64; 2], InferenceError> {
    let [w0, w1] = weights else {
        return Err(InferenceError::Internal(format!(
            "leaf holds {} class weights, expected 2",
            weights.len()
        )));
    };
    let total = w0 + w1;
    if !(total.is_finite() && total > 0.0) || *w0 < 0.0 || *w1 < 0.0 {
        return Err(InferenceError::Internal("leaf class weights are not a distribution".to_string()));
    }
    Ok([w0 / total, w1 / total])
}

/// In-memory pipeline ready to score frames.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    classes: [i64; 2],
    preprocessor: Preprocessor,
    estimator: Estimator,
}

impl Pipeline {
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, ArtifactError> {
        let classes: [i64; 2] = artifact.classes.as_slice().try_into().map_err(|_| {
            ArtifactError::Invalid(format!(
                "binary classifier needs exactly 2 classes, found {}",
                artifact.classes.len()
            ))
        })?;
        if artifact.preprocessor.columns.is_empty() {
            return Err(ArtifactError::Invalid("preprocessor declares no columns".to_string()));
        }
        if let Estimator::DecisionTree { nodes } = &artifact.estimator {
            if nodes.is_empty() {
                return Err(ArtifactError::Invalid("decision tree has no nodes".to_string()));
            }
        }

        Ok(Self {
            name: artifact.name,
            classes,
            preprocessor: artifact.preprocessor,
            estimator: artifact.estimator,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: PipelineArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Predictor for Pipeline {
    fn classes(&self) -> [i64; 2] {
        self.classes
    }

    fn predict_proba(&self, frame: &FeatureFrame) -> Result<Vec<[f64; 2]>, InferenceError> {
        self.preprocessor
            .transform(frame)?
            .iter()
            .map(|x| self.estimator.probabilities(x))
            .collect()
    }

    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<i64>, InferenceError> {
        Ok(self
            .predict_proba(frame)?
            .into_iter()
            .map(|[p0, p1]| if p1 > p0 { self.classes[1] } else { self.classes[0] })
            .collect())
    }

    fn metadata(&self) -> PredictorMetadata {
        PredictorMetadata {
            name: self.name.clone(),
            estimator: self.estimator.kind(),
            input_columns: self.preprocessor.columns.len(),
            encoded_features: self.preprocessor.output_width(),
        }
    }
}
