use serde::Serialize;

/// One cell of a feature row.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    pub fn category(value: &str) -> Self {
        FeatureValue::Category(value.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Number(_) => "numeric",
            FeatureValue::Category(_) => "categorical",
        }
    }
}

/// Named columns and their rows, laid out the way fitted pipelines read them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureFrame {
    /// Frame with exactly one row; column order follows `cells`.
    pub fn single_row<S: AsRef<str>>(cells: Vec<(S, FeatureValue)>) -> Self {
        let (columns, row): (Vec<String>, Vec<FeatureValue>) = cells
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value))
            .unzip();
        Self {
            columns,
            rows: vec![row],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Failures raised while scoring a frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("columns are missing: {0}")]
    MissingColumn(String),
    #[error("column '{column}' expected a {expected} value, got {actual}")]
    ColumnType {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("X has {actual} features, but the estimator is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictorMetadata {
    pub name: String,
    pub estimator: &'static str,
    pub input_columns: usize,
    pub encoded_features: usize,
}

/// A deserialized binary classifier.
///
/// Both operations are synchronous and CPU-bound; callers on the async
/// runtime should run them on the blocking pool.
pub trait Predictor: Send + Sync {
    /// Class labels in output order; index 1 is the positive class.
    fn classes(&self) -> [i64; 2];

    /// Per-row probability for each of the two classes.
    fn predict_proba(&self, frame: &FeatureFrame) -> Result<Vec<[f64; 2]>, InferenceError>;

    /// Per-row predicted class label.
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<i64>, InferenceError>;

    fn metadata(&self) -> PredictorMetadata;
}
