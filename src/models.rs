//! Regression models consumed by the predictor.
//!
//! This module contains:
//! - [`Regressor`]: the interface the fallback chain drives (predict, optional
//!   expected width, pipeline capability).
//! - [`ModelArtifact`]: JSON model documents (`linear`, `random_forest`,
//!   `pipeline`) and [`load_model`].
//! - linfa interop: fitted `linfa_linear` regressions implement [`Regressor`]
//!   and convert into a [`LinearModel`] artifact.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use linfa::prelude::*;
use linfa_linear::FittedLinearRegression;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or running a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model file could not be opened.
    #[error("cannot read model {path}: {source}")]
    Io {
        /// Model path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The model file is not a valid model document.
    #[error("cannot decode model {path}: {source}")]
    Decode {
        /// Model path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The input matrix has the wrong number of columns.
    #[error("expected {expected} features, got {found}")]
    Shape {
        /// Width the model was built for.
        expected: usize,
        /// Width it was given.
        found: usize,
    },

    /// The model document is internally inconsistent.
    #[error("malformed model: {0}")]
    Malformed(String),
}

/// A fitted regressor.
pub trait Regressor: Send + Sync {
    /// One prediction per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;

    /// Input width the model expects, when it records one.
    fn n_features_in(&self) -> Option<usize> {
        None
    }

    /// Whether the model carries its own preprocessing steps.
    fn is_pipeline(&self) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Model documents
// ─────────────────────────────────────────────────────────────────────────────

/// A serialized model, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Ordinary linear model.
    Linear(LinearModel),
    /// Averaged regression trees.
    RandomForest(RandomForestModel),
    /// Preprocessing steps followed by a nested estimator.
    Pipeline(PipelineModel),
}

/// `y = intercept + x · coefficients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Constant term.
    pub intercept: f64,
    /// One weight per input column.
    pub coefficients: Vec<f64>,
}

/// Mean of the tree predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    /// Input width the forest was trained on.
    pub n_features_in: usize,
    /// Regression trees.
    pub trees: Vec<TreeNode>,
}

/// A regression tree node; `x[feature_idx] <= threshold` goes left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split.
    Node {
        /// Column tested at this node.
        feature_idx: usize,
        /// Split value.
        threshold: f64,
        /// Subtree for `x <= threshold`.
        left: Box<TreeNode>,
        /// Subtree for `x > threshold`.
        right: Box<TreeNode>,
    },
    /// Terminal node. Extra fields such as sample counts are ignored.
    Leaf {
        /// Predicted value.
        value: f64,
    },
}

/// Preprocessing steps applied in order before the estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineModel {
    /// Steps, each demanding an exact input width.
    pub steps: Vec<PipelineStep>,
    /// Final estimator.
    pub estimator: Box<ModelArtifact>,
}

/// One pipeline step, tagged by `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    /// Keep the columns whose variance passed the threshold.
    VarianceThreshold {
        /// Column mask.
        support: Vec<bool>,
    },
    /// Keep the k best-scoring columns.
    SelectKBest {
        /// Column mask.
        support: Vec<bool>,
    },
    /// `(x - mean) / scale` per column.
    StandardScaler {
        /// Column means.
        mean: Vec<f64>,
        /// Column scales; zero is treated as one.
        scale: Vec<f64>,
    },
}

/// Load a model document from `path`.
///
/// ```no_run
/// use qsar_predict::models::{load_model, Regressor};
///
/// let model = load_model("model.json")?;
/// println!("expects {:?} columns", model.n_features_in());
/// # Ok::<(), qsar_predict::models::ModelError>(())
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelArtifact, ModelError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model: ModelArtifact =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ModelError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    model.validate()?;
    Ok(model)
}

impl ModelArtifact {
    /// Structural checks that do not depend on the input.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            ModelArtifact::Linear(_) => Ok(()),
            ModelArtifact::RandomForest(rf) => {
                if rf.trees.is_empty() {
                    return Err(ModelError::Malformed("random forest has no trees".into()));
                }
                Ok(())
            }
            ModelArtifact::Pipeline(p) => {
                for step in &p.steps {
                    if let PipelineStep::StandardScaler { mean, scale } = step {
                        if mean.len() != scale.len() {
                            return Err(ModelError::Malformed(format!(
                                "scaler has {} means and {} scales",
                                mean.len(),
                                scale.len()
                            )));
                        }
                    }
                }
                p.estimator.validate()
            }
        }
    }
}

impl Regressor for ModelArtifact {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        match self {
            ModelArtifact::Linear(m) => m.predict(x),
            ModelArtifact::RandomForest(m) => m.predict(x),
            ModelArtifact::Pipeline(m) => m.predict(x),
        }
    }

    fn n_features_in(&self) -> Option<usize> {
        match self {
            ModelArtifact::Linear(m) => m.n_features_in(),
            ModelArtifact::RandomForest(m) => m.n_features_in(),
            ModelArtifact::Pipeline(m) => m.n_features_in(),
        }
    }

    fn is_pipeline(&self) -> bool {
        matches!(self, ModelArtifact::Pipeline(_))
    }
}

fn check_width(expected: usize, x: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::Shape {
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

impl Regressor for LinearModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        check_width(self.coefficients.len(), &x)?;
        let w = Array1::from_vec(self.coefficients.clone());
        Ok(x.dot(&w) + self.intercept)
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }
}

impl TreeNode {
    fn evaluate(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return Ok(*value),
                TreeNode::Node {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature_idx).ok_or_else(|| {
                        ModelError::Malformed(format!("split on missing column {feature_idx}"))
                    })?;
                    node = if *v <= *threshold { left } else { right };
                }
            }
        }
    }
}

impl Regressor for RandomForestModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        check_width(self.n_features_in, &x)?;
        if self.trees.is_empty() {
            return Err(ModelError::Malformed("random forest has no trees".into()));
        }
        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            let row = row.to_vec();
            let mut total = 0.0;
            for tree in &self.trees {
                total += tree.evaluate(&row)?;
            }
            out[i] = total / self.trees.len() as f64;
        }
        Ok(out)
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.n_features_in)
    }
}

impl PipelineStep {
    fn input_width(&self) -> usize {
        match self {
            PipelineStep::VarianceThreshold { support } | PipelineStep::SelectKBest { support } => {
                support.len()
            }
            PipelineStep::StandardScaler { mean, .. } => mean.len(),
        }
    }

    fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        check_width(self.input_width(), &x)?;
        Ok(match self {
            PipelineStep::VarianceThreshold { support } | PipelineStep::SelectKBest { support } => {
                let idx: Vec<usize> = support
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect();
                x.select(Axis(1), &idx)
            }
            PipelineStep::StandardScaler { mean, scale } => {
                let mut out = x.to_owned();
                for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
                    let s = if scale[j] == 0.0 { 1.0 } else { scale[j] };
                    col.mapv_inplace(|v| (v - mean[j]) / s);
                }
                out
            }
        })
    }
}

impl Regressor for PipelineModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let mut current = x.to_owned();
        for step in &self.steps {
            current = step.apply(current.view())?;
        }
        self.estimator.predict(current.view())
    }

    fn n_features_in(&self) -> Option<usize> {
        match self.steps.first() {
            Some(step) => Some(step.input_width()),
            None => self.estimator.n_features_in(),
        }
    }

    fn is_pipeline(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// linfa interop
// ─────────────────────────────────────────────────────────────────────────────

impl Regressor for FittedLinearRegression<f64> {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        check_width(self.params().len(), &x)?;
        Ok(Predict::predict(self, &x))
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.params().len())
    }
}

impl From<&FittedLinearRegression<f64>> for LinearModel {
    fn from(fitted: &FittedLinearRegression<f64>) -> Self {
        LinearModel {
            intercept: fitted.intercept(),
            coefficients: fitted.params().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// y = x0 + x1, fitted by linfa.
    fn fitted_sum() -> FittedLinearRegression<f64> {
        let x = array![[1.0, 2.0], [2.0, 3.0], [3.0, 5.0], [4.0, 5.0]];
        let y = array![3.0, 5.0, 8.0, 9.0];
        linfa_linear::LinearRegression::default()
            .fit(&linfa::Dataset::new(x, y))
            .unwrap()
    }

    #[test]
    fn fitted_linfa_model_is_a_regressor() {
        let fitted = fitted_sum();
        assert_eq!(Regressor::n_features_in(&fitted), Some(2));
        assert!(!Regressor::is_pipeline(&fitted));
        let pred = Regressor::predict(&fitted, array![[5.0, 6.0]].view()).unwrap();
        assert_relative_eq!(pred[0], 11.0, epsilon = 1e-6);
        assert!(matches!(
            Regressor::predict(&fitted, array![[1.0, 2.0, 3.0]].view()),
            Err(ModelError::Shape { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn fitted_linfa_model_exports_as_linear_artifact() {
        let fitted = fitted_sum();
        let artifact = ModelArtifact::Linear(LinearModel::from(&fitted));
        let json = serde_json::to_string(&artifact).unwrap();
        let reloaded: ModelArtifact = serde_json::from_str(&json).unwrap();
        let pred = reloaded.predict(array![[5.0, 6.0], [0.0, 0.0]].view()).unwrap();
        assert_relative_eq!(pred[0], 11.0, epsilon = 1e-6);
        assert_relative_eq!(pred[1], fitted.intercept(), epsilon = 1e-12);
    }

    #[test]
    fn linear_rejects_wrong_width() {
        let model = LinearModel {
            intercept: 1.0,
            coefficients: vec![1.0, 1.0],
        };
        let err = model.predict(array![[1.0, 2.0, 3.0]].view()).unwrap_err();
        assert!(matches!(err, ModelError::Shape { expected: 2, found: 3 }));
    }

    #[test]
    fn random_forest_document_round_trip() {
        let json = r#"{
            "kind": "random_forest",
            "n_features_in": 2,
            "trees": [
                {"feature_idx": 0, "threshold": 0.5,
                 "left": {"value": 1.0, "n_samples": 3},
                 "right": {"value": 3.0}},
                {"value": 2.0}
            ]
        }"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        model.validate().unwrap();
        assert!(!model.is_pipeline());
        assert_eq!(model.n_features_in(), Some(2));
        let pred = model.predict(array![[0.0, 9.0], [1.0, 9.0]].view()).unwrap();
        assert_relative_eq!(pred[0], 1.5);
        assert_relative_eq!(pred[1], 2.5);
    }

    #[test]
    fn pipeline_selects_then_scales() {
        let model = ModelArtifact::Pipeline(PipelineModel {
            steps: vec![
                PipelineStep::VarianceThreshold {
                    support: vec![true, false, true],
                },
                PipelineStep::StandardScaler {
                    mean: vec![1.0, 1.0],
                    scale: vec![2.0, 0.0],
                },
            ],
            estimator: Box::new(ModelArtifact::Linear(LinearModel {
                intercept: 0.0,
                coefficients: vec![1.0, 1.0],
            })),
        });
        assert!(model.is_pipeline());
        assert_eq!(model.n_features_in(), Some(3));
        let pred = model.predict(array![[3.0, 100.0, 2.0]].view()).unwrap();
        assert_relative_eq!(pred[0], 1.0 + 1.0);
        assert!(model.predict(array![[3.0, 2.0]].view()).is_err());
    }

    #[test]
    fn split_on_missing_column_is_malformed() {
        let model = RandomForestModel {
            n_features_in: 1,
            trees: vec![TreeNode::Node {
                feature_idx: 4,
                threshold: 0.0,
                left: Box::new(TreeNode::Leaf { value: 0.0 }),
                right: Box::new(TreeNode::Leaf { value: 1.0 }),
            }],
        };
        assert!(matches!(
            model.predict(array![[0.0]].view()),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn empty_forest_fails_validation() {
        let json = r#"{"kind": "random_forest", "n_features_in": 3, "trees": []}"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        assert!(model.validate().is_err());
    }

    #[test]
    fn load_model_reports_missing_and_garbage_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        assert!(matches!(load_model(&missing), Err(ModelError::Io { .. })));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(matches!(load_model(&garbage), Err(ModelError::Decode { .. })));
    }
}
