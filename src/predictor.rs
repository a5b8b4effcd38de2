//! End-to-end prediction: load the model and its sidecar, featurize, run the
//! fallback chain, write the output table.

use std::path::{Path, PathBuf};

use ndarray::Array1;
use thiserror::Error;

use crate::config::{sidecar_for, ConfigError, RunConfig, SMILES_COLUMN};
use crate::data_io::{read_smiles_table, write_predictions, DataError};
use crate::features::build_feature_matrix;
use crate::meta::MetaBundle;
use crate::models::{load_model, ModelError, Regressor};
use crate::strategy::{run_chain, PredictionOutcome, Strategy};

/// Top-level failures, each mapped to a process exit code.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Caller-fixable argument problem.
    #[error(transparent)]
    Usage(#[from] ConfigError),

    /// The input table is unreadable or lacks the SMILES column.
    #[error("{0}")]
    Input(#[source] DataError),

    /// The model could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(#[from] ModelError),

    /// Every fallback step failed.
    #[error("model failed to produce predictions (last method tried: {last})")]
    PredictionExhausted {
        /// Tag of the final outcome.
        last: String,
        /// Each step with its failure reason.
        attempts: Vec<(Strategy, String)>,
    },

    /// The output table could not be written.
    #[error("failed to save output CSV: {0}")]
    OutputWrite(#[source] DataError),
}

impl PredictError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PredictError::Usage(_) | PredictError::Input(_) => 1,
            PredictError::ModelLoad(_) => 2,
            PredictError::PredictionExhausted { .. } => 3,
            PredictError::OutputWrite(_) => 4,
        }
    }
}

/// Predictions for a batch and the step that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// One value per input molecule.
    pub values: Array1<f64>,
    /// Winning fallback step.
    pub strategy: Strategy,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Input rows.
    pub rows: usize,
    /// Rows whose molecule could not be parsed or described.
    pub invalid_rows: usize,
    /// Winning fallback step.
    pub strategy: Strategy,
    /// File written.
    pub output_path: PathBuf,
}

/// A loaded model plus its resolved preprocessing bundle.
pub struct Predictor {
    model: Box<dyn Regressor>,
    meta: MetaBundle,
}

impl Predictor {
    /// Wrap an already loaded model.
    pub fn new(model: Box<dyn Regressor>, meta: MetaBundle) -> Self {
        Predictor { model, meta }
    }

    /// Load the model at `path` and the sidecar next to it. A sidecar that
    /// cannot be read is treated as absent.
    pub fn from_model_path<P: AsRef<Path>>(path: P) -> Result<Self, PredictError> {
        let path = path.as_ref();
        let model = load_model(path)?;
        log::info!(
            "loaded model {} (expects {:?} features, pipeline: {})",
            path.display(),
            model.n_features_in(),
            model.is_pipeline()
        );
        let meta = MetaBundle::load_or_absent(&sidecar_for(path));
        Ok(Predictor::new(Box::new(model), meta))
    }

    /// The resolved preprocessing bundle.
    pub fn meta(&self) -> &MetaBundle {
        &self.meta
    }

    /// Featurize `smiles` and run the fallback chain once.
    pub fn predict_smiles<S: AsRef<str> + Sync>(&self, smiles: &[S]) -> Result<Prediction, PredictError> {
        self.predict_batch(smiles).map(|(prediction, _)| prediction)
    }

    fn predict_batch<S: AsRef<str> + Sync>(
        &self,
        smiles: &[S],
    ) -> Result<(Prediction, usize), PredictError> {
        let batch = build_feature_matrix(smiles);
        let invalid = batch.invalid_rows.len();
        if invalid > 0 {
            log::info!("{invalid} of {} molecules could not be featurized", smiles.len());
        }
        let outcome = run_chain(self.model.as_ref(), batch.matrix.view(), &self.meta);
        let last = outcome.tag();
        match outcome {
            PredictionOutcome::Predicted { values, strategy } => {
                Ok((Prediction { values, strategy }, invalid))
            }
            PredictionOutcome::Failed { attempts } => Err(PredictError::PredictionExhausted {
                last: last.to_string(),
                attempts,
            }),
        }
    }
}

/// Run the whole command: load, read, predict, write.
pub fn run(config: &RunConfig) -> Result<RunSummary, PredictError> {
    let predictor = Predictor::from_model_path(&config.model_path)?;
    run_with(&predictor, config)
}

/// [`run`] with an already constructed predictor.
pub fn run_with(predictor: &Predictor, config: &RunConfig) -> Result<RunSummary, PredictError> {
    let table = read_smiles_table(&config.input_path, SMILES_COLUMN).map_err(PredictError::Input)?;
    log::info!("read {} rows from {}", table.len(), config.input_path.display());

    let (prediction, invalid_rows) = predictor.predict_batch(&table.smiles())?;
    let values = prediction.values.to_vec();
    write_predictions(&config.output_path, &table, &values).map_err(PredictError::OutputWrite)?;
    log::info!("wrote {}", config.output_path.display());

    Ok(RunSummary {
        rows: table.len(),
        invalid_rows,
        strategy: prediction.strategy,
        output_path: config.output_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_WIDTH;
    use crate::models::{LinearModel, ModelArtifact};

    fn linear(width: usize, intercept: f64) -> Box<dyn Regressor> {
        Box::new(ModelArtifact::Linear(LinearModel {
            intercept,
            coefficients: vec![0.0; width],
        }))
    }

    #[test]
    fn exit_codes() {
        assert_eq!(PredictError::Usage(ConfigError::NoDestination).exit_code(), 1);
        assert_eq!(
            PredictError::Input(DataError::MissingColumn("SMILES".into())).exit_code(),
            1
        );
        assert_eq!(
            PredictError::ModelLoad(ModelError::Malformed("x".into())).exit_code(),
            2
        );
        assert_eq!(
            PredictError::PredictionExhausted {
                last: "failed".into(),
                attempts: vec![]
            }
            .exit_code(),
            3
        );
        assert_eq!(
            PredictError::OutputWrite(DataError::RowMismatch { rows: 1, predictions: 0 }).exit_code(),
            4
        );
    }

    #[test]
    fn full_width_model_predicts_via_selectors_only() {
        let predictor = Predictor::new(linear(FEATURE_WIDTH, 5.0), MetaBundle::absent());
        let prediction = predictor.predict_smiles(&["CCO", "c1ccccc1"]).unwrap();
        assert_eq!(prediction.strategy, Strategy::SelectorsOnly);
        assert_eq!(prediction.values.to_vec(), vec![5.0, 5.0]);
    }

    #[test]
    fn narrower_model_uses_first_columns() {
        let predictor = Predictor::new(linear(10, 1.0), MetaBundle::absent());
        let prediction = predictor.predict_smiles(&["CCO"]).unwrap();
        assert_eq!(prediction.strategy, Strategy::FirstKColumns);
    }

    #[test]
    fn wider_model_exhausts_the_chain() {
        let predictor = Predictor::new(linear(FEATURE_WIDTH + 1, 0.0), MetaBundle::absent());
        let err = predictor.predict_smiles(&["CCO"]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    fn missing_model_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Predictor::from_model_path(dir.path().join("none.json"))
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }
}
