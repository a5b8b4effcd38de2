//! Run configuration resolved from command-line arguments.
//!
//! All checks a caller can fix (missing input, no destination, output
//! directory that cannot be created) happen here, before any molecule is
//! parsed or any model is loaded.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Column holding the SMILES strings in the input table.
pub const SMILES_COLUMN: &str = "SMILES";
/// Prediction column appended to the output table.
pub const PREDICTION_COLUMN: &str = "Pred_RandomForest";
/// Alias of [`PREDICTION_COLUMN`] with identical values.
pub const PIC50_COLUMN: &str = "pIC50";
/// File written into `--output_dir` when `--output` is not given.
pub const DEFAULT_OUTPUT_FILE: &str = "test_output.csv";
/// Preprocessing sidecar looked up next to the model file.
pub const SIDECAR_FILE: &str = "egfr_rf_scaler_and_selector.pkl";

/// Caller-fixable configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The input table does not exist.
    #[error("input CSV not found: {0}")]
    InputNotFound(PathBuf),

    /// Neither an output file nor an output directory was given.
    #[error("either --output or --output_dir must be specified")]
    NoDestination,

    /// The output directory could not be created.
    #[error("failed to create output_dir {path}: {source}")]
    OutputDir {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Validated paths for one prediction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Model document.
    pub model_path: PathBuf,
    /// Input CSV with a [`SMILES_COLUMN`].
    pub input_path: PathBuf,
    /// Destination CSV.
    pub output_path: PathBuf,
}

impl RunConfig {
    /// Resolve and validate the run paths.
    ///
    /// `output` wins over `output_dir`; the directory is created when missing.
    pub fn resolve(
        model: PathBuf,
        input: PathBuf,
        output: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if !input.exists() {
            return Err(ConfigError::InputNotFound(input));
        }
        let output_path = match (output, output_dir) {
            (Some(path), _) => path,
            (None, None) => return Err(ConfigError::NoDestination),
            (None, Some(dir)) => {
                if !dir.exists() {
                    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::OutputDir {
                        path: dir.clone(),
                        source,
                    })?;
                }
                dir.join(DEFAULT_OUTPUT_FILE)
            }
        };
        Ok(RunConfig {
            model_path: model,
            input_path: input,
            output_path,
        })
    }
}

/// [`SIDECAR_FILE`] next to `model_path`.
pub fn sidecar_for(model_path: &Path) -> PathBuf {
    let dir = model_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    dir.join(SIDECAR_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_reported_first() {
        let err = RunConfig::resolve("m.json".into(), "/no/such/input.csv".into(), None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InputNotFound(_)));
    }

    #[test]
    fn destination_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "SMILES\nCCO\n").unwrap();
        let err = RunConfig::resolve("m.json".into(), input, None, None).unwrap_err();
        assert!(matches!(err, ConfigError::NoDestination));
    }

    #[test]
    fn output_dir_is_created_and_default_name_used() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "SMILES\nCCO\n").unwrap();
        let out_dir = dir.path().join("nested").join("out");
        let cfg =
            RunConfig::resolve("m.json".into(), input, None, Some(out_dir.clone())).unwrap();
        assert!(out_dir.is_dir());
        assert_eq!(cfg.output_path, out_dir.join(DEFAULT_OUTPUT_FILE));
    }

    #[test]
    fn explicit_output_wins() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "SMILES\n").unwrap();
        let cfg = RunConfig::resolve(
            "m.json".into(),
            input,
            Some(dir.path().join("x.csv")),
            Some(dir.path().join("unused")),
        )
        .unwrap();
        assert_eq!(cfg.output_path, dir.path().join("x.csv"));
        assert!(!dir.path().join("unused").exists());
    }

    #[test]
    fn output_dir_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "SMILES\n").unwrap();
        let err = RunConfig::resolve("m.json".into(), input.clone(), None, Some(input.join("sub")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutputDir { .. }));
    }

    #[test]
    fn sidecar_sits_next_to_model() {
        assert_eq!(
            sidecar_for(Path::new("models/rf.json")),
            Path::new("models").join(SIDECAR_FILE)
        );
        assert_eq!(sidecar_for(Path::new("rf.json")), Path::new(".").join(SIDECAR_FILE));
    }
}
