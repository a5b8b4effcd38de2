use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use ndarray::{Array1, ArrayView2};
use serde_json::json;

use qsar_predict::config::{RunConfig, SIDECAR_FILE};
use qsar_predict::features::{feature_row, FEATURE_WIDTH};
use qsar_predict::meta::{ColumnSelector, MetaBundle, SelectorRole};
use qsar_predict::models::{LinearModel, ModelArtifact, ModelError, Regressor};
use qsar_predict::{build_feature_matrix, run, ParsedMolecule, Predictor, Strategy};

fn write_linear_model(dir: &Path, width: usize, intercept: f64, weights: &[(usize, f64)]) -> PathBuf {
    let mut coefficients = vec![0.0; width];
    for &(idx, w) in weights {
        coefficients[idx] = w;
    }
    let model = ModelArtifact::Linear(LinearModel {
        intercept,
        coefficients,
    });
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
    path
}

fn write_input(dir: &Path, rows: &[&str]) -> PathBuf {
    let mut text = String::from("id,SMILES\n");
    for (i, smi) in rows.iter().enumerate() {
        text.push_str(&format!("{i},{smi}\n"));
    }
    let path = dir.join("input.csv");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn scenario_a_valid_smiles_gives_full_finite_row() {
    let (row, valid) = feature_row(&ParsedMolecule::parse("CCO"));
    assert!(valid);
    assert_eq!(row.len(), FEATURE_WIDTH);
    assert!(row.iter().all(|v| v.is_finite()));
    assert_relative_eq!(row[0], 46.069, epsilon = 1e-3); // MolWt
    assert!(row[49..].iter().any(|&b| b == 1.0));
}

#[test]
fn scenario_b_unparseable_row_is_zero_and_run_succeeds() -> Result<(), Box<dyn Error>> {
    let batch = build_feature_matrix(&["not_a_molecule"]);
    assert!(batch.matrix.row(0).iter().all(|&v| v == 0.0));

    let dir = tempfile::tempdir()?;
    let model = write_linear_model(dir.path(), FEATURE_WIDTH, 4.2, &[]);
    let input = write_input(dir.path(), &["not_a_molecule"]);
    let config = RunConfig::resolve(model, input, None, Some(dir.path().join("out")))?;
    let summary = run(&config)?;
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.invalid_rows, 1);
    assert_eq!(summary.strategy, Strategy::SelectorsOnly);

    let text = std::fs::read_to_string(dir.path().join("out").join("test_output.csv"))?;
    assert_eq!(text, "id,SMILES,Pred_RandomForest,pIC50\n0,not_a_molecule,4.2,4.2\n");
    Ok(())
}

#[test]
fn scenario_c_unmatched_width_fails_without_output() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let model = write_linear_model(dir.path(), FEATURE_WIDTH + 60, 0.0, &[]);
    let input = write_input(dir.path(), &["CCO", "CCN"]);
    let output = dir.path().join("pred.csv");
    let config = RunConfig::resolve(model, input, Some(output.clone()), None)?;

    let err = run(&config).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("failed"));
    assert!(!output.exists());
    Ok(())
}

/// Pipeline stand-in that counts calls and accepts the raw width only.
struct CountingPipeline {
    calls: AtomicUsize,
}

impl Regressor for CountingPipeline {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if x.ncols() != FEATURE_WIDTH {
            return Err(ModelError::Shape {
                expected: FEATURE_WIDTH,
                found: x.ncols(),
            });
        }
        Ok(Array1::from_elem(x.nrows(), 7.5))
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(FEATURE_WIDTH)
    }

    fn is_pipeline(&self) -> bool {
        true
    }
}

#[test]
fn scenario_d_pipeline_on_raw_skips_selectors() {
    let mut support = vec![false; FEATURE_WIDTH];
    support[0] = true;
    let meta = MetaBundle {
        variance: SelectorRole::VarianceSelector(ColumnSelector::new(support.clone(), false)),
        selector: SelectorRole::KBestSelector(ColumnSelector::new(support, true)),
    };
    let model = std::sync::Arc::new(CountingPipeline {
        calls: AtomicUsize::new(0),
    });

    struct Shared(std::sync::Arc<CountingPipeline>);
    impl Regressor for Shared {
        fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
            self.0.predict(x)
        }
        fn n_features_in(&self) -> Option<usize> {
            self.0.n_features_in()
        }
        fn is_pipeline(&self) -> bool {
            self.0.is_pipeline()
        }
    }

    let predictor = Predictor::new(Box::new(Shared(model.clone())), meta);
    let prediction = predictor.predict_smiles(&["CCO", "c1ccccc1", "bad("]).unwrap();
    assert_eq!(prediction.strategy, Strategy::PipelineRaw);
    assert_eq!(prediction.values.to_vec(), vec![7.5; 3]);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn rows_stay_aligned_with_input() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    // Prediction = 1 + MolWt, so each row identifies its molecule.
    let model = write_linear_model(dir.path(), FEATURE_WIDTH, 1.0, &[(0, 1.0)]);
    let smiles = ["O", "CCO", "not_a_molecule", "C"];
    let input = write_input(dir.path(), &smiles);
    let output = dir.path().join("pred.csv");
    run(&RunConfig::resolve(model, input, Some(output.clone()), None)?)?;

    let mut rdr = csv::Reader::from_path(&output)?;
    let preds: Vec<f64> = rdr
        .records()
        .map(|r| r.unwrap()[2].parse::<f64>().unwrap())
        .collect();
    assert_eq!(preds.len(), 4);
    assert_relative_eq!(preds[0], 1.0 + 18.015, epsilon = 1e-2);
    assert_relative_eq!(preds[1], 1.0 + 46.069, epsilon = 1e-2);
    assert_relative_eq!(preds[2], 1.0);
    assert_relative_eq!(preds[3], 1.0 + 16.043, epsilon = 1e-2);
    Ok(())
}

#[test]
fn identical_runs_write_identical_files() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let model = write_linear_model(dir.path(), 300, 0.5, &[(3, 0.1), (60, 2.0), (200, -1.0)]);
    let input = write_input(
        dir.path(),
        &["CC(=O)Oc1ccccc1C(=O)O", "CN1C=NC2=C1C(=O)N(C(=O)N2C)C", "xx", "c1ccncc1"],
    );
    let first = dir.path().join("a.csv");
    let second = dir.path().join("b.csv");
    let s1 = run(&RunConfig::resolve(model.clone(), input.clone(), Some(first.clone()), None)?)?;
    let s2 = run(&RunConfig::resolve(model, input, Some(second.clone()), None)?)?;
    assert_eq!(s1.strategy, Strategy::FirstKColumns);
    assert_eq!(s2.strategy, Strategy::FirstKColumns);
    assert_eq!(std::fs::read(first)?, std::fs::read(second)?);
    Ok(())
}

#[test]
fn sidecar_selector_transforms_full_row() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    // Two-column model fed by a k-best selector picking MolWt and TPSA.
    let model = write_linear_model(dir.path(), 2, 0.0, &[(0, 1.0), (1, 1.0)]);
    let mut support = vec![false; FEATURE_WIDTH];
    support[0] = true;
    support[6] = true;
    std::fs::write(
        dir.path().join(SIDECAR_FILE),
        serde_json::to_string(&json!({"selector": {"support": support, "k": 2}}))?,
    )?;
    let predictor = Predictor::from_model_path(&model)?;
    assert!(matches!(predictor.meta().selector, SelectorRole::KBestSelector(_)));
    let prediction = predictor.predict_smiles(&["CCO"])?;
    assert_eq!(prediction.strategy, Strategy::SelectorsOnly);
    assert_relative_eq!(prediction.values[0], 46.069 + 20.23, epsilon = 1e-2);
    Ok(())
}

#[test]
fn sidecar_variance_then_selector_reach_fingerprint_columns() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let model = write_linear_model(dir.path(), 2, 0.0, &[(0, 1.0), (1, 10.0)]);
    // Variance drops the descriptor block; k-best keeps the first two survivors.
    let variance: Vec<bool> = (0..FEATURE_WIDTH).map(|i| i >= 49).collect();
    let mut kbest = vec![false; FEATURE_WIDTH - 49];
    kbest[0] = true;
    kbest[1] = true;
    std::fs::write(
        dir.path().join(SIDECAR_FILE),
        serde_json::to_string(&json!({
            "selector": {"support": kbest, "k": 2},
            "vt": {"support": variance}
        }))?,
    )?;
    let predictor = Predictor::from_model_path(&model)?;
    assert_eq!(
        predictor.meta().variance.selector().map(|v| v.support().len()),
        Some(FEATURE_WIDTH)
    );

    let prediction = predictor.predict_smiles(&["CCO"])?;
    assert_eq!(prediction.strategy, Strategy::SelectorsOnly);
    let (row, _) = feature_row(&ParsedMolecule::parse("CCO"));
    assert_eq!(prediction.values[0], row[49] + 10.0 * row[50]);
    Ok(())
}

#[test]
fn malformed_sidecar_is_ignored() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let model = write_linear_model(dir.path(), FEATURE_WIDTH, 0.0, &[]);
    std::fs::write(dir.path().join(SIDECAR_FILE), b"\x80\x04not json")?;
    let predictor = Predictor::from_model_path(&model)?;
    assert_eq!(predictor.meta(), &MetaBundle::absent());
    Ok(())
}
