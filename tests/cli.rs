use std::path::{Path, PathBuf};
use std::process::Command;

use qsar_predict::features::FEATURE_WIDTH;
use qsar_predict::models::{LinearModel, ModelArtifact};

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_qsar-predict"))
}

fn linear_model(dir: &Path, width: usize) -> PathBuf {
    let model = ModelArtifact::Linear(LinearModel {
        intercept: 6.0,
        coefficients: vec![0.0; width],
    });
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
    path
}

fn input(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("input.csv");
    std::fs::write(&path, text).unwrap();
    path
}

fn status(args: &[&Path], flags: &[&str]) -> i32 {
    // flags[i] takes args[i]
    let mut cmd = bin();
    for (flag, path) in flags.iter().zip(args) {
        cmd.arg(flag).arg(path);
    }
    cmd.output().expect("run binary").status.code().expect("exit code")
}

#[test]
fn success_writes_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let model = linear_model(dir.path(), FEATURE_WIDTH);
    let inp = input(dir.path(), "SMILES\nCCO\nnot_a_molecule\n");
    let out_dir = dir.path().join("results");
    let code = status(&[&model, &inp, &out_dir], &["-m", "-i", "--output_dir"]);
    assert_eq!(code, 0);
    let text = std::fs::read_to_string(out_dir.join("test_output.csv")).unwrap();
    assert_eq!(text, "SMILES,Pred_RandomForest,pIC50\nCCO,6.0,6.0\nnot_a_molecule,6.0,6.0\n");
}

#[test]
fn missing_input_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let model = linear_model(dir.path(), FEATURE_WIDTH);
    let missing = dir.path().join("nope.csv");
    let out = dir.path().join("o.csv");
    assert_eq!(status(&[&model, &missing, &out], &["-m", "-i", "-o"]), 1);
}

#[test]
fn no_destination_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let model = linear_model(dir.path(), FEATURE_WIDTH);
    let inp = input(dir.path(), "SMILES\nCCO\n");
    assert_eq!(status(&[&model, &inp], &["-m", "-i"]), 1);
}

#[test]
fn missing_smiles_column_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let model = linear_model(dir.path(), FEATURE_WIDTH);
    let inp = input(dir.path(), "smiles\nCCO\n");
    let out = dir.path().join("o.csv");
    assert_eq!(status(&[&model, &inp, &out], &["-m", "-i", "-o"]), 1);
    assert!(!out.exists());
}

#[test]
fn bad_model_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.json");
    std::fs::write(&model, "{\"kind\": \"unknown\"}").unwrap();
    let inp = input(dir.path(), "SMILES\nCCO\n");
    let out = dir.path().join("o.csv");
    assert_eq!(status(&[&model, &inp, &out], &["-m", "-i", "-o"]), 2);
}

#[test]
fn exhausted_chain_exits_3_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let model = linear_model(dir.path(), FEATURE_WIDTH + 7);
    let inp = input(dir.path(), "SMILES\nCCO\n");
    let out = dir.path().join("o.csv");
    assert_eq!(status(&[&model, &inp, &out], &["-m", "-i", "-o"]), 3);
    assert!(!out.exists());
}

#[test]
fn unwritable_output_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let model = linear_model(dir.path(), FEATURE_WIDTH);
    let inp = input(dir.path(), "SMILES\nCCO\n");
    let out = dir.path().join("no_such_dir").join("o.csv");
    assert_eq!(status(&[&model, &inp, &out], &["-m", "-i", "-o"]), 4);
}
