#![warn(missing_docs)]
//! qsar-predict: SMILES in, QSAR predictions out.
//!
//! This crate turns chemical structures written as SMILES into fixed-width
//! feature rows and scores them with a pretrained regression model, tolerating
//! mismatches between the layout the model was trained on and the layout
//! computed here:
//!
//! - **molecule**: SMILES parser, ring and aromaticity perception
//! - **smarts**: substructure queries used by descriptors and keys
//! - **descriptors**: physicochemical, constitutional, topological and
//!   fragment descriptors, Morgan and MACCS fingerprints
//! - **features**: the [`FEATURE_WIDTH`]-wide row and the parallel batch matrix
//! - **models**: the [`Regressor`] trait, JSON model documents, linfa interop
//! - **meta**: the optional preprocessing sidecar, normalized into roles
//! - **strategy**: the ordered fallback chain
//! - **predictor**, **config**, **data_io**: the command-line flow
//!
//! # Quick examples
//!
//! ### Descriptors of one molecule
//! ```
//! use qsar_predict::{parse_smiles, physchem_descriptors};
//!
//! let props = physchem_descriptors(&parse_smiles("CCO").unwrap()).unwrap(); // ethanol
//! println!("MolWt: {:.3}, LogP: {:.2}, TPSA: {:.1}, HBD: {}, HBA: {}",
//!          props.mol_wt, props.mol_log_p, props.tpsa,
//!          props.h_bond_donors, props.h_bond_acceptors);
//! ```
//!
//! ### Feature matrix for a batch
//! ```
//! use qsar_predict::{build_feature_matrix, FEATURE_WIDTH};
//!
//! let batch = build_feature_matrix(&["CC(=O)Oc1ccccc1C(=O)O", "CCN"]);
//! assert_eq!(batch.matrix.ncols(), FEATURE_WIDTH);
//! ```
//!
//! ### Predict with a model document
//! ```no_run
//! use qsar_predict::Predictor;
//!
//! let predictor = Predictor::from_model_path("models/rf.json")?;
//! let prediction = predictor.predict_smiles(&["CCO", "c1ccccc1O"])?;
//! println!("{:?} via {}", prediction.values, prediction.strategy);
//! # Ok::<(), qsar_predict::PredictError>(())
//! ```

pub mod config;
pub mod data_io;
pub mod descriptors;
pub mod features;
pub mod meta;
pub mod models;
pub mod molecule;
pub mod predictor;
pub mod smarts;
pub mod strategy;

// ─────────────────────────────────────────────────────────────────────────────
// Convenience re-exports
// ─────────────────────────────────────────────────────────────────────────────
pub use descriptors::physicochemical::{physchem_descriptors, PhysChemDescriptors};
pub use descriptors::{descriptor_block, DescriptorError};
pub use features::{build_feature_matrix, FeatureBatch, FEATURE_WIDTH};
pub use meta::MetaBundle;
pub use models::{load_model, ModelArtifact, ModelError, Regressor};
pub use molecule::{parse_smiles, Molecule, ParsedMolecule};
pub use predictor::{run, PredictError, Prediction, Predictor, RunSummary};
pub use strategy::{PredictionOutcome, Strategy};
