//! Feature rows and the batch feature matrix.
//!
//! A row is the concatenation of the descriptor block
//! ([`crate::descriptors::descriptor_block`]), the Morgan bits and the MACCS
//! bits, always [`FEATURE_WIDTH`] values wide. A molecule that fails to parse,
//! or whose descriptors cannot be computed, gets a NaN descriptor block and
//! all-zero fingerprints; [`build_feature_matrix`] then replaces every NaN and
//! infinity in the matrix with 0.0.
//!
//! ```
//! use qsar_predict::features::{build_feature_matrix, FEATURE_WIDTH};
//!
//! let batch = build_feature_matrix(&["CCO", "not_a_molecule"]);
//! assert_eq!(batch.matrix.dim(), (2, FEATURE_WIDTH));
//! assert_eq!(batch.invalid_rows, vec![1]);
//! assert!(batch.matrix.row(1).iter().all(|&v| v == 0.0));
//! ```

use ndarray::Array2;
use rayon::prelude::*;

use crate::descriptors::fingerprint::{morgan_fingerprint, MORGAN_BITS, MORGAN_RADIUS};
use crate::descriptors::maccs::{maccs_keys, MACCS_BITS};
use crate::descriptors::{
    descriptor_block, nan_block, COUNT_NAMES, DESCRIPTOR_BLOCK_WIDTH, DESCRIPTOR_NAMES,
};
use crate::molecule::{Molecule, ParsedMolecule};

/// Width of one feature row.
pub const FEATURE_WIDTH: usize = DESCRIPTOR_BLOCK_WIDTH + MORGAN_BITS + MACCS_BITS;

/// Feature matrix for a batch plus the rows that fell back to sentinels.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    /// One sanitized row per input, in input order.
    pub matrix: Array2<f64>,
    /// Input positions that could not be parsed or described.
    pub invalid_rows: Vec<usize>,
}

/// Column names in row order.
pub fn feature_names() -> Vec<String> {
    let mut names: Vec<String> = DESCRIPTOR_NAMES
        .iter()
        .chain(COUNT_NAMES.iter())
        .map(|s| s.to_string())
        .collect();
    names.extend((0..MORGAN_BITS).map(|i| format!("morgan_{i}")));
    names.extend((0..MACCS_BITS).map(|i| format!("maccs_{i}")));
    names
}

/// Row for a parsed molecule and whether it was usable. An unusable molecule
/// gets the sentinel row: NaN descriptor block, zero fingerprint bits.
pub fn feature_row(parsed: &ParsedMolecule) -> (Vec<f64>, bool) {
    match parsed.as_valid() {
        Some(mol) => match valid_row(mol) {
            Ok(row) => (row, true),
            Err(e) => {
                log::debug!("descriptor computation failed: {e}");
                (sentinel_row(), false)
            }
        },
        None => (sentinel_row(), false),
    }
}

fn valid_row(mol: &Molecule) -> Result<Vec<f64>, crate::descriptors::DescriptorError> {
    let mut row = descriptor_block(mol)?;
    row.reserve(MORGAN_BITS + MACCS_BITS);
    row.extend(morgan_fingerprint(mol, MORGAN_RADIUS, MORGAN_BITS).to_features());
    row.extend(maccs_keys(mol).to_features());
    Ok(row)
}

fn sentinel_row() -> Vec<f64> {
    let mut row = nan_block();
    row.resize(FEATURE_WIDTH, 0.0);
    row
}

/// Replace every NaN and ±infinity with 0.0; returns how many values changed.
pub fn sanitize(matrix: &mut Array2<f64>) -> usize {
    let mut replaced = 0;
    matrix.mapv_inplace(|v| {
        if v.is_finite() {
            v
        } else {
            replaced += 1;
            0.0
        }
    });
    replaced
}

/// Featurize a batch of SMILES in parallel, preserving input order.
pub fn build_feature_matrix<S: AsRef<str> + Sync>(smiles: &[S]) -> FeatureBatch {
    let rows: Vec<(Vec<f64>, bool)> = smiles
        .par_iter()
        .map(|s| feature_row(&ParsedMolecule::parse(s.as_ref())))
        .collect();

    let mut matrix = Array2::<f64>::zeros((rows.len(), FEATURE_WIDTH));
    let mut invalid_rows = Vec::new();
    for (i, (row, valid)) in rows.iter().enumerate() {
        if !valid {
            invalid_rows.push(i);
        }
        for (dst, &src) in matrix.row_mut(i).iter_mut().zip(row) {
            *dst = src;
        }
    }
    let replaced = sanitize(&mut matrix);
    log::debug!(
        "featurized {} molecules ({} invalid, {} non-finite values zeroed)",
        rows.len(),
        invalid_rows.len(),
        replaced
    );
    FeatureBatch {
        matrix,
        invalid_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn width_is_fixed() {
        assert_eq!(FEATURE_WIDTH, 1240);
        assert_eq!(feature_names().len(), FEATURE_WIDTH);
    }

    #[test]
    fn valid_row_is_finite_and_full_width() {
        let (row, valid) = feature_row(&ParsedMolecule::parse("CCO"));
        assert!(valid);
        assert_eq!(row.len(), FEATURE_WIDTH);
        assert!(row.iter().all(|v| v.is_finite()));
        assert_relative_eq!(row[0], 46.069, epsilon = 1e-3);
        // fingerprint region holds only bits
        assert!(row[DESCRIPTOR_BLOCK_WIDTH..].iter().all(|&b| b == 0.0 || b == 1.0));
    }

    #[test]
    fn invalid_row_has_nan_block_and_zero_bits() {
        let (row, valid) = feature_row(&ParsedMolecule::parse("C1CC"));
        assert!(!valid);
        assert_eq!(row.len(), FEATURE_WIDTH);
        assert!(row[..DESCRIPTOR_BLOCK_WIDTH].iter().all(|v| v.is_nan()));
        assert!(row[DESCRIPTOR_BLOCK_WIDTH..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn wildcard_row_is_not_a_sentinel() {
        for smiles in ["C*", "CC[*]"] {
            let (row, valid) = feature_row(&ParsedMolecule::parse(smiles));
            assert!(valid, "{smiles}");
            assert!(row.iter().all(|v| v.is_finite()));
            assert!(row[0] > 0.0);
            assert!(row[DESCRIPTOR_BLOCK_WIDTH..].iter().any(|&b| b == 1.0));
        }
    }

    #[test]
    fn batch_preserves_order_and_sanitizes() {
        let batch = build_feature_matrix(&["CCO", "xyz", "c1ccccc1", "CCO"]);
        assert_eq!(batch.matrix.nrows(), 4);
        assert_eq!(batch.invalid_rows, vec![1]);
        assert!(batch.matrix.iter().all(|v| v.is_finite()));
        assert_eq!(batch.matrix.row(0), batch.matrix.row(3));
        assert_ne!(batch.matrix.row(0), batch.matrix.row(2));
        assert!(batch.matrix.row(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sanitize_counts_replacements() {
        let mut m = ndarray::array![[1.0, f64::NAN], [f64::INFINITY, f64::NEG_INFINITY]];
        assert_eq!(sanitize(&mut m), 3);
        assert_eq!(m, ndarray::array![[1.0, 0.0], [0.0, 0.0]]);
    }
}
