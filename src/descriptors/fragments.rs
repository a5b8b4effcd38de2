// src/descriptors/fragments.rs
//! Functional-group fragment counts (`fr_*` descriptors).
//!
//! Each count is the number of distinct atom sets matching a fixed SMARTS
//! query. The queries are compiled once and shared by all worker threads.

use std::sync::OnceLock;

use crate::molecule::Molecule;
use crate::smarts::{compile_builtin, Pattern};

/// Fragment queries in feature-column order (`fr_Al_OH` … `fr_benzene`).
pub const FRAGMENT_SMARTS: [(&str, &str); 11] = [
    ("fr_Al_OH", "[C!$(C=O)]-[OH]"),
    ("fr_Ar_OH", "c[OH1]"),
    ("fr_C_O", "[CX3]=[OX1]"),
    ("fr_COO", "[#6]C(=O)[O;H,-1]"),
    ("fr_NH2", "[NH2,nH2]"),
    ("fr_amide", "C(=O)-N"),
    ("fr_ester", "[#6][CX3](=O)[OX2H0][#6]"),
    ("fr_ether", "[OD2]([#6])[#6]"),
    ("fr_halogen", "[#9,#17,#35,#53]"),
    ("fr_nitro", "[$([NX3](=O)=O),$([NX3+](=O)[O-])][!#8]"),
    ("fr_benzene", "c1ccccc1"),
];

fn fragment_patterns() -> &'static [Option<Pattern>] {
    static PATTERNS: OnceLock<Vec<Option<Pattern>>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FRAGMENT_SMARTS
            .iter()
            .map(|(_, smarts)| compile_builtin(smarts))
            .collect()
    })
}

/// Count every fragment of [`FRAGMENT_SMARTS`] in `mol`.
///
/// ```
/// use qsar_predict::descriptors::fragments::fragment_counts;
/// use qsar_predict::molecule::parse_smiles;
///
/// let counts = fragment_counts(&parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap());
/// assert_eq!(counts[3], 1); // fr_COO
/// assert_eq!(counts[6], 1); // fr_ester
/// assert_eq!(counts[10], 1); // fr_benzene
/// ```
pub fn fragment_counts(mol: &Molecule) -> [usize; 11] {
    let mut counts = [0usize; 11];
    for (slot, pattern) in counts.iter_mut().zip(fragment_patterns()) {
        *slot = pattern.as_ref().map_or(0, |p| p.count_matches(mol));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::parse_smiles;

    fn counts(smiles: &str) -> [usize; 11] {
        fragment_counts(&parse_smiles(smiles).unwrap())
    }

    fn at(name: &str) -> usize {
        FRAGMENT_SMARTS.iter().position(|(n, _)| *n == name).unwrap()
    }

    #[test]
    fn every_query_compiles() {
        assert!(fragment_patterns().iter().all(Option::is_some));
    }

    #[test]
    fn alcohols_and_phenols() {
        let c = counts("OCCc1ccc(O)cc1");
        assert_eq!(c[at("fr_Al_OH")], 1);
        assert_eq!(c[at("fr_Ar_OH")], 1);
        assert_eq!(c[at("fr_benzene")], 1);
    }

    #[test]
    fn acid_is_not_an_aliphatic_alcohol() {
        let c = counts("CC(=O)O");
        assert_eq!(c[at("fr_Al_OH")], 0);
        assert_eq!(c[at("fr_COO")], 1);
        assert_eq!(c[at("fr_C_O")], 1);
    }

    #[test]
    fn amide_amine_and_halogens() {
        let c = counts("NCC(=O)NC(Cl)Br");
        assert_eq!(c[at("fr_amide")], 1);
        assert_eq!(c[at("fr_NH2")], 1);
        assert_eq!(c[at("fr_halogen")], 2);
    }

    #[test]
    fn nitro_in_both_notations() {
        assert_eq!(counts("C[N+](=O)[O-]")[at("fr_nitro")], 1);
        assert_eq!(counts("CCOC")[at("fr_ether")], 1);
    }
}
