// src/descriptors/constitutional.rs
//! Constitutional descriptors: simple, fast, interpretable counts.
//!
//! | Descriptor               | Meaning                                               |
//! |--------------------------|-------------------------------------------------------|
//! | HeavyAtomCount           | Number of non-hydrogen atoms                          |
//! | NumRotatableBonds        | Acyclic single bonds between non-terminal atoms       |
//! | RingCount                | Size of the smallest set of smallest rings            |
//! | NumAromatic/Aliphatic/Saturated{Rings,Carbocycles,Heterocycles} | SSSR rings by class |
//! | NumHeteroatoms           | Atoms that are neither C nor H                        |
//! | FractionCSP3             | sp3 carbons over all carbons                          |
//!
//! A ring is aromatic when all its bonds are aromatic, aliphatic otherwise,
//! and saturated when all its bonds are single. A heterocycle contains at least
//! one atom other than carbon.
//!
//! # Quick Start
//!
//! ```
//! use qsar_predict::descriptors::constitutional::constitutional_descriptors;
//! use qsar_predict::molecule::parse_smiles;
//!
//! let desc = constitutional_descriptors(&parse_smiles("c1ccccc1CCO").unwrap());
//! assert_eq!(desc.heavy_atom_count, 9);
//! assert_eq!(desc.num_rotatable_bonds, 2);
//! assert_eq!(desc.num_aromatic_rings, 1);
//! assert_eq!(desc.num_heteroatoms, 1);
//! ```

use std::sync::OnceLock;

use crate::molecule::{element, BondOrder, Hybridization, Molecule};
use crate::smarts::{compile_builtin, Pattern};

/// Container for the constitutional descriptors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstitutionalDescriptors {
    /// Number of non-hydrogen atoms
    pub heavy_atom_count: usize,
    /// Number of rotatable single bonds (not in rings, not terminal, not next to a triple bond)
    pub num_rotatable_bonds: usize,
    /// Number of heteroatoms (any atom that is not C or H)
    pub num_heteroatoms: usize,
    /// Number of SSSR rings
    pub ring_count: usize,
    /// Rings made only of aromatic bonds
    pub num_aromatic_rings: usize,
    /// Rings with at least one non-aromatic bond
    pub num_aliphatic_rings: usize,
    /// Rings made only of single bonds
    pub num_saturated_rings: usize,
    /// Aromatic rings with carbon atoms only
    pub num_aromatic_carbocycles: usize,
    /// Aromatic rings with at least one heteroatom
    pub num_aromatic_heterocycles: usize,
    /// Aliphatic rings with carbon atoms only
    pub num_aliphatic_carbocycles: usize,
    /// Aliphatic rings with at least one heteroatom
    pub num_aliphatic_heterocycles: usize,
    /// Saturated rings with carbon atoms only
    pub num_saturated_carbocycles: usize,
    /// Saturated rings with at least one heteroatom
    pub num_saturated_heterocycles: usize,
    /// Fraction of carbons that are sp3 hybridized
    pub fraction_csp3: f64,
}

/// Compute all constitutional descriptors of a molecule.
///
/// # Examples
///
/// ```
/// use qsar_predict::descriptors::constitutional::constitutional_descriptors;
/// use qsar_predict::molecule::parse_smiles;
///
/// let desc = constitutional_descriptors(&parse_smiles("CC(=O)OC1=CC=CC=C1C(=O)O").unwrap()); // aspirin
/// assert_eq!(desc.heavy_atom_count, 13);
/// assert_eq!(desc.num_rotatable_bonds, 3);
/// assert_eq!(desc.num_aromatic_rings, 1);
/// assert_eq!(desc.num_heteroatoms, 4);
/// ```
pub fn constitutional_descriptors(mol: &Molecule) -> ConstitutionalDescriptors {
    let mut desc = ConstitutionalDescriptors {
        heavy_atom_count: mol.heavy_atom_count(),
        num_rotatable_bonds: count_rotatable_bonds(mol),
        num_heteroatoms: count_heteroatoms(mol),
        ring_count: mol.ring_info().num_rings(),
        num_aromatic_rings: 0,
        num_aliphatic_rings: 0,
        num_saturated_rings: 0,
        num_aromatic_carbocycles: 0,
        num_aromatic_heterocycles: 0,
        num_aliphatic_carbocycles: 0,
        num_aliphatic_heterocycles: 0,
        num_saturated_carbocycles: 0,
        num_saturated_heterocycles: 0,
        fraction_csp3: fraction_csp3(mol),
    };

    let rings = mol.ring_info();
    for (atoms, bonds) in rings.atom_rings().iter().zip(rings.bond_rings()) {
        let hetero = atoms.iter().any(|&a| mol.atom(a).atomic_number != 6);
        let aromatic = bonds.iter().all(|&b| mol.bond(b).order == BondOrder::Aromatic);
        let saturated = bonds.iter().all(|&b| mol.bond(b).order == BondOrder::Single);

        if aromatic {
            desc.num_aromatic_rings += 1;
            if hetero {
                desc.num_aromatic_heterocycles += 1;
            } else {
                desc.num_aromatic_carbocycles += 1;
            }
        } else {
            desc.num_aliphatic_rings += 1;
            if hetero {
                desc.num_aliphatic_heterocycles += 1;
            } else {
                desc.num_aliphatic_carbocycles += 1;
            }
        }
        if saturated {
            desc.num_saturated_rings += 1;
            if hetero {
                desc.num_saturated_heterocycles += 1;
            } else {
                desc.num_saturated_carbocycles += 1;
            }
        }
    }
    desc
}

// ————————————————————————————————————————————————————————————————————————
// Internal helpers
// ————————————————————————————————————————————————————————————————————————

const ROTATABLE_BOND_SMARTS: &str = "[!$(*#*)&!D1]-&!@[!$(*#*)&!D1]";

fn rotatable_bond_pattern() -> Option<&'static Pattern> {
    static PATTERN: OnceLock<Option<Pattern>> = OnceLock::new();
    PATTERN
        .get_or_init(|| compile_builtin(ROTATABLE_BOND_SMARTS))
        .as_ref()
}

fn count_rotatable_bonds(mol: &Molecule) -> usize {
    rotatable_bond_pattern().map_or(0, |p| p.count_matches(mol))
}

fn count_heteroatoms(mol: &Molecule) -> usize {
    mol.atoms()
        .iter()
        .filter(|a| element::is_heteroatom(a.atomic_number))
        .count()
}

fn fraction_csp3(mol: &Molecule) -> f64 {
    let carbons: Vec<usize> = (0..mol.atom_count())
        .filter(|&i| mol.atom(i).atomic_number == 6)
        .collect();
    if carbons.is_empty() {
        return 0.0;
    }
    let sp3 = carbons
        .iter()
        .filter(|&&i| mol.hybridization(i) == Hybridization::Sp3)
        .count();
    sp3 as f64 / carbons.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::parse_smiles;
    use approx::assert_relative_eq;

    fn desc(smiles: &str) -> ConstitutionalDescriptors {
        constitutional_descriptors(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn benzene_counts() {
        let d = desc("c1ccccc1");
        assert_eq!(d.heavy_atom_count, 6);
        assert_eq!(d.num_aromatic_rings, 1);
        assert_eq!(d.num_aromatic_carbocycles, 1);
        assert_eq!(d.num_aliphatic_rings, 0);
        assert_eq!(d.num_heteroatoms, 0);
        assert_eq!(d.num_rotatable_bonds, 0);
        assert_relative_eq!(d.fraction_csp3, 0.0);
    }

    #[test]
    fn saturated_heterocycle() {
        let d = desc("C1CCOCC1");
        assert_eq!(d.ring_count, 1);
        assert_eq!(d.num_saturated_heterocycles, 1);
        assert_eq!(d.num_aliphatic_heterocycles, 1);
        assert_eq!(d.num_saturated_carbocycles, 0);
        assert_relative_eq!(d.fraction_csp3, 1.0);
    }

    #[test]
    fn unsaturated_aliphatic_carbocycle() {
        let d = desc("C1=CCCCC1");
        assert_eq!(d.num_aliphatic_carbocycles, 1);
        assert_eq!(d.num_saturated_rings, 0);
        assert_relative_eq!(d.fraction_csp3, 4.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn caffeine_rings_and_heteroatoms() {
        let d = desc("CN1C=NC2=C1C(=O)N(C(=O)N2C)C");
        assert_eq!(d.heavy_atom_count, 14);
        assert_eq!(d.ring_count, 2);
        assert_eq!(d.num_heteroatoms, 6);
        assert_eq!(d.num_rotatable_bonds, 0);
    }

    #[test]
    fn rotatable_bonds_skip_triple_neighbors_and_terminals() {
        assert_eq!(desc("CCCC").num_rotatable_bonds, 1);
        assert_eq!(desc("CC#CC").num_rotatable_bonds, 0);
        assert_eq!(desc("CCCCC").num_rotatable_bonds, 2);
    }
}
