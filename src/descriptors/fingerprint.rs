// src/descriptors/fingerprint.rs
//! Molecular fingerprints: fixed-width bit vectors for QSAR/ML pipelines.
//!
//! Currently implemented:
//! - [`morgan_fingerprint`] → circular (Morgan/ECFP-style) fingerprint,
//!   radius 2 folded to 1024 bits by default
//! - [`crate::descriptors::maccs::maccs_keys`] → 167-bit MACCS keys
//!
//! All functions return deterministic results: the same molecule always sets
//! the same bits, across runs and threads.
//!
//! # Examples
//!
//! ```
//! use qsar_predict::descriptors::fingerprint::{morgan_fingerprint, MORGAN_BITS, MORGAN_RADIUS};
//! use qsar_predict::molecule::parse_smiles;
//!
//! let ethanol = parse_smiles("CCO").unwrap();
//! let fp = morgan_fingerprint(&ethanol, MORGAN_RADIUS, MORGAN_BITS);
//! assert_eq!(fp.len(), 1024);
//! assert!(fp.count_ones() > 0);
//! ```

use std::collections::BTreeSet;

use crate::molecule::Molecule;

/// Default Morgan radius used in the feature row.
pub const MORGAN_RADIUS: usize = 2;
/// Default Morgan width used in the feature row.
pub const MORGAN_BITS: usize = 1024;

/// A fixed-length bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    nbits: usize,
    words: Vec<u64>,
}

impl Fingerprint {
    /// All-zero fingerprint of `nbits` bits.
    pub fn new(nbits: usize) -> Self {
        Fingerprint {
            nbits,
            words: vec![0; nbits.div_ceil(64)],
        }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.nbits
    }

    /// Whether the fingerprint has zero width.
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    /// Set bit `idx`; out-of-range indices are ignored.
    pub fn set(&mut self, idx: usize) {
        if idx < self.nbits {
            self.words[idx / 64] |= 1 << (idx % 64);
        }
    }

    /// Whether bit `idx` is set.
    pub fn get(&self, idx: usize) -> bool {
        idx < self.nbits && self.words[idx / 64] & (1 << (idx % 64)) != 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of the set bits, ascending.
    pub fn on_bits(&self) -> Vec<usize> {
        (0..self.nbits).filter(|&i| self.get(i)).collect()
    }

    /// Bits as 0.0/1.0 feature values.
    pub fn to_features(&self) -> Vec<f64> {
        (0..self.nbits)
            .map(|i| if self.get(i) { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Compute a **Morgan circular fingerprint** folded to `nbits`.
///
/// Layer 0 hashes each atom's connectivity invariant (atomic number, total
/// degree, hydrogen count, formal charge, isotope offset, ring membership).
/// Each further layer hashes the previous identifier together with the
/// sorted (bond order, neighbor identifier) pairs. An identifier whose bond
/// environment was already produced is dropped, as is an atom whose
/// environment stopped growing.
///
/// # Example
/// ```
/// use qsar_predict::descriptors::fingerprint::morgan_fingerprint;
/// use qsar_predict::molecule::parse_smiles;
///
/// let a = morgan_fingerprint(&parse_smiles("c1ccccc1O").unwrap(), 2, 1024);
/// let b = morgan_fingerprint(&parse_smiles("Oc1ccccc1").unwrap(), 2, 1024);
/// assert_eq!(a, b); // atom order does not matter
/// ```
pub fn morgan_fingerprint(mol: &Molecule, radius: usize, nbits: usize) -> Fingerprint {
    let mut fp = Fingerprint::new(nbits);
    if nbits == 0 {
        return fp;
    }
    let n = mol.atom_count();
    let mut ids: Vec<u32> = (0..n).map(|i| atom_invariant(mol, i)).collect();
    for &id in &ids {
        fp.set(id as usize % nbits);
    }

    let mut environments: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut seen: BTreeSet<Vec<usize>> = BTreeSet::new();
    let mut active = vec![true; n];

    for layer in 0..radius {
        let mut next_ids = ids.clone();
        let mut next_envs = environments.clone();
        let mut candidates: Vec<(Vec<usize>, u32, usize)> = Vec::new();

        for atom in 0..n {
            if !active[atom] {
                continue;
            }
            let nbrs = mol.neighbors(atom);
            if nbrs.is_empty() {
                active[atom] = false;
                continue;
            }
            let mut pairs: Vec<(u32, u32)> = nbrs
                .iter()
                .map(|&(nbr, bond)| (mol.bond(bond).order.code(), ids[nbr]))
                .collect();
            pairs.sort_unstable();

            let mut seed = layer as u32;
            hash_combine(&mut seed, ids[atom]);
            for (code, nbr_id) in pairs {
                hash_combine(&mut seed, code);
                hash_combine(&mut seed, nbr_id);
            }
            next_ids[atom] = seed;

            let env = &mut next_envs[atom];
            for &(nbr, bond) in nbrs {
                env.insert(bond);
                env.extend(environments[nbr].iter().copied());
            }
            candidates.push((env.iter().copied().collect(), seed, atom));
        }

        // Equal environments keep the smallest identifier.
        candidates.sort();
        for (env, id, atom) in candidates {
            if env.len() == environments[atom].len() && layer > 0 {
                active[atom] = false;
                continue;
            }
            if seen.insert(env) {
                fp.set(id as usize % nbits);
            } else {
                active[atom] = false;
            }
        }
        ids = next_ids;
        environments = next_envs;
    }
    fp
}

// ————————————————————————————————————————————————————————————————————————
// Internal helpers
// ————————————————————————————————————————————————————————————————————————

fn hash_combine(seed: &mut u32, value: u32) {
    *seed ^= value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

fn atom_invariant(mol: &Molecule, idx: usize) -> u32 {
    let atom = mol.atom(idx);
    let isotope_delta = atom.isotope.map_or(0, |iso| {
        let nominal = crate::molecule::element::average_mass(atom.atomic_number)
            .map_or(0.0, f64::round) as i64;
        iso as i64 - nominal
    });
    let components = [
        atom.atomic_number as u32,
        mol.total_degree(idx) as u32,
        atom.hydrogens as u32,
        atom.formal_charge as i32 as u32,
        isotope_delta as i32 as u32,
        mol.ring_info().is_atom_in_ring(idx) as u32,
    ];
    let mut seed = 0u32;
    for c in components {
        hash_combine(&mut seed, c);
    }
    seed
}

// ————————————————————————————————————————————————————————————————————————
// Tests
// ————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::parse_smiles;

    fn morgan(smiles: &str) -> Fingerprint {
        morgan_fingerprint(&parse_smiles(smiles).unwrap(), MORGAN_RADIUS, MORGAN_BITS)
    }

    #[test]
    fn bit_vector_basics() {
        let mut fp = Fingerprint::new(70);
        assert_eq!(fp.len(), 70);
        fp.set(3);
        fp.set(69);
        fp.set(70); // ignored
        assert!(fp.get(3) && fp.get(69) && !fp.get(4));
        assert_eq!(fp.count_ones(), 2);
        assert_eq!(fp.on_bits(), vec![3, 69]);
        let features = fp.to_features();
        assert_eq!(features.len(), 70);
        assert_eq!(features.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn single_atom_sets_one_bit() {
        assert_eq!(morgan("C").count_ones(), 1);
    }

    #[test]
    fn deterministic_and_order_independent() {
        assert_eq!(morgan("CC(=O)Oc1ccccc1C(=O)O"), morgan("CC(=O)Oc1ccccc1C(=O)O"));
        assert_eq!(morgan("OCC"), morgan("CCO"));
    }

    #[test]
    fn benzene_environments_collapse() {
        // One atom type, one radius-1 and one radius-2 environment class.
        assert!(morgan("c1ccccc1").count_ones() <= 3);
    }

    #[test]
    fn different_molecules_differ() {
        assert_ne!(morgan("CCO"), morgan("CCN"));
        assert_ne!(morgan("CC=O"), morgan("CCO"));
    }
}
