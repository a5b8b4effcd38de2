// src/descriptors/topological.rs
//! Topological descriptors: graph-theoretical indices for QSAR.
//!
//! These are classic, highly interpretable descriptors derived from the
//! hydrogen-suppressed molecular graph. They capture size, branching,
//! cyclicity and shape.
//!
//! | Index                | Symbol       | Meaning                                          |
//! |----------------------|--------------|--------------------------------------------------|
//! | Wiener Index         | W            | Sum of all shortest path distances               |
//! | Balaban J            | J            | m/(μ+1) · Σ over bonds of (sᵢ·sⱼ)^-½             |
//! | Zagreb M1            | M1           | Sum of (degree²) over all atoms                  |
//! | Zagreb M2            | M2           | Sum of (degᵢ × degⱼ) over all bonds              |
//! | Kier-Hall χ          | χ0, χ1, χ0v, χ1v, χ2v | Simple and valence connectivity indices |
//! | Hall-Kier α          | α            | Size/hybridization correction for kappa          |
//! | Kappa Shape (κ₁–κ₃)  | κ₁, κ₂, κ₃   | Molecular shape and flexibility (α-modified)     |
//!
//! # Real-World Examples
//!
//! ```
//! use qsar_predict::descriptors::topological::topological_descriptors;
//! use qsar_predict::molecule::parse_smiles;
//! use approx::assert_relative_eq;
//!
//! // n-Hexane (linear)
//! let hexane = topological_descriptors(&parse_smiles("CCCCCC").unwrap());
//! assert_eq!(hexane.wiener, 35);
//! assert_relative_eq!(hexane.balaban_j, 2.339, epsilon = 0.001);
//! assert_eq!(hexane.zagreb_m1, 18);
//!
//! // Benzene (cyclic + aromatic)
//! let benzene = topological_descriptors(&parse_smiles("c1ccccc1").unwrap());
//! assert_eq!(benzene.wiener, 27);
//! assert_relative_eq!(benzene.chi1, 3.0, epsilon = 1e-9);
//! assert_eq!(benzene.zagreb_m2, 24);
//! ```

use crate::molecule::{element, Hybridization, Molecule};

/// Container for the topological indices used in the feature row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologicalDescriptors {
    /// Wiener index: sum of all topological distances
    pub wiener: u64,
    /// Balaban J index
    pub balaban_j: f64,
    /// First Zagreb index: Σ(degree²)
    pub zagreb_m1: u32,
    /// Second Zagreb index: Σ(degᵢ × degⱼ) over bonds
    pub zagreb_m2: u32,
    /// Zero-order connectivity index
    pub chi0: f64,
    /// First-order connectivity (Randić) index
    pub chi1: f64,
    /// Zero-order valence connectivity index
    pub chi0v: f64,
    /// First-order valence connectivity index
    pub chi1v: f64,
    /// Second-order valence connectivity index
    pub chi2v: f64,
    /// Hall-Kier alpha
    pub hall_kier_alpha: f64,
    /// First-order Kappa shape index
    pub kappa1: f64,
    /// Second-order Kappa shape index
    pub kappa2: f64,
    /// Third-order Kappa shape index
    pub kappa3: f64,
}

/// Compute all topological descriptors of a molecule.
///
/// # Examples
///
/// ```
/// use qsar_predict::descriptors::topological::topological_descriptors;
/// use qsar_predict::molecule::parse_smiles;
///
/// let desc = topological_descriptors(&parse_smiles("CCO").unwrap()); // ethanol
/// assert_eq!(desc.wiener, 4);
/// assert!((desc.chi1 - 1.4142).abs() < 1e-3);
/// assert_eq!(desc.zagreb_m1, 6);
/// ```
pub fn topological_descriptors(mol: &Molecule) -> TopologicalDescriptors {
    let degrees: Vec<usize> = (0..mol.atom_count()).map(|i| mol.heavy_degree(i)).collect();
    let deltas_v: Vec<f64> = (0..mol.atom_count()).map(|i| valence_delta(mol, i)).collect();

    let mut zagreb_m1 = 0u32;
    let mut chi0 = 0.0;
    let mut chi0v = 0.0;
    for (i, &d) in degrees.iter().enumerate() {
        zagreb_m1 += (d * d) as u32;
        if d > 0 {
            chi0 += 1.0 / (d as f64).sqrt();
        }
        if deltas_v[i] > 0.0 {
            chi0v += 1.0 / deltas_v[i].sqrt();
        }
    }

    let mut zagreb_m2 = 0u32;
    let mut chi1 = 0.0;
    let mut chi1v = 0.0;
    for bond in mol.bonds() {
        let (a, b) = (bond.begin, bond.end);
        zagreb_m2 += (degrees[a] * degrees[b]) as u32;
        if degrees[a] > 0 && degrees[b] > 0 {
            chi1 += 1.0 / ((degrees[a] * degrees[b]) as f64).sqrt();
        }
        let product = deltas_v[a] * deltas_v[b];
        if product > 0.0 {
            chi1v += 1.0 / product.sqrt();
        }
    }

    let mut chi2v = 0.0;
    for center in 0..mol.atom_count() {
        let nbrs = mol.neighbors(center);
        for (x, &(i, _)) in nbrs.iter().enumerate() {
            for &(k, _) in &nbrs[x + 1..] {
                let product = deltas_v[i] * deltas_v[center] * deltas_v[k];
                if product > 0.0 {
                    chi2v += 1.0 / product.sqrt();
                }
            }
        }
    }

    let distances = mol.distance_matrix();
    let wiener = wiener_index(&distances);
    let balaban_j = balaban_j(mol, &distances);
    let alpha = hall_kier_alpha(mol);
    let (kappa1, kappa2, kappa3) = kappa_indices(mol, &degrees, alpha);

    TopologicalDescriptors {
        wiener,
        balaban_j,
        zagreb_m1,
        zagreb_m2,
        chi0,
        chi1,
        chi0v,
        chi1v,
        chi2v,
        hall_kier_alpha: alpha,
        kappa1,
        kappa2,
        kappa3,
    }
}

// ————————————————————————————————————————————————————————————————————————
// Internal helpers
// ————————————————————————————————————————————————————————————————————————

/// Kier-Hall valence delta: (Zv - h) for the first row, scaled by the core
/// electron count for heavier elements.
fn valence_delta(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    let z = atom.atomic_number as f64;
    let zv = element::outer_electrons(atom.atomic_number) as f64 - atom.formal_charge as f64;
    let dv = zv - atom.hydrogens as f64;
    if atom.atomic_number > 10 {
        let core = z - zv - 1.0;
        if core > 0.0 {
            return dv / core;
        }
    }
    dv
}

fn wiener_index(distances: &[Vec<Option<usize>>]) -> u64 {
    let mut total = 0u64;
    for (i, row) in distances.iter().enumerate() {
        for d in row.iter().skip(i + 1).flatten() {
            total += *d as u64;
        }
    }
    total
}

fn balaban_j(mol: &Molecule, distances: &[Vec<Option<usize>>]) -> f64 {
    let m = mol.bond_count();
    if m == 0 {
        return 0.0;
    }
    let sums: Vec<f64> = distances
        .iter()
        .map(|row| row.iter().flatten().sum::<usize>() as f64)
        .collect();
    let mu = mol.ring_info().num_rings() as f64;
    let mut total = 0.0;
    for bond in mol.bonds() {
        let product = sums[bond.begin] * sums[bond.end];
        if product > 0.0 {
            total += 1.0 / product.sqrt();
        }
    }
    m as f64 / (mu + 1.0) * total
}

fn covalent_radius(atomic_number: u8) -> Option<f64> {
    Some(match atomic_number {
        5 => 0.82,
        6 => 0.77,
        7 => 0.70,
        8 => 0.66,
        9 => 0.64,
        14 => 1.11,
        15 => 1.10,
        16 => 1.04,
        17 => 0.99,
        33 => 1.21,
        34 => 1.17,
        35 => 1.14,
        53 => 1.33,
        _ => return None,
    })
}

/// Hall-Kier alpha: tabulated per element and hybridization, falling back to
/// the covalent-radius ratio against sp3 carbon.
fn hall_kier_alpha(mol: &Molecule) -> f64 {
    let mut alpha = 0.0;
    for idx in 0..mol.atom_count() {
        let z = mol.atom(idx).atomic_number;
        if z == 1 {
            continue;
        }
        let hyb = mol.hybridization(idx);
        let tabulated = match (z, hyb) {
            (6, Hybridization::Sp) => Some(-0.22),
            (6, Hybridization::Sp2) => Some(-0.13),
            (6, _) => Some(0.0),
            (7, Hybridization::Sp) => Some(-0.29),
            (7, Hybridization::Sp2) => Some(-0.20),
            (7, _) => Some(-0.04),
            (8, Hybridization::Sp2) => Some(-0.20),
            (8, Hybridization::Sp3) => Some(-0.04),
            (9, Hybridization::Sp3) => Some(-0.07),
            (15, Hybridization::Sp2) => Some(0.30),
            (15, Hybridization::Sp3) => Some(0.43),
            (16, Hybridization::Sp2) => Some(0.22),
            (16, Hybridization::Sp3) => Some(0.35),
            (17, Hybridization::Sp3) => Some(0.29),
            (35, Hybridization::Sp3) => Some(0.48),
            (53, Hybridization::Sp3) => Some(0.73),
            _ => None,
        };
        alpha += tabulated
            .or_else(|| covalent_radius(z).map(|r| r / 0.77 - 1.0))
            .unwrap_or(0.0);
    }
    alpha
}

/// Number of paths of two and three bonds in the heavy-atom graph.
fn path_counts(mol: &Molecule, degrees: &[usize]) -> (f64, f64) {
    let p2: usize = degrees.iter().map(|&d| d * d.saturating_sub(1) / 2).sum();
    let mut p3 = 0usize;
    for bond in mol.bonds() {
        let (j, k) = (bond.begin, bond.end);
        let outward = degrees[j].saturating_sub(1) * degrees[k].saturating_sub(1);
        let closing = mol
            .neighbors(j)
            .iter()
            .filter(|(n, _)| *n != k && mol.bond_between(*n, k).is_some())
            .count();
        p3 += outward.saturating_sub(closing);
    }
    (p2 as f64, p3 as f64)
}

fn kappa_indices(mol: &Molecule, degrees: &[usize], alpha: f64) -> (f64, f64, f64) {
    let a = mol.heavy_atom_count() as f64;
    let p1 = mol.bond_count() as f64;
    let (p2, p3) = path_counts(mol, degrees);

    let ratio = |num: f64, p: f64| {
        let denom = (p + alpha) * (p + alpha);
        if p == 0.0 || denom == 0.0 {
            0.0
        } else {
            num / denom
        }
    };

    let k1 = ratio((a + alpha) * (a + alpha - 1.0).powi(2), p1);
    let k2 = ratio((a + alpha - 1.0) * (a + alpha - 2.0).powi(2), p2);
    let k3 = if mol.heavy_atom_count() % 2 == 1 {
        ratio((a + alpha - 1.0) * (a + alpha - 3.0).powi(2), p3)
    } else {
        ratio((a + alpha - 3.0) * (a + alpha - 2.0).powi(2), p3)
    };
    (k1, k2, k3)
}

// ————————————————————————————————————————————————————————————————————————
// Tests against known literature values
// ————————————————————————————————————————————————————————————————————————
