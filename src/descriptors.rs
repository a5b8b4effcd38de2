//! Molecular descriptor calculations.
//!
//! Every function in this module tree works on a parsed [`Molecule`]. The
//! feature row used for prediction starts with the fixed block assembled by
//! [`descriptor_block`]: the [`DESCRIPTOR_NAMES`] global descriptors followed by
//! the seven [`COUNT_NAMES`] Lipinski-style counts. When a molecule cannot be
//! described the whole block is replaced by [`nan_block`], so one bad structure
//! never shifts the columns of its row.
//!
//! # Examples
//!
//! ```
//! use qsar_predict::descriptors::{descriptor_block, DESCRIPTOR_BLOCK_WIDTH};
//! use qsar_predict::molecule::parse_smiles;
//!
//! let ethanol = parse_smiles("CCO").unwrap();
//! let block = descriptor_block(&ethanol).unwrap();
//! assert_eq!(block.len(), DESCRIPTOR_BLOCK_WIDTH);
//! assert!(block.iter().all(|v| v.is_finite()));
//! ```
use thiserror::Error;

use crate::molecule::Molecule;
use crate::smarts::SmartsError;

pub mod constitutional;
pub mod fingerprint;
pub mod fragments;
pub mod maccs;
pub mod physicochemical;
pub mod topological;

/// Errors returned by the parser and the descriptor functions.
///
/// - `ParseError`: the SMILES string is malformed or chemically impossible.
/// - `UnknownElement`: an element symbol (or the wildcard atom) has no data in
///   the built-in element table.
/// - `Pattern`: a substructure query could not be compiled.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The provided input could not be parsed.
    #[error("unsupported or invalid molecule string: {0}")]
    ParseError(String),

    /// An element was found for which we don't have the needed data.
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// A substructure query failed to compile.
    #[error("bad substructure query: {0}")]
    Pattern(#[from] SmartsError),
}

/// Names of the global descriptors, in feature-column order.
pub const DESCRIPTOR_NAMES: [&str; 42] = [
    "MolWt",
    "HeavyAtomMolWt",
    "ExactMolWt",
    "NumValenceElectrons",
    "MolLogP",
    "MolMR",
    "TPSA",
    "HeavyAtomCount",
    "NHOHCount",
    "NOCount",
    "RingCount",
    "NumAromaticCarbocycles",
    "NumAromaticHeterocycles",
    "NumAliphaticCarbocycles",
    "NumAliphaticHeterocycles",
    "NumSaturatedCarbocycles",
    "NumSaturatedHeterocycles",
    "FractionCSP3",
    "BalabanJ",
    "Chi0",
    "Chi1",
    "Chi0v",
    "Chi1v",
    "Chi2v",
    "HallKierAlpha",
    "Kappa1",
    "Kappa2",
    "Kappa3",
    "WienerIndex",
    "ZagrebM1",
    "ZagrebM2",
    "fr_Al_OH",
    "fr_Ar_OH",
    "fr_C_O",
    "fr_COO",
    "fr_NH2",
    "fr_amide",
    "fr_ester",
    "fr_ether",
    "fr_halogen",
    "fr_nitro",
    "fr_benzene",
];

/// Names of the seven derived counts that follow the global descriptors.
pub const COUNT_NAMES: [&str; 7] = [
    "NumHDonors",
    "NumHAcceptors",
    "NumRotatableBonds",
    "NumAromaticRings",
    "NumAliphaticRings",
    "NumSaturatedRings",
    "NumHeteroatoms",
];

/// Width of the descriptor + count block.
pub const DESCRIPTOR_BLOCK_WIDTH: usize = DESCRIPTOR_NAMES.len() + COUNT_NAMES.len();

/// Global descriptors in [`DESCRIPTOR_NAMES`] order.
///
/// # Errors
///
/// Fails when an atom has no mass data.
pub fn global_descriptors(mol: &Molecule) -> Result<Vec<f64>, DescriptorError> {
    let phys = physicochemical::physchem_descriptors(mol)?;
    let cons = constitutional::constitutional_descriptors(mol);
    let topo = topological::topological_descriptors(mol);
    let frags = fragments::fragment_counts(mol);

    let mut out = Vec::with_capacity(DESCRIPTOR_NAMES.len());
    out.extend([
        phys.mol_wt,
        phys.heavy_atom_mol_wt,
        phys.exact_mol_wt,
        phys.num_valence_electrons,
        phys.mol_log_p,
        phys.mol_mr,
        phys.tpsa,
        cons.heavy_atom_count as f64,
        phys.nhoh_count as f64,
        phys.no_count as f64,
        cons.ring_count as f64,
        cons.num_aromatic_carbocycles as f64,
        cons.num_aromatic_heterocycles as f64,
        cons.num_aliphatic_carbocycles as f64,
        cons.num_aliphatic_heterocycles as f64,
        cons.num_saturated_carbocycles as f64,
        cons.num_saturated_heterocycles as f64,
        cons.fraction_csp3,
        topo.balaban_j,
        topo.chi0,
        topo.chi1,
        topo.chi0v,
        topo.chi1v,
        topo.chi2v,
        topo.hall_kier_alpha,
        topo.kappa1,
        topo.kappa2,
        topo.kappa3,
        topo.wiener as f64,
        topo.zagreb_m1 as f64,
        topo.zagreb_m2 as f64,
    ]);
    out.extend(frags.iter().map(|&c| c as f64));
    debug_assert_eq!(out.len(), DESCRIPTOR_NAMES.len());
    Ok(out)
}

/// The seven derived counts in [`COUNT_NAMES`] order.
pub fn lipinski_counts(mol: &Molecule) -> [f64; 7] {
    let cons = constitutional::constitutional_descriptors(mol);
    [
        physicochemical::h_bond_donors(mol) as f64,
        physicochemical::h_bond_acceptors(mol) as f64,
        cons.num_rotatable_bonds as f64,
        cons.num_aromatic_rings as f64,
        cons.num_aliphatic_rings as f64,
        cons.num_saturated_rings as f64,
        cons.num_heteroatoms as f64,
    ]
}

/// Global descriptors followed by the derived counts.
pub fn descriptor_block(mol: &Molecule) -> Result<Vec<f64>, DescriptorError> {
    let mut block = global_descriptors(mol)?;
    block.extend(lipinski_counts(mol));
    Ok(block)
}

/// Sentinel block for molecules that could not be parsed or described.
pub fn nan_block() -> Vec<f64> {
    vec![f64::NAN; DESCRIPTOR_BLOCK_WIDTH]
}
