// src/descriptors/physicochemical.rs
//! Physicochemical descriptors commonly used in QSAR.
//!
//! - **MolWt / HeavyAtomMolWt / ExactMolWt** – average, heavy-atom-only and
//!   monoisotopic masses
//! - **NumValenceElectrons** – outer-shell electrons, hydrogens included
//! - **MolLogP / MolMR** – Wildman-Crippen atom contributions
//! - **TPSA** – Topological Polar Surface Area (Ertl et al., N and O only)
//! - **NumHDonors / NumHAcceptors** – Lipinski-style SMARTS definitions
//! - **NHOHCount / NOCount**
//!
//! Crippen atom types are assigned by the first matching entry of an ordered
//! SMARTS table; hydrogens are typed from their heavy neighbor.

use std::sync::OnceLock;

use super::DescriptorError;
use crate::molecule::{element, BondOrder, Molecule};
use crate::smarts::{compile_builtin, Pattern};

/// Container for the physicochemical descriptors of one molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysChemDescriptors {
    /// Average molecular weight (Daltons)
    pub mol_wt: f64,
    /// Average molecular weight ignoring hydrogens
    pub heavy_atom_mol_wt: f64,
    /// Monoisotopic molecular weight
    pub exact_mol_wt: f64,
    /// Outer-shell electrons corrected for formal charge
    pub num_valence_electrons: f64,
    /// Wildman-Crippen LogP
    pub mol_log_p: f64,
    /// Wildman-Crippen molar refractivity
    pub mol_mr: f64,
    /// Topological Polar Surface Area (Å²)
    pub tpsa: f64,
    /// Number of hydrogen bond donors
    pub h_bond_donors: usize,
    /// Number of hydrogen bond acceptors
    pub h_bond_acceptors: usize,
    /// Hydrogens attached to N or O
    pub nhoh_count: usize,
    /// Number of N and O atoms
    pub no_count: usize,
}

/// Compute all physicochemical descriptors of a molecule.
///
/// # Examples
///
/// ```
/// use qsar_predict::descriptors::physicochemical::physchem_descriptors;
/// use qsar_predict::molecule::parse_smiles;
///
/// let desc = physchem_descriptors(&parse_smiles("CCO").unwrap()).unwrap();  // ethanol
/// assert!((desc.mol_wt - 46.069).abs() < 1e-3);
/// assert!((desc.mol_log_p + 0.0014).abs() < 1e-3);
/// assert_eq!(desc.h_bond_donors, 1);
/// assert_eq!(desc.h_bond_acceptors, 1);
/// assert!((desc.tpsa - 20.23).abs() < 1e-6);
/// ```
///
/// # Errors
///
/// `DescriptorError::UnknownElement` when an atom has no mass data.
pub fn physchem_descriptors(mol: &Molecule) -> Result<PhysChemDescriptors, DescriptorError> {
    let (mol_log_p, mol_mr) = crippen_contribs(mol);
    Ok(PhysChemDescriptors {
        mol_wt: molecular_weight(mol)?,
        heavy_atom_mol_wt: heavy_atom_molecular_weight(mol)?,
        exact_mol_wt: exact_molecular_weight(mol)?,
        num_valence_electrons: num_valence_electrons(mol),
        mol_log_p,
        mol_mr,
        tpsa: tpsa(mol),
        h_bond_donors: h_bond_donors(mol),
        h_bond_acceptors: h_bond_acceptors(mol),
        nhoh_count: nhoh_count(mol),
        no_count: no_count(mol),
    })
}

// ---------------------------------------------------------------------------
// 1. Masses
// ---------------------------------------------------------------------------

fn atom_mass(
    mol: &Molecule,
    idx: usize,
    lookup: fn(u8) -> Option<f64>,
) -> Result<f64, DescriptorError> {
    let atom = mol.atom(idx);
    match atom.isotope {
        Some(mass_number) if atom.atomic_number > 0 => Ok(mass_number as f64),
        _ => lookup(atom.atomic_number)
            .ok_or_else(|| DescriptorError::UnknownElement(atom.symbol().to_string())),
    }
}

fn summed_mass(
    mol: &Molecule,
    lookup: fn(u8) -> Option<f64>,
    with_hydrogens: bool,
) -> Result<f64, DescriptorError> {
    let hydrogen = lookup(1).unwrap_or(1.008);
    let mut total = 0.0;
    for (idx, atom) in mol.atoms().iter().enumerate() {
        if atom.atomic_number == 1 && !with_hydrogens {
            continue;
        }
        total += atom_mass(mol, idx, lookup)?;
        if with_hydrogens {
            total += atom.hydrogens as f64 * hydrogen;
        }
    }
    Ok(total)
}

/// Average molecular weight including all hydrogens.
pub fn molecular_weight(mol: &Molecule) -> Result<f64, DescriptorError> {
    summed_mass(mol, element::average_mass, true)
}

/// Average molecular weight of the heavy atoms only.
pub fn heavy_atom_molecular_weight(mol: &Molecule) -> Result<f64, DescriptorError> {
    summed_mass(mol, element::average_mass, false)
}

/// Monoisotopic molecular weight including all hydrogens.
pub fn exact_molecular_weight(mol: &Molecule) -> Result<f64, DescriptorError> {
    summed_mass(mol, element::monoisotopic_mass, true)
}

/// Outer-shell electrons of all atoms, one per hydrogen, minus formal charge.
pub fn num_valence_electrons(mol: &Molecule) -> f64 {
    mol.atoms()
        .iter()
        .map(|a| {
            element::outer_electrons(a.atomic_number) as f64 - a.formal_charge as f64
                + a.hydrogens as f64
        })
        .sum()
}

// ---------------------------------------------------------------------------
// 2. Wildman-Crippen LogP / MR
// ---------------------------------------------------------------------------

/// (type label, SMARTS, logP contribution, MR contribution); first match wins.
const CRIPPEN_TABLE: &[(&str, &str, f64, f64)] = &[
    ("C1", "[CH4]", 0.1441, 2.503),
    ("C1", "[CH3]C", 0.1441, 2.503),
    ("C1", "[CH2](C)C", 0.1441, 2.503),
    ("C2", "[CH](C)(C)C", 0.0, 2.433),
    ("C2", "[C](C)(C)(C)C", 0.0, 2.433),
    ("C3", "[CH3][N,O,P,S,F,Cl,Br,I]", -0.2035, 2.753),
    ("C3", "[CH2X4]([N,O,P,S,F,Cl,Br,I])[A;!#1]", -0.2035, 2.753),
    ("C4", "[CH1X4]([N,O,P,S,F,Cl,Br,I])([A;!#1])[A;!#1]", -0.2051, 2.731),
    ("C4", "[CH0X4]([N,O,P,S,F,Cl,Br,I])([A;!#1])([A;!#1])[A;!#1]", -0.2051, 2.731),
    ("C5", "[C]=[!C;A;!#1]", -0.2783, 5.007),
    ("C6", "[CH2]=C", 0.1551, 3.513),
    ("C6", "[CH1](=C)[A;!#1]", 0.1551, 3.513),
    ("C6", "[CH0](=C)([A;!#1])[A;!#1]", 0.1551, 3.513),
    ("C6", "[C](=C)=C", 0.1551, 3.513),
    ("C7", "[CX2]#[A;!#1]", 0.0017, 3.888),
    ("C8", "[CH3]c", 0.08452, 2.464),
    ("C9", "[CH3]a", -0.1444, 2.412),
    ("C10", "[CH2X4]a", -0.0516, 2.488),
    ("C11", "[CHX4]a", 0.1193, 2.582),
    ("C12", "[CH0X4]a", -0.0967, 2.576),
    ("C13", "[cH0]-[A;!C;!N;!O;!S;!F;!Cl;!Br;!I;!#1]", -0.5443, 4.041),
    ("C14", "[c][#9]", 0.0, 3.257),
    ("C15", "[c][#17]", 0.245, 3.564),
    ("C16", "[c][#35]", 0.198, 3.18),
    ("C17", "[c][#53]", 0.0, 3.104),
    ("C18", "[cH]", 0.1581, 3.35),
    ("C19", "[c](:a)(:a):a", 0.2955, 4.346),
    ("C20", "[c](:a)(:a)-a", 0.2713, 3.904),
    ("C21", "[c](:a)(:a)-C", 0.136, 3.509),
    ("C22", "[c](:a)(:a)-N", 0.4619, 3.067),
    ("C23", "[c](:a)(:a)-O", 0.5437, 3.853),
    ("C24", "[c](:a)(:a)-S", 0.1893, 2.673),
    ("C25", "[c](:a)(:a)=[C,N,O]", -0.8186, 3.135),
    ("C26", "[C](=C)(a)[A;!#1]", 0.264, 4.305),
    ("C26", "[C](=C)(c)a", 0.264, 4.305),
    ("C26", "[CH1](=C)a", 0.264, 4.305),
    ("C26", "[C]=c", 0.264, 4.305),
    ("C27", "[CX4][A;!C;!N;!O;!P;!S;!F;!Cl;!Br;!I;!#1]", 0.2148, 2.693),
    ("CS", "[#6]", 0.08129, 3.243),
    ("N1", "[NH2+0][A;!#1]", -1.019, 2.262),
    ("N2", "[NH+0]([A;!#1])[A;!#1]", -0.7096, 2.173),
    ("N3", "[NH2+0]a", -1.027, 2.827),
    ("N4", "[NH1+0](a)[A;!#1]", -0.5188, 3.0),
    ("N5", "[NH+0](a)a", 0.08387, 1.757),
    ("N6", "[N+0]([A;!#1])([A;!#1])[A;!#1]", -0.3187, 2.428),
    ("N7", "[N+0](a)([A;!#1])[A;!#1]", -0.4458, 2.839),
    ("N8", "[N+0](a)(a)[A;!#1]", 0.01508, 2.819),
    ("N8", "[N+0](a)(a)a", 0.01508, 2.819),
    ("N9", "[N+0]#[A;!#1]", -0.4806, 2.202),
    ("N10", "[NH3,NH2,NH;+,+2,+3]", -1.95, 0.0),
    ("N11", "[n+0]", -0.3239, 2.202),
    ("N12", "[n;+,+2,+3]", -1.119, 0.0),
    ("N13", "[NH0;+,+2,+3]([A;!#1])([A;!#1])([A;!#1])[A;!#1]", -0.3396, 0.2604),
    ("N13", "[NH0;+,+2,+3](=[A;!#1])([A;!#1])[!#1]", -0.3396, 0.2604),
    ("N13", "[NH0;+,+2,+3](=[#6])=[#7]", -0.3396, 0.2604),
    ("N13", "[N;+,+2,+3]#[A;!#1]", -0.3396, 0.2604),
    ("N13", "[N;-,-2,-3]", -0.3396, 0.2604),
    ("N14", "[N;+,+2,+3]=[N;-,-2,-3]", 0.2578, 0.5),
    ("NS", "[#7]", -0.4806, 2.134),
    ("O1", "[o]", 0.1552, 1.08),
    ("O2", "[OH,OH2]", -0.2893, 0.8238),
    ("O3", "[O]([A;!#1])[A;!#1]", -0.0684, 1.085),
    ("O4", "[O](a)[A;!#1]", -0.4195, 1.182),
    ("O4", "[O](a)a", -0.4195, 1.182),
    ("O5", "[O]=[#7,#8]", 0.0335, 3.367),
    ("O5", "[OX1;-;$([OX1;-][#7])]", 0.0335, 3.367),
    ("O6", "[OX1;-;$([OX1;-][#16])]", -0.3339, 0.7774),
    ("O12", "[O-]C(=O)", -1.326, 0.0),
    ("O7", "[OX1;-;$([OX1;-][!#7;!#16])]", -1.189, 0.0),
    ("O8", "[O]=c", 0.1788, 3.135),
    ("O9", "[O]=[CH]C", -0.1526, 0.0),
    ("O9", "O=C(C)C", -0.1526, 0.0),
    ("O9", "O=C(C)[A;!#1]", -0.1526, 0.0),
    ("O9", "[O]=[CH]N", -0.1526, 0.0),
    ("O9", "[O]=[CH]O", -0.1526, 0.0),
    ("O9", "[O]=[CH2]", -0.1526, 0.0),
    ("O9", "[O]=[CX2]=O", -0.1526, 0.0),
    ("O10", "[O]=[CH]c", 0.1129, 0.2215),
    ("O10", "O=C([C,c])[a;!#1]", 0.1129, 0.2215),
    ("O10", "O=C(c)[A;!#1]", 0.1129, 0.2215),
    ("O11", "[O]=C([!#1;!#6])[!#1;!#6]", 0.4833, 0.389),
    ("OS", "[#8]", -0.1188, 0.6865),
    ("F", "[#9-0]", 0.4202, 1.108),
    ("Cl", "[#17-0]", 0.6895, 5.853),
    ("Br", "[#35-0]", 0.8456, 8.927),
    ("I", "[#53-0]", 0.8857, 14.02),
    ("Hal", "[#9,#17,#35,#53;-]", -2.996, 0.0),
    ("P", "[#15]", 0.8612, 6.92),
    ("S1", "[S-0]", 0.6482, 7.591),
    ("S2", "[S-,S-2,S-3,S-4,S+,S+2,S+3,S+4]", -0.0024, 7.365),
    ("S3", "[s]", 0.6237, 6.691),
    ("Me1", "[#3,#11,#19,#37,#55]", -0.3808, 5.754),
    ("Me2", "[#4,#12,#20,#38,#56]", -0.0025, 0.0),
];

struct CrippenType {
    label: &'static str,
    pattern: Pattern,
    log_p: f64,
    mr: f64,
}

fn crippen_types() -> &'static [CrippenType] {
    static TYPES: OnceLock<Vec<CrippenType>> = OnceLock::new();
    TYPES.get_or_init(|| {
        CRIPPEN_TABLE
            .iter()
            .filter_map(|&(label, smarts, log_p, mr)| {
                compile_builtin(smarts).map(|pattern| CrippenType {
                    label,
                    pattern,
                    log_p,
                    mr,
                })
            })
            .collect()
    })
}

/// Crippen atom type label of a heavy atom, if any entry matches.
pub fn crippen_atom_type(mol: &Molecule, atom: usize) -> Option<&'static str> {
    crippen_types()
        .iter()
        .find(|t| t.pattern.matches_at(mol, atom))
        .map(|t| t.label)
}

/// (logP, MR) of one hydrogen attached to `heavy`.
fn hydrogen_contribution(mol: &Molecule, heavy: usize) -> (f64, f64) {
    const H1: (f64, f64) = (0.123, 1.057);
    const H2: (f64, f64) = (-0.2677, 1.395);
    const H3: (f64, f64) = (0.2142, 0.9627);
    const H4: (f64, f64) = (0.298, 1.805);
    const HS: (f64, f64) = (0.1125, 1.112);

    let atom = mol.atom(heavy);
    match atom.atomic_number {
        1 | 6 => H1,
        7 => H3,
        8 => match mol.neighbors(heavy).first() {
            Some(&(nbr, _)) => {
                let n = mol.atom(nbr);
                match n.atomic_number {
                    6 if n.aromatic || mol.total_degree(nbr) == 4 => H2,
                    6 => {
                        let acid_like = mol.neighbors(nbr).iter().any(|&(other, b)| {
                            mol.bond(b).order == BondOrder::Double
                                && matches!(mol.atom(other).atomic_number, 6 | 7 | 8 | 16)
                        });
                        if acid_like {
                            H4
                        } else {
                            HS
                        }
                    }
                    7 => H3,
                    8 | 16 => H4,
                    _ => H2,
                }
            }
            None => HS,
        },
        _ => H2,
    }
}

/// Wildman-Crippen (logP, MR), hydrogens included.
pub fn crippen_contribs(mol: &Molecule) -> (f64, f64) {
    let types = crippen_types();
    let mut log_p = 0.0;
    let mut mr = 0.0;
    for (idx, atom) in mol.atoms().iter().enumerate() {
        if let Some(t) = types.iter().find(|t| t.pattern.matches_at(mol, idx)) {
            log_p += t.log_p;
            mr += t.mr;
        }
        if atom.hydrogens > 0 {
            let (h_log_p, h_mr) = hydrogen_contribution(mol, idx);
            log_p += h_log_p * atom.hydrogens as f64;
            mr += h_mr * atom.hydrogens as f64;
        }
    }
    (log_p, mr)
}

// ---------------------------------------------------------------------------
// 3. TPSA
// ---------------------------------------------------------------------------

/// Ertl polar surface contribution of one N or O atom.
fn tpsa_contribution(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    let (mut single, mut double, mut triple, mut aromatic) = (0u8, 0u8, 0u8, 0u8);
    for &(_, b) in mol.neighbors(idx) {
        match mol.bond(b).order {
            BondOrder::Single => single += 1,
            BondOrder::Double => double += 1,
            BondOrder::Triple | BondOrder::Quadruple => triple += 1,
            BondOrder::Aromatic => aromatic += 1,
        }
    }
    let h = atom.hydrogens;
    let q = atom.formal_charge;
    let in_3_ring = mol.ring_info().is_atom_in_ring_of_size(idx, 3);
    let heavy = mol.degree(idx) as f64;

    match atom.atomic_number {
        7 => match (single, double, triple, aromatic, h, q) {
            (3, 0, 0, 0, 0, 0) if in_3_ring => 3.01,
            (3, 0, 0, 0, 0, 0) => 3.24,
            (1, 1, 0, 0, 0, 0) => 12.36,
            (0, 0, 1, 0, 0, 0) => 23.79,
            (1, 2, 0, 0, 0, 0) => 11.68,
            (0, 1, 1, 0, 0, 0) => 13.6,
            (2, 0, 0, 0, 1, 0) if in_3_ring => 21.94,
            (2, 0, 0, 0, 1, 0) => 12.03,
            (0, 1, 0, 0, 1, 0) => 23.85,
            (1, 0, 0, 0, 2, 0) => 26.02,
            (4, 0, 0, 0, 0, 1) => 0.0,
            (2, 1, 0, 0, 0, 1) => 3.01,
            (1, 0, 1, 0, 0, 1) => 4.36,
            (3, 0, 0, 0, 1, 1) => 4.44,
            (1, 1, 0, 0, 1, 1) => 13.97,
            (2, 0, 0, 0, 2, 1) => 16.61,
            (0, 1, 0, 0, 2, 1) => 25.59,
            (1, 0, 0, 0, 3, 1) => 27.64,
            (0, 0, 0, 2, 0, 0) => 12.89,
            (0, 0, 0, 3, 0, 0) => 4.41,
            (1, 0, 0, 2, 0, 0) => 4.93,
            (0, 1, 0, 2, 0, 0) => 8.39,
            (0, 0, 0, 2, 1, 0) => 15.79,
            (0, 0, 0, 3, 0, 1) => 4.1,
            (1, 0, 0, 2, 0, 1) => 3.88,
            (0, 0, 0, 2, 1, 1) => 14.14,
            _ => (30.5 - 8.2 * heavy + 1.5 * h as f64).max(0.0),
        },
        8 => match (single, double, aromatic, h, q) {
            (2, 0, 0, 0, 0) if in_3_ring => 12.53,
            (2, 0, 0, 0, 0) => 9.23,
            (0, 0, 2, 0, 0) => 13.14,
            (0, 1, 0, 0, 0) => 17.07,
            (1, 0, 0, 1, 0) => 20.23,
            (1, 0, 0, 0, -1) => 23.06,
            _ => (28.5 - 8.6 * heavy + 1.5 * h as f64).max(0.0),
        },
        _ => 0.0,
    }
}

/// Topological polar surface area from N and O atoms.
pub fn tpsa(mol: &Molecule) -> f64 {
    (0..mol.atom_count()).map(|idx| tpsa_contribution(mol, idx)).sum()
}

// ---------------------------------------------------------------------------
// 4. Donors, acceptors, N/O counts
// ---------------------------------------------------------------------------

const HBD_SMARTS: &str = "[$([N;!H0;v3]),$([N;!H0;+1;v4]),$([O,S;H1;+0]),$([n;H1;+0])]";
const HBA_SMARTS: &str = "[$([O,S;H1;v2]-[!$(*=[O,N,P,S])]),$([O,S;H0;v2]),$([O,S;-]),$([N;v3;!$(N-*=!@[O,N,P,S])]),$([nH0,o,s;+0]),$([F])]";

fn donor_acceptor_patterns() -> &'static (Option<Pattern>, Option<Pattern>) {
    static PATTERNS: OnceLock<(Option<Pattern>, Option<Pattern>)> = OnceLock::new();
    PATTERNS.get_or_init(|| (compile_builtin(HBD_SMARTS), compile_builtin(HBA_SMARTS)))
}

/// Number of hydrogen bond donor atoms.
pub fn h_bond_donors(mol: &Molecule) -> usize {
    donor_acceptor_patterns()
        .0
        .as_ref()
        .map_or(0, |p| p.count_matches(mol))
}

/// Number of hydrogen bond acceptor atoms.
pub fn h_bond_acceptors(mol: &Molecule) -> usize {
    donor_acceptor_patterns()
        .1
        .as_ref()
        .map_or(0, |p| p.count_matches(mol))
}

/// Hydrogens attached to nitrogen or oxygen.
pub fn nhoh_count(mol: &Molecule) -> usize {
    mol.atoms()
        .iter()
        .filter(|a| matches!(a.atomic_number, 7 | 8))
        .map(|a| a.hydrogens as usize)
        .sum()
}

/// Number of nitrogen and oxygen atoms.
pub fn no_count(mol: &Molecule) -> usize {
    mol.atoms()
        .iter()
        .filter(|a| matches!(a.atomic_number, 7 | 8))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::parse_smiles;
    use approx::assert_relative_eq;

    fn mol(smiles: &str) -> Molecule {
        parse_smiles(smiles).unwrap()
    }

    #[test]
    fn crippen_table_compiles_completely() {
        assert_eq!(crippen_types().len(), CRIPPEN_TABLE.len());
        assert!(donor_acceptor_patterns().0.is_some());
        assert!(donor_acceptor_patterns().1.is_some());
    }

    #[test]
    fn ethanol_reference_values() {
        let d = physchem_descriptors(&mol("CCO")).unwrap();
        assert_relative_eq!(d.mol_wt, 46.069, epsilon = 1e-3);
        assert_relative_eq!(d.heavy_atom_mol_wt, 40.021, epsilon = 1e-3);
        assert_relative_eq!(d.exact_mol_wt, 46.041865, epsilon = 1e-5);
        assert_relative_eq!(d.num_valence_electrons, 20.0);
        assert_relative_eq!(d.mol_log_p, -0.0014, epsilon = 1e-4);
        assert_relative_eq!(d.tpsa, 20.23, epsilon = 1e-9);
        assert_eq!(d.nhoh_count, 1);
        assert_eq!(d.no_count, 1);
    }

    #[test]
    fn crippen_atom_types() {
        let m = mol("CCO");
        assert_eq!(crippen_atom_type(&m, 0), Some("C1"));
        assert_eq!(crippen_atom_type(&m, 1), Some("C3"));
        assert_eq!(crippen_atom_type(&m, 2), Some("O2"));
        let pyridine = mol("c1ccncc1");
        assert_eq!(crippen_atom_type(&pyridine, 3), Some("N11"));
        assert_eq!(crippen_atom_type(&pyridine, 0), Some("C18"));
    }

    #[test]
    fn pyridine_log_p() {
        let (log_p, _) = crippen_contribs(&mol("c1ccncc1"));
        assert_relative_eq!(log_p, 1.0816, epsilon = 1e-4);
    }

    #[test]
    fn tpsa_of_common_groups() {
        // aspirin: ester O 9.23, two carbonyl O 17.07, acid OH 20.23
        assert_relative_eq!(tpsa(&mol("CC(=O)Oc1ccccc1C(=O)O")), 63.6, epsilon = 1e-9);
        // nitromethane, charge-separated form
        assert_relative_eq!(tpsa(&mol("C[N+](=O)[O-]")), 43.14, epsilon = 1e-9);
        assert_relative_eq!(tpsa(&mol("c1ccccc1")), 0.0);
        assert_relative_eq!(tpsa(&mol("c1ccncc1")), 12.89, epsilon = 1e-9);
    }

    #[test]
    fn donors_and_acceptors() {
        // acetic acid: one OH donor, only the carbonyl O accepts
        let acid = mol("CC(=O)O");
        assert_eq!(h_bond_donors(&acid), 1);
        assert_eq!(h_bond_acceptors(&acid), 1);
        let amine = mol("CCN");
        assert_eq!(h_bond_donors(&amine), 1);
        assert_eq!(h_bond_acceptors(&amine), 1);
        let pyrrole = mol("c1cc[nH]c1");
        assert_eq!(h_bond_donors(&pyrrole), 1);
        assert_eq!(h_bond_acceptors(&pyrrole), 0);
    }

    #[test]
    fn wildcard_contributes_nothing() {
        let methane = physchem_descriptors(&mol("C")).unwrap();
        let capped = physchem_descriptors(&mol("C*")).unwrap();
        // The carbon loses one hydrogen to the dummy bond.
        assert_relative_eq!(capped.mol_wt, methane.mol_wt - 1.008, epsilon = 1e-9);
        assert_relative_eq!(capped.heavy_atom_mol_wt, 12.011, epsilon = 1e-9);
        assert_relative_eq!(capped.tpsa, 0.0);
        assert!(capped.mol_log_p.is_finite() && capped.mol_mr.is_finite());
        assert_relative_eq!(molecular_weight(&mol("[*]")).unwrap(), 0.0);
    }
}
