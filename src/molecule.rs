// src/molecule.rs
//! Hydrogen-suppressed molecular graph built from SMILES.
//!
//! A [`Molecule`] stores heavy atoms (plus any hydrogen that could not be folded
//! into a neighbor), bonds with their order, an adjacency list and the ring
//! information perceived at construction time. Every descriptor and
//! fingerprint in this crate reads from this one structure.
//!
//! ```
//! use qsar_predict::molecule::{Molecule, ParsedMolecule};
//!
//! let benzene = match ParsedMolecule::parse("C1=CC=CC=C1") {
//!     ParsedMolecule::Valid(mol) => mol,
//!     ParsedMolecule::Invalid => unreachable!(),
//! };
//! assert_eq!(benzene.atom_count(), 6);
//! assert!(benzene.atoms().iter().all(|a| a.aromatic));
//! assert_eq!(benzene.ring_info().num_rings(), 1);
//! ```

pub mod element;
pub mod rings;
pub mod smiles;

pub use rings::RingInfo;
pub use smiles::parse_smiles;

/// Bond multiplicity as written (or perceived).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    /// `-` or an implicit bond between aliphatic atoms.
    Single,
    /// `=`
    Double,
    /// `#`
    Triple,
    /// `$`
    Quadruple,
    /// `:` or an implicit bond between two aromatic atoms.
    Aromatic,
}

impl BondOrder {
    /// Bond order as a real number (1.5 for aromatic).
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Quadruple => 4.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// Small integer code used when hashing bond environments.
    pub fn code(self) -> u32 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Aromatic => 12,
        }
    }
}

/// One atom of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atomic number, 0 for the wildcard `*`.
    pub atomic_number: u8,
    /// Mass number when written explicitly (`[13C]`).
    pub isotope: Option<u16>,
    /// Formal charge.
    pub formal_charge: i8,
    /// Aromatic flag (written lowercase or perceived).
    pub aromatic: bool,
    /// Total attached hydrogens (implicit, bracket and folded explicit).
    pub hydrogens: u8,
    /// Total valence including hydrogens.
    pub valence: u8,
}

impl Atom {
    /// Element symbol of this atom.
    pub fn symbol(&self) -> &'static str {
        element::symbol(self.atomic_number)
    }
}

/// One bond of the graph; `begin < end` is not guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    /// First atom index.
    pub begin: usize,
    /// Second atom index.
    pub end: usize,
    /// Bond order.
    pub order: BondOrder,
}

impl Bond {
    /// The atom at the other end of the bond.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// Orbital hybridization used by the shape and saturation descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hybridization {
    /// Linear (one triple or two double bonds).
    Sp,
    /// Trigonal (one double bond or aromatic).
    Sp2,
    /// Tetrahedral.
    Sp3,
    /// Hydrogen, metals and the wildcard atom.
    Other,
}

/// Parsed molecular graph.
#[derive(Debug, Clone)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    ring_info: RingInfo,
}

impl Molecule {
    /// Assemble a molecule from atoms and bonds and perceive its rings.
    pub(crate) fn from_parts(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (idx, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, idx));
            adjacency[bond.end].push((bond.begin, idx));
        }
        let ring_info = RingInfo::perceive(atoms.len(), &bonds, &adjacency);
        Molecule {
            atoms,
            bonds,
            adjacency,
            ring_info,
        }
    }

    /// All atoms in input order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// All bonds in input order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Atom by index.
    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    /// Bond by index.
    pub fn bond(&self, idx: usize) -> &Bond {
        &self.bonds[idx]
    }

    /// Number of atoms in the graph.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds in the graph.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// `(neighbor, bond index)` pairs of an atom.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Number of explicit graph neighbors.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Graph degree plus attached hydrogens.
    pub fn total_degree(&self, atom: usize) -> usize {
        self.degree(atom) + self.atoms[atom].hydrogens as usize
    }

    /// Number of heavy-atom neighbors.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .filter(|(nbr, _)| self.atoms[*nbr].atomic_number != 1)
            .count()
    }

    /// Bond connecting two atoms, if any.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<(usize, &Bond)> {
        self.adjacency[a]
            .iter()
            .find(|(nbr, _)| *nbr == b)
            .map(|&(_, idx)| (idx, &self.bonds[idx]))
    }

    /// Ring information perceived at construction time.
    pub fn ring_info(&self) -> &RingInfo {
        &self.ring_info
    }

    /// Atoms other than hydrogen.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    /// Total hydrogen count, implicit and explicit.
    pub fn total_hydrogens(&self) -> usize {
        self.atoms
            .iter()
            .map(|a| {
                if a.atomic_number == 1 {
                    1 + a.hydrogens as usize
                } else {
                    a.hydrogens as usize
                }
            })
            .sum()
    }

    /// Number of disconnected fragments.
    pub fn fragment_count(&self) -> usize {
        let mut seen = vec![false; self.atoms.len()];
        let mut fragments = 0;
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            fragments += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(atom) = stack.pop() {
                for &(nbr, _) in &self.adjacency[atom] {
                    if !seen[nbr] {
                        seen[nbr] = true;
                        stack.push(nbr);
                    }
                }
            }
        }
        fragments
    }

    /// Hybridization derived from bond orders and aromaticity.
    pub fn hybridization(&self, atom: usize) -> Hybridization {
        let a = &self.atoms[atom];
        if a.atomic_number <= 2 || element::allowed_valences(a.atomic_number).is_empty() {
            return Hybridization::Other;
        }
        if a.aromatic {
            return Hybridization::Sp2;
        }
        let mut doubles = 0;
        let mut triples = 0;
        for &(_, b) in &self.adjacency[atom] {
            match self.bonds[b].order {
                BondOrder::Double => doubles += 1,
                BondOrder::Triple | BondOrder::Quadruple => triples += 1,
                BondOrder::Aromatic => return Hybridization::Sp2,
                BondOrder::Single => {}
            }
        }
        if triples > 0 || doubles > 1 {
            Hybridization::Sp
        } else if doubles == 1 {
            Hybridization::Sp2
        } else {
            Hybridization::Sp3
        }
    }

    /// All-pairs topological distances (BFS); unreachable pairs are `None`.
    pub fn distance_matrix(&self) -> Vec<Vec<Option<usize>>> {
        let n = self.atoms.len();
        let mut dist = vec![vec![None; n]; n];
        for (src, row) in dist.iter_mut().enumerate() {
            row[src] = Some(0);
            let mut queue = std::collections::VecDeque::from([src]);
            while let Some(atom) = queue.pop_front() {
                let d = row[atom].unwrap_or(0);
                for &(nbr, _) in &self.adjacency[atom] {
                    if row[nbr].is_none() {
                        row[nbr] = Some(d + 1);
                        queue.push_back(nbr);
                    }
                }
            }
        }
        dist
    }

    /// Mark the given atoms and bonds aromatic (used by perception).
    pub(crate) fn set_aromatic(&mut self, atoms: &[usize], bonds: &[usize]) {
        for &a in atoms {
            self.atoms[a].aromatic = true;
        }
        for &b in bonds {
            self.bonds[b].order = BondOrder::Aromatic;
        }
    }
}

/// Outcome of parsing one SMILES string.
///
/// Parsing never panics and never aborts a batch: anything the parser rejects
/// is represented as `Invalid`.
#[derive(Debug, Clone)]
pub enum ParsedMolecule {
    /// A successfully parsed graph.
    Valid(Molecule),
    /// The input could not be parsed.
    Invalid,
}

impl ParsedMolecule {
    /// Parse a SMILES string, turning any error into `Invalid`.
    pub fn parse(smiles: &str) -> Self {
        match parse_smiles(smiles) {
            Ok(mol) => ParsedMolecule::Valid(mol),
            Err(e) => {
                log::debug!("rejecting SMILES {smiles:?}: {e}");
                ParsedMolecule::Invalid
            }
        }
    }

    /// Borrow the molecule if the parse succeeded.
    pub fn as_valid(&self) -> Option<&Molecule> {
        match self {
            ParsedMolecule::Valid(mol) => Some(mol),
            ParsedMolecule::Invalid => None,
        }
    }
}
