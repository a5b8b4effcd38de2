// src/molecule/rings.rs
//! Ring perception (smallest set of smallest rings) and aromaticity.
//!
//! Candidate cycles are generated Horton-style: for every atom `r` and every
//! bond `(x, y)` the cycle `r → x`, `x - y`, `y → r` along BFS shortest paths is
//! kept when the two paths only share `r`. Candidates are sorted by size and
//! accepted greedily while they stay linearly independent over GF(2), until
//! the cyclomatic number (`bonds - atoms + fragments`) is reached.

use std::collections::{BTreeSet, HashMap, VecDeque};

use super::{element, Bond, BondOrder, Molecule};

/// Rings of a molecule, each given as its atoms (in cycle order) and bonds.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    atom_rings: Vec<Vec<usize>>,
    bond_rings: Vec<Vec<usize>>,
    atom_membership: Vec<u8>,
    bond_membership: Vec<u8>,
}

impl RingInfo {
    /// Perceive the SSSR of a graph.
    pub fn perceive(n_atoms: usize, bonds: &[Bond], adjacency: &[Vec<(usize, usize)>]) -> Self {
        let mut info = RingInfo {
            atom_membership: vec![0; n_atoms],
            bond_membership: vec![0; bonds.len()],
            ..RingInfo::default()
        };
        let fragments = count_fragments(adjacency);
        let cyclomatic = (bonds.len() + fragments).saturating_sub(n_atoms);
        if cyclomatic == 0 {
            return info;
        }

        let mut candidates = horton_candidates(n_atoms, bonds, adjacency);
        candidates.sort_by(|a, b| {
            a.bonds
                .len()
                .cmp(&b.bonds.len())
                .then_with(|| a.sorted_bonds.cmp(&b.sorted_bonds))
        });

        let words = bonds.len().div_ceil(64);
        let mut basis: HashMap<usize, Vec<u64>> = HashMap::new();
        for cycle in candidates {
            if info.atom_rings.len() == cyclomatic {
                break;
            }
            let mut vector = vec![0u64; words];
            for &b in &cycle.bonds {
                vector[b / 64] |= 1 << (b % 64);
            }
            if insert_independent(&mut basis, vector) {
                for &a in &cycle.atoms {
                    info.atom_membership[a] += 1;
                }
                for &b in &cycle.bonds {
                    info.bond_membership[b] += 1;
                }
                info.atom_rings.push(cycle.atoms);
                info.bond_rings.push(cycle.bonds);
            }
        }
        info
    }

    /// Number of rings in the SSSR.
    pub fn num_rings(&self) -> usize {
        self.atom_rings.len()
    }

    /// Ring atoms, each ring in cycle order.
    pub fn atom_rings(&self) -> &[Vec<usize>] {
        &self.atom_rings
    }

    /// Ring bonds, parallel to [`RingInfo::atom_rings`].
    pub fn bond_rings(&self) -> &[Vec<usize>] {
        &self.bond_rings
    }

    /// Whether an atom belongs to at least one SSSR ring.
    pub fn is_atom_in_ring(&self, atom: usize) -> bool {
        self.atom_membership.get(atom).is_some_and(|&n| n > 0)
    }

    /// Whether a bond belongs to at least one SSSR ring.
    pub fn is_bond_in_ring(&self, bond: usize) -> bool {
        self.bond_membership.get(bond).is_some_and(|&n| n > 0)
    }

    /// Number of SSSR rings containing an atom.
    pub fn atom_ring_count(&self, atom: usize) -> usize {
        self.atom_membership.get(atom).copied().unwrap_or(0) as usize
    }

    /// Whether an atom sits in a ring of exactly `size` atoms.
    pub fn is_atom_in_ring_of_size(&self, atom: usize, size: usize) -> bool {
        self.atom_rings
            .iter()
            .any(|ring| ring.len() == size && ring.contains(&atom))
    }
}

struct Cycle {
    atoms: Vec<usize>,
    bonds: Vec<usize>,
    sorted_bonds: Vec<usize>,
}

fn count_fragments(adjacency: &[Vec<(usize, usize)>]) -> usize {
    let mut seen = vec![false; adjacency.len()];
    let mut fragments = 0;
    for start in 0..adjacency.len() {
        if seen[start] {
            continue;
        }
        fragments += 1;
        seen[start] = true;
        let mut stack = vec![start];
        while let Some(a) = stack.pop() {
            for &(nbr, _) in &adjacency[a] {
                if !seen[nbr] {
                    seen[nbr] = true;
                    stack.push(nbr);
                }
            }
        }
    }
    fragments
}

fn horton_candidates(n_atoms: usize, bonds: &[Bond], adjacency: &[Vec<(usize, usize)>]) -> Vec<Cycle> {
    let mut seen: BTreeSet<Vec<usize>> = BTreeSet::new();
    let mut out = Vec::new();

    for root in 0..n_atoms {
        // parent[a] = (previous atom, bond used) on a BFS shortest path from root
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; n_atoms];
        let mut reached = vec![false; n_atoms];
        reached[root] = true;
        let mut queue = VecDeque::from([root]);
        while let Some(a) = queue.pop_front() {
            for &(nbr, b) in &adjacency[a] {
                if !reached[nbr] {
                    reached[nbr] = true;
                    parent[nbr] = Some((a, b));
                    queue.push_back(nbr);
                }
            }
        }

        for (b, bond) in bonds.iter().enumerate() {
            let (x, y) = (bond.begin, bond.end);
            if !reached[x] || !reached[y] {
                continue;
            }
            if parent[x].is_some_and(|(_, pb)| pb == b) || parent[y].is_some_and(|(_, pb)| pb == b) {
                continue;
            }
            let (path_x, bonds_x) = path_to_root(&parent, x);
            let (path_y, bonds_y) = path_to_root(&parent, y);
            // The two branches may only meet at the root.
            let shared = path_x.iter().filter(|a| path_y.contains(a)).count();
            if shared != 1 {
                continue;
            }

            let mut atoms: Vec<usize> = path_x.iter().rev().copied().collect();
            atoms.extend(path_y.iter().take(path_y.len() - 1));
            let mut cycle_bonds: Vec<usize> = bonds_x.iter().rev().copied().collect();
            cycle_bonds.push(b);
            cycle_bonds.extend(bonds_y.iter());

            let mut sorted_bonds = cycle_bonds.clone();
            sorted_bonds.sort_unstable();
            if seen.insert(sorted_bonds.clone()) {
                out.push(Cycle {
                    atoms,
                    bonds: cycle_bonds,
                    sorted_bonds,
                });
            }
        }
    }
    out
}

/// Atoms from `start` back to the BFS root (inclusive) and the bonds between them.
fn path_to_root(parent: &[Option<(usize, usize)>], start: usize) -> (Vec<usize>, Vec<usize>) {
    let mut atoms = vec![start];
    let mut bonds = Vec::new();
    let mut cur = start;
    while let Some((prev, b)) = parent[cur] {
        atoms.push(prev);
        bonds.push(b);
        cur = prev;
    }
    (atoms, bonds)
}

fn lowest_bit(vector: &[u64]) -> Option<usize> {
    vector
        .iter()
        .enumerate()
        .find(|(_, w)| **w != 0)
        .map(|(i, w)| i * 64 + w.trailing_zeros() as usize)
}

/// Gaussian elimination over GF(2); returns whether `vector` was independent.
fn insert_independent(basis: &mut HashMap<usize, Vec<u64>>, mut vector: Vec<u64>) -> bool {
    while let Some(pivot) = lowest_bit(&vector) {
        match basis.get(&pivot) {
            Some(row) => {
                for (w, r) in vector.iter_mut().zip(row) {
                    *w ^= r;
                }
            }
            None => {
                basis.insert(pivot, vector);
                return true;
            }
        }
    }
    false
}

// ─────────────────────────────────────────────────────────────────────────────
// Aromaticity
// ─────────────────────────────────────────────────────────────────────────────

/// Pi electrons an atom donates to a ring system, `None` if it cannot take part.
fn pi_electrons(mol: &Molecule, atom: usize, system_bonds: &[usize]) -> Option<u32> {
    let a = mol.atom(atom);
    if !matches!(a.atomic_number, 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52) {
        return None;
    }
    if a.aromatic && mol.neighbors(atom).iter().any(|&(_, b)| mol.bond(b).order == BondOrder::Aromatic) {
        // Written aromatic: electrons follow from the element and substitution.
        return Some(match a.atomic_number {
            6 => match a.formal_charge {
                -1 => 2,
                1 => 0,
                _ => 1,
            },
            7 | 15 | 33 => {
                if a.hydrogens > 0 || (mol.degree(atom) == 3 && a.formal_charge == 0) {
                    2
                } else {
                    1
                }
            }
            5 => 0,
            _ => {
                if a.formal_charge > 0 {
                    1
                } else {
                    2
                }
            }
        });
    }

    let mut in_system_double = false;
    let mut exo_double: Option<usize> = None;
    for &(nbr, b) in mol.neighbors(atom) {
        match mol.bond(b).order {
            BondOrder::Triple | BondOrder::Quadruple => return None,
            BondOrder::Double if system_bonds.contains(&b) => in_system_double = true,
            BondOrder::Double => exo_double = Some(nbr),
            _ => {}
        }
    }
    if in_system_double {
        return Some(1);
    }
    if let Some(partner) = exo_double {
        let p = mol.atom(partner);
        // C=O / C=S / C=N hanging off the ring: the atom contributes nothing.
        if mol.ring_info().is_atom_in_ring(partner) && matches!(p.atomic_number, 6 | 7) {
            return Some(1);
        }
        return if element::is_heteroatom(p.atomic_number) && a.atomic_number == 6 {
            Some(0)
        } else {
            None
        };
    }

    match a.atomic_number {
        6 => match a.formal_charge {
            -1 => Some(2),
            1 => Some(0),
            _ => None,
        },
        7 | 15 | 33 => {
            if a.formal_charge == 0 && mol.total_degree(atom) <= 3 {
                Some(2)
            } else {
                None
            }
        }
        8 | 16 | 34 | 52 => {
            if a.formal_charge == 0 && mol.total_degree(atom) == 2 {
                Some(2)
            } else {
                None
            }
        }
        5 => Some(0),
        _ => None,
    }
}

fn is_huckel(electrons: u32) -> bool {
    electrons >= 2 && electrons % 4 == 2
}

fn system_electrons(mol: &Molecule, atoms: &[usize], bonds: &[usize]) -> Option<u32> {
    atoms
        .iter()
        .map(|&a| pi_electrons(mol, a, bonds))
        .sum::<Option<u32>>()
}

/// Mark rings (and fused ring pairs) satisfying the 4n+2 rule as aromatic.
pub(crate) fn perceive_aromaticity(mol: &mut Molecule) {
    let atom_rings = mol.ring_info().atom_rings().to_vec();
    let bond_rings = mol.ring_info().bond_rings().to_vec();
    let mut aromatic_ring = vec![false; atom_rings.len()];

    for (idx, (atoms, bonds)) in atom_rings.iter().zip(&bond_rings).enumerate() {
        if bonds.iter().all(|&b| mol.bond(b).order == BondOrder::Aromatic) {
            aromatic_ring[idx] = true;
            continue;
        }
        if system_electrons(mol, atoms, bonds).is_some_and(is_huckel) {
            aromatic_ring[idx] = true;
        }
    }

    // Fused pairs (azulene-like systems) that fail ring by ring.
    let mut fused: Vec<(usize, usize)> = Vec::new();
    for i in 0..atom_rings.len() {
        for j in (i + 1)..atom_rings.len() {
            if aromatic_ring[i] && aromatic_ring[j] {
                continue;
            }
            if !bond_rings[i].iter().any(|b| bond_rings[j].contains(b)) {
                continue;
            }
            let mut atoms = atom_rings[i].clone();
            atoms.extend(atom_rings[j].iter().filter(|a| !atom_rings[i].contains(a)));
            let mut bonds = bond_rings[i].clone();
            bonds.extend(bond_rings[j].iter().filter(|b| !bond_rings[i].contains(b)));
            if system_electrons(mol, &atoms, &bonds).is_some_and(is_huckel) {
                fused.push((i, j));
            }
        }
    }
    for (i, j) in fused {
        aromatic_ring[i] = true;
        aromatic_ring[j] = true;
    }

    for (idx, flag) in aromatic_ring.iter().enumerate() {
        if *flag {
            mol.set_aromatic(&atom_rings[idx], &bond_rings[idx]);
        }
    }
}
