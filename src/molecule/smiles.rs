// src/molecule/smiles.rs
//! SMILES reader.
//!
//! Handles the organic subset, bracket atoms (isotope, chirality, hydrogen
//! count, charge, atom class), branches, ring closures (`1`..`9`, `%nn`),
//! explicit bond symbols and dot-disconnected fragments. Stereo marks are read
//! and discarded. After the graph is built, explicit hydrogens are folded into
//! their heavy neighbor, implicit hydrogens are assigned, rings are perceived
//! and Kekulé rings are re-marked aromatic when they satisfy Hückel's rule.

use std::collections::BTreeMap;

use super::{element, rings, Atom, Bond, BondOrder, Molecule};
use crate::descriptors::DescriptorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondSymbol {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Directional,
}

impl BondSymbol {
    fn order(self) -> BondOrder {
        match self {
            BondSymbol::Single | BondSymbol::Directional => BondOrder::Single,
            BondSymbol::Double => BondOrder::Double,
            BondSymbol::Triple => BondOrder::Triple,
            BondSymbol::Quadruple => BondOrder::Quadruple,
            BondSymbol::Aromatic => BondOrder::Aromatic,
        }
    }
}

#[derive(Debug, Clone)]
struct AtomSpec {
    atomic_number: u8,
    isotope: Option<u16>,
    charge: i8,
    aromatic: bool,
    /// `Some` for bracket atoms: hydrogens are exactly what was written.
    bracket_h: Option<u8>,
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    atoms: Vec<AtomSpec>,
    bonds: Vec<Bond>,
    branches: Vec<usize>,
    prev: Option<usize>,
    pending: Option<BondSymbol>,
    open_rings: BTreeMap<u16, (usize, Option<BondSymbol>)>,
}

/// Parse a SMILES string into a [`Molecule`].
///
/// # Errors
///
/// `DescriptorError::ParseError` for syntax problems, unclosed rings or
/// impossible valences, `DescriptorError::UnknownElement` for element symbols
/// outside the periodic table.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, DescriptorError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(DescriptorError::ParseError("empty SMILES".to_string()));
    }
    let mut parser = Parser {
        src: trimmed,
        bytes: trimmed.as_bytes(),
        pos: 0,
        atoms: Vec::new(),
        bonds: Vec::new(),
        branches: Vec::new(),
        prev: None,
        pending: None,
        open_rings: BTreeMap::new(),
    };
    parser.run()?;
    build_molecule(parser.atoms, parser.bonds)
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> DescriptorError {
        DescriptorError::ParseError(format!("{what} at position {} in {:?}", self.pos, self.src))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn run(&mut self) -> Result<(), DescriptorError> {
        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    let prev = self.prev.ok_or_else(|| self.error("branch without atom"))?;
                    if self.pending.is_some() {
                        return Err(self.error("bond before branch"));
                    }
                    self.branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond without following atom"));
                    }
                    let back = self.branches.pop().ok_or_else(|| self.error("unbalanced ')'"))?;
                    self.prev = Some(back);
                    self.pos += 1;
                }
                b'.' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond without following atom"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => {
                    if self.prev.is_none() {
                        return Err(self.error("bond without preceding atom"));
                    }
                    if self.pending.is_some() {
                        return Err(self.error("consecutive bond symbols"));
                    }
                    self.pending = Some(match c {
                        b'-' => BondSymbol::Single,
                        b'=' => BondSymbol::Double,
                        b'#' => BondSymbol::Triple,
                        b'$' => BondSymbol::Quadruple,
                        b':' => BondSymbol::Aromatic,
                        _ => BondSymbol::Directional,
                    });
                    self.pos += 1;
                }
                b'0'..=b'9' | b'%' => self.ring_closure()?,
                b'[' => {
                    let spec = self.bracket_atom()?;
                    self.add_atom(spec)?;
                }
                _ => {
                    let spec = self.organic_atom()?;
                    self.add_atom(spec)?;
                }
            }
        }

        if self.pending.is_some() {
            return Err(self.error("bond without following atom"));
        }
        if !self.branches.is_empty() {
            return Err(self.error("unbalanced '('"));
        }
        if let Some(label) = self.open_rings.keys().next() {
            return Err(DescriptorError::ParseError(format!(
                "unclosed ring {label} in {:?}",
                self.src
            )));
        }
        if self.atoms.is_empty() {
            return Err(self.error("no atoms"));
        }
        Ok(())
    }

    fn add_atom(&mut self, spec: AtomSpec) -> Result<(), DescriptorError> {
        let idx = self.atoms.len();
        self.atoms.push(spec);
        if let Some(prev) = self.prev {
            let symbol = self.pending.take();
            self.push_bond(prev, idx, symbol)?;
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn push_bond(&mut self, a: usize, b: usize, symbol: Option<BondSymbol>) -> Result<(), DescriptorError> {
        if a == b {
            return Err(self.error("atom bonded to itself"));
        }
        if self
            .bonds
            .iter()
            .any(|bd| (bd.begin == a && bd.end == b) || (bd.begin == b && bd.end == a))
        {
            return Err(self.error("duplicate bond"));
        }
        let order = match symbol {
            Some(s) => s.order(),
            None if self.atoms[a].aromatic && self.atoms[b].aromatic => BondOrder::Aromatic,
            None => BondOrder::Single,
        };
        self.bonds.push(Bond { begin: a, end: b, order });
        Ok(())
    }

    fn ring_closure(&mut self) -> Result<(), DescriptorError> {
        let current = self.prev.ok_or_else(|| self.error("ring closure without atom"))?;
        let label = if self.peek() == Some(b'%') {
            let bytes: &'a [u8] = self.bytes;
            let digits = bytes
                .get(self.pos + 1..self.pos + 3)
                .filter(|d| d.iter().all(u8::is_ascii_digit))
                .ok_or_else(|| self.error("malformed %nn ring label"))?;
            self.pos += 3;
            (digits[0] - b'0') as u16 * 10 + (digits[1] - b'0') as u16
        } else {
            let d = (self.bytes[self.pos] - b'0') as u16;
            self.pos += 1;
            d
        };

        let symbol = self.pending.take();
        match self.open_rings.remove(&label) {
            Some((other, open_symbol)) => {
                let resolved = match (open_symbol, symbol) {
                    (Some(x), Some(y)) if x.order() != y.order() => {
                        return Err(self.error("conflicting ring closure bonds"));
                    }
                    (Some(x), _) => Some(x),
                    (None, y) => y,
                };
                self.push_bond(other, current, resolved)?;
            }
            None => {
                self.open_rings.insert(label, (current, symbol));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<AtomSpec, DescriptorError> {
        let bytes: &'a [u8] = self.bytes;
        let rest = &bytes[self.pos..];
        let (atomic_number, aromatic, len) = match rest {
            [b'C', b'l', ..] => (17, false, 2),
            [b'B', b'r', ..] => (35, false, 2),
            [b'B', ..] => (5, false, 1),
            [b'C', ..] => (6, false, 1),
            [b'N', ..] => (7, false, 1),
            [b'O', ..] => (8, false, 1),
            [b'P', ..] => (15, false, 1),
            [b'S', ..] => (16, false, 1),
            [b'F', ..] => (9, false, 1),
            [b'I', ..] => (53, false, 1),
            [b'b', ..] => (5, true, 1),
            [b'c', ..] => (6, true, 1),
            [b'n', ..] => (7, true, 1),
            [b'o', ..] => (8, true, 1),
            [b'p', ..] => (15, true, 1),
            [b's', ..] => (16, true, 1),
            [b'*', ..] => (0, false, 1),
            _ => return Err(self.error("unexpected character")),
        };
        self.pos += len;
        Ok(AtomSpec {
            atomic_number,
            isotope: None,
            charge: 0,
            aromatic,
            bracket_h: None,
        })
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        self.src[start..self.pos].parse().ok()
    }

    fn bracket_atom(&mut self) -> Result<AtomSpec, DescriptorError> {
        self.pos += 1; // '['
        let isotope = self.read_number().map(|n| n as u16);

        let (atomic_number, aromatic) = self.bracket_symbol()?;

        // Chirality: @, @@, @TH1, @SP2, @OH12, ...
        if self.peek() == Some(b'@') {
            self.pos += 1;
            if self.peek() == Some(b'@') {
                self.pos += 1;
            } else {
                while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
                    self.pos += 1;
                }
                self.read_number();
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = self.read_number().map(|n| n as u8).unwrap_or(1);
        }

        let mut charge: i32 = 0;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let unit = if sign == b'+' { 1 } else { -1 };
            self.pos += 1;
            if let Some(n) = self.read_number() {
                charge = unit * n as i32;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    charge += unit;
                    self.pos += 1;
                }
            }
        }

        if self.peek() == Some(b':') {
            self.pos += 1;
            self.read_number().ok_or_else(|| self.error("missing atom class"))?;
        }

        if self.peek() != Some(b']') {
            return Err(self.error("unterminated bracket atom"));
        }
        self.pos += 1;

        Ok(AtomSpec {
            atomic_number,
            isotope,
            charge: charge.clamp(i8::MIN as i32, i8::MAX as i32) as i8,
            aromatic,
            bracket_h: Some(hydrogens),
        })
    }

    fn bracket_symbol(&mut self) -> Result<(u8, bool), DescriptorError> {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let mut chars = rest.chars();
        let first = chars.next().ok_or_else(|| self.error("unterminated bracket atom"))?;
        if first == '*' {
            self.pos += 1;
            return Ok((0, false));
        }
        if first.is_ascii_lowercase() {
            for (sym, z) in [("se", 34u8), ("as", 33), ("te", 52)] {
                if rest.starts_with(sym) {
                    self.pos += 2;
                    return Ok((z, true));
                }
            }
            let z = match first {
                'b' => 5,
                'c' => 6,
                'n' => 7,
                'o' => 8,
                'p' => 15,
                's' => 16,
                _ => return Err(DescriptorError::UnknownElement(first.to_string())),
            };
            self.pos += 1;
            return Ok((z, true));
        }
        if !first.is_ascii_uppercase() {
            return Err(self.error("expected element symbol"));
        }
        if let Some(second) = chars.next().filter(|c| c.is_ascii_lowercase()) {
            let two: String = [first, second].iter().collect();
            if let Some(z) = element::atomic_number(&two) {
                self.pos += 2;
                return Ok((z, false));
            }
        }
        let one = first.to_string();
        let z = element::atomic_number(&one).ok_or(DescriptorError::UnknownElement(one))?;
        self.pos += 1;
        Ok((z, false))
    }
}

/// Assign hydrogens and valences, fold explicit hydrogens, perceive rings.
fn build_molecule(specs: Vec<AtomSpec>, bonds: Vec<Bond>) -> Result<Molecule, DescriptorError> {
    let n = specs.len();
    let mut bond_sum = vec![0u32; n];
    let mut has_aromatic_bond = vec![false; n];
    for bond in &bonds {
        let contribution = match bond.order {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        };
        for end in [bond.begin, bond.end] {
            bond_sum[end] += contribution;
            if bond.order == BondOrder::Aromatic {
                has_aromatic_bond[end] = true;
            }
        }
    }

    let mut atoms = Vec::with_capacity(n);
    for (idx, spec) in specs.iter().enumerate() {
        let allowed = element::allowed_valences_charged(spec.atomic_number, spec.charge);
        let mut explicit = bond_sum[idx] + spec.bracket_h.unwrap_or(0) as u32;
        if spec.aromatic && has_aromatic_bond[idx] {
            if let Some(&default) = allowed.first() {
                if explicit < default as u32 {
                    explicit += 1;
                }
            }
        }

        let hydrogens = match spec.bracket_h {
            Some(h) => {
                if let Some(&max) = allowed.last() {
                    if explicit > max as u32 {
                        return Err(invalid_valence(spec, explicit));
                    }
                }
                h
            }
            None if allowed.is_empty() => 0,
            None => {
                let target = allowed
                    .iter()
                    .find(|&&v| v as u32 >= explicit)
                    .ok_or_else(|| invalid_valence(spec, explicit))?;
                (*target as u32 - explicit) as u8
            }
        };
        let implicit = if spec.bracket_h.is_some() { 0 } else { hydrogens as u32 };

        atoms.push(Atom {
            atomic_number: spec.atomic_number,
            isotope: spec.isotope,
            formal_charge: spec.charge,
            aromatic: spec.aromatic,
            hydrogens,
            valence: (explicit + implicit).min(u8::MAX as u32) as u8,
        });
    }

    let (atoms, bonds) = fold_explicit_hydrogens(atoms, bonds);
    let mut mol = Molecule::from_parts(atoms, bonds);

    for (idx, atom) in mol.atoms().iter().enumerate() {
        if atom.aromatic && !mol.ring_info().is_atom_in_ring(idx) {
            return Err(DescriptorError::ParseError(format!(
                "aromatic atom {} ({}) outside a ring",
                idx,
                atom.symbol()
            )));
        }
    }

    rings::perceive_aromaticity(&mut mol);
    Ok(mol)
}

fn invalid_valence(spec: &AtomSpec, valence: u32) -> DescriptorError {
    DescriptorError::ParseError(format!(
        "explicit valence {valence} is not allowed for {}{}",
        element::symbol(spec.atomic_number),
        match spec.charge {
            0 => String::new(),
            c => format!(" (charge {c:+})"),
        }
    ))
}

/// Plain `[H]` atoms with a single heavy neighbor become hydrogen counts.
fn fold_explicit_hydrogens(atoms: Vec<Atom>, bonds: Vec<Bond>) -> (Vec<Atom>, Vec<Bond>) {
    let mut degree = vec![0usize; atoms.len()];
    for b in &bonds {
        degree[b.begin] += 1;
        degree[b.end] += 1;
    }
    let foldable: Vec<bool> = atoms
        .iter()
        .enumerate()
        .map(|(idx, a)| {
            a.atomic_number == 1
                && a.isotope.is_none()
                && a.formal_charge == 0
                && degree[idx] == 1
                && bonds.iter().any(|b| {
                    (b.begin == idx || b.end == idx)
                        && b.order == BondOrder::Single
                        && atoms[b.other(idx)].atomic_number != 1
                })
        })
        .collect();
    if !foldable.iter().any(|&f| f) {
        return (atoms, bonds);
    }

    let mut atoms = atoms;
    for b in &bonds {
        if foldable[b.begin] {
            atoms[b.end].hydrogens += 1;
        } else if foldable[b.end] {
            atoms[b.begin].hydrogens += 1;
        }
    }

    let mut remap = vec![usize::MAX; atoms.len()];
    let mut kept = Vec::with_capacity(atoms.len());
    for (idx, atom) in atoms.into_iter().enumerate() {
        if !foldable[idx] {
            remap[idx] = kept.len();
            kept.push(atom);
        }
    }
    let bonds = bonds
        .into_iter()
        .filter(|b| !foldable[b.begin] && !foldable[b.end])
        .map(|b| Bond {
            begin: remap[b.begin],
            end: remap[b.end],
            order: b.order,
        })
        .collect();
    (kept, bonds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::BondOrder;

    #[test]
    fn implicit_hydrogens_for_organic_subset() {
        let m = parse_smiles("CC(=O)O").unwrap();
        let h: Vec<u8> = m.atoms().iter().map(|a| a.hydrogens).collect();
        assert_eq!(h, vec![3, 0, 0, 1]);
        assert_eq!(m.atom(1).valence, 4);
    }

    #[test]
    fn bracket_atoms_keep_written_hydrogens_and_charge() {
        let m = parse_smiles("[NH4+]").unwrap();
        assert_eq!(m.atom(0).hydrogens, 4);
        assert_eq!(m.atom(0).formal_charge, 1);

        let m = parse_smiles("[13CH3][O-]").unwrap();
        assert_eq!(m.atom(0).isotope, Some(13));
        assert_eq!(m.atom(1).formal_charge, -1);
        assert_eq!(m.atom(1).hydrogens, 0);

        let m = parse_smiles("[Fe++]").unwrap();
        assert_eq!(m.atom(0).formal_charge, 2);
        let m = parse_smiles("[C@@H](F)(Cl)Br").unwrap();
        assert_eq!(m.atom(0).hydrogens, 1);
    }

    #[test]
    fn aromatic_input_and_pyrrole_nitrogen() {
        let m = parse_smiles("c1cc[nH]c1").unwrap();
        assert!(m.atoms().iter().all(|a| a.aromatic));
        assert_eq!(m.atom(3).hydrogens, 1);
        assert_eq!(m.atom(0).hydrogens, 1);
        assert!(m.bonds().iter().all(|b| b.order == BondOrder::Aromatic));

        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.atom(3).hydrogens, 0);
    }

    #[test]
    fn explicit_hydrogens_are_folded() {
        let m = parse_smiles("[H]C([H])([H])O[H]").unwrap();
        assert_eq!(m.atom_count(), 2);
        assert_eq!(m.atom(0).hydrogens, 3);
        assert_eq!(m.atom(1).hydrogens, 1);
        let h2 = parse_smiles("[H][H]").unwrap();
        assert_eq!(h2.atom_count(), 2);
    }

    #[test]
    fn ring_closures_with_bond_symbols_and_percent_labels() {
        let m = parse_smiles("C%10CCCCC%10").unwrap();
        assert_eq!(m.ring_info().num_rings(), 1);
        let m = parse_smiles("C=1CCCCC1").unwrap();
        assert_eq!(m.bond_between(0, 5).map(|(_, b)| b.order), Some(BondOrder::Double));
        assert!(parse_smiles("C=1CCCCC#1").is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "", "C(", "C)", "C1CC", "C=", "=C", "[Xx]", "[C", "C(=)C", "CC5(C)(C)(C)C5C",
            "C(C)(C)(C)(C)C", "c1cccc", "cc", "not_a_molecule",
        ] {
            assert!(parse_smiles(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn charged_atoms_use_shifted_valence() {
        let m = parse_smiles("C[N+](C)(C)C").unwrap();
        assert_eq!(m.atom(1).valence, 4);
        let m = parse_smiles("O=[N+][O-]").unwrap();
        assert_eq!(m.atom(1).hydrogens, 0);
    }

    #[test]
    fn dot_separated_fragments() {
        let m = parse_smiles("CCO.[Na+].[Cl-]").unwrap();
        assert_eq!(m.atom_count(), 5);
        assert_eq!(m.fragment_count(), 3);
    }
}
