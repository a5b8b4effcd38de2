// src/smarts.rs
//! A compact SMARTS engine for the fixed query dictionaries used by the
//! descriptor and fingerprint code.
//!
//! Supported: bracket atom expressions with `!`, `&`, `,`, `;` and implicit
//! conjunction; primitives `*`, `#n`, element symbols (aromatic lowercase),
//! `a`, `A`, `H<n>`, `X<n>`, `D<n>`, `v<n>`, `R`, `R<n>`, charges and
//! recursive `$(...)`; bond primitives `- = # : ~ @` with the same operators;
//! branches and ring closures. Component grouping and stereo are not
//! supported.
//!
//! ```
//! use qsar_predict::{molecule::parse_smiles, smarts::Pattern};
//!
//! let acid = Pattern::compile("C(=O)[OH]").unwrap();
//! let mol = parse_smiles("OC(=O)CC(=O)O").unwrap();
//! assert_eq!(acid.count_matches(&mol), 2);
//! ```

use std::collections::BTreeSet;

use thiserror::Error;

use crate::molecule::{element, BondOrder, Molecule};

/// Errors raised while compiling a SMARTS string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmartsError {
    /// Unexpected character at a byte offset.
    #[error("unexpected {found:?} at position {pos} in SMARTS {pattern:?}")]
    Unexpected {
        /// Offending pattern.
        pattern: String,
        /// Byte offset.
        pos: usize,
        /// What was found there (`"end"` at end of input).
        found: String,
    },
    /// A ring-closure label was opened but never closed.
    #[error("unclosed ring closure {label} in SMARTS {pattern:?}")]
    UnclosedRing {
        /// Offending pattern.
        pattern: String,
        /// Ring label.
        label: u8,
    },
}

#[derive(Debug, Clone)]
enum AtomExpr {
    Any,
    AtomicNumber(u8),
    Element { number: u8, aromatic: bool },
    Aromatic,
    Aliphatic,
    TotalH(u8),
    Connectivity(u8),
    Degree(u8),
    Valence(u8),
    Charge(i8),
    InRing,
    RingCount(u8),
    Recursive(Box<Pattern>),
    Not(Box<AtomExpr>),
    And(Box<AtomExpr>, Box<AtomExpr>),
    Or(Box<AtomExpr>, Box<AtomExpr>),
}

#[derive(Debug, Clone)]
enum BondExpr {
    /// No bond symbol written: single or aromatic.
    Implicit,
    Any,
    Single,
    Double,
    Triple,
    Aromatic,
    Ring,
    Not(Box<BondExpr>),
    And(Box<BondExpr>, Box<BondExpr>),
    Or(Box<BondExpr>, Box<BondExpr>),
}

#[derive(Debug, Clone)]
struct QueryBond {
    a: usize,
    b: usize,
    expr: BondExpr,
}

/// A compiled SMARTS query.
#[derive(Debug, Clone)]
pub struct Pattern {
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
    /// Atom each query atom was attached to when it was read.
    parent: Vec<Option<usize>>,
    /// Bonds from each query atom back to earlier query atoms.
    back_bonds: Vec<Vec<usize>>,
}

impl Pattern {
    /// Compile a SMARTS string.
    pub fn compile(smarts: &str) -> Result<Pattern, SmartsError> {
        let mut parser = SmartsParser {
            src: smarts,
            bytes: smarts.as_bytes(),
            pos: 0,
        };
        parser.pattern()
    }

    /// Number of query atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Whether the query occurs at least once.
    pub fn has_match(&self, mol: &Molecule) -> bool {
        self.count_unique(mol, 1) > 0
    }

    /// Number of matches that differ in their set of target atoms.
    pub fn count_matches(&self, mol: &Molecule) -> usize {
        self.count_unique(mol, usize::MAX)
    }

    /// Like [`Pattern::count_matches`] but stops once `limit` is reached.
    pub fn count_unique(&self, mol: &Molecule, limit: usize) -> usize {
        if self.atoms.is_empty() || mol.atom_count() == 0 || limit == 0 {
            return 0;
        }
        let mut search = Search::new(self, mol, limit);
        search.extend(0);
        search.unique.len()
    }

    /// All unique matches, each as target atom indices in query-atom order.
    pub fn matches(&self, mol: &Molecule) -> Vec<Vec<usize>> {
        if self.atoms.is_empty() || mol.atom_count() == 0 {
            return Vec::new();
        }
        let mut search = Search::new(self, mol, usize::MAX);
        search.extend(0);
        search.ordered
    }

    /// Whether the query matches with its first atom placed on `atom`.
    pub fn matches_at(&self, mol: &Molecule, atom: usize) -> bool {
        if self.atoms.is_empty() {
            return false;
        }
        let mut search = Search::new(self, mol, 1);
        search.anchor = Some(atom);
        search.extend(0);
        !search.unique.is_empty()
    }
}

/// Compile one of the crate's built-in queries; a malformed entry is logged and
/// skipped so a single typo cannot take a whole dictionary down.
pub(crate) fn compile_builtin(smarts: &str) -> Option<Pattern> {
    match Pattern::compile(smarts) {
        Ok(p) => Some(p),
        Err(e) => {
            log::error!("built-in query rejected: {e}");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Matching
// ─────────────────────────────────────────────────────────────────────────────

struct Search<'p, 'm> {
    pattern: &'p Pattern,
    mol: &'m Molecule,
    limit: usize,
    anchor: Option<usize>,
    mapping: Vec<usize>,
    used: Vec<bool>,
    unique: BTreeSet<Vec<usize>>,
    ordered: Vec<Vec<usize>>,
}

impl<'p, 'm> Search<'p, 'm> {
    fn new(pattern: &'p Pattern, mol: &'m Molecule, limit: usize) -> Self {
        Search {
            pattern,
            mol,
            limit,
            anchor: None,
            mapping: vec![usize::MAX; pattern.atoms.len()],
            used: vec![false; mol.atom_count()],
            unique: BTreeSet::new(),
            ordered: Vec::new(),
        }
    }

    /// Returns `true` when the search should stop.
    fn extend(&mut self, k: usize) -> bool {
        if k == self.pattern.atoms.len() {
            let mut key = self.mapping.clone();
            key.sort_unstable();
            if self.unique.insert(key) {
                self.ordered.push(self.mapping.clone());
            }
            return self.unique.len() >= self.limit;
        }

        let candidates: Vec<usize> = match (k, self.anchor, self.pattern.parent[k]) {
            (0, Some(anchor), _) => vec![anchor],
            (_, _, Some(parent)) => self
                .mol
                .neighbors(self.mapping[parent])
                .iter()
                .map(|&(nbr, _)| nbr)
                .collect(),
            _ => (0..self.mol.atom_count()).collect(),
        };

        for target in candidates {
            if self.used[target] || !self.atom_ok(k, target) {
                continue;
            }
            self.mapping[k] = target;
            self.used[target] = true;
            let stop = self.extend(k + 1);
            self.used[target] = false;
            self.mapping[k] = usize::MAX;
            if stop {
                return true;
            }
        }
        false
    }

    fn atom_ok(&self, k: usize, target: usize) -> bool {
        if !atom_matches(&self.pattern.atoms[k], self.mol, target) {
            return false;
        }
        self.pattern.back_bonds[k].iter().all(|&qb| {
            let bond = &self.pattern.bonds[qb];
            let other = if bond.a == k { bond.b } else { bond.a };
            match self.mol.bond_between(target, self.mapping[other]) {
                Some((idx, _)) => bond_matches(&bond.expr, self.mol, idx),
                None => false,
            }
        })
    }
}

fn atom_matches(expr: &AtomExpr, mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    match expr {
        AtomExpr::Any => true,
        AtomExpr::AtomicNumber(n) => atom.atomic_number == *n,
        AtomExpr::Element { number, aromatic } => atom.atomic_number == *number && atom.aromatic == *aromatic,
        AtomExpr::Aromatic => atom.aromatic,
        AtomExpr::Aliphatic => !atom.aromatic,
        AtomExpr::TotalH(n) => atom.hydrogens == *n,
        AtomExpr::Connectivity(n) => mol.total_degree(idx) == *n as usize,
        AtomExpr::Degree(n) => mol.degree(idx) == *n as usize,
        AtomExpr::Valence(n) => atom.valence == *n,
        AtomExpr::Charge(c) => atom.formal_charge == *c,
        AtomExpr::InRing => mol.ring_info().is_atom_in_ring(idx),
        AtomExpr::RingCount(n) => mol.ring_info().atom_ring_count(idx) == *n as usize,
        AtomExpr::Recursive(p) => p.matches_at(mol, idx),
        AtomExpr::Not(e) => !atom_matches(e, mol, idx),
        AtomExpr::And(l, r) => atom_matches(l, mol, idx) && atom_matches(r, mol, idx),
        AtomExpr::Or(l, r) => atom_matches(l, mol, idx) || atom_matches(r, mol, idx),
    }
}

fn bond_matches(expr: &BondExpr, mol: &Molecule, idx: usize) -> bool {
    let order = mol.bond(idx).order;
    match expr {
        BondExpr::Implicit => matches!(order, BondOrder::Single | BondOrder::Aromatic),
        BondExpr::Any => true,
        BondExpr::Single => order == BondOrder::Single,
        BondExpr::Double => order == BondOrder::Double,
        BondExpr::Triple => order == BondOrder::Triple,
        BondExpr::Aromatic => order == BondOrder::Aromatic,
        BondExpr::Ring => mol.ring_info().is_bond_in_ring(idx),
        BondExpr::Not(e) => !bond_matches(e, mol, idx),
        BondExpr::And(l, r) => bond_matches(l, mol, idx) && bond_matches(r, mol, idx),
        BondExpr::Or(l, r) => bond_matches(l, mol, idx) || bond_matches(r, mol, idx),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

struct SmartsParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_bond_char(c: u8) -> bool {
    matches!(c, b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'!' | b'&' | b',' | b';')
}

impl<'a> SmartsParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn unexpected(&self) -> SmartsError {
        SmartsError::Unexpected {
            pattern: self.src.to_string(),
            pos: self.pos,
            found: self
                .src
                .get(self.pos..)
                .and_then(|s| s.chars().next())
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end".to_string()),
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), SmartsError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.src.get(start..self.pos).and_then(|s| s.parse().ok())
    }

    fn pattern(&mut self) -> Result<Pattern, SmartsError> {
        let mut pattern = Pattern {
            atoms: Vec::new(),
            bonds: Vec::new(),
            parent: Vec::new(),
            back_bonds: Vec::new(),
        };
        let mut prev: Option<usize> = None;
        let mut branches: Vec<usize> = Vec::new();
        let mut pending: Option<BondExpr> = None;
        let mut rings: Vec<(u8, usize, Option<BondExpr>)> = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    let at = prev.ok_or_else(|| self.unexpected())?;
                    branches.push(at);
                    self.pos += 1;
                }
                b')' => {
                    prev = Some(branches.pop().ok_or_else(|| self.unexpected())?);
                    self.pos += 1;
                }
                c if is_bond_char(c) => {
                    if prev.is_none() || pending.is_some() {
                        return Err(self.unexpected());
                    }
                    pending = Some(self.bond_or()?);
                }
                b'0'..=b'9' => {
                    let at = prev.ok_or_else(|| self.unexpected())?;
                    let label = c - b'0';
                    self.pos += 1;
                    let written = pending.take();
                    if let Some(pos) = rings.iter().position(|(l, _, _)| *l == label) {
                        let (_, open_at, open_bond) = rings.remove(pos);
                        let expr = written.or(open_bond).unwrap_or(BondExpr::Implicit);
                        let idx = pattern.bonds.len();
                        pattern.bonds.push(QueryBond { a: open_at, b: at, expr });
                        pattern.back_bonds[at.max(open_at)].push(idx);
                    } else {
                        rings.push((label, at, written));
                    }
                }
                _ => {
                    let expr = self.atom()?;
                    let idx = pattern.atoms.len();
                    pattern.atoms.push(expr);
                    pattern.parent.push(prev);
                    pattern.back_bonds.push(Vec::new());
                    if let Some(p) = prev {
                        let bond = pending.take().unwrap_or(BondExpr::Implicit);
                        pattern.back_bonds[idx].push(pattern.bonds.len());
                        pattern.bonds.push(QueryBond { a: p, b: idx, expr: bond });
                    }
                    prev = Some(idx);
                }
            }
        }

        if pending.is_some() || !branches.is_empty() || pattern.atoms.is_empty() {
            return Err(self.unexpected());
        }
        if let Some((label, _, _)) = rings.first() {
            return Err(SmartsError::UnclosedRing {
                pattern: self.src.to_string(),
                label: *label,
            });
        }
        Ok(pattern)
    }

    fn bond_or(&mut self) -> Result<BondExpr, SmartsError> {
        let mut expr = self.bond_or_inner()?;
        while self.peek() == Some(b';') {
            self.pos += 1;
            let rhs = self.bond_or_inner()?;
            expr = BondExpr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn bond_or_inner(&mut self) -> Result<BondExpr, SmartsError> {
        let mut expr = self.bond_and()?;
        while self.peek() == Some(b',') {
            self.pos += 1;
            let rhs = self.bond_and()?;
            expr = BondExpr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn bond_and(&mut self) -> Result<BondExpr, SmartsError> {
        let mut expr = self.bond_unary()?;
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.pos += 1;
                }
                Some(c) if matches!(c, b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'!') => {}
                _ => return Ok(expr),
            }
            let rhs = self.bond_unary()?;
            expr = BondExpr::And(Box::new(expr), Box::new(rhs));
        }
    }

    fn bond_unary(&mut self) -> Result<BondExpr, SmartsError> {
        let c = self.peek().ok_or_else(|| self.unexpected())?;
        let expr = match c {
            b'!' => {
                self.pos += 1;
                return Ok(BondExpr::Not(Box::new(self.bond_unary()?)));
            }
            b'-' => BondExpr::Single,
            b'=' => BondExpr::Double,
            b'#' => BondExpr::Triple,
            b':' => BondExpr::Aromatic,
            b'~' => BondExpr::Any,
            b'@' => BondExpr::Ring,
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let bytes: &'a [u8] = self.bytes;
        let rest = &bytes[self.pos..];
        let (expr, len) = match rest {
            [b'[', ..] => {
                self.pos += 1;
                let expr = self.atom_low()?;
                self.expect(b']')?;
                return Ok(expr);
            }
            [b'*', ..] => (AtomExpr::Any, 1),
            [b'C', b'l', ..] => (AtomExpr::AtomicNumber(17), 2),
            [b'B', b'r', ..] => (AtomExpr::AtomicNumber(35), 2),
            [b'F', ..] => (AtomExpr::AtomicNumber(9), 1),
            [b'I', ..] => (AtomExpr::AtomicNumber(53), 1),
            [b'B', ..] => (aliphatic(5), 1),
            [b'C', ..] => (aliphatic(6), 1),
            [b'N', ..] => (aliphatic(7), 1),
            [b'O', ..] => (aliphatic(8), 1),
            [b'P', ..] => (aliphatic(15), 1),
            [b'S', ..] => (aliphatic(16), 1),
            [b'b', ..] => (aromatic(5), 1),
            [b'c', ..] => (aromatic(6), 1),
            [b'n', ..] => (aromatic(7), 1),
            [b'o', ..] => (aromatic(8), 1),
            [b'p', ..] => (aromatic(15), 1),
            [b's', ..] => (aromatic(16), 1),
            [b'a', ..] => (AtomExpr::Aromatic, 1),
            [b'A', ..] => (AtomExpr::Aliphatic, 1),
            _ => return Err(self.unexpected()),
        };
        self.pos += len;
        Ok(expr)
    }

    fn atom_low(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut expr = self.atom_or()?;
        while self.peek() == Some(b';') {
            self.pos += 1;
            let rhs = self.atom_or()?;
            expr = AtomExpr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn atom_or(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut expr = self.atom_and()?;
        while self.peek() == Some(b',') {
            self.pos += 1;
            let rhs = self.atom_and()?;
            expr = AtomExpr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn atom_and(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut expr = self.atom_unary()?;
        loop {
            match self.peek() {
                Some(b'&') => self.pos += 1,
                Some(b']' | b',' | b';') | None => return Ok(expr),
                Some(_) => {}
            }
            let rhs = self.atom_unary()?;
            expr = AtomExpr::And(Box::new(expr), Box::new(rhs));
        }
    }

    fn atom_unary(&mut self) -> Result<AtomExpr, SmartsError> {
        if self.peek() == Some(b'!') {
            self.pos += 1;
            return Ok(AtomExpr::Not(Box::new(self.atom_unary()?)));
        }
        self.primitive()
    }

    fn primitive(&mut self) -> Result<AtomExpr, SmartsError> {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let mut chars = rest.chars();
        let first = chars.next().ok_or_else(|| self.unexpected())?;
        let second = chars.next();

        // Two-letter element symbols win over one-letter primitives (Hf, Dy, Rb, ...).
        if first.is_ascii_uppercase() {
            if let Some(s) = second.filter(|c| c.is_ascii_lowercase()) {
                let two: String = [first, s].iter().collect();
                if let Some(z) = element::atomic_number(&two) {
                    self.pos += 2;
                    return Ok(AtomExpr::Element { number: z, aromatic: false });
                }
            }
        }

        match first {
            '*' => {
                self.pos += 1;
                Ok(AtomExpr::Any)
            }
            '#' => {
                self.pos += 1;
                let n = self.number().ok_or_else(|| self.unexpected())?;
                Ok(AtomExpr::AtomicNumber(n as u8))
            }
            '$' => {
                self.pos += 1;
                self.expect(b'(')?;
                let start = self.pos;
                let mut depth = 1usize;
                while depth > 0 {
                    match self.peek() {
                        Some(b'(') => depth += 1,
                        Some(b')') => depth -= 1,
                        Some(_) => {}
                        None => return Err(self.unexpected()),
                    }
                    self.pos += 1;
                }
                let inner = &src[start..self.pos - 1];
                let nested = Pattern::compile(inner)?;
                Ok(AtomExpr::Recursive(Box::new(nested)))
            }
            'a' => {
                self.pos += 1;
                Ok(AtomExpr::Aromatic)
            }
            'A' => {
                self.pos += 1;
                Ok(AtomExpr::Aliphatic)
            }
            'H' => {
                self.pos += 1;
                Ok(AtomExpr::TotalH(self.number().unwrap_or(1) as u8))
            }
            'X' => {
                self.pos += 1;
                Ok(AtomExpr::Connectivity(self.number().unwrap_or(1) as u8))
            }
            'D' => {
                self.pos += 1;
                Ok(AtomExpr::Degree(self.number().unwrap_or(1) as u8))
            }
            'v' => {
                self.pos += 1;
                Ok(AtomExpr::Valence(self.number().unwrap_or(1) as u8))
            }
            'R' => {
                self.pos += 1;
                Ok(match self.number() {
                    None => AtomExpr::InRing,
                    Some(0) => AtomExpr::Not(Box::new(AtomExpr::InRing)),
                    Some(n) => AtomExpr::RingCount(n as u8),
                })
            }
            '+' | '-' => {
                let sign: i32 = if first == '+' { 1 } else { -1 };
                self.pos += 1;
                let magnitude = match self.number() {
                    Some(n) => n as i32,
                    None => {
                        let mut n = 1;
                        while self.peek() == Some(first as u8) {
                            n += 1;
                            self.pos += 1;
                        }
                        n
                    }
                };
                Ok(AtomExpr::Charge((sign * magnitude) as i8))
            }
            c if c.is_ascii_lowercase() => {
                if let Some(s) = second {
                    for (sym, z) in [("se", 34u8), ("as", 33)] {
                        if first == sym.as_bytes()[0] as char && s == sym.as_bytes()[1] as char {
                            self.pos += 2;
                            return Ok(aromatic(z));
                        }
                    }
                }
                let z = match c {
                    'b' => 5,
                    'c' => 6,
                    'n' => 7,
                    'o' => 8,
                    'p' => 15,
                    's' => 16,
                    _ => return Err(self.unexpected()),
                };
                self.pos += 1;
                Ok(aromatic(z))
            }
            c if c.is_ascii_uppercase() => {
                let z = element::atomic_number(&c.to_string()).ok_or_else(|| self.unexpected())?;
                self.pos += 1;
                Ok(match z {
                    5..=8 | 15 | 16 => aliphatic(z),
                    _ => AtomExpr::AtomicNumber(z),
                })
            }
            _ => Err(self.unexpected()),
        }
    }
}

fn aliphatic(number: u8) -> AtomExpr {
    AtomExpr::Element { number, aromatic: false }
}

fn aromatic(number: u8) -> AtomExpr {
    AtomExpr::Element { number, aromatic: true }
}
