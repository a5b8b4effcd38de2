// src/descriptors/maccs.rs
//! MACCS structural keys (167 bits, bit 0 unused).
//!
//! Keys come from the public MACCS SMARTS dictionary. A key is set when the
//! number of distinct matches exceeds its threshold (zero for most keys).
//! Keys 101, 125 and 166 are evaluated from ring and fragment information
//! instead of a query; key 1 (isotope) is never set.

use std::sync::OnceLock;

use crate::descriptors::fingerprint::Fingerprint;
use crate::molecule::{BondOrder, Molecule};
use crate::smarts::{compile_builtin, Pattern};

/// Width of the MACCS fingerprint.
pub const MACCS_BITS: usize = 167;

/// `(key, smarts, threshold)`; `None` marks keys computed in code.
const MACCS_KEYS: [(usize, Option<&str>, usize); 166] = [
    (1, None, 0),
    (2, Some("[#104]"), 0),
    (3, Some("[#32,#33,#34,#50,#51,#52,#82,#83,#84]"), 0),
    (4, Some("[Ac,Th,Pa,U,Np,Pu,Am,Cm,Bk,Cf,Es,Fm,Md,No,Lr]"), 0),
    (5, Some("[Sc,Ti,Y,Zr,Hf]"), 0),
    (6, Some("[La,Ce,Pr,Nd,Pm,Sm,Eu,Gd,Tb,Dy,Ho,Er,Tm,Yb,Lu]"), 0),
    (7, Some("[V,Cr,Mn,Nb,Mo,Tc,Ta,W,Re]"), 0),
    (8, Some("[!#6;!#1]1~*~*~*~1"), 0),
    (9, Some("[Fe,Co,Ni,Ru,Rh,Pd,Os,Ir,Pt]"), 0),
    (10, Some("[Be,Mg,Ca,Sr,Ba,Ra]"), 0),
    (11, Some("*1~*~*~*~1"), 0),
    (12, Some("[Cu,Zn,Ag,Cd,Au,Hg]"), 0),
    (13, Some("[#8]~[#7](~[#6])~[#6]"), 0),
    (14, Some("[#16]-[#16]"), 0),
    (15, Some("[#8]~[#6](~[#8])~[#8]"), 0),
    (16, Some("[!#6;!#1]1~*~*~1"), 0),
    (17, Some("[#6]#[#6]"), 0),
    (18, Some("[#5,#13,#31,#49,#81]"), 0),
    (19, Some("*1~*~*~*~*~*~*~1"), 0),
    (20, Some("[#14]"), 0),
    (21, Some("[#6]=[#6](~[!#6;!#1])~[!#6;!#1]"), 0),
    (22, Some("*1~*~*~1"), 0),
    (23, Some("[#7]~[#6](~[#8])~[#8]"), 0),
    (24, Some("[#7]-[#8]"), 0),
    (25, Some("[#7]~[#6](~[#7])~[#7]"), 0),
    (26, Some("[#6]=;@[#6](@*)@*"), 0),
    (27, Some("[I]"), 0),
    (28, Some("[!#6;!#1]~[CH2]~[!#6;!#1]"), 0),
    (29, Some("[#15]"), 0),
    (30, Some("[#6]~[!#6;!#1](~[#6])(~[#6])~*"), 0),
    (31, Some("[!#6;!#1]~[F,Cl,Br,I]"), 0),
    (32, Some("[#6]~[#16]~[#7]"), 0),
    (33, Some("[#7]~[#16]"), 0),
    (34, Some("[CH2]=*"), 0),
    (35, Some("[Li,Na,K,Rb,Cs,Fr]"), 0),
    (36, Some("[#16R]"), 0),
    (37, Some("[#7]~[#6](~[#8])~[#7]"), 0),
    (38, Some("[#7]~[#6](~[#6])~[#7]"), 0),
    (39, Some("[#8]~[#16](~[#8])~[#8]"), 0),
    (40, Some("[#16]-[#8]"), 0),
    (41, Some("[#6]#[#7]"), 0),
    (42, Some("F"), 0),
    (43, Some("[!#6;!#1;!H0]~*~[!#6;!#1;!H0]"), 0),
    (44, Some("[!#1;!#6;!#7;!#8;!#9;!#14;!#15;!#16;!#17;!#35;!#53]"), 0),
    (45, Some("[#6]=[#6]~[#7]"), 0),
    (46, Some("Br"), 0),
    (47, Some("[#16]~*~[#7]"), 0),
    (48, Some("[#8]~[!#6;!#1](~[#8])(~[#8])"), 0),
    (49, Some("[!+0]"), 0),
    (50, Some("[#6]=[#6](~[#6])~[#6]"), 0),
    (51, Some("[#6]~[#16]~[#8]"), 0),
    (52, Some("[#7]~[#7]"), 0),
    (53, Some("[!#6;!#1;!H0]~*~*~*~[!#6;!#1;!H0]"), 0),
    (54, Some("[!#6;!#1;!H0]~*~*~[!#6;!#1;!H0]"), 0),
    (55, Some("[#8]~[#16]~[#8]"), 0),
    (56, Some("[#8]~[#7](~[#8])~[#6]"), 0),
    (57, Some("[O;R]"), 0),
    (58, Some("[!#6;!#1]~[#16]~[!#6;!#1]"), 0),
    (59, Some("[#16]!:*:*"), 0),
    (60, Some("[#16]=[#8]"), 0),
    (61, Some("*~[#16](~*)~*"), 0),
    (62, Some("*@*!@*@*"), 0),
    (63, Some("[#7]=[#8]"), 0),
    (64, Some("*@*!@[#16]"), 0),
    (65, Some("c:n"), 0),
    (66, Some("[#6]~[#6](~[#6])(~[#6])~*"), 0),
    (67, Some("[!#6;!#1]~[#16]"), 0),
    (68, Some("[!#6;!#1;!H0]~[!#6;!#1;!H0]"), 0),
    (69, Some("[!#6;!#1]~[!#6;!#1;!H0]"), 0),
    (70, Some("[!#6;!#1]~[#7]~[!#6;!#1]"), 0),
    (71, Some("[#7]~[#8]"), 0),
    (72, Some("[#8]~*~*~[#8]"), 0),
    (73, Some("[#16]=*"), 0),
    (74, Some("[CH3]~*~[CH3]"), 0),
    (75, Some("*!@[#7]@*"), 0),
    (76, Some("[#6]=[#6](~*)~*"), 0),
    (77, Some("[#7]~*~[#7]"), 0),
    (78, Some("[#6]=[#7]"), 0),
    (79, Some("[#7]~*~*~[#7]"), 0),
    (80, Some("[#7]~*~*~*~[#7]"), 0),
    (81, Some("[#16]~*(~*)~*"), 0),
    (82, Some("*~[CH2]~[!#6;!#1;!H0]"), 0),
    (83, Some("[!#6;!#1]1~*~*~*~*~1"), 0),
    (84, Some("[NH2]"), 0),
    (85, Some("[#6]~[#7](~[#6])~[#6]"), 0),
    (86, Some("[C;H2,H3][!#6;!#1][C;H2,H3]"), 0),
    (87, Some("[F,Cl,Br,I]!@*@*"), 0),
    (88, Some("[#16]"), 0),
    (89, Some("[#8]~*~*~*~[#8]"), 0),
    (
        90,
        Some("[$([!#6;!#1;!H0]~*~*~[CH2]~*),$([!#6;!#1;!H0;R]1@[R]@[R]@[CH2;R]1),$([!#6;!#1;!H0]~[R]1@[R]@[CH2;R]1)]"),
        0,
    ),
    (
        91,
        Some("[$([!#6;!#1;!H0]~*~*~*~[CH2]~*),$([!#6;!#1;!H0;R]1@[R]@[R]@[R]@[CH2;R]1),$([!#6;!#1;!H0]~[R]1@[R]@[R]@[CH2;R]1),$([!#6;!#1;!H0]~*~[R]1@[R]@[CH2;R]1)]"),
        0,
    ),
    (92, Some("[#8]~[#6](~[#7])~[#6]"), 0),
    (93, Some("[!#6;!#1]~[CH3]"), 0),
    (94, Some("[!#6;!#1]~[#7]"), 0),
    (95, Some("[#7]~*~*~[#8]"), 0),
    (96, Some("*1~*~*~*~*~1"), 0),
    (97, Some("[#7]~*~*~*~[#8]"), 0),
    (98, Some("[!#6;!#1]1~*~*~*~*~*~1"), 0),
    (99, Some("[#6]=[#6]"), 0),
    (100, Some("*~[CH2]~[#7]"), 0),
    (101, None, 0),
    (102, Some("[!#6;!#1]~[#8]"), 0),
    (103, Some("Cl"), 0),
    (104, Some("[!#6;!#1;!H0]~*~[CH2]~*"), 0),
    (105, Some("*@*(@*)@*"), 0),
    (106, Some("[!#6;!#1]~*(~[!#6;!#1])~[!#6;!#1]"), 0),
    (107, Some("[F,Cl,Br,I]~*(~*)~*"), 0),
    (108, Some("[CH3]~*~*~*~[CH2]~*"), 0),
    (109, Some("*~[CH2]~[#8]"), 0),
    (110, Some("[#7]~[#6]~[#8]"), 0),
    (111, Some("[#7]~*~[CH2]~*"), 0),
    (112, Some("*~*(~*)(~*)~*"), 0),
    (113, Some("[#8]!:*:*"), 0),
    (114, Some("[CH3]~[CH2]~*"), 0),
    (115, Some("[CH3]~*~[CH2]~*"), 0),
    (116, Some("[$([CH3]~*~*~[CH2]~*),$([CH3]~*1~*~[CH2]1)]"), 0),
    (117, Some("[#7]~*~[#8]"), 0),
    (118, Some("[$(*~[CH2]~[CH2]~*),$(*1~[CH2]~[CH2]1)]"), 1),
    (119, Some("[#7]=*"), 0),
    (120, Some("[!#6;R]"), 1),
    (121, Some("[#7;R]"), 0),
    (122, Some("*~[#7](~*)~*"), 0),
    (123, Some("[#8]~[#6]~[#8]"), 0),
    (124, Some("[!#6;!#1]~[!#6;!#1]"), 0),
    (125, None, 0),
    (126, Some("*!@[#8]!@*"), 0),
    (127, Some("*@*!@[#8]"), 1),
    (
        128,
        Some("[$(*~[CH2]~*~*~*~[CH2]~*),$([R]1@[CH2;R]@[R]@[R]@[R]@[CH2;R]1),$(*~[CH2]~[R]1@[R]@[R]@[CH2;R]1),$(*~[CH2]~*~[R]1@[R]@[CH2;R]1)]"),
        0,
    ),
    (
        129,
        Some("[$(*~[CH2]~*~*~[CH2]~*),$([R]1@[CH2]@[R]@[R]@[CH2;R]1),$(*~[CH2]~[R]1@[R]@[CH2;R]1)]"),
        0,
    ),
    (130, Some("[!#6;!#1]~[!#6;!#1]"), 1),
    (131, Some("[!#6;!#1;!H0]"), 1),
    (132, Some("[#8]~*~[CH2]~*"), 0),
    (133, Some("*@*!@[#7]"), 0),
    (134, Some("[F,Cl,Br,I]"), 0),
    (135, Some("[#7]!:*:*"), 0),
    (136, Some("[#8]=*"), 1),
    (137, Some("[!C;!c;R]"), 0),
    (138, Some("[!#6;!#1]~[CH2]~*"), 1),
    (139, Some("[O;!H0]"), 0),
    (140, Some("[#8]"), 3),
    (141, Some("[CH3]"), 2),
    (142, Some("[#7]"), 1),
    (143, Some("*@*!@[#8]"), 0),
    (144, Some("*!:*:*!:*"), 0),
    (145, Some("*1~*~*~*~*~*~1"), 1),
    (146, Some("[#8]"), 2),
    (147, Some("[$(*~[CH2]~[CH2]~*),$([R]1@[CH2;R]@[CH2;R]1)]"), 0),
    (148, Some("*~[!#6;!#1](~*)~*"), 0),
    (149, Some("[C;H3,H4]"), 1),
    (150, Some("*!@*@*!@*"), 0),
    (151, Some("[#7;!H0]"), 0),
    (152, Some("[#8]~[#6](~[#6])~[#6]"), 0),
    (153, Some("[!#6;!#1]~[CH2]~*"), 0),
    (154, Some("[#6]=[#8]"), 0),
    (155, Some("*!@[CH2]!@*"), 0),
    (156, Some("[#7]~*(~*)~*"), 0),
    (157, Some("[#6]-[#8]"), 0),
    (158, Some("[#6]-[#7]"), 0),
    (159, Some("[#8]"), 1),
    (160, Some("[C;H3,H4]"), 0),
    (161, Some("[#7]"), 0),
    (162, Some("a"), 0),
    (163, Some("*1~*~*~*~*~*~1"), 0),
    (164, Some("[#8]"), 0),
    (165, Some("[R]"), 0),
    (166, None, 0),
];

struct CompiledKey {
    key: usize,
    pattern: Pattern,
    threshold: usize,
}

fn compiled_keys() -> &'static [CompiledKey] {
    static KEYS: OnceLock<Vec<CompiledKey>> = OnceLock::new();
    KEYS.get_or_init(|| {
        MACCS_KEYS
            .iter()
            .filter_map(|&(key, smarts, threshold)| {
                let pattern = compile_builtin(smarts?)?;
                Some(CompiledKey { key, pattern, threshold })
            })
            .collect()
    })
}

/// Compute the MACCS keys of `mol`.
///
/// ```
/// use qsar_predict::descriptors::maccs::{maccs_keys, MACCS_BITS};
/// use qsar_predict::molecule::parse_smiles;
///
/// let fp = maccs_keys(&parse_smiles("c1ccccc1O").unwrap()); // phenol
/// assert_eq!(fp.len(), MACCS_BITS);
/// assert!(fp.get(162)); // aromatic atom
/// assert!(fp.get(139)); // OH
/// assert!(!fp.get(0));
/// ```
pub fn maccs_keys(mol: &Molecule) -> Fingerprint {
    let mut fp = Fingerprint::new(MACCS_BITS);
    for key in compiled_keys() {
        // count_unique stops one past the threshold.
        if key.pattern.count_unique(mol, key.threshold + 1) > key.threshold {
            fp.set(key.key);
        }
    }

    let rings = mol.ring_info();
    if rings.atom_rings().iter().any(|r| r.len() >= 8) {
        fp.set(101);
    }
    let aromatic_rings = rings
        .bond_rings()
        .iter()
        .filter(|r| r.iter().all(|&b| mol.bond(b).order == BondOrder::Aromatic))
        .count();
    if aromatic_rings > 1 {
        fp.set(125);
    }
    if mol.fragment_count() > 1 {
        fp.set(166);
    }
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::parse_smiles;

    fn keys(smiles: &str) -> Fingerprint {
        maccs_keys(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn dictionary_is_complete_and_compiles() {
        let numbered: Vec<usize> = MACCS_KEYS.iter().map(|k| k.0).collect();
        assert_eq!(numbered, (1..=166).collect::<Vec<_>>());
        assert_eq!(compiled_keys().len(), 162);
    }

    #[test]
    fn ethanol_keys() {
        let fp = keys("CCO");
        assert!(fp.get(164)); // O
        assert!(fp.get(139)); // OH
        assert!(fp.get(157)); // C-O
        assert!(fp.get(114)); // CH3CH2A
        assert!(!fp.get(165)); // no ring
        assert!(!fp.get(159)); // only one O
    }

    #[test]
    fn thresholds_need_more_than_one_match() {
        assert!(!keys("CCO").get(146));
        assert!(keys("OCC(O)CO").get(146));
        assert!(keys("OCC(O)CO").get(159));
        assert!(!keys("OCC(O)CO").get(140));
    }

    #[test]
    fn code_evaluated_keys() {
        assert!(keys("c1ccc2ccccc2c1").get(125));
        assert!(!keys("c1ccccc1").get(125));
        assert!(keys("C1CCCCCCC1").get(101));
        assert!(!keys("C1CCCCC1").get(101));
        assert!(keys("CCO.O").get(166));
        assert!(!keys("CCO").get(166));
    }

    #[test]
    fn ring_size_keys() {
        let fp = keys("c1ccccc1");
        assert!(fp.get(163));
        assert!(fp.get(162));
        assert!(!fp.get(145)); // one six-ring only
        assert!(keys("c1ccc2ccccc2c1").get(145));
    }

    #[test]
    fn bit_zero_never_set() {
        for smiles in ["CCO", "c1ccccc1", "[Na+].[Cl-]"] {
            assert!(!keys(smiles).get(0));
        }
    }
}
