// src/molecule/element.rs
//! Periodic-table data used by the parser and the descriptor calculators.
//!
//! Average masses follow the usual IUPAC standard weights; monoisotopic masses
//! are listed for the elements that actually show up in drug-like chemistry and
//! fall back to the average mass elsewhere.

/// Element symbols and standard atomic weights, indexed by `atomic_number - 1`.
const ELEMENTS: [(&str, f64); 118] = [
    ("H", 1.008),
    ("He", 4.003),
    ("Li", 6.941),
    ("Be", 9.012),
    ("B", 10.812),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998),
    ("Ne", 20.18),
    ("Na", 22.99),
    ("Mg", 24.305),
    ("Al", 26.982),
    ("Si", 28.086),
    ("P", 30.974),
    ("S", 32.065),
    ("Cl", 35.453),
    ("Ar", 39.948),
    ("K", 39.098),
    ("Ca", 40.078),
    ("Sc", 44.956),
    ("Ti", 47.867),
    ("V", 50.942),
    ("Cr", 51.996),
    ("Mn", 54.938),
    ("Fe", 55.845),
    ("Co", 58.933),
    ("Ni", 58.693),
    ("Cu", 63.546),
    ("Zn", 65.39),
    ("Ga", 69.723),
    ("Ge", 72.61),
    ("As", 74.922),
    ("Se", 78.96),
    ("Br", 79.904),
    ("Kr", 83.8),
    ("Rb", 85.468),
    ("Sr", 87.62),
    ("Y", 88.906),
    ("Zr", 91.224),
    ("Nb", 92.906),
    ("Mo", 95.94),
    ("Tc", 98.0),
    ("Ru", 101.07),
    ("Rh", 102.906),
    ("Pd", 106.42),
    ("Ag", 107.868),
    ("Cd", 112.412),
    ("In", 114.818),
    ("Sn", 118.711),
    ("Sb", 121.76),
    ("Te", 127.6),
    ("I", 126.904),
    ("Xe", 131.29),
    ("Cs", 132.905),
    ("Ba", 137.328),
    ("La", 138.906),
    ("Ce", 140.116),
    ("Pr", 140.908),
    ("Nd", 144.24),
    ("Pm", 145.0),
    ("Sm", 150.36),
    ("Eu", 151.964),
    ("Gd", 157.25),
    ("Tb", 158.925),
    ("Dy", 162.5),
    ("Ho", 164.93),
    ("Er", 167.26),
    ("Tm", 168.934),
    ("Yb", 173.04),
    ("Lu", 174.967),
    ("Hf", 178.49),
    ("Ta", 180.948),
    ("W", 183.84),
    ("Re", 186.207),
    ("Os", 190.23),
    ("Ir", 192.217),
    ("Pt", 195.078),
    ("Au", 196.967),
    ("Hg", 200.59),
    ("Tl", 204.383),
    ("Pb", 207.2),
    ("Bi", 208.98),
    ("Po", 209.0),
    ("At", 210.0),
    ("Rn", 222.0),
    ("Fr", 223.0),
    ("Ra", 226.0),
    ("Ac", 227.0),
    ("Th", 232.038),
    ("Pa", 231.036),
    ("U", 238.029),
    ("Np", 237.0),
    ("Pu", 244.0),
    ("Am", 243.0),
    ("Cm", 247.0),
    ("Bk", 247.0),
    ("Cf", 251.0),
    ("Es", 252.0),
    ("Fm", 257.0),
    ("Md", 258.0),
    ("No", 259.0),
    ("Lr", 262.0),
    ("Rf", 267.0),
    ("Db", 268.0),
    ("Sg", 269.0),
    ("Bh", 270.0),
    ("Hs", 269.0),
    ("Mt", 278.0),
    ("Ds", 281.0),
    ("Rg", 282.0),
    ("Cn", 285.0),
    ("Nh", 286.0),
    ("Fl", 289.0),
    ("Mc", 290.0),
    ("Lv", 293.0),
    ("Ts", 294.0),
    ("Og", 294.0),
];

/// Atomic number for an element symbol (case-sensitive, e.g. `"Cl"`).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENTS
        .iter()
        .position(|(s, _)| *s == symbol)
        .map(|idx| (idx + 1) as u8)
}

/// Element symbol for an atomic number; `"*"` for the wildcard atom 0.
pub fn symbol(atomic_number: u8) -> &'static str {
    match atomic_number {
        0 => "*",
        z => ELEMENTS.get(z as usize - 1).map(|(s, _)| *s).unwrap_or("?"),
    }
}

/// Standard atomic weight, `None` for out-of-range numbers. The wildcard atom
/// 0 weighs nothing.
pub fn average_mass(atomic_number: u8) -> Option<f64> {
    if atomic_number == 0 {
        return Some(0.0);
    }
    ELEMENTS.get(atomic_number as usize - 1).map(|(_, m)| *m)
}

/// Mass of the most abundant isotope.
pub fn monoisotopic_mass(atomic_number: u8) -> Option<f64> {
    let exact = match atomic_number {
        1 => 1.00782503223,
        3 => 7.0160034366,
        5 => 11.00930536,
        6 => 12.0,
        7 => 14.00307400443,
        8 => 15.99491461956,
        9 => 18.99840316273,
        11 => 22.989769282,
        12 => 23.985041697,
        14 => 27.97692653465,
        15 => 30.97376199842,
        16 => 31.9720711744,
        17 => 34.968852682,
        19 => 38.9637064864,
        20 => 39.962590863,
        26 => 55.93493633,
        29 => 62.92959772,
        30 => 63.92914201,
        34 => 79.9165218,
        35 => 78.9183376,
        53 => 126.9044719,
        z => return average_mass(z),
    };
    Some(exact)
}

/// Allowed valences in increasing order. An empty slice means "unrestricted":
/// no implicit hydrogens are added and no valence check is made.
pub fn allowed_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        1 => &[1],
        3 | 11 | 19 => &[1],
        5 | 13 => &[3],
        6 | 14 | 32 => &[4],
        7 => &[3],
        8 => &[2],
        9 | 17 | 35 => &[1],
        12 | 20 => &[2],
        15 => &[3, 5, 7],
        16 | 34 | 52 => &[2, 4, 6],
        33 => &[3, 5],
        53 => &[1, 3, 5],
        _ => &[],
    }
}

/// Valences for a charged atom, looked up on its isoelectronic neighbor
/// (N+ behaves like C, O- like F, and so on).
pub fn allowed_valences_charged(atomic_number: u8, formal_charge: i8) -> &'static [u8] {
    if formal_charge == 0 || atomic_number == 0 {
        return allowed_valences(atomic_number);
    }
    let shifted = atomic_number as i16 - formal_charge as i16;
    if !(1..=118).contains(&shifted) {
        return &[];
    }
    // Only shift within the same period block; metals keep their own list.
    match atomic_number {
        5..=9 | 14..=17 | 33..=35 | 52 | 53 => allowed_valences(shifted as u8),
        _ => &[],
    }
}

/// Number of electrons in the outermost shell.
pub fn outer_electrons(atomic_number: u8) -> u8 {
    match atomic_number {
        0 => 0,
        1..=2 => atomic_number,
        3..=10 => atomic_number - 2,
        11..=18 => atomic_number - 10,
        19..=20 => atomic_number - 18,
        21..=30 => atomic_number - 18,
        31..=36 => atomic_number - 28,
        37..=38 => atomic_number - 36,
        39..=48 => atomic_number - 36,
        49..=54 => atomic_number - 46,
        55..=56 => atomic_number - 54,
        57..=80 => 3,
        81..=86 => atomic_number - 78,
        87..=88 => atomic_number - 86,
        _ => 3,
    }
}

/// Atoms that are neither carbon nor hydrogen.
pub fn is_heteroatom(atomic_number: u8) -> bool {
    atomic_number != 6 && atomic_number != 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip_for_common_elements() {
        for sym in ["H", "C", "N", "O", "S", "Cl", "Br", "I", "Na", "Hf", "Og"] {
            let z = atomic_number(sym).unwrap();
            assert_eq!(symbol(z), sym);
        }
        assert_eq!(atomic_number("Xx"), None);
    }

    #[test]
    fn wildcard_is_massless_and_unrestricted() {
        assert_eq!(symbol(0), "*");
        assert_eq!(average_mass(0), Some(0.0));
        assert_eq!(monoisotopic_mass(0), Some(0.0));
        assert_eq!(outer_electrons(0), 0);
        assert!(allowed_valences(0).is_empty());
    }

    #[test]
    fn charged_nitrogen_behaves_like_carbon() {
        assert_eq!(allowed_valences_charged(7, 1), &[4]);
        assert_eq!(allowed_valences_charged(8, -1), &[1]);
        assert_eq!(allowed_valences_charged(8, 1), &[3]);
        assert_eq!(allowed_valences_charged(11, 1), &[] as &[u8]);
    }

    #[test]
    fn outer_shell_counts() {
        assert_eq!(outer_electrons(6), 4);
        assert_eq!(outer_electrons(7), 5);
        assert_eq!(outer_electrons(17), 7);
        assert_eq!(outer_electrons(35), 7);
        assert_eq!(outer_electrons(53), 7);
    }
}
