//! Element mass data: isotope masses and natural abundances, keyed by symbol.

use ahash::HashMap;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::errors::{ChemicalCompositionError, Result};

/// Mass of a bare proton, the `H+` pseudo-element used to carry charge.
pub const PROTON_MASS: f64 = 1.00727646677;

pub const ELECTRON_MASS: f64 = 0.00054857990946;

/// Composition key whose count doubles as the charge of the composition.
pub const PROTON_KEY: &str = "H+";

/// One row of the mass table: a relative atomic mass and the isotope's
/// natural relative abundance (0.0 for isotopes not found in nature).
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Isotope {
    pub mass: f64,
    pub abundance: f64,
}

/// The isotopes of a single element. Mass number 0 is a synthetic row holding
/// the element's most abundant isotope, used whenever a formula leaves the
/// isotope unspecified.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ElementRecord {
    isotopes: HashMap<u32, Isotope>,
}

impl ElementRecord {
    pub fn isotope(&self, mass_number: u32) -> Option<&Isotope> {
        self.isotopes.get(&mass_number)
    }

    /// The synthetic mass number 0 row, the element's default isotope.
    pub fn default_isotope(&self) -> Option<&Isotope> {
        self.isotope(0)
    }

    /// All real isotope rows, i.e. everything except the synthetic 0 row.
    pub fn natural_isotopes(&self) -> impl Iterator<Item = (u32, &Isotope)> {
        self.isotopes
            .iter()
            .filter(|&(&mass_number, _)| mass_number != 0)
            .map(|(&mass_number, isotope)| (mass_number, isotope))
    }
}

/// A mapping from element symbol to its isotopes, consulted by the formula
/// parser (for symbol validation) and by mass calculation (for mass rows).
#[derive(Clone, Debug, Serialize)]
pub struct MassTable {
    elements: HashMap<String, ElementRecord>,
}

impl MassTable {
    /// The built-in NIST-derived table backing [`Default`] and every mass
    /// query that doesn't supply its own data.
    pub fn nist() -> &'static Self {
        static NIST: Lazy<MassTable> = Lazy::new(|| MassTable::from_entries(NIST_MASS));
        &NIST
    }

    /// Build a table from `(symbol, [(mass_number, mass, abundance)])` rows.
    pub fn from_entries(entries: &[(&str, &[(u32, f64, f64)])]) -> Self {
        let elements = entries
            .iter()
            .map(|&(symbol, rows)| {
                let isotopes = rows
                    .iter()
                    .map(|&(mass_number, mass, abundance)| {
                        (mass_number, Isotope { mass, abundance })
                    })
                    .collect();
                (symbol.to_owned(), ElementRecord { isotopes })
            })
            .collect();

        Self { elements }
    }

    pub fn element(&self, symbol: &str) -> Option<&ElementRecord> {
        self.elements.get(symbol)
    }

    pub fn contains_element(&self, symbol: &str) -> bool {
        self.elements.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Default for MassTable {
    fn default() -> Self {
        Self::nist().clone()
    }
}

/// Form the composition key for an element and mass number: `"C"` for the
/// unspecified isotope 0, `"C[13]"` otherwise.
pub fn isotope_label(element: &str, mass_number: u32) -> String {
    if mass_number == 0 {
        element.to_owned()
    } else {
        format!("{element}[{mass_number}]")
    }
}

/// Split a composition key back into its element symbol and mass number,
/// with 0 standing for an untagged key.
pub fn split_isotope_label(label: &str) -> Result<(&str, u32)> {
    let Some(open) = label.find('[') else {
        return Ok((label, 0));
    };

    let Some(digits) = label[open + 1..].strip_suffix(']') else {
        return Err(ChemicalCompositionError::malformed_isotope(label));
    };
    let mass_number = digits
        .parse()
        .map_err(|_| ChemicalCompositionError::malformed_number(digits))?;

    Ok((&label[..open], mass_number))
}

// Embedded Mass Data ==================================================================================================

// Atomic masses and isotopic abundances from the NIST Atomic Weights and
// Isotopic Compositions database. Mass number 0 is the synthetic default row
// (most abundant isotope, abundance 1). The proton pseudo-element H+ rides
// along so that charged compositions stay plain element -> count mappings.
const NIST_MASS: &[(&str, &[(u32, f64, f64)])] = &[
    (
        "H",
        &[
            (0, 1.00782503207, 1.0),
            (1, 1.00782503207, 0.999885),
            (2, 2.0141017778, 0.000115),
            (3, 3.0160492777, 0.0),
        ],
    ),
    ("H+", &[(0, PROTON_MASS, 1.0), (1, PROTON_MASS, 1.0)]),
    (
        "He",
        &[
            (0, 4.002603254, 1.0),
            (3, 3.0160293191, 0.00000134),
            (4, 4.002603254, 0.99999866),
        ],
    ),
    (
        "Li",
        &[
            (0, 7.01600455, 1.0),
            (6, 6.015122795, 0.0759),
            (7, 7.01600455, 0.9241),
        ],
    ),
    (
        "B",
        &[
            (0, 11.0093054, 1.0),
            (10, 10.012937, 0.199),
            (11, 11.0093054, 0.801),
        ],
    ),
    (
        "C",
        &[
            (0, 12.0, 1.0),
            (12, 12.0, 0.9893),
            (13, 13.0033548378, 0.0107),
            (14, 14.003241989, 0.0),
        ],
    ),
    (
        "N",
        &[
            (0, 14.0030740048, 1.0),
            (14, 14.0030740048, 0.99636),
            (15, 15.0001088982, 0.00364),
        ],
    ),
    (
        "O",
        &[
            (0, 15.99491461956, 1.0),
            (16, 15.99491461956, 0.99757),
            (17, 16.9991317, 0.00038),
            (18, 17.999161, 0.00205),
        ],
    ),
    ("F", &[(0, 18.99840322, 1.0), (19, 18.99840322, 1.0)]),
    ("Na", &[(0, 22.9897692809, 1.0), (23, 22.9897692809, 1.0)]),
    (
        "Mg",
        &[
            (0, 23.9850417, 1.0),
            (24, 23.9850417, 0.7899),
            (25, 24.98583692, 0.1),
            (26, 25.982592929, 0.1101),
        ],
    ),
    ("Al", &[(0, 26.98153863, 1.0), (27, 26.98153863, 1.0)]),
    (
        "Si",
        &[
            (0, 27.9769265325, 1.0),
            (28, 27.9769265325, 0.92223),
            (29, 28.9764947, 0.04685),
            (30, 29.97377017, 0.03092),
        ],
    ),
    ("P", &[(0, 30.97376163, 1.0), (31, 30.97376163, 1.0)]),
    (
        "S",
        &[
            (0, 31.972071, 1.0),
            (32, 31.972071, 0.9499),
            (33, 32.97145876, 0.0075),
            (34, 33.9678669, 0.0425),
            (36, 35.96708076, 0.0001),
        ],
    ),
    (
        "Cl",
        &[
            (0, 34.96885268, 1.0),
            (35, 34.96885268, 0.7576),
            (37, 36.96590259, 0.2424),
        ],
    ),
    (
        "K",
        &[
            (0, 38.96370668, 1.0),
            (39, 38.96370668, 0.932581),
            (40, 39.96399848, 0.000117),
            (41, 40.96182576, 0.067302),
        ],
    ),
    (
        "Ca",
        &[
            (0, 39.96259098, 1.0),
            (40, 39.96259098, 0.96941),
            (42, 41.95861801, 0.00647),
            (43, 42.95876663, 0.00135),
            (44, 43.9554818, 0.02086),
            (46, 45.9536926, 0.00004),
            (48, 47.952534, 0.00187),
        ],
    ),
    ("Mn", &[(0, 54.9380451, 1.0), (55, 54.9380451, 1.0)]),
    (
        "Fe",
        &[
            (0, 55.9349375, 1.0),
            (54, 53.9396105, 0.05845),
            (56, 55.9349375, 0.91754),
            (57, 56.935394, 0.02119),
            (58, 57.9332756, 0.00282),
        ],
    ),
    ("Co", &[(0, 58.933195, 1.0), (59, 58.933195, 1.0)]),
    (
        "Ni",
        &[
            (0, 57.9353429, 1.0),
            (58, 57.9353429, 0.680769),
            (60, 59.9307864, 0.262231),
            (61, 60.931056, 0.011399),
            (62, 61.9283451, 0.036345),
            (64, 63.927966, 0.009256),
        ],
    ),
    (
        "Cu",
        &[
            (0, 62.9295975, 1.0),
            (63, 62.9295975, 0.6915),
            (65, 64.9277895, 0.3085),
        ],
    ),
    (
        "Zn",
        &[
            (0, 63.9291422, 1.0),
            (64, 63.9291422, 0.48268),
            (66, 65.9260334, 0.27975),
            (67, 66.9271273, 0.04102),
            (68, 67.9248442, 0.19024),
            (70, 69.9253193, 0.00631),
        ],
    ),
    (
        "Se",
        &[
            (0, 79.9165213, 1.0),
            (74, 73.9224764, 0.0089),
            (76, 75.9192136, 0.0937),
            (77, 76.919914, 0.0763),
            (78, 77.9173091, 0.2377),
            (80, 79.9165213, 0.4961),
            (82, 81.9166994, 0.0873),
        ],
    ),
    (
        "Br",
        &[
            (0, 78.9183371, 1.0),
            (79, 78.9183371, 0.5069),
            (81, 80.9162906, 0.4931),
        ],
    ),
    ("I", &[(0, 126.904473, 1.0), (127, 126.904473, 1.0)]),
    (
        "Os",
        &[
            (0, 191.9614807, 1.0),
            (184, 183.9524891, 0.0002),
            (186, 185.9538382, 0.0159),
            (187, 186.9557505, 0.0196),
            (188, 187.9558382, 0.1324),
            (189, 188.9581475, 0.1615),
            (190, 189.958447, 0.2626),
            (192, 191.9614807, 0.4078),
        ],
    ),
];

// Module Tests ========================================================================================================
