//! Mass calculation over compositions: monoisotopic or abundance-weighted
//! average, with optional m/z normalization by charge.

use crate::{
    composition::Composition,
    errors::{ChemicalCompositionError, Result},
    mass_table::{MassTable, PROTON_KEY, split_isotope_label},
};

/// Parameters for a mass calculation.
///
/// The default is a monoisotopic mass against the built-in NIST table, with
/// the charge read from the composition's `H+` count.
#[derive(Copy, Clone, Debug)]
pub struct MassOptions<'t> {
    /// Weight every untagged element by the natural abundances of its
    /// isotopes instead of using the most abundant isotope alone.
    pub average: bool,
    /// Explicit charge. `None` derives the charge from the composition's
    /// `H+` count; `Some` overrides it, and clashes with a nonzero `H+`
    /// entry.
    pub charge: Option<i64>,
    pub mass_data: &'t MassTable,
}

impl<'t> MassOptions<'t> {
    pub fn new(mass_data: &'t MassTable) -> Self {
        Self {
            average: false,
            charge: None,
            mass_data,
        }
    }

    #[must_use]
    pub fn averaged(mut self) -> Self {
        self.average = true;
        self
    }

    #[must_use]
    pub fn with_charge(mut self, charge: i64) -> Self {
        self.charge = Some(charge);
        self
    }
}

impl Default for MassOptions<'static> {
    fn default() -> Self {
        Self::new(MassTable::nist())
    }
}

/// Calculate the mass of `composition`. [`Composition::mass_with`] is the
/// cached entry point.
///
/// The resolved charge supersedes the composition's own `H+` count for the
/// duration of the summation; the composition itself is never touched. A
/// nonzero resolved charge divides the total by its magnitude, yielding m/z.
pub fn calculate_mass(composition: &Composition, options: &MassOptions) -> Result<f64> {
    let &MassOptions {
        average,
        charge,
        mass_data,
    } = options;

    let proton_count = composition.get(PROTON_KEY);
    let charge = match charge {
        None => proton_count,
        Some(charge) => {
            if charge != 0 && proton_count != 0 {
                return Err(ChemicalCompositionError::AmbiguousCharge {
                    proton_count,
                    charge,
                });
            }
            charge
        }
    };

    let mut mass = 0.0;
    for (key, count) in composition.iter() {
        if key != PROTON_KEY {
            mass += key_mass(key, count, average, mass_data)?;
        }
    }

    if charge != 0 {
        mass += key_mass(PROTON_KEY, charge, average, mass_data)?;
        mass /= charge.unsigned_abs() as f64;
    }

    Ok(mass)
}

/// The mass contributed by `count` atoms of a single composition key.
fn key_mass(key: &str, count: i64, average: bool, mass_data: &MassTable) -> Result<f64> {
    let (element, mass_number) = split_isotope_label(key)?;
    let record = mass_data
        .element(element)
        .ok_or_else(|| ChemicalCompositionError::unknown_element(element))?;

    if mass_number == 0 && average {
        Ok(record
            .natural_isotopes()
            .map(|(_, isotope)| count as f64 * isotope.mass * isotope.abundance)
            .sum())
    } else {
        let isotope = record
            .isotope(mass_number)
            .ok_or_else(|| ChemicalCompositionError::unknown_element(key))?;
        Ok(count as f64 * isotope.mass)
    }
}

// Module Tests ========================================================================================================
