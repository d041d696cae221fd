//! Isotopic distribution helpers: the most probable isotopic composition of
//! a molecule, and the relative abundance of a fully specified one.

use ahash::HashMap;
use itertools::Itertools;

use crate::{
    composition::Composition,
    errors::{ChemicalCompositionError, Result},
    mass_table::{MassTable, PROTON_KEY, isotope_label, split_isotope_label},
};

/// Distribute each element of `composition` over its two most abundant
/// isotopes, returning the resulting explicitly tagged composition and its
/// relative abundance.
///
/// Isotope tags already present are folded back into their elements first,
/// so the input may mix tagged and untagged keys freely. When
/// `elements_with_isotopes` is given, only the listed elements are
/// distributed; everything else keeps its untagged key. The `H+` charge
/// carrier is passed through untouched.
pub fn most_probable_isotopic_composition(
    composition: &Composition,
    mass_data: &MassTable,
    elements_with_isotopes: Option<&[&str]>,
) -> Result<(Composition, f64)> {
    // Fold C[13] et al. back into their parent elements
    let mut folded = Composition::new();
    for (key, count) in composition.iter() {
        let (element, _) = split_isotope_label(key)?;
        folded.set(element.to_owned(), folded.get(element) + count);
    }

    let mut isotopic = Composition::new();
    for (element, count) in folded.iter() {
        if element == PROTON_KEY {
            isotopic.set(element.to_owned(), count);
            continue;
        }
        if elements_with_isotopes.is_some_and(|elements| !elements.contains(&element)) {
            isotopic.set(element.to_owned(), count);
            continue;
        }

        let record = mass_data
            .element(element)
            .ok_or_else(|| ChemicalCompositionError::unknown_element(element))?;
        let ranked: Vec<_> = record
            .natural_isotopes()
            .sorted_by(|(_, a), (_, b)| b.abundance.total_cmp(&a.abundance))
            .collect();
        let Some(&(first, first_isotope)) = ranked.first() else {
            isotopic.set(element.to_owned(), count);
            continue;
        };

        // The most abundant isotope takes its proportional share, rounded;
        // the second takes whatever is left
        let first_count = (count as f64 * first_isotope.abundance).round() as i64;
        isotopic.set(isotope_label(element, first), first_count);
        if let Some(&(second, _)) = ranked.get(1) {
            isotopic.set(isotope_label(element, second), count - first_count);
        }
    }

    let abundance = isotopic_composition_abundance(&isotopic, mass_data)?;
    Ok((isotopic, abundance))
}

/// The relative abundance of an isotopically specified composition: the
/// multinomial count of arrangements times the product of per-atom isotope
/// abundances.
///
/// Each element must appear either fully tagged or fully untagged; mixing
/// the two (or a negative count) fails with `InconsistentIsotopes`.
pub fn isotopic_composition_abundance(
    composition: &Composition,
    mass_data: &MassTable,
) -> Result<f64> {
    let mut by_element: HashMap<&str, HashMap<u32, i64>> = HashMap::default();
    for (key, count) in composition.iter() {
        if key == PROTON_KEY {
            continue;
        }
        let (element, mass_number) = split_isotope_label(key)?;
        if count < 0 {
            return Err(ChemicalCompositionError::inconsistent_isotopes(element));
        }

        let isotopes = by_element.entry(element).or_default();
        if !isotopes.is_empty() && (mass_number == 0 || isotopes.contains_key(&0)) {
            return Err(ChemicalCompositionError::inconsistent_isotopes(element));
        }
        isotopes.insert(mass_number, count);
    }

    let mut arrangements = 1.0;
    let mut per_atom_abundance = 1.0;
    let mut overcounting = 1.0;
    for (element, isotopes) in &by_element {
        arrangements *= factorial(isotopes.values().sum());
        for (&mass_number, &count) in isotopes {
            overcounting *= factorial(count);
            if mass_number != 0 {
                let record = mass_data
                    .element(element)
                    .ok_or_else(|| ChemicalCompositionError::unknown_element(element))?;
                let isotope = record.isotope(mass_number).ok_or_else(|| {
                    ChemicalCompositionError::unknown_element(&isotope_label(element, mass_number))
                })?;
                per_atom_abundance *= isotope.abundance.powi(count as i32);
            }
        }
    }

    Ok(per_atom_abundance * (arrangements / overcounting))
}

fn factorial(n: i64) -> f64 {
    (2..=n).map(|i| i as f64).product()
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use crate::testing_tools::assert_close;

    use super::*;

    #[test]
    fn most_probable_water() {
        let water = Composition::from_formula("H2O").unwrap();
        let (isotopic, abundance) =
            most_probable_isotopic_composition(&water, MassTable::nist(), None).unwrap();
        assert_eq!(
            isotopic,
            Composition::from_mapping([("H[1]".to_owned(), 2), ("O[16]".to_owned(), 1)])
        );
        assert_close!(abundance, 0.997, 1e-3);
    }

    #[test]
    fn most_probable_folds_existing_tags() {
        let tagged = Composition::from_formula("C[13]C3").unwrap();
        let (isotopic, _) =
            most_probable_isotopic_composition(&tagged, MassTable::nist(), None).unwrap();
        // All four carbons are redistributed together
        assert_eq!(isotopic.get("C[12]"), 4);
        assert_eq!(isotopic.get("C[13]"), 0);
    }

    #[test]
    fn most_probable_respects_element_subset() {
        let water = Composition::from_formula("H2O").unwrap();
        let (isotopic, _) =
            most_probable_isotopic_composition(&water, MassTable::nist(), Some(&["O"])).unwrap();
        assert_eq!(
            isotopic,
            Composition::from_mapping([("H".to_owned(), 2), ("O[16]".to_owned(), 1)])
        );
    }

    #[test]
    fn most_probable_passes_protons_through() {
        let mut protonated = Composition::from_formula("H2O").unwrap();
        protonated.set(PROTON_KEY, 2);
        let (isotopic, _) =
            most_probable_isotopic_composition(&protonated, MassTable::nist(), None).unwrap();
        assert_eq!(isotopic.get(PROTON_KEY), 2);
    }

    #[test]
    fn abundance_of_tagged_composition() {
        let composition =
            Composition::from_mapping([("H[1]".to_owned(), 2), ("O[16]".to_owned(), 1)]);
        let abundance =
            isotopic_composition_abundance(&composition, MassTable::nist()).unwrap();
        assert_close!(abundance, 0.999885_f64.powi(2) * 0.99757, 1e-9);
    }

    #[test]
    fn abundance_counts_arrangements() {
        // One H and one D: two distinguishable arrangements
        let composition =
            Composition::from_mapping([("H[1]".to_owned(), 1), ("H[2]".to_owned(), 1)]);
        let abundance =
            isotopic_composition_abundance(&composition, MassTable::nist()).unwrap();
        assert_close!(abundance, 2.0 * 0.999885 * 0.000115, 1e-9);
    }

    #[test]
    fn abundance_rejects_mixed_specification() {
        let mixed = Composition::from_mapping([("O".to_owned(), 1), ("O[18]".to_owned(), 1)]);
        assert_eq!(
            isotopic_composition_abundance(&mixed, MassTable::nist()),
            Err(ChemicalCompositionError::inconsistent_isotopes("O"))
        );
    }

    #[test]
    fn abundance_rejects_negative_counts() {
        let negative = Composition::from_mapping([("O[18]".to_owned(), -1)]);
        assert_eq!(
            isotopic_composition_abundance(&negative, MassTable::nist()),
            Err(ChemicalCompositionError::inconsistent_isotopes("O"))
        );
    }
}
