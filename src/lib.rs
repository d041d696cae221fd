//! Chemical elemental compositions with formula parsing, monoisotopic and
//! average mass calculation, and a count table tuned for building and
//! comparing large molecular assemblies.

mod composition;
mod count_table;
pub mod errors;
mod isotopes;
mod mass;
mod mass_table;
mod parsers;
#[cfg(test)]
mod testing_tools;

pub use composition::{Composition, CompositionBuilder, FrozenComposition};
pub use count_table::CountTable;
pub use errors::{ChemicalCompositionError, Result};
pub use isotopes::{isotopic_composition_abundance, most_probable_isotopic_composition};
pub use mass::{MassOptions, calculate_mass};
pub use mass_table::{
    ELECTRON_MASS, ElementRecord, Isotope, MassTable, PROTON_KEY, PROTON_MASS, isotope_label,
    split_isotope_label,
};

/// Anything with a calculable mass. Both methods resolve charge from the
/// `H+` count, so a charged implementor yields m/z rather than raw mass.
pub trait Massive {
    fn monoisotopic_mass(&self) -> Result<f64>;

    fn average_mass(&self) -> Result<f64>;
}

macro_rules! massive_ref_impls {
    ($($ref_type:ty),+ $(,)?) => {
        $(
            impl<T: Massive> Massive for $ref_type {
                fn monoisotopic_mass(&self) -> Result<f64> {
                    (**self).monoisotopic_mass()
                }

                fn average_mass(&self) -> Result<f64> {
                    (**self).average_mass()
                }
            }
        )+
    };
}

massive_ref_impls!(&T, &mut T, Box<T>);
