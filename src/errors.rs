use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = ChemicalCompositionError> = std::result::Result<T, E>;

/// Every failure in this crate is a `ChemicalCompositionError`. The variants
/// discriminate the reason, but callers that only care that composition or
/// mass calculation failed can treat it as a single kind.
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum ChemicalCompositionError {
    #[diagnostic(help(
        "a formula is a run of atoms like C6H12O6, each optionally isotope-tagged (C[13]) and \
        counted (H-2), with parenthesized groups like (CH2)6"
    ))]
    #[error("{formula:?} is not a valid chemical formula")]
    InvalidFormula { formula: String },

    #[diagnostic(help("double-check for typos, or add a new entry to the mass table"))]
    #[error("the element {symbol:?} could not be found in the supplied mass table")]
    UnknownElement { symbol: String },

    #[error("failed to parse {literal:?} as an atom count or isotope number")]
    MalformedNumber { literal: String },

    #[diagnostic(help(
        "isotope numbers are written in square brackets after the element symbol, like C[13]"
    ))]
    #[error("unbalanced or malformed isotope brackets in {formula:?}")]
    MalformedIsotope { formula: String },

    #[error("a composition can be built from a formula or from a mapping, but not both")]
    ConflictingSources,

    #[diagnostic(help("drop the `charge` argument, or remove the H+ entry from the composition"))]
    #[error(
        "charge is specified both by the composition's H+ count ({proton_count}) and by the \
        charge argument ({charge})"
    )]
    AmbiguousCharge { proton_count: i64, charge: i64 },

    #[diagnostic(help(
        "specify the isotopic states of all atoms of the element, or of none of them"
    ))]
    #[error("the isotopic state of {element:?} is inconsistent")]
    InconsistentIsotopes { element: String },
}

impl ChemicalCompositionError {
    pub(crate) fn invalid_formula(formula: &str) -> Self {
        let formula = formula.to_owned();

        Self::InvalidFormula { formula }
    }

    pub(crate) fn unknown_element(symbol: &str) -> Self {
        let symbol = symbol.to_owned();

        Self::UnknownElement { symbol }
    }

    pub(crate) fn malformed_number(literal: &str) -> Self {
        let literal = literal.to_owned();

        Self::MalformedNumber { literal }
    }

    pub(crate) fn malformed_isotope(formula: &str) -> Self {
        let formula = formula.to_owned();

        Self::MalformedIsotope { formula }
    }

    pub(crate) fn inconsistent_isotopes(element: &str) -> Self {
        let element = element.to_owned();

        Self::InconsistentIsotopes { element }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use miette::{GraphicalReportHandler, GraphicalTheme};

    use super::*;

    fn render(error: &ChemicalCompositionError) -> String {
        let mut out = String::new();
        GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
            .with_width(80)
            .render_report(&mut out, error)
            .unwrap();
        out
    }

    #[test]
    fn messages_name_the_culprit() {
        assert_eq!(
            ChemicalCompositionError::invalid_formula("H2O)").to_string(),
            "\"H2O)\" is not a valid chemical formula"
        );
        assert_eq!(
            ChemicalCompositionError::unknown_element("Zz").to_string(),
            "the element \"Zz\" could not be found in the supplied mass table"
        );
        assert_eq!(
            ChemicalCompositionError::malformed_number("99z").to_string(),
            "failed to parse \"99z\" as an atom count or isotope number"
        );
    }

    #[test]
    fn diagnostics_carry_help() {
        let report = render(&ChemicalCompositionError::unknown_element("Zz"));
        assert!(report.contains("could not be found"));
        assert!(report.contains("double-check for typos"));

        let report = render(&ChemicalCompositionError::AmbiguousCharge {
            proton_count: 2,
            charge: 1,
        });
        assert!(report.contains("drop the `charge` argument"));
    }
}
