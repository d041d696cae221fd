use nom::{
    IResult,
    error::{ErrorKind, ParseError},
};

use crate::errors::ChemicalCompositionError;

pub(crate) type ParseResult<'a, O> = IResult<&'a str, O, FormulaParseError>;

/// What went wrong while parsing a formula. Grammar-level failures are
/// folded into a single `Syntax` kind (they all report the whole formula
/// as invalid), while the other kinds carry the specific culprit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FormulaParseError {
    pub(crate) kind: FormulaErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum FormulaErrorKind {
    UnknownElement(String),
    MalformedNumber(String),
    MalformedIsotope,
    Syntax(ErrorKind),
}

impl FormulaParseError {
    pub(crate) fn new(kind: FormulaErrorKind) -> Self {
        Self { kind }
    }

    /// Surface this parse failure as a crate error, quoting the complete
    /// `formula` for the kinds that report whole-string problems.
    pub(crate) fn into_error(self, formula: &str) -> ChemicalCompositionError {
        match self.kind {
            FormulaErrorKind::UnknownElement(symbol) => {
                ChemicalCompositionError::UnknownElement { symbol }
            }
            FormulaErrorKind::MalformedNumber(literal) => {
                ChemicalCompositionError::MalformedNumber { literal }
            }
            FormulaErrorKind::MalformedIsotope => {
                ChemicalCompositionError::malformed_isotope(formula)
            }
            FormulaErrorKind::Syntax(_) => ChemicalCompositionError::invalid_formula(formula),
        }
    }
}

impl ParseError<&str> for FormulaParseError {
    fn from_error_kind(_input: &str, kind: ErrorKind) -> Self {
        Self::new(FormulaErrorKind::Syntax(kind))
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}
